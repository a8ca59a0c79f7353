//! The `acv.xml` manifest: parsing, validation and serialization.

use std::collections::BTreeMap;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, Event};

use crate::image::{Pixel, Rect};
use crate::utils::error::{ComicError, Result};

/// Frame list and background color of one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Screen {
    pub bgcolor: Option<Pixel>,
    /// Frames as `(x, y, w, h)` fractions of the page, in reading order.
    pub frames: Vec<[f64; 4]>,
}

impl Screen {
    /// Builds a screen from absolute page rectangles, clamping each to the
    /// page before scaling into `[0, 1]`.
    pub fn from_rects(
        bgcolor: Pixel,
        rects: &[Rect],
        page_width: u32,
        page_height: u32,
    ) -> Self {
        let page = Rect::new(0, 0, page_width, page_height);
        Screen {
            bgcolor: Some(bgcolor),
            frames: rects
                .iter()
                .map(|r| page.intersection(r).to_relative(page_width, page_height))
                .collect(),
        }
    }

    /// Maps the relative frames back to pixel rectangles on a page of the
    /// given size.
    pub fn absolute_frames(&self, page_width: u32, page_height: u32) -> Vec<Rect> {
        self.frames
            .iter()
            .map(|&area| Rect::from_relative(area, page_width, page_height))
            .collect()
    }
}

/// The parsed form of an `acv.xml` document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AcvManifest {
    /// Comic-wide background color, used when a screen has none of its own.
    pub bgcolor: Option<Pixel>,
    /// Screens keyed by page index.
    pub screens: BTreeMap<u32, Screen>,
}

impl AcvManifest {
    /// Background color for one page: the screen's own, else the comic's.
    pub fn bgcolor(&self, page: u32) -> Option<Pixel> {
        self.screens
            .get(&page)
            .and_then(|s| s.bgcolor)
            .or(self.bgcolor)
    }

    /// Parses an `acv.xml` document.
    ///
    /// Any structural problem fails the whole parse with
    /// `MalformedManifest`: wrong root element, a screen without an `index`
    /// or with a duplicate one, an invalid `bgcolor`, or a `relativeArea`
    /// that is not four floats in `[0, 1]`. Unknown elements are skipped.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut manifest = AcvManifest::default();
        let mut in_comic = false;
        let mut screen: Option<(u32, Screen)> = None;
        loop {
            let event = reader.read_event()?;
            match event {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    let empty = matches!(event, Event::Empty(_));
                    match e.name().as_ref() {
                        b"comic" if !in_comic => {
                            in_comic = true;
                            if let Some(value) = attribute(e, b"bgcolor")? {
                                manifest.bgcolor = Some(parse_bgcolor(&value)?);
                            }
                        }
                        b"screen" if screen.is_some() => {
                            return Err(ComicError::MalformedManifest(
                                "nested screen element".to_string(),
                            ));
                        }
                        b"screen" if in_comic => {
                            let index = attribute(e, b"index")?.ok_or_else(|| {
                                ComicError::MalformedManifest(
                                    "screen has no index attribute".to_string(),
                                )
                            })?;
                            let index: u32 = index.parse().map_err(|_| {
                                ComicError::MalformedManifest(format!(
                                    "invalid screen index: {index}"
                                ))
                            })?;
                            if manifest.screens.contains_key(&index) {
                                return Err(ComicError::MalformedManifest(format!(
                                    "duplicate screen {index}"
                                )));
                            }
                            let mut s = Screen::default();
                            if let Some(value) = attribute(e, b"bgcolor")? {
                                s.bgcolor = Some(parse_bgcolor(&value)?);
                            }
                            if empty {
                                manifest.screens.insert(index, s);
                            } else {
                                screen = Some((index, s));
                            }
                        }
                        b"frame" if screen.is_some() => {
                            let area = attribute(e, b"relativeArea")?.ok_or_else(|| {
                                ComicError::MalformedManifest(
                                    "frame has no relativeArea attribute".to_string(),
                                )
                            })?;
                            let area = parse_relative_area(&area)?;
                            if let Some((_, s)) = screen.as_mut() {
                                s.frames.push(area);
                            }
                        }
                        _ if !in_comic => {
                            return Err(ComicError::MalformedManifest(format!(
                                "root element is not comic: {}",
                                String::from_utf8_lossy(e.name().as_ref())
                            )));
                        }
                        // Unknown elements inside the document are skipped.
                        _ => {}
                    }
                }
                Event::End(ref e) => {
                    if e.name().as_ref() == b"screen" {
                        if let Some((index, s)) = screen.take() {
                            manifest.screens.insert(index, s);
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }
        if !in_comic {
            return Err(ComicError::MalformedManifest(
                "document has no comic element".to_string(),
            ));
        }
        Ok(manifest)
    }

    /// Serializes the manifest to an indented `acv.xml` document.
    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 1);
        let mut comic = BytesStart::new("comic");
        if let Some(bg) = self.bgcolor {
            comic.push_attribute(("bgcolor", format_bgcolor(bg).as_str()));
        }
        writer.write_event(Event::Start(comic))?;
        for (&index, screen) in &self.screens {
            let mut s = BytesStart::new("screen");
            s.push_attribute(("index", index.to_string().as_str()));
            if let Some(bg) = screen.bgcolor {
                s.push_attribute(("bgcolor", format_bgcolor(bg).as_str()));
            }
            writer.write_event(Event::Start(s))?;
            for area in &screen.frames {
                let mut f = BytesStart::new("frame");
                f.push_attribute((
                    "relativeArea",
                    format!("{:.6} {:.6} {:.6} {:.6}", area[0], area[1], area[2], area[3])
                        .as_str(),
                ));
                writer.write_event(Event::Empty(f))?;
            }
            writer.write_event(Event::End(BytesEnd::new("screen")))?;
        }
        writer.write_event(Event::End(BytesEnd::new("comic")))?;
        Ok(writer.into_inner())
    }
}

fn attribute(e: &BytesStart, name: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| {
            ComicError::MalformedManifest(format!("bad attribute: {err}"))
        })?;
        if attr.key.as_ref() == name {
            let value = attr.unescape_value()?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn parse_bgcolor(value: &str) -> Result<Pixel> {
    let malformed = || ComicError::MalformedManifest(format!("invalid bgcolor: {value}"));
    let hex = value.strip_prefix('#').ok_or_else(malformed)?;
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(malformed());
    }
    let channel = |range| u8::from_str_radix(&hex[range], 16).map_err(|_| malformed());
    Ok(Pixel::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

fn format_bgcolor(bg: Pixel) -> String {
    format!("#{:02x}{:02x}{:02x}", bg.r, bg.g, bg.b)
}

fn parse_relative_area(value: &str) -> Result<[f64; 4]> {
    let malformed =
        || ComicError::MalformedManifest(format!("invalid frame relativeArea: {value}"));
    let mut area = [0.0f64; 4];
    let mut parts = value.split_whitespace();
    for slot in &mut area {
        let part = parts.next().ok_or_else(malformed)?;
        let f: f64 = part.parse().map_err(|_| malformed())?;
        if !(0.0..=1.0).contains(&f) {
            return Err(malformed());
        }
        *slot = f;
    }
    if parts.next().is_some() {
        return Err(malformed());
    }
    Ok(area)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"<comic bgcolor="#ffffff">
 <screen index="0" bgcolor="#fefefe">
  <frame relativeArea="0.0625 0.0625 0.375 0.375"/>
  <frame relativeArea="0.5625 0.0625 0.375 0.375"/>
 </screen>
 <screen index="2">
 </screen>
</comic>"##;

    #[test]
    fn test_parse_sample() {
        let manifest = AcvManifest::parse(SAMPLE).unwrap();
        assert_eq!(manifest.bgcolor, Some(Pixel::white()));
        assert_eq!(manifest.screens.len(), 2);
        let screen = &manifest.screens[&0];
        assert_eq!(screen.bgcolor, Some(Pixel::new(0xfe, 0xfe, 0xfe)));
        assert_eq!(screen.frames.len(), 2);
        assert_eq!(screen.frames[0], [0.0625, 0.0625, 0.375, 0.375]);
        assert!(manifest.screens[&2].frames.is_empty());
    }

    #[test]
    fn test_bgcolor_falls_back_to_comic() {
        let manifest = AcvManifest::parse(SAMPLE).unwrap();
        assert_eq!(manifest.bgcolor(0), Some(Pixel::new(0xfe, 0xfe, 0xfe)));
        assert_eq!(manifest.bgcolor(2), Some(Pixel::white()));
        assert_eq!(manifest.bgcolor(7), Some(Pixel::white()));
    }

    #[test]
    fn test_wrong_root_is_rejected() {
        let err = AcvManifest::parse("<album><screen index=\"0\"/></album>").unwrap_err();
        assert!(matches!(err, ComicError::MalformedManifest(_)));
    }

    #[test]
    fn test_duplicate_screen_is_rejected() {
        let xml = r#"<comic><screen index="1"/><screen index="1"/></comic>"#;
        assert!(AcvManifest::parse(xml).is_err());
    }

    #[test]
    fn test_missing_index_is_rejected() {
        assert!(AcvManifest::parse("<comic><screen/></comic>").is_err());
    }

    #[test]
    fn test_invalid_bgcolor_is_rejected() {
        assert!(AcvManifest::parse(r#"<comic bgcolor="white"/>"#).is_err());
        assert!(AcvManifest::parse(r##"<comic bgcolor="#fff"/>"##).is_err());
        assert!(AcvManifest::parse(r##"<comic bgcolor="#ggffff"/>"##).is_err());
    }

    #[test]
    fn test_invalid_relative_area_is_rejected() {
        for area in ["0 0 1", "0 0 1 1 1", "0 0 1 1.5", "a b c d"] {
            let xml = format!(
                r#"<comic><screen index="0"><frame relativeArea="{area}"/></screen></comic>"#
            );
            assert!(AcvManifest::parse(&xml).is_err(), "accepted: {area}");
        }
    }

    #[test]
    fn test_unknown_elements_are_skipped() {
        let xml = r#"<comic><meta title="x"/><screen index="0"><note/></screen></comic>"#;
        let manifest = AcvManifest::parse(xml).unwrap();
        assert_eq!(manifest.screens.len(), 1);
    }

    #[test]
    fn test_xml_roundtrip() {
        let manifest = AcvManifest::parse(SAMPLE).unwrap();
        let xml = manifest.to_xml().unwrap();
        let reparsed = AcvManifest::parse(std::str::from_utf8(&xml).unwrap()).unwrap();
        assert_eq!(manifest, reparsed);
    }

    #[test]
    fn test_screen_scales_rects_within_one_pixel() {
        let rects = [Rect::new(50, 50, 300, 300), Rect::new(450, 450, 300, 300)];
        let screen = Screen::from_rects(Pixel::white(), &rects, 800, 800);
        let back = screen.absolute_frames(800, 800);
        for (orig, round) in rects.iter().zip(&back) {
            assert!((orig.x - round.x).abs() <= 1);
            assert!((orig.y - round.y).abs() <= 1);
            assert!((orig.width as i32 - round.width as i32).abs() <= 1);
            assert!((orig.height as i32 - round.height as i32).abs() <= 1);
        }
    }
}
