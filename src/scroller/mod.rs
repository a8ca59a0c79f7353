//! The smart scroller: panel detection plus row-by-row viewport scrolling.
//!
//! [`SmartScroller`] owns the frame list for one prepared page. `setup_image`
//! segments the page into panels, `setup_view` tiles panels that exceed the
//! viewport, and `scroll` walks reading "rows" forward or backward, where a
//! row is a maximal run of consecutive frames whose combined bounding box
//! fits the viewport.

use std::fmt;

use log::{debug, info};

use crate::image::{ImageMask, Pixel, Pixmap, Rect};
use crate::segment::finder::PanelFinder;
use crate::segment::splitter::split_frame;
use crate::utils::error::{ComicError, Result};

/// One panel, or one tile of an oversize panel.
///
/// `number` is the panel's index in reading order; `split` is `None` for an
/// untiled panel and the 0-based tile index otherwise. Tiles of one panel
/// form a contiguous block in the frame list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub rect: Rect,
    pub number: u32,
    pub split: Option<u32>,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.split {
            Some(split) => write!(f, "{}.{}:{}", self.number, split, self.rect),
            None => write!(f, "{}:{}", self.number, self.rect),
        }
    }
}

/// Walks the frame list in one direction, refusing to cross into the middle
/// of a tiled panel: iteration stops before any frame whose `split` is set
/// and whose `number` differs from the last visited frame's. Tiled panels
/// are always entered through their first tile.
struct NoSplitWalk<'a> {
    frames: &'a [Frame],
    last: usize,
    step: i32,
}

impl Iterator for NoSplitWalk<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let next = self.last as i64 + i64::from(self.step);
        if next < 0 || next >= self.frames.len() as i64 {
            return None;
        }
        let next = next as usize;
        let nf = &self.frames[next];
        if nf.split.is_some() && nf.number != self.frames[self.last].number {
            return None;
        }
        self.last = next;
        Some(next)
    }
}

/// Segments pages and walks their reading rows.
///
/// The scroller is single-owner: one prepared page at a time, no sharing
/// across threads required. `setup_image` must not interleave with `scroll`
/// on the same object.
#[derive(Debug, Default)]
pub struct SmartScroller {
    /// Untiled panels, as detected.
    page_frames: Vec<Frame>,
    /// Current frame list; tiled when a view has been set up.
    frames: Vec<Frame>,
    /// First and last visible frame indices, `first <= last`.
    current_frames: (u32, u32),
    /// Whether `scroll` has positioned the view since the last setup call.
    positioned: bool,
    image_width: u32,
    image_height: u32,
    view_x: i32,
    view_y: i32,
    view_width: u32,
    view_height: u32,
}

impl SmartScroller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Segments `image` into panels using `bg` as the background color.
    ///
    /// Replaces the frame list and resets the scroll position. The binarized
    /// mask only lives for the duration of this call.
    ///
    /// Fails with `InvalidInput` for a zero-area image.
    pub fn setup_image(&mut self, image: &Pixmap, bg: Pixel) -> Result<()> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(ComicError::InvalidInput(
                "cannot segment a zero-area image".to_string(),
            ));
        }
        let mask = ImageMask::binarize(image, bg);
        let finder = PanelFinder::new(&mask);
        self.page_frames = finder
            .find_frames()
            .into_iter()
            .enumerate()
            .map(|(number, rect)| Frame {
                rect,
                number: number as u32,
                split: None,
            })
            .collect();
        info!(
            "segmented {}x{} page into {} frames",
            width,
            height,
            self.page_frames.len()
        );
        self.frames = self.page_frames.clone();
        self.image_width = width;
        self.image_height = height;
        self.current_frames = (0, 0);
        self.positioned = false;
        self.view_x = 0;
        self.view_y = 0;
        self.view_width = 0;
        self.view_height = 0;
        Ok(())
    }

    /// Sets the viewport size and re-tiles oversize panels against it.
    ///
    /// Tiling always starts from the untiled panels of `setup_image`, so
    /// calling this repeatedly never tiles tiles. A zero-sized view clears
    /// the tiling. The frame list is replaced atomically and the scroll
    /// position resets.
    pub fn setup_view(&mut self, view_width: u32, view_height: u32) {
        self.view_x = 0;
        self.view_y = 0;
        self.view_width = view_width;
        self.view_height = view_height;
        if view_width == 0 || view_height == 0 {
            self.frames = self.page_frames.clone();
        } else {
            let mut frames = Vec::with_capacity(self.page_frames.len());
            for frame in &self.page_frames {
                frames.extend(split_frame(frame, view_width, view_height));
            }
            self.frames = frames;
        }
        self.current_frames = (0, 0);
        self.positioned = false;
    }

    /// The current frame list, sorted by `number` then `split`.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Indices of the first and last visible frame.
    pub fn current_frames(&self) -> (u32, u32) {
        self.current_frames
    }

    /// The dimensions of the prepared page.
    pub fn image_size(&self) -> (u32, u32) {
        (self.image_width, self.image_height)
    }

    fn walk_no_split(&self, start: usize, step: i32) -> NoSplitWalk<'_> {
        NoSplitWalk {
            frames: &self.frames,
            last: start,
            step,
        }
    }

    /// Moves to the next (or previous) reading row and returns its bounding
    /// box.
    ///
    /// With `to_frame` set, the row starts at that frame regardless of the
    /// current position; negative values index from the end and anything
    /// outside `[-len, len)` is an `IndexOutOfRange` error. Without it, the
    /// walk resumes past the frames currently visible in the viewport;
    /// running off either end of the list returns `Ok(None)`.
    pub fn scroll(&mut self, to_frame: Option<i32>, backward: bool) -> Result<Option<Rect>> {
        let len = self.frames.len();
        if len == 0 {
            return Ok(None);
        }
        let step: i32 = if backward { -1 } else { 1 };

        let next_frame = match to_frame {
            Some(n) => {
                let index = if n >= 0 {
                    i64::from(n)
                } else {
                    len as i64 + i64::from(n)
                };
                if index < 0 || index >= len as i64 {
                    debug!("smart scrolling impossible: bad frame number: {}/{}", n, len);
                    return Err(ComicError::IndexOutOfRange { index: n, len });
                }
                index as usize
            }
            // Nothing shown yet: enter the list from the matching end.
            None if !self.positioned => {
                if backward {
                    len - 1
                } else {
                    0
                }
            }
            None => {
                let mut last_visible = if backward {
                    self.current_frames.0 as usize
                } else {
                    self.current_frames.1 as usize
                };
                let vbox = Rect::new(self.view_x, self.view_y, self.view_width, self.view_height);
                for n in self.walk_no_split(last_visible, step) {
                    if !vbox.contains_rect(&self.frames[n].rect) {
                        break;
                    }
                    last_visible = n;
                }
                let next = last_visible as i64 + i64::from(step);
                if next < 0 || next >= len as i64 {
                    return Ok(None);
                }
                next as usize
            }
        };

        // Grow the row while the union still fits the viewport.
        let first_visible = next_frame;
        let mut last_visible = next_frame;
        let mut bbox = self.frames[next_frame].rect;
        for n in self.walk_no_split(next_frame, step) {
            let new_bbox = bbox.union(&self.frames[n].rect);
            if new_bbox.width > self.view_width || new_bbox.height > self.view_height {
                break;
            }
            last_visible = n;
            bbox = new_bbox;
        }

        self.current_frames = (
            first_visible.min(last_visible) as u32,
            first_visible.max(last_visible) as u32,
        );
        self.positioned = true;
        self.view_x = bbox.x;
        self.view_y = bbox.y;
        Ok(Some(bbox))
    }

    /// Enumerates every reading row of the page for a display of the given
    /// size.
    ///
    /// Each row is computed against the larger of the display size and the
    /// row's first frame, so a panel bigger than the display still yields a
    /// complete row. A zero display size gives one row per frame. The scroll
    /// position afterwards is at the last row.
    pub fn rows(&mut self, view_width: u32, view_height: u32) -> Result<Vec<Rect>> {
        let mut rows = Vec::new();
        let mut frame = 0usize;
        while frame < self.frames.len() {
            let f = self.frames[frame];
            self.view_x = 0;
            self.view_y = 0;
            self.view_width = f.rect.width.max(view_width);
            self.view_height = f.rect.height.max(view_height);
            match self.scroll(Some(frame as i32), false)? {
                Some(bbox) => rows.push(bbox),
                None => break,
            }
            frame = self.current_frames.1 as usize + 1;
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scroller_with_frames(rects: &[Rect]) -> SmartScroller {
        let mut s = SmartScroller::new();
        s.page_frames = rects
            .iter()
            .enumerate()
            .map(|(number, &rect)| Frame {
                rect,
                number: number as u32,
                split: None,
            })
            .collect();
        s.frames = s.page_frames.clone();
        s
    }

    const THREE_STACKED: [Rect; 3] = [
        Rect {
            x: 20,
            y: 20,
            width: 360,
            height: 200,
        },
        Rect {
            x: 20,
            y: 260,
            width: 360,
            height: 200,
        },
        Rect {
            x: 20,
            y: 500,
            width: 360,
            height: 200,
        },
    ];

    #[test]
    fn test_scroll_to_negative_frame_indexes_from_end() {
        let mut s = scroller_with_frames(&THREE_STACKED);
        let bbox = s.scroll(Some(-1), false).unwrap().unwrap();
        assert_eq!(bbox, THREE_STACKED[2]);
        assert_eq!(s.current_frames(), (2, 2));
    }

    #[test]
    fn test_scroll_to_out_of_range_frame_is_an_error() {
        let mut s = scroller_with_frames(&THREE_STACKED);
        assert!(matches!(
            s.scroll(Some(3), false),
            Err(ComicError::IndexOutOfRange { index: 3, len: 3 })
        ));
        assert!(matches!(
            s.scroll(Some(-4), false),
            Err(ComicError::IndexOutOfRange { index: -4, len: 3 })
        ));
    }

    #[test]
    fn test_rows_merge_adjacent_frames_that_fit() {
        let mut s = scroller_with_frames(&THREE_STACKED);
        s.setup_view(400, 500);
        // Frames 0 and 1 span y 20..460, which fits 500; adding frame 2
        // would span 680.
        let bbox = s.scroll(None, false).unwrap().unwrap();
        assert_eq!(bbox, Rect::new(20, 20, 360, 440));
        assert_eq!(s.current_frames(), (0, 1));
        let bbox = s.scroll(None, false).unwrap().unwrap();
        assert_eq!(bbox, THREE_STACKED[2]);
        assert!(s.scroll(None, false).unwrap().is_none());
    }

    #[test]
    fn test_backward_from_reset_starts_at_the_end() {
        let mut s = scroller_with_frames(&THREE_STACKED);
        s.setup_view(400, 500);
        let bbox = s.scroll(None, true).unwrap().unwrap();
        // Growing backward from the last frame: frames 2 and 1 fit together.
        assert_eq!(bbox, Rect::new(20, 260, 360, 440));
        assert_eq!(s.current_frames(), (1, 2));
        let bbox = s.scroll(None, true).unwrap().unwrap();
        assert_eq!(bbox, THREE_STACKED[0]);
        assert!(s.scroll(None, true).unwrap().is_none());
    }

    #[test]
    fn test_row_never_ends_on_a_later_panels_tile() {
        // Frame 0 is a normal panel; panel 1 is tiled. Even though tile 1.0
        // would fit next to frame 0, the row must not spill into it.
        let frames = [
            Frame {
                rect: Rect::new(0, 0, 100, 100),
                number: 0,
                split: None,
            },
            Frame {
                rect: Rect::new(0, 120, 100, 100),
                number: 1,
                split: Some(0),
            },
            Frame {
                rect: Rect::new(0, 220, 100, 100),
                number: 1,
                split: Some(1),
            },
        ];
        let mut s = SmartScroller::new();
        s.page_frames = vec![frames[0]];
        s.frames = frames.to_vec();
        s.view_width = 500;
        s.view_height = 500;
        let bbox = s.scroll(None, false).unwrap().unwrap();
        assert_eq!(bbox, frames[0].rect);
        assert_eq!(s.current_frames(), (0, 0));
        // The next row enters the tiled panel at its first tile and may run
        // through its remaining tiles.
        let bbox = s.scroll(None, false).unwrap().unwrap();
        assert_eq!(bbox, Rect::new(0, 120, 100, 200));
        assert_eq!(s.current_frames(), (1, 2));
    }
}
