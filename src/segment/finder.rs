//! Recursive gutter segmentation of a binarized page.
//!
//! A page rectangle is first cropped of background margins, then cut wherever
//! a foreground-free scanline crosses it, alternating between horizontal and
//! vertical cuts. Horizontal cuts emit top-then-bottom and vertical cuts emit
//! left-then-right, so the concatenated result is already in reading order.

use log::debug;

use crate::image::{ImageMask, Rect};
use crate::segment::scanner;

/// Longest run of foreground samples a gutter line may contain and still be
/// considered blank.
pub const MAX_IMPERFECTION_SIZE: u32 = 3;

/// Absolute floor for the minimum panel extent on a cut axis.
const MIN_FRAME_SIZE: u32 = 64;

#[derive(Clone, Copy)]
enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

/// Segments one binarized page into ordered panel rectangles.
pub struct PanelFinder<'a> {
    mask: &'a ImageMask,
    min_frame_width: u32,
    min_frame_height: u32,
}

impl<'a> PanelFinder<'a> {
    pub fn new(mask: &'a ImageMask) -> Self {
        PanelFinder {
            mask,
            min_frame_width: MIN_FRAME_SIZE.max(mask.width() / 16),
            min_frame_height: MIN_FRAME_SIZE.max(mask.height() / 16),
        }
    }

    /// Finds the panels of the whole page, in reading order.
    ///
    /// A page that resists segmentation (all background, all foreground, or
    /// nothing panel-sized) comes back as a single full-page rectangle, so
    /// every page has at least one frame.
    pub fn find_frames(&self) -> Vec<Rect> {
        let page = Rect::new(0, 0, self.mask.width(), self.mask.height());
        match self.find_frames_rec(page, true, true) {
            Some(frames) => frames,
            None => {
                debug!("segmentation found no panels, keeping whole page");
                vec![page]
            }
        }
    }

    fn count_lines(
        &self,
        want_bg: bool,
        start_step: i64,
        step_size: i64,
        nb_steps: u32,
        start_line: i64,
        line_pitch: i64,
        max_lines: u32,
    ) -> u32 {
        let pos = start_step * step_size + start_line * line_pitch;
        scanner::count_lines(
            self.mask.as_bytes(),
            MAX_IMPERFECTION_SIZE,
            want_bg,
            pos as isize,
            step_size as isize,
            nb_steps,
            line_pitch as isize,
            max_lines,
        )
    }

    /// Shrinks one side of `rect` past its leading background lines.
    fn crop_side(&self, rect: Rect, side: Side) -> Rect {
        let pitch = i64::from(self.mask.width());
        let x0 = i64::from(rect.x);
        let y0 = i64::from(rect.y);
        let x1 = x0 + i64::from(rect.width) - 1;
        let y1 = y0 + i64::from(rect.height) - 1;
        let (x0, y0, x1, y1) = match side {
            Side::Top => {
                let n = self.count_lines(true, x0, 1, rect.width, y0, pitch, rect.height);
                (x0, y0 + i64::from(n), x1, y1)
            }
            Side::Bottom => {
                let n = self.count_lines(true, x0, 1, rect.width, -y1, -pitch, rect.height);
                (x0, y0, x1, y1 - i64::from(n))
            }
            Side::Left => {
                let n = self.count_lines(true, y0, pitch, rect.height, x0, 1, rect.width);
                (x0 + i64::from(n), y0, x1, y1)
            }
            Side::Right => {
                let n = self.count_lines(true, y0, pitch, rect.height, -x1, -1, rect.width);
                (x0, y0, x1 - i64::from(n), y1)
            }
        };
        Rect::from_points(x0 as i32, y0 as i32, x1 as i32, y1 as i32)
    }

    /// Crops background margins on all four sides; `None` when nothing is
    /// left.
    fn crop(&self, mut rect: Rect) -> Option<Rect> {
        for side in [Side::Top, Side::Bottom, Side::Left, Side::Right] {
            rect = self.crop_side(rect, side);
            if rect.is_empty() {
                return None;
            }
        }
        Some(rect)
    }

    /// Recursively splits `rect` on background gutters.
    ///
    /// Once a cut on one axis succeeds, the first half is only probed on the
    /// perpendicular axis, which prevents the same gutter from being detected
    /// twice from both halves. Returns `None` for rectangles that crop away
    /// entirely or end up smaller than a panel.
    fn find_frames_rec(
        &self,
        rect: Rect,
        split_horz: bool,
        split_vert: bool,
    ) -> Option<Vec<Rect>> {
        let rect = self.crop(rect)?;
        if rect.width < self.min_frame_width || rect.height < self.min_frame_height {
            return None;
        }
        let pitch = i64::from(self.mask.width());
        for (allowed, horizontal) in [(split_horz, true), (split_vert, false)] {
            if !allowed {
                continue;
            }
            // Lines run across the cut axis: cutting horizontally scans rows
            // of the rect, cutting vertically scans columns.
            let (min_nb, start_step, step_size, nb_steps, start_line, line_pitch, nb_lines) =
                if horizontal {
                    let (x, y) = (i64::from(rect.x), i64::from(rect.y));
                    (self.min_frame_height, x, 1, rect.width, y, pitch, rect.height)
                } else {
                    let (x, y) = (i64::from(rect.x), i64::from(rect.y));
                    (self.min_frame_width, y, pitch, rect.height, x, 1, rect.width)
                };
            if nb_lines <= min_nb * 2 {
                // Both halves could not reach panel size.
                continue;
            }
            let mut cur_line = start_line + i64::from(min_nb);
            let end_line = start_line + i64::from(nb_lines) - i64::from(min_nb);
            while cur_line < end_line {
                let nb_fg = self.count_lines(
                    false,
                    start_step,
                    step_size,
                    nb_steps,
                    cur_line,
                    line_pitch,
                    (end_line - cur_line) as u32,
                );
                // Tentative cut on the first background line past the block.
                let split_size = (cur_line + i64::from(nb_fg) - start_line + 1) as u32;
                let first = if horizontal {
                    Rect::new(rect.x, rect.y, rect.width, split_size)
                } else {
                    Rect::new(rect.x, rect.y, split_size, rect.height)
                };
                let Some(mut frames) = self.find_frames_rec(first, !horizontal, horizontal)
                else {
                    cur_line += i64::from(nb_fg);
                    if cur_line >= end_line {
                        break;
                    }
                    // Skip the blank band before the next candidate.
                    let nb_bg = self.count_lines(
                        true,
                        start_step,
                        step_size,
                        nb_steps,
                        cur_line,
                        line_pitch,
                        (end_line - cur_line) as u32,
                    );
                    cur_line += i64::from(nb_bg);
                    continue;
                };
                let second = if horizontal {
                    Rect::new(
                        rect.x,
                        first.y + first.height as i32,
                        rect.width,
                        rect.height - first.height,
                    )
                } else {
                    Rect::new(
                        first.x + first.width as i32,
                        rect.y,
                        rect.width - first.width,
                        rect.height,
                    )
                };
                let Some(second_frames) = self.find_frames_rec(second, true, true) else {
                    break;
                };
                frames.extend(second_frames);
                return Some(frames);
            }
        }
        Some(vec![rect])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{Pixel, Pixmap};

    fn page_with_panels(width: u32, height: u32, panels: &[Rect]) -> ImageMask {
        let pm = Pixmap::from_fn(width, height, |x, y| {
            let inside = panels.iter().any(|p| {
                (x as i32) >= p.x && (x as i32) < p.x_max() && (y as i32) >= p.y && (y as i32) < p.y_max()
            });
            if inside { Pixel::black() } else { Pixel::white() }
        });
        ImageMask::binarize(&pm, Pixel::white())
    }

    #[test]
    fn test_blank_page_has_no_panels() {
        let mask = page_with_panels(200, 200, &[]);
        let finder = PanelFinder::new(&mask);
        assert_eq!(finder.find_frames(), vec![Rect::new(0, 0, 200, 200)]);
    }

    #[test]
    fn test_two_stacked_panels() {
        let panels = [Rect::new(20, 20, 360, 340), Rect::new(20, 440, 360, 340)];
        let mask = page_with_panels(400, 800, &panels);
        let finder = PanelFinder::new(&mask);
        let frames = finder.find_frames();
        assert_eq!(frames, panels);
    }

    #[test]
    fn test_two_side_by_side_panels() {
        let panels = [Rect::new(20, 20, 340, 360), Rect::new(440, 20, 340, 360)];
        let mask = page_with_panels(800, 400, &panels);
        let finder = PanelFinder::new(&mask);
        let frames = finder.find_frames();
        assert_eq!(frames, panels);
    }

    #[test]
    fn test_grid_reads_row_major() {
        let panels = [
            Rect::new(50, 50, 300, 300),
            Rect::new(450, 50, 300, 300),
            Rect::new(50, 450, 300, 300),
            Rect::new(450, 450, 300, 300),
        ];
        let mask = page_with_panels(800, 800, &panels);
        let finder = PanelFinder::new(&mask);
        let frames = finder.find_frames();
        assert_eq!(frames, panels);
    }

    #[test]
    fn test_page_crops_to_lone_blob() {
        // A single blob with no gutters: the page crops down to it and no
        // further cut fits.
        let panels = [Rect::new(350, 350, 100, 100)];
        let mask = page_with_panels(800, 800, &panels);
        let finder = PanelFinder::new(&mask);
        let frames = finder.find_frames();
        assert_eq!(frames, vec![Rect::new(350, 350, 100, 100)]);
    }

    #[test]
    fn test_speckled_gutter_still_cuts() {
        // Two panels with a few 1px specks in the gutter between them.
        let pm = Pixmap::from_fn(400, 800, |x, y| {
            let in_panel = (20..380).contains(&x) && ((20..340).contains(&y) || (460..780).contains(&y));
            let speck = y == 400 && (x == 100 || x == 200 || x == 300);
            if in_panel || speck { Pixel::black() } else { Pixel::white() }
        });
        let mask = ImageMask::binarize(&pm, Pixel::white());
        let finder = PanelFinder::new(&mask);
        let frames = finder.find_frames();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], Rect::new(20, 20, 360, 320));
        assert_eq!(frames[1], Rect::new(20, 460, 360, 320));
    }
}
