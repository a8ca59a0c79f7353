//! Tiling of panels too large for the viewport.

use crate::image::Rect;
use crate::scroller::Frame;

/// Splits `frame` into viewport-sized tiles.
///
/// A frame that already fits is returned unchanged (its `split` stays
/// `None`). Otherwise the frame is divided into `⌈h/max_height⌉` rows and
/// `⌈w/max_width⌉` columns of equal integer-divided size, emitted in
/// row-major order with `split` indices 0, 1, 2, … The integer division can
/// leave the last row/column a pixel or two short of the parent; the scroll
/// cursor never relies on exact coverage.
pub fn split_frame(frame: &Frame, max_width: u32, max_height: u32) -> Vec<Frame> {
    let rect = frame.rect;
    if rect.width <= max_width && rect.height <= max_height {
        return vec![*frame];
    }
    let nb_rows = rect.height.div_ceil(max_height);
    let nb_cols = rect.width.div_ceil(max_width);
    let tile_height = rect.height / nb_rows;
    let tile_width = rect.width / nb_cols;
    let mut splits = Vec::with_capacity((nb_rows * nb_cols) as usize);
    let mut y = rect.y;
    for _ in 0..nb_rows {
        let mut x = rect.x;
        for _ in 0..nb_cols {
            splits.push(Frame {
                rect: Rect::new(x, y, tile_width, tile_height),
                number: frame.number,
                split: Some(splits.len() as u32),
            });
            x += tile_width as i32;
        }
        y += tile_height as i32;
    }
    splits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(rect: Rect) -> Frame {
        Frame {
            rect,
            number: 7,
            split: None,
        }
    }

    #[test]
    fn test_fitting_frame_is_untouched() {
        let f = frame(Rect::new(10, 10, 300, 400));
        assert_eq!(split_frame(&f, 500, 500), vec![f]);
    }

    #[test]
    fn test_tall_frame_splits_vertically_only() {
        let f = frame(Rect::new(0, 0, 300, 1100));
        let tiles = split_frame(&f, 500, 500);
        assert_eq!(tiles.len(), 3);
        let expected = [
            Rect::new(0, 0, 300, 366),
            Rect::new(0, 366, 300, 366),
            Rect::new(0, 732, 300, 366),
        ];
        for (i, tile) in tiles.iter().enumerate() {
            assert_eq!(tile.rect, expected[i]);
            assert_eq!(tile.number, 7);
            assert_eq!(tile.split, Some(i as u32));
        }
    }

    #[test]
    fn test_oversize_frame_tiles_row_major() {
        let f = frame(Rect::new(100, 100, 3800, 5800));
        let tiles = split_frame(&f, 1000, 1000);
        assert_eq!(tiles.len(), 4 * 6);
        assert_eq!(tiles[0].rect, Rect::new(100, 100, 950, 966));
        assert_eq!(tiles[1].rect, Rect::new(1050, 100, 950, 966));
        assert_eq!(tiles[4].rect, Rect::new(100, 1066, 950, 966));
        assert_eq!(tiles[23].rect, Rect::new(100 + 3 * 950, 100 + 5 * 966, 950, 966));
        assert!(tiles.iter().all(|t| t.number == 7));
        let splits: Vec<_> = tiles.iter().map(|t| t.split).collect();
        assert_eq!(splits, (0..24).map(Some).collect::<Vec<_>>());
    }
}
