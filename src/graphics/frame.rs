use std::collections::HashMap;
use std::rc::Rc;

use thiserror::Error;

use super::{Tile, TileGrid};

/// Default delay between animation frames, in 1/100ths of a second.
pub const DEFAULT_DELAY: u32 = 32;

/// Most pixels a frame may hold once cropped.
pub const MAX_PIXELS: u64 = 1 << 24;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FrameError {
    #[error("Image too large: {columns}x{rows} tiles at scale {scale}")]
    TooLarge { columns: u64, rows: u64, scale: u32 },
}

/// How a tile's mask combines with its graphic data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaskType {
    /// Masks are ignored.
    #[default]
    None,
    /// `(screen OR graphic) AND mask`
    OrAnd,
    /// `(screen AND mask) OR graphic`
    AndOr,
}

impl TryFrom<u32> for MaskType {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MaskType::None),
            1 => Ok(MaskType::OrAnd),
            2 => Ok(MaskType::AndOr),
            other => Err(other),
        }
    }
}

/// Cropping rectangle in pixels. A width or height of `None` means "as much
/// as fits".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl CropRect {
    pub fn new(x: u32, y: u32, width: Option<u32>, height: Option<u32>) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// An immutable, scaled and cropped view of a tile grid with an animation
/// delay.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    tiles: Rc<TileGrid>,
    scale: u32,
    mask: MaskType,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    full_width: u32,
    full_height: u32,
    delay: u32,
}

impl Frame {
    /// Build a frame over `tiles`. Fails if the scaled grid doesn't fit in
    /// `u32` pixels or the cropped area holds more than `MAX_PIXELS`.
    pub fn new(
        tiles: TileGrid,
        scale: u32,
        mask: MaskType,
        crop: CropRect,
    ) -> Result<Self, FrameError> {
        let scale = scale.max(1);
        let columns = tiles.first().map(|row| row.len()).unwrap_or_default() as u64;
        let rows = tiles.len() as u64;
        let too_large = || FrameError::TooLarge {
            columns,
            rows,
            scale,
        };
        let full_size = |cells: u64| {
            u32::try_from(8 * cells * u64::from(scale)).map_err(|_| too_large())
        };
        let (full_width, full_height) = (full_size(columns)?, full_size(rows)?);
        let width = crop
            .width
            .filter(|w| *w > 0)
            .unwrap_or(full_width)
            .min(full_width.saturating_sub(crop.x));
        let height = crop
            .height
            .filter(|h| *h > 0)
            .unwrap_or(full_height)
            .min(full_height.saturating_sub(crop.y));
        if u64::from(width) * u64::from(height) > MAX_PIXELS {
            return Err(too_large());
        }
        Ok(Self {
            tiles: Rc::new(tiles),
            scale,
            mask,
            x: crop.x,
            y: crop.y,
            width,
            height,
            full_width,
            full_height,
            delay: DEFAULT_DELAY,
        })
    }

    /// The same frame with a different delay; the tile grid is shared.
    pub fn with_delay(&self, delay: u32) -> Self {
        Self {
            tiles: Rc::clone(&self.tiles),
            delay,
            ..*self
        }
    }

    pub fn tiles(&self) -> &TileGrid {
        &self.tiles
    }

    /// The tile covering pixel `(px, py)` of the uncropped frame, if any.
    pub fn tile_at(&self, px: u32, py: u32) -> Option<&Tile> {
        let size = 8 * self.scale;
        self.tiles
            .get((py / size) as usize)
            .and_then(|row| row.get((px / size) as usize))
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn mask(&self) -> MaskType {
        self.mask
    }

    pub fn x(&self) -> u32 {
        self.x
    }

    pub fn y(&self) -> u32 {
        self.y
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn delay(&self) -> u32 {
        self.delay
    }

    pub fn cropped(&self) -> bool {
        self.width != self.full_width || self.height != self.full_height
    }
}

/// Frames stored by `#UDGARRAY` under a frame ID for later animation.
#[derive(Debug, Default)]
pub struct FrameCache {
    frames: HashMap<String, Frame>,
}

impl FrameCache {
    /// Store `frame`, replacing any frame already stored under `id`.
    pub fn insert(&mut self, id: &str, frame: Frame) {
        self.frames.insert(id.to_owned(), frame);
    }

    pub fn get(&self, id: &str) -> Option<&Frame> {
        self.frames.get(id)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    fn tiles(columns: usize, rows: usize) -> TileGrid {
        vec![vec![Tile::new(56, [0; 8]); columns]; rows]
    }

    #[test]
    fn test_dimensions() {
        let tests = vec![
            (CropRect::default(), 2, (48, 32, false)),
            (CropRect::new(0, 0, Some(16), None), 2, (16, 32, true)),
            (CropRect::new(40, 30, None, None), 2, (8, 2, true)),
            (CropRect::new(8, 0, Some(100), Some(0)), 1, (16, 16, true)),
            (CropRect::new(100, 100, None, None), 1, (0, 0, true)),
        ];
        for (crop, scale, (width, height, cropped)) in tests {
            let frame = Frame::new(tiles(3, 2), scale, MaskType::None, crop).unwrap();
            assert_eq!((frame.width(), frame.height(), frame.cropped()), (width, height, cropped));
        }
    }

    #[test]
    fn test_oversized_frames() {
        let tests = vec![
            (tiles(1, 1), 536870912, CropRect::default()),
            (tiles(1, 1), u32::MAX, CropRect::new(0, 0, Some(8), Some(8))),
            (tiles(32, 24), 32, CropRect::default()),
        ];
        for (grid, scale, crop) in tests {
            let (columns, rows) = (grid[0].len() as u64, grid.len() as u64);
            assert_eq!(
                Frame::new(grid, scale, MaskType::None, crop),
                Err(FrameError::TooLarge {
                    columns,
                    rows,
                    scale
                })
            );
        }
        // Cropping a large frame down brings it under the limit.
        let crop = CropRect::new(0, 0, Some(256), Some(192));
        assert!(Frame::new(tiles(32, 24), 32, MaskType::None, crop).is_ok());
    }

    #[test]
    fn test_with_delay_shares_tiles() {
        let frame = Frame::new(tiles(1, 1), 1, MaskType::OrAnd, CropRect::default()).unwrap();
        assert_eq!(frame.delay(), DEFAULT_DELAY);
        let slow = frame.with_delay(100);
        assert_eq!(slow.delay(), 100);
        assert_eq!(frame.delay(), DEFAULT_DELAY);
        assert!(Rc::ptr_eq(&frame.tiles, &slow.tiles));
        assert_eq!(slow.mask(), MaskType::OrAnd);
    }

    #[test]
    fn test_tile_at() {
        let mut grid = tiles(2, 1);
        grid[0][1].attr = 7;
        let frame = Frame::new(grid, 2, MaskType::None, CropRect::default()).unwrap();
        assert_eq!(frame.tile_at(15, 15).map(|t| t.attr), Some(56));
        assert_eq!(frame.tile_at(16, 0).map(|t| t.attr), Some(7));
        assert_eq!(frame.tile_at(32, 0), None);
    }

    #[test]
    fn test_mask_type_from_u32() {
        assert_eq!(MaskType::try_from(0), Ok(MaskType::None));
        assert_eq!(MaskType::try_from(1), Ok(MaskType::OrAnd));
        assert_eq!(MaskType::try_from(2), Ok(MaskType::AndOr));
        assert_eq!(MaskType::try_from(3), Err(3));
    }

    #[test]
    fn test_frame_cache_overwrites() {
        let frame = |columns| Frame::new(tiles(columns, 1), 1, MaskType::None, CropRect::default());
        let mut cache = FrameCache::default();
        assert!(cache.is_empty());
        cache.insert("f", frame(1).unwrap());
        cache.insert("f", frame(2).unwrap());
        assert!(!cache.is_empty());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("f").map(|f| f.width()), Some(16));
        assert!(cache.get("g").is_none());
    }
}
