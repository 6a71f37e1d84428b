/// 8x8 tiles and their flip/rotate transforms.
pub mod tile;

/// Whole-grid transforms.
pub mod grid;

/// Frames: scaled, cropped, masked views over a tile grid.
pub mod frame;

/// Tile grids read from display memory and font data.
pub mod screen;

pub use frame::{CropRect, Frame, FrameCache, FrameError, MaskType};
pub use grid::{flip_grid, rotate_grid, TileGrid};
pub use tile::Tile;
