use super::{tile::to_rows, Tile, TileGrid};
use crate::snapshot::Snapshot;

pub const DISPLAY_FILE: u32 = 16384;
pub const ATTRIBUTE_FILE: u32 = 22528;
pub const COLUMNS: u32 = 32;
pub const ROWS: u32 = 24;

/// The printable characters rendered by `#FONT` when no text is given.
pub fn default_font_text() -> String {
    (32u8..128).map(char::from).collect()
}

fn screen_tile(snapshot: &Snapshot, row: u32, col: u32, df_addr: u32, af_addr: u32) -> Tile {
    let attr = snapshot.peek(af_addr.wrapping_add(COLUMNS * row + col));
    let address = df_addr.wrapping_add(2048 * (row / 8) + 32 * (row % 8) + col);
    Tile::new(attr, to_rows(&snapshot.read_strided(address, 256, 8)))
}

/// Build a grid of tiles from the display file and attribute file, starting
/// at character cell `(x, y)` and clipped to the 32x24 screen.
#[tracing::instrument(skip(snapshot))]
pub fn screenshot(
    snapshot: &Snapshot,
    x: u32,
    y: u32,
    w: u32,
    h: u32,
    df_addr: u32,
    af_addr: u32,
) -> TileGrid {
    let width = w.min(COLUMNS.saturating_sub(x));
    let height = h.min(ROWS.saturating_sub(y));
    (y..y + height)
        .map(|row| {
            (x..x + width)
                .map(|col| screen_tile(snapshot, row, col, df_addr, af_addr))
                .collect()
        })
        .collect()
}

/// Build a single row of glyph tiles for `message` from a font whose first
/// glyph is the space character.
#[tracing::instrument(skip(snapshot))]
pub fn font_tiles(snapshot: &Snapshot, address: u32, attr: u8, message: &str) -> TileGrid {
    let glyphs = message
        .chars()
        .map(|c| {
            let offset = 8u32.wrapping_mul((c as u32).wrapping_sub(32));
            Tile::new(attr, to_rows(&snapshot.read_strided(address.wrapping_add(offset), 1, 8)))
        })
        .collect();
    vec![glyphs]
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn test_screen_tile_layout() {
        let mut snapshot = Snapshot::new();
        // Character cell (row 9, col 3): third 1, pixel rows 256 bytes apart.
        for n in 0..8 {
            snapshot.poke(DISPLAY_FILE + 2048 + 32 + 3 + 256 * n, n as u8);
        }
        snapshot.poke(ATTRIBUTE_FILE + 32 * 9 + 3, 0x47);

        let grid = screenshot(&snapshot, 3, 9, 1, 1, DISPLAY_FILE, ATTRIBUTE_FILE);
        assert_eq!(grid, vec![vec![Tile::new(0x47, [0, 1, 2, 3, 4, 5, 6, 7])]]);
    }

    #[test]
    fn test_screenshot_is_clipped() {
        let snapshot = Snapshot::new();
        let grid = screenshot(&snapshot, 30, 20, 32, 24, DISPLAY_FILE, ATTRIBUTE_FILE);
        assert_eq!(grid.len(), 4);
        assert_eq!(grid[0].len(), 2);

        let grid = screenshot(&snapshot, 0, 0, 32, 24, DISPLAY_FILE, ATTRIBUTE_FILE);
        assert_eq!((grid.len(), grid[23].len()), (24, 32));
    }

    #[test]
    fn test_font_tiles() {
        let mut snapshot = Snapshot::new();
        // Glyph for 'A' (65) at 15616 + 8 * 33.
        snapshot.load(15616 + 8 * 33, &[0, 60, 66, 66, 126, 66, 66, 0]);
        let grid = font_tiles(&snapshot, 15616, 56, " A");
        assert_eq!(grid.len(), 1);
        assert_eq!(grid[0][0], Tile::new(56, [0; 8]));
        assert_eq!(grid[0][1], Tile::new(56, [0, 60, 66, 66, 126, 66, 66, 0]));
    }

    #[test]
    fn test_default_font_text() {
        let text = default_font_text();
        assert_eq!(text.len(), 96);
        assert!(text.starts_with(" !\""));
        assert!(text.ends_with('\u{7f}'));
    }
}
