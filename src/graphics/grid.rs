use super::Tile;

/// Rows of tiles, top to bottom, each row left to right.
pub type TileGrid = Vec<Vec<Tile>>;

/// Flip every tile in place, then reorder the grid to match.
#[tracing::instrument(skip(grid))]
pub fn flip_grid(grid: &mut TileGrid, mode: u32) {
    for tile in grid.iter_mut().flatten() {
        tile.flip(mode);
    }
    if mode & 1 != 0 {
        for row in grid.iter_mut() {
            row.reverse();
        }
    }
    if mode & 2 != 0 {
        grid.reverse();
    }
}

/// Rotate every tile in place 90 degrees clockwise `times` times, then
/// rearrange the grid so the whole picture turns with its tiles.
#[tracing::instrument(skip(grid))]
pub fn rotate_grid(grid: &mut TileGrid, times: u32) {
    for tile in grid.iter_mut().flatten() {
        tile.rotate(times);
    }
    let columns = grid.first().map(|row| row.len()).unwrap_or_default();
    match times & 3 {
        1 => {
            // New row i is old column i read bottom to top.
            let rotated = (0..columns)
                .map(|i| {
                    grid.iter()
                        .rev()
                        .filter_map(|row| row.get(i).cloned())
                        .collect()
                })
                .collect();
            *grid = rotated;
        }
        2 => {
            grid.reverse();
            for row in grid.iter_mut() {
                row.reverse();
            }
        }
        3 => {
            // New row i is old column (columns - 1 - i) read top to bottom.
            let rotated = (0..columns)
                .rev()
                .map(|i| {
                    grid.iter()
                        .filter_map(|row| row.get(i).cloned())
                        .collect()
                })
                .collect();
            *grid = rotated;
        }
        _ => (),
    }
}
