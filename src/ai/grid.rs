//! Occupancy grid on the world X/Z plane
//!
//! Cell `(0, 0)` is centred on `origin`; cell `(x, y)` maps to world
//! `(origin.x + x * tile, y_level, origin.y + y * tile)`.

use glam::{IVec2, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{NavError, Result};

/// Step cost reported for blocked or out-of-bounds cells
pub const BLOCKED_COST: f32 = 1e9;

/// A 2D navigation grid
///
/// Occupancy `0` is free; anything above zero is blocked (walls, mud and
/// other authored weights all block neighbour gathering). Deserialized grids
/// go through the same checks as [`Grid::from_occupancy`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "GridData")]
pub struct Grid {
    /// Width in cells
    pub width: usize,
    /// Height in cells
    pub height: usize,
    /// Cell size in world units
    pub tile_size: f32,
    /// World-space X/Z position of the centre of cell (0, 0)
    pub origin: Vec2,
    /// Row-major occupancy, `width * height` entries
    occupancy: Vec<u8>,
}

/// Unchecked serialized form of [`Grid`]
#[derive(Deserialize)]
struct GridData {
    width: usize,
    height: usize,
    tile_size: f32,
    #[serde(default)]
    origin: Vec2,
    occupancy: Vec<u8>,
}

impl TryFrom<GridData> for Grid {
    type Error = NavError;

    fn try_from(data: GridData) -> Result<Self> {
        Ok(Self::from_occupancy(data.width, data.height, data.tile_size, data.occupancy)?
            .with_origin(data.origin))
    }
}

impl Grid {
    /// Create a new grid (all cells free).
    ///
    /// Degenerate sizes are not rejected here: a zero-sized grid simply has
    /// no cells. Use [`Grid::from_occupancy`] for checked construction.
    #[must_use]
    pub fn new(width: usize, height: usize, tile_size: f32) -> Self {
        Self {
            width,
            height,
            tile_size,
            origin: Vec2::ZERO,
            occupancy: vec![0; width * height],
        }
    }

    /// Move the grid so cell (0, 0) is centred on `origin`
    #[must_use]
    pub fn with_origin(mut self, origin: Vec2) -> Self {
        self.origin = origin;
        self
    }

    /// Build a grid from an existing occupancy buffer
    pub fn from_occupancy(
        width: usize,
        height: usize,
        tile_size: f32,
        occupancy: Vec<u8>,
    ) -> Result<Self> {
        validate_dimensions(width, height, tile_size)?;
        if occupancy.len() != width * height {
            return Err(NavError::OccupancyLength {
                expected: width * height,
                actual: occupancy.len(),
            });
        }
        Ok(Self {
            width,
            height,
            tile_size,
            origin: Vec2::ZERO,
            occupancy,
        })
    }

    /// Parse a map where each line is a row (`y`), each character a column (`x`).
    ///
    /// `.` or space is free, `#` is a wall (255) and digits `1`-`9` store that
    /// occupancy value. Blank leading/trailing lines are ignored.
    pub fn from_ascii(map: &str, tile_size: f32) -> Result<Self> {
        let rows: Vec<&str> = map
            .lines()
            .map(str::trim_end)
            .skip_while(|line| line.trim().is_empty())
            .collect();
        let rows: Vec<&str> = match rows.iter().rposition(|line| !line.trim().is_empty()) {
            Some(last) => rows[..=last].to_vec(),
            None => Vec::new(),
        };

        let height = rows.len();
        let width = rows.first().map_or(0, |row| row.chars().count());
        validate_dimensions(width, height, tile_size)?;

        let mut occupancy = Vec::with_capacity(width * height);
        for (y, row) in rows.iter().enumerate() {
            let len = row.chars().count();
            if len != width {
                return Err(NavError::MalformedMap {
                    row: y,
                    reason: format!("expected {width} columns, found {len}"),
                });
            }
            for ch in row.chars() {
                let value = match ch {
                    '.' | ' ' => 0,
                    '#' => u8::MAX,
                    '1'..='9' => ch as u8 - b'0',
                    other => {
                        return Err(NavError::MalformedMap {
                            row: y,
                            reason: format!("unexpected character {other:?}"),
                        });
                    }
                };
                occupancy.push(value);
            }
        }

        log::debug!("Parsed {width}x{height} grid map");
        Self::from_occupancy(width, height, tile_size, occupancy)
    }

    /// Total number of cells
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.occupancy.len()
    }

    /// Check if a cell lies inside the grid
    #[must_use]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Row-major index of an in-bounds cell
    #[must_use]
    pub fn key(&self, x: i32, y: i32) -> usize {
        y as usize * self.width + x as usize
    }

    /// Inverse of [`Grid::key`], `None` for keys past the last cell
    #[must_use]
    pub fn cell_of(&self, key: usize) -> Option<IVec2> {
        if key >= self.cell_count() || self.width == 0 {
            return None;
        }
        Some(IVec2::new((key % self.width) as i32, (key / self.width) as i32))
    }

    /// Raw occupancy value, `None` outside the grid
    #[must_use]
    pub fn occupancy(&self, x: i32, y: i32) -> Option<u8> {
        if !self.in_bounds(x, y) {
            return None;
        }
        self.occupancy.get(self.key(x, y)).copied()
    }

    /// Set a cell's occupancy value (ignored outside the grid)
    pub fn set_occupancy(&mut self, x: i32, y: i32, value: u8) {
        if !self.in_bounds(x, y) {
            return;
        }
        let key = self.key(x, y);
        if let Some(cell) = self.occupancy.get_mut(key) {
            *cell = value;
        }
    }

    /// Mark a cell as a wall or clear it
    pub fn set_blocked(&mut self, x: i32, y: i32, blocked: bool) {
        self.set_occupancy(x, y, if blocked { u8::MAX } else { 0 });
    }

    /// In bounds and free
    #[must_use]
    pub fn passable(&self, x: i32, y: i32) -> bool {
        self.occupancy(x, y) == Some(0)
    }

    /// Multiplier applied to a step entering this cell
    #[must_use]
    pub fn step_cost(&self, x: i32, y: i32) -> f32 {
        match self.occupancy(x, y) {
            Some(0) => 1.0,
            _ => BLOCKED_COST,
        }
    }

    /// Convert a world position to the nearest cell (may be out of bounds)
    #[must_use]
    pub fn world_to_cell(&self, pos: Vec3) -> IVec2 {
        let local = Vec2::new(pos.x - self.origin.x, pos.z - self.origin.y);
        IVec2::new(
            (local.x / self.tile_size + 0.5).floor() as i32,
            (local.y / self.tile_size + 0.5).floor() as i32,
        )
    }

    /// Convert a cell to its world-space centre at height `y_level`
    #[must_use]
    pub fn cell_to_world(&self, cell: IVec2, y_level: f32) -> Vec3 {
        Vec3::new(
            self.origin.x + cell.x as f32 * self.tile_size,
            y_level,
            self.origin.y + cell.y as f32 * self.tile_size,
        )
    }
}

fn validate_dimensions(width: usize, height: usize, tile_size: f32) -> Result<()> {
    if width == 0 || height == 0 || !(tile_size > 0.0) {
        return Err(NavError::InvalidGridDimensions {
            width,
            height,
            tile_size,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passable_matches_occupancy() {
        let mut grid = Grid::new(4, 3, 1.0);
        grid.set_occupancy(1, 1, 5);
        grid.set_blocked(2, 0, true);

        for y in -1..4 {
            for x in -1..5 {
                let expected = grid.in_bounds(x, y) && grid.occupancy(x, y) == Some(0);
                assert_eq!(grid.passable(x, y), expected, "cell ({x}, {y})");
            }
        }
        assert!(!grid.passable(1, 1));
        assert!(!grid.passable(4, 0));
        assert!(!grid.passable(0, -1));
    }

    #[test]
    fn test_step_cost() {
        let mut grid = Grid::new(3, 3, 1.0);
        grid.set_occupancy(1, 1, 3);

        assert_eq!(grid.step_cost(0, 0), 1.0);
        assert_eq!(grid.step_cost(1, 1), BLOCKED_COST);
        assert_eq!(grid.step_cost(-1, 0), BLOCKED_COST);
    }

    #[test]
    fn test_world_cell_round_trip() {
        let grid = Grid::new(10, 10, 2.0).with_origin(Vec2::new(-5.0, 3.0));

        let cell = IVec2::new(4, 7);
        let world = grid.cell_to_world(cell, 1.5);
        assert_eq!(world, Vec3::new(3.0, 1.5, 17.0));
        assert_eq!(grid.world_to_cell(world), cell);

        // Rounds to the nearest centre
        assert_eq!(grid.world_to_cell(world + Vec3::new(0.9, 0.0, -0.9)), cell);
        assert_eq!(
            grid.world_to_cell(world + Vec3::new(1.1, 0.0, 0.0)),
            IVec2::new(5, 7)
        );
    }

    #[test]
    fn test_key_and_cell_of() {
        let grid = Grid::new(7, 5, 1.0);
        let key = grid.key(3, 4);
        assert_eq!(key, 31);
        assert_eq!(grid.cell_of(key), Some(IVec2::new(3, 4)));
        assert_eq!(grid.cell_of(35), None);
    }

    #[test]
    fn test_zero_sized_grid_has_no_cells() {
        let mut grid = Grid::new(0, 3, 1.0);
        assert_eq!(grid.cell_count(), 0);
        assert_eq!(grid.cell_of(0), None);
        assert_eq!(grid.cell_of(5), None);
        assert!(!grid.passable(0, 0));
        grid.set_blocked(0, 0, true);
        assert_eq!(grid.occupancy(0, 0), None);
    }

    #[test]
    fn test_deserialize_checks_occupancy_length() {
        let short = r#"{"width":4,"height":4,"tile_size":1.0,"origin":[0.0,0.0],"occupancy":[]}"#;
        let err = serde_json::from_str::<Grid>(short).unwrap_err();
        assert!(err.to_string().contains("occupancy"), "{err}");

        let zero_tile = r#"{"width":2,"height":1,"tile_size":0.0,"occupancy":[0,0]}"#;
        assert!(serde_json::from_str::<Grid>(zero_tile).is_err());
    }

    #[test]
    fn test_deserialized_grid_is_usable() {
        let json = r#"{"width":3,"height":2,"tile_size":2.0,"origin":[1.0,-1.0],"occupancy":[0,255,0,0,0,0]}"#;
        let grid: Grid = serde_json::from_str(json).unwrap();

        assert_eq!(grid.origin, Vec2::new(1.0, -1.0));
        assert!(!grid.passable(1, 0));
        let path = crate::ai::find_path(&grid, IVec2::new(0, 0), IVec2::new(2, 0), 0.0);
        assert!(path.ok);
        assert_eq!(path.cells.last(), Some(&IVec2::new(2, 0)));

        let round_trip: Grid = serde_json::from_str(&serde_json::to_string(&grid).unwrap()).unwrap();
        assert_eq!(round_trip.cell_count(), 6);
        assert_eq!(round_trip.occupancy(1, 0), Some(u8::MAX));
    }

    #[test]
    fn test_from_ascii() {
        let grid = Grid::from_ascii("\n..#.\n.5..\n\n", 1.0).unwrap();
        assert_eq!((grid.width, grid.height), (4, 2));
        assert_eq!(grid.occupancy(2, 0), Some(u8::MAX));
        assert_eq!(grid.occupancy(1, 1), Some(5));
        assert!(grid.passable(3, 1));
    }

    #[test]
    fn test_from_ascii_rejects_bad_maps() {
        assert!(matches!(
            Grid::from_ascii("...\n..", 1.0),
            Err(NavError::MalformedMap { row: 1, .. })
        ));
        assert!(matches!(
            Grid::from_ascii("..x", 1.0),
            Err(NavError::MalformedMap { row: 0, .. })
        ));
        assert!(matches!(
            Grid::from_ascii("", 1.0),
            Err(NavError::InvalidGridDimensions { .. })
        ));
        assert!(matches!(
            Grid::from_occupancy(2, 2, 1.0, vec![0; 3]),
            Err(NavError::OccupancyLength {
                expected: 4,
                actual: 3
            })
        ));
    }
}
