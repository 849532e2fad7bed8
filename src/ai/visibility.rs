//! Neighbour gathering and line-of-sight queries over a [`Grid`]

use glam::{IVec2, Vec3};
use smallvec::SmallVec;

use super::grid::Grid;

/// Up to eight passable neighbours of a cell
pub type Neighbors = SmallVec<[IVec2; 8]>;

/// Passable 8-neighbourhood of `cell`.
///
/// Orthogonal neighbours come first. A diagonal is only included when both
/// orthogonal cells it squeezes between are passable, so paths never cut a
/// wall corner.
#[must_use]
pub fn gather_neighbors(grid: &Grid, cell: IVec2) -> Neighbors {
    let (x, y) = (cell.x, cell.y);
    let mut out = Neighbors::new();

    let north = grid.passable(x, y - 1);
    let south = grid.passable(x, y + 1);
    let west = grid.passable(x - 1, y);
    let east = grid.passable(x + 1, y);

    if north {
        out.push(IVec2::new(x, y - 1));
    }
    if south {
        out.push(IVec2::new(x, y + 1));
    }
    if west {
        out.push(IVec2::new(x - 1, y));
    }
    if east {
        out.push(IVec2::new(x + 1, y));
    }

    let diagonals = [
        (north && west, IVec2::new(x - 1, y - 1)),
        (north && east, IVec2::new(x + 1, y - 1)),
        (south && west, IVec2::new(x - 1, y + 1)),
        (south && east, IVec2::new(x + 1, y + 1)),
    ];
    for (sides_open, diagonal) in diagonals {
        if sides_open && grid.passable(diagonal.x, diagonal.y) {
            out.push(diagonal);
        }
    }

    out
}

/// Cells visited by a Bresenham line from `from` to `to`, both inclusive
#[derive(Debug, Clone)]
pub struct BresenhamLine {
    current: IVec2,
    end: IVec2,
    dx: i32,
    dy: i32,
    sx: i32,
    sy: i32,
    err: i32,
    done: bool,
}

impl BresenhamLine {
    #[must_use]
    pub fn new(from: IVec2, to: IVec2) -> Self {
        let dx = (to.x - from.x).abs();
        let dy = -(to.y - from.y).abs();
        Self {
            current: from,
            end: to,
            dx,
            dy,
            sx: if from.x < to.x { 1 } else { -1 },
            sy: if from.y < to.y { 1 } else { -1 },
            err: dx + dy,
            done: false,
        }
    }
}

impl Iterator for BresenhamLine {
    type Item = IVec2;

    fn next(&mut self) -> Option<IVec2> {
        if self.done {
            return None;
        }
        let cell = self.current;
        if cell == self.end {
            self.done = true;
            return Some(cell);
        }

        let e2 = 2 * self.err;
        if e2 >= self.dy {
            self.err += self.dy;
            self.current.x += self.sx;
        }
        if e2 <= self.dx {
            self.err += self.dx;
            self.current.y += self.sy;
        }
        Some(cell)
    }
}

/// True when every cell on the Bresenham line from `a` to `b` is in bounds and free
#[must_use]
pub fn line_of_sight_clear(grid: &Grid, a: IVec2, b: IVec2) -> bool {
    BresenhamLine::new(a, b).all(|cell| grid.passable(cell.x, cell.y))
}

/// World-space line of sight, sampled on the grid
#[must_use]
pub fn has_grid_los(grid: &Grid, from: Vec3, to: Vec3) -> bool {
    line_of_sight_clear(grid, grid.world_to_cell(from), grid.world_to_cell(to))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_cell_has_eight_neighbors() {
        let grid = Grid::new(3, 3, 1.0);
        let neighbors = gather_neighbors(&grid, IVec2::new(1, 1));
        assert_eq!(neighbors.len(), 8);
        // Orthogonals first
        assert!(neighbors[..4].iter().all(|n| n.x == 1 || n.y == 1));
    }

    #[test]
    fn test_corner_has_three_neighbors() {
        let grid = Grid::new(3, 3, 1.0);
        let neighbors = gather_neighbors(&grid, IVec2::ZERO);
        assert_eq!(neighbors.len(), 3);
        assert!(neighbors.contains(&IVec2::new(1, 1)));
    }

    #[test]
    fn test_no_corner_cutting() {
        let mut grid = Grid::new(3, 3, 1.0);
        grid.set_blocked(1, 0, true);

        let neighbors = gather_neighbors(&grid, IVec2::new(0, 0));
        // (1,1) is free but the step would squeeze past the wall at (1,0)
        assert!(!neighbors.contains(&IVec2::new(1, 1)));
        assert_eq!(neighbors.as_slice(), &[IVec2::new(0, 1)]);
    }

    #[test]
    fn test_bresenham_endpoints_and_adjacency() {
        let cells: Vec<_> = BresenhamLine::new(IVec2::new(0, 0), IVec2::new(7, 3)).collect();
        assert_eq!(cells.first(), Some(&IVec2::new(0, 0)));
        assert_eq!(cells.last(), Some(&IVec2::new(7, 3)));
        assert_eq!(cells.len(), 8);
        for pair in cells.windows(2) {
            let step = (pair[1] - pair[0]).abs();
            assert!(step.x <= 1 && step.y <= 1);
        }

        let single: Vec<_> = BresenhamLine::new(IVec2::ONE, IVec2::ONE).collect();
        assert_eq!(single, vec![IVec2::ONE]);
    }

    #[test]
    fn test_line_of_sight_clear_diagonal() {
        let grid = Grid::new(10, 10, 1.0);
        assert!(line_of_sight_clear(&grid, IVec2::ZERO, IVec2::new(9, 9)));
        assert!(line_of_sight_clear(&grid, IVec2::new(9, 0), IVec2::new(0, 9)));
    }

    #[test]
    fn test_line_of_sight_blocked_by_any_cell_on_line() {
        let mut grid = Grid::new(10, 10, 1.0);
        let from = IVec2::new(0, 2);
        let to = IVec2::new(9, 6);

        for cell in BresenhamLine::new(from, to).collect::<Vec<_>>() {
            grid.set_blocked(cell.x, cell.y, true);
            assert!(!line_of_sight_clear(&grid, from, to), "blocked at {cell}");
            grid.set_blocked(cell.x, cell.y, false);
        }
        assert!(line_of_sight_clear(&grid, from, to));
    }

    #[test]
    fn test_line_of_sight_out_of_bounds() {
        let grid = Grid::new(5, 5, 1.0);
        assert!(!line_of_sight_clear(&grid, IVec2::ZERO, IVec2::new(5, 0)));
        assert!(!line_of_sight_clear(&grid, IVec2::new(-1, 0), IVec2::ZERO));
    }

    #[test]
    fn test_world_line_of_sight() {
        let mut grid = Grid::new(5, 5, 1.0);
        assert!(has_grid_los(&grid, Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0)));
        grid.set_blocked(2, 0, true);
        assert!(!has_grid_los(&grid, Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0)));
    }
}
