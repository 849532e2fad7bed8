//! A* pathfinding on a 2D grid
//!
//! 8-directional search with an octile heuristic, followed by line-of-sight
//! straightening so agents get a short list of waypoints instead of one per cell.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::f32::consts::SQRT_2;

use glam::{IVec2, Vec3};
use rustc_hash::FxHashMap;

use super::grid::Grid;
use super::visibility::{gather_neighbors, line_of_sight_clear};

/// Result of pathfinding
///
/// A start cell equal to the goal yields `ok = true` with exactly one cell
/// and one waypoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridPath {
    /// Whether a path was found
    pub ok: bool,
    /// Simplified cell path, start first
    pub cells: Vec<IVec2>,
    /// World-space waypoints matching `cells`
    pub waypoints: Vec<Vec3>,
}

impl GridPath {
    /// Failed search
    #[must_use]
    pub fn failed() -> Self {
        Self::default()
    }

    /// Check if the path has no waypoints
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Total world-space length along the waypoints
    #[must_use]
    pub fn length(&self) -> f32 {
        self.waypoints
            .windows(2)
            .map(|pair| pair[0].distance(pair[1]))
            .sum()
    }
}

/// Octile distance, admissible for 8-directional movement
#[must_use]
pub fn octile_distance(a: IVec2, b: IVec2) -> f32 {
    let d = (a - b).abs();
    let min = d.x.min(d.y) as f32;
    let max = d.x.max(d.y) as f32;
    min * SQRT_2 + (max - min)
}

/// A* node for priority queue
#[derive(Debug, Clone, Copy)]
struct Node {
    cell: IVec2,
    g_cost: f32, // Cost from start
    f_cost: f32, // g_cost + heuristic
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.cell == other.cell
    }
}

impl Eq for Node {}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse for min-heap
        other
            .f_cost
            .partial_cmp(&self.f_cost)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find a path between two cells using A*
///
/// Fails immediately, without searching, when either endpoint is outside the
/// grid or the goal is blocked.
#[must_use]
pub fn find_path(grid: &Grid, start: IVec2, goal: IVec2, y_level: f32) -> GridPath {
    if !grid.in_bounds(start.x, start.y) || !grid.passable(goal.x, goal.y) {
        return GridPath::failed();
    }

    let mut open_set = BinaryHeap::new();
    let mut came_from: FxHashMap<IVec2, IVec2> = FxHashMap::default();
    let mut g_score: FxHashMap<IVec2, f32> = FxHashMap::default();

    g_score.insert(start, 0.0);
    open_set.push(Node {
        cell: start,
        g_cost: 0.0,
        f_cost: octile_distance(start, goal),
    });

    let mut reached = start == goal;
    while let Some(current) = open_set.pop() {
        if current.cell == goal {
            reached = true;
            break;
        }
        if current.g_cost > g_score.get(&current.cell).copied().unwrap_or(f32::MAX) {
            continue; // stale entry
        }

        for next in gather_neighbors(grid, current.cell) {
            let diagonal = next.x != current.cell.x && next.y != current.cell.y;
            let step = if diagonal { SQRT_2 } else { 1.0 };
            let tentative_g = current.g_cost + step * grid.step_cost(next.x, next.y);

            if tentative_g < g_score.get(&next).copied().unwrap_or(f32::MAX) {
                came_from.insert(next, current.cell);
                g_score.insert(next, tentative_g);
                open_set.push(Node {
                    cell: next,
                    g_cost: tentative_g,
                    f_cost: tentative_g + octile_distance(next, goal),
                });
            }
        }
    }

    if !reached {
        log::trace!("A*: no path from {start} to {goal}");
        return GridPath::failed();
    }

    // Reconstruct path
    let mut cells = vec![goal];
    let mut curr = goal;
    while curr != start {
        match came_from.get(&curr) {
            Some(&prev) => {
                cells.push(prev);
                curr = prev;
            }
            None => break,
        }
    }
    cells.reverse();

    let cells = straighten(grid, &cells);
    let waypoints = cells
        .iter()
        .map(|&cell| grid.cell_to_world(cell, y_level))
        .collect();

    GridPath {
        ok: true,
        cells,
        waypoints,
    }
}

/// Find a path between two world positions
#[must_use]
pub fn find_path_world(grid: &Grid, start: Vec3, goal: Vec3, y_level: f32) -> GridPath {
    find_path(
        grid,
        grid.world_to_cell(start),
        grid.world_to_cell(goal),
        y_level,
    )
}

/// Drop intermediate cells that are visible from the current anchor.
///
/// From each anchor, jump to the farthest later cell with a clear line of
/// sight; the next cell is always taken when nothing farther is visible.
fn straighten(grid: &Grid, cells: &[IVec2]) -> Vec<IVec2> {
    let Some(&first) = cells.first() else {
        return Vec::new();
    };

    let mut simplified = vec![first];
    let mut anchor = 0;
    while anchor + 1 < cells.len() {
        let mut next = cells.len() - 1;
        while next > anchor + 1 && !line_of_sight_clear(grid, cells[anchor], cells[next]) {
            next -= 1;
        }
        simplified.push(cells[next]);
        anchor = next;
    }
    simplified
}
