//! Goal-rooted distance field shared by many agents
//!
//! One Dijkstra pass outward from the goal fills a distance for every
//! reachable cell. Agents then steer by repeatedly stepping to their
//! lowest-distance neighbour instead of running their own searches.
//! The field goes stale whenever the goal or the grid's occupancy changes
//! and must be recomputed explicitly.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::f32::consts::SQRT_2;

use glam::IVec2;

use super::grid::Grid;
use super::visibility::gather_neighbors;

#[derive(Debug, Clone, Copy)]
struct Frontier {
    distance: f32,
    cell: IVec2,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cell == other.cell
    }
}

impl Eq for Frontier {}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .partial_cmp(&self.distance)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Distance-to-goal for every cell of a grid
#[derive(Debug, Clone, Default)]
pub struct FlowField {
    goal: Option<IVec2>,
    /// Row-major distances, `f32::INFINITY` where unreachable
    dist: Vec<f32>,
    width: usize,
}

impl FlowField {
    /// Empty field; every query reports unreachable until [`FlowField::compute`]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build and compute in one go
    #[must_use]
    pub fn computed(grid: &Grid, goal: IVec2) -> Self {
        let mut field = Self::new();
        field.compute(grid, goal);
        field
    }

    /// Recompute distances from `goal` over the whole grid.
    ///
    /// A goal outside the grid or on a blocked cell leaves every cell at infinity.
    pub fn compute(&mut self, grid: &Grid, goal: IVec2) {
        self.goal = Some(goal);
        self.width = grid.width;
        self.dist.clear();
        self.dist.resize(grid.cell_count(), f32::INFINITY);

        if !grid.passable(goal.x, goal.y) {
            log::debug!("Flow field goal {goal} is not passable");
            return;
        }

        let mut frontier = BinaryHeap::new();
        self.dist[grid.key(goal.x, goal.y)] = 0.0;
        frontier.push(Frontier {
            distance: 0.0,
            cell: goal,
        });

        while let Some(current) = frontier.pop() {
            if current.distance > self.dist[grid.key(current.cell.x, current.cell.y)] {
                continue;
            }

            for next in gather_neighbors(grid, current.cell) {
                let diagonal = next.x != current.cell.x && next.y != current.cell.y;
                let step = if diagonal { SQRT_2 } else { 1.0 } * grid.step_cost(next.x, next.y);
                let candidate = current.distance + step;
                let key = grid.key(next.x, next.y);
                if candidate < self.dist[key] {
                    self.dist[key] = candidate;
                    frontier.push(Frontier {
                        distance: candidate,
                        cell: next,
                    });
                }
            }
        }
    }

    /// Goal of the last computation
    #[must_use]
    pub fn goal(&self) -> Option<IVec2> {
        self.goal
    }

    /// Recorded distance, infinity when unreachable, outside the grid or never computed
    #[must_use]
    pub fn distance_at(&self, cell: IVec2) -> f32 {
        if cell.x < 0 || cell.y < 0 || self.width == 0 || cell.x as usize >= self.width {
            return f32::INFINITY;
        }
        let key = cell.y as usize * self.width + cell.x as usize;
        self.dist.get(key).copied().unwrap_or(f32::INFINITY)
    }

    /// Whether the goal can be reached from `cell`
    #[must_use]
    pub fn is_reachable(&self, cell: IVec2) -> bool {
        self.distance_at(cell).is_finite()
    }

    /// One gradient-descent step: the neighbour with the strictly lowest
    /// distance, or `current` itself when nothing improves on it.
    #[must_use]
    pub fn best_neighbor(&self, grid: &Grid, current: IVec2) -> IVec2 {
        if self.dist.is_empty() || !grid.in_bounds(current.x, current.y) {
            return current;
        }

        let mut best = self.distance_at(current);
        let mut pick = current;
        for next in gather_neighbors(grid, current) {
            let d = self.distance_at(next);
            if d < best {
                best = d;
                pick = next;
            }
        }
        pick
    }

    /// Follow [`FlowField::best_neighbor`] from `start` to the goal.
    ///
    /// Returns `None` if `start` is unreachable or descent stalls. The walk is
    /// bounded by the grid's cell count.
    #[must_use]
    pub fn trace(&self, grid: &Grid, start: IVec2) -> Option<Vec<IVec2>> {
        let goal = self.goal?;
        if !self.is_reachable(start) {
            return None;
        }

        let mut cells = vec![start];
        let mut current = start;
        for _ in 0..grid.cell_count() {
            if current == goal {
                return Some(cells);
            }
            let next = self.best_neighbor(grid, current);
            if next == current {
                return None;
            }
            cells.push(next);
            current = next;
        }
        (current == goal).then_some(cells)
    }
}
