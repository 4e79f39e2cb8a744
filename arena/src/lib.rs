#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative arena state for Zone Capture.
//!
//! The [`Grid`] owns the dense tile-state matrix, the ordered uncommitted
//! trail, and the flood-fill partition executed when the trail closes.
//! Mutation happens through a small set of inherent operations; read-only
//! access goes through the [`query`] module. The grid is single-threaded
//! and mutated only within one simulation tick.

use std::collections::VecDeque;

use zone_capture_core::{CellCoord, CellState, ClaimedRegion, FillReport, MarkTrail};

/// Dense rectangular tile grid bounded by a permanently claimed margin.
#[derive(Clone, Debug)]
pub struct Grid {
    columns: u32,
    rows: u32,
    margin: u32,
    tile_length: f32,
    cells: Vec<CellState>,
    trail: Vec<CellCoord>,
    claimed_interior: u32,
}

impl Grid {
    /// Creates a fresh arena with an all-empty interior.
    ///
    /// The outer `margin` ring starts permanently claimed so the flood
    /// fill never has to treat the arena edge as a special case. Callers
    /// are expected to have validated the geometry; the margin invariant
    /// is asserted in debug builds.
    #[must_use]
    pub fn new(columns: u32, rows: u32, margin: u32, tile_length: f32) -> Self {
        debug_assert!(margin > 0, "arena requires a claimed margin ring");
        debug_assert!(
            columns > margin * 2 && rows > margin * 2,
            "margin must leave an open interior"
        );

        let capacity = usize::try_from(u64::from(columns) * u64::from(rows)).unwrap_or(0);
        let mut cells = vec![CellState::Empty; capacity];
        for row in 0..rows {
            for column in 0..columns {
                let in_margin = column < margin
                    || column >= columns - margin
                    || row < margin
                    || row >= rows - margin;
                if in_margin {
                    let index = (u64::from(row) * u64::from(columns) + u64::from(column)) as usize;
                    cells[index] = CellState::Claimed;
                }
            }
        }

        Self {
            columns,
            rows,
            margin,
            tile_length,
            cells,
            trail: Vec::new(),
            claimed_interior: 0,
        }
    }

    /// Marks the provided cell as part of the uncommitted trail.
    ///
    /// Only currently empty cells accept the mark; claimed cells and
    /// cells already carrying the trail reject it as a no-op.
    pub fn mark_trail(&mut self, cell: CellCoord) -> MarkTrail {
        let Some(index) = self.index(cell) else {
            return MarkTrail::Rejected;
        };
        if self.cells[index] != CellState::Empty {
            return MarkTrail::Rejected;
        }
        self.cells[index] = CellState::Trail;
        self.trail.push(cell);
        MarkTrail::Marked
    }

    /// Resolves the closed trail: partitions the remaining open space,
    /// claims every capturable region except the largest, and commits the
    /// trail itself.
    ///
    /// Capturable regions are the connected empty regions adjacent to the
    /// trail; regions that never touch the trail are left untouched this
    /// cycle. Among capturable regions of equal maximal size, the one
    /// discovered first in row-major scan order survives. Calling with an
    /// empty trail is a no-op returning an empty report.
    pub fn resolve_trail(&mut self) -> FillReport {
        if self.trail.is_empty() {
            return FillReport {
                regions: Vec::new(),
                filled_percent: self.filled_percent(),
            };
        }

        let mut visited = vec![false; self.cells.len()];
        let mut capturable: Vec<Vec<CellCoord>> = Vec::new();
        let mut survivor: Option<(usize, usize)> = None;

        for row in 0..self.rows {
            for column in 0..self.columns {
                let cell = CellCoord::new(column, row);
                let Some(index) = self.index(cell) else {
                    continue;
                };
                if visited[index] || self.cells[index] != CellState::Empty {
                    continue;
                }
                let (cells, touches_trail) = self.flood_region(cell, &mut visited);
                if !touches_trail {
                    continue;
                }
                let size = cells.len();
                capturable.push(cells);
                match survivor {
                    Some((_, best)) if size <= best => {}
                    _ => survivor = Some((capturable.len() - 1, size)),
                }
            }
        }

        let surviving_index = survivor.map(|(index, _)| index);
        let mut regions = Vec::new();
        for (index, cells) in capturable.into_iter().enumerate() {
            if Some(index) == surviving_index {
                continue;
            }
            for cell in &cells {
                self.claim(*cell);
            }
            regions.push(ClaimedRegion { cells });
        }

        let trail = std::mem::take(&mut self.trail);
        for cell in trail {
            self.claim(cell);
        }

        FillReport {
            regions,
            filled_percent: self.filled_percent(),
        }
    }

    /// Reverts every trail cell to empty and clears the trail list.
    ///
    /// Used on life loss, before the trail had a chance to close.
    pub fn discard_trail(&mut self) {
        let trail = std::mem::take(&mut self.trail);
        for cell in trail {
            if let Some(index) = self.index(cell) {
                debug_assert_eq!(self.cells[index], CellState::Trail);
                self.cells[index] = CellState::Empty;
            }
        }
    }

    /// Claims every remaining empty cell, returning how many changed.
    ///
    /// The full reveal performed when a level completes.
    pub fn force_claim_remaining(&mut self) -> usize {
        let mut claimed = 0;
        for row in 0..self.rows {
            for column in 0..self.columns {
                let cell = CellCoord::new(column, row);
                if let Some(index) = self.index(cell) {
                    if self.cells[index] == CellState::Empty {
                        self.claim(cell);
                        claimed += 1;
                    }
                }
            }
        }
        claimed
    }

    fn claim(&mut self, cell: CellCoord) {
        if let Some(index) = self.index(cell) {
            debug_assert_ne!(self.cells[index], CellState::Claimed);
            self.cells[index] = CellState::Claimed;
            self.claimed_interior = self.claimed_interior.saturating_add(1);
        }
    }

    fn flood_region(&self, start: CellCoord, visited: &mut [bool]) -> (Vec<CellCoord>, bool) {
        let mut queue = VecDeque::new();
        let mut cells = Vec::new();
        let mut touches_trail = false;

        if let Some(index) = self.index(start) {
            visited[index] = true;
            queue.push_back(start);
        }

        while let Some(cell) = queue.pop_front() {
            cells.push(cell);
            for neighbor in cardinal_neighbors(cell, self.columns, self.rows) {
                let Some(index) = self.index(neighbor) else {
                    // Out-of-bounds reads behave as claimed; unreachable
                    // while the margin ring is intact.
                    debug_assert!(false, "flood fill escaped the claimed margin");
                    continue;
                };
                match self.cells[index] {
                    CellState::Empty => {
                        if !visited[index] {
                            visited[index] = true;
                            queue.push_back(neighbor);
                        }
                    }
                    CellState::Trail => touches_trail = true,
                    CellState::Claimed => {}
                }
            }
        }

        (cells, touches_trail)
    }

    fn filled_percent(&self) -> f32 {
        let open_columns = self.columns.saturating_sub(self.margin * 2);
        let open_rows = self.rows.saturating_sub(self.margin * 2);
        let interior = u64::from(open_columns) * u64::from(open_rows);
        if interior == 0 {
            return 100.0;
        }
        self.claimed_interior as f32 / interior as f32 * 100.0
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.columns && cell.row() < self.rows {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

fn cardinal_neighbors(cell: CellCoord, columns: u32, rows: u32) -> impl Iterator<Item = CellCoord> {
    let up = (cell.row() > 0).then(|| CellCoord::new(cell.column(), cell.row() - 1));
    let left = (cell.column() > 0).then(|| CellCoord::new(cell.column() - 1, cell.row()));
    let right =
        (cell.column() + 1 < columns).then(|| CellCoord::new(cell.column() + 1, cell.row()));
    let down = (cell.row() + 1 < rows).then(|| CellCoord::new(cell.column(), cell.row() + 1));
    [up, left, right, down].into_iter().flatten()
}

/// Query functions that provide read-only access to the arena state.
pub mod query {
    use super::Grid;
    use zone_capture_core::{CellCoord, CellState, Position};

    /// State of the provided cell; out-of-bounds coordinates read as
    /// claimed, the safe default that stops propagation.
    #[must_use]
    pub fn cell_state(grid: &Grid, cell: CellCoord) -> CellState {
        grid.index(cell)
            .map_or(CellState::Claimed, |index| grid.cells[index])
    }

    /// Reports whether the provided cell is open, unclaimed space.
    #[must_use]
    pub fn is_unfilled(grid: &Grid, cell: CellCoord) -> bool {
        cell_state(grid, cell) == CellState::Empty
    }

    /// State of the cell under the provided world position; positions
    /// outside the arena read as claimed.
    #[must_use]
    pub fn state_at(grid: &Grid, position: Position) -> CellState {
        cell_at(grid, position).map_or(CellState::Claimed, |cell| cell_state(grid, cell))
    }

    /// Cell containing the provided world position, if inside the arena.
    #[must_use]
    pub fn cell_at(grid: &Grid, position: Position) -> Option<CellCoord> {
        if position.x() < 0.0 || position.y() < 0.0 {
            return None;
        }
        let column = (position.x() / grid.tile_length) as u32;
        let row = (position.y() / grid.tile_length) as u32;
        let cell = CellCoord::new(column, row);
        grid.index(cell).map(|_| cell)
    }

    /// World position of the center of the provided cell.
    #[must_use]
    pub fn cell_center(grid: &Grid, cell: CellCoord) -> Position {
        Position::new(
            cell.column() as f32 * grid.tile_length + grid.tile_length / 2.0,
            cell.row() as f32 * grid.tile_length + grid.tile_length / 2.0,
        )
    }

    /// Share of the interior claimed so far, in percent.
    #[must_use]
    pub fn filled_percent(grid: &Grid) -> f32 {
        grid.filled_percent()
    }

    /// The uncommitted trail in insertion order.
    #[must_use]
    pub fn trail(grid: &Grid) -> &[CellCoord] {
        &grid.trail
    }

    /// Dense row-major view of every cell state, for renderers.
    #[must_use]
    pub fn cell_states(grid: &Grid) -> &[CellState] {
        &grid.cells
    }

    /// Grid dimensions as `(columns, rows)`.
    #[must_use]
    pub fn dimensions(grid: &Grid) -> (u32, u32) {
        (grid.columns, grid.rows)
    }

    /// Width of the claimed margin ring in tiles.
    #[must_use]
    pub fn margin(grid: &Grid) -> u32 {
        grid.margin
    }

    /// Side length of a square tile in world units.
    #[must_use]
    pub fn tile_length(grid: &Grid) -> f32 {
        grid.tile_length
    }

    /// Total arena width in world units.
    #[must_use]
    pub fn width(grid: &Grid) -> f32 {
        grid.columns as f32 * grid.tile_length
    }

    /// Total arena height in world units.
    #[must_use]
    pub fn height(grid: &Grid) -> f32 {
        grid.rows as f32 * grid.tile_length
    }

    /// Enumerates every currently empty cell in row-major order.
    #[must_use]
    pub fn empty_cells(grid: &Grid) -> Vec<CellCoord> {
        let mut cells = Vec::new();
        for row in 0..grid.rows {
            for column in 0..grid.columns {
                let cell = CellCoord::new(column, row);
                if is_unfilled(grid, cell) {
                    cells.push(cell);
                }
            }
        }
        cells
    }

    /// Counts cells currently in the provided state.
    #[must_use]
    pub fn count_state(grid: &Grid, state: CellState) -> usize {
        grid.cells.iter().filter(|cell| **cell == state).count()
    }
}

#[cfg(test)]
mod tests {
    use super::{query, Grid};
    use zone_capture_core::{CellCoord, CellState, MarkTrail, Position};

    /// 10x10 arena, 2-cell margin, 6x6 empty interior of 36 cells.
    fn small_grid() -> Grid {
        Grid::new(10, 10, 2, 10.0)
    }

    fn assert_conservation(grid: &Grid) {
        let total = query::count_state(grid, CellState::Empty)
            + query::count_state(grid, CellState::Claimed)
            + query::count_state(grid, CellState::Trail);
        let (columns, rows) = query::dimensions(grid);
        assert_eq!(total, (columns * rows) as usize);
    }

    fn mark_column(grid: &mut Grid, column: u32, rows: std::ops::RangeInclusive<u32>) {
        for row in rows {
            assert_eq!(
                grid.mark_trail(CellCoord::new(column, row)),
                MarkTrail::Marked
            );
        }
    }

    #[test]
    fn fresh_grid_has_empty_interior_and_claimed_margin() {
        let grid = small_grid();
        assert_eq!(query::count_state(&grid, CellState::Empty), 36);
        assert_eq!(query::cell_state(&grid, CellCoord::new(0, 0)), CellState::Claimed);
        assert_eq!(query::cell_state(&grid, CellCoord::new(2, 2)), CellState::Empty);
        assert_eq!(query::filled_percent(&grid), 0.0);
        assert_conservation(&grid);
    }

    #[test]
    fn mark_trail_rejects_claimed_and_trail_cells() {
        let mut grid = small_grid();
        assert_eq!(grid.mark_trail(CellCoord::new(0, 0)), MarkTrail::Rejected);
        assert_eq!(grid.mark_trail(CellCoord::new(3, 3)), MarkTrail::Marked);
        assert_eq!(grid.mark_trail(CellCoord::new(3, 3)), MarkTrail::Rejected);
        assert_eq!(query::trail(&grid), &[CellCoord::new(3, 3)]);
        assert_conservation(&grid);
    }

    #[test]
    fn trail_preserves_insertion_order() {
        let mut grid = small_grid();
        let cells = [
            CellCoord::new(4, 2),
            CellCoord::new(4, 3),
            CellCoord::new(5, 3),
        ];
        for cell in cells {
            assert_eq!(grid.mark_trail(cell), MarkTrail::Marked);
        }
        assert_eq!(query::trail(&grid), &cells);
    }

    #[test]
    fn resolve_with_empty_trail_is_a_noop() {
        let mut grid = small_grid();
        let before = query::cell_states(&grid).to_vec();
        let report = grid.resolve_trail();
        assert!(report.is_empty());
        assert_eq!(report.filled_percent, 0.0);
        assert_eq!(query::cell_states(&grid), before.as_slice());
    }

    #[test]
    fn resolve_claims_smaller_region_and_commits_trail() {
        let mut grid = small_grid();
        // Vertical cut at column 4: 12 cells west, 18 cells east.
        mark_column(&mut grid, 4, 2..=7);

        let report = grid.resolve_trail();

        assert_eq!(report.regions.len(), 1);
        assert_eq!(report.claimed_cells(), 12);
        // 12 claimed + 6 committed trail cells out of a 36-cell interior.
        assert!((report.filled_percent - 50.0).abs() < f32::EPSILON);
        assert_eq!(query::cell_state(&grid, CellCoord::new(2, 2)), CellState::Claimed);
        assert_eq!(query::cell_state(&grid, CellCoord::new(4, 4)), CellState::Claimed);
        assert_eq!(query::cell_state(&grid, CellCoord::new(6, 4)), CellState::Empty);
        assert_eq!(query::count_state(&grid, CellState::Trail), 0);
        assert_conservation(&grid);
    }

    #[test]
    fn resolve_twice_changes_nothing_further() {
        let mut grid = small_grid();
        mark_column(&mut grid, 4, 2..=7);
        let first = grid.resolve_trail();
        let after_first = query::cell_states(&grid).to_vec();

        let second = grid.resolve_trail();

        assert!(second.is_empty());
        assert_eq!(second.filled_percent, first.filled_percent);
        assert_eq!(query::cell_states(&grid), after_first.as_slice());
    }

    #[test]
    fn equal_size_regions_keep_the_first_discovered() {
        // 11x10 arena, margin 2: interior is 7x6. A cut at column 5
        // leaves 18 cells on each side.
        let mut grid = Grid::new(11, 10, 2, 10.0);
        mark_column(&mut grid, 5, 2..=7);

        let report = grid.resolve_trail();

        assert_eq!(report.regions.len(), 1);
        assert_eq!(report.claimed_cells(), 18);
        // The western region scans first and survives; the east claims.
        assert_eq!(query::cell_state(&grid, CellCoord::new(2, 2)), CellState::Empty);
        assert_eq!(query::cell_state(&grid, CellCoord::new(8, 2)), CellState::Claimed);
    }

    #[test]
    fn non_separating_trail_commits_without_claiming() {
        let mut grid = small_grid();
        mark_column(&mut grid, 4, 2..=4);

        let report = grid.resolve_trail();

        assert!(report.is_empty());
        // Only the three committed trail cells fill.
        assert!((report.filled_percent - 3.0 / 36.0 * 100.0).abs() < 1e-4);
        assert_eq!(query::count_state(&grid, CellState::Trail), 0);
        assert_conservation(&grid);
    }

    #[test]
    fn discard_reverts_every_trail_cell() {
        let mut grid = small_grid();
        mark_column(&mut grid, 4, 2..=6);
        assert_eq!(query::count_state(&grid, CellState::Trail), 5);

        grid.discard_trail();

        assert_eq!(query::count_state(&grid, CellState::Trail), 0);
        assert_eq!(query::count_state(&grid, CellState::Empty), 36);
        assert!(query::trail(&grid).is_empty());
        assert_conservation(&grid);
    }

    #[test]
    fn filled_percent_is_monotonic_across_resolutions() {
        let mut grid = small_grid();
        let mut last = query::filled_percent(&grid);

        mark_column(&mut grid, 4, 2..=7);
        let after_cut = grid.resolve_trail().filled_percent;
        assert!(after_cut >= last);
        last = after_cut;

        mark_column(&mut grid, 6, 2..=7);
        let after_second = grid.resolve_trail().filled_percent;
        assert!(after_second >= last);
    }

    #[test]
    fn force_claim_completes_the_interior() {
        let mut grid = small_grid();
        mark_column(&mut grid, 4, 2..=7);
        let _ = grid.resolve_trail();

        let claimed = grid.force_claim_remaining();

        assert_eq!(claimed, 18);
        assert_eq!(query::count_state(&grid, CellState::Empty), 0);
        assert!((query::filled_percent(&grid) - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn out_of_bounds_reads_as_claimed() {
        let grid = small_grid();
        assert_eq!(
            query::cell_state(&grid, CellCoord::new(99, 0)),
            CellState::Claimed
        );
        assert_eq!(
            query::state_at(&grid, Position::new(-5.0, 20.0)),
            CellState::Claimed
        );
        assert_eq!(
            query::state_at(&grid, Position::new(25.0, 25.0)),
            CellState::Empty
        );
    }

    #[test]
    fn cell_at_maps_world_positions_onto_tiles() {
        let grid = small_grid();
        assert_eq!(
            query::cell_at(&grid, Position::new(47.0, 23.0)),
            Some(CellCoord::new(4, 2))
        );
        assert_eq!(query::cell_at(&grid, Position::new(500.0, 0.0)), None);
        let center = query::cell_center(&grid, CellCoord::new(4, 2));
        assert_eq!(center, Position::new(45.0, 25.0));
    }

    #[test]
    fn empty_cells_shrink_as_territory_claims() {
        let mut grid = small_grid();
        assert_eq!(query::empty_cells(&grid).len(), 36);
        mark_column(&mut grid, 4, 2..=7);
        let _ = grid.resolve_trail();
        assert_eq!(query::empty_cells(&grid).len(), 18);
    }
}
