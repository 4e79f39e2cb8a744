#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Trail tracking system that converts player movement into grid moves.
//!
//! Each tick the tracker derives the player's current cell and drives the
//! arena: open cells extend the uncommitted trail, claimed cells close a
//! non-empty trail and trigger the partition, and re-entering the live
//! trail anywhere but its most recent cell signals a cut.

use zone_capture_arena::{query, Grid};
use zone_capture_core::{CellCoord, CellState, FillReport, MarkTrail, Position};

/// Pure system that advances the trail from the player's position.
#[derive(Debug, Default)]
pub struct TrailTracker;

/// Outcome of tracking the player for one tick.
#[derive(Clone, Debug, PartialEq)]
pub enum TrailStep {
    /// Nothing changed: the player coasted over claimed ground, stayed on
    /// the trail head, or stands outside the arena.
    Coasting,
    /// The trail grew by the provided cell.
    Extended(CellCoord),
    /// The trail closed against claimed territory and was resolved.
    Closed(FillReport),
    /// The player re-entered its own live trail; a life-loss event.
    Cut,
}

impl TrailTracker {
    /// Tracks the player's position against the arena for one tick.
    ///
    /// Invokes at most one trail resolution, per the tick ordering
    /// contract of the round controller.
    pub fn track(&self, position: Position, grid: &mut Grid) -> TrailStep {
        let Some(cell) = query::cell_at(grid, position) else {
            return TrailStep::Coasting;
        };

        match query::cell_state(grid, cell) {
            CellState::Empty => match grid.mark_trail(cell) {
                MarkTrail::Marked => TrailStep::Extended(cell),
                MarkTrail::Rejected => TrailStep::Coasting,
            },
            CellState::Claimed => {
                if query::trail(grid).is_empty() {
                    TrailStep::Coasting
                } else {
                    TrailStep::Closed(grid.resolve_trail())
                }
            }
            CellState::Trail => {
                if query::trail(grid).last() == Some(&cell) {
                    TrailStep::Coasting
                } else {
                    TrailStep::Cut
                }
            }
        }
    }
}
