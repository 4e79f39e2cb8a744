#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Enemy movement system: projection, reflection and freeze bookkeeping.
//!
//! Enemies advance by linear extrapolation over the tick and reflect off
//! claimed territory. The projected center is sampled against the live
//! trail first, because an enemy crossing the trail is a life-loss event
//! rather than a bounce. Reflection uses the projected center plus four
//! cardinal quarter-tile offsets so that corner hits can flip both axes in
//! the same tick.

use std::time::Duration;

use rand::Rng;
use zone_capture_arena::{query, Grid};
use zone_capture_core::{Axis, CellState, EnemyBehavior, EnemyId, Position, Velocity};

/// Seconds between heading re-rolls for patrol enemies, lower bound.
const REDIRECT_DELAY_MIN: f32 = 3.0;
/// Seconds between heading re-rolls for patrol enemies, upper bound.
const REDIRECT_DELAY_MAX: f32 = 6.0;
/// Fraction of a tile each reflection nudges the enemy out of the wall.
const REFLECTION_NUDGE: f32 = 0.1;

/// A single enemy owned by the round controller.
#[derive(Clone, Debug)]
pub struct Enemy {
    id: EnemyId,
    behavior: EnemyBehavior,
    speed: f32,
    position: Position,
    velocity: Velocity,
    next_redirect_at: Option<Duration>,
    frozen: Option<Frozen>,
}

#[derive(Clone, Copy, Debug)]
struct Frozen {
    until: Duration,
    velocity: Velocity,
    redirect_remaining: Option<Duration>,
}

impl Enemy {
    /// Creates a new enemy at the origin with no heading.
    ///
    /// Callers place it and roll a heading before the first tick.
    #[must_use]
    pub fn new(id: EnemyId, behavior: EnemyBehavior, speed: f32) -> Self {
        Self {
            id,
            behavior,
            speed,
            position: Position::new(0.0, 0.0),
            velocity: Velocity::ZERO,
            next_redirect_at: None,
            frozen: None,
        }
    }

    /// Identifier assigned by the round controller.
    #[must_use]
    pub const fn id(&self) -> EnemyId {
        self.id
    }

    /// Movement archetype of the enemy.
    #[must_use]
    pub const fn behavior(&self) -> EnemyBehavior {
        self.behavior
    }

    /// Current world position.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Current velocity in world units per second.
    #[must_use]
    pub const fn velocity(&self) -> Velocity {
        self.velocity
    }

    /// Whether the enemy is currently halted by a freeze effect.
    #[must_use]
    pub const fn is_frozen(&self) -> bool {
        self.frozen.is_some()
    }

    /// Moves the enemy to the provided position.
    pub fn place(&mut self, position: Position) {
        self.position = position;
    }

    /// Rolls a fresh heading appropriate for the enemy's behavior.
    ///
    /// Diagonal movers pick one of the four diagonals at full speed;
    /// axis-locked movers pick a sign along their axis.
    pub fn roll_heading<R: Rng>(&mut self, rng: &mut R) {
        self.velocity = match self.behavior {
            EnemyBehavior::Bounce | EnemyBehavior::Patrol => {
                let component = self.speed / std::f32::consts::SQRT_2;
                match rng.gen_range(0..4_u8) {
                    0 => Velocity::new(component, component),
                    1 => Velocity::new(component, -component),
                    2 => Velocity::new(-component, component),
                    _ => Velocity::new(-component, -component),
                }
            }
            EnemyBehavior::AxisLocked(Axis::Horizontal) => {
                Velocity::new(signed(self.speed, rng), 0.0)
            }
            EnemyBehavior::AxisLocked(Axis::Vertical) => {
                Velocity::new(0.0, signed(self.speed, rng))
            }
        };
    }

    /// Arms the periodic redirection timer of a patrol enemy.
    ///
    /// Has no effect on other behaviors.
    pub fn schedule_redirect<R: Rng>(&mut self, now: Duration, rng: &mut R) {
        if self.behavior == EnemyBehavior::Patrol {
            let delay = rng.gen_range(REDIRECT_DELAY_MIN..REDIRECT_DELAY_MAX);
            self.next_redirect_at = Some(now + Duration::from_secs_f32(delay));
        }
    }

    /// Drops any active freeze without restoring the captured heading.
    ///
    /// Used when the board reshuffles and a fresh heading is rolled
    /// immediately afterwards.
    pub fn thaw(&mut self) {
        self.frozen = None;
    }

    /// Halts the enemy until the provided deadline.
    ///
    /// The current velocity and the remaining redirect delay are captured
    /// once and restored verbatim when the freeze expires; re-freezing an
    /// already frozen enemy only extends the deadline.
    pub fn freeze(&mut self, now: Duration, until: Duration) {
        match &mut self.frozen {
            Some(frozen) => frozen.until = until,
            None => {
                self.frozen = Some(Frozen {
                    until,
                    velocity: self.velocity,
                    redirect_remaining: self.next_redirect_at.map(|at| at.saturating_sub(now)),
                });
                self.velocity = Velocity::ZERO;
                self.next_redirect_at = None;
            }
        }
    }
}

fn signed<R: Rng>(speed: f32, rng: &mut R) -> f32 {
    if rng.gen::<bool>() {
        speed
    } else {
        -speed
    }
}

/// Result of advancing one enemy for one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// The enemy moved to its projected position.
    Advanced,
    /// The enemy reflected off claimed territory and did not advance.
    Deflected,
    /// The enemy is frozen and skipped motion.
    Frozen,
    /// The enemy's projected center crossed the live trail.
    TrailCut,
}

/// Pure system advancing enemies against the arena state.
#[derive(Debug, Default)]
pub struct Motion;

impl Motion {
    /// Advances a single enemy by one tick.
    ///
    /// Frozen enemies only tick toward their thaw deadline. Patrol
    /// enemies may re-roll their heading before moving. A projected step
    /// onto the live trail reports [`StepOutcome::TrailCut`] without
    /// moving; the round controller turns that into a life loss.
    pub fn advance<R: Rng>(
        &self,
        enemy: &mut Enemy,
        grid: &Grid,
        dt: Duration,
        now: Duration,
        rng: &mut R,
    ) -> StepOutcome {
        if let Some(frozen) = enemy.frozen {
            if now < frozen.until {
                return StepOutcome::Frozen;
            }
            enemy.velocity = frozen.velocity;
            enemy.next_redirect_at = frozen.redirect_remaining.map(|remaining| now + remaining);
            enemy.frozen = None;
        }

        if let Some(at) = enemy.next_redirect_at {
            if now >= at {
                enemy.roll_heading(rng);
                enemy.schedule_redirect(now, rng);
            }
        }

        let dt_seconds = dt.as_secs_f32();
        let next = Position::new(
            enemy.position.x() + enemy.velocity.dx() * dt_seconds,
            enemy.position.y() + enemy.velocity.dy() * dt_seconds,
        );

        if query::state_at(grid, next) == CellState::Trail {
            return StepOutcome::TrailCut;
        }

        let tile = query::tile_length(grid);
        let quarter = tile / 4.0;
        let samples = [
            next,
            Position::new(next.x() - quarter, next.y()),
            Position::new(next.x() + quarter, next.y()),
            Position::new(next.x(), next.y() - quarter),
            Position::new(next.x(), next.y() + quarter),
        ];

        let current_column = tile_index(enemy.position.x(), tile);
        let current_row = tile_index(enemy.position.y(), tile);
        let dx = enemy.velocity.dx();
        let dy = enemy.velocity.dy();
        let mut flip_x = false;
        let mut flip_y = false;

        for sample in samples {
            if query::state_at(grid, sample) != CellState::Claimed {
                continue;
            }
            let sample_column = tile_index(sample.x(), tile);
            let sample_row = tile_index(sample.y(), tile);
            if sample_column != current_column
                && ((dx > 0.0 && sample_column > current_column)
                    || (dx < 0.0 && sample_column < current_column))
            {
                flip_x = true;
            }
            if sample_row != current_row
                && ((dy > 0.0 && sample_row > current_row)
                    || (dy < 0.0 && sample_row < current_row))
            {
                flip_y = true;
            }
        }

        if !flip_x && !flip_y {
            enemy.position = next;
            return StepOutcome::Advanced;
        }

        let nudge = tile * REFLECTION_NUDGE;
        let mut x = enemy.position.x();
        let mut y = enemy.position.y();
        if flip_x {
            enemy.velocity = Velocity::new(-dx, enemy.velocity.dy());
            x += if enemy.velocity.dx() > 0.0 { nudge } else { -nudge };
        }
        if flip_y {
            enemy.velocity = Velocity::new(enemy.velocity.dx(), -dy);
            y += if enemy.velocity.dy() > 0.0 { nudge } else { -nudge };
        }
        enemy.position = Position::new(x, y);
        StepOutcome::Deflected
    }
}

fn tile_index(value: f32, tile: f32) -> i64 {
    (value / tile).floor() as i64
}
