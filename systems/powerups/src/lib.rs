#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Power-up lifecycle system.
//!
//! Every instance runs a timestamp-driven state machine:
//! `Dormant --(random delay)--> Armed --(visible minus blink window)-->
//! Blinking --(blink window)--> Dormant (rescheduled)`. Consumption by
//! the player or by a fill short-circuits straight back to `Dormant` with
//! a fresh respawn delay; there are no timer objects to cancel, only
//! timestamps that stop mattering.

use std::time::Duration;

use rand::Rng;
use zone_capture_arena::{query, Grid};
use zone_capture_core::{CellCoord, PowerUpId, PowerUpKind, PowerUpPhase};

/// Delay and window configuration shared by every instance.
#[derive(Clone, Copy, Debug)]
pub struct Timing {
    dormant_min: f32,
    dormant_max: f32,
    visible_min: f32,
    visible_max: f32,
    blink_window: f32,
}

impl Timing {
    /// Creates a timing configuration from explicit bounds, in seconds.
    #[must_use]
    pub const fn new(
        dormant_min: f32,
        dormant_max: f32,
        visible_min: f32,
        visible_max: f32,
        blink_window: f32,
    ) -> Self {
        Self {
            dormant_min,
            dormant_max,
            visible_min,
            visible_max,
            blink_window,
        }
    }

    /// The standard cadence: 2-5 s dormant, 6-9 s visible, 2 s blinking.
    #[must_use]
    pub const fn standard() -> Self {
        Self::new(2.0, 5.0, 6.0, 9.0, 2.0)
    }
}

/// A single reusable power-up instance owned by the round controller.
#[derive(Clone, Debug)]
pub struct PowerUpInstance {
    id: PowerUpId,
    kind: PowerUpKind,
    phase: PowerUpPhase,
    cell: Option<CellCoord>,
    arm_at: Duration,
    blink_at: Duration,
    expire_at: Duration,
}

impl PowerUpInstance {
    /// Creates a dormant instance due to arm immediately.
    ///
    /// Callers schedule the first spawn delay through the lifecycle.
    #[must_use]
    pub fn new(id: PowerUpId, kind: PowerUpKind) -> Self {
        Self {
            id,
            kind,
            phase: PowerUpPhase::Dormant,
            cell: None,
            arm_at: Duration::ZERO,
            blink_at: Duration::ZERO,
            expire_at: Duration::ZERO,
        }
    }

    /// Identifier assigned by the round controller.
    #[must_use]
    pub const fn id(&self) -> PowerUpId {
        self.id
    }

    /// Variety of the instance.
    #[must_use]
    pub const fn kind(&self) -> PowerUpKind {
        self.kind
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> PowerUpPhase {
        self.phase
    }

    /// Cell the instance occupies while armed or blinking.
    #[must_use]
    pub const fn cell(&self) -> Option<CellCoord> {
        self.cell
    }

    /// Whether the instance is on the board and collectible.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.phase, PowerUpPhase::Armed | PowerUpPhase::Blinking)
    }

    /// Timestamp at which a dormant instance arms.
    #[must_use]
    pub const fn arm_at(&self) -> Duration {
        self.arm_at
    }

    /// Timestamp at which an armed instance starts blinking.
    #[must_use]
    pub const fn blink_at(&self) -> Duration {
        self.blink_at
    }

    /// Timestamp at which a visible instance despawns.
    #[must_use]
    pub const fn expire_at(&self) -> Duration {
        self.expire_at
    }
}

/// Transition taken by an instance during one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleStep {
    /// No timestamp was reached.
    Idle,
    /// The instance armed onto the provided cell.
    Armed(CellCoord),
    /// The instance entered its blink window.
    Blinking,
    /// The instance despawned uncollected and rescheduled itself.
    Despawned,
}

/// Pure system advancing power-up instances against the clock.
#[derive(Clone, Copy, Debug)]
pub struct Lifecycle {
    timing: Timing,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new(Timing::standard())
    }
}

impl Lifecycle {
    /// Creates a lifecycle system with the provided timing.
    #[must_use]
    pub const fn new(timing: Timing) -> Self {
        Self { timing }
    }

    /// Sends the instance dormant with a fresh random respawn delay.
    pub fn schedule_spawn<R: Rng>(&self, instance: &mut PowerUpInstance, now: Duration, rng: &mut R) {
        instance.phase = PowerUpPhase::Dormant;
        instance.cell = None;
        instance.arm_at = now + self.dormant_delay(rng);
    }

    /// Advances the instance's state machine by comparing its timestamps
    /// against the provided clock.
    ///
    /// Arming places the instance on a uniformly random currently empty
    /// cell; if the arena has no open cell left the arm attempt is
    /// rescheduled instead.
    pub fn advance<R: Rng>(
        &self,
        instance: &mut PowerUpInstance,
        grid: &Grid,
        now: Duration,
        rng: &mut R,
    ) -> LifecycleStep {
        match instance.phase {
            PowerUpPhase::Dormant => {
                if now < instance.arm_at {
                    return LifecycleStep::Idle;
                }
                let open = query::empty_cells(grid);
                if open.is_empty() {
                    instance.arm_at = now + self.dormant_delay(rng);
                    return LifecycleStep::Idle;
                }
                let cell = open[rng.gen_range(0..open.len())];
                let visible = rng.gen_range(self.timing.visible_min..self.timing.visible_max);
                instance.cell = Some(cell);
                instance.expire_at = now + Duration::from_secs_f32(visible);
                instance.blink_at =
                    now + Duration::from_secs_f32((visible - self.timing.blink_window).max(0.0));
                instance.phase = PowerUpPhase::Armed;
                LifecycleStep::Armed(cell)
            }
            PowerUpPhase::Armed => {
                if now < instance.blink_at {
                    return LifecycleStep::Idle;
                }
                instance.phase = PowerUpPhase::Blinking;
                LifecycleStep::Blinking
            }
            PowerUpPhase::Blinking => {
                if now < instance.expire_at {
                    return LifecycleStep::Idle;
                }
                self.schedule_spawn(instance, now, rng);
                LifecycleStep::Despawned
            }
        }
    }

    /// Consumes an active instance, by player pickup or by fill.
    ///
    /// The pending blink and despawn timestamps stop mattering; the
    /// instance re-enters dormancy with a fresh respawn delay. The round
    /// controller applies scoring and effects.
    pub fn consume<R: Rng>(&self, instance: &mut PowerUpInstance, now: Duration, rng: &mut R) {
        debug_assert!(instance.is_active(), "only active instances are consumable");
        self.schedule_spawn(instance, now, rng);
    }

    /// Moves an active instance to a fresh random open cell.
    ///
    /// Used after a life loss, when the board is reshuffled.
    pub fn reposition<R: Rng>(&self, instance: &mut PowerUpInstance, grid: &Grid, rng: &mut R) {
        if !instance.is_active() {
            return;
        }
        let open = query::empty_cells(grid);
        if let Some(index) = (!open.is_empty()).then(|| rng.gen_range(0..open.len())) {
            instance.cell = Some(open[index]);
        }
    }

    fn dormant_delay<R: Rng>(&self, rng: &mut R) -> Duration {
        let delay = rng.gen_range(self.timing.dormant_min..self.timing.dormant_max);
        Duration::from_secs_f32(delay)
    }
}

#[cfg(test)]
mod tests {
    use super::{Lifecycle, LifecycleStep, PowerUpInstance};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::time::Duration;
    use zone_capture_arena::{query, Grid};
    use zone_capture_core::{PowerUpId, PowerUpKind, PowerUpPhase};

    const STEP: Duration = Duration::from_millis(100);

    fn small_grid() -> Grid {
        Grid::new(10, 10, 2, 10.0)
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(0xca11)
    }

    fn armed_instance(
        lifecycle: &Lifecycle,
        grid: &Grid,
        rng: &mut ChaCha8Rng,
    ) -> (PowerUpInstance, Duration) {
        let mut instance = PowerUpInstance::new(PowerUpId::new(1), PowerUpKind::ExtraTime);
        lifecycle.schedule_spawn(&mut instance, Duration::ZERO, rng);
        let mut now = Duration::ZERO;
        loop {
            if let LifecycleStep::Armed(_) = lifecycle.advance(&mut instance, grid, now, rng) {
                return (instance, now);
            }
            now += STEP;
            assert!(now < Duration::from_secs(10), "instance never armed");
        }
    }

    #[test]
    fn instances_arm_within_the_configured_window() {
        let lifecycle = Lifecycle::default();
        let grid = small_grid();
        let mut rng = rng();

        let (instance, armed_at) = armed_instance(&lifecycle, &grid, &mut rng);

        assert!(armed_at >= Duration::from_secs(2));
        assert!(armed_at <= Duration::from_secs(5));
        assert_eq!(instance.phase(), PowerUpPhase::Armed);
        let cell = instance.cell().expect("armed instances occupy a cell");
        assert!(query::is_unfilled(&grid, cell));
    }

    #[test]
    fn blinking_covers_the_final_window_before_expiry() {
        let lifecycle = Lifecycle::default();
        let grid = small_grid();
        let mut rng = rng();
        let (mut instance, _) = armed_instance(&lifecycle, &grid, &mut rng);

        let window = instance.expire_at() - instance.blink_at();
        assert!((window.as_secs_f32() - 2.0).abs() < 1e-3);

        let blink_at = instance.blink_at();
        assert_eq!(
            lifecycle.advance(&mut instance, &grid, blink_at, &mut rng),
            LifecycleStep::Blinking
        );

        let expire_at = instance.expire_at();
        assert_eq!(
            lifecycle.advance(&mut instance, &grid, expire_at, &mut rng),
            LifecycleStep::Despawned
        );
        assert_eq!(instance.phase(), PowerUpPhase::Dormant);
        assert_eq!(instance.cell(), None);
        assert!(instance.arm_at() > expire_at);
    }

    #[test]
    fn consumption_cancels_pending_transitions() {
        let lifecycle = Lifecycle::default();
        let grid = small_grid();
        let mut rng = rng();
        let (mut instance, armed_at) = armed_instance(&lifecycle, &grid, &mut rng);
        let old_expire = instance.expire_at();

        lifecycle.consume(&mut instance, armed_at + STEP, &mut rng);

        assert_eq!(instance.phase(), PowerUpPhase::Dormant);
        assert_eq!(instance.cell(), None);
        assert!(instance.arm_at() > armed_at + STEP);

        // The old despawn timestamp no longer fires a transition unless
        // the new arm timestamp has also passed.
        if instance.arm_at() > old_expire {
            assert_eq!(
                lifecycle.advance(&mut instance, &grid, old_expire, &mut rng),
                LifecycleStep::Idle
            );
            assert_eq!(instance.phase(), PowerUpPhase::Dormant);
        }
    }

    #[test]
    fn arming_without_open_cells_reschedules() {
        let lifecycle = Lifecycle::default();
        let mut grid = small_grid();
        let _ = grid.force_claim_remaining();
        let mut rng = rng();
        let mut instance = PowerUpInstance::new(PowerUpId::new(2), PowerUpKind::Freeze);
        lifecycle.schedule_spawn(&mut instance, Duration::ZERO, &mut rng);
        let due = instance.arm_at();

        let step = lifecycle.advance(&mut instance, &grid, due, &mut rng);

        assert_eq!(step, LifecycleStep::Idle);
        assert_eq!(instance.phase(), PowerUpPhase::Dormant);
        assert!(instance.arm_at() > due);
    }

    #[test]
    fn reposition_keeps_active_instances_on_open_cells() {
        let lifecycle = Lifecycle::default();
        let grid = small_grid();
        let mut rng = rng();
        let (mut instance, _) = armed_instance(&lifecycle, &grid, &mut rng);

        lifecycle.reposition(&mut instance, &grid, &mut rng);

        let cell = instance.cell().expect("still active");
        assert!(query::is_unfilled(&grid, cell));
        assert_eq!(instance.phase(), PowerUpPhase::Armed);
    }
}
