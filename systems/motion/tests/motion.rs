use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use zone_capture_arena::Grid;
use zone_capture_core::{Axis, CellCoord, EnemyBehavior, EnemyId, MarkTrail, Position, Velocity};
use zone_capture_system_motion::{Enemy, Motion, StepOutcome};

const TICK: Duration = Duration::from_millis(100);

fn small_grid() -> Grid {
    Grid::new(10, 10, 2, 10.0)
}

fn rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(0x5eed)
}

fn bouncer_at(x: f32, y: f32) -> Enemy {
    let mut enemy = Enemy::new(EnemyId::new(1), EnemyBehavior::Bounce, 100.0);
    enemy.place(Position::new(x, y));
    enemy.roll_heading(&mut rng());
    enemy
}

#[test]
fn open_space_advances_by_velocity() {
    let grid = small_grid();
    let motion = Motion;
    let mut enemy = bouncer_at(45.0, 45.0);
    let velocity = enemy.velocity();
    let mut rng = rng();

    let outcome = motion.advance(&mut enemy, &grid, TICK, Duration::ZERO, &mut rng);

    assert_eq!(outcome, StepOutcome::Advanced);
    let expected = Position::new(
        45.0 + velocity.dx() * TICK.as_secs_f32(),
        45.0 + velocity.dy() * TICK.as_secs_f32(),
    );
    assert_eq!(enemy.position(), expected);
}

#[test]
fn claimed_territory_reflects_the_crossing_axis() {
    let grid = small_grid();
    let motion = Motion;
    // Heading straight at the eastern margin.
    let mut enemy = Enemy::new(EnemyId::new(2), EnemyBehavior::AxisLocked(Axis::Horizontal), 100.0);
    enemy.place(Position::new(78.0, 45.0));
    let mut rng = rng();
    enemy.roll_heading(&mut rng);
    let inbound = enemy.velocity().dx().abs();
    // Force an eastward heading regardless of the rolled sign by walking
    // until a deflection happens.
    let mut outcome = StepOutcome::Advanced;
    let mut now = Duration::ZERO;
    for _ in 0..40 {
        outcome = motion.advance(&mut enemy, &grid, TICK, now, &mut rng);
        now += TICK;
        if outcome == StepOutcome::Deflected {
            break;
        }
    }

    assert_eq!(outcome, StepOutcome::Deflected);
    assert_eq!(enemy.velocity().dx().abs(), inbound);
    assert_eq!(enemy.velocity().dy(), 0.0);
}

#[test]
fn corner_hits_flip_both_axes() {
    let grid = small_grid();
    let motion = Motion;
    let mut enemy = Enemy::new(EnemyId::new(3), EnemyBehavior::Bounce, 100.0);
    let mut rng = rng();
    // Tucked against the south-east interior corner; a single tick aimed
    // outward crosses into claimed territory on both axes at once.
    enemy.place(Position::new(77.0, 77.0));
    loop {
        enemy.roll_heading(&mut rng);
        if enemy.velocity().dx() > 0.0 && enemy.velocity().dy() > 0.0 {
            break;
        }
    }

    let outcome = motion.advance(&mut enemy, &grid, TICK, Duration::ZERO, &mut rng);

    assert_eq!(outcome, StepOutcome::Deflected);
    assert!(enemy.velocity().dx() < 0.0);
    assert!(enemy.velocity().dy() < 0.0);
}

#[test]
fn crossing_the_live_trail_reports_a_cut() {
    let mut grid = small_grid();
    let motion = Motion;
    assert_eq!(grid.mark_trail(CellCoord::new(5, 4)), MarkTrail::Marked);

    let mut enemy = Enemy::new(EnemyId::new(4), EnemyBehavior::AxisLocked(Axis::Horizontal), 100.0);
    enemy.place(Position::new(45.0, 45.0));
    let mut rng = rng();
    enemy.roll_heading(&mut rng);
    // Walk until the projection lands on the trail cell; with a
    // horizontal lock the enemy can only approach along row 4.
    let mut outcome = StepOutcome::Advanced;
    let mut now = Duration::ZERO;
    for _ in 0..100 {
        let before = enemy.position();
        outcome = motion.advance(&mut enemy, &grid, TICK, now, &mut rng);
        now += TICK;
        if outcome == StepOutcome::TrailCut {
            assert_eq!(enemy.position(), before);
            break;
        }
    }

    assert_eq!(outcome, StepOutcome::TrailCut);
}

#[test]
fn frozen_enemies_hold_still_and_thaw_exactly() {
    let grid = small_grid();
    let motion = Motion;
    let mut enemy = bouncer_at(45.0, 45.0);
    let mut rng = rng();
    let heading = enemy.velocity();
    assert_ne!(heading, Velocity::ZERO);

    enemy.freeze(Duration::from_secs(1), Duration::from_secs(4));
    assert!(enemy.is_frozen());
    assert_eq!(enemy.velocity(), Velocity::ZERO);

    let outcome = motion.advance(&mut enemy, &grid, TICK, Duration::from_secs(2), &mut rng);
    assert_eq!(outcome, StepOutcome::Frozen);
    assert_eq!(enemy.position(), Position::new(45.0, 45.0));

    let outcome = motion.advance(&mut enemy, &grid, TICK, Duration::from_secs(4), &mut rng);
    assert_ne!(outcome, StepOutcome::Frozen);
    assert!(!enemy.is_frozen());
    assert_eq!(enemy.velocity(), heading);
}

#[test]
fn refreezing_extends_without_overwriting_the_saved_heading() {
    let grid = small_grid();
    let motion = Motion;
    let mut enemy = bouncer_at(45.0, 45.0);
    let mut rng = rng();
    let heading = enemy.velocity();

    enemy.freeze(Duration::from_secs(1), Duration::from_secs(3));
    enemy.freeze(Duration::from_secs(2), Duration::from_secs(5));

    let outcome = motion.advance(&mut enemy, &grid, TICK, Duration::from_secs(4), &mut rng);
    assert_eq!(outcome, StepOutcome::Frozen);

    let _ = motion.advance(&mut enemy, &grid, TICK, Duration::from_secs(5), &mut rng);
    assert_eq!(enemy.velocity(), heading);
}

#[test]
fn patrol_enemies_re_roll_their_heading_on_schedule() {
    let grid = small_grid();
    let motion = Motion;
    let mut rng = rng();
    let mut enemy = Enemy::new(EnemyId::new(5), EnemyBehavior::Patrol, 80.0);
    enemy.place(Position::new(45.0, 45.0));
    enemy.roll_heading(&mut rng);
    enemy.schedule_redirect(Duration::ZERO, &mut rng);

    let component = 80.0 / std::f32::consts::SQRT_2;
    let mut now = Duration::ZERO;
    for _ in 0..100 {
        let _ = motion.advance(&mut enemy, &grid, TICK, now, &mut rng);
        now += TICK;
        // Re-placing keeps the walk away from walls so only the redirect
        // timer can change the heading.
        enemy.place(Position::new(45.0, 45.0));
        assert!((enemy.velocity().dx().abs() - component).abs() < 1e-3);
        assert!((enemy.velocity().dy().abs() - component).abs() < 1e-3);
    }
}

#[test]
fn axis_locked_enemies_stay_on_their_axis() {
    let grid = small_grid();
    let motion = Motion;
    let mut rng = rng();
    let mut enemy = Enemy::new(EnemyId::new(6), EnemyBehavior::AxisLocked(Axis::Vertical), 150.0);
    enemy.place(Position::new(45.0, 45.0));
    enemy.roll_heading(&mut rng);

    let mut now = Duration::ZERO;
    for _ in 0..100 {
        let _ = motion.advance(&mut enemy, &grid, TICK, now, &mut rng);
        now += TICK;
        assert_eq!(enemy.velocity().dx(), 0.0);
        assert_eq!(enemy.velocity().dy().abs(), 150.0);
        assert_eq!(enemy.position().x(), 45.0);
    }
}
