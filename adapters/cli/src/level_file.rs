//! Loading and validation of TOML level files.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use zone_capture_core::{
    Axis, EnemyBehavior, EnemySpawn, EngineConfig, LevelConfig, PowerUpKind, PowerUpSpawn,
};

/// Parses and validates a level file's contents.
pub(crate) fn parse(text: &str) -> Result<EngineConfig> {
    let config: EngineConfig = toml::from_str(text).context("malformed level file")?;
    config
        .validate()
        .context("level file describes an unplayable session")?;
    Ok(config)
}

/// Loads a level file from disk.
pub(crate) fn load(path: &Path) -> Result<EngineConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading level file {}", path.display()))?;
    parse(&text)
}

/// The built-in two-level demo session.
pub(crate) fn demo_config(seed: u64) -> EngineConfig {
    let opening = LevelConfig::new(
        vec![
            EnemySpawn::new(EnemyBehavior::Bounce, 100.0, 2),
            EnemySpawn::new(EnemyBehavior::Patrol, 80.0, 1),
        ],
        vec![
            PowerUpSpawn::new(PowerUpKind::ExtraLife, 1),
            PowerUpSpawn::new(PowerUpKind::ExtraTime, 1),
        ],
        60.0,
        50.0,
    );
    let gauntlet = LevelConfig::new(
        vec![
            EnemySpawn::new(EnemyBehavior::Bounce, 100.0, 2),
            EnemySpawn::new(EnemyBehavior::Bounce, 90.0, 1),
            EnemySpawn::new(EnemyBehavior::Patrol, 80.0, 1),
            EnemySpawn::new(EnemyBehavior::AxisLocked(Axis::Vertical), 150.0, 1),
            EnemySpawn::new(EnemyBehavior::AxisLocked(Axis::Horizontal), 150.0, 1),
        ],
        vec![
            PowerUpSpawn::new(PowerUpKind::ExtraLife, 1),
            PowerUpSpawn::new(PowerUpKind::ExtraTime, 1),
            PowerUpSpawn::new(PowerUpKind::ExtraSpeed, 1),
            PowerUpSpawn::new(PowerUpKind::Freeze, 1),
        ],
        90.0,
        60.0,
    );
    EngineConfig::new(40, 48, 3, 10.0, 200.0, seed, vec![opening, gauntlet])
}

#[cfg(test)]
mod tests {
    use super::{demo_config, parse};
    use zone_capture_core::{Axis, EnemyBehavior};

    const SAMPLE: &str = r#"
columns = 40
rows = 48
margin = 3
tile_length = 10.0
player_speed = 200.0
session_seed = 7

[[levels]]
time_limit = 60.0
finish_percent = 50.0

[[levels.enemies]]
behavior = "bounce"
speed = 100.0
count = 2

[[levels.enemies]]
behavior = "patrol-interval"
speed = 80.0
count = 1

[[levels.enemies]]
behavior = { axis-locked = "vertical" }
speed = 150.0
count = 1

[[levels.powerups]]
kind = "extra-time"
count = 2
"#;

    #[test]
    fn sample_level_file_parses() {
        let config = parse(SAMPLE).expect("sample parses");
        assert_eq!(config.columns(), 40);
        assert_eq!(config.levels().len(), 1);
        let level = &config.levels()[0];
        assert_eq!(level.total_enemies(), 4);
        assert_eq!(level.total_powerups(), 2);
        assert_eq!(
            level.enemies()[2].behavior(),
            EnemyBehavior::AxisLocked(Axis::Vertical)
        );
    }

    #[test]
    fn unplayable_sessions_are_rejected() {
        let broken = SAMPLE.replace("finish_percent = 50.0", "finish_percent = 0.0");
        let error = parse(&broken).expect_err("threshold of zero is unplayable");
        assert!(error.to_string().contains("unplayable"));
    }

    #[test]
    fn garbage_is_reported_as_malformed() {
        let error = parse("columns = \"many\"").expect_err("not a config");
        assert!(error.to_string().contains("malformed"));
    }

    #[test]
    fn demo_config_is_playable() {
        assert!(demo_config(1).validate().is_ok());
    }
}
