/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to defaults if the file is missing, incomplete or unparsable,
/// then validates ranges: a value that would break an invariant (negative
/// cooldown, air control above 1) is a hard error, not a silent clamp.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::domain::ai::ContactPolicy;
use crate::domain::motion::{MotionKind, MotionPolicy};
use crate::error::ConfigError;

// ── Public Config Structs ──

#[derive(Clone, Debug, Default)]
pub struct GameConfig {
    pub player: PlayerConfig,
    pub attack: AttackConfig,
    pub enemy: EnemyConfig,
    pub timer: TimerConfig,
    pub pickup: PickupConfig,
    pub presentation: PresentationConfig,
    pub tick: LoopConfig,
    pub gamepad: GamepadConfig,
    pub level_path: Option<PathBuf>,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct PlayerConfig {
    pub max_speed: f32,
    pub jump_height: f32,
    pub gravity_scale: f32,
    pub air_control: f32,
    pub deadzone: f32,
    pub motion: MotionKind,
    pub smoothing: f32,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct AttackConfig {
    pub duration: f32,
    pub cooldown: f32,
    pub radius: f32,
    pub reach: f32,
    pub cone_dot: f32,
    pub cancel_on_death: bool,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct EnemyConfig {
    pub sight_range: f32,
    pub dash_speed: f32,
    pub bounce_cooldown: f32,
    pub contact_cooldown: f32,
    pub contact_penalty: f32,
    pub bounce_distance: f32,
    pub death_delay: f32,
    pub time_bonus: f32,
    pub contact_policy: ContactPolicy,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct TimerConfig {
    pub initial_duration: f64,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct PickupConfig {
    pub time_value: f32,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct PresentationConfig {
    pub game_over_delay: f32,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct LoopConfig {
    pub physics_step_ms: u64,
    pub frame_sleep_ms: u64,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct GamepadConfig {
    pub jump: Vec<String>,
    pub attack: Vec<String>,
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
}

impl PlayerConfig {
    pub fn motion_policy(&self) -> MotionPolicy {
        MotionPolicy::from_kind(self.motion, self.smoothing)
    }
}

// ── TOML Schema ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    player: PlayerConfig,
    #[serde(default)]
    attack: AttackConfig,
    #[serde(default)]
    enemy: EnemyConfig,
    #[serde(default)]
    timer: TimerConfig,
    #[serde(default)]
    pickup: PickupConfig,
    #[serde(default)]
    presentation: PresentationConfig,
    #[serde(default, rename = "loop")]
    tick: LoopConfig,
    #[serde(default)]
    gamepad: GamepadConfig,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug, Default)]
struct TomlGeneral {
    #[serde(default)]
    level: Option<String>,
}

// ── Defaults ──

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig {
            max_speed: 3.4,
            jump_height: 6.5,
            gravity_scale: 1.5,
            air_control: 0.5,
            deadzone: 0.1,
            motion: MotionKind::Snap,
            smoothing: 0.2,
        }
    }
}

impl Default for AttackConfig {
    fn default() -> Self {
        AttackConfig {
            duration: 0.5,
            cooldown: 0.3,
            radius: 1.5,
            reach: 0.5,
            cone_dot: 0.3,
            cancel_on_death: true,
        }
    }
}

impl Default for EnemyConfig {
    fn default() -> Self {
        EnemyConfig {
            sight_range: 5.0,
            dash_speed: 8.0,
            bounce_cooldown: 1.0,
            contact_cooldown: 1.0,
            contact_penalty: 3.0,
            bounce_distance: 0.5,
            death_delay: 0.4,
            time_bonus: 5.0,
            contact_policy: ContactPolicy::BounceAndDrain,
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        TimerConfig { initial_duration: 30.0 }
    }
}

impl Default for PickupConfig {
    fn default() -> Self {
        PickupConfig { time_value: 3.0 }
    }
}

impl Default for PresentationConfig {
    fn default() -> Self {
        PresentationConfig { game_over_delay: 1.5 }
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        LoopConfig { physics_step_ms: 20, frame_sleep_ms: 5 }
    }
}

impl Default for GamepadConfig {
    fn default() -> Self {
        GamepadConfig {
            jump: vec!["A".into()],
            attack: vec!["X".into(), "B".into(), "R1".into()],
            confirm: vec!["Start".into()],
            cancel: vec!["Select".into()],
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or keys fall back to defaults; a parse error is logged
    /// and ignored. Range violations are returned as errors.
    pub fn load() -> Result<Self, ConfigError> {
        let search_dirs = candidate_dirs();
        let config = match search_dirs.iter().map(|d| d.join("config.toml")).find(|p| p.exists()) {
            Some(path) => match Self::load_from(&path) {
                Ok(cfg) => {
                    info!(path = %path.display(), "loaded config");
                    cfg
                }
                Err(ConfigError::Parse { path, source }) => {
                    warn!(path = %path.display(), error = %source, "config parse error, using defaults");
                    GameConfig::default()
                }
                Err(e) => return Err(e),
            },
            None => GameConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Load a specific file. Relative level paths resolve against its directory.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if let (Some(level), Some(dir)) = (config.level_path.as_mut(), path.parent()) {
            if level.is_relative() {
                *level = dir.join(&*level);
            }
        }
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        let t: TomlConfig = toml::from_str(text)?;
        Ok(GameConfig {
            player: t.player,
            attack: t.attack,
            enemy: t.enemy,
            timer: t.timer,
            pickup: t.pickup,
            presentation: t.presentation,
            tick: t.tick,
            gamepad: t.gamepad,
            level_path: t.general.level.map(PathBuf::from),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.player;
        non_negative("player.max_speed", p.max_speed)?;
        non_negative("player.jump_height", p.jump_height)?;
        unit_interval("player.air_control", p.air_control)?;
        unit_interval("player.deadzone", p.deadzone)?;
        if !(p.smoothing > 0.0 && p.smoothing <= 1.0) {
            return Err(ConfigError::OutOfRange {
                key: "player.smoothing",
                value: p.smoothing as f64,
                expected: "0 < x <= 1",
            });
        }

        let a = &self.attack;
        non_negative("attack.duration", a.duration)?;
        non_negative("attack.cooldown", a.cooldown)?;
        non_negative("attack.radius", a.radius)?;
        non_negative("attack.reach", a.reach)?;
        if !(-1.0..=1.0).contains(&a.cone_dot) {
            return Err(ConfigError::OutOfRange {
                key: "attack.cone_dot",
                value: a.cone_dot as f64,
                expected: "-1 <= x <= 1",
            });
        }

        let e = &self.enemy;
        non_negative("enemy.sight_range", e.sight_range)?;
        non_negative("enemy.dash_speed", e.dash_speed)?;
        non_negative("enemy.bounce_cooldown", e.bounce_cooldown)?;
        non_negative("enemy.contact_cooldown", e.contact_cooldown)?;
        non_negative("enemy.contact_penalty", e.contact_penalty)?;
        non_negative("enemy.bounce_distance", e.bounce_distance)?;
        non_negative("enemy.death_delay", e.death_delay)?;
        non_negative("enemy.time_bonus", e.time_bonus)?;

        if !(self.timer.initial_duration > 0.0) {
            return Err(ConfigError::OutOfRange {
                key: "timer.initial_duration",
                value: self.timer.initial_duration,
                expected: "x > 0",
            });
        }
        non_negative("pickup.time_value", self.pickup.time_value)?;
        non_negative("presentation.game_over_delay", self.presentation.game_over_delay)?;
        if self.tick.physics_step_ms == 0 {
            return Err(ConfigError::OutOfRange {
                key: "loop.physics_step_ms",
                value: 0.0,
                expected: "x >= 1",
            });
        }
        Ok(())
    }
}

fn non_negative(key: &'static str, value: f32) -> Result<(), ConfigError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { key, value: value as f64, expected: "x >= 0" })
    }
}

fn unit_interval(key: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { key, value: value as f64, expected: "0 <= x <= 1" })
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so a linked binary still finds config next to the real one.
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = GameConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.player.max_speed, 3.4);
        assert_eq!(cfg.attack.cone_dot, 0.3);
        assert_eq!(cfg.timer.initial_duration, 30.0);
        assert_eq!(cfg.enemy.contact_policy, ContactPolicy::BounceAndDrain);
        assert!(cfg.level_path.is_none());
        cfg.validate().unwrap();
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let cfg = GameConfig::from_toml_str(
            "[player]\nmax_speed = 5.0\nmotion = \"smoothed\"\n\n[enemy]\ncontact_policy = \"kill\"\n",
        )
        .unwrap();
        assert_eq!(cfg.player.max_speed, 5.0);
        assert_eq!(cfg.player.jump_height, 6.5);
        assert_eq!(cfg.player.motion_policy(), MotionPolicy::Smoothed { blend: 0.2 });
        assert_eq!(cfg.enemy.contact_policy, ContactPolicy::KillPlayer);
        assert_eq!(cfg.enemy.sight_range, 5.0);
    }

    #[test]
    fn loop_section_maps_to_tick() {
        let cfg = GameConfig::from_toml_str("[loop]\nphysics_step_ms = 10\n").unwrap();
        assert_eq!(cfg.tick.physics_step_ms, 10);
        assert_eq!(cfg.tick.frame_sleep_ms, 5);
    }

    #[test]
    fn unknown_policy_is_parse_error() {
        assert!(GameConfig::from_toml_str("[enemy]\ncontact_policy = \"both\"\n").is_err());
    }

    #[test]
    fn air_control_above_one_rejected() {
        let mut cfg = GameConfig::default();
        cfg.player.air_control = 1.5;
        match cfg.validate() {
            Err(ConfigError::OutOfRange { key, .. }) => assert_eq!(key, "player.air_control"),
            other => panic!("expected out of range, got {other:?}"),
        }
    }

    #[test]
    fn negative_cooldown_rejected() {
        let mut cfg = GameConfig::default();
        cfg.attack.cooldown = -0.1;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn load_from_resolves_relative_level() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[general]\nlevel = \"levels/one.txt\"\n").unwrap();
        let cfg = GameConfig::load_from(&path).unwrap();
        assert_eq!(cfg.level_path, Some(dir.path().join("levels/one.txt")));
    }

    #[test]
    fn load_from_reports_parse_error_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[player\nmax_speed = ").unwrap();
        match GameConfig::load_from(&path) {
            Err(ConfigError::Parse { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let cfg = GameConfig::from_toml_str(include_str!("../config.toml")).unwrap();
        cfg.validate().unwrap();
        let d = GameConfig::default();
        assert_eq!(cfg.player.max_speed, d.player.max_speed);
        assert_eq!(cfg.enemy.contact_policy, d.enemy.contact_policy);
        assert_eq!(cfg.timer.initial_duration, d.timer.initial_duration);
        assert_eq!(cfg.gamepad.attack, d.gamepad.attack);
        assert!(cfg.level_path.is_none());
    }
}
