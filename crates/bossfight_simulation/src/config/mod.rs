//! Encounter configuration (RON).
//!
//! Validation lives here, in the collaborator that builds the core objects;
//! the core itself never rejects parameters.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::ai::{BossTuning, PhaseTwoTuning};
use crate::combat::{AttackKind, AttackTiming, AttackUnit, FeedbackHooks};
use crate::encounter::{MusicTrack, MusicTracks, TriggerZone};

/// Errors during encounter config loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read encounter config {path}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse encounter RON in {origin}")]
    Parse {
        origin: String,
        #[source]
        source: ron::error::SpannedError,
    },

    #[error("failed to serialize encounter config")]
    Serialize {
        #[source]
        source: ron::Error,
    },

    #[error("invalid encounter config: {reason}")]
    Invalid { reason: String },
}

/// Boss block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossConfig {
    pub name: String,
    pub max_health: f64,
    pub detect_range: f32,
    pub attack_range: f32,
    pub chase_stop_distance: f32,
    pub think_interval: f64,
    pub stagger_duration: f64,
    /// Navigator speed (m/s)
    pub move_speed: f32,
    pub position: [f32; 3],
}

impl Default for BossConfig {
    fn default() -> Self {
        let tuning = BossTuning::default();
        Self {
            name: "Lele Troll Goyeng".to_string(),
            max_health: 1000.0,
            detect_range: tuning.detect_range,
            attack_range: tuning.attack_range,
            chase_stop_distance: tuning.chase_stop_distance,
            think_interval: tuning.think_interval,
            stagger_duration: tuning.stagger_duration,
            move_speed: 3.5,
            position: [0.0, 0.0, 0.0],
        }
    }
}

/// Phase-two escalation block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseTwoConfig {
    pub range_bonus: f32,
    pub cooldown_factor: f64,
    pub cooldown_floor: f64,
    pub damage_factor: f64,
    pub grace: f64,
}

impl Default for PhaseTwoConfig {
    fn default() -> Self {
        let tuning = PhaseTwoTuning::default();
        Self {
            range_bonus: tuning.range_bonus,
            cooldown_factor: tuning.cooldown_factor,
            cooldown_floor: tuning.cooldown_floor,
            damage_factor: tuning.damage_factor,
            grace: tuning.grace,
        }
    }
}

/// Active-phase geometry per variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttackShape {
    Cleave {
        range: f32,
        angle_deg: f32,
    },
    Dash {
        speed: f32,
        distance: f32,
        hit_radius: f32,
    },
    Slam {
        radius: f32,
        shockwave_force: f32,
        #[serde(default)]
        impact_offset: [f32; 3],
    },
}

/// One attack unit definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackSpec {
    pub name: String,
    pub windup: f64,
    pub active: f64,
    pub recovery: f64,
    pub cooldown: f64,
    pub damage: f64,
    pub shape: AttackShape,
}

impl AttackSpec {
    pub fn cleave() -> Self {
        Self {
            name: "Cleave".to_string(),
            windup: 0.6,
            active: 0.2,
            recovery: 0.5,
            cooldown: 3.0,
            damage: 35.0,
            shape: AttackShape::Cleave {
                range: 3.5,
                angle_deg: 100.0,
            },
        }
    }

    pub fn dash() -> Self {
        Self {
            name: "Dash".to_string(),
            windup: 0.5,
            active: 0.0,
            recovery: 0.6,
            cooldown: 5.0,
            damage: 40.0,
            shape: AttackShape::Dash {
                speed: 18.0,
                distance: 10.0,
                hit_radius: 1.2,
            },
        }
    }

    pub fn slam() -> Self {
        Self {
            name: "Slam".to_string(),
            windup: 0.8,
            active: 0.2,
            recovery: 0.6,
            cooldown: 4.0,
            damage: 45.0,
            shape: AttackShape::Slam {
                radius: 4.0,
                shockwave_force: 8.0,
                impact_offset: [0.0, 0.0, 0.0],
            },
        }
    }

    pub fn kind(&self) -> AttackKind {
        match self.shape {
            AttackShape::Cleave { range, angle_deg } => AttackKind::Cleave { range, angle_deg },
            AttackShape::Dash {
                speed,
                distance,
                hit_radius,
            } => AttackKind::Dash {
                speed,
                distance,
                hit_radius,
            },
            AttackShape::Slam {
                radius,
                shockwave_force,
                impact_offset,
            } => AttackKind::Slam {
                radius,
                shockwave_force,
                impact_offset: Vec3::from_array(impact_offset),
            },
        }
    }

    pub fn build(&self, hooks: Arc<dyn FeedbackHooks>) -> AttackUnit {
        AttackUnit::new(
            self.name.clone(),
            AttackTiming::new(self.windup, self.active, self.recovery, self.cooldown),
            self.damage,
            self.kind(),
            hooks,
        )
    }
}

/// Player block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub max_health: f64,
    pub position: [f32; 3],
    /// Knockback velocity lost per second
    pub knockback_damping: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_health: 200.0,
            position: [0.0, 0.0, 12.0],
            knockback_damping: 4.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    pub center: [f32; 3],
    pub radius: f32,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            center: [0.0, 0.0, 12.0],
            radius: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackConfig {
    pub name: String,
    /// Seconds (only the intro length matters)
    #[serde(default)]
    pub length: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MusicConfig {
    pub intro: Option<TrackConfig>,
    pub phase_one: Option<TrackConfig>,
    pub phase_two: Option<TrackConfig>,
    pub crossfade: f64,
}

impl Default for MusicConfig {
    fn default() -> Self {
        Self {
            intro: Some(TrackConfig {
                name: "boss_intro".to_string(),
                length: 4.0,
            }),
            phase_one: Some(TrackConfig {
                name: "boss_phase1".to_string(),
                length: 0.0,
            }),
            phase_two: Some(TrackConfig {
                name: "boss_phase2".to_string(),
                length: 0.0,
            }),
            crossfade: 0.8,
        }
    }
}

impl MusicConfig {
    pub fn tracks(&self) -> MusicTracks {
        let track = |config: &Option<TrackConfig>| {
            config.as_ref().map(|track| MusicTrack::new(track.name.clone(), track.length))
        };
        MusicTracks {
            intro: track(&self.intro),
            phase_one: track(&self.phase_one),
            phase_two: track(&self.phase_two),
        }
    }
}

/// Full encounter definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncounterConfig {
    pub seed: u64,
    pub boss: BossConfig,
    pub phase_two: PhaseTwoConfig,
    pub attacks: Vec<AttackSpec>,
    pub player: PlayerConfig,
    pub trigger: TriggerConfig,
    pub barriers: Vec<[f32; 3]>,
    pub music: MusicConfig,
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            boss: BossConfig::default(),
            phase_two: PhaseTwoConfig::default(),
            attacks: vec![AttackSpec::cleave(), AttackSpec::dash(), AttackSpec::slam()],
            player: PlayerConfig::default(),
            trigger: TriggerConfig::default(),
            barriers: vec![[0.0, 0.0, 16.0], [-6.0, 0.0, 10.0], [6.0, 0.0, 10.0]],
            music: MusicConfig::default(),
        }
    }
}

impl EncounterConfig {
    /// Read, parse and validate a RON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&contents, &path.display().to_string())?;
        crate::logger::log(&format!(
            "📜 Config: loaded {} ({} attacks)",
            path.display(),
            config.attacks.len()
        ));
        Ok(config)
    }

    /// Parse + validate RON text; `origin` only labels errors.
    pub fn parse(contents: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(contents).map_err(|source| ConfigError::Parse {
            origin: origin.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_ron(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|source| ConfigError::Serialize { source })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| Err(ConfigError::Invalid { reason });

        if !positive(self.boss.max_health) {
            return invalid(format!("boss max_health must be positive, got {}", self.boss.max_health));
        }
        if !positive(self.player.max_health) {
            return invalid(format!(
                "player max_health must be positive, got {}",
                self.player.max_health
            ));
        }
        if !positive(self.boss.think_interval) {
            return invalid(format!(
                "think_interval must be positive, got {}",
                self.boss.think_interval
            ));
        }
        if self.boss.attack_range > self.boss.detect_range {
            return invalid(format!(
                "attack_range {} exceeds detect_range {}",
                self.boss.attack_range, self.boss.detect_range
            ));
        }
        if self.boss.stagger_duration < 0.0 || self.boss.move_speed < 0.0 {
            return invalid("stagger_duration and move_speed must not be negative".to_string());
        }
        if !positive(self.phase_two.cooldown_factor) || self.phase_two.cooldown_factor > 1.0 {
            return invalid(format!(
                "cooldown_factor must be in (0, 1], got {}",
                self.phase_two.cooldown_factor
            ));
        }
        if self.phase_two.grace < 0.0 || self.phase_two.cooldown_floor < 0.0 {
            return invalid("phase two grace and cooldown_floor must not be negative".to_string());
        }
        if !positive(self.trigger.radius) {
            return invalid(format!("trigger radius must be positive, got {}", self.trigger.radius));
        }
        if self.attacks.is_empty() {
            return invalid("at least one attack is required".to_string());
        }

        for attack in &self.attacks {
            let timings = [attack.windup, attack.active, attack.recovery, attack.cooldown];
            if timings.iter().any(|t| !non_negative(*t)) {
                return invalid(format!("attack '{}' has a negative timing", attack.name));
            }
            if !non_negative(attack.damage) {
                return invalid(format!("attack '{}' has negative damage", attack.name));
            }
            let geometry_ok = match attack.shape {
                AttackShape::Cleave { range, angle_deg } => range > 0.0 && angle_deg > 0.0,
                AttackShape::Dash {
                    speed,
                    distance,
                    hit_radius,
                } => speed >= 0.0 && distance > 0.0 && hit_radius > 0.0,
                AttackShape::Slam { radius, .. } => radius > 0.0,
            };
            if !geometry_ok {
                return invalid(format!("attack '{}' has invalid geometry", attack.name));
            }
        }

        Ok(())
    }

    pub fn boss_tuning(&self) -> BossTuning {
        BossTuning {
            detect_range: self.boss.detect_range,
            attack_range: self.boss.attack_range,
            chase_stop_distance: self.boss.chase_stop_distance,
            think_interval: self.boss.think_interval,
            stagger_duration: self.boss.stagger_duration,
        }
    }

    pub fn phase_two_tuning(&self) -> PhaseTwoTuning {
        PhaseTwoTuning {
            range_bonus: self.phase_two.range_bonus,
            cooldown_factor: self.phase_two.cooldown_factor,
            cooldown_floor: self.phase_two.cooldown_floor,
            damage_factor: self.phase_two.damage_factor,
            grace: self.phase_two.grace,
        }
    }

    pub fn trigger_zone(&self) -> TriggerZone {
        TriggerZone::new(Vec3::from_array(self.trigger.center), self.trigger.radius)
    }

    pub fn build_attacks(&self, hooks: Arc<dyn FeedbackHooks>) -> Vec<AttackUnit> {
        self.attacks.iter().map(|spec| spec.build(hooks.clone())).collect()
    }
}

/// NaN-aware: NaN is neither positive nor non-negative.
fn positive<T: PartialOrd + Default>(value: T) -> bool {
    value > T::default()
}

fn non_negative<T: PartialOrd + Default>(value: T) -> bool {
    value >= T::default()
}
