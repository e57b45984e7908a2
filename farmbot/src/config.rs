//! Persistent bot configuration.
//!
//! Stored as JSON in a platform-appropriate config directory and hot-reloaded
//! when the file changes, so thresholds and slot layouts can be tuned while
//! the bot runs.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};

use vision::mobs::MobProfile;
use vision::vitals::BarPalettes;

/// Action bar slots addressable by the dispatcher.
pub const SLOT_COUNT: usize = 10;

const FILE_NAME: &str = "farmbot.json";

/// On-disk configuration for the bot.
///
/// Unknown fields in the file are ignored and missing fields fall back to the
/// defaults, so configs survive upgrades in both directions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Target window application name (from `xcap::Window::app_name()`).
    ///
    /// If multiple windows share the same app name, the first match is used.
    pub app_name: String,

    /// Delay between perception ticks, in milliseconds.
    pub tick_interval_ms: u64,

    /// Keep perceiving but never engage. For watching what the bot would do.
    pub stop_fighting: bool,

    /// Prefer aggressive mobs over everything else on screen.
    pub prioritize_aggressive: bool,

    /// Passive mobs are only engaged while own HP is at or above this percent.
    pub min_hp_attack: u8,

    /// Ignore mobs whose anchor is farther than this from the screen center.
    pub max_target_distance: f64,

    /// Engagement radius used instead of `max_target_distance` while circle
    /// movement is enabled.
    pub circle_target_distance: f64,

    /// Duration of the circling maneuver after a fruitless search, in
    /// milliseconds. Zero disables circling.
    pub circle_move_ms: u64,

    /// How long the target HP bar may go unmeasured before an obstacle is
    /// assumed, in milliseconds.
    pub obstacle_cooldown_ms: u64,

    /// Obstacle maneuvers per engagement before the target is abandoned.
    pub obstacle_max_tries: u32,

    /// Action slots tried in rotating order when attacking.
    pub attack_slots: Vec<u8>,

    /// AOE attack slots, used once mobs have been grouped within skill range.
    pub aoe_attack_slots: Vec<u8>,

    /// Mobs to accrete before finishing them together. Values above 1 enable
    /// AOE farming.
    pub max_aoe_farming: u32,

    /// Heal when own HP drops below this percent.
    pub heal_threshold: u8,
    pub heal_slots: Vec<u8>,
    /// Fallback when `heal_slots` is empty: AOE heals cast on self.
    pub aoe_heal_slots: Vec<u8>,

    /// Restore MP below this percent.
    pub mp_threshold: u8,
    pub mp_restore_slots: Vec<u8>,

    /// Restore FP below this percent.
    pub fp_threshold: u8,
    pub fp_restore_slots: Vec<u8>,

    /// Buffs cast opportunistically while a settle window is pending.
    pub buff_slots: Vec<u8>,

    /// Skills recast whenever their per-slot cooldown allows, regardless of
    /// state.
    pub party_skill_slots: Vec<u8>,

    /// Slot holding a pickup pet summon item.
    pub pickup_pet_slot: Option<u8>,
    /// Put the pet away again after each pickup round.
    pub unsummon_pet: bool,
    /// Slot holding a pickup motion.
    pub pickup_motion_slot: Option<u8>,
    /// Slots hammered directly after a kill when neither pet nor motion is
    /// configured.
    pub pickup_slots: Vec<u8>,
    /// Minimum gap between pet or motion pickups, in milliseconds.
    pub pickup_cooldown_ms: u64,

    /// Warn when no target has been engaged for this long, in milliseconds.
    /// Zero disables the warning.
    pub search_timeout_ms: u64,

    /// Per-slot cooldowns in milliseconds, indexed by slot number. Zero means
    /// the slot is always ready.
    pub slot_cooldowns_ms: [u64; SLOT_COUNT],

    /// Mob label palette and geometry filters.
    pub mobs: MobProfile,

    /// Status bar shade families.
    pub bars: BarPalettes,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "Flyff Universe".to_string(),
            tick_interval_ms: 100,
            stop_fighting: false,
            prioritize_aggressive: true,
            min_hp_attack: 70,
            max_target_distance: 325.0,
            circle_target_distance: 900.0,
            circle_move_ms: 0,
            obstacle_cooldown_ms: 5000,
            obstacle_max_tries: 3,
            attack_slots: vec![1],
            aoe_attack_slots: Vec::new(),
            max_aoe_farming: 1,
            heal_threshold: 50,
            heal_slots: Vec::new(),
            aoe_heal_slots: Vec::new(),
            mp_threshold: 30,
            mp_restore_slots: Vec::new(),
            fp_threshold: 30,
            fp_restore_slots: Vec::new(),
            buff_slots: Vec::new(),
            party_skill_slots: Vec::new(),
            pickup_pet_slot: None,
            unsummon_pet: false,
            pickup_motion_slot: None,
            pickup_slots: Vec::new(),
            pickup_cooldown_ms: 3000,
            search_timeout_ms: 120_000,
            slot_cooldowns_ms: [0; SLOT_COUNT],
            mobs: MobProfile::default(),
            bars: BarPalettes::default(),
        }
    }
}

impl Config {
    /// Path to the config file.
    pub fn path() -> Result<PathBuf> {
        let base = dirs::config_dir().context("config_dir() unavailable")?;
        Ok(base.join(FILE_NAME))
    }

    /// Load configuration from disk, falling back to defaults on any error.
    pub fn load_or_default() -> Self {
        match Self::try_load() {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!(error = %err, "failed to load config; using defaults");
                Self::default()
            }
        }
    }

    /// Try to load configuration from disk.
    pub fn try_load() -> Result<Self> {
        let path = Self::path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = fs::read_to_string(&path).with_context(|| format!("read {:?}", path))?;
        let cfg = serde_json::from_str(&json).with_context(|| format!("parse {:?}", path))?;
        Ok(cfg)
    }

    /// Save configuration to disk.
    pub fn save(&self) -> Result<()> {
        let path = Self::path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(self).context("serialize config")?;
        fs::write(&path, json).with_context(|| format!("write {:?}", path))?;
        Ok(())
    }
}

/// Config handle shared between the tick loop and the reload watcher.
pub type SharedConfig = Arc<RwLock<Config>>;

pub fn shared(cfg: Config) -> SharedConfig {
    Arc::new(RwLock::new(cfg))
}

/// Watch the config file and hot-reload changes into `shared`.
///
/// Watches the parent directory rather than the file itself, so editors that
/// replace the file on save keep working. Dropping the returned watcher stops
/// the reloads.
pub fn watch(shared: SharedConfig) -> Result<RecommendedWatcher> {
    let path = Config::path()?;
    let dir = path
        .parent()
        .context("config path has no parent")?
        .to_path_buf();
    fs::create_dir_all(&dir).with_context(|| format!("create {:?}", dir))?;

    let mut watcher = notify::recommended_watcher(move |event: notify::Result<Event>| {
        let Ok(event) = event else { return };
        if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
            return;
        }
        if !event.paths.iter().any(|p| p.ends_with(FILE_NAME)) {
            return;
        }
        match Config::try_load() {
            Ok(cfg) => {
                *shared.write().expect("config lock poisoned") = cfg;
                tracing::info!("configuration reloaded");
            }
            Err(err) => {
                tracing::warn!(error = %err, "config changed but could not be loaded")
            }
        }
    })
    .context("create config watcher")?;
    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("watch {:?}", dir))?;
    Ok(watcher)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_in_defaults() {
        let cfg: Config =
            serde_json::from_str(r#"{"app_name": "Madrigal", "heal_threshold": 65}"#)
                .expect("parse");
        assert_eq!(cfg.app_name, "Madrigal");
        assert_eq!(cfg.heal_threshold, 65);
        assert_eq!(cfg.attack_slots, vec![1]);
        assert_eq!(cfg.obstacle_max_tries, 3);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let cfg: Config = serde_json::from_str(r#"{"retired_knob": true}"#).expect("parse");
        assert_eq!(cfg.tick_interval_ms, 100);
    }

    #[test]
    fn slot_cooldown_table_parses() {
        let cfg: Config =
            serde_json::from_str(r#"{"slot_cooldowns_ms": [0,500,0,0,0,0,0,0,0,60000]}"#)
                .expect("parse");
        assert_eq!(cfg.slot_cooldowns_ms[1], 500);
        assert_eq!(cfg.slot_cooldowns_ms[9], 60_000);
    }
}
