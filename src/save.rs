//! Save/load: a RON snapshot plus a human-readable JSON metadata record.
//!
//! Loading never throws into the game loop: any missing or unreadable file
//! is reported as "no save" and the in-memory state stays untouched.

use std::collections::BTreeMap;
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::monster::MonsterRecord;

pub const GAME_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Full game snapshot, keyed roster slots in stable order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SaveState {
    pub monsters: BTreeMap<u32, MonsterRecord>,
    pub current_map: String,
    pub current_spawn: String,
    pub game_time: f64,
    pub player_position: (f32, f32),
    /// Random stream state, restored so loading does not reshuffle luck.
    pub rng: u32,
}

/// Sidecar record readable without deserializing the snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SaveMetadata {
    pub save_date: u64,
    pub game_version: String,
    pub average_party_level: u32,
    pub monster_count: usize,
    pub current_map: String,
    pub playtime: f64,
}

pub struct SaveSystem {
    save_dir: PathBuf,
}

impl SaveSystem {
    pub fn new(save_dir: PathBuf) -> Self {
        Self { save_dir }
    }

    fn save_file(&self) -> PathBuf {
        self.save_dir.join("save_data.ron")
    }

    fn metadata_file(&self) -> PathBuf {
        self.save_dir.join("save_metadata.json")
    }

    pub fn save_exists(&self) -> bool {
        self.save_file().exists()
    }

    pub fn save(&self, state: &SaveState) -> Result<(), Box<dyn Error>> {
        fs::create_dir_all(&self.save_dir)?;
        let body = ron::ser::to_string_pretty(state, ron::ser::PrettyConfig::default())?;
        fs::write(self.save_file(), body)?;

        let metadata = SaveMetadata {
            save_date: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
            game_version: GAME_VERSION.to_string(),
            average_party_level: average_level(&state.monsters),
            monster_count: state.monsters.len(),
            current_map: state.current_map.clone(),
            playtime: state.game_time,
        };
        fs::write(self.metadata_file(), serde_json::to_string_pretty(&metadata)?)?;
        info!("game saved to {}", self.save_file().display());
        Ok(())
    }

    /// Returns the snapshot, or `None` for a missing or corrupt save.
    pub fn load(&self) -> Option<SaveState> {
        let path = self.save_file();
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) => {
                warn!("no save available at {}: {err}", path.display());
                return None;
            }
        };
        match ron::from_str(&text) {
            Ok(state) => Some(state),
            Err(err) => {
                warn!("corrupt save at {}: {err}", path.display());
                None
            }
        }
    }

    pub fn metadata(&self) -> Option<SaveMetadata> {
        let text = fs::read_to_string(self.metadata_file()).ok()?;
        match serde_json::from_str(&text) {
            Ok(metadata) => Some(metadata),
            Err(err) => {
                warn!("unreadable save metadata: {err}");
                None
            }
        }
    }

    pub fn delete(&self) {
        let _ = fs::remove_file(self.save_file());
        let _ = fs::remove_file(self.metadata_file());
    }
}

fn average_level(monsters: &BTreeMap<u32, MonsterRecord>) -> u32 {
    if monsters.is_empty() {
        return 0;
    }
    let total: u32 = monsters.values().map(|m| m.level).sum();
    total / monsters.len() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_system(tag: &str) -> SaveSystem {
        let dir = std::env::temp_dir().join(format!("monrust_save_{tag}_{}", std::process::id()));
        let system = SaveSystem::new(dir);
        system.delete();
        system
    }

    fn sample_state() -> SaveState {
        let mut monsters = BTreeMap::new();
        monsters.insert(
            0,
            MonsterRecord {
                species: "Sproutle".to_string(),
                level: 12,
                health: 130.0,
                energy: 88.0,
                xp: 410.0,
            },
        );
        monsters.insert(
            1,
            MonsterRecord {
                species: "Embercub".to_string(),
                level: 9,
                health: 50.5,
                energy: 31.0,
                xp: 12.0,
            },
        );
        SaveState {
            monsters,
            current_map: "world".to_string(),
            current_spawn: "house".to_string(),
            game_time: 321.5,
            player_position: (1216.0, 1344.0),
            rng: 0xBEEF,
        }
    }

    #[test]
    fn save_round_trip_preserves_everything() {
        let system = temp_system("roundtrip");
        let state = sample_state();
        system.save(&state).unwrap();
        let loaded = system.load().unwrap();
        assert_eq!(loaded, state);
        system.delete();
    }

    #[test]
    fn metadata_tracks_party_summary() {
        let system = temp_system("metadata");
        let state = sample_state();
        system.save(&state).unwrap();
        let metadata = system.metadata().unwrap();
        assert_eq!(metadata.monster_count, 2);
        assert_eq!(metadata.average_party_level, 10);
        assert_eq!(metadata.current_map, "world");
        assert_eq!(metadata.game_version, GAME_VERSION);
        system.delete();
    }

    #[test]
    fn missing_save_is_reported_as_none() {
        let system = temp_system("missing");
        assert!(!system.save_exists());
        assert!(system.load().is_none());
    }

    #[test]
    fn corrupt_save_is_reported_as_none() {
        let system = temp_system("corrupt");
        fs::create_dir_all(std::env::temp_dir().join(format!(
            "monrust_save_corrupt_{}",
            std::process::id()
        )))
        .unwrap();
        fs::write(
            std::env::temp_dir()
                .join(format!("monrust_save_corrupt_{}", std::process::id()))
                .join("save_data.ron"),
            "not ron at all {{{",
        )
        .unwrap();
        assert!(system.load().is_none());
        system.delete();
    }
}
