//! Map descriptions: terrain, collision, transitions, patches, placements.
//!
//! Maps are plain serde structs so they can come from RON files; the
//! built-in pair ("world" and "hospital") is enough to exercise every
//! overworld feature. Geometry is in pixels.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::entities::Facing;
use crate::game_data::{load_ron, DataError};
use crate::geometry::{Rect, Vec2};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ObjectDef {
    pub rect: Rect,
    /// Drawn above entities and never collided with.
    pub top: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransitionDef {
    pub rect: Rect,
    pub target_map: String,
    pub target_spawn: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PatchDef {
    pub rect: Rect,
    pub biome: String,
    /// Species pool wild encounters draw from.
    pub monsters: Vec<String>,
    pub level: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpawnDef {
    pub name: String,
    pub pos: Vec2,
    pub direction: Facing,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NpcDef {
    pub character_id: String,
    pub graphic: String,
    pub pos: Vec2,
    pub direction: Facing,
    /// Notice range in px for roaming lookouts.
    pub radius: f32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MapData {
    pub name: String,
    pub terrain: Vec<Rect>,
    pub water: Vec<Rect>,
    pub objects: Vec<ObjectDef>,
    pub collisions: Vec<Rect>,
    pub transitions: Vec<TransitionDef>,
    pub patches: Vec<PatchDef>,
    pub spawns: Vec<SpawnDef>,
    pub npcs: Vec<NpcDef>,
}

impl MapData {
    pub fn spawn(&self, name: &str) -> Option<&SpawnDef> {
        self.spawns.iter().find(|s| s.name == name)
    }
}

pub fn load_maps(dir: &Path, names: &[&str]) -> Result<HashMap<String, MapData>, DataError> {
    let mut maps = HashMap::new();
    for name in names {
        let map: MapData = load_ron(&dir.join(format!("{name}.ron")))?;
        maps.insert((*name).to_string(), map);
    }
    Ok(maps)
}

/// Two hand-built demo maps covering transitions, patches, lookouts, and
/// the healer.
pub fn builtin_maps() -> HashMap<String, MapData> {
    let mut maps = HashMap::new();

    let world = MapData {
        name: "world".to_string(),
        terrain: vec![Rect::new(0.0, 0.0, 2560.0, 2560.0)],
        water: vec![Rect::new(1792.0, 1536.0, 512.0, 448.0)],
        objects: vec![
            // tree cluster splitting the meadow from the trail
            ObjectDef { rect: Rect::new(640.0, 640.0, 128.0, 128.0), top: false },
            ObjectDef { rect: Rect::new(832.0, 640.0, 128.0, 128.0), top: false },
            ObjectDef { rect: Rect::new(1536.0, 896.0, 128.0, 128.0), top: false },
            // canopy overhang
            ObjectDef { rect: Rect::new(704.0, 576.0, 256.0, 64.0), top: true },
            // the shelter building
            ObjectDef { rect: Rect::new(1088.0, 1024.0, 256.0, 192.0), top: false },
        ],
        collisions: vec![
            // map border
            Rect::new(-64.0, 0.0, 64.0, 2560.0),
            Rect::new(2560.0, 0.0, 64.0, 2560.0),
            Rect::new(0.0, -64.0, 2560.0, 64.0),
            Rect::new(0.0, 2560.0, 2560.0, 64.0),
            // shoreline
            Rect::new(1792.0, 1536.0, 512.0, 448.0),
        ],
        transitions: vec![TransitionDef {
            // shelter doorway
            rect: Rect::new(1184.0, 1216.0, 64.0, 32.0),
            target_map: "hospital".to_string(),
            target_spawn: "entrance".to_string(),
        }],
        patches: vec![
            PatchDef {
                rect: Rect::new(384.0, 1536.0, 448.0, 384.0),
                biome: "forest".to_string(),
                monsters: vec![
                    "Sproutle".to_string(),
                    "Fenroot".to_string(),
                    "Embercub".to_string(),
                ],
                level: 12,
            },
            PatchDef {
                rect: Rect::new(1600.0, 2048.0, 512.0, 320.0),
                biome: "shallows".to_string(),
                monsters: vec!["Dribblet".to_string(), "Gravelle".to_string()],
                level: 14,
            },
        ],
        spawns: vec![
            SpawnDef {
                name: "house".to_string(),
                pos: Vec2::new(1216.0, 1344.0),
                direction: Facing::Down,
            },
            SpawnDef {
                name: "hospital".to_string(),
                pos: Vec2::new(1216.0, 1312.0),
                direction: Facing::Down,
            },
        ],
        npcs: vec![
            NpcDef {
                character_id: "ranger_elm".to_string(),
                graphic: "ranger".to_string(),
                pos: Vec2::new(768.0, 1472.0),
                direction: Facing::Right,
                radius: 320.0,
            },
            NpcDef {
                character_id: "scout_mira".to_string(),
                graphic: "scout".to_string(),
                pos: Vec2::new(1856.0, 2000.0),
                direction: Facing::Down,
                radius: 280.0,
            },
            NpcDef {
                character_id: "elder_bran".to_string(),
                graphic: "elder".to_string(),
                pos: Vec2::new(512.0, 320.0),
                direction: Facing::Down,
                radius: 0.0,
            },
        ],
    };
    maps.insert("world".to_string(), world);

    let hospital = MapData {
        name: "hospital".to_string(),
        terrain: vec![Rect::new(0.0, 0.0, 1280.0, 768.0)],
        water: vec![],
        objects: vec![
            // counter
            ObjectDef { rect: Rect::new(512.0, 256.0, 256.0, 64.0), top: false },
        ],
        collisions: vec![
            Rect::new(-64.0, 0.0, 64.0, 768.0),
            Rect::new(1280.0, 0.0, 64.0, 768.0),
            Rect::new(0.0, -64.0, 1280.0, 64.0),
            Rect::new(0.0, 768.0, 1280.0, 64.0),
        ],
        transitions: vec![TransitionDef {
            rect: Rect::new(608.0, 736.0, 64.0, 32.0),
            target_map: "world".to_string(),
            target_spawn: "hospital".to_string(),
        }],
        patches: vec![],
        spawns: vec![SpawnDef {
            name: "entrance".to_string(),
            pos: Vec2::new(640.0, 640.0),
            direction: Facing::Up,
        }],
        npcs: vec![NpcDef {
            character_id: "nurse".to_string(),
            graphic: "nurse".to_string(),
            pos: Vec2::new(640.0, 224.0),
            direction: Facing::Down,
            radius: 0.0,
        }],
    };
    maps.insert("hospital".to_string(), hospital);

    maps
}
