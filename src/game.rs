//! Game orchestrator: world state, frame ordering, transitions, encounters.
//!
//! Per-frame order is fixed: timers, then input, then movement/collision,
//! then trigger checks (dialog, encounter, transition), then whichever
//! overlays are active (dialog, index, battle, evolution), then the tint
//! state machine. Active overlays own input for the frame; background
//! animation and timers keep running underneath them.

use std::collections::{BTreeMap, HashMap};
use std::error::Error;

use log::{info, warn};

use crate::battle::{Battle, BattleOutcome, Menu, SideId};
use crate::config::GameConfig;
use crate::dialog::{DialogStatus, DialogTree};
use crate::entities::{Character, CharacterEvent, Facing, Player, FACING_TOLERANCE};
use crate::evolution::{Evolution, EvolutionPhase};
use crate::game_data::GameData;
use crate::geometry::{Rect, Vec2};
use crate::index::{IndexEvent, MonsterIndex};
use crate::input::InputState;
use crate::map_data::{MapData, PatchDef, TransitionDef};
use crate::monster::{Monster, Stat};
use crate::rng;
use crate::save::SaveState;
use crate::scene::{AudioCue, DrawCmd, DrawKind, Layer};
use crate::timer::Timer;

const START_MAP: &str = "world";
const START_SPAWN: &str = "house";

/// World mutation deferred to the fully-tinted instant of a transition.
enum TransitionTarget {
    Map { map: String, spawn: String },
    Battle(Box<Battle>),
    EndBattle,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum TintMode {
    Untint,
    Tint,
}

/// Everything spawned into the current map. Rebuilt on every map switch.
pub struct World {
    pub player: Player,
    pub characters: Vec<Character>,
    /// Static collision rectangles: borders, solid objects, water.
    pub collision_rects: Vec<Rect>,
    pub transitions: Vec<TransitionDef>,
    pub patches: Vec<PatchDef>,
    terrain: Vec<Rect>,
    water: Vec<Rect>,
    objects_main: Vec<Rect>,
    objects_top: Vec<Rect>,
}

pub struct Game {
    cfg: GameConfig,
    data: GameData,
    maps: HashMap<String, MapData>,

    pub world: World,
    pub monsters: Vec<Monster>,
    pub current_map: String,
    pub current_spawn: String,
    pub play_time: f64,

    pub dialog: Option<DialogTree>,
    pub battle: Option<Battle>,
    pub evolution: Option<Evolution>,
    pub index_open: bool,
    index: MonsterIndex,

    transition_target: Option<TransitionTarget>,
    tint_mode: TintMode,
    tint_progress: f32,
    encounter_timer: Timer,
    rng: u32,
    audio_cues: Vec<AudioCue>,
}

impl Game {
    pub fn new(
        cfg: GameConfig,
        data: GameData,
        maps: HashMap<String, MapData>,
    ) -> Result<Self, Box<dyn Error>> {
        let starters = [
            ("Verdyl", 32),
            ("Embercub", 15),
            ("Dribblet", 16),
            ("Gravelle", 10),
            ("Moltwing", 9),
        ];
        let monsters = starters
            .iter()
            .map(|(species, level)| Monster::new(&data, species, *level))
            .collect::<Result<Vec<_>, _>>()?;

        let world = build_world(&cfg, &data, &maps, START_MAP, START_SPAWN)
            .ok_or_else(|| format!("start map `{START_MAP}` missing"))?;

        let mut game = Self {
            encounter_timer: Timer::new(2000.0, false, false),
            cfg,
            data,
            maps,
            world,
            monsters,
            current_map: START_MAP.to_string(),
            current_spawn: START_SPAWN.to_string(),
            play_time: 0.0,
            dialog: None,
            battle: None,
            evolution: None,
            index_open: false,
            index: MonsterIndex::default(),
            transition_target: None,
            tint_mode: TintMode::Untint,
            tint_progress: 0.0,
            rng: 0x1234_5678,
            audio_cues: Vec::new(),
        };
        game.audio_cues.push(AudioCue::OverworldStart);
        Ok(game)
    }

    pub fn config(&self) -> &GameConfig {
        &self.cfg
    }

    pub fn data(&self) -> &GameData {
        &self.data
    }

    pub fn tint_progress(&self) -> f32 {
        self.tint_progress
    }

    /// Audio events fired since the last drain.
    pub fn take_audio_cues(&mut self) -> Vec<AudioCue> {
        std::mem::take(&mut self.audio_cues)
    }

    /// One fixed-timestep frame.
    pub fn update(&mut self, dt: f32, input: &InputState) {
        self.play_time += dt as f64;

        // timers
        if self.encounter_timer.update(dt) {
            self.monster_encounter();
        }

        // input
        self.handle_input(input);

        // movement / collision
        self.update_world(dt, input);

        // trigger checks
        self.transition_check();
        self.check_monster();

        // overlays
        self.update_dialog(dt, input);
        self.update_index(input);
        self.update_battle(dt, input);
        self.update_evolution(dt);

        // tint
        self.tint_screen(dt);
    }

    fn overlay_active(&self) -> bool {
        self.dialog.is_some() || self.battle.is_some() || self.evolution.is_some()
    }

    fn handle_input(&mut self, input: &InputState) {
        if self.dialog.is_some() || self.battle.is_some() || self.evolution.is_some() {
            return;
        }
        if input.pressed_interact && !self.index_open {
            let player_center = self.world.player.rect.center();
            let facing = self.world.player.facing;
            let tolerance = FACING_TOLERANCE;
            let radius = self.cfg.interact_radius;
            let reachable = self.world.characters.iter().position(|character| {
                let rel = character.rect.center() - player_center;
                if rel.length() >= radius {
                    return false;
                }
                match facing {
                    Facing::Left => rel.x < 0.0 && rel.y.abs() < tolerance,
                    Facing::Right => rel.x > 0.0 && rel.y.abs() < tolerance,
                    Facing::Up => rel.y < 0.0 && rel.x.abs() < tolerance,
                    Facing::Down => rel.y > 0.0 && rel.x.abs() < tolerance,
                }
            });
            if let Some(index) = reachable {
                self.world.player.block();
                let player_center = self.world.player.rect.center();
                let character = &mut self.world.characters[index];
                character.face_toward(player_center);
                character.stop_rotating();
                self.create_dialog(index);
            }
        }
        if input.pressed_index {
            self.index_open = !self.index_open;
            self.index.reset();
            if self.index_open {
                self.world.player.block();
            } else {
                self.world.player.unblock();
            }
        }
    }

    fn update_world(&mut self, dt: f32, input: &InputState) {
        let mut player_obstacles = self.world.collision_rects.clone();
        player_obstacles.extend(self.world.characters.iter().map(|c| c.hitbox));
        self.world.player.update(dt, input, &player_obstacles);

        let hitboxes: Vec<Rect> = self.world.characters.iter().map(|c| c.hitbox).collect();
        let mut reached = None;
        for i in 0..self.world.characters.len() {
            let mut sight_blockers = self.world.collision_rects.clone();
            for (j, hitbox) in hitboxes.iter().enumerate() {
                if j != i {
                    sight_blockers.push(*hitbox);
                }
            }
            let character = &mut self.world.characters[i];
            let event = character.update(
                dt,
                &mut self.world.player,
                &sight_blockers,
                &mut self.rng,
                &mut self.audio_cues,
            );
            if event == Some(CharacterEvent::ReachedPlayer) {
                reached = Some(i);
            }
        }
        if let Some(index) = reached {
            self.create_dialog(index);
        }
    }

    fn transition_check(&mut self) {
        if self.transition_target.is_some() || self.overlay_active() {
            return;
        }
        let hitbox = self.world.player.hitbox;
        let hit = self
            .world
            .transitions
            .iter()
            .find(|t| t.rect.colliderect(&hitbox));
        if let Some(transition) = hit {
            self.world.player.block();
            self.transition_target = Some(TransitionTarget::Map {
                map: transition.target_map.clone(),
                spawn: transition.target_spawn.clone(),
            });
            self.tint_mode = TintMode::Tint;
        }
    }

    /// Arms the encounter timer while the player is pushing through a patch.
    fn check_monster(&mut self) {
        if self.battle.is_some() || self.transition_target.is_some() {
            return;
        }
        let player = &self.world.player;
        let in_patch = self
            .world
            .patches
            .iter()
            .any(|patch| patch.rect.colliderect(&player.hitbox));
        if in_patch && player.moving() && !self.encounter_timer.active() {
            self.encounter_timer.activate();
        }
    }

    /// Encounter timer expiry: re-validate, then build the wild battle.
    fn monster_encounter(&mut self) {
        if self.battle.is_some() || self.transition_target.is_some() {
            return;
        }
        let player = &self.world.player;
        let patch = self
            .world
            .patches
            .iter()
            .find(|patch| patch.rect.colliderect(&player.hitbox));
        let Some(patch) = patch else {
            return;
        };
        if !player.moving() || self.monsters.is_empty() {
            return;
        }
        let (lo, hi) = self.cfg.encounter_delay_ms;
        let next_delay = rng::range_u32(&mut self.rng, lo, hi) as f32;
        self.encounter_timer.set_duration(next_delay);

        let jitter = self.cfg.encounter_level_jitter;
        let mut opponents = Vec::new();
        for species in patch.monsters.clone() {
            let level = (patch.level as i32 + rng::range_i32(&mut self.rng, -jitter, jitter)).max(1);
            match Monster::new(&self.data, &species, level as u32) {
                Ok(monster) => opponents.push(monster),
                Err(err) => warn!("skipping wild spawn: {err}"),
            }
        }
        if opponents.is_empty() {
            return;
        }

        self.world.player.block();
        self.audio_cues.push(AudioCue::OverworldStop);
        self.audio_cues.push(AudioCue::BattleStart);

        let party = std::mem::take(&mut self.monsters);
        let seed = self.rng;
        rng::next_u8(&mut self.rng);
        let battle = Battle::new(&self.cfg, party, opponents, None, patch.biome.clone(), seed);
        self.transition_target = Some(TransitionTarget::Battle(Box::new(battle)));
        self.tint_mode = TintMode::Tint;
    }

    fn create_dialog(&mut self, character_index: usize) {
        if self.dialog.is_some() || self.battle.is_some() {
            return;
        }
        let Some(character) = self.world.characters.get(character_index) else {
            return;
        };
        let lines = character.dialog().to_vec();
        if lines.is_empty() {
            warn!("character `{}` has no dialog", character.character_id);
            self.world.player.unblock();
            return;
        }
        self.dialog = Some(DialogTree::new(lines, character_index, &self.cfg));
    }

    fn update_dialog(&mut self, dt: f32, input: &InputState) {
        let Some(dialog) = self.dialog.as_mut() else {
            return;
        };
        if dialog.update(dt, input) == DialogStatus::Finished {
            let character_index = dialog.character_index;
            self.dialog = None;
            self.end_dialog(character_index);
        }
    }

    /// Post-dialog branching: heal, battle start, or plain unblock.
    fn end_dialog(&mut self, character_index: usize) {
        let Some(character) = self.world.characters.get_mut(character_index) else {
            self.world.player.unblock();
            return;
        };
        if character.data.nurse {
            for monster in &mut self.monsters {
                monster.heal_full();
            }
            self.world.player.unblock();
            self.check_evolution();
        } else if !character.defeated && character.is_trainer() {
            self.audio_cues.push(AudioCue::OverworldStop);
            self.audio_cues.push(AudioCue::BattleStart);
            let opponents = std::mem::take(&mut character.monsters);
            let biome = character.data.biome.clone();
            let party = std::mem::take(&mut self.monsters);
            let seed = self.rng;
            rng::next_u8(&mut self.rng);
            let battle = Battle::new(
                &self.cfg,
                party,
                opponents,
                Some(character_index),
                biome,
                seed,
            );
            self.transition_target = Some(TransitionTarget::Battle(Box::new(battle)));
            self.tint_mode = TintMode::Tint;
        } else {
            self.world.player.unblock();
            self.check_evolution();
        }
    }

    fn update_index(&mut self, input: &InputState) {
        if !self.index_open || self.overlay_active() {
            return;
        }
        if let Some(IndexEvent::Swap(a, b)) = self.index.update(input, self.monsters.len()) {
            self.monsters.swap(a, b);
        }
    }

    fn update_battle(&mut self, dt: f32, input: &InputState) {
        let Some(battle) = self.battle.as_mut() else {
            return;
        };
        battle.update(dt, input, &self.data);
        if battle.outcome != BattleOutcome::Ongoing && self.transition_target.is_none() {
            self.audio_cues.push(AudioCue::BattleStop);
            self.transition_target = Some(TransitionTarget::EndBattle);
            self.tint_mode = TintMode::Tint;
        }
    }

    /// Battle teardown, run at full tint: rosters move back, trainers get
    /// marked defeated and resume dialog, wild battles go straight to the
    /// evolution check.
    fn teardown_battle(&mut self) {
        let Some(battle) = self.battle.take() else {
            return;
        };
        let spoils = battle.into_spoils();
        self.monsters = spoils.player_party;
        for caught in spoils.caught {
            if self.monsters.len() < self.cfg.party_capacity {
                info!("caught {}", caught.species);
                self.monsters.push(caught);
            } else {
                warn!("roster full, releasing {}", caught.species);
            }
        }

        match spoils.character_index {
            Some(index) => {
                if let Some(character) = self.world.characters.get_mut(index) {
                    character.monsters = spoils.opponent_party;
                    if spoils.outcome == BattleOutcome::Won {
                        character.defeated = true;
                        self.create_dialog(index);
                    } else {
                        self.world.player.unblock();
                    }
                }
            }
            None => {
                self.world.player.unblock();
                self.check_evolution();
            }
        }
    }

    /// At most one evolution per check, scanning roster slots in order. A
    /// monster qualifies only at exactly its evolution level; the swap keeps
    /// level and slot.
    pub fn check_evolution(&mut self) {
        let mut evolved = false;
        for slot in 0..self.monsters.len() {
            let Some((target, at_level)) = self.monsters[slot].evolution.clone() else {
                continue;
            };
            if self.monsters[slot].level != at_level {
                continue;
            }
            match Monster::new(&self.data, &target, self.monsters[slot].level) {
                Ok(next) => {
                    let from = self.monsters[slot].species.clone();
                    info!("{from} evolves into {target}");
                    self.audio_cues.push(AudioCue::EvolutionStart);
                    self.world.player.block();
                    self.evolution = Some(Evolution::new(from, target, &self.cfg));
                    self.monsters[slot] = next;
                    evolved = true;
                }
                Err(err) => warn!("evolution skipped: {err}"),
            }
            break;
        }
        if !evolved && self.evolution.is_none() {
            self.audio_cues.push(AudioCue::OverworldStart);
        }
    }

    fn update_evolution(&mut self, dt: f32) {
        let Some(evolution) = self.evolution.as_mut() else {
            return;
        };
        if evolution.update(dt) {
            self.evolution = None;
            self.world.player.unblock();
            self.audio_cues.push(AudioCue::EvolutionStop);
            self.audio_cues.push(AudioCue::OverworldStart);
        }
    }

    /// Symmetric fade: rise to full black, mutate the world, fall back.
    fn tint_screen(&mut self, dt: f32) {
        match self.tint_mode {
            TintMode::Untint => {
                self.tint_progress -= self.cfg.tint_speed * dt;
            }
            TintMode::Tint => {
                self.tint_progress += self.cfg.tint_speed * dt;
                if self.tint_progress >= 255.0 {
                    match self.transition_target.take() {
                        Some(TransitionTarget::Map { map, spawn }) => {
                            self.switch_map(&map, &spawn);
                        }
                        Some(TransitionTarget::Battle(battle)) => {
                            self.battle = Some(*battle);
                        }
                        Some(TransitionTarget::EndBattle) => {
                            self.teardown_battle();
                        }
                        None => {}
                    }
                    self.tint_mode = TintMode::Untint;
                }
            }
        }
        self.tint_progress = self.tint_progress.clamp(0.0, 255.0);
    }

    fn switch_map(&mut self, map: &str, spawn: &str) {
        match build_world(&self.cfg, &self.data, &self.maps, map, spawn) {
            Some(world) => {
                self.world = world;
                self.current_map = map.to_string();
                self.current_spawn = spawn.to_string();
                info!("entered map `{map}` at `{spawn}`");
            }
            None => {
                warn!("map `{map}` not found, staying on `{}`", self.current_map);
                self.world.player.unblock();
            }
        }
    }

    /// Snapshot of everything the save file needs. Works mid-battle too:
    /// the roster is read from wherever it currently lives.
    pub fn snapshot(&self) -> SaveState {
        let roster: &[Monster] = match &self.battle {
            Some(battle) => battle.player_monsters(),
            None => &self.monsters,
        };
        let mut monsters = BTreeMap::new();
        for (slot, monster) in roster.iter().enumerate() {
            monsters.insert(slot as u32, monster.to_record());
        }
        let center = self.world.player.rect.center();
        SaveState {
            monsters,
            current_map: self.current_map.clone(),
            current_spawn: self.current_spawn.clone(),
            game_time: self.play_time,
            player_position: (center.x, center.y),
            rng: self.rng,
        }
    }

    /// Restores a snapshot. Everything is validated before any live state
    /// changes, so a bad save leaves the game exactly as it was.
    pub fn apply_snapshot(&mut self, state: &SaveState) -> Result<(), Box<dyn Error>> {
        let mut roster = Vec::new();
        for record in state.monsters.values() {
            roster.push(Monster::from_record(&self.data, record)?);
        }
        let world = build_world(
            &self.cfg,
            &self.data,
            &self.maps,
            &state.current_map,
            &state.current_spawn,
        )
        .ok_or_else(|| format!("saved map `{}` does not exist", state.current_map))?;

        self.world = world;
        self.current_map = state.current_map.clone();
        self.current_spawn = state.current_spawn.clone();
        self.monsters = roster;
        self.play_time = state.game_time;
        self.rng = state.rng;
        self.world
            .player
            .set_center(Vec2::new(state.player_position.0, state.player_position.1));
        self.dialog = None;
        self.battle = None;
        self.evolution = None;
        self.index_open = false;
        self.transition_target = None;
        self.tint_mode = TintMode::Untint;
        self.tint_progress = 0.0;
        self.audio_cues.push(AudioCue::OverworldStart);
        Ok(())
    }

    /// Draw-order data for the frame: world pass sorted by layer and y-sort,
    /// then UI pass in emission order.
    pub fn draw_commands(&self) -> Vec<DrawCmd> {
        let mut world_cmds = Vec::new();
        for rect in &self.world.terrain {
            world_cmds.push(DrawCmd::world(DrawKind::Scenery, *rect, Layer::Bg));
        }
        for rect in &self.world.water {
            world_cmds.push(DrawCmd::world(DrawKind::Water, *rect, Layer::Water));
        }
        for patch in &self.world.patches {
            world_cmds.push(DrawCmd::world(DrawKind::Patch, patch.rect, Layer::Bg));
        }
        for rect in &self.world.objects_main {
            world_cmds.push(DrawCmd::world(DrawKind::Scenery, *rect, Layer::Main));
        }
        for rect in &self.world.objects_top {
            world_cmds.push(DrawCmd::world(DrawKind::Scenery, *rect, Layer::Top));
        }
        for character in &self.world.characters {
            let mut cmd = DrawCmd::world(
                DrawKind::Character {
                    graphic: character.graphic.clone(),
                },
                character.rect,
                Layer::Main,
            );
            cmd.casts_shadow = true;
            world_cmds.push(cmd);
        }
        let player = &self.world.player;
        let mut player_cmd = DrawCmd::world(
            DrawKind::Player {
                moving: player.moving(),
            },
            player.rect,
            Layer::Main,
        );
        player_cmd.casts_shadow = true;
        world_cmds.push(player_cmd);
        if player.noticed {
            let icon = Rect::new(player.rect.center().x - 16.0, player.rect.top() - 40.0, 32.0, 32.0);
            world_cmds.push(DrawCmd::world(DrawKind::NoticeIcon, icon, Layer::Top));
        }
        world_cmds.sort_by(|a, b| {
            a.layer
                .cmp(&b.layer)
                .then(a.y_sort.partial_cmp(&b.y_sort).unwrap_or(std::cmp::Ordering::Equal))
        });

        let mut cmds = world_cmds;
        self.push_overlay_commands(&mut cmds);
        if self.tint_progress > 0.0 {
            let screen = Rect::new(
                0.0,
                0.0,
                self.cfg.window_width as f32,
                self.cfg.window_height as f32,
            );
            let mut tint = DrawCmd::ui(DrawKind::TintOverlay, screen);
            tint.alpha = self.tint_progress;
            cmds.push(tint);
        }
        cmds
    }

    fn push_overlay_commands(&self, cmds: &mut Vec<DrawCmd>) {
        let w = self.cfg.window_width as f32;
        let h = self.cfg.window_height as f32;

        if let Some(battle) = &self.battle {
            cmds.push(DrawCmd::ui(
                DrawKind::BattleScene {
                    biome: battle.biome.clone(),
                },
                Rect::new(0.0, 0.0, w, h),
            ));
            let target_highlight = match &battle.menu {
                Some(Menu::Target { side, slots, .. }) => {
                    slots.get(battle.cursor).map(|slot| (*side, *slot))
                }
                _ => None,
            };
            for (side, fielded, x) in [
                (SideId::Player, &battle.player.fielded, w * 0.18),
                (SideId::Opponent, &battle.opponent.fielded, w * 0.72),
            ] {
                for (row, &slot) in fielded.iter().enumerate() {
                    let monsters = match side {
                        SideId::Player => &battle.player.monsters,
                        SideId::Opponent => &battle.opponent.monsters,
                    };
                    let monster = &monsters[slot];
                    let highlighted = battle.current == Some((side, slot))
                        || target_highlight == Some((side, slot));
                    let rect = Rect::new(x, h * 0.18 + row as f32 * h * 0.24, 128.0, 128.0);
                    cmds.push(DrawCmd::ui(
                        DrawKind::BattleMonster {
                            species: monster.species.clone(),
                            player_side: side == SideId::Player,
                            highlighted,
                            health_frac: monster.health / monster.stat(Stat::MaxHealth).max(1.0),
                        },
                        rect,
                    ));
                }
            }
            let entries = battle.menu_entries();
            if !entries.is_empty() {
                cmds.push(DrawCmd::ui(
                    DrawKind::BattleMenu {
                        entries,
                        cursor: battle.cursor,
                    },
                    Rect::new(w * 0.35, h * 0.72, w * 0.3, h * 0.24),
                ));
            }
        }

        if let Some(dialog) = &self.dialog {
            let speaker = self
                .world
                .characters
                .get(dialog.character_index)
                .map(|c| c.character_id.clone())
                .unwrap_or_default();
            cmds.push(DrawCmd::ui(
                DrawKind::DialogBox {
                    speaker,
                    line: dialog.current_line().to_string(),
                },
                Rect::new(40.0, h - 170.0, w - 80.0, 140.0),
            ));
        }

        if self.index_open {
            cmds.push(DrawCmd::ui(
                DrawKind::IndexPanel {
                    entries: self.index.entries(&self.monsters),
                    cursor: self.index.cursor,
                    selected: self.index.selected,
                },
                Rect::new(w * 0.25, h * 0.1, w * 0.5, h * 0.8),
            ));
        }

        if let Some(evolution) = &self.evolution {
            let species = match evolution.phase() {
                EvolutionPhase::Start | EvolutionPhase::Flashing => evolution.from_species.clone(),
                EvolutionPhase::Revealed => evolution.to_species.clone(),
            };
            cmds.push(DrawCmd::ui(
                DrawKind::EvolutionScene {
                    species,
                    flash: evolution.tint_amount,
                },
                Rect::new(0.0, 0.0, w, h),
            ));
        }
    }
}

/// Builds the world for a map, logging and skipping whatever is broken.
/// A missing spawn point falls back to a safe default position; a missing
/// map returns `None` and the caller keeps the old world.
fn build_world(
    cfg: &GameConfig,
    data: &GameData,
    maps: &HashMap<String, MapData>,
    map_name: &str,
    spawn_name: &str,
) -> Option<World> {
    let map = maps.get(map_name)?;

    let mut collision_rects = map.collisions.clone();
    for object in &map.objects {
        if !object.top {
            collision_rects.push(object.rect);
        }
    }
    collision_rects.extend(map.water.iter().copied());

    let (spawn_pos, spawn_facing) = match map.spawn(spawn_name) {
        Some(spawn) => (spawn.pos, spawn.direction),
        None => {
            warn!("spawn `{spawn_name}` missing on `{map_name}`, using fallback position");
            let fallback = map
                .terrain
                .first()
                .map(|r| r.center())
                .unwrap_or(Vec2::new(0.0, 0.0));
            (fallback, Facing::Down)
        }
    };
    let player = Player::new(spawn_pos, spawn_facing, cfg);

    let mut characters = Vec::new();
    for npc in &map.npcs {
        match Character::new(data, npc, cfg) {
            Ok(character) => characters.push(character),
            Err(err) => warn!("skipping npc on `{map_name}`: {err}"),
        }
    }

    let mut patches = Vec::new();
    for patch in &map.patches {
        let mut patch = patch.clone();
        patch
            .monsters
            .retain(|species| match data.species(species) {
                Ok(_) => true,
                Err(err) => {
                    warn!("patch on `{map_name}`: {err}");
                    false
                }
            });
        if patch.monsters.is_empty() {
            warn!("patch on `{map_name}` has no valid species, skipping");
            continue;
        }
        patches.push(patch);
    }

    Some(World {
        player,
        characters,
        collision_rects,
        transitions: map.transitions.clone(),
        patches,
        terrain: map.terrain.clone(),
        water: map.water.clone(),
        objects_main: map
            .objects
            .iter()
            .filter(|o| !o.top)
            .map(|o| o.rect)
            .collect(),
        objects_top: map
            .objects
            .iter()
            .filter(|o| o.top)
            .map(|o| o.rect)
            .collect(),
    })
}
