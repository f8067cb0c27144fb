//! Overworld entities: the player and NPC characters.
//!
//! Characters flagged as roaming lookouts run the notice sequence: spot the
//! player along their facing direction, freeze them, walk up, and hand
//! control to the dialog system. Each step is one-shot per encounter.

use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::game_data::{CharacterData, DataError, GameData};
use crate::geometry::{Rect, Vec2};
use crate::input::InputState;
use crate::map_data::NpcDef;
use crate::monster::Monster;
use crate::rng;
use crate::scene::AudioCue;
use crate::timer::Timer;

/// Lateral slack for facing checks: how far off dead-ahead a target may sit
/// and still count as "in front".
pub const FACING_TOLERANCE: f32 = 30.0;
/// Hitbox growth used for the approach contact check.
const CONTACT_PAD: f32 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    Up,
    Down,
    Left,
    Right,
}

impl Facing {
    fn from_direction(dir: Vec2, current: Facing) -> Facing {
        let mut facing = current;
        if dir.x != 0.0 {
            facing = if dir.x > 0.0 { Facing::Right } else { Facing::Left };
        }
        if dir.y != 0.0 {
            facing = if dir.y > 0.0 { Facing::Down } else { Facing::Up };
        }
        facing
    }

    /// Facing that looks from `from` toward `to`; mostly-horizontal offsets
    /// pick left/right, otherwise up/down.
    pub fn toward(from: Vec2, to: Vec2) -> Facing {
        let rel = to - from;
        if rel.y.abs() < FACING_TOLERANCE {
            if rel.x > 0.0 {
                Facing::Right
            } else {
                Facing::Left
            }
        } else if rel.y > 0.0 {
            Facing::Down
        } else {
            Facing::Up
        }
    }
}

fn entity_rect(center: Vec2, cfg: &GameConfig) -> Rect {
    let size = cfg.tile_size * 2.0;
    Rect::from_center(center, size, size)
}

fn entity_hitbox(rect: &Rect) -> Rect {
    rect.inflate(-rect.w / 2.0, -60.0)
}

pub struct Player {
    pub rect: Rect,
    pub hitbox: Rect,
    pub facing: Facing,
    pub direction: Vec2,
    speed: f32,
    pub blocked: bool,
    /// Drives the floating "!" indicator while a lookout closes in.
    pub noticed: bool,
}

impl Player {
    pub fn new(pos: Vec2, facing: Facing, cfg: &GameConfig) -> Self {
        let rect = entity_rect(pos, cfg);
        let hitbox = entity_hitbox(&rect);
        Self {
            rect,
            hitbox,
            facing,
            direction: Vec2::ZERO,
            speed: cfg.entity_speed,
            blocked: false,
            noticed: false,
        }
    }

    pub fn block(&mut self) {
        self.blocked = true;
        self.direction = Vec2::ZERO;
    }

    pub fn unblock(&mut self) {
        self.blocked = false;
    }

    pub fn moving(&self) -> bool {
        self.direction.x != 0.0 || self.direction.y != 0.0
    }

    /// Animation state key, e.g. `down` or `down_idle`.
    pub fn state_key(&self) -> String {
        let facing = match self.facing {
            Facing::Up => "up",
            Facing::Down => "down",
            Facing::Left => "left",
            Facing::Right => "right",
        };
        if self.moving() {
            facing.to_string()
        } else {
            format!("{facing}_idle")
        }
    }

    pub fn face_toward(&mut self, target: Vec2) {
        self.facing = Facing::toward(self.rect.center(), target);
    }

    pub fn set_center(&mut self, center: Vec2) {
        self.rect.set_center(center);
        self.hitbox.set_center(center);
    }

    pub fn update(&mut self, dt: f32, input: &InputState, collisions: &[Rect]) {
        if self.blocked {
            return;
        }
        self.direction = input.direction();
        self.facing = Facing::from_direction(self.direction, self.facing);
        self.move_and_collide(dt, collisions);
    }

    /// Axis-separated movement: horizontal pass, resolve, then vertical
    /// pass, resolve. Each resolution snaps the moving edge of the hitbox
    /// flush to the obstacle.
    fn move_and_collide(&mut self, dt: f32, collisions: &[Rect]) {
        let step = self.direction.scale(self.speed * dt);

        let mut center = self.rect.center();
        center.x += step.x;
        self.rect.set_center(center);
        self.hitbox.set_center(center);
        for obstacle in collisions {
            if self.hitbox.colliderect(obstacle) {
                if self.direction.x > 0.0 {
                    self.hitbox.set_right(obstacle.left());
                }
                if self.direction.x < 0.0 {
                    self.hitbox.set_left(obstacle.right());
                }
                center = self.hitbox.center();
                self.rect.set_center(center);
            }
        }

        center = self.rect.center();
        center.y += step.y;
        self.rect.set_center(center);
        self.hitbox.set_center(center);
        for obstacle in collisions {
            if self.hitbox.colliderect(obstacle) {
                if self.direction.y > 0.0 {
                    self.hitbox.set_bottom(obstacle.top());
                }
                if self.direction.y < 0.0 {
                    self.hitbox.set_top(obstacle.bottom());
                }
                center = self.hitbox.center();
                self.rect.set_center(center);
            }
        }
    }
}

/// Named timers of the character state machine.
struct CharacterTimers {
    look_around: Timer,
    notice: Timer,
}

/// Raised by `Character::update` when the approach reaches the player.
#[derive(Debug, PartialEq, Eq)]
pub enum CharacterEvent {
    ReachedPlayer,
}

pub struct Character {
    pub rect: Rect,
    pub hitbox: Rect,
    pub facing: Facing,
    pub direction: Vec2,
    speed: f32,
    pub character_id: String,
    pub graphic: String,
    pub data: CharacterData,
    /// Trainer roster; persists across battles and is mutated in place.
    pub monsters: Vec<Monster>,
    pub defeated: bool,
    pub radius: f32,
    pub has_moved: bool,
    pub can_rotate: bool,
    pub has_noticed: bool,
    timers: CharacterTimers,
}

impl Character {
    pub fn new(game_data: &GameData, def: &NpcDef, cfg: &GameConfig) -> Result<Self, DataError> {
        let data = game_data.character(&def.character_id)?.clone();
        let monsters = data
            .monsters
            .iter()
            .map(|(species, level)| Monster::new(game_data, species, *level))
            .collect::<Result<Vec<_>, _>>()?;
        let rect = entity_rect(def.pos, cfg);
        let hitbox = entity_hitbox(&rect);
        let defeated = data.defeated;
        Ok(Self {
            rect,
            hitbox,
            facing: def.direction,
            direction: Vec2::ZERO,
            speed: cfg.entity_speed,
            character_id: def.character_id.clone(),
            graphic: def.graphic.clone(),
            data,
            monsters,
            defeated,
            radius: def.radius,
            has_moved: false,
            can_rotate: true,
            has_noticed: false,
            timers: CharacterTimers {
                look_around: Timer::new(cfg.look_around_ms, true, true),
                notice: Timer::new(cfg.notice_delay_ms, false, false),
            },
        })
    }

    pub fn dialog(&self) -> &[String] {
        if self.defeated {
            &self.data.dialog_defeated
        } else {
            &self.data.dialog_default
        }
    }

    pub fn is_trainer(&self) -> bool {
        !self.monsters.is_empty()
    }

    pub fn face_toward(&mut self, target: Vec2) {
        self.facing = Facing::toward(self.rect.center(), target);
    }

    pub fn stop_rotating(&mut self) {
        self.can_rotate = false;
    }

    pub fn update(
        &mut self,
        dt: f32,
        player: &mut Player,
        collisions: &[Rect],
        rng_state: &mut u32,
        cues: &mut Vec<AudioCue>,
    ) -> Option<CharacterEvent> {
        if self.timers.look_around.update(dt) && self.can_rotate {
            if let Some(facing) = rng::pick(rng_state, &self.data.directions) {
                self.facing = *facing;
            }
        }
        if self.timers.notice.update(dt) {
            self.start_move(player);
        }

        if self.data.look_around {
            self.raycast(player, collisions, cues);
            return self.advance(dt, player);
        }
        None
    }

    /// Notice trigger: player in range, dead ahead within tolerance, with a
    /// clear line of sight, and the sequence not yet run.
    fn raycast(&mut self, player: &mut Player, collisions: &[Rect], cues: &mut Vec<AudioCue>) {
        if self.has_moved || self.has_noticed {
            return;
        }
        if !self.sees(player, collisions) {
            return;
        }
        player.block();
        player.face_toward(self.rect.center());
        self.timers.notice.activate();
        self.can_rotate = false;
        self.has_noticed = true;
        player.noticed = true;
        cues.push(AudioCue::Notice);
    }

    fn sees(&self, player: &Player, collisions: &[Rect]) -> bool {
        let rel = player.rect.center() - self.rect.center();
        if rel.length() >= self.radius {
            return false;
        }
        let facing_hit = match self.facing {
            Facing::Left => rel.x < 0.0 && rel.y.abs() < FACING_TOLERANCE,
            Facing::Right => rel.x > 0.0 && rel.y.abs() < FACING_TOLERANCE,
            Facing::Up => rel.y < 0.0 && rel.x.abs() < FACING_TOLERANCE,
            Facing::Down => rel.y > 0.0 && rel.x.abs() < FACING_TOLERANCE,
        };
        if !facing_hit {
            return false;
        }
        let a = self.rect.center();
        let b = player.rect.center();
        !collisions.iter().any(|rect| rect.clipline(a, b))
    }

    /// Picks the approach step toward the player, axis-aligned along the
    /// dominant axis. A coincident player means no movement at all.
    fn start_move(&mut self, player: &Player) {
        let rel = player.rect.center() - self.rect.center();
        if rel.length() == 0.0 {
            return;
        }
        let dir = if rel.x.abs() >= rel.y.abs() {
            Vec2::new(rel.x.signum(), 0.0)
        } else {
            Vec2::new(0.0, rel.y.signum())
        };
        self.direction = dir;
        self.facing = Facing::from_direction(dir, self.facing);
    }

    fn advance(&mut self, dt: f32, player: &mut Player) -> Option<CharacterEvent> {
        if self.has_moved || !self.is_moving() {
            return None;
        }
        if !self
            .hitbox
            .inflate(CONTACT_PAD, CONTACT_PAD)
            .colliderect(&player.hitbox)
        {
            let center = self.rect.center() + self.direction.scale(self.speed * dt);
            self.rect.set_center(center);
            self.hitbox.set_center(center);
            None
        } else {
            self.direction = Vec2::ZERO;
            self.has_moved = true;
            player.noticed = false;
            Some(CharacterEvent::ReachedPlayer)
        }
    }

    pub fn is_moving(&self) -> bool {
        self.direction.x != 0.0 || self.direction.y != 0.0
    }

    /// Animation state key, same scheme as the player's.
    pub fn state_key(&self) -> String {
        let facing = match self.facing {
            Facing::Up => "up",
            Facing::Down => "down",
            Facing::Left => "left",
            Facing::Right => "right",
        };
        if self.is_moving() {
            facing.to_string()
        } else {
            format!("{facing}_idle")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map_data::NpcDef;

    fn cfg() -> GameConfig {
        GameConfig::default()
    }

    fn lookout(pos: Vec2, facing: Facing) -> Character {
        let data = GameData::builtin();
        let def = NpcDef {
            character_id: "ranger_elm".to_string(),
            graphic: "ranger".to_string(),
            pos,
            direction: facing,
            radius: 320.0,
        };
        Character::new(&data, &def, &cfg()).unwrap()
    }

    #[test]
    fn player_stops_flush_against_obstacle() {
        let cfg = cfg();
        let mut player = Player::new(Vec2::new(100.0, 100.0), Facing::Right, &cfg);
        let wall = Rect::new(300.0, 0.0, 64.0, 400.0);
        let input = InputState {
            right: true,
            ..Default::default()
        };
        // oversized step slams straight into the wall
        for _ in 0..10 {
            player.update(1.0, &input, &[wall]);
        }
        assert_eq!(player.hitbox.right(), wall.left());
        assert!(!player.hitbox.colliderect(&wall));
    }

    #[test]
    fn player_snaps_on_vertical_axis_too() {
        let cfg = cfg();
        let mut player = Player::new(Vec2::new(100.0, 100.0), Facing::Down, &cfg);
        let floor = Rect::new(0.0, 300.0, 400.0, 64.0);
        let input = InputState {
            down: true,
            ..Default::default()
        };
        for _ in 0..10 {
            player.update(0.5, &input, &[floor]);
        }
        assert_eq!(player.hitbox.bottom(), floor.top());
    }

    #[test]
    fn blocked_player_ignores_input() {
        let cfg = cfg();
        let mut player = Player::new(Vec2::new(100.0, 100.0), Facing::Down, &cfg);
        player.block();
        let start = player.rect.center();
        let input = InputState {
            right: true,
            ..Default::default()
        };
        player.update(1.0, &input, &[]);
        assert_eq!(player.rect.center(), start);
        assert_eq!(player.direction, Vec2::ZERO);
    }

    #[test]
    fn notice_sequence_fires_once() {
        let cfg = cfg();
        let mut character = lookout(Vec2::new(0.0, 0.0), Facing::Right);
        let mut player = Player::new(Vec2::new(200.0, 0.0), Facing::Left, &cfg);
        let mut rng_state = 1;
        let mut cues = Vec::new();

        character.update(0.016, &mut player, &[], &mut rng_state, &mut cues);
        assert!(character.has_noticed);
        assert!(player.blocked);
        assert!(player.noticed);
        assert_eq!(cues, vec![AudioCue::Notice]);
        assert!(!character.can_rotate);

        // second tick must not re-trigger the cue
        cues.clear();
        character.update(0.016, &mut player, &[], &mut rng_state, &mut cues);
        assert!(cues.is_empty());
    }

    #[test]
    fn wall_blocks_line_of_sight() {
        let cfg = cfg();
        let mut character = lookout(Vec2::new(0.0, 0.0), Facing::Right);
        let mut player = Player::new(Vec2::new(200.0, 0.0), Facing::Left, &cfg);
        let wall = Rect::new(90.0, -50.0, 20.0, 100.0);
        let mut rng_state = 1;
        let mut cues = Vec::new();
        character.update(0.016, &mut player, &[wall], &mut rng_state, &mut cues);
        assert!(!character.has_noticed);
        assert!(!player.blocked);
    }

    #[test]
    fn facing_gate_requires_dead_ahead() {
        let cfg = cfg();
        let mut character = lookout(Vec2::new(0.0, 0.0), Facing::Left);
        // player is to the right, lookout faces left
        let mut player = Player::new(Vec2::new(200.0, 0.0), Facing::Left, &cfg);
        let mut rng_state = 1;
        let mut cues = Vec::new();
        character.update(0.016, &mut player, &[], &mut rng_state, &mut cues);
        assert!(!character.has_noticed);
    }

    #[test]
    fn approach_is_axis_aligned_and_one_shot() {
        let cfg = cfg();
        let mut character = lookout(Vec2::new(0.0, 0.0), Facing::Right);
        let mut player = Player::new(Vec2::new(260.0, 10.0), Facing::Left, &cfg);
        let mut rng_state = 1;
        let mut cues = Vec::new();

        character.update(0.016, &mut player, &[], &mut rng_state, &mut cues);
        assert!(character.has_noticed);
        // run out the notice delay so the walk starts
        let mut reached = None;
        for _ in 0..600 {
            if let Some(event) =
                character.update(0.016, &mut player, &[], &mut rng_state, &mut cues)
            {
                reached = Some(event);
                break;
            }
        }
        assert_eq!(reached, Some(CharacterEvent::ReachedPlayer));
        assert!(character.has_moved);
        assert!(!player.noticed);
        // dominant axis was x, so no vertical drift happened
        assert_eq!(character.rect.center().y, 0.0);

        // the sequence never re-arms
        let before = character.rect.center();
        for _ in 0..60 {
            character.update(0.016, &mut player, &[], &mut rng_state, &mut cues);
        }
        assert_eq!(character.rect.center(), before);
    }

    #[test]
    fn coincident_player_short_circuits_to_no_movement() {
        let cfg = cfg();
        let mut character = lookout(Vec2::new(0.0, 0.0), Facing::Right);
        let player = Player::new(Vec2::new(0.0, 0.0), Facing::Left, &cfg);
        character.start_move(&player);
        assert_eq!(character.direction, Vec2::ZERO);
    }
}
