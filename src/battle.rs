//! Turn-based battle engine.
//!
//! Turn order is an initiative gauge: every fielded monster accrues
//! `speed * dt` continuously, the first to cross the threshold acts, and
//! acting resets its gauge to zero. While someone is acting the whole field
//! is paused. Player turns walk a small menu state machine; opponent turns
//! resolve immediately with a random affordable ability.

use log::debug;

use crate::config::GameConfig;
use crate::game_data::{AbilityTarget, GameData};
use crate::input::InputState;
use crate::monster::{Monster, Stat};
use crate::rng;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SideId {
    Player,
    Opponent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BattleOutcome {
    Ongoing,
    Won,
    Lost,
    Fled,
    Caught,
}

/// One side of the battle: owned monster slots plus the fielded rotation.
/// Slot indices are stable for the whole battle; the fielded list is kept
/// sorted so target enumeration has a fixed order.
pub struct BattleSide {
    pub monsters: Vec<Monster>,
    pub fielded: Vec<usize>,
    captured: Vec<usize>,
}

impl BattleSide {
    fn new(mut monsters: Vec<Monster>, limit: usize) -> Self {
        for monster in &mut monsters {
            monster.initiative = 0.0;
            monster.defending = false;
            monster.paused = false;
        }
        let mut side = Self {
            monsters,
            fielded: Vec::new(),
            captured: Vec::new(),
        };
        side.refill(limit);
        side
    }

    /// Drops fainted or captured monsters from the field and pulls bench
    /// replacements in slot order.
    fn refill(&mut self, limit: usize) {
        self.fielded
            .retain(|&slot| !self.monsters[slot].fainted() && !self.captured.contains(&slot));
        for slot in 0..self.monsters.len() {
            if self.fielded.len() >= limit {
                break;
            }
            if self.monsters[slot].fainted()
                || self.captured.contains(&slot)
                || self.fielded.contains(&slot)
            {
                continue;
            }
            self.fielded.push(slot);
        }
        self.fielded.sort_unstable();
    }

    pub fn alive(&self) -> bool {
        self.monsters
            .iter()
            .enumerate()
            .any(|(slot, m)| !m.fainted() && !self.captured.contains(&slot))
    }

    pub fn bench(&self) -> Vec<usize> {
        (0..self.monsters.len())
            .filter(|slot| {
                !self.monsters[*slot].fainted()
                    && !self.fielded.contains(slot)
                    && !self.captured.contains(slot)
            })
            .collect()
    }
}

/// Player-turn menu state.
pub enum Menu {
    General,
    Attacks { abilities: Vec<String> },
    Switch { bench: Vec<usize> },
    /// `ability: None` is a catch attempt.
    Target { ability: Option<String>, side: SideId, slots: Vec<usize> },
}

/// Everything handed back to the orchestrator at teardown.
pub struct BattleSpoils {
    pub player_party: Vec<Monster>,
    pub opponent_party: Vec<Monster>,
    pub caught: Vec<Monster>,
    pub outcome: BattleOutcome,
    pub character_index: Option<usize>,
}

pub struct Battle {
    pub player: BattleSide,
    pub opponent: BattleSide,
    pub character_index: Option<usize>,
    pub biome: String,
    pub outcome: BattleOutcome,
    pub current: Option<(SideId, usize)>,
    pub menu: Option<Menu>,
    pub cursor: usize,
    caught: Vec<Monster>,
    party_capacity: usize,
    fielded_limit: usize,
    threshold: f32,
    rng: u32,
}

impl Battle {
    pub fn new(
        cfg: &GameConfig,
        player_party: Vec<Monster>,
        opponent_party: Vec<Monster>,
        character_index: Option<usize>,
        biome: String,
        seed: u32,
    ) -> Self {
        Self {
            player: BattleSide::new(player_party, cfg.fielded_per_side),
            opponent: BattleSide::new(opponent_party, cfg.fielded_per_side),
            character_index,
            biome,
            outcome: BattleOutcome::Ongoing,
            current: None,
            menu: None,
            cursor: 0,
            caught: Vec::new(),
            party_capacity: cfg.party_capacity,
            fielded_limit: cfg.fielded_per_side,
            threshold: cfg.initiative_threshold,
            rng: seed,
        }
    }

    pub fn is_trainer(&self) -> bool {
        self.character_index.is_some()
    }

    pub fn player_monsters(&self) -> &[Monster] {
        &self.player.monsters
    }

    fn side(&self, id: SideId) -> &BattleSide {
        match id {
            SideId::Player => &self.player,
            SideId::Opponent => &self.opponent,
        }
    }

    fn side_mut(&mut self, id: SideId) -> &mut BattleSide {
        match id {
            SideId::Player => &mut self.player,
            SideId::Opponent => &mut self.opponent,
        }
    }

    pub fn update(&mut self, dt: f32, input: &InputState, data: &GameData) {
        if self.outcome != BattleOutcome::Ongoing {
            return;
        }
        match self.current {
            None => {
                self.accrue(dt);
                if let Some((side, slot)) = self.ready_actor() {
                    self.begin_turn(side, slot, data);
                }
            }
            Some((SideId::Player, slot)) => self.menu_input(input, data, slot),
            // opponent turns resolve inside begin_turn
            Some((SideId::Opponent, _)) => {}
        }
    }

    fn accrue(&mut self, dt: f32) {
        for id in [SideId::Player, SideId::Opponent] {
            let side = self.side_mut(id);
            let fielded = side.fielded.clone();
            for slot in fielded {
                side.monsters[slot].update(dt);
            }
        }
    }

    /// The monster acting next: highest gauge at or past the threshold.
    /// Ties resolve player side first, then lower slot, so the pick is
    /// independent of float ordering quirks.
    fn ready_actor(&self) -> Option<(SideId, usize)> {
        let mut best: Option<(SideId, usize, f32)> = None;
        for id in [SideId::Player, SideId::Opponent] {
            for &slot in &self.side(id).fielded {
                let initiative = self.side(id).monsters[slot].initiative;
                if initiative < self.threshold {
                    continue;
                }
                let beats = match best {
                    None => true,
                    Some((_, _, current_best)) => initiative > current_best,
                };
                if beats {
                    best = Some((id, slot, initiative));
                }
            }
        }
        best.map(|(side, slot, _)| (side, slot))
    }

    fn begin_turn(&mut self, side: SideId, slot: usize, data: &GameData) {
        debug!("turn: {:?} slot {}", side, slot);
        for id in [SideId::Player, SideId::Opponent] {
            for monster in &mut self.side_mut(id).monsters {
                monster.paused = true;
            }
        }
        let actor = &mut self.side_mut(side).monsters[slot];
        actor.initiative = 0.0;
        actor.defending = false;
        self.current = Some((side, slot));
        match side {
            SideId::Player => {
                self.menu = Some(Menu::General);
                self.cursor = 0;
            }
            SideId::Opponent => {
                self.opponent_act(slot, data);
            }
        }
    }

    fn end_turn(&mut self) {
        self.current = None;
        self.menu = None;
        self.cursor = 0;
        for id in [SideId::Player, SideId::Opponent] {
            for monster in &mut self.side_mut(id).monsters {
                monster.paused = false;
            }
        }
    }

    /// Action names available from the root menu.
    pub fn general_entries(&self) -> Vec<&'static str> {
        let mut entries = vec!["fight", "defend", "switch"];
        if !self.is_trainer() {
            entries.push("catch");
            entries.push("flee");
        }
        entries
    }

    /// Display entries for the open menu, used by the shell.
    pub fn menu_entries(&self) -> Vec<String> {
        match &self.menu {
            None => vec![],
            Some(Menu::General) => self
                .general_entries()
                .into_iter()
                .map(str::to_string)
                .collect(),
            Some(Menu::Attacks { abilities }) => abilities.clone(),
            Some(Menu::Switch { bench }) => bench
                .iter()
                .map(|&slot| self.player.monsters[slot].species.clone())
                .collect(),
            Some(Menu::Target { side, slots, .. }) => slots
                .iter()
                .map(|&slot| self.side(*side).monsters[slot].species.clone())
                .collect(),
        }
    }

    fn menu_input(&mut self, input: &InputState, data: &GameData, slot: usize) {
        // acting on a monster that fainted mid-menu is invalid
        if self.player.monsters[slot].fainted() {
            self.end_turn();
            return;
        }
        let len = self.menu_entries().len();
        if len == 0 {
            self.end_turn();
            return;
        }
        if input.pressed_up && self.cursor > 0 {
            self.cursor -= 1;
        }
        if input.pressed_down && self.cursor + 1 < len {
            self.cursor += 1;
        }
        if !input.pressed_interact {
            return;
        }

        match self.menu.take() {
            Some(Menu::General) => {
                let choice = self.general_entries()[self.cursor];
                self.cursor = 0;
                match choice {
                    "fight" => {
                        let abilities: Vec<String> = self.player.monsters[slot]
                            .abilities(data, true)
                            .into_iter()
                            .map(str::to_string)
                            .collect();
                        if abilities.is_empty() {
                            self.menu = Some(Menu::General);
                        } else {
                            self.menu = Some(Menu::Attacks { abilities });
                        }
                    }
                    "defend" => {
                        self.player.monsters[slot].defending = true;
                        self.end_turn();
                    }
                    "switch" => {
                        let bench = self.player.bench();
                        if bench.is_empty() {
                            self.menu = Some(Menu::General);
                        } else {
                            self.menu = Some(Menu::Switch { bench });
                        }
                    }
                    "catch" => {
                        if self.roster_full() {
                            self.menu = Some(Menu::General);
                        } else {
                            self.menu = Some(Menu::Target {
                                ability: None,
                                side: SideId::Opponent,
                                slots: self.opponent.fielded.clone(),
                            });
                        }
                    }
                    "flee" => {
                        self.outcome = BattleOutcome::Fled;
                    }
                    _ => self.menu = Some(Menu::General),
                }
            }
            Some(Menu::Attacks { abilities }) => {
                let ability = abilities[self.cursor].clone();
                self.cursor = 0;
                let target_side = match data.ability(&ability).map(|a| a.target) {
                    Ok(AbilityTarget::Own) => SideId::Player,
                    _ => SideId::Opponent,
                };
                self.menu = Some(Menu::Target {
                    ability: Some(ability),
                    side: target_side,
                    slots: self.side(target_side).fielded.clone(),
                });
            }
            Some(Menu::Switch { bench }) => {
                let incoming = bench[self.cursor];
                self.cursor = 0;
                if let Some(entry) = self.player.fielded.iter_mut().find(|s| **s == slot) {
                    *entry = incoming;
                }
                self.player.fielded.sort_unstable();
                self.player.monsters[incoming].initiative = 0.0;
                self.end_turn();
            }
            Some(Menu::Target { ability, side, slots }) => {
                let target_slot = slots[self.cursor];
                self.cursor = 0;
                match ability {
                    Some(name) => {
                        self.resolve_ability((SideId::Player, slot), (side, target_slot), &name, data);
                    }
                    None => {
                        self.try_catch(data, target_slot);
                    }
                }
                if self.outcome == BattleOutcome::Ongoing {
                    self.end_turn();
                } else {
                    self.menu = None;
                }
            }
            None => {}
        }
    }

    fn opponent_act(&mut self, slot: usize, data: &GameData) {
        let abilities: Vec<String> = self.opponent.monsters[slot]
            .abilities(data, true)
            .into_iter()
            .map(str::to_string)
            .collect();
        let Some(ability) = rng::pick(&mut self.rng, &abilities).cloned() else {
            // out of energy for everything: hold the line instead
            self.opponent.monsters[slot].defending = true;
            self.end_turn();
            return;
        };
        let target_side = match data.ability(&ability).map(|a| a.target) {
            Ok(AbilityTarget::Own) => SideId::Opponent,
            _ => SideId::Player,
        };
        let slots = self.side(target_side).fielded.clone();
        let Some(target_slot) = rng::pick(&mut self.rng, &slots).copied() else {
            self.end_turn();
            return;
        };
        self.resolve_ability((SideId::Opponent, slot), (target_side, target_slot), &ability, data);
        if self.outcome == BattleOutcome::Ongoing {
            self.end_turn();
        }
    }

    /// Applies one ability: energy cost, then damage (attack stat x power x
    /// element multiplier, halved into a defending target) or healing for
    /// own-side abilities. Fainting and outcome checks follow.
    fn resolve_ability(
        &mut self,
        actor: (SideId, usize),
        target: (SideId, usize),
        ability: &str,
        data: &GameData,
    ) {
        let Ok(ability_data) = data.ability(ability) else {
            return;
        };
        let target_kind = ability_data.target;
        let ability_element = ability_data.element;

        let amount = self.side(actor.0).monsters[actor.1].base_damage(data, ability);
        self.side_mut(actor.0).monsters[actor.1].reduce_energy(data, ability);

        let target_mon = &mut self.side_mut(target.0).monsters[target.1];
        match target_kind {
            AbilityTarget::Own => {
                target_mon.health += amount;
            }
            AbilityTarget::Opponent => {
                let mut damage = amount * ability_element.multiplier_against(target_mon.element);
                if target_mon.defending {
                    damage *= 0.5;
                }
                target_mon.health -= damage;
            }
        }
        target_mon.stat_limiter();
        debug!(
            "{} used {} on {:?} slot {}",
            self.side(actor.0).monsters[actor.1].species,
            ability,
            target.0,
            target.1
        );
        self.settle_faints(data);
    }

    /// Fainted opponents pay out XP split across the fielded player
    /// monsters, both fields refill from their benches, and a side with
    /// nothing left ends the battle.
    fn settle_faints(&mut self, _data: &GameData) {
        let receivers: Vec<usize> = self
            .player
            .fielded
            .iter()
            .copied()
            .filter(|&slot| !self.player.monsters[slot].fainted())
            .collect();
        let fainted_opponents: Vec<usize> = self
            .opponent
            .fielded
            .iter()
            .copied()
            .filter(|&slot| self.opponent.monsters[slot].fainted())
            .collect();
        if !receivers.is_empty() {
            for &down in &fainted_opponents {
                let xp = self.opponent.monsters[down].level as f32 * 100.0 / receivers.len() as f32;
                for &slot in &receivers {
                    self.player.monsters[slot].update_xp(xp);
                }
            }
        }

        self.player.refill(self.fielded_limit);
        self.opponent.refill(self.fielded_limit);

        if !self.opponent.alive() {
            self.outcome = BattleOutcome::Won;
        }
        if !self.player.alive() {
            self.outcome = BattleOutcome::Lost;
        }
    }

    fn roster_full(&self) -> bool {
        self.player.monsters.len() + self.caught.len() >= self.party_capacity
    }

    /// Catch attempt against an opponent slot. Invalid against trainers and
    /// with a full roster; success odds grow as the target's health drops.
    pub fn try_catch(&mut self, _data: &GameData, target_slot: usize) -> bool {
        if self.is_trainer() || self.roster_full() {
            return false;
        }
        let Some(target) = self.opponent.monsters.get(target_slot) else {
            return false;
        };
        if target.fainted() || self.opponent.captured.contains(&target_slot) {
            return false;
        }
        let health_frac = target.health / target.stat(Stat::MaxHealth).max(1.0);
        let chance = 1.0 - health_frac;
        if rng::unit_f32(&mut self.rng) >= chance {
            return false;
        }
        let mut caught = target.clone();
        caught.paused = false;
        caught.defending = false;
        caught.initiative = 0.0;
        self.caught.push(caught);
        self.opponent.captured.push(target_slot);
        self.opponent.refill(self.fielded_limit);
        if !self.opponent.alive() {
            self.outcome = BattleOutcome::Caught;
        }
        true
    }

    pub fn into_spoils(self) -> BattleSpoils {
        BattleSpoils {
            player_party: self.player.monsters,
            opponent_party: self.opponent.monsters,
            caught: self.caught,
            outcome: self.outcome,
            character_index: self.character_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_data::GameData;

    fn cfg() -> GameConfig {
        GameConfig::default()
    }

    fn mon(data: &GameData, species: &str, level: u32) -> Monster {
        Monster::new(data, species, level).unwrap()
    }

    fn wild(data: &GameData, player: Vec<Monster>, opponent: Vec<Monster>) -> Battle {
        Battle::new(&cfg(), player, opponent, None, "forest".to_string(), 0x1234)
    }

    fn press_interact() -> InputState {
        InputState {
            pressed_interact: true,
            ..Default::default()
        }
    }

    fn choose(battle: &mut Battle, data: &GameData, entry: &str) {
        let entries = battle.menu_entries();
        let index = entries
            .iter()
            .position(|e| e == entry)
            .unwrap_or_else(|| panic!("entry {entry} not in {entries:?}"));
        battle.cursor = index;
        battle.update(0.0, &press_interact(), data);
    }

    fn run_until_player_turn(battle: &mut Battle, data: &GameData) {
        let idle = InputState::default();
        for _ in 0..10_000 {
            if matches!(battle.current, Some((SideId::Player, _))) {
                return;
            }
            if battle.outcome != BattleOutcome::Ongoing {
                return;
            }
            battle.update(0.05, &idle, data);
        }
        panic!("player never got a turn");
    }

    #[test]
    fn faster_monster_acts_first() {
        let data = GameData::builtin();
        // Sproutle speed base 5: level 2 -> 10, level 4 -> 20
        let slow = mon(&data, "Sproutle", 2);
        let fast = mon(&data, "Sproutle", 4);
        let mut battle = wild(&data, vec![slow], vec![fast]);
        let idle = InputState::default();

        // 5 simulated seconds: the speed-20 opponent crosses 100 exactly
        for _ in 0..20 {
            battle.update(0.25, &idle, &data);
        }
        // the opponent acted (gauge reset, damage dealt), the player did not
        assert_eq!(battle.opponent.monsters[0].initiative, 0.0);
        assert!(battle.player.monsters[0].initiative > 0.0);
        assert!(
            battle.player.monsters[0].health
                < battle.player.monsters[0].stat(Stat::MaxHealth)
        );
    }

    #[test]
    fn initiative_accrual_is_step_size_independent() {
        let data = GameData::builtin();
        let run = |dt: f32, steps: usize| {
            let mut battle = wild(
                &data,
                vec![mon(&data, "Sproutle", 2)],
                vec![mon(&data, "Sproutle", 4)],
            );
            let idle = InputState::default();
            for _ in 0..steps {
                battle.update(dt, &idle, &data);
            }
            (
                battle.player.monsters[0].health,
                battle.player.monsters[0].initiative,
            )
        };
        assert_eq!(run(0.25, 20), run(0.5, 10));
    }

    #[test]
    fn fight_resolution_damages_and_wins() {
        let data = GameData::builtin();
        let mut battle = wild(
            &data,
            vec![mon(&data, "Sproutle", 4)],
            vec![mon(&data, "Sproutle", 2)],
        );
        run_until_player_turn(&mut battle, &data);
        assert!(matches!(battle.menu, Some(Menu::General)));

        choose(&mut battle, &data, "fight");
        assert!(matches!(battle.menu, Some(Menu::Attacks { .. })));
        choose(&mut battle, &data, "scratch");
        assert!(matches!(battle.menu, Some(Menu::Target { .. })));
        choose(&mut battle, &data, "Sproutle");

        // attack 4*4=16, power 2.0, same element: 32 damage floors a
        // 30-health opponent
        assert!(battle.opponent.monsters[0].fainted());
        assert_eq!(battle.outcome, BattleOutcome::Won);
        // sole fielded monster takes the whole 200 xp payout
        assert_eq!(battle.player.monsters[0].xp, 200.0);
        // energy paid for the ability
        assert!(
            battle.player.monsters[0].energy
                < battle.player.monsters[0].stat(Stat::MaxEnergy)
        );
    }

    #[test]
    fn defend_halves_damage_and_clears_next_turn() {
        let data = GameData::builtin();
        // speeds 15 vs 10: the player defends on its first turn, the
        // opponent strikes before the player's second turn comes up
        let mut battle = wild(
            &data,
            vec![mon(&data, "Sproutle", 3)],
            vec![mon(&data, "Sproutle", 2)],
        );
        run_until_player_turn(&mut battle, &data);
        choose(&mut battle, &data, "defend");
        assert!(battle.player.monsters[0].defending);

        let max = battle.player.monsters[0].stat(Stat::MaxHealth);
        let idle = InputState::default();
        // let the opponent reach its turn
        for _ in 0..10_000 {
            if battle.player.monsters[0].health < max {
                break;
            }
            battle.update(0.05, &idle, &data);
        }
        // scratch: 4*2=8 attack x 2.0 power = 16, halved to 8 by defending
        assert_eq!(battle.player.monsters[0].health, max - 8.0);

        // defending clears when the actor's next turn starts
        run_until_player_turn(&mut battle, &data);
        assert!(!battle.player.monsters[0].defending);
    }

    #[test]
    fn catch_is_rejected_against_trainers() {
        let data = GameData::builtin();
        let mut battle = Battle::new(
            &cfg(),
            vec![mon(&data, "Sproutle", 4)],
            vec![mon(&data, "Embercub", 3)],
            Some(2),
            "forest".to_string(),
            7,
        );
        assert!(!battle.general_entries().contains(&"catch"));
        assert!(!battle.try_catch(&data, 0));
        assert_eq!(battle.outcome, BattleOutcome::Ongoing);
    }

    #[test]
    fn catch_succeeds_on_weakened_wild_monster() {
        let data = GameData::builtin();
        let mut battle = wild(
            &data,
            vec![mon(&data, "Sproutle", 4)],
            vec![mon(&data, "Embercub", 3)],
        );
        battle.opponent.monsters[0].health = 0.01;
        assert!(battle.try_catch(&data, 0));
        assert_eq!(battle.caught.len(), 1);
        assert_eq!(battle.caught[0].species, "Embercub");
        assert_eq!(battle.outcome, BattleOutcome::Caught);
    }

    #[test]
    fn catch_respects_roster_capacity() {
        let data = GameData::builtin();
        let party: Vec<Monster> = (0..cfg().party_capacity)
            .map(|_| mon(&data, "Sproutle", 4))
            .collect();
        let mut battle = wild(&data, party, vec![mon(&data, "Embercub", 3)]);
        battle.opponent.monsters[0].health = 0.01;
        assert!(!battle.try_catch(&data, 0));
        assert!(battle.caught.is_empty());
    }

    #[test]
    fn flee_ends_wild_battle() {
        let data = GameData::builtin();
        let mut battle = wild(
            &data,
            vec![mon(&data, "Sproutle", 8)],
            vec![mon(&data, "Sproutle", 2)],
        );
        run_until_player_turn(&mut battle, &data);
        choose(&mut battle, &data, "flee");
        assert_eq!(battle.outcome, BattleOutcome::Fled);
    }

    #[test]
    fn switch_swaps_fielded_slot_and_consumes_turn() {
        let data = GameData::builtin();
        let mut narrow = cfg();
        narrow.fielded_per_side = 1;
        let mut battle = Battle::new(
            &narrow,
            vec![mon(&data, "Sproutle", 8), mon(&data, "Embercub", 8)],
            vec![mon(&data, "Sproutle", 2)],
            None,
            "forest".to_string(),
            3,
        );
        run_until_player_turn(&mut battle, &data);
        choose(&mut battle, &data, "switch");
        assert!(matches!(battle.menu, Some(Menu::Switch { .. })));
        choose(&mut battle, &data, "Embercub");
        assert_eq!(battle.player.fielded, vec![1]);
        // turn consumed
        assert!(battle.current.is_none());
    }

    #[test]
    fn switch_with_empty_bench_is_a_no_op() {
        let data = GameData::builtin();
        let mut battle = wild(
            &data,
            vec![mon(&data, "Sproutle", 8)],
            vec![mon(&data, "Sproutle", 2)],
        );
        run_until_player_turn(&mut battle, &data);
        choose(&mut battle, &data, "switch");
        // still the player's turn, still on the root menu
        assert!(matches!(battle.menu, Some(Menu::General)));
        assert!(battle.current.is_some());
    }

    #[test]
    fn xp_splits_across_fielded_monsters() {
        let data = GameData::builtin();
        let mut battle = wild(
            &data,
            vec![mon(&data, "Sproutle", 4), mon(&data, "Embercub", 4)],
            vec![mon(&data, "Sproutle", 2)],
        );
        run_until_player_turn(&mut battle, &data);
        choose(&mut battle, &data, "fight");
        choose(&mut battle, &data, "scratch");
        choose(&mut battle, &data, "Sproutle");
        assert_eq!(battle.outcome, BattleOutcome::Won);
        // 2 * 100 split across two fielded monsters
        assert_eq!(battle.player.monsters[0].xp, 100.0);
        assert_eq!(battle.player.monsters[1].xp, 100.0);
    }
}
