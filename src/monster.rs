//! Monster stat, leveling, and ability model.

use serde::{Deserialize, Serialize};

use crate::game_data::{DataError, Element, GameData};

/// XP needed to reach the next level is `level * LEVEL_UP_FACTOR`.
const LEVEL_UP_FACTOR: f32 = 150.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stat {
    MaxHealth,
    MaxEnergy,
    Attack,
    Defense,
    Speed,
    Recovery,
}

/// Roster entry as it appears in a save file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonsterRecord {
    pub species: String,
    pub level: u32,
    pub health: f32,
    pub energy: f32,
    pub xp: f32,
}

/// One creature instance. Species tables are copied in at construction so
/// later stat math needs no data access; construction fails on an unknown
/// species key.
#[derive(Clone, Debug)]
pub struct Monster {
    pub species: String,
    pub level: u32,
    pub element: Element,
    base: crate::game_data::BaseStats,
    abilities: Vec<(u32, String)>,
    pub evolution: Option<(String, u32)>,

    pub health: f32,
    pub energy: f32,
    pub initiative: f32,
    pub paused: bool,
    pub defending: bool,

    pub xp: f32,
    pub level_up: f32,
}

impl Monster {
    pub fn new(data: &GameData, species: &str, level: u32) -> Result<Self, DataError> {
        let level = level.max(1);
        let species_data = data.species(species)?;
        let base = species_data.stats;
        Ok(Self {
            species: species.to_string(),
            level,
            element: base.element,
            base,
            abilities: species_data.abilities.clone(),
            evolution: species_data.evolve.clone(),
            health: base.max_health * level as f32,
            energy: base.max_energy * level as f32,
            initiative: 0.0,
            paused: false,
            defending: false,
            xp: 0.0,
            level_up: level as f32 * LEVEL_UP_FACTOR,
        })
    }

    /// Rebuilds a monster from a save record, clamping restored health and
    /// energy to the bounds of the recorded level.
    pub fn from_record(data: &GameData, record: &MonsterRecord) -> Result<Self, DataError> {
        let mut monster = Self::new(data, &record.species, record.level)?;
        monster.health = record.health;
        monster.energy = record.energy;
        monster.xp = record.xp;
        monster.stat_limiter();
        Ok(monster)
    }

    pub fn to_record(&self) -> MonsterRecord {
        MonsterRecord {
            species: self.species.clone(),
            level: self.level,
            health: self.health,
            energy: self.energy,
            xp: self.xp,
        }
    }

    /// Stats scale linearly with level.
    pub fn stat(&self, stat: Stat) -> f32 {
        let base = match stat {
            Stat::MaxHealth => self.base.max_health,
            Stat::MaxEnergy => self.base.max_energy,
            Stat::Attack => self.base.attack,
            Stat::Defense => self.base.defense,
            Stat::Speed => self.base.speed,
            Stat::Recovery => self.base.recovery,
        };
        base * self.level as f32
    }

    /// Ability ids unlocked at the current level, in unlock order. With
    /// `affordable_only`, abilities costing more energy than the monster has
    /// are dropped.
    pub fn abilities<'a>(&'a self, data: &GameData, affordable_only: bool) -> Vec<&'a str> {
        self.abilities
            .iter()
            .filter(|(unlock, _)| self.level >= *unlock)
            .filter(|(_, ability)| {
                if !affordable_only {
                    return true;
                }
                data.ability(ability)
                    .map(|a| self.energy >= a.cost)
                    .unwrap_or(false)
            })
            .map(|(_, ability)| ability.as_str())
            .collect()
    }

    pub fn base_damage(&self, data: &GameData, ability: &str) -> f32 {
        data.ability(ability)
            .map(|a| self.stat(Stat::Attack) * a.power)
            .unwrap_or(0.0)
    }

    pub fn reduce_energy(&mut self, data: &GameData, ability: &str) {
        if let Ok(a) = data.ability(ability) {
            self.energy -= a.cost;
        }
    }

    /// Accumulates XP; a grant that reaches the threshold advances exactly
    /// one level and carries the remainder, even if the remainder alone
    /// would clear the next threshold too.
    pub fn update_xp(&mut self, amount: f32) {
        if self.level_up - self.xp > amount {
            self.xp += amount;
        } else {
            self.level += 1;
            self.xp = amount - (self.level_up - self.xp);
            self.level_up = self.level as f32 * LEVEL_UP_FACTOR;
        }
    }

    pub fn stat_limiter(&mut self) {
        self.health = self.health.clamp(0.0, self.stat(Stat::MaxHealth));
        self.energy = self.energy.clamp(0.0, self.stat(Stat::MaxEnergy));
    }

    pub fn heal_full(&mut self) {
        self.health = self.stat(Stat::MaxHealth);
        self.energy = self.stat(Stat::MaxEnergy);
    }

    pub fn fainted(&self) -> bool {
        self.health <= 0.0
    }

    pub fn update(&mut self, dt: f32) {
        self.stat_limiter();
        if !self.paused {
            self.initiative += self.stat(Stat::Speed) * dt;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monster(species: &str, level: u32) -> Monster {
        Monster::new(&GameData::builtin(), species, level).unwrap()
    }

    #[test]
    fn stats_scale_linearly_with_level() {
        let data = GameData::builtin();
        for level in [1, 5, 40] {
            let m = monster("Embercub", level);
            let base = data.species("Embercub").unwrap().stats;
            assert_eq!(m.stat(Stat::Attack), base.attack * level as f32);
            assert_eq!(m.stat(Stat::MaxHealth), base.max_health * level as f32);
            assert_eq!(m.stat(Stat::Speed), base.speed * level as f32);
        }
    }

    #[test]
    fn unknown_species_fails_fast() {
        let data = GameData::builtin();
        assert!(Monster::new(&data, "Glitchling", 5).is_err());
    }

    #[test]
    fn xp_grant_below_threshold_accumulates() {
        let mut m = monster("Sproutle", 5);
        m.update_xp(700.0);
        assert_eq!(m.level, 5);
        assert_eq!(m.xp, 700.0);
        assert_eq!(m.level_up, 750.0);
    }

    #[test]
    fn xp_grant_past_threshold_advances_one_level() {
        let mut m = monster("Sproutle", 5);
        m.update_xp(900.0);
        assert_eq!(m.level, 6);
        assert_eq!(m.xp, 150.0);
        assert_eq!(m.level_up, 900.0);
    }

    #[test]
    fn oversized_grant_still_advances_only_one_level() {
        // 5 -> threshold 750; 2000 xp would clear level 6's 900 threshold
        // too, but only one level is taken per grant.
        let mut m = monster("Sproutle", 5);
        m.update_xp(2000.0);
        assert_eq!(m.level, 6);
        assert_eq!(m.xp, 1250.0);
    }

    #[test]
    fn health_and_energy_stay_in_bounds() {
        let mut m = monster("Dribblet", 10);
        m.health -= 10_000.0;
        m.energy += 10_000.0;
        m.stat_limiter();
        assert_eq!(m.health, 0.0);
        assert_eq!(m.energy, m.stat(Stat::MaxEnergy));
        m.health += 99_999.0;
        m.stat_limiter();
        assert_eq!(m.health, m.stat(Stat::MaxHealth));
    }

    #[test]
    fn initiative_accrues_unless_paused() {
        let mut m = monster("Pyrelynx", 10);
        m.update(0.5);
        assert_eq!(m.initiative, m.stat(Stat::Speed) * 0.5);
        m.paused = true;
        let before = m.initiative;
        m.update(1.0);
        assert_eq!(m.initiative, before);
    }

    #[test]
    fn affordable_filter_respects_energy() {
        let data = GameData::builtin();
        let mut m = monster("Verdyl", 25);
        let all = m.abilities(&data, false);
        assert!(all.contains(&"mend"));
        m.energy = 5.0;
        let affordable = m.abilities(&data, true);
        assert!(affordable.is_empty());
    }

    #[test]
    fn record_round_trip_clamps() {
        let data = GameData::builtin();
        let record = MonsterRecord {
            species: "Tidefin".to_string(),
            level: 16,
            health: 9_999.0,
            energy: -5.0,
            xp: 120.0,
        };
        let m = Monster::from_record(&data, &record).unwrap();
        assert_eq!(m.health, m.stat(Stat::MaxHealth));
        assert_eq!(m.energy, 0.0);
        assert_eq!(m.xp, 120.0);
    }
}
