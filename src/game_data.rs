//! Static game data: species, abilities, and character definitions.
//!
//! Tables can be loaded from RON files or taken from the built-in set.
//! Integrity is checked once at load time; after `validate` passes, lookups
//! by key are expected to succeed and a miss is a hard error.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entities::Facing;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("unknown species `{0}`")]
    UnknownSpecies(String),
    #[error("unknown ability `{0}`")]
    UnknownAbility(String),
    #[error("unknown character `{0}`")]
    UnknownCharacter(String),
    #[error("failed to read `{path}`: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse `{path}`: {source}")]
    Parse {
        path: String,
        source: ron::error::SpannedError,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Element {
    Plant,
    Fire,
    Water,
    Normal,
}

impl Element {
    /// Damage multiplier of an attack of this element against a defender of
    /// `other`: 2.0 with the advantage, 0.5 against it, 1.0 otherwise.
    pub fn multiplier_against(self, other: Element) -> f32 {
        use Element::*;
        match (self, other) {
            (Fire, Plant) | (Plant, Water) | (Water, Fire) => 2.0,
            (Plant, Fire) | (Water, Plant) | (Fire, Water) => 0.5,
            _ => 1.0,
        }
    }
}

/// Per-level stat multipliers; the effective stat is `base * level`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct BaseStats {
    pub element: Element,
    pub max_health: f32,
    pub max_energy: f32,
    pub attack: f32,
    pub defense: f32,
    pub speed: f32,
    pub recovery: f32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpeciesData {
    pub stats: BaseStats,
    /// Unlock level -> ability id, kept sorted by unlock level so ability
    /// listings have a stable order.
    pub abilities: Vec<(u32, String)>,
    pub evolve: Option<(String, u32)>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbilityTarget {
    Opponent,
    Own,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AbilityData {
    pub target: AbilityTarget,
    pub power: f32,
    pub cost: f32,
    pub element: Element,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CharacterData {
    pub dialog_default: Vec<String>,
    pub dialog_defeated: Vec<String>,
    /// Trainer roster as (species, level); empty for non-trainers.
    pub monsters: Vec<(String, u32)>,
    /// Directions this character may face while idling.
    pub directions: Vec<Facing>,
    /// Roaming-lookout flag: scans for the player and forces an encounter.
    pub look_around: bool,
    pub defeated: bool,
    pub nurse: bool,
    pub biome: String,
}

pub struct GameData {
    species: HashMap<String, SpeciesData>,
    abilities: HashMap<String, AbilityData>,
    characters: HashMap<String, CharacterData>,
}

/// Load and deserialize a RON file into the specified type.
pub fn load_ron<T: DeserializeOwned>(path: &Path) -> Result<T, DataError> {
    let contents = fs::read_to_string(path).map_err(|source| DataError::Io {
        path: path.display().to_string(),
        source,
    })?;
    ron::from_str(&contents).map_err(|source| DataError::Parse {
        path: path.display().to_string(),
        source,
    })
}

impl GameData {
    pub fn from_dir(dir: &Path) -> Result<Self, DataError> {
        let species = load_ron(&dir.join("species.ron"))?;
        let abilities = load_ron(&dir.join("abilities.ron"))?;
        let characters = load_ron(&dir.join("characters.ron"))?;
        let data = Self {
            species,
            abilities,
            characters,
        };
        data.validate()?;
        Ok(data)
    }

    pub fn species(&self, name: &str) -> Result<&SpeciesData, DataError> {
        self.species
            .get(name)
            .ok_or_else(|| DataError::UnknownSpecies(name.to_string()))
    }

    pub fn ability(&self, name: &str) -> Result<&AbilityData, DataError> {
        self.abilities
            .get(name)
            .ok_or_else(|| DataError::UnknownAbility(name.to_string()))
    }

    pub fn character(&self, name: &str) -> Result<&CharacterData, DataError> {
        self.characters
            .get(name)
            .ok_or_else(|| DataError::UnknownCharacter(name.to_string()))
    }

    pub fn has_character(&self, name: &str) -> bool {
        self.characters.contains_key(name)
    }

    /// Cross-checks every reference between tables. Called once at load;
    /// construction of monsters and battles assumes it has passed.
    pub fn validate(&self) -> Result<(), DataError> {
        for species in self.species.values() {
            for (_, ability) in &species.abilities {
                self.ability(ability)?;
            }
            if let Some((target, _)) = &species.evolve {
                self.species(target)?;
            }
        }
        for character in self.characters.values() {
            for (species, _) in &character.monsters {
                self.species(species)?;
            }
        }
        Ok(())
    }

    /// The default data set: three element lines with evolutions plus a few
    /// standalone species, and the characters of the demo maps.
    pub fn builtin() -> Self {
        let mut species = HashMap::new();
        let mut abilities = HashMap::new();
        let mut characters = HashMap::new();

        let mut add_species = |name: &str,
                               element: Element,
                               stats: [f32; 6],
                               learned: &[(u32, &str)],
                               evolve: Option<(&str, u32)>| {
            let [max_health, max_energy, attack, defense, speed, recovery] = stats;
            let mut unlocks: Vec<(u32, String)> = learned
                .iter()
                .map(|(lvl, ability)| (*lvl, ability.to_string()))
                .collect();
            unlocks.sort_by_key(|(lvl, _)| *lvl);
            species.insert(
                name.to_string(),
                SpeciesData {
                    stats: BaseStats {
                        element,
                        max_health,
                        max_energy,
                        attack,
                        defense,
                        speed,
                        recovery,
                    },
                    abilities: unlocks,
                    evolve: evolve.map(|(target, lvl)| (target.to_string(), lvl)),
                },
            );
        };

        // plant line
        add_species(
            "Sproutle",
            Element::Plant,
            [15.0, 12.0, 4.0, 8.0, 5.0, 4.0],
            &[(0, "scratch"), (5, "vinewhip")],
            Some(("Verdyl", 18)),
        );
        add_species(
            "Verdyl",
            Element::Plant,
            [18.0, 14.0, 5.0, 10.0, 6.0, 5.0],
            &[(0, "scratch"), (5, "vinewhip"), (20, "mend")],
            Some(("Thornmaw", 32)),
        );
        add_species(
            "Thornmaw",
            Element::Plant,
            [22.0, 17.0, 7.0, 12.0, 6.0, 6.0],
            &[(0, "scratch"), (5, "vinewhip"), (20, "mend"), (30, "sporeburst")],
            None,
        );

        // fire line
        add_species(
            "Embercub",
            Element::Fire,
            [13.0, 14.0, 6.0, 5.0, 7.0, 4.0],
            &[(0, "scratch"), (5, "ember")],
            Some(("Pyrelynx", 17)),
        );
        add_species(
            "Pyrelynx",
            Element::Fire,
            [16.0, 16.0, 8.0, 6.0, 9.0, 5.0],
            &[(0, "scratch"), (5, "ember"), (18, "quickstrike")],
            Some(("Ashkarn", 33)),
        );
        add_species(
            "Ashkarn",
            Element::Fire,
            [20.0, 19.0, 10.0, 8.0, 10.0, 6.0],
            &[(0, "scratch"), (5, "ember"), (18, "quickstrike"), (30, "flamewheel")],
            None,
        );

        // water line
        add_species(
            "Dribblet",
            Element::Water,
            [14.0, 13.0, 5.0, 6.0, 6.0, 5.0],
            &[(0, "scratch"), (5, "splash")],
            Some(("Tidefin", 16)),
        );
        add_species(
            "Tidefin",
            Element::Water,
            [17.0, 15.0, 6.0, 8.0, 8.0, 6.0],
            &[(0, "scratch"), (5, "splash"), (15, "mend")],
            Some(("Wavarok", 34)),
        );
        add_species(
            "Wavarok",
            Element::Water,
            [21.0, 18.0, 8.0, 11.0, 8.0, 7.0],
            &[(0, "scratch"), (5, "splash"), (15, "mend"), (30, "riptide")],
            None,
        );

        // standalones
        add_species(
            "Gravelle",
            Element::Normal,
            [19.0, 10.0, 6.0, 12.0, 3.0, 3.0],
            &[(0, "scratch"), (10, "headbutt")],
            None,
        );
        add_species(
            "Moltwing",
            Element::Fire,
            [12.0, 15.0, 7.0, 4.0, 10.0, 5.0],
            &[(0, "quickstrike"), (8, "ember")],
            None,
        );
        add_species(
            "Fenroot",
            Element::Plant,
            [16.0, 12.0, 4.0, 9.0, 4.0, 6.0],
            &[(0, "scratch"), (7, "vinewhip"), (12, "mend")],
            None,
        );

        let mut add_ability =
            |name: &str, target: AbilityTarget, power: f32, cost: f32, element: Element| {
                abilities.insert(
                    name.to_string(),
                    AbilityData {
                        target,
                        power,
                        cost,
                        element,
                    },
                );
            };
        add_ability("scratch", AbilityTarget::Opponent, 2.0, 20.0, Element::Normal);
        add_ability("quickstrike", AbilityTarget::Opponent, 1.5, 10.0, Element::Normal);
        add_ability("headbutt", AbilityTarget::Opponent, 3.0, 35.0, Element::Normal);
        add_ability("ember", AbilityTarget::Opponent, 2.5, 25.0, Element::Fire);
        add_ability("flamewheel", AbilityTarget::Opponent, 4.0, 50.0, Element::Fire);
        add_ability("vinewhip", AbilityTarget::Opponent, 2.5, 25.0, Element::Plant);
        add_ability("sporeburst", AbilityTarget::Opponent, 4.0, 50.0, Element::Plant);
        add_ability("splash", AbilityTarget::Opponent, 2.5, 25.0, Element::Water);
        add_ability("riptide", AbilityTarget::Opponent, 4.0, 50.0, Element::Water);
        add_ability("mend", AbilityTarget::Own, 1.2, 40.0, Element::Normal);

        characters.insert(
            "nurse".to_string(),
            CharacterData {
                dialog_default: vec![
                    "Welcome to the shelter.".to_string(),
                    "Let me patch your monsters up.".to_string(),
                    "There, good as new. Take care!".to_string(),
                ],
                dialog_defeated: vec![],
                monsters: vec![],
                directions: vec![Facing::Down],
                look_around: false,
                defeated: false,
                nurse: true,
                biome: "shelter".to_string(),
            },
        );
        characters.insert(
            "ranger_elm".to_string(),
            CharacterData {
                dialog_default: vec![
                    "Hey! You walked right into my patrol.".to_string(),
                    "Let's see what your monsters are made of!".to_string(),
                ],
                dialog_defeated: vec!["Well fought. The trail is yours.".to_string()],
                monsters: vec![("Sproutle".to_string(), 13), ("Embercub".to_string(), 12)],
                directions: vec![Facing::Left, Facing::Right, Facing::Down],
                look_around: true,
                defeated: false,
                nurse: false,
                biome: "forest".to_string(),
            },
        );
        characters.insert(
            "scout_mira".to_string(),
            CharacterData {
                dialog_default: vec![
                    "Nobody crosses the shallows for free.".to_string(),
                    "Show me a real battle!".to_string(),
                ],
                dialog_defeated: vec![
                    "You swim better than you look.".to_string(),
                    "Go on then.".to_string(),
                ],
                monsters: vec![
                    ("Dribblet".to_string(), 14),
                    ("Gravelle".to_string(), 15),
                    ("Tidefin".to_string(), 18),
                ],
                directions: vec![Facing::Down],
                look_around: true,
                defeated: false,
                nurse: false,
                biome: "shallows".to_string(),
            },
        );
        characters.insert(
            "elder_bran".to_string(),
            CharacterData {
                dialog_default: vec![
                    "Few come this far north.".to_string(),
                    "My old Thornmaw still has thorns.".to_string(),
                ],
                dialog_defeated: vec!["The forest remembers you now.".to_string()],
                monsters: vec![("Thornmaw".to_string(), 20)],
                directions: vec![Facing::Down, Facing::Left],
                look_around: false,
                defeated: false,
                nurse: false,
                biome: "forest".to_string(),
            },
        );

        let data = Self {
            species,
            abilities,
            characters,
        };
        debug_assert!(data.validate().is_ok());
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tables_are_consistent() {
        let data = GameData::builtin();
        assert!(data.validate().is_ok());
        assert!(data.species("Sproutle").is_ok());
        assert!(matches!(
            data.species("Missingno"),
            Err(DataError::UnknownSpecies(_))
        ));
    }

    #[test]
    fn element_triangle_is_antisymmetric() {
        use Element::*;
        for (a, b) in [(Fire, Plant), (Plant, Water), (Water, Fire)] {
            assert_eq!(a.multiplier_against(b), 2.0);
            assert_eq!(b.multiplier_against(a), 0.5);
        }
        assert_eq!(Normal.multiplier_against(Fire), 1.0);
        assert_eq!(Fire.multiplier_against(Fire), 1.0);
    }

    #[test]
    fn ability_unlocks_are_sorted() {
        let data = GameData::builtin();
        let thornmaw = data.species("Thornmaw").unwrap();
        let levels: Vec<u32> = thornmaw.abilities.iter().map(|(lvl, _)| *lvl).collect();
        let mut sorted = levels.clone();
        sorted.sort_unstable();
        assert_eq!(levels, sorted);
    }
}
