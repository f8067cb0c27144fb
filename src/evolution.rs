//! Blocking evolution animation sequence.
//!
//! Three beats: a short hold on the old form, a white flash ramping to full,
//! then the new form until the end timer runs out. The roster swap itself
//! happens before the overlay is spawned; this type only paces the reveal.

use crate::config::GameConfig;
use crate::timer::Timer;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvolutionPhase {
    /// Old form shown, flash not started.
    Start,
    /// Old form washing out under the rising flash.
    Flashing,
    /// New form revealed.
    Revealed,
}

pub struct Evolution {
    pub from_species: String,
    pub to_species: String,
    start_timer: Timer,
    end_timer: Timer,
    pub tint_amount: f32,
    tint_speed: f32,
}

impl Evolution {
    pub fn new(from_species: String, to_species: String, cfg: &GameConfig) -> Self {
        Self {
            from_species,
            to_species,
            start_timer: Timer::new(cfg.evolution_start_ms, false, true),
            end_timer: Timer::new(cfg.evolution_end_ms, false, false),
            tint_amount: 0.0,
            tint_speed: cfg.evolution_tint_speed,
        }
    }

    pub fn phase(&self) -> EvolutionPhase {
        if self.start_timer.active() {
            EvolutionPhase::Start
        } else if self.tint_amount < 255.0 {
            EvolutionPhase::Flashing
        } else {
            EvolutionPhase::Revealed
        }
    }

    /// Returns true on the tick the sequence completes.
    pub fn update(&mut self, dt: f32) -> bool {
        self.start_timer.update(dt);
        if self.start_timer.active() {
            return false;
        }
        if self.tint_amount < 255.0 {
            self.tint_amount = (self.tint_amount + self.tint_speed * dt).min(255.0);
            if self.tint_amount >= 255.0 {
                self.end_timer.activate();
            }
            return false;
        }
        self.end_timer.update(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_through_all_phases_and_finishes_once() {
        let cfg = GameConfig::default();
        let mut evo = Evolution::new("Sproutle".to_string(), "Verdyl".to_string(), &cfg);
        assert_eq!(evo.phase(), EvolutionPhase::Start);

        // start delay
        assert!(!evo.update(0.8));
        assert_eq!(evo.phase(), EvolutionPhase::Flashing);

        // flash ramps at 80/s: just over 3.2s to saturate
        let mut finished = false;
        let mut ticks = 0;
        while !finished && ticks < 10_000 {
            finished = evo.update(0.05);
            ticks += 1;
        }
        assert!(finished);
        assert_eq!(evo.phase(), EvolutionPhase::Revealed);
        assert_eq!(evo.tint_amount, 255.0);
        // a finished sequence does not fire again
        assert!(!evo.update(5.0));
    }
}
