//! Monster index overlay: browse the roster and reorder slots.

use crate::input::InputState;
use crate::monster::Monster;

/// Raised when the user confirms a reorder.
#[derive(Debug, PartialEq, Eq)]
pub enum IndexEvent {
    Swap(usize, usize),
}

#[derive(Default)]
pub struct MonsterIndex {
    pub cursor: usize,
    /// Slot picked up for a swap; confirming a second slot emits the swap.
    pub selected: Option<usize>,
}

impl MonsterIndex {
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.selected = None;
    }

    pub fn update(&mut self, input: &InputState, roster_len: usize) -> Option<IndexEvent> {
        if roster_len == 0 {
            return None;
        }
        if input.pressed_up && self.cursor > 0 {
            self.cursor -= 1;
        }
        if input.pressed_down && self.cursor + 1 < roster_len {
            self.cursor += 1;
        }
        if !input.pressed_interact {
            return None;
        }
        match self.selected.take() {
            None => {
                self.selected = Some(self.cursor);
                None
            }
            Some(first) if first == self.cursor => None,
            Some(first) => Some(IndexEvent::Swap(first, self.cursor)),
        }
    }

    /// Display lines for the shell.
    pub fn entries(&self, roster: &[Monster]) -> Vec<String> {
        roster
            .iter()
            .map(|m| format!("{} lv.{}", m.species, m.level))
            .collect()
    }
}
