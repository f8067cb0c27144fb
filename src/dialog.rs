//! Sequential dialog playback with a per-line advance debounce.

use crate::config::GameConfig;
use crate::input::InputState;
use crate::timer::Timer;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DialogStatus {
    Open,
    Finished,
}

/// Plays an NPC's lines one at a time. The debounce timer swallows the key
/// press that opened the dialog and any mashing faster than it; the
/// orchestrator owns what happens when the sequence ends.
pub struct DialogTree {
    lines: Vec<String>,
    index: usize,
    /// Index of the character this dialog belongs to.
    pub character_index: usize,
    debounce: Timer,
}

impl DialogTree {
    pub fn new(lines: Vec<String>, character_index: usize, cfg: &GameConfig) -> Self {
        Self {
            lines,
            index: 0,
            character_index,
            debounce: Timer::new(cfg.dialog_debounce_ms, false, true),
        }
    }

    pub fn current_line(&self) -> &str {
        self.lines
            .get(self.index)
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn update(&mut self, dt: f32, input: &InputState) -> DialogStatus {
        self.debounce.update(dt);
        if input.pressed_interact && !self.debounce.active() {
            self.index += 1;
            if self.index >= self.lines.len() {
                return DialogStatus::Finished;
            }
            self.debounce.activate();
        }
        DialogStatus::Open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dialog(lines: &[&str]) -> DialogTree {
        let lines = lines.iter().map(|s| s.to_string()).collect();
        DialogTree::new(lines, 0, &GameConfig::default())
    }

    fn press() -> InputState {
        InputState {
            pressed_interact: true,
            ..Default::default()
        }
    }

    #[test]
    fn press_during_debounce_is_swallowed() {
        let mut tree = dialog(&["one", "two"]);
        // the press that opened the dialog arrives on the very next frame
        assert_eq!(tree.update(0.016, &press()), DialogStatus::Open);
        assert_eq!(tree.current_line(), "one");
    }

    #[test]
    fn advance_after_debounce_and_finish_once() {
        let mut tree = dialog(&["one", "two"]);
        tree.update(0.6, &InputState::default());
        assert_eq!(tree.update(0.016, &press()), DialogStatus::Open);
        assert_eq!(tree.current_line(), "two");
        // fresh debounce gates the new line too
        assert_eq!(tree.update(0.016, &press()), DialogStatus::Open);
        tree.update(0.6, &InputState::default());
        assert_eq!(tree.update(0.016, &press()), DialogStatus::Finished);
    }

    #[test]
    fn empty_sequence_finishes_on_first_advance() {
        let mut tree = dialog(&["only"]);
        tree.update(0.6, &InputState::default());
        assert_eq!(tree.update(0.016, &press()), DialogStatus::Finished);
    }
}
