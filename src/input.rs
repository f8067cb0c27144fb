//! Per-frame input snapshot fed to the core by the shell.

use crate::geometry::Vec2;

/// Held keys plus edge-triggered action keys. The shell sets `pressed_*`
/// flags when a key goes down and clears them after each tick via
/// [`InputState::clear_pressed`]; arrows and WASD both land in the same
/// held flags.
#[derive(Clone, Copy, Debug, Default)]
pub struct InputState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub pressed_up: bool,
    pub pressed_down: bool,
    pub pressed_left: bool,
    pub pressed_right: bool,
    pub pressed_interact: bool,
    pub pressed_index: bool,
}

impl InputState {
    /// Current movement direction, diagonal input normalized to unit length.
    pub fn direction(&self) -> Vec2 {
        let mut v = Vec2::ZERO;
        if self.up {
            v.y -= 1.0;
        }
        if self.down {
            v.y += 1.0;
        }
        if self.left {
            v.x -= 1.0;
        }
        if self.right {
            v.x += 1.0;
        }
        v.normalized()
    }

    pub fn clear_pressed(&mut self) {
        self.pressed_up = false;
        self.pressed_down = false;
        self.pressed_left = false;
        self.pressed_right = false;
        self.pressed_interact = false;
        self.pressed_index = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagonal_input_is_unit_length() {
        let input = InputState {
            right: true,
            down: true,
            ..Default::default()
        };
        let dir = input.direction();
        assert!((dir.length() - 1.0).abs() < 1e-6);
        assert!(dir.x > 0.0 && dir.y > 0.0);
    }

    #[test]
    fn opposing_keys_cancel() {
        let input = InputState {
            left: true,
            right: true,
            ..Default::default()
        };
        assert_eq!(input.direction(), Vec2::ZERO);
    }
}
