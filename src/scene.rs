//! Presentation-facing frame data: draw-order commands and audio cues.
//!
//! The core never renders or plays anything itself. Each frame it hands the
//! shell a sorted list of [`DrawCmd`]s and a drained queue of [`AudioCue`]s;
//! what the shell does with them is its own business.

use crate::geometry::Rect;

/// Overworld z-layers, back to front.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Layer {
    Water,
    Bg,
    Shadow,
    Main,
    Top,
}

/// What a draw command depicts; the shell maps this to a fill style.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawKind {
    Scenery,
    Water,
    Patch,
    Transition,
    Player { moving: bool },
    Character { graphic: String },
    NoticeIcon,
    DialogBox { speaker: String, line: String },
    IndexPanel { entries: Vec<String>, cursor: usize, selected: Option<usize> },
    /// Full-screen battle backdrop; `biome` picks the background art.
    BattleScene { biome: String },
    BattleMonster { species: String, player_side: bool, highlighted: bool, health_frac: f32 },
    BattleMenu { entries: Vec<String>, cursor: usize },
    EvolutionScene { species: String, flash: f32 },
    TintOverlay,
}

/// One renderable item. `is_ui` elements skip the camera offset;
/// `casts_shadow` marks entity sprites that get a ground shadow. Both are
/// capability flags set at construction, never inferred from the kind.
#[derive(Clone, Debug)]
pub struct DrawCmd {
    pub kind: DrawKind,
    pub rect: Rect,
    pub layer: Layer,
    /// Sort key within [`Layer::Main`]; entities sort by feet position.
    pub y_sort: f32,
    pub is_ui: bool,
    pub casts_shadow: bool,
    /// Opacity 0..=255, only meaningful for overlays.
    pub alpha: f32,
}

impl DrawCmd {
    pub fn world(kind: DrawKind, rect: Rect, layer: Layer) -> Self {
        let y_sort = rect.bottom();
        Self {
            kind,
            rect,
            layer,
            y_sort,
            is_ui: false,
            casts_shadow: false,
            alpha: 255.0,
        }
    }

    pub fn ui(kind: DrawKind, rect: Rect) -> Self {
        Self {
            kind,
            rect,
            layer: Layer::Top,
            y_sort: 0.0,
            is_ui: true,
            casts_shadow: false,
            alpha: 255.0,
        }
    }
}

/// Named audio events fired by the core.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudioCue {
    Notice,
    OverworldStart,
    OverworldStop,
    BattleStart,
    BattleStop,
    EvolutionStart,
    EvolutionStop,
}
