//! Game tuning values, fixed at construction and passed by reference.

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub window_width: u32,
    pub window_height: u32,
    pub tile_size: f32,
    pub animation_speed: f32,
    /// Overworld movement speed, px/s, shared by player and NPCs.
    pub entity_speed: f32,
    /// Interaction reach when the player initiates dialog, px.
    pub interact_radius: f32,
    pub dialog_debounce_ms: f32,
    pub look_around_ms: f32,
    pub notice_delay_ms: f32,
    /// Tint units per second for screen transitions (range 0..=255).
    pub tint_speed: f32,
    /// White-flash speed of the evolution sequence, units/s.
    pub evolution_tint_speed: f32,
    pub evolution_start_ms: f32,
    pub evolution_end_ms: f32,
    /// Initiative a monster must reach to act.
    pub initiative_threshold: f32,
    pub party_capacity: usize,
    /// Monsters simultaneously fielded per battle side.
    pub fielded_per_side: usize,
    /// Wild-encounter delay range, ms.
    pub encounter_delay_ms: (u32, u32),
    /// Wild monster level jitter around the patch base level.
    pub encounter_level_jitter: i32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            tile_size: 64.0,
            animation_speed: 6.0,
            entity_speed: 250.0,
            interact_radius: 100.0,
            dialog_debounce_ms: 500.0,
            look_around_ms: 1500.0,
            notice_delay_ms: 500.0,
            tint_speed: 600.0,
            evolution_tint_speed: 80.0,
            evolution_start_ms: 800.0,
            evolution_end_ms: 1800.0,
            initiative_threshold: 100.0,
            party_capacity: 6,
            fielded_per_side: 3,
            encounter_delay_ms: (800, 2500),
            encounter_level_jitter: 3,
        }
    }
}
