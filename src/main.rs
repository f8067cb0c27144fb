//! Minimal presentation shell: a window, a fixed 60 Hz tick, flat-quad
//! rendering of the core's draw-order data, and audio cues sent to the log.

use std::{
    error::Error,
    num::NonZeroU32,
    path::PathBuf,
    rc::Rc,
    time::{Duration, Instant},
};

use log::info;
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, Event, KeyEvent, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::WindowBuilder,
};

use monrust::game::Game;
use monrust::game_data::GameData;
use monrust::geometry::{Rect, Vec2};
use monrust::map_data::builtin_maps;
use monrust::scene::{DrawCmd, DrawKind};
use monrust::{GameConfig, InputState, SaveSystem};

const TICK_SECONDS: f32 = 1.0 / 60.0;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let cfg = GameConfig::default();
    let width = cfg.window_width;
    let height = cfg.window_height;

    let event_loop = EventLoop::new()?;
    let window = Rc::new(
        WindowBuilder::new()
            .with_title("monrust")
            .with_inner_size(PhysicalSize::new(width, height))
            .with_resizable(false)
            .build(&event_loop)?,
    );
    let context = softbuffer::Context::new(window.clone())?;
    let mut surface = softbuffer::Surface::new(&context, window.clone())?;
    surface.resize(
        NonZeroU32::new(width.max(1)).unwrap(),
        NonZeroU32::new(height.max(1)).unwrap(),
    )?;

    let save_system = SaveSystem::new(PathBuf::from("saves"));
    let mut game = Game::new(cfg.clone(), GameData::builtin(), builtin_maps())?;
    if let Some(state) = save_system.load() {
        match game.apply_snapshot(&state) {
            Ok(()) => info!("continuing from save"),
            Err(err) => eprintln!("ignoring save: {err}"),
        }
    }

    let mut input = InputState::default();
    let tick = Duration::from_secs_f64(TICK_SECONDS as f64);
    let mut next_tick = Instant::now();
    let mut frame = vec![0u32; (width * height) as usize];

    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { event, .. } => match event {
            WindowEvent::CloseRequested => {
                if let Err(err) = save_system.save(&game.snapshot()) {
                    eprintln!("save on exit failed: {err}");
                }
                elwt.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state,
                        repeat,
                        ..
                    },
                ..
            } => {
                let pressed = state == ElementState::Pressed;
                let fresh = pressed && !repeat;
                match &logical_key {
                    Key::Named(NamedKey::Escape) if fresh => {
                        if let Err(err) = save_system.save(&game.snapshot()) {
                            eprintln!("save on exit failed: {err}");
                        }
                        elwt.exit();
                    }
                    Key::Named(NamedKey::F5) if fresh => {
                        if let Err(err) = save_system.save(&game.snapshot()) {
                            eprintln!("save failed: {err}");
                        }
                    }
                    Key::Named(NamedKey::F9) if fresh => match save_system.load() {
                        Some(state) => {
                            if let Err(err) = game.apply_snapshot(&state) {
                                eprintln!("load failed: {err}");
                            }
                        }
                        None => eprintln!("no save available"),
                    },
                    Key::Named(NamedKey::Space) => {
                        if fresh {
                            input.pressed_interact = true;
                        }
                    }
                    Key::Named(NamedKey::Enter) => {
                        if fresh {
                            input.pressed_index = true;
                        }
                    }
                    Key::Named(NamedKey::ArrowUp) => {
                        input.up = pressed;
                        input.pressed_up |= fresh;
                    }
                    Key::Named(NamedKey::ArrowDown) => {
                        input.down = pressed;
                        input.pressed_down |= fresh;
                    }
                    Key::Named(NamedKey::ArrowLeft) => {
                        input.left = pressed;
                        input.pressed_left |= fresh;
                    }
                    Key::Named(NamedKey::ArrowRight) => {
                        input.right = pressed;
                        input.pressed_right |= fresh;
                    }
                    Key::Character(s) => match s.to_lowercase().as_str() {
                        "w" => {
                            input.up = pressed;
                            input.pressed_up |= fresh;
                        }
                        "s" => {
                            input.down = pressed;
                            input.pressed_down |= fresh;
                        }
                        "a" => {
                            input.left = pressed;
                            input.pressed_left |= fresh;
                        }
                        "d" => {
                            input.right = pressed;
                            input.pressed_right |= fresh;
                        }
                        _ => {}
                    },
                    _ => {}
                }
            }
            WindowEvent::RedrawRequested => {
                render_frame(&game, width, height, &mut frame);
                if let Ok(mut buffer) = surface.buffer_mut() {
                    let len = buffer.len().min(frame.len());
                    buffer[..len].copy_from_slice(&frame[..len]);
                    let _ = buffer.present();
                }
            }
            _ => {}
        },
        Event::AboutToWait => {
            let now = Instant::now();
            while now >= next_tick {
                game.update(TICK_SECONDS, &input);
                for cue in game.take_audio_cues() {
                    info!("audio cue: {cue:?}");
                }
                input.clear_pressed();
                next_tick += tick;
            }
            window.request_redraw();
            elwt.set_control_flow(ControlFlow::WaitUntil(next_tick));
        }
        _ => {}
    })?;
    Ok(())
}

fn render_frame(game: &Game, width: u32, height: u32, frame: &mut [u32]) {
    frame.fill(0xFF10_1014);
    let player_center = game.world.player.rect.center();
    let camera = Vec2::new(
        player_center.x - width as f32 / 2.0,
        player_center.y - height as f32 / 2.0,
    );

    for cmd in game.draw_commands() {
        let offset = if cmd.is_ui { Vec2::ZERO } else { camera };
        let rect = Rect::new(
            cmd.rect.x - offset.x,
            cmd.rect.y - offset.y,
            cmd.rect.w,
            cmd.rect.h,
        );
        if cmd.casts_shadow {
            let shadow = Rect::new(
                rect.x + rect.w * 0.25,
                rect.bottom() - 10.0,
                rect.w * 0.5,
                12.0,
            );
            fill_rect(frame, width, height, &shadow, 0x0008_0808, 120.0);
        }
        draw_command(frame, width, height, &cmd, &rect);
    }
}

fn draw_command(frame: &mut [u32], width: u32, height: u32, cmd: &DrawCmd, rect: &Rect) {
    match &cmd.kind {
        DrawKind::Scenery => fill_rect(frame, width, height, rect, 0x003b_5e2b, 255.0),
        DrawKind::Water => fill_rect(frame, width, height, rect, 0x0050_b0d8, 255.0),
        DrawKind::Patch => fill_rect(frame, width, height, rect, 0x002e_7d32, 255.0),
        DrawKind::Transition => {}
        DrawKind::Player { moving } => {
            let color = if *moving { 0x00f0_3131 } else { 0x00c0_2020 };
            fill_rect(frame, width, height, rect, color, 255.0);
        }
        DrawKind::Character { .. } => fill_rect(frame, width, height, rect, 0x00f8_a060, 255.0),
        DrawKind::NoticeIcon => fill_rect(frame, width, height, rect, 0x00ff_d700, 255.0),
        DrawKind::DialogBox { .. } => {
            fill_rect(frame, width, height, rect, 0x002b_292c, 230.0);
            let strip = Rect::new(rect.x + 16.0, rect.y + 16.0, rect.w - 32.0, 24.0);
            fill_rect(frame, width, height, &strip, 0x00f4_fefa, 255.0);
        }
        DrawKind::IndexPanel { entries, cursor, selected } => {
            fill_rect(frame, width, height, rect, 0x003a_373b, 240.0);
            for row in 0..entries.len() {
                let color = if Some(row) == *selected {
                    0x00ff_d700
                } else if row == *cursor {
                    0x00f4_fefa
                } else {
                    0x004b_484d
                };
                let line = Rect::new(
                    rect.x + 12.0,
                    rect.y + 12.0 + row as f32 * 36.0,
                    rect.w - 24.0,
                    28.0,
                );
                fill_rect(frame, width, height, &line, color, 255.0);
            }
        }
        DrawKind::BattleScene { biome } => {
            let backdrop = match biome.as_str() {
                "shallows" => 0x0016_2a3a,
                "forest" => 0x0014_2a18,
                _ => 0x001c_1c24,
            };
            fill_rect(frame, width, height, rect, backdrop, 255.0);
        }
        DrawKind::BattleMonster {
            player_side,
            highlighted,
            health_frac,
            ..
        } => {
            let base = if *player_side { 0x0066_d7ee } else { 0x00f0_3131 };
            fill_rect(frame, width, height, rect, base, 255.0);
            if *highlighted {
                let ring = rect.inflate(10.0, 10.0);
                fill_rect(frame, width, height, &Rect::new(ring.x, ring.y, ring.w, 4.0), 0x00ff_ffff, 255.0);
            }
            let bar = Rect::new(rect.x, rect.bottom() + 6.0, rect.w * health_frac.clamp(0.0, 1.0), 8.0);
            fill_rect(frame, width, height, &bar, 0x0030_d060, 255.0);
        }
        DrawKind::BattleMenu { entries, cursor } => {
            fill_rect(frame, width, height, rect, 0x002b_292c, 240.0);
            for row in 0..entries.len() {
                let color = if row == *cursor { 0x00f4_fefa } else { 0x004b_484d };
                let line = Rect::new(
                    rect.x + 10.0,
                    rect.y + 10.0 + row as f32 * 30.0,
                    rect.w - 20.0,
                    24.0,
                );
                fill_rect(frame, width, height, &line, color, 255.0);
            }
        }
        DrawKind::EvolutionScene { flash, .. } => {
            fill_rect(frame, width, height, rect, 0x0010_1018, 200.0);
            let glow = Rect::from_center(rect.center(), 256.0, 256.0);
            fill_rect(frame, width, height, &glow, 0x00ff_ffff, *flash);
        }
        DrawKind::TintOverlay => fill_rect(frame, width, height, rect, 0x0000_0000, cmd.alpha),
    }
}

/// Alpha-blended rect fill with clipping, alpha in 0..=255.
fn fill_rect(frame: &mut [u32], width: u32, height: u32, rect: &Rect, color: u32, alpha: f32) {
    let x0 = rect.left().max(0.0) as u32;
    let y0 = rect.top().max(0.0) as u32;
    let x1 = (rect.right().min(width as f32)).max(0.0) as u32;
    let y1 = (rect.bottom().min(height as f32)).max(0.0) as u32;
    let a = (alpha.clamp(0.0, 255.0)) as u32;
    if a == 0 {
        return;
    }
    for y in y0..y1 {
        for x in x0..x1 {
            let idx = (y * width + x) as usize;
            if a >= 255 {
                frame[idx] = color;
            } else {
                let dst = frame[idx];
                let blend = |shift: u32| {
                    let c = (color >> shift) & 0xFF;
                    let d = (dst >> shift) & 0xFF;
                    ((c * a + d * (255 - a)) / 255) & 0xFF
                };
                frame[idx] = (blend(16) << 16) | (blend(8) << 8) | blend(0);
            }
        }
    }
}
