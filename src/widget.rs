use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::style::Color;
use log::{error, info};

use crate::clock::Clock;
use crate::error::DemoError;
use crate::graphics::{draw_disc, draw_line, Canvas, Glyph, Viewport};
use crate::math::ORBIT_RADIUS;
use crate::model::OrbitModel;
use crate::scene::earth_outline;
use crate::state::AppState;

/// Half-size of the square of scene space kept on screen
const SCENE_EXTENT: f64 = ORBIT_RADIUS + 50.0;
/// Circle stroke drawn inside the rim, in scene units
const RIM_WIDTH: f64 = 2.0;

const MIN_WIDTH: usize = 30;
const MIN_HEIGHT: usize = 8;

/// Something the user can click
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonKind {
    SpeedUp,
    SpeedDown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Button {
    pub kind: ButtonKind,
    pub label: &'static str,
    pub col: u16,
    pub row: u16,
}

impl Button {
    pub fn width(&self) -> u16 {
        self.label.chars().count() as u16
    }

    pub fn contains(&self, col: u16, row: u16) -> bool {
        row == self.row && col >= self.col && col < self.col + self.width()
    }
}

/// Orbit scene widget
pub struct SceneWidget {
    frames_since_last_update: usize,
    last_fps_calculation: Instant,
    fps: f64,
    /// Buttons along the bottom row
    buttons: Vec<Button>,
    /// Widget size in cells
    size: (usize, usize),
    /// Where `s` writes snapshots
    snapshot_dir: PathBuf,
}

impl SceneWidget {
    pub fn new() -> Self {
        SceneWidget {
            frames_since_last_update: 0,
            last_fps_calculation: Instant::now(),
            fps: 0.0,
            buttons: Vec::new(),
            size: (0, 0),
            snapshot_dir: PathBuf::from("."),
        }
    }

    pub fn buttons(&self) -> &[Button] {
        &self.buttons
    }

    /// Places the buttons for a `width` x `height` terminal
    pub fn layout(&mut self, width: usize, height: usize) {
        self.size = (width, height);
        let row = height.saturating_sub(1) as u16;
        let up = Button {
            kind: ButtonKind::SpeedUp,
            label: "[ + speed up ]",
            col: 1,
            row,
        };
        let down = Button {
            kind: ButtonKind::SpeedDown,
            label: "[ - speed down ]",
            col: up.col + up.width() + 2,
            row,
        };
        self.buttons = vec![up, down];
    }

    fn button_at(&self, col: u16, row: u16) -> Option<ButtonKind> {
        self.buttons
            .iter()
            .find(|button| button.contains(col, row))
            .map(|button| button.kind)
    }

    /// Handle terminal events for the scene widget
    pub fn event<C: Clock>(&mut self, event: &Event, data: &mut AppState, model: &OrbitModel<C>) {
        match event {
            Event::Key(KeyEvent {
                code,
                modifiers,
                kind: KeyEventKind::Press,
                ..
            }) => match code {
                KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Up => model.speed_up(),
                KeyCode::Char('-') | KeyCode::Char('_') | KeyCode::Down => model.speed_down(),
                KeyCode::Char('d') | KeyCode::Char('D') => data.debug = !data.debug,
                KeyCode::Char('s') | KeyCode::Char('S') => {
                    let status = match save_snapshot(&self.snapshot_dir, data.frame, model) {
                        Ok(path) => format!("saved {}", path.display()),
                        Err(err) => {
                            error!("snapshot failed: {err}");
                            format!("snapshot failed: {err}")
                        }
                    };
                    data.status = Some(status);
                }
                KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                    data.quit = true
                }
                KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => data.quit = true,
                _ => {}
            },
            Event::Mouse(MouseEvent {
                kind: MouseEventKind::Down(MouseButton::Left),
                column,
                row,
                ..
            }) => match self.button_at(*column, *row) {
                Some(ButtonKind::SpeedUp) => model.speed_up(),
                Some(ButtonKind::SpeedDown) => model.speed_down(),
                None => {}
            },
            Event::Resize(width, height) => self.layout(*width as usize, *height as usize),
            _ => {}
        }
    }

    /// Paint the scene widget
    pub fn paint<C: Clock>(&mut self, canvas: &mut Canvas, data: &AppState, model: &OrbitModel<C>) {
        // Update FPS calculation
        self.frames_since_last_update += 1;
        let now = Instant::now();
        let duration = now.duration_since(self.last_fps_calculation);
        if duration.as_secs_f64() >= 1.0 {
            self.fps = self.frames_since_last_update as f64 / duration.as_secs_f64();
            self.frames_since_last_update = 0;
            self.last_fps_calculation = now;
        }

        let (width, height) = (canvas.width(), canvas.height());
        if width < MIN_WIDTH || height < MIN_HEIGHT {
            canvas.draw_text(0, 0, "terminal too small", Color::White);
            return;
        }

        // The bottom row belongs to the buttons
        let viewport = Viewport::fit(width, height - 1, SCENE_EXTENT);
        let scene = model.scene();

        // Orbiting circle first, the earth image is drawn over it
        draw_disc(
            canvas,
            &viewport,
            scene.position().sample(),
            scene.radius().sample(),
            RIM_WIDTH,
            Glyph::new('o', Color::Grey),
            Glyph::new('#', Color::DarkGrey),
        );

        let (corners, center, tip) = earth_outline(scene.rotation().sample());
        let edge = Glyph::new('*', Color::Blue);
        for i in 0..corners.len() {
            let next = (i + 1) % corners.len();
            draw_line(
                canvas,
                viewport.to_screen(corners[i]),
                viewport.to_screen(corners[next]),
                edge,
            );
        }
        draw_line(
            canvas,
            viewport.to_screen(center),
            viewport.to_screen(tip),
            Glyph::new('+', Color::Green),
        );

        for button in &self.buttons {
            canvas.draw_text(
                button.col as usize,
                button.row as usize,
                button.label,
                Color::White,
            );
        }
        let status_col = self
            .buttons
            .last()
            .map(|button| (button.col + button.width() + 2) as usize)
            .unwrap_or(0);
        let mut status = format!("speed {:.1}x", model.speed());
        if let Some(message) = &data.status {
            status.push_str("  ");
            status.push_str(message);
        }
        canvas.draw_text(status_col, height - 1, &status, Color::DarkGrey);

        // Add debug info if debug mode is enabled
        if data.debug {
            let lines = [
                format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
                format!("Speed: {:.2}", model.speed()),
                format!("Scene time: {:.0} ms", model.scene_time()),
                format!("Wall clock: {:.0} ms", model.wall_time()),
                format!("Rotation: {:.1} deg", scene.rotation().sample()),
                format!("FPS: {:.2}", self.fps),
            ];
            for (row, line) in lines.iter().enumerate() {
                canvas.draw_text(1, row, line, Color::White);
            }
        }
    }
}

impl Default for SceneWidget {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes the current scene into `dir`
fn save_snapshot<C: Clock>(
    dir: &Path,
    frame: u64,
    model: &OrbitModel<C>,
) -> Result<PathBuf, DemoError> {
    let path = dir.join(format!("orbit-{}.svg", frame));
    fs::write(&path, model.scene().to_svg())?;
    info!("wrote snapshot {}", path.display());
    Ok(path)
}
