//! Frame loop for the interactive terminal demo and the headless exporter.

use std::fs;
use std::io::{self, Stdout, Write};
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, Show};
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    self, disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use log::{debug, error, info};

use crate::cli::{DemoConfig, ExportConfig};
use crate::clock::{ManualClock, SystemClock};
use crate::error::DemoError;
use crate::graphics::Canvas;
use crate::model::OrbitModel;
use crate::state::AppState;
use crate::widget::SceneWidget;

/// Restores the terminal when dropped, including on early returns
struct TerminalGuard {
    out: Stdout,
}

impl TerminalGuard {
    fn enter() -> Result<Self, DemoError> {
        let mut out = io::stdout();
        enable_raw_mode()?;
        execute!(out, EnterAlternateScreen, EnableMouseCapture, Hide)?;
        Ok(TerminalGuard { out })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(err) = execute!(self.out, Show, DisableMouseCapture, LeaveAlternateScreen) {
            error!("failed to restore terminal screen: {err}");
        }
        if let Err(err) = disable_raw_mode() {
            error!("failed to leave raw mode: {err}");
        }
    }
}

/// Terminal size in cells, preferring termsize and falling back to crossterm
fn terminal_size() -> Result<(usize, usize), DemoError> {
    match termsize::get() {
        Some(size) => Ok((size.cols as usize, size.rows as usize)),
        None => {
            let (cols, rows) = terminal::size()?;
            Ok((cols as usize, rows as usize))
        }
    }
}

/// Runs the interactive demo until the user quits
pub fn run(config: &DemoConfig) -> Result<(), DemoError> {
    info!(
        "starting at {} fps, speed {} step {}, image {}",
        config.fps, config.model.initial_speed, config.model.speed_step, config.model.image
    );
    let frame_budget = Duration::from_secs_f64(config.frame_ms() / 1000.0);

    let mut model = OrbitModel::new(SystemClock::new(), &config.model);
    let mut widget = SceneWidget::new();
    let mut state = AppState::new(config.debug);

    let mut guard = TerminalGuard::enter()?;
    while !state.quit {
        let frame_start = Instant::now();
        model.tick();

        let (width, height) = terminal_size()?;
        widget.layout(width, height);
        let mut canvas = Canvas::new(width, height);
        widget.paint(&mut canvas, &state, &model);
        canvas.render(&mut guard.out)?;
        state.frame += 1;

        // Handle input for whatever is left of this frame
        loop {
            let elapsed = frame_start.elapsed();
            if elapsed >= frame_budget {
                if elapsed > frame_budget * 2 {
                    debug!("frame {} overran: {:?}", state.frame, elapsed);
                }
                break;
            }
            if event::poll(frame_budget - elapsed)? {
                let event = event::read()?;
                widget.event(&event, &mut state, &model);
                if state.quit {
                    break;
                }
            }
        }
    }
    guard.out.flush()?;
    drop(guard);

    info!(
        "quit after {} frames at speed {:.1}",
        state.frame,
        model.speed()
    );
    Ok(())
}

/// Simulates the configured number of frames on a manual clock and writes
/// the final scene as SVG.
pub fn export_svg(config: &DemoConfig, export: &ExportConfig) -> Result<String, DemoError> {
    let clock = ManualClock::new();
    let mut model = OrbitModel::new(clock.clone(), &config.model);
    for _ in 0..export.speed_ups {
        model.speed_up();
    }
    for _ in 0..export.speed_downs {
        model.speed_down();
    }

    for _ in 0..export.frames {
        clock.advance(config.frame_ms());
        model.tick();
    }

    let svg = model.scene().to_svg();
    fs::write(&export.path, &svg)?;
    info!(
        "exported {} frames (scene time {:.0} ms) to {}",
        export.frames,
        model.scene_time(),
        export.path.display()
    );
    Ok(svg)
}
