use std::io::Write;

use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::{cursor::MoveTo, queue};

use crate::vec2::Vec2;

/// One character cell
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Glyph {
    pub ch: char,
    pub color: Color,
}

impl Glyph {
    pub const BLANK: Glyph = Glyph {
        ch: ' ',
        color: Color::Reset,
    };

    pub fn new(ch: char, color: Color) -> Self {
        Glyph { ch, color }
    }
}

/// Character buffer the scene is rasterised into
pub struct Canvas {
    width: usize,
    height: usize,
    cells: Vec<Glyph>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Canvas {
            width,
            height,
            cells: vec![Glyph::BLANK; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Glyph> {
        (x < self.width && y < self.height).then(|| self.cells[y * self.width + x])
    }

    /// Sets a cell, ignoring coordinates outside the canvas
    pub fn plot(&mut self, x: isize, y: isize, glyph: Glyph) {
        if x >= 0 && (x as usize) < self.width && y >= 0 && (y as usize) < self.height {
            self.cells[y as usize * self.width + x as usize] = glyph;
        }
    }

    /// Writes text left to right, clipped at the right edge
    pub fn draw_text(&mut self, x: usize, y: usize, text: &str, color: Color) {
        for (i, ch) in text.chars().enumerate() {
            self.plot((x + i) as isize, y as isize, Glyph::new(ch, color));
        }
    }

    /// Queues the whole buffer, switching colour only where it changes
    pub fn render(&self, out: &mut impl Write) -> std::io::Result<()> {
        let mut current = Color::Reset;
        queue!(out, ResetColor)?;
        for (y, row) in self.cells.chunks(self.width.max(1)).enumerate() {
            queue!(out, MoveTo(0, y as u16))?;
            let mut line = String::with_capacity(row.len());
            for glyph in row {
                if glyph.color != current {
                    queue!(out, Print(&line), SetForegroundColor(glyph.color))?;
                    line.clear();
                    current = glyph.color;
                }
                line.push(glyph.ch);
            }
            queue!(out, Print(&line))?;
        }
        queue!(out, ResetColor)?;
        out.flush()
    }

    #[cfg(test)]
    pub fn row(&self, y: usize) -> String {
        self.cells[y * self.width..(y + 1) * self.width]
            .iter()
            .map(|glyph| glyph.ch)
            .collect()
    }
}

/// Maps scene coordinates onto character cells.
///
/// Terminal cells are about twice as tall as they are wide, so one scene
/// unit covers twice as many columns as rows.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub origin: Vec2,
    /// Rows per scene unit
    pub scale: f64,
}

impl Viewport {
    /// Fits a square of half-size `extent` around the scene origin into a
    /// `width` x `height` cell area.
    pub fn fit(width: usize, height: usize, extent: f64) -> Self {
        let rows = height as f64;
        let cols = width as f64 / 2.0;
        Viewport {
            origin: Vec2::new(width as f64 / 2.0, height as f64 / 2.0),
            scale: rows.min(cols) / (2.0 * extent),
        }
    }

    pub fn to_screen(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            self.origin.x + p.x * self.scale * 2.0,
            self.origin.y + p.y * self.scale,
        )
    }

    /// Scene position of the centre of cell (`x`, `y`)
    pub fn to_scene(&self, x: usize, y: usize) -> Vec2 {
        Vec2::new(
            (x as f64 + 0.5 - self.origin.x) / (self.scale * 2.0),
            (y as f64 + 0.5 - self.origin.y) / self.scale,
        )
    }
}

/// Draws a line between two points in the canvas using Bresenham's algorithm
pub fn draw_line(canvas: &mut Canvas, from: Vec2, to: Vec2, glyph: Glyph) {
    let (mut x0, mut y0, x1, y1) = (
        from.x.round() as isize,
        from.y.round() as isize,
        to.x.round() as isize,
        to.y.round() as isize,
    );
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy; // error value e_xy

    loop {
        canvas.plot(x0, y0, glyph);

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// Fills a disc given in scene units, drawing cells within `stroke` of the
/// rim with the stroke glyph.
pub fn draw_disc(
    canvas: &mut Canvas,
    viewport: &Viewport,
    center: Vec2,
    radius: f64,
    stroke: f64,
    fill: Glyph,
    rim: Glyph,
) {
    // Compute bounding box of the disc
    let top_left = viewport.to_screen(Vec2::new(center.x - radius, center.y - radius));
    let bottom_right = viewport.to_screen(Vec2::new(center.x + radius, center.y + radius));
    let min_x = top_left.x.floor().max(0.0) as usize;
    let min_y = top_left.y.floor().max(0.0) as usize;
    let max_x = bottom_right.x.ceil().min(canvas.width() as f64 - 1.0);
    let max_y = bottom_right.y.ceil().min(canvas.height() as f64 - 1.0);
    if max_x < 0.0 || max_y < 0.0 {
        return;
    }

    // A rim thinner than a row would vanish between cell centres
    let rim_width = stroke.max(1.0 / viewport.scale);
    for y in min_y..=max_y as usize {
        for x in min_x..=max_x as usize {
            let p = viewport.to_scene(x, y);
            let distance = Vec2::new(p.x - center.x, p.y - center.y).length();
            if distance <= radius {
                let glyph = if radius - distance < rim_width { rim } else { fill };
                canvas.plot(x as isize, y as isize, glyph);
            }
        }
    }
}
