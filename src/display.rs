use crate::screen::{Screen, SCREEN_HEIGHT, SCREEN_WIDTH};
use std::io;
use tui::backend::CrosstermBackend;
use tui::layout::Rect;
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders};
use tui::Terminal;

/// Display is used by the driver to put the screen in front of a human. The
/// interpreter never calls it; it only ever touches the `Screen`.
pub trait Display {
    /// draw the whole screen, polling every pixel
    fn draw(&mut self, screen: &Screen) -> Result<(), io::Error>;
}

// canvas coordinates for a screen of a given size
struct Resolution(usize, usize);

impl Resolution {
    fn x_bounds(&self) -> [f64; 2] {
        [0.0, (self.0 - 1) as f64]
    }

    fn y_bounds(&self) -> [f64; 2] {
        [-1.0 * (self.1 - 1) as f64, 0.0]
    }

    /// canvas points for every pixel that is (or isn't) lit
    fn bitplane_from_screen(&self, screen: &Screen, lit: bool) -> Vec<(f64, f64)> {
        let mut points = Vec::new();
        for y in 0..self.1 {
            for x in 0..self.0 {
                if screen.is_set(x, y) == lit {
                    points.push((x as f64, -1.0 * y as f64));
                }
            }
        }
        points
    }
}

/// monochrome display in a terminal, rendered using TUI and crossterm
pub struct MonoTermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    resolution: Resolution,
}

impl MonoTermDisplay {
    pub fn new() -> Result<MonoTermDisplay, io::Error> {
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;
        Ok(MonoTermDisplay {
            terminal,
            resolution: Resolution(SCREEN_WIDTH, SCREEN_HEIGHT),
        })
    }
}

impl Display for MonoTermDisplay {
    fn draw(&mut self, screen: &Screen) -> Result<(), io::Error> {
        let unlit = self.resolution.bitplane_from_screen(screen, false);
        let lit = self.resolution.bitplane_from_screen(screen, true);
        let x_bounds = self.resolution.x_bounds();
        let y_bounds = self.resolution.y_bounds();
        let size = Rect::new(
            0,
            0,
            2 + self.resolution.0 as u16,
            2 + self.resolution.1 as u16,
        );

        // for now this assumes a 1:1 ratio between terminal, chip8 and the
        // internal TUI canvas
        self.terminal.draw(|f| {
            let canvas = Canvas::default()
                .block(
                    Block::default()
                        .title("CHIP-8")
                        .borders(Borders::ALL)
                        .style(Style::default().bg(Color::Black)),
                )
                .x_bounds(x_bounds)
                .y_bounds(y_bounds)
                .marker(Marker::Block)
                .paint(|ctx| {
                    ctx.draw(&Points {
                        coords: &unlit,
                        color: Color::Black,
                    });
                    ctx.draw(&Points {
                        coords: &lit,
                        color: Color::White,
                    });
                });
            f.render_widget(canvas, size);
        })?;
        Ok(())
    }
}

/// useful for testing the driver; remembers how many frames it was asked for
pub struct DummyDisplay {
    pub frames: usize,
    pub lit: usize,
}

impl DummyDisplay {
    pub fn new() -> DummyDisplay {
        DummyDisplay { frames: 0, lit: 0 }
    }
}

impl Default for DummyDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for DummyDisplay {
    fn draw(&mut self, screen: &Screen) -> Result<(), io::Error> {
        self.frames += 1;
        self.lit = screen.lit_count();
        Ok(())
    }
}
