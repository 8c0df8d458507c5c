//! Terminal preview of the panel.
//!
//! Each terminal cell shows two vertically stacked pixels with an upper
//! half block: the glyph's foreground is the top pixel, its background the
//! bottom one. A 64x32 panel therefore needs 64 columns and 16 rows.

use std::io::{self, IsTerminal, Stdout};

use crossterm::cursor::{Hide, Show};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Style};
use ratatui::widgets::{Paragraph, Widget};
use ratatui::Terminal;
use tracing::info;

use super::{check_bounds, FrameSink, SinkError};
use crate::render::{Geometry, Rgb};

const UPPER_HALF: &str = "▀";

/// Renders the panel into the terminal's alternate screen.
///
/// Raw mode stays off so Ctrl-C still reaches the process as a signal.
pub struct TerminalSink {
    terminal: Option<Terminal<CrosstermBackend<Stdout>>>,
    geometry: Option<Geometry>,
    back: Vec<Rgb>,
    caption: String,
}

impl std::fmt::Debug for TerminalSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalSink")
            .field("geometry", &self.geometry)
            .field("caption", &self.caption)
            .finish_non_exhaustive()
    }
}

impl TerminalSink {
    /// `caption` is printed under the panel.
    pub fn new(caption: impl Into<String>) -> Self {
        Self {
            terminal: None,
            geometry: None,
            back: Vec::new(),
            caption: caption.into(),
        }
    }
}

impl FrameSink for TerminalSink {
    fn initialize(&mut self, geometry: Geometry) -> Result<(), SinkError> {
        if !io::stdout().is_terminal() {
            return Err(SinkError::Init("stdout is not a terminal".to_string()));
        }

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, Hide)?;

        // Restore the terminal before the panic message prints
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic| {
            let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
            original_hook(panic);
        }));

        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        terminal.clear()?;

        self.back = vec![Rgb::BLACK; geometry.width as usize * geometry.height as usize];
        self.geometry = Some(geometry);
        self.terminal = Some(terminal);
        info!(
            width = geometry.width,
            height = geometry.height,
            "terminal sink ready"
        );
        Ok(())
    }

    fn set_pixel(&mut self, x: u32, y: u32, color: Rgb) -> Result<(), SinkError> {
        check_bounds(self.geometry, x, y)?;
        let width = self.geometry.map_or(0, |g| g.width) as usize;
        self.back[y as usize * width + x as usize] = color;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), SinkError> {
        let (Some(terminal), Some(geometry)) = (self.terminal.as_mut(), self.geometry) else {
            return Err(SinkError::Uninitialized);
        };
        let view = MatrixView {
            geometry,
            pixels: &self.back,
            caption: &self.caption,
        };
        terminal.draw(|frame| frame.render_widget(view, frame.area()))?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        if let Some(mut terminal) = self.terminal.take() {
            execute!(terminal.backend_mut(), LeaveAlternateScreen, Show)?;
            terminal.show_cursor()?;
        }
        Ok(())
    }

    fn description(&self) -> &str {
        "terminal"
    }
}

/// Widget drawing a pixel buffer with half blocks.
struct MatrixView<'a> {
    geometry: Geometry,
    pixels: &'a [Rgb],
    caption: &'a str,
}

impl MatrixView<'_> {
    fn pixel(&self, x: u32, y: u32) -> Rgb {
        if !self.geometry.contains(x, y) {
            return Rgb::BLACK;
        }
        self.pixels
            .get(y as usize * self.geometry.width as usize + x as usize)
            .copied()
            .unwrap_or_default()
    }

    fn rows_needed(&self) -> u32 {
        self.geometry.height.div_ceil(2)
    }
}

fn to_color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}

impl Widget for MatrixView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let need_width = self.geometry.width;
        let need_height = self.rows_needed() + 1;

        if u32::from(area.width) < need_width || u32::from(area.height) < need_height {
            let msg = format!(
                "Terminal too small: {}x{}\nPanel needs: {}x{}\n\nResize to continue",
                area.width, area.height, need_width, need_height
            );
            Paragraph::new(msg)
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Yellow))
                .render(area, buf);
            return;
        }

        for row in 0..self.rows_needed() {
            for x in 0..self.geometry.width {
                let top = self.pixel(x, row * 2);
                let bottom = self.pixel(x, row * 2 + 1);
                let position = (area.x + x as u16, area.y + row as u16);
                if let Some(cell) = buf.cell_mut(position) {
                    cell.set_symbol(UPPER_HALF)
                        .set_fg(to_color(top))
                        .set_bg(to_color(bottom));
                }
            }
        }

        let caption_area = Rect::new(
            area.x,
            area.y + self.rows_needed() as u16,
            area.width,
            1,
        );
        Paragraph::new(self.caption)
            .style(Style::default().fg(Color::DarkGray))
            .render(caption_area, buf);
    }
}
