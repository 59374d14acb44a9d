use std::{
    borrow::Cow,
    io::{Stdout, Write},
};

use crossterm::{
    QueueableCommand, cursor, queue,
    style::{self, Attribute, Color, Stylize},
    terminal::{self, ClearType},
};
use unicode_truncate::{Alignment, UnicodeTruncateStr};

use super::snapshot::Snapshot;
use crate::maze::CellClass;

/// One maze panel: a title row above the classified cells.
pub struct Panel {
    pub title: String,
    pub snapshot: Snapshot,
}

/// Everything shown on screen at one point in time.
pub struct Frame {
    pub panels: [Panel; 2],
    /// Lines printed below the panels
    pub status: Vec<String>,
}

/// Draws frames side by side, only touching cells and lines that changed
/// since the previous frame.
pub struct Renderer {
    stdout: Stdout,
    drawn: [Option<Snapshot>; 2],
    drawn_titles: [String; 2],
    drawn_status: Vec<String>,
    /// Whether the "terminal too small" notice is currently shown
    too_small: bool,
}

impl Default for Renderer {
    fn default() -> Self {
        Renderer::new()
    }
}

impl Renderer {
    /// Columns between the two panels.
    pub const PANEL_GAP: u16 = 4;

    pub fn new() -> Self {
        Renderer {
            stdout: std::io::stdout(),
            drawn: [None, None],
            drawn_titles: [String::new(), String::new()],
            drawn_status: Vec::new(),
            too_small: false,
        }
    }

    /// Terminal columns taken by one panel of the given grid width.
    pub fn panel_columns(width: u16) -> u16 {
        width.saturating_mul(CellClass::CELL_WIDTH)
    }

    /// Terminal size needed to show two panels of the given grid size plus
    /// `status_lines` lines of text.
    pub fn required_size(width: u16, height: u16, status_lines: u16) -> (u16, u16) {
        let columns = Renderer::panel_columns(width)
            .saturating_mul(2)
            .saturating_add(Renderer::PANEL_GAP);
        // Title row, panel rows, one blank row, status rows
        let rows = height.saturating_add(2).saturating_add(status_lines);
        (columns, rows)
    }

    /// Forget what is on screen so the next frame is drawn in full.
    pub fn invalidate(&mut self) -> std::io::Result<()> {
        self.drawn = [None, None];
        self.drawn_titles = [String::new(), String::new()];
        self.drawn_status.clear();
        queue!(
            self.stdout,
            terminal::Clear(ClearType::All),
            cursor::MoveTo(0, 0)
        )?;
        self.stdout.flush()
    }

    pub fn draw(&mut self, frame: &Frame) -> std::io::Result<()> {
        let snapshot = &frame.panels[0].snapshot;
        let (width, height) = (snapshot.width(), snapshot.height());
        let (term_width, term_height) = terminal::size()?;
        let (needed_width, needed_height) =
            Renderer::required_size(width, height, frame.status.len() as u16);

        if term_width < needed_width || term_height < needed_height {
            if !self.too_small {
                self.show_too_small(needed_width, needed_height)?;
                self.too_small = true;
            }
            return Ok(());
        }
        if self.too_small {
            self.too_small = false;
            self.invalidate()?;
        }

        let panel_columns = Renderer::panel_columns(width);
        for (i, panel) in frame.panels.iter().enumerate() {
            let origin = i as u16 * (panel_columns + Renderer::PANEL_GAP);

            if self.drawn_titles[i] != panel.title {
                let title = fit(&panel.title, panel_columns as usize);
                queue!(
                    self.stdout,
                    cursor::MoveTo(origin, 0),
                    style::PrintStyledContent(
                        title.into_owned().with(Color::Yellow).attribute(Attribute::Bold)
                    )
                )?;
                self.drawn_titles[i] = panel.title.clone();
            }

            for (coord, class) in panel.snapshot.changes_since(self.drawn[i].as_ref()) {
                queue!(
                    self.stdout,
                    cursor::MoveTo(origin + coord.col * CellClass::CELL_WIDTH, 1 + coord.row),
                    style::Print(class)
                )?;
            }
            self.drawn[i] = Some(panel.snapshot.clone());
        }

        let first_status_row = height + 2;
        for (i, line) in frame.status.iter().enumerate() {
            if self.drawn_status.get(i) == Some(line) {
                continue;
            }
            queue!(
                self.stdout,
                cursor::MoveTo(0, first_status_row + i as u16),
                terminal::Clear(ClearType::UntilNewLine)
            )?;
            self.stdout
                .queue(style::Print(fit(line, term_width as usize)))?;
        }
        // Clear lines left over from a longer previous frame
        for i in frame.status.len()..self.drawn_status.len() {
            queue!(
                self.stdout,
                cursor::MoveTo(0, first_status_row + i as u16),
                terminal::Clear(ClearType::UntilNewLine)
            )?;
        }
        self.drawn_status = frame.status.clone();

        self.stdout.flush()
    }

    fn show_too_small(&mut self, needed_width: u16, needed_height: u16) -> std::io::Result<()> {
        let msg = format!(
            "Terminal is too small, the race needs at least {}x{}. Please resize the terminal.\r\n",
            needed_width, needed_height
        );
        tracing::debug!(needed_width, needed_height, "terminal too small");
        queue!(
            self.stdout,
            terminal::Clear(ClearType::All),
            cursor::MoveTo(0, 0),
            style::PrintStyledContent(msg.with(Color::Yellow).attribute(Attribute::Bold)),
            style::PrintStyledContent(
                "Press Esc to exit...\r\n"
                    .with(Color::Blue)
                    .attribute(Attribute::Bold)
            )
        )?;
        self.stdout.flush()
    }
}

/// Truncate or pad `text` to exactly `width` display columns.
fn fit(text: &str, width: usize) -> Cow<'_, str> {
    text.unicode_pad(width, Alignment::Left, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use unicode_width::UnicodeWidthStr;

    #[test]
    fn test_required_size() {
        assert_eq!(Renderer::required_size(10, 10, 5), (44, 17));
        assert_eq!(Renderer::required_size(50, 50, 5), (204, 57));
        assert_eq!(Renderer::panel_columns(25), 50);
    }

    #[test]
    fn test_fit() {
        assert_eq!(fit("abc", 5), "abc  ");
        assert_eq!(fit("abcdef", 4), "abcd");
        // Wide characters are never split
        let fitted = fit("ab██cd", 3);
        assert!(fitted.width() <= 3);
        assert_eq!(fit("▓▓▓▓", 4).width(), 4);
    }
}
