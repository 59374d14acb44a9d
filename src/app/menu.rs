use std::io::{Stdout, Write};

use crossterm::{
    QueueableCommand, cursor,
    event::{self, KeyCode},
    queue,
    style::{self, Attribute, Color, Stylize},
    terminal::{self, ClearType},
};

use crate::config::{MazeSize, RaceConfig, RaceMode};

/// Something that can be picked from a start-up menu.
pub trait MenuEntry: std::fmt::Display + Copy {
    /// Extra line shown under the highlighted entry.
    fn detail(&self) -> String;
}

impl MenuEntry for MazeSize {
    fn detail(&self) -> String {
        RaceConfig::for_size(*self).pacing()
    }
}

impl MenuEntry for RaceMode {
    fn detail(&self) -> String {
        match self {
            RaceMode::Both => "classical and quantum race side by side".to_string(),
            RaceMode::ClassicalOnly => "only the backtracking search runs".to_string(),
            RaceMode::WaveOnly => "only the wave-front search runs".to_string(),
        }
    }
}

/// Cursor over a fixed list of entries. Movement wraps around.
#[derive(Debug)]
pub struct Menu<'a, T> {
    entries: &'a [T],
    selected: usize,
}

/// Outcome of one key press in a menu.
#[derive(Debug, PartialEq, Eq)]
pub enum MenuInput<T> {
    Moved,
    Chosen(T),
    Cancelled,
    Ignored,
}

impl<'a, T: MenuEntry> Menu<'a, T> {
    /// None for an empty list.
    pub fn new(entries: &'a [T]) -> Option<Self> {
        if entries.is_empty() {
            None
        } else {
            Some(Menu {
                entries,
                selected: 0,
            })
        }
    }

    pub fn selected(&self) -> T {
        self.entries[self.selected]
    }

    pub fn handle_key(&mut self, code: KeyCode) -> MenuInput<T> {
        let len = self.entries.len();
        match code {
            KeyCode::Up => {
                self.selected = (self.selected + len - 1) % len;
                MenuInput::Moved
            }
            KeyCode::Down | KeyCode::Tab => {
                self.selected = (self.selected + 1) % len;
                MenuInput::Moved
            }
            // Digits pick an entry directly, counting from 1
            KeyCode::Char(c) if c.is_ascii_digit() => {
                match (c as usize).checked_sub('1' as usize) {
                    Some(i) if i < len => {
                        self.selected = i;
                        MenuInput::Chosen(self.selected())
                    }
                    _ => MenuInput::Ignored,
                }
            }
            KeyCode::Enter => MenuInput::Chosen(self.selected()),
            KeyCode::Esc | KeyCode::Char('q') => MenuInput::Cancelled,
            _ => MenuInput::Ignored,
        }
    }

    fn render(&self, stdout: &mut Stdout, prompt: &str) -> std::io::Result<()> {
        queue!(
            stdout,
            cursor::RestorePosition,
            terminal::Clear(ClearType::FromCursorDown)
        )?;
        stdout.queue(style::PrintStyledContent(
            prompt.with(Color::Yellow).attribute(Attribute::Bold),
        ))?;
        for (i, entry) in self.entries.iter().enumerate() {
            let line = format!("\r\n {}. {}", i + 1, entry);
            if i == self.selected {
                stdout.queue(style::PrintStyledContent(line.attribute(Attribute::Reverse)))?;
                stdout.queue(style::PrintStyledContent(
                    format!("\r\n      {}", entry.detail()).with(Color::DarkGrey),
                ))?;
            } else {
                stdout.queue(style::Print(line))?;
            }
        }
        stdout.queue(style::Print("\r\n"))?;
        stdout.flush()
    }

    /// Draw the menu and block on key presses until an entry is chosen
    /// (Some) or the menu is cancelled (None). The menu is erased afterwards.
    pub fn run(mut self, stdout: &mut Stdout, prompt: &str) -> std::io::Result<Option<T>> {
        queue!(stdout, cursor::Hide, cursor::SavePosition)?;
        let choice = loop {
            self.render(stdout, prompt)?;
            let event::Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != event::KeyEventKind::Press {
                continue;
            }
            match self.handle_key(key.code) {
                MenuInput::Chosen(entry) => break Some(entry),
                MenuInput::Cancelled => break None,
                MenuInput::Moved | MenuInput::Ignored => {}
            }
        };
        queue!(
            stdout,
            cursor::RestorePosition,
            terminal::Clear(ClearType::FromCursorDown)
        )?;
        stdout.flush()?;
        tracing::debug!(prompt, choice = ?choice.map(|c| c.to_string()), "menu closed");
        Ok(choice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_wraps_around() {
        let mut menu = Menu::new(&MazeSize::ALL).unwrap();
        assert_eq!(menu.selected(), MazeSize::Small);
        assert_eq!(menu.handle_key(KeyCode::Up), MenuInput::Moved);
        assert_eq!(menu.selected(), MazeSize::Mega);
        menu.handle_key(KeyCode::Down);
        assert_eq!(menu.selected(), MazeSize::Small);
        menu.handle_key(KeyCode::Tab);
        assert_eq!(menu.handle_key(KeyCode::Enter), MenuInput::Chosen(MazeSize::Large));
    }

    #[test]
    fn test_menu_digits_and_cancel() {
        let mut menu = Menu::new(&RaceMode::ALL).unwrap();
        assert_eq!(
            menu.handle_key(KeyCode::Char('3')),
            MenuInput::Chosen(RaceMode::WaveOnly)
        );
        assert_eq!(menu.handle_key(KeyCode::Char('0')), MenuInput::Ignored);
        assert_eq!(menu.handle_key(KeyCode::Char('4')), MenuInput::Ignored);
        assert_eq!(menu.handle_key(KeyCode::Char('x')), MenuInput::Ignored);
        assert_eq!(menu.handle_key(KeyCode::Esc), MenuInput::Cancelled);
        assert!(Menu::<RaceMode>::new(&[]).is_none());
    }

    #[test]
    fn test_size_detail_shows_pacing() {
        assert!(MazeSize::Mega.detail().contains("on a worker"));
        assert!(MazeSize::Large.detail().starts_with("classical every 20ms"));
    }
}
