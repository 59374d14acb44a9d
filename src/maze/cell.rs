use crossterm::style::{Color, Stylize};
use serde::{Deserialize, Serialize};

use std::fmt;

/// What a grid cell is made of. Fixed once the maze is generated.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    Open,
    #[default]
    Wall,
}

/// How a cell should be drawn, derived from the maze and one engine's state.
///
/// Variants are listed in drawing priority: when a cell qualifies for several
/// classes, the first one listed wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellClass {
    Wall,
    ClassicalSolution,
    QuantumSolution,
    Start,
    End,
    /// On the backtracking engine's current path
    ClassicalPath,
    /// Proven unproductive by the backtracking engine
    ClassicalDeadEnd,
    /// Reached by the wave-front engine
    QuantumWave,
    Open,
}

impl CellClass {
    /// The width of each cell when rendered, in character widths.
    pub const CELL_WIDTH: u16 = 2;
}

impl fmt::Display for CellClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let styled_symbol = match self {
            CellClass::Wall => "██".with(Color::DarkGrey),
            CellClass::ClassicalSolution | CellClass::QuantumSolution => "██".with(Color::Blue),
            CellClass::Start | CellClass::End => "██".with(Color::Green),
            CellClass::ClassicalPath => "██".with(Color::Cyan),
            CellClass::ClassicalDeadEnd => "▓▓".with(Color::Red),
            CellClass::QuantumWave => "▒▒".with(Color::Cyan),
            CellClass::Open => "  ".with(Color::Reset),
        };

        #[cfg(debug_assertions)]
        {
            use unicode_width::UnicodeWidthStr;
            assert_eq!(
                styled_symbol.content().width(),
                CellClass::CELL_WIDTH as usize,
                "Each cell must occupy exactly two character widths."
            );
        }

        write!(f, "{}", styled_symbol)
    }
}
