use std::io::{Stdout, Write};

use anyhow::Result;
use crossterm::cursor::MoveToColumn;
use crossterm::style::{Attribute, Print, SetAttribute};
use crossterm::terminal::{Clear, ClearType};
use crossterm::queue;
use lm_core::traits::Display;

/// Réécrit la ligne courante du terminal avec le message cumulé.
///
/// # Example
/// ```
/// use lm_render::display::TerminalDisplay;
/// use lm_core::traits::Display;
///
/// let mut display = TerminalDisplay::new(Vec::new());
/// display.show("SOS").unwrap();
/// let bytes = display.into_inner();
/// assert!(String::from_utf8_lossy(&bytes).contains("SOS"));
/// ```
pub struct TerminalDisplay<W: Write> {
    out: W,
    /// Dernier texte affiché, pour éviter les redessins inutiles.
    last: String,
}

impl TerminalDisplay<Stdout> {
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> TerminalDisplay<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            last: String::new(),
        }
    }

    /// Move to a fresh line so later output does not overwrite the message.
    ///
    /// # Errors
    /// Returns an error if the terminal write fails.
    pub fn finish(&mut self) -> Result<()> {
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Display for TerminalDisplay<W> {
    fn show(&mut self, text: &str) -> Result<()> {
        if text == self.last {
            return Ok(());
        }
        queue!(
            self.out,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            SetAttribute(Attribute::Bold),
            Print(text),
            SetAttribute(Attribute::Reset)
        )?;
        self.out.flush()?;
        text.clone_into(&mut self.last);
        Ok(())
    }
}
