use std::fmt;

/// One sensor reading, stamped with its position in the stream.
///
/// # Example
/// ```
/// use lm_core::signal::Tick;
/// let tick = Tick { index: 3, active: true };
/// assert!(tick.active);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tick {
    /// Numéro du tick depuis le début de la session (0-based).
    pub index: u64,
    /// `true` si le signal est présent (clair, proche, couleur active).
    pub active: bool,
}

/// Level of a run of identical readings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    /// Signal présent : candidat dot/dash.
    Active,
    /// Signal absent : candidat gap.
    Inactive,
}

impl RunState {
    /// State matching a boolean reading.
    #[inline]
    #[must_use]
    pub fn from_reading(active: bool) -> Self {
        if active { Self::Active } else { Self::Inactive }
    }
}

/// A maximal span of identical readings.
///
/// # Example
/// ```
/// use lm_core::signal::{Run, RunState};
/// let run = Run::new(RunState::Active, 4);
/// assert_eq!(run.ticks, 4);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Run {
    /// Level held during the run.
    pub state: RunState,
    /// Durée en ticks, toujours > 0.
    pub ticks: u32,
}

impl Run {
    #[must_use]
    pub fn new(state: RunState, ticks: u32) -> Self {
        Self { state, ticks }
    }

    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == RunState::Active
    }
}

/// A Morse element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Symbol {
    Dot,
    Dash,
}

impl Symbol {
    /// Nominal length in units (1:3).
    #[must_use]
    pub fn units(self) -> u32 {
        match self {
            Self::Dot => 1,
            Self::Dash => 3,
        }
    }

    /// Character used in the textual code-word form.
    #[must_use]
    pub fn as_char(self) -> char {
        match self {
            Self::Dot => '.',
            Self::Dash => '-',
        }
    }

    /// Nom prononcé par la synthèse vocale.
    #[must_use]
    pub fn spoken(self) -> &'static str {
        match self {
            Self::Dot => "dot",
            Self::Dash => "dash",
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Silence between marks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gap {
    /// Inside a character, between its dots and dashes.
    Symbol,
    /// Between two characters.
    Char,
    /// Between two words.
    Word,
}

impl Gap {
    /// `true` when the gap closes the pending code-word.
    #[must_use]
    pub fn is_boundary(self) -> bool {
        matches!(self, Self::Char | Self::Word)
    }
}

/// Result of classifying one run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    /// Active run below the noise floor. Never surfaced.
    Noise,
    Mark(Symbol),
    Space(Gap),
}
