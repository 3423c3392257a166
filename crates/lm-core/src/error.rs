use thiserror::Error;

/// Errors originating from the core module.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Invalid configuration value or structure.
    #[error("Configuration invalide : {0}")]
    Config(String),

    /// A Morse code-word could not be parsed from its textual form.
    #[error("Code Morse invalide : {code:?}")]
    InvalidCode {
        /// Offending text.
        code: String,
    },

    /// Two table entries claim the same code-word or the same character.
    #[error("Entrée Morse en double : {entry}")]
    DuplicateEntry {
        /// The duplicated code-word or character.
        entry: String,
    },

    /// A character has no Morse representation.
    #[error("Caractère non encodable : {0:?}")]
    Unencodable(char),

    /// Malformed sensor trace.
    #[error("Trace capteur invalide ligne {line} : {reason}")]
    InvalidTrace {
        /// 1-based line number in the trace.
        line: usize,
        /// What went wrong.
        reason: String,
    },

    /// The sensor failed to produce a reading.
    #[error("Lecture capteur impossible : {0}")]
    Sensor(String),
}
