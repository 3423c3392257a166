use thiserror::Error;

/// Errors reported by the decoding pipeline.
///
/// Only [`DecodeError::SensorUnavailable`] ends a session; the others are
/// reported and decoding continues.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// No usable calibration pulse observed in time.
    #[error("Calibration impossible : aucune impulsion exploitable en {waited_ticks} ticks")]
    CalibrationTimeout {
        /// Ticks waited before giving up this round.
        waited_ticks: u32,
    },

    /// A flushed code-word has no table entry.
    #[error("Code-word inconnu : {code}")]
    UnknownCodeWord {
        /// Textual form of the code-word (dots and dashes).
        code: String,
    },

    /// The sensor stopped producing readings.
    #[error("Capteur indisponible après {failures} échecs consécutifs : {reason}")]
    SensorUnavailable {
        /// Consecutive failed reads.
        failures: u32,
        /// Last error reported by the sensor.
        reason: String,
    },
}
