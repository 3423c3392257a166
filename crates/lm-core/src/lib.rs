/// Configuration, types, and shared structures for lumorse.
///
/// This crate contains all shared types, traits, and configuration logic
/// used across the lumorse workspace.

pub mod clock;
pub mod config;
pub mod error;
pub mod morse;
pub mod signal;
pub mod traits;

pub use config::{Calibration, DecoderConfig, Thresholds};
pub use error::CoreError;
pub use morse::{CodeWord, MorseTable};
pub use signal::{Classification, Gap, Run, RunState, Symbol, Tick};
