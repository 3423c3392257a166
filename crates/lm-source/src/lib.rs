// Sensor capabilities that run without hardware: recorded traces and synthesized keying.

pub mod color;
pub mod pattern;
pub mod synth;

pub use color::{ColorMap, ColorTraceSensor};
pub use pattern::PatternSensor;
pub use synth::{SynthOptions, SynthSensor};
