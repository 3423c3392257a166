use std::path::Path;

use anyhow::{Context, Result};
use lm_core::error::CoreError;
use lm_core::traits::Sensor;

/// Replays a textual light/dark trace, one character per tick.
///
/// `1` or `#` = signal present, `0`, `_` or `.` = absent. Whitespace is
/// ignored and `;` starts a comment running to the end of the line.
///
/// # Example
/// ```
/// use lm_source::pattern::PatternSensor;
/// use lm_core::traits::Sensor;
///
/// let mut sensor = PatternSensor::parse("##__ ; dot then gap").unwrap();
/// assert_eq!(sensor.len(), 4);
/// assert_eq!(sensor.read().unwrap(), Some(true));
/// ```
#[derive(Clone, Debug)]
pub struct PatternSensor {
    readings: Vec<bool>,
    pos: usize,
}

impl PatternSensor {
    /// Parse a trace.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidTrace`] on any other character.
    pub fn parse(text: &str) -> Result<Self, CoreError> {
        let mut readings = Vec::new();
        for (n, line) in text.lines().enumerate() {
            let body = line.split(';').next().unwrap_or_default();
            for c in body.chars().filter(|c| !c.is_whitespace()) {
                match c {
                    '1' | '#' => readings.push(true),
                    '0' | '_' | '.' => readings.push(false),
                    other => {
                        return Err(CoreError::InvalidTrace {
                            line: n + 1,
                            reason: format!("caractère inattendu {other:?}"),
                        });
                    }
                }
            }
        }
        Ok(Self::from_readings(readings))
    }

    /// Charge une trace depuis un fichier texte.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not a valid trace.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Impossible de lire {}", path.display()))?;
        let sensor = Self::parse(&text).with_context(|| format!("Trace invalide : {}", path.display()))?;
        log::info!("Trace chargée : {} ticks depuis {}", sensor.len(), path.display());
        Ok(sensor)
    }

    #[must_use]
    pub fn from_readings(readings: Vec<bool>) -> Self {
        Self { readings, pos: 0 }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

impl Sensor for PatternSensor {
    fn read(&mut self) -> Result<Option<bool>, CoreError> {
        let reading = self.readings.get(self.pos).copied();
        if reading.is_some() {
            self.pos += 1;
        }
        Ok(reading)
    }

    fn name(&self) -> &'static str {
        "pattern"
    }
}
