use std::path::Path;

use anyhow::{Context, Result};
use lm_core::config::DecoderConfig;
use lm_core::error::CoreError;
use lm_core::traits::Sensor;

/// Colour codes reported by the colour sensor.
const COLOR_NAMES: &[(&str, u8)] = &[
    ("none", 0),
    ("black", 1),
    ("blue", 2),
    ("green", 3),
    ("yellow", 4),
    ("red", 5),
    ("white", 6),
    ("brown", 7),
];

/// Code for a colour name, case-insensitive.
#[must_use]
pub fn color_code(name: &str) -> Option<u8> {
    COLOR_NAMES
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|&(_, code)| code)
}

/// Folds raw colour codes into the binary "signal present" reading.
///
/// Le ruban est lu en rouge ; jaune et marron passent pour du rouge.
///
/// # Example
/// ```
/// use lm_source::color::ColorMap;
/// let map = ColorMap::default();
/// assert!(map.is_active(5));  // red
/// assert!(map.is_active(7));  // brown
/// assert!(!map.is_active(6)); // white
/// ```
#[derive(Clone, Debug)]
pub struct ColorMap {
    active: Vec<u8>,
}

impl ColorMap {
    #[must_use]
    pub fn new(active: &[u8]) -> Self {
        Self {
            active: active.to_vec(),
        }
    }

    #[must_use]
    pub fn from_config(config: &DecoderConfig) -> Self {
        Self::new(&config.active_codes)
    }

    #[inline]
    #[must_use]
    pub fn is_active(&self, code: u8) -> bool {
        self.active.contains(&code)
    }
}

impl Default for ColorMap {
    fn default() -> Self {
        Self::new(&DecoderConfig::default().active_codes)
    }
}

/// Replays a recorded colour-code trace through a [`ColorMap`].
///
/// Tokens are separated by whitespace or commas; each is a code (`0`–`7`) or
/// a colour name (`red`, `white`…). `;` starts a comment.
///
/// # Example
/// ```
/// use lm_source::color::{ColorMap, ColorTraceSensor};
/// use lm_core::traits::Sensor;
///
/// let mut sensor = ColorTraceSensor::parse("6 5 yellow, white", ColorMap::default()).unwrap();
/// assert_eq!(sensor.read().unwrap(), Some(false));
/// assert_eq!(sensor.read().unwrap(), Some(true));
/// assert_eq!(sensor.read().unwrap(), Some(true));
/// ```
#[derive(Clone, Debug)]
pub struct ColorTraceSensor {
    codes: Vec<u8>,
    pos: usize,
    map: ColorMap,
}

impl ColorTraceSensor {
    /// Parse a trace.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidTrace`] on an unknown token.
    pub fn parse(text: &str, map: ColorMap) -> Result<Self, CoreError> {
        let mut codes = Vec::new();
        for (n, line) in text.lines().enumerate() {
            let body = line.split(';').next().unwrap_or_default();
            for token in body
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|t| !t.is_empty())
            {
                let code = token
                    .parse::<u8>()
                    .ok()
                    .or_else(|| color_code(token))
                    .ok_or_else(|| CoreError::InvalidTrace {
                        line: n + 1,
                        reason: format!("couleur inconnue {token:?}"),
                    })?;
                codes.push(code);
            }
        }
        Ok(Self { codes, pos: 0, map })
    }

    /// Charge une trace couleur depuis un fichier.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or contains unknown tokens.
    pub fn from_file(path: &Path, map: ColorMap) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Impossible de lire {}", path.display()))?;
        let sensor = Self::parse(&text, map)
            .with_context(|| format!("Trace couleur invalide : {}", path.display()))?;
        log::info!("Trace couleur chargée : {} ticks", sensor.len());
        Ok(sensor)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl Sensor for ColorTraceSensor {
    fn read(&mut self) -> Result<Option<bool>, CoreError> {
        let Some(&code) = self.codes.get(self.pos) else {
            return Ok(None);
        };
        self.pos += 1;
        Ok(Some(self.map.is_active(code)))
    }

    fn name(&self) -> &'static str {
        "color-trace"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_and_codes_are_equivalent() {
        assert_eq!(color_code("RED"), Some(5));
        assert_eq!(color_code("white"), Some(6));
        assert_eq!(color_code("purple"), None);
    }

    #[test]
    fn configured_codes_drive_the_mapping() {
        let map = ColorMap::new(&[1]);
        let mut sensor = ColorTraceSensor::parse("black red", map).unwrap();
        assert_eq!(sensor.read().unwrap(), Some(true));
        assert_eq!(sensor.read().unwrap(), Some(false));
        assert_eq!(sensor.read().unwrap(), None);
    }

    #[test]
    fn comments_and_separators() {
        let sensor = ColorTraceSensor::parse("; recorded run\n6,6, 5 ;tail\n7", ColorMap::default())
            .unwrap();
        assert_eq!(sensor.len(), 4);
    }

    #[test]
    fn unknown_token_is_rejected() {
        let err = ColorTraceSensor::parse("6\n6 magenta", ColorMap::default()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidTrace { line: 2, .. }));
    }

    #[test]
    fn out_of_range_number_is_rejected() {
        assert!(ColorTraceSensor::parse("300", ColorMap::default()).is_err());
    }
}
