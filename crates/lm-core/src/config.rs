use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::morse::MorseTable;

/// Classification bands, in multiples of the unit duration `u`.
///
/// Standard Morse keys 1/3/7 units; the bands sit between those ratios so
/// that jittered timings still land on the right side.
///
/// # Example
/// ```
/// use lm_core::config::Thresholds;
/// let t = Thresholds::default();
/// assert!(t.validate().is_ok());
/// assert_eq!(t.dash_ratio, 2.0);
/// ```
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Thresholds {
    /// Active runs shorter than `noise_floor·u` are noise.
    pub noise_floor: f64,
    /// Active runs from `dash_ratio·u` on are dashes.
    pub dash_ratio: f64,
    /// Inactive runs from `char_gap_ratio·u` on close a character.
    pub char_gap_ratio: f64,
    /// Inactive runs from `word_gap_ratio·u` on close a word.
    pub word_gap_ratio: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            noise_floor: 0.5,
            dash_ratio: 2.0,
            char_gap_ratio: 2.0,
            word_gap_ratio: 5.0,
        }
    }
}

impl Thresholds {
    /// Check band ordering.
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] if a ratio is not positive or the bands overlap.
    pub fn validate(&self) -> Result<(), CoreError> {
        let all = [
            self.noise_floor,
            self.dash_ratio,
            self.char_gap_ratio,
            self.word_gap_ratio,
        ];
        if all.iter().any(|r| !r.is_finite() || *r <= 0.0) {
            return Err(CoreError::Config(format!(
                "ratios de seuil non positifs : {all:?}"
            )));
        }
        if self.noise_floor >= self.dash_ratio {
            return Err(CoreError::Config(format!(
                "noise_floor ({}) doit être < dash_ratio ({})",
                self.noise_floor, self.dash_ratio
            )));
        }
        if self.char_gap_ratio >= self.word_gap_ratio {
            return Err(CoreError::Config(format!(
                "char_gap_ratio ({}) doit être < word_gap_ratio ({})",
                self.char_gap_ratio, self.word_gap_ratio
            )));
        }
        Ok(())
    }
}

/// How the unit duration is obtained.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CalibrationMode {
    /// `unit_ticks` is used as is.
    #[default]
    Fixed,
    /// The first clean pulse of the stream defines `u`.
    Preamble,
}

/// Resolved calibration strategy handed to a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Calibration {
    Fixed {
        unit_ticks: u32,
    },
    Preamble {
        /// Ticks to wait for a usable pulse before reporting a timeout.
        timeout_ticks: u32,
        /// Shorter pulses cannot calibrate (flicker).
        min_pulse_ticks: u32,
    },
}

/// Complete decoder configuration.
///
/// Sérialisable en TOML. Chaque champ a une valeur par défaut saine.
///
/// # Example
/// ```
/// use lm_core::config::DecoderConfig;
/// let config = DecoderConfig::default();
/// assert_eq!(config.tick_period_ms, 50);
/// assert_eq!(config.unit_ticks, 4);
/// ```
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct DecoderConfig {
    // === Échantillonnage ===
    /// Période d'échantillonnage du capteur, en millisecondes.
    pub tick_period_ms: u64,

    // === Calibration ===
    pub calibration_mode: CalibrationMode,
    /// Unit duration in ticks for [`CalibrationMode::Fixed`].
    pub unit_ticks: u32,
    /// Délai max (ticks) pour observer l'impulsion de calibration.
    pub calibration_timeout_ticks: u32,
    /// Durée minimale (ticks) d'une impulsion de calibration.
    pub min_pulse_ticks: u32,

    // === Classification ===
    pub thresholds: Thresholds,

    // === Table Morse ===
    /// Longueur max d'un code-word avant de le déclarer inconnu.
    pub max_code_len: usize,
    /// Emitted in place of an unknown code-word.
    pub unknown_marker: char,
    /// Extra `code → character` entries added to the standard table.
    pub extra_codes: BTreeMap<String, char>,

    // === Capteur ===
    /// Colour codes read as "signal present" (5 red, 4 yellow, 7 brown).
    pub active_codes: Vec<u8>,
    /// Consecutive failed reads tolerated before the sensor is declared lost.
    pub sensor_retry_limit: u32,

    // === Session ===
    /// Silence (in units) after which a non-empty message is complete. `None` = never.
    pub end_of_message_ratio: Option<f64>,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: 50,
            calibration_mode: CalibrationMode::Fixed,
            unit_ticks: 4,
            calibration_timeout_ticks: 200,
            min_pulse_ticks: 2,
            thresholds: Thresholds::default(),
            max_code_len: 8,
            unknown_marker: '?',
            extra_codes: BTreeMap::new(),
            active_codes: vec![5, 4, 7],
            sensor_retry_limit: 3,
            end_of_message_ratio: None,
        }
    }
}

impl DecoderConfig {
    /// Calibration strategy selected by `calibration_mode`.
    #[must_use]
    pub fn calibration(&self) -> Calibration {
        match self.calibration_mode {
            CalibrationMode::Fixed => Calibration::Fixed {
                unit_ticks: self.unit_ticks,
            },
            CalibrationMode::Preamble => Calibration::Preamble {
                timeout_ticks: self.calibration_timeout_ticks,
                min_pulse_ticks: self.min_pulse_ticks,
            },
        }
    }

    #[must_use]
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    /// Standard table plus `extra_codes`.
    ///
    /// # Errors
    /// Returns an error if an extra entry is malformed or collides with the standard table.
    pub fn morse_table(&self) -> Result<MorseTable, CoreError> {
        MorseTable::with_extra(&self.extra_codes)
    }

    /// Clamp all numeric fields to their valid ranges.
    /// Called after TOML deserialization to prevent out-of-range values.
    pub fn clamp_all(&mut self) {
        self.tick_period_ms = self.tick_period_ms.clamp(1, 1000);
        self.unit_ticks = self.unit_ticks.clamp(1, 1000);
        self.calibration_timeout_ticks = self.calibration_timeout_ticks.max(1);
        self.min_pulse_ticks = self.min_pulse_ticks.clamp(1, 1000);
        self.max_code_len = self.max_code_len.clamp(1, 16);
        self.sensor_retry_limit = self.sensor_retry_limit.clamp(1, 100);

        let t = &mut self.thresholds;
        t.noise_floor = t.noise_floor.clamp(0.05, 50.0);
        t.dash_ratio = t.dash_ratio.clamp(0.05, 50.0);
        t.char_gap_ratio = t.char_gap_ratio.clamp(0.05, 50.0);
        t.word_gap_ratio = t.word_gap_ratio.clamp(0.05, 50.0);

        // Une fin de message plus courte qu'un gap de mot couperait le message.
        let floor = self.thresholds.word_gap_ratio;
        self.end_of_message_ratio = self.end_of_message_ratio.map(|r| r.max(floor));
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    timing: Option<TimingSection>,
    thresholds: Option<ThresholdSection>,
    morse: Option<MorseSection>,
    sensor: Option<SensorSection>,
    session: Option<SessionSection>,
}

#[derive(Deserialize)]
struct TimingSection {
    tick_period_ms: Option<u64>,
    calibration: Option<CalibrationMode>,
    unit_ticks: Option<u32>,
    calibration_timeout_ticks: Option<u32>,
    min_pulse_ticks: Option<u32>,
}

#[derive(Deserialize)]
struct ThresholdSection {
    noise_floor: Option<f64>,
    dash_ratio: Option<f64>,
    char_gap_ratio: Option<f64>,
    word_gap_ratio: Option<f64>,
}

#[derive(Deserialize)]
struct MorseSection {
    max_code_len: Option<usize>,
    unknown_marker: Option<char>,
    extra: Option<BTreeMap<String, char>>,
}

#[derive(Deserialize)]
struct SensorSection {
    active_codes: Option<Vec<u8>>,
    retry_limit: Option<u32>,
}

#[derive(Deserialize)]
struct SessionSection {
    end_of_message_ratio: Option<f64>,
}

/// Parse a TOML document and merge it over the defaults.
///
/// # Errors
/// Returns an error if the document is not valid TOML for this schema, or
/// if the classification bands overlap once clamped.
///
/// # Example
/// ```
/// use lm_core::config::parse_config;
/// let config = parse_config("[timing]\nunit_ticks = 6\n").unwrap();
/// assert_eq!(config.unit_ticks, 6);
/// assert_eq!(config.tick_period_ms, 50);
/// ```
pub fn parse_config(content: &str) -> Result<DecoderConfig> {
    let file: ConfigFile = toml::from_str(content).context("Erreur de parsing TOML")?;
    let mut config = DecoderConfig::default();

    if let Some(t) = file.timing {
        if let Some(v) = t.tick_period_ms {
            config.tick_period_ms = v;
        }
        if let Some(v) = t.calibration {
            config.calibration_mode = v;
        }
        if let Some(v) = t.unit_ticks {
            config.unit_ticks = v;
        }
        if let Some(v) = t.calibration_timeout_ticks {
            config.calibration_timeout_ticks = v;
        }
        if let Some(v) = t.min_pulse_ticks {
            config.min_pulse_ticks = v;
        }
    }

    if let Some(t) = file.thresholds {
        if let Some(v) = t.noise_floor {
            config.thresholds.noise_floor = v;
        }
        if let Some(v) = t.dash_ratio {
            config.thresholds.dash_ratio = v;
        }
        if let Some(v) = t.char_gap_ratio {
            config.thresholds.char_gap_ratio = v;
        }
        if let Some(v) = t.word_gap_ratio {
            config.thresholds.word_gap_ratio = v;
        }
    }

    if let Some(m) = file.morse {
        if let Some(v) = m.max_code_len {
            config.max_code_len = v;
        }
        if let Some(v) = m.unknown_marker {
            config.unknown_marker = v;
        }
        if let Some(v) = m.extra {
            config.extra_codes = v;
        }
    }

    if let Some(s) = file.sensor {
        if let Some(v) = s.active_codes {
            config.active_codes = v;
        }
        if let Some(v) = s.retry_limit {
            config.sensor_retry_limit = v;
        }
    }

    if let Some(s) = file.session {
        config.end_of_message_ratio = s.end_of_message_ratio;
    }

    config.clamp_all();
    config
        .thresholds
        .validate()
        .context("Seuils de classification refusés")?;
    Ok(config)
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
/// ```no_run
/// use lm_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<DecoderConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Config invalide : {}", path.display()))
}
