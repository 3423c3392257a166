use lm_core::error::CoreError;
use lm_core::morse::MorseTable;
use lm_core::traits::Sensor;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Options for [`SynthSensor`].
#[derive(Clone, Debug)]
pub struct SynthOptions {
    /// Ticks per Morse unit.
    pub unit: u32,
    /// Prepend a one-unit calibration pulse.
    pub preamble: bool,
    /// Probability that an isolated dark tick flips to a single-tick flash.
    pub flicker_rate: f64,
    /// Seed du générateur de parasites (reproductible).
    pub seed: u64,
}

impl Default for SynthOptions {
    fn default() -> Self {
        Self {
            unit: 4,
            preamble: false,
            flicker_rate: 0.0,
            seed: 0,
        }
    }
}

/// Sensor that "reads" a text message keyed in Morse.
///
/// The stream is: 3u of silence, the optional calibration pulse (1u on, 3u
/// off), the keyed message, then 8u of silence so the last word closes.
/// Flicker only lands on dark ticks whose neighbours are both dark, so it
/// never lengthens a mark.
///
/// # Example
/// ```
/// use lm_core::morse::MorseTable;
/// use lm_source::synth::{SynthOptions, SynthSensor};
///
/// let sensor = SynthSensor::new(&MorseTable::standard(), "E", &SynthOptions::default()).unwrap();
/// assert_eq!(sensor.readings().iter().filter(|r| **r).count(), 4);
/// ```
#[derive(Clone, Debug)]
pub struct SynthSensor {
    readings: Vec<bool>,
    pos: usize,
}

impl SynthSensor {
    /// Key `text` with `table`.
    ///
    /// # Errors
    /// Returns [`CoreError::Unencodable`] if `text` contains a character missing from the table.
    pub fn new(table: &MorseTable, text: &str, options: &SynthOptions) -> Result<Self, CoreError> {
        let unit = options.unit.max(1) as usize;
        let mut readings = vec![false; 3 * unit];
        if options.preamble {
            readings.extend(std::iter::repeat_n(true, unit));
            readings.extend(std::iter::repeat_n(false, 3 * unit));
        }
        readings.extend(table.keying(text, options.unit)?);
        readings.extend(std::iter::repeat_n(false, 8 * unit));

        let rate = options.flicker_rate.clamp(0.0, 1.0);
        if rate > 0.0 {
            let flips = add_flicker(&mut readings, rate, options.seed);
            log::debug!("{flips} parasites injectés (taux {rate})");
        }
        Ok(Self { readings, pos: 0 })
    }

    #[must_use]
    pub fn readings(&self) -> &[bool] {
        &self.readings
    }
}

/// Flip isolated dark ticks to light. Returns the number of flips.
fn add_flicker(readings: &mut [bool], rate: f64, seed: u64) -> usize {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut flips = 0;
    for i in 1..readings.len().saturating_sub(1) {
        let isolated = !readings[i - 1] && !readings[i] && !readings[i + 1];
        if isolated && rng.random_bool(rate) {
            readings[i] = true;
            flips += 1;
        }
    }
    flips
}

impl Sensor for SynthSensor {
    fn read(&mut self) -> Result<Option<bool>, CoreError> {
        let reading = self.readings.get(self.pos).copied();
        if reading.is_some() {
            self.pos += 1;
        }
        Ok(reading)
    }

    fn name(&self) -> &'static str {
        "synth"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> MorseTable {
        MorseTable::standard()
    }

    #[test]
    fn clean_stream_wraps_keying_in_silence() {
        let options = SynthOptions {
            unit: 2,
            ..SynthOptions::default()
        };
        let sensor = SynthSensor::new(&table(), "T", &options).unwrap();
        let mut expected = vec![false; 6];
        expected.extend([true; 6]);
        expected.extend([false; 16]);
        assert_eq!(sensor.readings(), expected.as_slice());
    }

    #[test]
    fn preamble_adds_one_unit_pulse() {
        let options = SynthOptions {
            unit: 3,
            preamble: true,
            ..SynthOptions::default()
        };
        let sensor = SynthSensor::new(&table(), "E", &options).unwrap();
        assert_eq!(&sensor.readings()[9..12], &[true, true, true]);
        assert!(!sensor.readings()[12]);
    }

    #[test]
    fn flicker_is_isolated_and_reproducible() {
        let options = SynthOptions {
            unit: 4,
            flicker_rate: 0.2,
            seed: 42,
            ..SynthOptions::default()
        };
        let clean = SynthSensor::new(&table(), "SOS", &SynthOptions::default()).unwrap();
        let noisy = SynthSensor::new(&table(), "SOS", &options).unwrap();
        let again = SynthSensor::new(&table(), "SOS", &options).unwrap();
        assert_eq!(noisy.readings(), again.readings());
        assert_eq!(clean.readings().len(), noisy.readings().len());

        let mut flips = 0;
        for (i, (&c, &n)) in clean.readings().iter().zip(noisy.readings()).enumerate() {
            if c {
                assert!(n, "mark altered at {i}");
            } else if n {
                flips += 1;
                assert!(!clean.readings()[i - 1] && !clean.readings()[i + 1]);
                assert!(!noisy.readings()[i - 1] && !noisy.readings()[i + 1]);
            }
        }
        assert!(flips > 0);
    }

    #[test]
    fn unencodable_text_is_rejected() {
        assert!(SynthSensor::new(&table(), "€", &SynthOptions::default()).is_err());
    }

    #[test]
    fn reads_until_exhausted() {
        let mut sensor = SynthSensor::new(&table(), "E", &SynthOptions::default()).unwrap();
        let count = std::iter::from_fn(|| sensor.read().unwrap()).count();
        assert_eq!(count, 12 + 4 + 32);
    }
}
