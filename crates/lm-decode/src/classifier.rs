use lm_core::config::Thresholds;
use lm_core::signal::{Classification, Gap, Run, RunState, Symbol};

/// Maps run durations to Morse elements using a calibrated unit.
///
/// Bands are half-open: a duration equal to a threshold belongs to the
/// longer class, so with the default ratios `2u − 1` is a dot and `2u` a dash.
///
/// # Example
/// ```
/// use lm_decode::classifier::Classifier;
/// use lm_core::config::Thresholds;
/// use lm_core::signal::{Classification, Gap, Run, RunState, Symbol};
///
/// let c = Classifier::new(4, Thresholds::default());
/// assert_eq!(c.classify(Run::new(RunState::Active, 4)), Classification::Mark(Symbol::Dot));
/// assert_eq!(c.classify(Run::new(RunState::Inactive, 12)), Classification::Space(Gap::Char));
/// ```
#[derive(Clone, Debug)]
pub struct Classifier {
    unit: u32,
    thresholds: Thresholds,
}

impl Classifier {
    /// `unit` is clamped to at least one tick.
    #[must_use]
    pub fn new(unit: u32, thresholds: Thresholds) -> Self {
        Self {
            unit: unit.max(1),
            thresholds,
        }
    }

    #[inline]
    #[must_use]
    pub fn unit(&self) -> u32 {
        self.unit
    }

    #[must_use]
    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    #[must_use]
    pub fn classify(&self, run: Run) -> Classification {
        match run.state {
            RunState::Active => self
                .classify_mark(run.ticks)
                .map_or(Classification::Noise, Classification::Mark),
            RunState::Inactive => Classification::Space(self.classify_gap(run.ticks)),
        }
    }

    /// Dot or dash for an active duration, `None` below the noise floor.
    #[must_use]
    pub fn classify_mark(&self, ticks: u32) -> Option<Symbol> {
        if self.below(ticks, self.thresholds.noise_floor) {
            None
        } else if self.below(ticks, self.thresholds.dash_ratio) {
            Some(Symbol::Dot)
        } else {
            Some(Symbol::Dash)
        }
    }

    #[must_use]
    pub fn classify_gap(&self, ticks: u32) -> Gap {
        if self.below(ticks, self.thresholds.char_gap_ratio) {
            Gap::Symbol
        } else if self.below(ticks, self.thresholds.word_gap_ratio) {
            Gap::Char
        } else {
            Gap::Word
        }
    }

    /// Shortest silence classified as a word gap.
    #[must_use]
    pub fn word_gap_ticks(&self) -> u32 {
        self.ticks_for(self.thresholds.word_gap_ratio)
    }

    /// Shortest duration reaching `ratio·u`.
    #[must_use]
    pub fn ticks_for(&self, ratio: f64) -> u32 {
        (ratio * f64::from(self.unit)).ceil().max(1.0) as u32
    }

    #[inline]
    fn below(&self, ticks: u32, ratio: f64) -> bool {
        f64::from(ticks) < ratio * f64::from(self.unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_at(unit: u32) -> Classifier {
        Classifier::new(unit, Thresholds::default())
    }

    #[test]
    fn dot_dash_boundary_is_strict_at_two_units() {
        for unit in [1, 2, 3, 4, 7, 10] {
            let c = default_at(unit);
            assert_eq!(c.classify_mark(2 * unit - 1), Some(Symbol::Dot), "u={unit}");
            assert_eq!(c.classify_mark(2 * unit), Some(Symbol::Dash), "u={unit}");
        }
    }

    #[test]
    fn short_pulses_are_noise() {
        let c = default_at(4);
        assert_eq!(c.classify_mark(1), None);
        assert_eq!(c.classify(Run::new(RunState::Active, 1)), Classification::Noise);
        assert_eq!(c.classify_mark(2), Some(Symbol::Dot));
    }

    #[test]
    fn nominal_timings_land_in_their_band() {
        let c = default_at(4);
        assert_eq!(c.classify_mark(4), Some(Symbol::Dot));
        assert_eq!(c.classify_mark(12), Some(Symbol::Dash));
        assert_eq!(c.classify_gap(4), Gap::Symbol);
        assert_eq!(c.classify_gap(12), Gap::Char);
        assert_eq!(c.classify_gap(28), Gap::Word);
    }

    #[test]
    fn gap_boundaries() {
        let c = default_at(4);
        assert_eq!(c.classify_gap(7), Gap::Symbol);
        assert_eq!(c.classify_gap(8), Gap::Char);
        assert_eq!(c.classify_gap(19), Gap::Char);
        assert_eq!(c.classify_gap(20), Gap::Word);
        assert_eq!(c.word_gap_ticks(), 20);
    }

    #[test]
    fn custom_thresholds_move_the_bands() {
        let c = Classifier::new(
            10,
            Thresholds {
                noise_floor: 0.3,
                dash_ratio: 2.5,
                char_gap_ratio: 2.5,
                word_gap_ratio: 6.0,
            },
        );
        assert_eq!(c.classify_mark(3), Some(Symbol::Dot));
        assert_eq!(c.classify_mark(24), Some(Symbol::Dot));
        assert_eq!(c.classify_mark(25), Some(Symbol::Dash));
        assert_eq!(c.classify_gap(59), Gap::Char);
        assert_eq!(c.word_gap_ticks(), 60);
    }

    #[test]
    fn zero_unit_is_clamped() {
        assert_eq!(default_at(0).unit(), 1);
    }
}
