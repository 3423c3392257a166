use lm_core::config::Calibration;
use lm_core::signal::Run;

use crate::error::DecodeError;

/// Determines the unit duration `u`.
///
/// In preamble mode the first active run of at least `min_pulse_ticks` is the
/// reference pulse; it is consumed and never decoded. The wait counter
/// restarts after each reported timeout, so calibration keeps trying for as
/// long as the session runs.
///
/// # Example
/// ```
/// use lm_decode::calibration::Calibrator;
/// use lm_core::config::Calibration;
/// use lm_core::signal::{Run, RunState};
///
/// let mut cal = Calibrator::new(Calibration::Preamble { timeout_ticks: 100, min_pulse_ticks: 2 });
/// assert_eq!(cal.unit(), None);
/// assert_eq!(cal.observe(Run::new(RunState::Active, 5)), Some(5));
/// assert_eq!(cal.unit(), Some(5));
/// ```
#[derive(Debug)]
pub struct Calibrator {
    unit: Option<u32>,
    timeout_ticks: u32,
    min_pulse_ticks: u32,
    waited: u32,
    timeouts: u32,
}

impl Calibrator {
    #[must_use]
    pub fn new(calibration: Calibration) -> Self {
        match calibration {
            Calibration::Fixed { unit_ticks } => Self {
                unit: Some(unit_ticks.max(1)),
                timeout_ticks: 0,
                min_pulse_ticks: 1,
                waited: 0,
                timeouts: 0,
            },
            Calibration::Preamble {
                timeout_ticks,
                min_pulse_ticks,
            } => Self {
                unit: None,
                timeout_ticks: timeout_ticks.max(1),
                min_pulse_ticks: min_pulse_ticks.max(1),
                waited: 0,
                timeouts: 0,
            },
        }
    }

    #[inline]
    #[must_use]
    pub fn unit(&self) -> Option<u32> {
        self.unit
    }

    /// Timeouts reported so far.
    #[must_use]
    pub fn timeouts(&self) -> u32 {
        self.timeouts
    }

    /// Offer a closed run. Returns the unit when this run calibrates.
    pub fn observe(&mut self, run: Run) -> Option<u32> {
        if self.unit.is_some() || !run.is_active() {
            return None;
        }
        if run.ticks < self.min_pulse_ticks {
            log::trace!("impulsion de {} ticks trop courte pour calibrer", run.ticks);
            return None;
        }
        self.unit = Some(run.ticks);
        self.waited = 0;
        log::info!("Calibré : u = {} ticks", run.ticks);
        self.unit
    }

    /// Count one tick spent uncalibrated.
    pub fn tick(&mut self) -> Option<DecodeError> {
        if self.unit.is_some() {
            return None;
        }
        self.waited += 1;
        if self.waited < self.timeout_ticks {
            return None;
        }
        let waited_ticks = self.waited;
        self.waited = 0;
        self.timeouts += 1;
        Some(DecodeError::CalibrationTimeout { waited_ticks })
    }
}
