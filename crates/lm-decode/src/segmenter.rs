use lm_core::signal::{Run, RunState};

/// Groups consecutive identical readings into runs.
///
/// A run closes on the first reading of the other level, or on [`flush`](Self::flush).
///
/// # Example
/// ```
/// use lm_decode::segmenter::Segmenter;
/// use lm_core::signal::{Run, RunState};
///
/// let mut seg = Segmenter::new();
/// assert_eq!(seg.push(true), None);
/// assert_eq!(seg.push(true), None);
/// assert_eq!(seg.push(false), Some(Run::new(RunState::Active, 2)));
/// assert_eq!(seg.flush(), Some(Run::new(RunState::Inactive, 1)));
/// ```
#[derive(Debug, Default)]
pub struct Segmenter {
    open: Option<Run>,
}

impl Segmenter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one reading. Returns the run closed by a level change, if any.
    pub fn push(&mut self, active: bool) -> Option<Run> {
        let state = RunState::from_reading(active);
        if let Some(run) = self.open.as_mut()
            && run.state == state
        {
            run.ticks = run.ticks.saturating_add(1);
            return None;
        }
        self.open.replace(Run::new(state, 1))
    }

    /// Close the run in progress (end of input).
    pub fn flush(&mut self) -> Option<Run> {
        self.open.take()
    }

    /// Run in progress, not yet closed.
    #[must_use]
    pub fn open_run(&self) -> Option<Run> {
        self.open
    }
}

/// Lazy run iterator over a reading iterator. The last run is flushed when
/// the readings end.
///
/// # Example
/// ```
/// use lm_decode::segmenter::Runs;
/// let runs: Vec<u32> = Runs::new([true, false, false, true].into_iter())
///     .map(|r| r.ticks)
///     .collect();
/// assert_eq!(runs, vec![1, 2, 1]);
/// ```
pub struct Runs<I> {
    readings: I,
    segmenter: Segmenter,
    done: bool,
}

impl<I: Iterator<Item = bool>> Runs<I> {
    pub fn new(readings: I) -> Self {
        Self {
            readings,
            segmenter: Segmenter::new(),
            done: false,
        }
    }
}

impl<I: Iterator<Item = bool>> Iterator for Runs<I> {
    type Item = Run;

    fn next(&mut self) -> Option<Run> {
        if self.done {
            return None;
        }
        for active in self.readings.by_ref() {
            if let Some(run) = self.segmenter.push(active) {
                return Some(run);
            }
        }
        self.done = true;
        self.segmenter.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runs(readings: &[bool]) -> Vec<(bool, u32)> {
        Runs::new(readings.iter().copied())
            .map(|r| (r.is_active(), r.ticks))
            .collect()
    }

    #[test]
    fn empty_input_has_no_runs() {
        assert!(runs(&[]).is_empty());
        assert_eq!(Segmenter::new().flush(), None);
    }

    #[test]
    fn durations_accumulate_per_tick() {
        let readings = [false, false, true, true, true, false];
        assert_eq!(runs(&readings), vec![(false, 2), (true, 3), (false, 1)]);
    }

    #[test]
    fn single_tick_flicker_is_its_own_run() {
        let readings = [false, false, false, true, false, false];
        assert_eq!(runs(&readings), vec![(false, 3), (true, 1), (false, 2)]);
    }

    #[test]
    fn open_run_tracks_progress() {
        let mut seg = Segmenter::new();
        assert_eq!(seg.open_run(), None);
        seg.push(false);
        seg.push(false);
        assert_eq!(seg.open_run(), Some(Run::new(RunState::Inactive, 2)));
        assert_eq!(seg.push(true), Some(Run::new(RunState::Inactive, 2)));
        assert_eq!(seg.open_run(), Some(Run::new(RunState::Active, 1)));
    }

    #[test]
    fn runs_iterator_is_fused_after_flush() {
        let mut it = Runs::new([true].into_iter());
        assert_eq!(it.next(), Some(Run::new(RunState::Active, 1)));
        assert_eq!(it.next(), None);
        assert_eq!(it.next(), None);
    }
}
