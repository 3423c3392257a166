use std::time::{Duration, Instant};

/// Cadence fixe de l'échantillonnage.
///
/// Deadline-based: each `wait()` sleeps until one period after the previous
/// deadline, so the time spent decoding does not stretch the tick. When the
/// loop falls more than one period behind, the schedule restarts from now.
///
/// # Example
/// ```
/// use lm_core::clock::TickClock;
/// use std::time::Duration;
/// let mut clock = TickClock::new(Duration::ZERO);
/// clock.wait();
/// assert_eq!(clock.ticks(), 1);
/// ```
pub struct TickClock {
    period: Duration,
    next: Option<Instant>,
    ticks: u64,
    /// Nombre de ticks où la boucle était en retard.
    overruns: u64,
}

impl TickClock {
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next: None,
            ticks: 0,
            overruns: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Ticks elapsed since creation.
    #[inline]
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    #[inline]
    #[must_use]
    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    /// Block until the next tick is due. The first call returns immediately.
    pub fn wait(&mut self) {
        self.ticks += 1;
        let now = Instant::now();
        let Some(deadline) = self.next else {
            self.next = Some(now + self.period);
            return;
        };
        if deadline > now {
            std::thread::sleep(deadline - now);
            self.next = Some(deadline + self.period);
        } else if now - deadline > self.period {
            self.overruns += 1;
            log::trace!("tick en retard de {:?}", now - deadline);
            self.next = Some(now + self.period);
        } else {
            self.next = Some(deadline + self.period);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_period_never_sleeps() {
        let mut clock = TickClock::new(Duration::ZERO);
        let start = Instant::now();
        for _ in 0..1000 {
            clock.wait();
        }
        assert_eq!(clock.ticks(), 1000);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn ticks_are_spaced_by_period() {
        let period = Duration::from_millis(5);
        let mut clock = TickClock::new(period);
        let start = Instant::now();
        for _ in 0..4 {
            clock.wait();
        }
        // first wait is immediate, three full periods follow
        assert!(start.elapsed() >= period * 3);
        assert_eq!(clock.period(), period);
    }
}
