use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use lm_core::clock::TickClock;
use lm_core::config::DecoderConfig;
use lm_core::signal::Tick;
use lm_core::traits::Sensor;

use crate::error::DecodeError;

/// The sampler as an iterator: one sensor read per tick.
///
/// Ends when the stop flag is raised, when `max_ticks` readings were produced,
/// or when a finite sensor is exhausted. A failed read is logged and retried
/// on the next tick; after `retry_limit` consecutive failures the stream
/// yields [`DecodeError::SensorUnavailable`] once and ends.
///
/// # Example
/// ```
/// use lm_core::error::CoreError;
/// use lm_core::traits::Sensor;
/// use lm_decode::stream::TickStream;
///
/// struct Blink(u32);
/// impl Sensor for Blink {
///     fn read(&mut self) -> Result<Option<bool>, CoreError> {
///         self.0 += 1;
///         Ok(Some(self.0 % 2 == 0))
///     }
/// }
///
/// let ticks: Vec<bool> = TickStream::new(Blink(0))
///     .with_max_ticks(4)
///     .map(|t| t.unwrap().active)
///     .collect();
/// assert_eq!(ticks, vec![false, true, false, true]);
/// ```
pub struct TickStream<S> {
    sensor: S,
    clock: Option<TickClock>,
    stop: Option<Arc<AtomicBool>>,
    max_ticks: Option<u64>,
    retry_limit: u32,
    failures: u32,
    index: u64,
    done: bool,
}

impl<S: Sensor> TickStream<S> {
    /// Unpaced stream without stop flag or tick limit.
    pub fn new(sensor: S) -> Self {
        Self {
            sensor,
            clock: None,
            stop: None,
            max_ticks: None,
            retry_limit: 3,
            failures: 0,
            index: 0,
            done: false,
        }
    }

    /// Paced at `tick_period_ms`, with the configured retry limit.
    pub fn from_config(sensor: S, config: &DecoderConfig) -> Self {
        Self::new(sensor)
            .paced(config.tick_period())
            .with_retry_limit(config.sensor_retry_limit)
    }

    /// Sleep so that reads happen once per `period`.
    #[must_use]
    pub fn paced(mut self, period: Duration) -> Self {
        self.clock = Some(TickClock::new(period));
        self
    }

    /// Stop cooperatively once `flag` is raised. Checked before each read.
    #[must_use]
    pub fn with_stop(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop = Some(flag);
        self
    }

    #[must_use]
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = Some(max_ticks);
        self
    }

    #[must_use]
    pub fn with_retry_limit(mut self, retry_limit: u32) -> Self {
        self.retry_limit = retry_limit.max(1);
        self
    }

    /// Readings produced so far.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.index
    }

    fn should_stop(&self) -> bool {
        if self
            .stop
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
        {
            log::info!("Arrêt demandé après {} ticks", self.index);
            return true;
        }
        self.max_ticks.is_some_and(|max| self.index >= max)
    }
}

impl<S: Sensor> Iterator for TickStream<S> {
    type Item = Result<Tick, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done || self.should_stop() {
                self.done = true;
                return None;
            }
            if let Some(clock) = self.clock.as_mut() {
                clock.wait();
            }
            match self.sensor.read() {
                Ok(Some(active)) => {
                    self.failures = 0;
                    let tick = Tick {
                        index: self.index,
                        active,
                    };
                    self.index += 1;
                    return Some(Ok(tick));
                }
                Ok(None) => {
                    log::info!("Source {} épuisée après {} ticks", self.sensor.name(), self.index);
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    self.failures += 1;
                    log::warn!(
                        "Lecture {} échouée ({}/{}) : {e}",
                        self.sensor.name(),
                        self.failures,
                        self.retry_limit
                    );
                    if self.failures >= self.retry_limit {
                        self.done = true;
                        return Some(Err(DecodeError::SensorUnavailable {
                            failures: self.failures,
                            reason: e.to_string(),
                        }));
                    }
                }
            }
        }
    }
}
