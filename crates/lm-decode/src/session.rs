use std::sync::Arc;

use lm_core::config::{DecoderConfig, Thresholds};
use lm_core::error::CoreError;
use lm_core::morse::{CodeWord, MorseTable};
use lm_core::signal::{Classification, Gap, Run};

use crate::calibration::Calibrator;
use crate::classifier::Classifier;
use crate::decoder::{DecoderState, Flush, MorseDecoder};
use crate::error::DecodeError;
use crate::segmenter::Segmenter;

/// What a session reports to its caller.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    /// Unit duration determined (preamble mode only).
    Calibrated { unit_ticks: u32 },
    /// A character was appended to the message (table hit or unknown marker).
    Character { ch: char, code: CodeWord },
    /// A space was appended after the previous character.
    WordBreak,
    /// Reported and ignored: calibration timeout, unknown code-word.
    Recoverable(DecodeError),
    /// Silence long enough to consider the message complete.
    EndOfMessage,
}

/// Silence accumulated since the last mark.
#[derive(Debug, Default)]
struct PendingGap {
    ticks: u32,
    /// Already applied to the decoder as a word gap.
    resolved: bool,
}

/// One decoding session: segmenter, calibration, classifier and decoder
/// state owned by a single context object.
///
/// Readings go in one at a time; events come out in a caller-provided
/// buffer. Several sessions can share one [`MorseTable`].
///
/// Noise pulses are folded into the surrounding silence, so a flicker in the
/// middle of a gap neither shows up nor splits the gap in two. The gap before
/// a mark is classified when that mark ends; a silence that reaches the word
/// threshold is applied immediately so the last word renders without waiting
/// for the next pulse.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use lm_core::config::DecoderConfig;
/// use lm_core::morse::MorseTable;
/// use lm_decode::session::Session;
///
/// let table = Arc::new(MorseTable::standard());
/// let config = DecoderConfig::default();
/// let mut session = Session::new(&config, Arc::clone(&table));
/// let mut events = Vec::new();
/// for active in table.keying("HI", config.unit_ticks).unwrap() {
///     session.push(active, &mut events);
/// }
/// session.finish(&mut events);
/// assert_eq!(session.message(), "HI");
/// ```
pub struct Session {
    thresholds: Thresholds,
    end_of_message_ratio: Option<f64>,
    segmenter: Segmenter,
    calibrator: Calibrator,
    classifier: Option<Classifier>,
    decoder: MorseDecoder,
    gap: PendingGap,
    ticks: u64,
    ended: bool,
}

impl Session {
    #[must_use]
    pub fn new(config: &DecoderConfig, table: Arc<MorseTable>) -> Self {
        let calibrator = Calibrator::new(config.calibration());
        let classifier = calibrator
            .unit()
            .map(|unit| Classifier::new(unit, config.thresholds.clone()));
        Self {
            thresholds: config.thresholds.clone(),
            end_of_message_ratio: config.end_of_message_ratio,
            segmenter: Segmenter::new(),
            calibrator,
            classifier,
            decoder: MorseDecoder::from_config(config, table),
            gap: PendingGap::default(),
            ticks: 0,
            ended: false,
        }
    }

    /// Feed one reading. New events are appended to `out`.
    pub fn push(&mut self, active: bool, out: &mut Vec<SessionEvent>) {
        if self.ended {
            return;
        }
        self.ticks += 1;
        let closed = self.segmenter.push(active);

        if self.classifier.is_none() {
            self.calibrate(closed, out);
            return;
        }
        if let Some(run) = closed {
            self.apply_run(run, out);
        }
        self.check_silence(out);
    }

    /// End the session: close the open run, flush a pending code-word.
    /// Later calls and pushes are no-ops.
    pub fn finish(&mut self, out: &mut Vec<SessionEvent>) {
        if self.ended {
            return;
        }
        self.ended = true;

        if let Some(run) = self.segmenter.flush() {
            if self.classifier.is_some() {
                self.apply_run(run, out);
            } else {
                self.calibrate(Some(run), out);
            }
        }
        if let Some(flush) = self.decoder.finish() {
            Self::emit(flush, out);
        }
        log::info!(
            "Session terminée après {} ticks : {:?}",
            self.ticks,
            self.decoder.message()
        );
    }

    /// Swap classification bands, keeping the calibrated unit.
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] if the bands are invalid; the session keeps its previous ones.
    pub fn set_thresholds(&mut self, thresholds: Thresholds) -> Result<(), CoreError> {
        thresholds.validate()?;
        if let Some(classifier) = self.classifier.as_mut() {
            *classifier = Classifier::new(classifier.unit(), thresholds.clone());
        }
        self.thresholds = thresholds;
        Ok(())
    }

    #[must_use]
    pub fn message(&self) -> &str {
        self.decoder.message()
    }

    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Calibrated unit, `None` while waiting for the preamble.
    #[must_use]
    pub fn unit(&self) -> Option<u32> {
        self.classifier.as_ref().map(Classifier::unit)
    }

    #[must_use]
    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Readings consumed so far.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    #[must_use]
    pub fn decoder_state(&self) -> DecoderState {
        self.decoder.state()
    }

    #[must_use]
    pub fn misses(&self) -> u32 {
        self.decoder.misses()
    }

    fn calibrate(&mut self, closed: Option<Run>, out: &mut Vec<SessionEvent>) {
        if let Some(run) = closed
            && let Some(unit) = self.calibrator.observe(run)
        {
            self.classifier = Some(Classifier::new(unit, self.thresholds.clone()));
            out.push(SessionEvent::Calibrated { unit_ticks: unit });
            return;
        }
        if let Some(err) = self.calibrator.tick() {
            log::warn!("{err}");
            out.push(SessionEvent::Recoverable(err));
        }
    }

    fn apply_run(&mut self, run: Run, out: &mut Vec<SessionEvent>) {
        let Some(classifier) = self.classifier.as_ref() else {
            return;
        };
        match classifier.classify(run) {
            Classification::Space(_) => {
                self.gap.ticks = self.gap.ticks.saturating_add(run.ticks);
            }
            Classification::Noise => {
                log::trace!("bruit de {} ticks absorbé dans le gap", run.ticks);
                self.gap.ticks = self.gap.ticks.saturating_add(run.ticks);
            }
            Classification::Mark(symbol) => {
                self.settle_gap(out);
                log::debug!("{} ticks → {symbol:?}", run.ticks);
                self.decoder.on_symbol(symbol);
            }
        }
    }

    /// Classify the silence preceding a mark and apply it.
    fn settle_gap(&mut self, out: &mut Vec<SessionEvent>) {
        let gap = std::mem::take(&mut self.gap);
        if gap.resolved || gap.ticks == 0 {
            return;
        }
        let Some(classifier) = self.classifier.as_ref() else {
            return;
        };
        let kind = classifier.classify_gap(gap.ticks);
        log::debug!("{} ticks → {kind:?} gap", gap.ticks);
        self.apply_gap(kind, out);
    }

    /// Resolve a growing silence as soon as its class can no longer change.
    fn check_silence(&mut self, out: &mut Vec<SessionEvent>) {
        let Some(classifier) = self.classifier.as_ref() else {
            return;
        };
        let word_ticks = classifier.word_gap_ticks();
        let end_ticks = self.end_of_message_ratio.map(|r| classifier.ticks_for(r));

        let open = match self.segmenter.open_run() {
            Some(run) if !run.is_active() => run.ticks,
            _ => 0,
        };
        let silence = self.gap.ticks.saturating_add(open);

        if !self.gap.resolved
            && self.decoder.state() == DecoderState::Accumulating
            && silence >= word_ticks
        {
            self.gap.resolved = true;
            self.apply_gap(Gap::Word, out);
        }

        if let Some(end_ticks) = end_ticks
            && silence >= end_ticks
            && !self.decoder.message().is_empty()
        {
            log::info!("Fin de message après {silence} ticks de silence");
            out.push(SessionEvent::EndOfMessage);
            self.finish(out);
        }
    }

    fn apply_gap(&mut self, gap: Gap, out: &mut Vec<SessionEvent>) {
        if let Some(flush) = self.decoder.on_gap(gap) {
            Self::emit(flush, out);
        }
    }

    fn emit(flush: Flush, out: &mut Vec<SessionEvent>) {
        if flush.is_miss() {
            out.push(SessionEvent::Recoverable(DecodeError::UnknownCodeWord {
                code: flush.code.to_string(),
            }));
        }
        out.push(SessionEvent::Character {
            ch: flush.emitted,
            code: flush.code,
        });
        if flush.word_end {
            out.push(SessionEvent::WordBreak);
        }
    }
}

/// Result of decoding a finite reading sequence.
#[derive(Clone, Debug, PartialEq)]
pub struct Decoded {
    pub message: String,
    pub events: Vec<SessionEvent>,
}

/// Decode a finite sequence of readings in one go.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use lm_core::config::DecoderConfig;
/// use lm_core::morse::MorseTable;
/// use lm_decode::session::decode_ticks;
///
/// let table = Arc::new(MorseTable::standard());
/// let ticks = table.keying("SOS", 4).unwrap();
/// let decoded = decode_ticks(&DecoderConfig::default(), table, ticks);
/// assert_eq!(decoded.message, "SOS");
/// ```
pub fn decode_ticks<I>(config: &DecoderConfig, table: Arc<MorseTable>, ticks: I) -> Decoded
where
    I: IntoIterator<Item = bool>,
{
    let mut session = Session::new(config, table);
    let mut events = Vec::new();
    for active in ticks {
        session.push(active, &mut events);
        if session.is_ended() {
            break;
        }
    }
    session.finish(&mut events);
    Decoded {
        message: session.message().to_owned(),
        events,
    }
}
