use std::sync::Arc;

use lm_core::config::DecoderConfig;
use lm_core::morse::{CodeWord, MorseTable};
use lm_core::signal::{Gap, Symbol};

/// Decoder state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecoderState {
    /// Aucun symbole en attente.
    Idle,
    /// Au moins un symbole accumulé dans le code-word courant.
    Accumulating,
}

/// One code-word leaving the decoder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Flush {
    /// Code-word as accumulated (truncated to `max_code_len` on overflow).
    pub code: CodeWord,
    /// Table hit, `None` on a miss.
    pub decoded: Option<char>,
    /// Character appended to the message: the hit or the unknown marker.
    pub emitted: char,
    /// A space followed the character (word gap).
    pub word_end: bool,
}

impl Flush {
    #[must_use]
    pub fn is_miss(&self) -> bool {
        self.decoded.is_none()
    }
}

/// Morse state machine: symbols in, characters out.
///
/// Idle → Accumulating on the first dot/dash; a char or word gap flushes the
/// code-word through the table and returns to Idle. Gaps seen while Idle have
/// no effect, so two word gaps in a row yield a single space.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use lm_decode::decoder::MorseDecoder;
/// use lm_core::morse::MorseTable;
/// use lm_core::signal::{Gap, Symbol};
///
/// let mut dec = MorseDecoder::new(Arc::new(MorseTable::standard()), 8, '?');
/// dec.on_symbol(Symbol::Dash);
/// let flush = dec.on_gap(Gap::Char).unwrap();
/// assert_eq!(flush.emitted, 'T');
/// assert_eq!(dec.message(), "T");
/// ```
#[derive(Debug)]
pub struct MorseDecoder {
    table: Arc<MorseTable>,
    code: CodeWord,
    overflowed: bool,
    max_code_len: usize,
    unknown_marker: char,
    message: String,
    misses: u32,
}

impl MorseDecoder {
    #[must_use]
    pub fn new(table: Arc<MorseTable>, max_code_len: usize, unknown_marker: char) -> Self {
        let max_code_len = max_code_len.max(1);
        Self {
            table,
            code: CodeWord::with_capacity(max_code_len),
            overflowed: false,
            max_code_len,
            unknown_marker,
            message: String::new(),
            misses: 0,
        }
    }

    #[must_use]
    pub fn from_config(config: &DecoderConfig, table: Arc<MorseTable>) -> Self {
        Self::new(table, config.max_code_len, config.unknown_marker)
    }

    #[must_use]
    pub fn state(&self) -> DecoderState {
        if self.code.is_empty() {
            DecoderState::Idle
        } else {
            DecoderState::Accumulating
        }
    }

    /// Code-word accumulated so far.
    #[must_use]
    pub fn pending(&self) -> &CodeWord {
        &self.code
    }

    /// Decoded Message so far.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Code-words that missed the table.
    #[must_use]
    pub fn misses(&self) -> u32 {
        self.misses
    }

    pub fn on_symbol(&mut self, symbol: Symbol) {
        if self.code.len() >= self.max_code_len {
            if !self.overflowed {
                log::debug!("code-word > {} symboles, sera inconnu", self.max_code_len);
            }
            self.overflowed = true;
            return;
        }
        self.code.push(symbol);
    }

    /// Apply a classified gap. Returns the flushed code-word on a boundary.
    pub fn on_gap(&mut self, gap: Gap) -> Option<Flush> {
        if !gap.is_boundary() {
            return None;
        }
        if self.state() == DecoderState::Idle {
            log::trace!("{gap:?} ignoré : aucun code-word en attente");
            return None;
        }
        Some(self.flush(gap == Gap::Word))
    }

    /// End of session: flush a pending code-word as on a char gap, then trim
    /// trailing spaces from the message.
    pub fn finish(&mut self) -> Option<Flush> {
        let flush = (self.state() == DecoderState::Accumulating).then(|| self.flush(false));
        let trimmed = self.message.trim_end().len();
        self.message.truncate(trimmed);
        flush
    }

    fn flush(&mut self, word_end: bool) -> Flush {
        let code = std::mem::replace(&mut self.code, CodeWord::with_capacity(self.max_code_len));
        let decoded = if self.overflowed {
            None
        } else {
            self.table.decode(&code)
        };
        self.overflowed = false;

        let emitted = decoded.unwrap_or(self.unknown_marker);
        if decoded.is_none() {
            self.misses += 1;
            log::warn!("Code-word inconnu : {code}");
        } else {
            log::debug!("{code} → {emitted}");
        }
        self.message.push(emitted);
        if word_end {
            self.message.push(' ');
        }
        Flush {
            code,
            decoded,
            emitted,
            word_end,
        }
    }
}
