use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::signal::Symbol;

/// ITU table: 26 letters and 10 digits.
const STANDARD: &[(&str, char)] = &[
    (".-", 'A'),
    ("-...", 'B'),
    ("-.-.", 'C'),
    ("-..", 'D'),
    (".", 'E'),
    ("..-.", 'F'),
    ("--.", 'G'),
    ("....", 'H'),
    ("..", 'I'),
    (".---", 'J'),
    ("-.-", 'K'),
    (".-..", 'L'),
    ("--", 'M'),
    ("-.", 'N'),
    ("---", 'O'),
    (".--.", 'P'),
    ("--.-", 'Q'),
    (".-.", 'R'),
    ("...", 'S'),
    ("-", 'T'),
    ("..-", 'U'),
    ("...-", 'V'),
    (".--", 'W'),
    ("-..-", 'X'),
    ("-.--", 'Y'),
    ("--..", 'Z'),
    ("-----", '0'),
    (".----", '1'),
    ("..---", '2'),
    ("...--", '3'),
    ("....-", '4'),
    (".....", '5'),
    ("-....", '6'),
    ("--...", '7'),
    ("---..", '8'),
    ("----.", '9'),
];

/// Units of silence between marks of one character, between characters, between words.
const INTRA_GAP_UNITS: u32 = 1;
const CHAR_GAP_UNITS: u32 = 3;
const WORD_GAP_UNITS: u32 = 7;

/// Ordered sequence of dots and dashes for one character.
///
/// # Example
/// ```
/// use lm_core::morse::CodeWord;
/// let code: CodeWord = "...".parse().unwrap();
/// assert_eq!(code.len(), 3);
/// assert_eq!(code.to_string(), "...");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct CodeWord {
    symbols: Vec<Symbol>,
}

impl CodeWord {
    /// Empty code-word with room for `capacity` symbols.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            symbols: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, symbol: Symbol) {
        self.symbols.push(symbol);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    #[must_use]
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Forme parlée : "dot dot dash".
    ///
    /// # Example
    /// ```
    /// use lm_core::morse::CodeWord;
    /// let code: CodeWord = ".-".parse().unwrap();
    /// assert_eq!(code.spoken(), "dot dash");
    /// ```
    #[must_use]
    pub fn spoken(&self) -> String {
        self.symbols
            .iter()
            .map(|s| s.spoken())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for CodeWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for symbol in &self.symbols {
            write!(f, "{symbol}")?;
        }
        Ok(())
    }
}

impl FromStr for CodeWord {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(CoreError::InvalidCode { code: s.to_owned() });
        }
        let symbols = s
            .chars()
            .map(|c| match c {
                '.' => Ok(Symbol::Dot),
                '-' => Ok(Symbol::Dash),
                _ => Err(CoreError::InvalidCode { code: s.to_owned() }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { symbols })
    }
}

/// Bidirectional code-word ↔ character mapping.
///
/// Built once at startup, then shared read-only between sessions.
///
/// # Example
/// ```
/// use lm_core::morse::{CodeWord, MorseTable};
/// let table = MorseTable::standard();
/// let sos: CodeWord = "...".parse().unwrap();
/// assert_eq!(table.decode(&sos), Some('S'));
/// assert_eq!(table.encode('s'), Some(&sos));
/// ```
#[derive(Clone, Debug)]
pub struct MorseTable {
    to_char: HashMap<CodeWord, char>,
    to_code: HashMap<char, CodeWord>,
}

impl MorseTable {
    /// Table ITU lettres + chiffres.
    #[must_use]
    pub fn standard() -> Self {
        let mut table = Self::empty();
        for &(code, ch) in STANDARD {
            let symbols: Vec<Symbol> = code
                .chars()
                .map(|c| if c == '.' { Symbol::Dot } else { Symbol::Dash })
                .collect();
            let code = CodeWord { symbols };
            table.to_code.insert(ch, code.clone());
            table.to_char.insert(code, ch);
        }
        table
    }

    fn empty() -> Self {
        Self {
            to_char: HashMap::new(),
            to_code: HashMap::new(),
        }
    }

    /// Standard table extended with configured entries.
    ///
    /// # Errors
    /// Returns an error if an extra entry is malformed or collides with an existing one.
    pub fn with_extra(extra: &BTreeMap<String, char>) -> Result<Self, CoreError> {
        let mut table = Self::standard();
        for (code, &ch) in extra {
            table.insert(code.parse()?, ch)?;
        }
        Ok(table)
    }

    /// Add one entry.
    ///
    /// # Errors
    /// Returns [`CoreError::DuplicateEntry`] if the code or the character is already mapped.
    pub fn insert(&mut self, code: CodeWord, ch: char) -> Result<(), CoreError> {
        let ch = ch.to_ascii_uppercase();
        if self.to_char.contains_key(&code) {
            return Err(CoreError::DuplicateEntry {
                entry: code.to_string(),
            });
        }
        if self.to_code.contains_key(&ch) {
            return Err(CoreError::DuplicateEntry {
                entry: ch.to_string(),
            });
        }
        self.to_code.insert(ch, code.clone());
        self.to_char.insert(code, ch);
        Ok(())
    }

    #[must_use]
    pub fn decode(&self, code: &CodeWord) -> Option<char> {
        self.to_char.get(code).copied()
    }

    /// Code-word for `ch`, case-insensitive.
    #[must_use]
    pub fn encode(&self, ch: char) -> Option<&CodeWord> {
        self.to_code.get(&ch.to_ascii_uppercase())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.to_char.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_char.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CodeWord, char)> {
        self.to_char.iter().map(|(code, &ch)| (code, ch))
    }

    /// Key `text` into a tick pattern at `unit` ticks per Morse unit.
    ///
    /// Dots last 1u, dashes 3u, separated by 1u inside a character, 3u between
    /// characters and 7u between words. The pattern starts on the first mark and
    /// ends on the last one.
    ///
    /// # Errors
    /// Returns [`CoreError::Unencodable`] for characters missing from the table.
    ///
    /// # Example
    /// ```
    /// use lm_core::morse::MorseTable;
    /// let ticks = MorseTable::standard().keying("E", 2).unwrap();
    /// assert_eq!(ticks, vec![true, true]);
    /// ```
    pub fn keying(&self, text: &str, unit: u32) -> Result<Vec<bool>, CoreError> {
        let unit = unit.max(1);
        let mut out = Vec::new();
        for (w, word) in text.split_whitespace().enumerate() {
            if w > 0 {
                push_level(&mut out, false, WORD_GAP_UNITS * unit);
            }
            for (c, ch) in word.chars().enumerate() {
                let code = self.encode(ch).ok_or(CoreError::Unencodable(ch))?;
                if c > 0 {
                    push_level(&mut out, false, CHAR_GAP_UNITS * unit);
                }
                for (s, symbol) in code.symbols().iter().enumerate() {
                    if s > 0 {
                        push_level(&mut out, false, INTRA_GAP_UNITS * unit);
                    }
                    push_level(&mut out, true, symbol.units() * unit);
                }
            }
        }
        Ok(out)
    }
}

impl Default for MorseTable {
    fn default() -> Self {
        Self::standard()
    }
}

fn push_level(out: &mut Vec<bool>, active: bool, ticks: u32) {
    out.extend(std::iter::repeat_n(active, ticks as usize));
}
