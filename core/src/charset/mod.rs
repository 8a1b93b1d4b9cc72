//! charset/mod.rs
//! Symbol classes and the de-duplicated alphabet the generator samples from.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Built-in symbol classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolClass {
    /// `a-z` then `A-Z`.
    Letters,
    /// `0-9`.
    Digits,
    /// `!@#$%^&*_-`
    SpecialCommon,
    /// Every printable ASCII symbol that is neither a letter, a digit nor a space.
    SpecialAll,
}

impl SymbolClass {
    pub fn symbols(self) -> Vec<char> {
        match self {
            SymbolClass::Letters => ('a'..='z').chain('A'..='Z').collect(),
            SymbolClass::Digits => ('0'..='9').collect(),
            SymbolClass::SpecialCommon => "!@#$%^&*_-".chars().collect(),
            SymbolClass::SpecialAll => (33u8..=126)
                .map(char::from)
                .filter(|c| !c.is_ascii_alphanumeric())
                .collect(),
        }
    }
}

/// Merge symbol sets, keeping the first occurrence of each symbol.
pub fn combine<I, S>(sets: I) -> Vec<char>
where
    I: IntoIterator<Item = S>,
    S: AsRef<[char]>,
{
    let mut out: Vec<char> = Vec::new();
    for set in sets {
        for &c in set.as_ref() {
            if !out.contains(&c) {
                out.push(c);
            }
        }
    }
    out
}

/// Ordered set of distinct symbols.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Alphabet {
    symbols: Vec<char>,
}

impl Alphabet {
    pub fn new(symbols: impl IntoIterator<Item = char>) -> Self {
        let raw: Vec<char> = symbols.into_iter().collect();
        Self { symbols: combine([raw]) }
    }

    pub fn from_classes(classes: &[SymbolClass]) -> Self {
        Self {
            symbols: combine(classes.iter().map(|c| c.symbols())),
        }
    }

    pub fn symbols(&self) -> &[char] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn contains(&self, c: char) -> bool {
        self.symbols.contains(&c)
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::from_classes(&[
            SymbolClass::Letters,
            SymbolClass::Digits,
            SymbolClass::SpecialCommon,
        ])
    }
}

impl From<String> for Alphabet {
    fn from(s: String) -> Self {
        Alphabet::new(s.chars())
    }
}

impl From<&str> for Alphabet {
    fn from(s: &str) -> Self {
        Alphabet::new(s.chars())
    }
}

impl From<Alphabet> for String {
    fn from(a: Alphabet) -> Self {
        a.symbols.into_iter().collect()
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.symbols {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}
