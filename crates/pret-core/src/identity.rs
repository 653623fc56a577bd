//! # Entity Keys
//!
//! `EntityKey` is the validated identifier a caller uses to ask for a
//! compliance verification. It is checked before any external call, so a
//! malformed key never reaches a data source.
//!
//! Keys come in three shapes, classified by [`EntityKey::kind`]:
//!
//! - **LEI**: 20 characters, 18 alphanumerics followed by two digits.
//! - **CIN**: 21-character corporate identification number, e.g.
//!   `U01112TZ2022PTC039493`.
//! - **Company name**: anything else.

use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// Maximum accepted key length in characters.
pub const MAX_KEY_LEN: usize = 128;

const CIN_LEN: usize = 21;
const LEI_LEN: usize = 20;

/// Company-name suffixes recognized by [`extract_company_name`].
const CORPORATE_SUFFIXES: &[&str] = &[
    "LIMITED",
    "LTD",
    "PRIVATE",
    "PVT",
    "COMPANY",
    "CO",
    "CORP",
    "CORPORATION",
    "INC",
    "LLC",
];

/// How an entity key should be interpreted by a data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyKind {
    /// ISO 17442 Legal Entity Identifier.
    Lei,
    /// Corporate Identification Number.
    Cin,
    /// Free-form registered company name.
    CompanyName,
}

/// A validated entity identifier.
///
/// Trimmed, non-empty, at most [`MAX_KEY_LEN`] characters, no control
/// characters. CINs and LEIs are normalized to upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityKey(String);

impl EntityKey {
    /// Validate and normalize an identifier.
    pub fn new(raw: &str) -> Result<Self, InputError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(InputError::EmptyIdentifier);
        }
        let len = trimmed.chars().count();
        if len > MAX_KEY_LEN {
            return Err(InputError::IdentifierTooLong {
                len,
                max: MAX_KEY_LEN,
            });
        }
        if let Some(position) = trimmed.chars().position(char::is_control) {
            return Err(InputError::ControlCharacter { position });
        }
        let upper = trimmed.to_ascii_uppercase();
        if is_cin(&upper) || is_lei(&upper) {
            return Ok(Self(upper));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Classify the key.
    pub fn kind(&self) -> KeyKind {
        if is_cin(&self.0) {
            KeyKind::Cin
        } else if is_lei(&self.0) {
            KeyKind::Lei
        } else {
            KeyKind::CompanyName
        }
    }
}

impl std::fmt::Display for EntityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EntityKey {
    type Error = InputError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<EntityKey> for String {
    fn from(key: EntityKey) -> String {
        key.0
    }
}

impl std::str::FromStr for EntityKey {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// `[A-Z]\d{5}[A-Z]{2}\d{4}[A-Z]{3}\d{6}`
pub fn is_cin(s: &str) -> bool {
    let b = s.as_bytes();
    if b.len() != CIN_LEN {
        return false;
    }
    let upper = |r: std::ops::Range<usize>| b[r].iter().all(u8::is_ascii_uppercase);
    let digit = |r: std::ops::Range<usize>| b[r].iter().all(u8::is_ascii_digit);
    upper(0..1) && digit(1..6) && upper(6..8) && digit(8..12) && upper(12..15) && digit(15..21)
}

/// `[A-Z0-9]{18}\d{2}`. The check digits are not validated, so an LEI
/// with a wrong checksum is still routed to GLEIF, which answers "not found".
pub fn is_lei(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == LEI_LEN
        && b[..18]
            .iter()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        && b[18..].iter().all(u8::is_ascii_digit)
}

/// First LEI token in free text, if any.
pub fn extract_lei(text: &str) -> Option<String> {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .map(str::to_ascii_uppercase)
        .find(|tok| is_lei(tok))
}

/// First CIN token in free text, if any.
pub fn extract_cin(text: &str) -> Option<String> {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .find(|tok| is_cin(tok))
        .map(str::to_string)
}

/// Best-effort company name from a free-text request.
///
/// Tries, in order: a quoted name; an uppercase run after the word "for";
/// an uppercase run that ends in a corporate suffix such as `LIMITED`.
pub fn extract_company_name(text: &str) -> Option<String> {
    if let Some(name) = quoted(text) {
        return Some(name);
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    if let Some(pos) = words.iter().position(|w| w.eq_ignore_ascii_case("for")) {
        let run: Vec<&str> = words[pos + 1..]
            .iter()
            .map(|w| w.trim_end_matches(['.', '?', '!']))
            .take_while(|w| starts_upper(w))
            .collect();
        if !run.is_empty() {
            return Some(run.join(" "));
        }
    }

    let cleaned: Vec<String> = words
        .iter()
        .map(|w| w.trim_matches(|c: char| matches!(c, '.' | ',' | '?' | '!' | '(' | ')')))
        .map(str::to_ascii_uppercase)
        .collect();
    let end = cleaned
        .iter()
        .rposition(|w| CORPORATE_SUFFIXES.contains(&w.as_str()))?;
    let start = (0..end)
        .rev()
        .take_while(|&i| starts_upper(words[i]))
        .last()
        .unwrap_or(end);
    Some(
        words[start..=end]
            .iter()
            .map(|w| w.trim_end_matches(['.', ',', '?', '!']))
            .collect::<Vec<_>>()
            .join(" "),
    )
}

fn quoted(text: &str) -> Option<String> {
    for quote in ['"', '\''] {
        let mut parts = text.splitn(3, quote);
        let _before = parts.next();
        if let (Some(inner), Some(_)) = (parts.next(), parts.next()) {
            let inner = inner.trim();
            if !inner.is_empty() {
                return Some(inner.to_string());
            }
        }
    }
    None
}

fn starts_upper(word: &str) -> bool {
    word.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}
