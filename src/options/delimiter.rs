//! Delimiters for text row output.

use core::fmt::{self, Display, Formatter};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A delimiter written between fields or after each row of text output.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Delimiter(String);

impl Delimiter {
    /// Default delimiter between fields.
    pub const DEFAULT_FIELD: &str = "\t";
    /// Default delimiter after each row.
    pub const DEFAULT_ENTRY: &str = "\n";

    /// Create from a literal (already-unescaped) string.
    #[must_use]
    pub fn from_literal(s: &str) -> Self {
        Self(s.to_string())
    }

    /// Create from an escaped string such as `\t` or `\x1f`.
    #[must_use]
    pub fn from_escaped(s: &str) -> Self {
        Self(Self::unescape(s))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get a quoted representation so whitespace delimiters stay visible.
    #[must_use]
    pub fn display_quoted(&self) -> String {
        format!("{:?}", self.0)
    }

    fn unescape(s: &str) -> String {
        let mut result = String::with_capacity(s.len());
        let mut chars = s.chars();

        while let Some(ch) = chars.next() {
            if ch != '\\' {
                result.push(ch);
                continue;
            }
            match chars.next() {
                Some('0') => result.push('\0'),
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('t') => result.push('\t'),
                Some('x') => {
                    let hex: String = chars.by_ref().take(2).collect();
                    match u8::from_str_radix(&hex, 16) {
                        Ok(byte) if byte.is_ascii() => result.push(char::from(byte)),
                        _ => {
                            result.push_str("\\x");
                            result.push_str(&hex);
                        }
                    }
                }
                Some(other) => result.push(other),
                None => result.push('\\'),
            }
        }

        result
    }
}

impl Default for Delimiter {
    fn default() -> Self {
        Self::from_literal(Self::DEFAULT_FIELD)
    }
}

impl Display for Delimiter {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_quoted())
    }
}

impl From<&str> for Delimiter {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for Delimiter {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for Delimiter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Delimiter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self)
    }
}
