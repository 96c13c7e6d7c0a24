use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A byte pattern with a wildcard mask and a constant result offset.
///
/// A window matches when `(window_byte & mask_byte) == pattern_byte` holds at
/// every position; the stored bytes are pre-masked so that comparison is all
/// a match check needs. The offset is added to the matched address on a
/// successful scan, letting one pattern locate a fixed-size code region and
/// report a specific operand's address within it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    bytes: Vec<u8>,
    mask: Vec<u8>,
    offset: i64,
}

impl Pattern {
    /// Build a pattern from explicit bytes and mask of equal, non-zero
    /// length.
    pub fn new(bytes: impl Into<Vec<u8>>, mask: impl Into<Vec<u8>>, offset: i64) -> Result<Self> {
        let bytes = bytes.into();
        let mask = mask.into();
        if bytes.is_empty() {
            return Err(Error::InvalidPattern("pattern is empty".to_string()));
        }
        if bytes.len() != mask.len() {
            return Err(Error::InvalidPattern(format!(
                "pattern has {} bytes but {} mask bytes",
                bytes.len(),
                mask.len()
            )));
        }
        let bytes = bytes.iter().zip(&mask).map(|(b, m)| b & m).collect();
        Ok(Self {
            bytes,
            mask,
            offset,
        })
    }

    /// Build an exact-match pattern with no wildcards.
    pub fn exact(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        let mask = vec![0xFF; bytes.len()];
        Self::new(bytes, mask, 0)
    }

    /// Parse a hex pattern such as `"48 8B 0D ?? ?? ?? ?? 8B 4?"`.
    ///
    /// Whitespace is ignored and `?` wildcards a single nibble, so `??`
    /// wildcards a whole byte and `4?` matches `0x40..=0x4F`. The text must
    /// contain a whole number of bytes.
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_with_offset(text, 0)
    }

    /// Same as [`Pattern::parse`], with a result offset attached.
    pub fn parse_with_offset(text: &str, offset: i64) -> Result<Self> {
        let mut bytes = Vec::new();
        let mut mask = Vec::new();
        let mut high: Option<(u8, u8)> = None;

        for c in text.chars() {
            if c.is_whitespace() {
                continue;
            }
            let (value, nibble_mask) = if c == '?' {
                (0, 0)
            } else {
                let digit = c.to_digit(16).ok_or_else(|| {
                    Error::InvalidPattern(format!("invalid character '{c}' in pattern"))
                })? as u8;
                (digit, 0xF)
            };

            match high.take() {
                None => high = Some((value, nibble_mask)),
                Some((high_value, high_mask)) => {
                    bytes.push((high_value << 4) | value);
                    mask.push((high_mask << 4) | nibble_mask);
                }
            }
        }

        if high.is_some() {
            return Err(Error::InvalidPattern(
                "pattern ends halfway through a byte".to_string(),
            ));
        }
        if bytes.is_empty() {
            return Err(Error::InvalidPattern("pattern is empty".to_string()));
        }

        Ok(Self {
            bytes,
            mask,
            offset,
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false; empty patterns can't be constructed.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mask(&self) -> &[u8] {
        &self.mask
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Whether the pattern matches at the start of `window`.
    pub fn matches(&self, window: &[u8]) -> bool {
        window.len() >= self.bytes.len()
            && self
                .bytes
                .iter()
                .zip(&self.mask)
                .zip(window)
                .all(|((&byte, &mask), &seen)| (seen & mask) == byte)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (&byte, &mask)) in self.bytes.iter().zip(&self.mask).enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            for shift in [4u8, 0] {
                let nibble_mask = (mask >> shift) & 0xF;
                if nibble_mask == 0xF {
                    write!(f, "{:X}", (byte >> shift) & 0xF)?;
                } else {
                    f.write_str("?")?;
                }
            }
        }
        Ok(())
    }
}

impl FromStr for Pattern {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        Self::parse(text)
    }
}
