//! Sentence framing and tokenizing
//!
//! On the wire an NMEA sentence is `$<body>*HH\r\n`, where `HH` is the
//! 8-bit XOR of every byte of `<body>` rendered as two uppercase hex digits.
//! [`Sentence`] is the tokenized form of a received line: the framing is
//! stripped and the body is split on commas, so parsers index fields
//! through bounds-checked accessors instead of slicing raw strings.

use std::fmt;

use crate::error::ParseError;

/// XOR-fold every byte of a sentence body
pub fn checksum(body: &str) -> u8 {
    body.bytes().fold(0, |acc, b| acc ^ b)
}

/// Frame a sentence body as `$<body>*HH\r\n`
pub fn frame(body: &str) -> String {
    format!("${}*{:02X}\r\n", body, checksum(body))
}

/// Verify the `*HH` suffix of a framed sentence against its body
///
/// Lines without a checksum suffix are rejected with [`ParseError::Empty`]
/// if they carry no body, or a mismatch against `0x00` otherwise.
pub fn verify_checksum(line: &str) -> Result<(), ParseError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let line = line.strip_prefix('$').unwrap_or(line);
    let Some(star) = line.rfind('*') else {
        if line.is_empty() {
            return Err(ParseError::Empty);
        }
        return Err(ParseError::ChecksumMismatch {
            expected: checksum(line),
            actual: 0,
        });
    };

    let (body, suffix) = (&line[..star], &line[star + 1..]);
    let expected = checksum(body);
    let actual = u8::from_str_radix(suffix.trim(), 16).unwrap_or(!expected);
    if actual == expected {
        Ok(())
    } else {
        Err(ParseError::ChecksumMismatch { expected, actual })
    }
}

/// Parse a numeric field, treating anything unparsable as zero
///
/// Traffic reports degrade gracefully: a garbled number costs precision,
/// never the whole report.
pub fn lenient_f64(field: &str) -> f64 {
    match field.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Integer flavour of [`lenient_f64`], truncating toward zero
pub fn lenient_i32(field: &str) -> i32 {
    lenient_f64(field) as i32
}

/// A tokenized NMEA sentence: talker in field 0, payload fields after it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    fields: Vec<String>,
}

impl Sentence {
    /// Tokenize one received line
    ///
    /// Leading `$`, trailing `*HH` and line terminators are stripped; the
    /// checksum itself is not verified (see [`verify_checksum`]).
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let line = line.trim();
        let line = line.strip_prefix('$').unwrap_or(line);
        let body = match line.rfind('*') {
            Some(star) => &line[..star],
            None => line,
        };

        if body.is_empty() {
            return Err(ParseError::Empty);
        }

        Ok(Self {
            fields: body.split(',').map(str::to_string).collect(),
        })
    }

    /// Build a sentence from already-split fields
    pub fn from_fields<I, S>(fields: I) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        match fields.first() {
            Some(talker) if !talker.is_empty() => {}
            _ => return Err(ParseError::Empty),
        }
        Ok(Self { fields })
    }

    /// Talker/sentence identifier, e.g. `PFLAA`
    pub fn talker(&self) -> &str {
        &self.fields[0]
    }

    /// Number of fields including the talker
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Always false; a sentence has at least its talker field
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// All fields including the talker
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Field at `index`, if present
    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    /// Field at `index` if present and non-empty
    pub fn optional(&self, index: usize) -> Option<&str> {
        self.field(index).filter(|f| !f.is_empty())
    }

    /// Field at `index`, or an error if it is missing or empty
    pub fn required(&self, index: usize) -> Result<&str, ParseError> {
        self.optional(index).ok_or_else(|| ParseError::MissingField {
            talker: self.talker().to_string(),
            index,
        })
    }

    /// Field at `index`, with missing fields read as empty
    pub fn field_or_empty(&self, index: usize) -> &str {
        self.field(index).unwrap_or("")
    }

    /// Ensure the sentence carries at least `expected` fields
    pub fn require_len(&self, expected: usize) -> Result<(), ParseError> {
        if self.len() < expected {
            return Err(ParseError::TooFewFields {
                talker: self.talker().to_string(),
                expected,
                actual: self.len(),
            });
        }
        Ok(())
    }

    /// Ensure the sentence belongs to the given talker
    pub fn expect_talker(&self, expected: &'static str) -> Result<(), ParseError> {
        if self.talker() != expected {
            return Err(ParseError::UnexpectedTalker {
                expected,
                actual: self.talker().to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fields.join(","))
    }
}
