//! Reader and writer for PHP's `serialize()` format.
//!
//! Softaculous publishes its script list in this format and expects the
//! autoinstall parameter to be a serialized array, so only the scalar and
//! array tags are supported. Objects and references are rejected.

use std::fmt::Write as _;

use thiserror::Error;

/// Deepest array nesting accepted from remote input
pub const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum PhpValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Arrays keep insertion order, like PHP's ordered hash maps
    Array(Vec<(PhpKey, PhpValue)>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PhpKey {
    Int(i64),
    Str(String),
}

impl PhpKey {
    fn matches(&self, key: &str) -> bool {
        match self {
            PhpKey::Str(s) => s == key,
            PhpKey::Int(i) => key.parse::<i64>().map(|k| k == *i).unwrap_or(false),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PhpKey::Int(i) => Some(*i),
            // PHP normalises numeric string keys to ints, emulate that on read
            PhpKey::Str(s) => s.parse().ok(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhpSerializeError {
    #[error("unexpected end of input at byte {0}")]
    UnexpectedEof(usize),

    #[error("unexpected byte {found:?} at {pos}, expected {expected}")]
    Unexpected {
        pos: usize,
        found: char,
        expected: &'static str,
    },

    #[error("unsupported type tag {tag:?} at byte {pos}")]
    UnsupportedType { tag: char, pos: usize },

    #[error("invalid number at byte {0}")]
    InvalidNumber(usize),

    #[error("array key at byte {0} is neither int nor string")]
    InvalidKey(usize),

    #[error("trailing data at byte {0}")]
    TrailingData(usize),

    #[error("arrays nested too deeply at byte {0}")]
    TooDeep(usize),
}

impl PhpValue {
    /// Array of string values, as used for the autoinstall payload
    pub fn string_map<K, V, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        PhpValue::Array(
            pairs
                .into_iter()
                .map(|(k, v)| (PhpKey::Str(k.into()), PhpValue::Str(v.into())))
                .collect(),
        )
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PhpValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[(PhpKey, PhpValue)]> {
        match self {
            PhpValue::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Look up an array member by key
    pub fn get(&self, key: &str) -> Option<&PhpValue> {
        self.as_array()?
            .iter()
            .find(|(k, _)| k.matches(key))
            .map(|(_, v)| v)
    }

    /// Human readable rendering of a scalar, `None` for arrays and null
    pub fn to_text(&self) -> Option<String> {
        match self {
            PhpValue::Null | PhpValue::Array(_) => None,
            PhpValue::Bool(b) => Some(if *b { "1" } else { "" }.to_string()),
            PhpValue::Int(i) => Some(i.to_string()),
            PhpValue::Float(f) => Some(f.to_string()),
            PhpValue::Str(s) => Some(s.clone()),
        }
    }
}

pub fn to_string(value: &PhpValue) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut String, value: &PhpValue) {
    match value {
        PhpValue::Null => out.push_str("N;"),
        PhpValue::Bool(b) => {
            let _ = write!(out, "b:{};", u8::from(*b));
        }
        PhpValue::Int(i) => {
            let _ = write!(out, "i:{};", i);
        }
        PhpValue::Float(f) => {
            if f.is_nan() {
                out.push_str("d:NAN;");
            } else if f.is_infinite() {
                out.push_str(if *f > 0.0 { "d:INF;" } else { "d:-INF;" });
            } else {
                let _ = write!(out, "d:{};", f);
            }
        }
        PhpValue::Str(s) => write_str(out, s),
        PhpValue::Array(items) => {
            let _ = write!(out, "a:{}:{{", items.len());
            for (key, item) in items {
                match key {
                    PhpKey::Int(i) => {
                        let _ = write!(out, "i:{};", i);
                    }
                    PhpKey::Str(s) => write_str(out, s),
                }
                write_value(out, item);
            }
            out.push('}');
        }
    }
}

fn write_str(out: &mut String, s: &str) {
    // Length is the byte length, not the char count
    let _ = write!(out, "s:{}:\"{}\";", s.len(), s);
}

pub fn from_str(input: &str) -> Result<PhpValue, PhpSerializeError> {
    let mut parser = Parser {
        input: input.trim().as_bytes(),
        pos: 0,
    };
    let value = parser.value(0)?;
    if parser.pos != parser.input.len() {
        return Err(PhpSerializeError::TrailingData(parser.pos));
    }
    Ok(value)
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn next_byte(&mut self) -> Result<u8, PhpSerializeError> {
        let b = *self
            .input
            .get(self.pos)
            .ok_or(PhpSerializeError::UnexpectedEof(self.pos))?;
        self.pos += 1;
        Ok(b)
    }

    fn expect(&mut self, wanted: u8, expected: &'static str) -> Result<(), PhpSerializeError> {
        let pos = self.pos;
        let found = self.next_byte()?;
        if found != wanted {
            return Err(PhpSerializeError::Unexpected {
                pos,
                found: found as char,
                expected,
            });
        }
        Ok(())
    }

    /// Bytes up to (not including) `delim`; the delimiter is consumed
    fn read_until(&mut self, delim: u8) -> Result<&'a str, PhpSerializeError> {
        let start = self.pos;
        let len = self.input[start..]
            .iter()
            .position(|&b| b == delim)
            .ok_or(PhpSerializeError::UnexpectedEof(self.input.len()))?;
        self.pos = start + len + 1;
        std::str::from_utf8(&self.input[start..start + len])
            .map_err(|_| PhpSerializeError::InvalidNumber(start))
    }

    fn read_number<T: std::str::FromStr>(&mut self, delim: u8) -> Result<T, PhpSerializeError> {
        let start = self.pos;
        self.read_until(delim)?
            .trim()
            .parse()
            .map_err(|_| PhpSerializeError::InvalidNumber(start))
    }

    fn value(&mut self, depth: usize) -> Result<PhpValue, PhpSerializeError> {
        let tag_pos = self.pos;
        let tag = self.next_byte()?;
        match tag {
            b'N' => {
                self.expect(b';', "';'")?;
                Ok(PhpValue::Null)
            }
            b'b' => {
                self.expect(b':', "':'")?;
                let start = self.pos;
                match self.read_until(b';')? {
                    "0" => Ok(PhpValue::Bool(false)),
                    "1" => Ok(PhpValue::Bool(true)),
                    _ => Err(PhpSerializeError::InvalidNumber(start)),
                }
            }
            b'i' => {
                self.expect(b':', "':'")?;
                Ok(PhpValue::Int(self.read_number(b';')?))
            }
            b'd' => {
                self.expect(b':', "':'")?;
                Ok(PhpValue::Float(self.read_number(b';')?))
            }
            b's' => {
                self.expect(b':', "':'")?;
                let len: usize = self.read_number(b':')?;
                self.expect(b'"', "'\"'")?;
                let end = self.pos + len;
                if end > self.input.len() {
                    return Err(PhpSerializeError::UnexpectedEof(self.input.len()));
                }
                let text = String::from_utf8_lossy(&self.input[self.pos..end]).into_owned();
                self.pos = end;
                self.expect(b'"', "'\"'")?;
                self.expect(b';', "';'")?;
                Ok(PhpValue::Str(text))
            }
            b'a' => {
                if depth >= MAX_DEPTH {
                    return Err(PhpSerializeError::TooDeep(tag_pos));
                }
                self.expect(b':', "':'")?;
                let count: usize = self.read_number(b':')?;
                self.expect(b'{', "'{'")?;
                let mut items = Vec::with_capacity(count.min(4096));
                for _ in 0..count {
                    let key_pos = self.pos;
                    let key = match self.value(depth + 1)? {
                        PhpValue::Int(i) => PhpKey::Int(i),
                        PhpValue::Str(s) => PhpKey::Str(s),
                        _ => return Err(PhpSerializeError::InvalidKey(key_pos)),
                    };
                    let value = self.value(depth + 1)?;
                    items.push((key, value));
                }
                self.expect(b'}', "'}'")?;
                Ok(PhpValue::Array(items))
            }
            other => Err(PhpSerializeError::UnsupportedType {
                tag: other as char,
                pos: tag_pos,
            }),
        }
    }
}
