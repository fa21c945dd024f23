//! Scan predicates - typed decoding and comparison of record fields.
//!
//! A predicate compares a fixed window `record[offset..offset + length]`
//! against a filter value of the same declared type:
//! - `Integer` - 4-byte little-endian `i32`
//! - `Float` - 4-byte little-endian `f32`
//! - `Text` - `length` bytes compared like `strncmp` (stops at NUL)

use std::cmp::Ordering;
use std::fmt;

use crate::common::config::WindowPolicy;
use crate::common::{Error, Result};

/// Declared type of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Datatype {
    Integer,
    Float,
    Text,
}

impl Datatype {
    /// Width every field of this type must have, `None` for text.
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            Datatype::Integer => Some(std::mem::size_of::<i32>()),
            Datatype::Float => Some(std::mem::size_of::<f32>()),
            Datatype::Text => None,
        }
    }
}

/// Comparison applied to `field <op> filter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Lt,
    Lte,
    Eq,
    Gte,
    Gt,
    Ne,
}

impl Operator {
    /// Whether an ordering of field against filter satisfies the operator.
    ///
    /// `None` means the values are unordered (a NaN float); only `Ne` holds.
    pub fn accepts(self, ordering: Option<Ordering>) -> bool {
        let Some(ordering) = ordering else {
            return self == Operator::Ne;
        };
        match self {
            Operator::Lt => ordering == Ordering::Less,
            Operator::Lte => ordering != Ordering::Greater,
            Operator::Eq => ordering == Ordering::Equal,
            Operator::Gte => ordering != Ordering::Less,
            Operator::Gt => ordering == Ordering::Greater,
            Operator::Ne => ordering != Ordering::Equal,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Eq => "=",
            Operator::Gte => ">=",
            Operator::Gt => ">",
            Operator::Ne => "<>",
        };
        f.write_str(symbol)
    }
}

/// A decoded field or filter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i32),
    Float(f32),
    Text(Vec<u8>),
}

impl Value {
    /// Decode `bytes` as `ty`. Numeric types read the first 4 bytes.
    fn decode(ty: Datatype, bytes: &[u8]) -> Value {
        match ty {
            Datatype::Integer => Value::Integer(i32::from_le_bytes(le4(bytes))),
            Datatype::Float => Value::Float(f32::from_le_bytes(le4(bytes))),
            Datatype::Text => Value::Text(bytes.to_vec()),
        }
    }

    fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Text(a), Value::Text(b)) => Some(compare_text(a, b)),
            _ => None,
        }
    }
}

fn le4(bytes: &[u8]) -> [u8; 4] {
    let mut out = [0u8; 4];
    out.copy_from_slice(&bytes[..4]);
    out
}

/// `strncmp` over two windows of equal length.
fn compare_text(a: &[u8], b: &[u8]) -> Ordering {
    for (&x, &y) in a.iter().zip(b) {
        if x != y {
            return x.cmp(&y);
        }
        if x == 0 {
            break;
        }
    }
    Ordering::Equal
}

/// A validated predicate over one field of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanFilter {
    offset: usize,
    length: usize,
    ty: Datatype,
    op: Operator,
    value: Value,
}

impl ScanFilter {
    /// Build a filter comparing `length` bytes at `offset` with `filter`.
    ///
    /// A text filter shorter than `length` is padded with NULs, which under
    /// `strncmp` rules is the same as a shorter string.
    ///
    /// # Errors
    /// `Error::BadScanParam` if `offset < 0`, `length < 1`, a numeric
    /// `length` differs from the type's width, or a numeric filter is
    /// shorter than `length`.
    pub fn new(
        offset: i32,
        length: i32,
        ty: Datatype,
        filter: &[u8],
        op: Operator,
    ) -> Result<Self> {
        let offset = usize::try_from(offset)
            .map_err(|_| Error::BadScanParam(format!("negative offset {offset}")))?;
        if length < 1 {
            return Err(Error::BadScanParam(format!("length {length} < 1")));
        }
        let length = length as usize;

        let value = match ty.fixed_width() {
            Some(width) if length != width => {
                return Err(Error::BadScanParam(format!(
                    "{ty:?} field must be {width} bytes, got {length}"
                )));
            }
            Some(_) if filter.len() < length => {
                return Err(Error::BadScanParam(format!(
                    "filter has {} bytes, field has {length}",
                    filter.len()
                )));
            }
            Some(_) => Value::decode(ty, filter),
            None => {
                let mut text = filter[..filter.len().min(length)].to_vec();
                text.resize(length, 0);
                Value::Text(text)
            }
        };

        Ok(Self {
            offset,
            length,
            ty,
            op,
            value,
        })
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn datatype(&self) -> Datatype {
        self.ty
    }

    pub fn operator(&self) -> Operator {
        self.op
    }

    /// Test a record against the filter.
    ///
    /// # Errors
    /// `Error::FilterOutOfRange` if the window runs past the end of the
    /// record and `policy` is [`WindowPolicy::Error`]; under
    /// [`WindowPolicy::NoMatch`] such a record simply does not match.
    pub fn matches(&self, record: &[u8], policy: WindowPolicy) -> Result<bool> {
        let end = self.offset + self.length;
        if end > record.len() {
            return match policy {
                WindowPolicy::NoMatch => Ok(false),
                WindowPolicy::Error => Err(Error::FilterOutOfRange {
                    offset: self.offset,
                    length: self.length,
                    record_len: record.len(),
                }),
            };
        }

        let field = Value::decode(self.ty, &record[self.offset..end]);
        Ok(self.op.accepts(field.compare(&self.value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_filter(op: Operator, value: i32) -> ScanFilter {
        ScanFilter::new(0, 4, Datatype::Integer, &value.to_le_bytes(), op).unwrap()
    }

    #[test]
    fn test_operator_table() {
        use Ordering::*;
        let cases = [
            (Operator::Lt, [true, false, false]),
            (Operator::Lte, [true, true, false]),
            (Operator::Eq, [false, true, false]),
            (Operator::Gte, [false, true, true]),
            (Operator::Gt, [false, false, true]),
            (Operator::Ne, [true, false, true]),
        ];
        for (op, expected) in cases {
            let got = [Less, Equal, Greater].map(|o| op.accepts(Some(o)));
            assert_eq!(got, expected, "operator {op}");
        }
    }

    #[test]
    fn test_integer_filter() {
        let gt = int_filter(Operator::Gt, 50);
        assert!(gt.matches(&51i32.to_le_bytes(), WindowPolicy::NoMatch).unwrap());
        assert!(!gt.matches(&50i32.to_le_bytes(), WindowPolicy::NoMatch).unwrap());

        // No overflow on extreme values
        let lt = int_filter(Operator::Lt, i32::MAX);
        assert!(lt.matches(&i32::MIN.to_le_bytes(), WindowPolicy::NoMatch).unwrap());
    }

    #[test]
    fn test_float_filter_and_nan() {
        let filter =
            ScanFilter::new(0, 4, Datatype::Float, &1.5f32.to_le_bytes(), Operator::Gte).unwrap();
        assert!(filter.matches(&2.0f32.to_le_bytes(), WindowPolicy::NoMatch).unwrap());
        assert!(!filter.matches(&1.0f32.to_le_bytes(), WindowPolicy::NoMatch).unwrap());
        assert!(!filter.matches(&f32::NAN.to_le_bytes(), WindowPolicy::NoMatch).unwrap());

        let ne =
            ScanFilter::new(0, 4, Datatype::Float, &1.5f32.to_le_bytes(), Operator::Ne).unwrap();
        assert!(ne.matches(&f32::NAN.to_le_bytes(), WindowPolicy::NoMatch).unwrap());
    }

    #[test]
    fn test_text_filter_stops_at_nul() {
        let filter = ScanFilter::new(2, 6, Datatype::Text, b"abc", Operator::Eq).unwrap();
        assert!(filter.matches(b"..abc\0zz", WindowPolicy::NoMatch).unwrap());
        assert!(!filter.matches(b"..abcdzz", WindowPolicy::NoMatch).unwrap());

        let lt = ScanFilter::new(0, 3, Datatype::Text, b"bob", Operator::Lt).unwrap();
        assert!(lt.matches(b"amy", WindowPolicy::NoMatch).unwrap());
        assert!(!lt.matches(b"cal", WindowPolicy::NoMatch).unwrap());
    }

    #[test]
    fn test_window_past_record_end() {
        let filter = ScanFilter::new(4, 4, Datatype::Integer, &[0; 4], Operator::Eq).unwrap();
        let record = [0u8; 7];
        assert!(!filter.matches(&record, WindowPolicy::NoMatch).unwrap());
        assert!(matches!(
            filter.matches(&record, WindowPolicy::Error),
            Err(Error::FilterOutOfRange {
                offset: 4,
                length: 4,
                record_len: 7
            })
        ));
        // Window ending exactly at the record end is fine
        assert!(filter.matches(&[0u8; 8], WindowPolicy::Error).unwrap());
    }

    #[test]
    fn test_bad_parameters() {
        let bad = [
            ScanFilter::new(-1, 4, Datatype::Integer, &[0; 4], Operator::Eq),
            ScanFilter::new(0, 0, Datatype::Text, b"x", Operator::Eq),
            ScanFilter::new(0, 8, Datatype::Integer, &[0; 8], Operator::Eq),
            ScanFilter::new(0, 2, Datatype::Float, &[0; 2], Operator::Eq),
            ScanFilter::new(0, 4, Datatype::Integer, &[0; 3], Operator::Eq),
        ];
        for result in bad {
            assert!(matches!(result, Err(Error::BadScanParam(_))));
        }
    }
}
