//! Query entry points - insert, delete and select over heap files.
//!
//! These are thin compositions of [`HeapFile`](crate::heap::HeapFile) scans
//! and inserts. Attribute layout comes from the caller as [`AttrDesc`]
//! values; resolving names to descriptors (the catalog) happens elsewhere.

mod delete;
mod insert;
mod select;

pub use delete::delete;
pub use insert::insert;
pub use select::select;

use crate::common::{Error, Result};
use crate::heap::{Datatype, HeapFileScan, Operator};

/// Where an attribute lives inside the records of a relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrDesc {
    pub rel_name: String,
    pub attr_name: String,
    /// Byte offset of the field within a record.
    pub offset: usize,
    pub ty: Datatype,
    /// Field width in bytes.
    pub len: usize,
}

impl AttrDesc {
    pub fn new(rel_name: &str, attr_name: &str, offset: usize, ty: Datatype, len: usize) -> Self {
        Self {
            rel_name: rel_name.to_string(),
            attr_name: attr_name.to_string(),
            offset,
            ty,
            len,
        }
    }

    /// Convert a textual value to this attribute's field bytes.
    ///
    /// Integers and floats are parsed and stored little-endian; text is cut
    /// or NUL-padded to the field width.
    ///
    /// # Errors
    /// `Error::InvalidValue` if a numeric value does not parse.
    pub fn encode(&self, value: &str) -> Result<Vec<u8>> {
        let invalid = || Error::InvalidValue {
            attr: self.attr_name.clone(),
            value: value.to_string(),
        };
        let bytes = match self.ty {
            Datatype::Integer => value
                .trim()
                .parse::<i32>()
                .map_err(|_| invalid())?
                .to_le_bytes()
                .to_vec(),
            Datatype::Float => value
                .trim()
                .parse::<f32>()
                .map_err(|_| invalid())?
                .to_le_bytes()
                .to_vec(),
            Datatype::Text => {
                let mut text = value.as_bytes()[..value.len().min(self.len)].to_vec();
                text.resize(self.len, 0);
                text
            }
        };
        Ok(bytes)
    }

    /// The field's bytes within `record`.
    ///
    /// # Errors
    /// `Error::FilterOutOfRange` if the record is too short.
    pub fn extract<'r>(&self, record: &'r [u8]) -> Result<&'r [u8]> {
        record
            .get(self.offset..self.offset + self.len)
            .ok_or(Error::FilterOutOfRange {
                offset: self.offset,
                length: self.len,
                record_len: record.len(),
            })
    }
}

/// A selection predicate: `attr <op> value`.
#[derive(Debug, Clone, Copy)]
pub struct Condition<'c> {
    pub attr: &'c AttrDesc,
    pub op: Operator,
    pub value: &'c str,
}

impl<'c> Condition<'c> {
    pub fn new(attr: &'c AttrDesc, op: Operator, value: &'c str) -> Self {
        Self { attr, op, value }
    }
}

/// Install `condition` (or match-all) on a scan.
fn start_scan(scan: &mut HeapFileScan<'_, '_>, condition: Option<Condition<'_>>) -> Result<()> {
    let Some(cond) = condition else {
        return scan.start_scan(0, 1, Datatype::Text, None, Operator::Eq);
    };
    let bytes = cond.attr.encode(cond.value)?;
    let param = |v: usize| {
        i32::try_from(v).map_err(|_| Error::BadScanParam(format!("{v} out of range")))
    };
    scan.start_scan(
        param(cond.attr.offset)?,
        param(cond.attr.len)?,
        cond.attr.ty,
        Some(&bytes),
        cond.op,
    )
}
