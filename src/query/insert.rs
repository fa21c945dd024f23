use crate::common::{Error, Result, Rid};
use crate::heap::HeapFile;
use crate::query::AttrDesc;
use crate::Database;

/// Insert one record into the relation described by `schema`.
///
/// `values` pairs attribute names with textual values; every attribute of
/// the schema needs one, in any order. The record is as long as the
/// furthest field end; bytes no field covers are zero.
///
/// # Errors
/// - `Error::MissingAttribute` if an attribute has no value
/// - `Error::InvalidValue` if a numeric value does not parse
/// - `Error::BadScanParam` if `schema` is empty
pub fn insert(db: &Database, schema: &[AttrDesc], values: &[(&str, &str)]) -> Result<Rid> {
    let relation = schema
        .first()
        .map(|a| a.rel_name.as_str())
        .ok_or_else(|| Error::BadScanParam("empty schema".to_string()))?;

    let len = schema.iter().map(|a| a.offset + a.len).max().unwrap_or(0);
    let mut record = vec![0u8; len];
    for attr in schema {
        let (_, value) = values
            .iter()
            .find(|(name, _)| *name == attr.attr_name)
            .ok_or_else(|| Error::MissingAttribute(attr.attr_name.clone()))?;
        let bytes = attr.encode(value)?;
        let n = bytes.len().min(attr.len);
        record[attr.offset..attr.offset + n].copy_from_slice(&bytes[..n]);
    }

    let mut heap = HeapFile::open(db, relation)?;
    let rid = heap.inserter().insert_record(&record)?;
    heap.close()?;
    Ok(rid)
}
