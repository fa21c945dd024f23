use tracing::debug;

use crate::common::{Error, Result};
use crate::heap::{create_heap_file, HeapFile};
use crate::query::{start_scan, AttrDesc, Condition};
use crate::Database;

/// Copy the projection of every matching record into heap file `result`.
///
/// Projected fields are laid end to end in `projection` order. The result
/// file is created if it does not exist. Returns the number of records
/// written.
///
/// # Errors
/// `Error::BadScanParam` if the projection is empty, spans more than one
/// relation, or targets the relation being scanned.
pub fn select(
    db: &Database,
    result: &str,
    projection: &[AttrDesc],
    condition: Option<Condition<'_>>,
) -> Result<usize> {
    let relation = projection
        .first()
        .map(|a| a.rel_name.as_str())
        .ok_or_else(|| Error::BadScanParam("empty projection".to_string()))?;

    let foreign = projection.iter().any(|a| a.rel_name != relation)
        || condition.is_some_and(|c| c.attr.rel_name != relation);
    if foreign {
        return Err(Error::BadScanParam(
            "projection and condition must name one relation".to_string(),
        ));
    }
    if result == relation {
        return Err(Error::BadScanParam(format!(
            "cannot select {relation} into itself"
        )));
    }

    if !db.files().exists(result) {
        create_heap_file(db, result)?;
    }

    let width: usize = projection.iter().map(|a| a.len).sum();
    let mut input = HeapFile::open(db, relation)?;
    let mut output = HeapFile::open(db, result)?;

    let selected = {
        let mut scan = input.scan()?;
        start_scan(&mut scan, condition)?;
        let mut inserter = output.inserter();

        let mut selected = 0;
        for item in scan.records() {
            let (_, record) = item?;
            let mut projected = Vec::with_capacity(width);
            for attr in projection {
                projected.extend_from_slice(attr.extract(&record)?);
            }
            inserter.insert_record(&projected)?;
            selected += 1;
        }
        selected
    };

    output.close()?;
    input.close()?;
    debug!(relation, result, selected, "select finished");
    Ok(selected)
}
