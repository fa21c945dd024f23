use tracing::debug;

use crate::common::Result;
use crate::heap::HeapFile;
use crate::query::{start_scan, Condition};
use crate::Database;

/// Delete every record of `relation` matching `condition` (all records if
/// `None`). Returns the number deleted.
pub fn delete(db: &Database, relation: &str, condition: Option<Condition<'_>>) -> Result<usize> {
    let mut heap = HeapFile::open(db, relation)?;

    let deleted = {
        let mut scan = heap.scan()?;
        start_scan(&mut scan, condition)?;

        let mut deleted = 0;
        loop {
            match scan.scan_next() {
                Ok(_) => {
                    scan.delete_record()?;
                    deleted += 1;
                }
                Err(e) if e.is_end_of_file() => break,
                Err(e) => return Err(e),
            }
        }
        scan.end_scan()?;
        deleted
    };

    heap.close()?;
    debug!(relation, deleted, "delete finished");
    Ok(deleted)
}
