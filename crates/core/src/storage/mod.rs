pub mod json_file;
pub mod memory;
pub mod supabase;
pub mod traits;

use crate::models::snapshot::DailySnapshot;

/// Upsert `rows` into `table` keyed by date: existing dates are overwritten,
/// new dates inserted, and the table is left sorted ascending.
pub(crate) fn merge_snapshots(table: &mut Vec<DailySnapshot>, rows: &[DailySnapshot]) {
    for row in rows {
        match table.binary_search_by_key(&row.date, |s| s.date) {
            Ok(idx) => table[idx] = row.clone(),
            Err(idx) => table.insert(idx, row.clone()),
        }
    }
}
