pub mod cell;
pub mod record;
pub mod snapshot;

pub use cell::CellValue;
pub use record::{resolve_records, CaseRecord, RawRow};
pub use snapshot::{parse_snapshot, SnapshotSource};
