pub mod jsonl;
pub mod memory;
pub mod store;
pub mod sync;

pub use jsonl::JsonlRecordStore;
pub use memory::MemoryRecordStore;
pub use store::RecordStore;
pub use sync::{SyncStats, SyncWriter};
