//! # seqroll-store
//!
//! **Batch store**: durable, digest-keyed storage for [`BatchRecord`]s.
//!
//! Two backends implement [`BatchStore`]:
//! - [`FileBatchStore`]: one JSON file per record, atomic writes, verified on open
//! - [`MemoryBatchStore`]: same semantics, nothing persisted
//!
//! Both keep a transaction-hash index so fraud-proof lookups do not scan
//! every record, and both refuse to store a record whose key is not the
//! digest of its contents.
//!
//! [`BatchRecord`]: seqroll_types::BatchRecord

pub mod file;
mod index;
pub mod memory;
pub mod store;

pub use file::FileBatchStore;
pub use index::verify_record;
pub use memory::MemoryBatchStore;
pub use store::{BatchStore, OpenReport, SkippedRecord};
