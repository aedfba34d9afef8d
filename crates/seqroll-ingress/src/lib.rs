//! # seqroll-ingress
//!
//! **Capture plane**: watch-list filtering, FIFO pending buffer, and the
//! upstream block source port.
//!
//! ## Flow
//!
//! ```text
//! BlockSource.block(n) → TransactionCapture.on_block()
//!     → WatchList.matches() → PendingBuffer.push()
//!     → PendingBuffer.take_ready() → closed batch → Submitter
//! ```
//!
//! The buffer is in-memory only. A closed batch is exactly the oldest
//! `threshold` matched transactions in arrival order.

pub mod capture;
pub mod pending_buffer;
pub mod source;
pub mod watch_list;

pub use capture::TransactionCapture;
pub use pending_buffer::PendingBuffer;
pub use source::BlockSource;
#[cfg(any(test, feature = "test-helpers"))]
pub use source::StaticBlockSource;
pub use watch_list::WatchList;
