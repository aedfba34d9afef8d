//! System-wide constants for the Seqroll sequencer.

/// Default number of captured transactions per batch.
pub const DEFAULT_BATCH_THRESHOLD: usize = 3;

/// Default challenge window: 7 days, in seconds.
pub const DEFAULT_CHALLENGE_WINDOW_SECS: u64 = 7 * 24 * 60 * 60;

/// Default finalization scan period: 1 hour, in seconds.
pub const DEFAULT_FINALIZE_INTERVAL_SECS: u64 = 60 * 60;

/// Default upstream head polling period in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;

/// Default time to wait for an on-chain call to be mined, in seconds.
pub const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 300;

/// Receipt polling period while waiting for confirmation, in milliseconds.
pub const RECEIPT_POLL_INTERVAL_MS: u64 = 1_000;

/// Default directory for persisted batch records.
pub const DEFAULT_DATA_DIR: &str = "./batch-data";

/// File extension of persisted batch records.
pub const RECORD_FILE_EXTENSION: &str = "json";

/// File name of the block resume checkpoint inside the data directory.
pub const CHECKPOINT_FILE: &str = "checkpoint.json";

/// File name of the set of transactions removed by fraud proofs.
pub const TOMBSTONE_FILE: &str = "tombstones.json";

/// Capacity of the queue between the block poller and the block handler.
pub const BLOCK_QUEUE_CAPACITY: usize = 256;

/// Maximum blocks the poller enqueues per tick while catching up.
pub const MAX_BLOCKS_PER_POLL: u64 = 64;

/// Name of the contract event carrying the assigned batch index.
pub const BATCH_SUBMITTED_EVENT: &str = "BatchSubmitted";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "Seqroll";
