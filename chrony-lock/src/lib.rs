//! Single-owner lock for agent instances sharing one host.
//!
//! Several agent instances may be deployed to the same machine, but only one
//! of them may manage chrony. The first instance to acquire the lock writes
//! its identity into a marker file; every other instance sees a conflict
//! until the owner releases it during teardown.
//!
//! ```no_run
//! use chrony_lock::{FsLockStorage, LockManager};
//!
//! let lock = LockManager::new(FsLockStorage::default());
//! if lock.try_acquire("chrony/0")? {
//!     // manage chrony
//!     lock.release("chrony/0")?;
//! }
//! # Ok::<(), chrony_lock::LockError>(())
//! ```

mod error;
mod manager;
mod storage;

pub use error::{LockError, LockResult};
pub use manager::{LockManager, LockState};
pub use storage::{FsLockStorage, LockStorage, MemoryLockStorage, LOCK_FILE};
