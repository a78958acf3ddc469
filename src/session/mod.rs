//! Persisted credentials and the in-memory signed-in state built on them.

pub mod storage;
pub mod store;

pub use storage::{
    FileStore, KeyValueStore, MemoryStore, SessionStorage, StorageError, TokenPair,
};
pub use store::{HydrationOutcome, Session, SessionStore};
