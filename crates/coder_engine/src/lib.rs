//! Coder engine: remote classification, session service IO, durable storage and file codecs.
mod classify;
mod persist;
mod session;
mod storage;
mod sync;
mod transport;
mod types;

pub mod formats;

pub use classify::{Classifier, ReqwestClassifier};
pub use persist::{ensure_dir, AtomicFileWriter, PersistError};
pub use session::{ResultArchive, SessionClient, SessionSnapshot};
pub use storage::FileStorage;
pub use sync::{refresh_one, sync_into_store, ChunkDelivery, ChunkedSync, SyncReport, SyncSettings};
pub use types::{FailureKind, HttpSettings, RemoteError};
