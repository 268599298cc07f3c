//! Streaming client for a watch-mode review tool's JSON diagnostics.
//!
//! The pipeline: [`ReviewWatcher`] supervises the external tool and reads
//! its stdout line-by-line; [`protocol::decode`] turns each line into
//! [`DiagnosticRecord`]s; the watcher's [`DiagnosticBus`] fans the batch
//! out to subscribers; each consumer's [`UpdateScheduler`] debounces and
//! applies updates against the [`Document`] snapshot current at firing
//! time; [`fixes`] applies a record's suggested patch on demand.

pub mod bus;
pub mod document;
pub mod fixes;
pub mod markup;
pub mod protocol;
pub mod scheduler;
pub mod types;
pub mod watcher;

mod manager;

pub use bus::{DiagnosticBus, Subscription};
pub use document::{Document, DocumentSnapshot};
pub use fixes::FixError;
pub use manager::ReviewManager;
pub use protocol::{DecodeError, decode};
pub use scheduler::{DEBOUNCE_DELAY, UpdateScheduler, UpdateSink};
pub use types::{
    Batch, Category, DiagnosticRecord, Position, Region, RichChunk, TextPatch, WatchConfig,
};
pub use watcher::{PathToolchain, ReviewWatcher, TOOL_NAME, Toolchain, WatchError};
