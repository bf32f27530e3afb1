// Life Tracker - Core Library
// Exposes all modules for use in the CLI/TUI, the API server, and tests

pub mod record;
pub mod storage;
pub mod store;
pub mod forms;
pub mod summary;
pub mod view;
pub mod tracker;
pub mod config;
pub mod logging;
pub mod export;

// Re-export commonly used types
pub use record::{Record, RecordType, UnknownRecordType};
pub use storage::{KeyValueStorage, MemoryStorage, SqliteStorage, StorageError};
pub use store::{RecordStore, StoreError, DEFAULT_STORAGE_KEY};
pub use forms::{
    FieldDescriptor, FormError, FormSchema, FormState, InputType, SubmitError,
};
pub use summary::{history_rows, CardKind, HistoryRow, SummaryCard, SummaryStats, SummaryView};
pub use view::{render, view_for, NavTag, Screen, View, ViewDescriptor, ViewError};
pub use tracker::{DeleteOutcome, Notice, NoticeLevel, PendingDelete, Tracker, TrackerError};
pub use config::{Config, StorageArgs};
pub use export::ExportFormat;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
