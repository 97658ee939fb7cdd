// Member Registry - Core Library
// Exposes all modules for use in the CLI, the TUI, and tests

pub mod allocator;
pub mod export;
pub mod member;
pub mod stats;
pub mod storage;
pub mod store;

// Only compile the UI module when the TUI feature is enabled
#[cfg(feature = "tui")]
pub mod ui;

// Re-export commonly used types
pub use allocator::{ControlNumberAllocator, DEFAULT_PREFIX};
pub use export::{
    default_csv_filename, export_csv_file, export_json_file, import_json_file, parse_import,
    write_csv, ExportEnvelope, CSV_HEADERS,
};
pub use member::{Member, MemberDraft, MemberPatch, YearLevel};
pub use stats::MembershipStats;
pub use storage::{Storage, Theme, POOL_KEY, STUDENTS_KEY, THEME_KEY};
pub use store::{FilterCriteria, MemberStore, StoreError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
