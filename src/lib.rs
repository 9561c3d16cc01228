//! TouchCare Core - On-device record engine for the TouchCare touch-counting device
//!
//! TouchCare Core turns the device's timestamped touch records into the figures
//! the app shows through a deterministic pipeline: record ingestion → calendar
//! projection → period aggregation → report encoding.
//!
//! ## Modules
//!
//! - **Record Pipeline**: Validate record JSON and aggregate it into period reports
//! - **App State**: Session, paired devices and the key-value store behind them

pub mod aggregate;
pub mod auth;
pub mod calendar;
pub mod config;
pub mod device;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod schema;
pub mod seed;
pub mod store;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use calendar::{Calendar, Locale};
pub use config::CareConfig;
pub use error::CareError;
pub use pipeline::{records_to_report, RecordProcessor};
pub use types::{PeriodKind, RecordReport, TouchRecord, TrendClassification};

// Schema exports
pub use schema::{RawTouchRecord, RecordAdapter, SCHEMA_VERSION};

// App state exports
pub use store::{AppState, FileStore, KeyValueStore, MemoryStore};

/// Core version embedded in every report
pub const CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "touchcare-core";
