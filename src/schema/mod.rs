//! Record ingestion boundary
//!
//! Parses and validates touch records from JSON or NDJSON so the aggregator
//! only ever sees well-formed [`TouchRecord`](crate::types::TouchRecord)s.

mod adapter;
mod raw_record;

pub use adapter::*;
pub use raw_record::*;
