//! Report export
//!
//! This module turns a numbered [`GraphSession`](crate::graph::GraphSession)
//! into the JSON document uploaded to the inventory server.

pub mod report;

pub use report::{Finger, GraphRecord, Report, ReportMetadata};
