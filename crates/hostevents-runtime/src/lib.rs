//! Orchestration layer for the Windows host security events notebooklet.
//!
//! Sequences the data pipeline (fetch, filter, pivot, expand, render) based
//! on the requested options and packages the results, with a caller-owned
//! session for follow-on operations.

pub mod notebooklet;

pub use hostevents_core as core;
pub use hostevents_data as data;
