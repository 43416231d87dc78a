//! Core data model for the Windows host security events notebooklet.
//!
//! Defines the event record and timespan types shared by every layer, the
//! run-option configuration, the bundled Windows security-event taxonomy and
//! the common error type.

pub mod error;
pub mod models;
pub mod taxonomy;
