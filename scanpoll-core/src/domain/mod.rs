//! Core domain types
//!
//! A project snapshot is whatever the service returned for one poll; the run
//! status is the piece of it the poller acts on.

pub mod project;
pub mod status;
