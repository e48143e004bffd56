//! Data Transfer Objects
//!
//! Records handed to the outside world (stdout, CI output files) once a poll
//! reaches a conclusion.

pub mod outcome;
