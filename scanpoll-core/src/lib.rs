//! Scanpoll Core
//!
//! Core types for following a ScanCode.io project run to completion.
//!
//! This crate contains:
//! - Domain types: project snapshots and run status classification
//! - DTOs: the outcome record published when a run succeeds

pub mod domain;
pub mod dto;
