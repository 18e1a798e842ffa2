#![doc(hidden)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for skypixel
//!
//! This library holds the data layer behind the Skypixel showcase site: it fetches the
//! owner's repositories, the latest releases of tracked projects, and the team roster
//! from GitHub, and serves them from TTL-bounded in-memory snapshots.
//!
//! # Module Organization
//!
//! - [`snapshots`]: Upstream client, normalization, cache entries, and the cache store
//! - [`commands`]: Command-line interface and orchestration

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

#[cfg(any(debug_assertions, test))]
pub mod commands;
#[cfg(not(any(debug_assertions, test)))]
mod commands;

pub mod snapshots;

pub use crate::commands::{Host, run};
