//! Shared types for the Lithium addon platform.
//!
//! This crate provides the foundations every other `lithium-*` crate builds
//! on: the error taxonomy and `Result` alias, JSON (de)serialization helpers,
//! and content hashing used by the file tracker and lockfile writer.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
mod hash;
mod json;

pub use error::{Error, ErrorKind, Result};
pub use hash::{ContentHash, ContentHasher};
pub use json::{from_json, from_json_slice, to_json, to_json_pretty};

pub use ahash::{AHashMap, AHashSet};
pub use dashmap::DashMap;
pub use parking_lot::{Mutex, RwLock};

/// Global allocator for the whole workspace.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;
