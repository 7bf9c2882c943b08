//! Hash store module for HashKeeper.
//!
//! This module provides the durable record of content hashes, one
//! [`HashRecord`] per tracked file, keyed by path.
//!
//! # Architecture
//!
//! * [`database`]: SQLite working copy + durable file, CRUD, checkpoints.
//! * [`record`]: The record model, digest validation, timestamp encoding.
//! * [`filter`]: Which records an operation rooted at a path touches.
//! * [`translate`]: Store-wide prefix and separator rewriting.
//!
//! # Durability
//!
//! Mutations only touch the in-memory working copy. Nothing reaches disk
//! until [`HashStore::checkpoint`] runs; [`HashStore::close`] never
//! checkpoints on its own. Concurrent runs against the same durable file
//! are not coordinated and must be avoided by the caller.

pub mod database;
pub mod filter;
pub mod record;
pub mod translate;

pub use database::{HashStore, StoreError, StoreResult};
pub use filter::PathFilter;
pub use record::{HashRecord, DEFAULT_SESSION};
pub use translate::{PathTranslation, SeparatorConversion, TranslateError, TranslationReport};
