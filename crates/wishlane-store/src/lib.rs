//! # wishlane-store
//!
//! Document storage for WishLane, backed by SQLite.
//!
//! Gifts and events live in per-owner collections, profiles in one document
//! per owner.  [`Database`] exposes synchronous typed CRUD helpers over a
//! `rusqlite::Connection`; [`SqliteDocumentStore`] wraps it behind the
//! [`DocumentStore`] trait, assigns identities and timestamps, and publishes
//! change notices for live queries.  Image uploads go through
//! [`ObjectStorage`].

pub mod changes;
pub mod database;
pub mod document;
pub mod events;
pub mod gifts;
pub mod migrations;
pub mod models;
pub mod objects;
pub mod profiles;

mod error;

pub use changes::{ChangeFeed, ChangeNotice, Collection};
pub use database::Database;
pub use document::{DocumentStore, SqliteDocumentStore};
pub use error::{Result, StoreError};
pub use models::*;
pub use objects::{FsObjectStore, ObjectStorage};
