//! Workbook document store and transfer backends.
//!
//! The rotation core treats the registry document as a row-addressable table:
//! named sheets of string rows, fetched and stored as opaque bytes through an
//! [`ObjectStore`]. This crate provides the [`Workbook`] table itself, the
//! transfer trait with S3 and in-memory backends, and the [`DocumentHandle`]
//! that binds a workbook location to a backend for load/checkpoint cycles.

pub mod error;
pub mod memory;
pub mod s3;
pub mod store;
pub mod workbook;

pub use error::{SheetError, SheetResult};
pub use memory::MemoryObjectStore;
pub use s3::S3ObjectStore;
pub use store::{DocumentHandle, Locator, ObjectStore};
pub use workbook::Workbook;
