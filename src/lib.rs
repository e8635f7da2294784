//! Copy photos and videos to names derived from when they were taken.
//!
//! [`Resolver`] finds the best timestamp a file has to offer: EXIF `DateTimeOriginal` for JPEGs,
//! the container creation time for videos, and the modification time for everything else or
//! whenever the embedded data is missing or obviously wrong. [`relocate()`] turns that into a new
//! name and copies the file there, never replacing anything that already exists.

pub mod error;
pub mod file;
pub mod format;
pub mod metadata;
pub mod relocate;
pub mod resolve;
pub mod types;

pub use error::{NameFormatError, RelocateError, ResolveError};
pub use format::{plan, NameFormat};
pub use metadata::{MediaMetadata, MetadataReader};
pub use relocate::{execute, relocate};
pub use resolve::Resolver;
pub use types::{Category, Config, Outcome, RenamePlan, Timestamp};
