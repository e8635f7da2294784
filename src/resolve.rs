use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Local, NaiveDateTime};
use log::debug;

use crate::error::ResolveError;
use crate::metadata::{MediaMetadata, MetadataReader};
use crate::types::{Category, Timestamp};

const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// 0001-01-01 and 9999-12-31 23:59:59 UTC. Outside these, shifting into the local zone can leave
/// chrono's representable range.
const MIN_UNIX_SECS: i64 = -62_135_596_800;
const MAX_UNIX_SECS: i64 = 253_402_300_799;

type Strategy<R> = fn(&Resolver<R>, &Path) -> Result<Timestamp, ResolveError>;

/// Works out the best available timestamp for a file.
///
/// Each category gets an ordered list of strategies. The first one to produce a timestamp wins,
/// and the last one is always the filesystem mtime, so embedded metadata can only ever improve on
/// what the filesystem says.
#[derive(Debug, Clone)]
pub struct Resolver<R = MediaMetadata> {
    reader: R,
}

impl Resolver {
    pub fn with_media_metadata() -> Self {
        Self::new(MediaMetadata)
    }
}

impl<R: MetadataReader> Resolver<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    fn strategies(category: Category) -> Vec<Strategy<R>> {
        match category {
            Category::Image => vec![Self::from_exif as Strategy<R>, Self::from_mtime],
            Category::Video => vec![Self::from_container as Strategy<R>, Self::from_mtime],
            Category::Other => vec![Self::from_mtime as Strategy<R>],
        }
    }

    pub fn resolve(&self, path: &Path) -> Option<Timestamp> {
        self.try_resolve(path).ok()
    }

    /// Like `resolve`, but keeps the reason the last strategy failed.
    pub fn try_resolve(&self, path: &Path) -> Result<Timestamp, ResolveError> {
        let mut last_err = None;
        for strategy in Self::strategies(Category::of(path)) {
            match strategy(self, path) {
                Ok(ts) => {
                    debug!("{}: resolved to {}", path.display(), ts);
                    return Ok(ts);
                }
                Err(err) => {
                    debug!("{}: {}", path.display(), err);
                    last_err = Some(err);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| ResolveError::unavailable("no strategy applies")))
    }

    fn from_exif(&self, path: &Path) -> Result<Timestamp, ResolveError> {
        let raw = self.reader.image_capture_time(path)?;
        let raw = raw.trim_end_matches(|c: char| c == '\0' || c.is_whitespace());
        NaiveDateTime::parse_from_str(raw, EXIF_DATETIME_FORMAT)
            .map_err(|err| ResolveError::unavailable(format!("bad DateTimeOriginal {raw:?}: {err}")))
    }

    fn from_container(&self, path: &Path) -> Result<Timestamp, ResolveError> {
        let secs = self.reader.video_creation_time(path)?;
        if secs <= 0 {
            return Err(ResolveError::MetadataImplausible(secs));
        }
        local_from_unix(secs).ok_or(ResolveError::MetadataImplausible(secs))
    }

    fn from_mtime(&self, path: &Path) -> Result<Timestamp, ResolveError> {
        let unreadable = |source: io::Error| ResolveError::FileSystemUnreadable {
            path: path.to_path_buf(),
            source,
        };
        let mtime = fs::metadata(path)
            .and_then(|m| m.modified())
            .map_err(unreadable)?;
        let secs = unix_secs(mtime);
        local_from_unix(secs).ok_or(ResolveError::MetadataImplausible(secs))
    }
}

/// Whole seconds since the epoch, rounded towards the past.
fn unix_secs(time: SystemTime) -> i64 {
    match time.duration_since(SystemTime::UNIX_EPOCH) {
        Ok(after) => i64::try_from(after.as_secs()).unwrap_or(i64::MAX),
        Err(err) => {
            let before = err.duration();
            let whole = i64::try_from(before.as_secs()).unwrap_or(i64::MAX);
            if before.subsec_nanos() > 0 {
                whole.saturating_neg().saturating_sub(1)
            } else {
                whole.saturating_neg()
            }
        }
    }
}

/// Local wall-clock time for `secs`, or `None` when it lies outside years 1 to 9999.
fn local_from_unix(secs: i64) -> Option<Timestamp> {
    if !(MIN_UNIX_SECS..=MAX_UNIX_SECS).contains(&secs) {
        return None;
    }
    let utc = DateTime::from_timestamp(secs, 0)?;
    Some(utc.with_timezone(&Local).naive_local())
}
