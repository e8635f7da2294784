use std::fs;
use std::io;
use std::path::Path;
use std::str;

use exif::{In, Reader, Tag, Value};
use nom_exif::{EntryValue, MediaParser, MediaSource, TrackInfo, TrackInfoTag};

use crate::error::ResolveError;

/// Unix seconds of the QuickTime (1904) and Matroska (2001) epochs. A container reporting exactly
/// one of these stored a zero, which is what cameras with broken clocks write.
const CONTAINER_EPOCHS: [i64; 2] = [-2_082_844_800, 978_307_200];

/// Where the resolver gets embedded timestamps from. Implementations only report what the file
/// says; judging whether it is believable is left to the resolver.
pub trait MetadataReader {
    /// The raw `DateTimeOriginal` string, e.g. "2020:05:17 14:30:00".
    fn image_capture_time(&self, path: &Path) -> Result<String, ResolveError>;

    /// The container's creation time in Unix seconds.
    fn video_creation_time(&self, path: &Path) -> Result<i64, ResolveError>;
}

/// Reads EXIF via kamadak-exif and MP4/MOV/3GP/MKV/WebM headers via nom-exif.
#[derive(Debug, Default, Clone, Copy)]
pub struct MediaMetadata;

impl MetadataReader for MediaMetadata {
    fn image_capture_time(&self, path: &Path) -> Result<String, ResolveError> {
        let file = fs::File::open(path)
            .map_err(|err| ResolveError::unavailable(format!("cannot open: {err}")))?;
        let exif = Reader::new()
            .read_from_container(&mut io::BufReader::new(&file))
            .map_err(|err| ResolveError::unavailable(format!("no EXIF: {err}")))?;

        let field = exif
            .get_field(Tag::DateTimeOriginal, In::PRIMARY)
            .ok_or_else(|| ResolveError::unavailable("no DateTimeOriginal tag"))?;

        match field.value {
            // Default formatter puts ASCII values inside quotes, which we don't want
            Value::Ascii(ref vec) if !vec.is_empty() => str::from_utf8(&vec[0])
                .map(str::to_string)
                .map_err(|_| ResolveError::unavailable("DateTimeOriginal is not UTF-8")),
            _ => Err(ResolveError::unavailable("DateTimeOriginal is not ASCII")),
        }
    }

    fn video_creation_time(&self, path: &Path) -> Result<i64, ResolveError> {
        // Unknown containers (AVI, Ogg, ...) are rejected here by content, not by extension
        let ms = MediaSource::file_path(path)
            .map_err(|err| ResolveError::unavailable(format!("unsupported container: {err}")))?;
        if !ms.has_track() {
            return Err(ResolveError::unavailable("not a video container"));
        }

        let mut parser = MediaParser::new();
        let info: TrackInfo = parser
            .parse(ms)
            .map_err(|err| ResolveError::unavailable(format!("bad container: {err}")))?;

        let secs = match info.get(TrackInfoTag::CreateDate) {
            Some(EntryValue::Time(t)) => t.timestamp(),
            // Container times are UTC even when stored without an offset
            Some(EntryValue::NaiveDateTime(t)) => t.and_utc().timestamp(),
            Some(other) => {
                return Err(ResolveError::unavailable(format!(
                    "unexpected creation date {other}"
                )))
            }
            None => return Err(ResolveError::unavailable("no creation date")),
        };

        if CONTAINER_EPOCHS.contains(&secs) {
            return Err(ResolveError::MetadataImplausible(secs));
        }
        Ok(secs)
    }
}
