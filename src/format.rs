use std::ffi::OsString;
use std::fmt::Write;
use std::path::{self, Path};
use std::str::FromStr;

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;

use crate::error::{NameFormatError, RelocateError};
use crate::metadata::MetadataReader;
use crate::resolve::Resolver;
use crate::types::{RenamePlan, Timestamp};

pub const DEFAULT_FORMAT: &str = "%Y-%m-%d %H.%M.%S";

/// A strftime format that is known to render a usable file name for any timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameFormat(String);

impl NameFormat {
    pub fn render(&self, ts: &Timestamp) -> String {
        // Every specifier was checked against a NaiveDateTime in from_str, so this can't fail
        ts.format(&self.0).to_string()
    }
}

impl Default for NameFormat {
    fn default() -> Self {
        Self(DEFAULT_FORMAT.to_string())
    }
}

impl FromStr for NameFormat {
    type Err = NameFormatError;

    fn from_str(fmt: &str) -> Result<Self, Self::Err> {
        if fmt.is_empty() {
            return Err(NameFormatError::Empty);
        }
        if StrftimeItems::new(fmt).any(|item| matches!(item, Item::Error)) {
            return Err(NameFormatError::Invalid(fmt.to_string()));
        }

        let sample = NaiveDate::from_ymd_opt(2020, 12, 31)
            .and_then(|d| d.and_hms_opt(23, 59, 59))
            .ok_or_else(|| NameFormatError::Invalid(fmt.to_string()))?;
        let mut rendered = String::new();
        write!(rendered, "{}", sample.format(fmt))
            .map_err(|_| NameFormatError::Unrenderable(fmt.to_string()))?;

        if rendered.trim().is_empty() {
            return Err(NameFormatError::Empty);
        }
        if rendered.chars().any(|c| path::is_separator(c) || c == '\0') {
            return Err(NameFormatError::Separator(fmt.to_string()));
        }
        // Literal-only formats render the same for every timestamp, so the sample is enough
        if rendered == "." || rendered == ".." {
            return Err(NameFormatError::Reserved(fmt.to_string()));
        }
        Ok(Self(fmt.to_string()))
    }
}

/// Work out where `path` should be copied to, without touching the filesystem beyond reading
/// its timestamp.
pub fn plan<R: MetadataReader>(
    resolver: &Resolver<R>,
    path: &Path,
    dest_dir: Option<&Path>,
    fmt: &NameFormat,
) -> Result<RenamePlan, RelocateError> {
    let ts = resolver.try_resolve(path)?;

    let mut name = OsString::from(fmt.render(&ts));
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }

    let dir = dest_dir
        .or_else(|| path.parent())
        .unwrap_or_else(|| Path::new("."));

    Ok(RenamePlan {
        source: path.to_path_buf(),
        destination: dir.join(name),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn may_17() -> Timestamp {
        NaiveDate::from_ymd_opt(2020, 5, 17)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap()
    }

    fn fixture_copy(dir: &Path, name: &str) -> std::path::PathBuf {
        let to = dir.join(name);
        fs::copy(
            Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/exif.jpg"),
            &to,
        )
        .unwrap();
        to
    }

    #[test]
    fn default_format_matches_camera_uploads() {
        assert_eq!(NameFormat::default().render(&may_17()), "2020-05-17 14.30.00");
    }

    #[test]
    fn custom_format() {
        let fmt: NameFormat = "%Y%m%d_%H%M%S".parse().unwrap();
        assert_eq!(fmt.render(&may_17()), "20200517_143000");
    }

    #[test]
    fn rejects_bad_formats() {
        assert_eq!("".parse::<NameFormat>(), Err(NameFormatError::Empty));
        assert_eq!("   ".parse::<NameFormat>(), Err(NameFormatError::Empty));
        assert!(matches!(
            "%Y-%".parse::<NameFormat>(),
            Err(NameFormatError::Invalid(_))
        ));
        assert!(matches!(
            "%Y/%m/%d".parse::<NameFormat>(),
            Err(NameFormatError::Separator(_))
        ));
        assert!(matches!(
            "%Y %z".parse::<NameFormat>(),
            Err(NameFormatError::Unrenderable(_))
        ));
    }

    #[test]
    fn rejects_formats_naming_the_current_or_parent_dir() {
        for fmt in [".", ".."] {
            assert_eq!(
                fmt.parse::<NameFormat>(),
                Err(NameFormatError::Reserved(fmt.to_string()))
            );
        }
        // Dots alongside other text are ordinary names
        assert!("...".parse::<NameFormat>().is_ok());
        assert!(".%Y".parse::<NameFormat>().is_ok());
    }

    #[test]
    fn plan_keeps_extension_case_and_defaults_to_source_dir() {
        let dir = tempfile::tempdir().unwrap();
        let src = fixture_copy(dir.path(), "IMG_20200517_143000.JPG");
        let resolver = Resolver::with_media_metadata();

        let plan = plan(&resolver, &src, None, &NameFormat::default()).unwrap();
        assert_eq!(plan.source, src);
        assert_eq!(plan.destination, dir.path().join("2020-05-17 14.30.00.JPG"));
    }

    #[test]
    fn plan_into_other_dir_without_extension() {
        let dir = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let src = dir.path().join("notes");
        fs::write(&src, b"hello").unwrap();
        let resolver = Resolver::with_media_metadata();

        let fmt: NameFormat = "%Y".parse().unwrap();
        let plan = plan(&resolver, &src, Some(out.path()), &fmt).unwrap();
        assert_eq!(plan.destination.parent(), Some(out.path()));
        assert_eq!(plan.destination.extension(), None);
    }

    #[test]
    fn plan_of_missing_file_is_unresolved() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = Resolver::with_media_metadata();
        let res = plan(
            &resolver,
            &dir.path().join("gone.mp4"),
            None,
            &NameFormat::default(),
        );
        assert!(matches!(res, Err(RelocateError::Unresolved(_))));
    }
}
