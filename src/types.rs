use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use clap::Parser;

use crate::error::RelocateError;
use crate::format::NameFormat;

/// Local wall-clock time, truncated to the second. Source timezones are never kept.
pub type Timestamp = NaiveDateTime;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg"];
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "3gp", "mov", "mkv", "webm", "avi", "ogm", "ogv"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Image,
    Video,
    Other,
}

impl Category {
    pub fn of(path: &Path) -> Self {
        let ext = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => ext.to_ascii_lowercase(),
            None => return Self::Other,
        };

        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Self::Image
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Self::Video
        } else {
            Self::Other
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamePlan {
    pub source: PathBuf,
    pub destination: PathBuf,
}

#[derive(Debug)]
pub enum Outcome {
    Relocated(RenamePlan),
    /// Nothing was done because the destination name is already taken.
    Skipped {
        source: PathBuf,
        reason: RelocateError,
    },
    Unhandled {
        source: PathBuf,
        reason: RelocateError,
    },
}

impl Outcome {
    /// The original path, if this file still needs manual attention.
    pub fn unhandled(&self) -> Option<&Path> {
        match self {
            Self::Relocated(_) => None,
            Self::Skipped { source, .. } | Self::Unhandled { source, .. } => Some(source),
        }
    }

    pub fn reason(&self) -> Option<&RelocateError> {
        match self {
            Self::Relocated(_) => None,
            Self::Skipped { reason, .. } | Self::Unhandled { reason, .. } => Some(reason),
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// The strftime-style format used for new names, excluding the extension. The default gives
    /// names like "2020-05-17 14.30.00.jpg", which sort chronologically.
    ///
    /// Common specifiers:
    ///
    ///   %Y  year (4 digits)     %y  year (2 digits)
    ///   %m  month               %d  day
    ///   %H  hour (24h)          %M  minute
    ///   %S  second              %%  literal percent
    #[arg(
        short,
        long,
        default_value = "%Y-%m-%d %H.%M.%S",
        value_parser = clap::value_parser!(NameFormat),
        verbatim_doc_comment
    )]
    pub fmt: NameFormat,

    #[arg(
        short,
        long,
        help = "Directory to copy into, defaults to each file's own directory"
    )]
    pub dest: Option<PathBuf>,

    #[arg(short, long, help = "Descend into directories recursively")]
    pub recursive: bool,

    #[arg(
        long,
        help = "Don't actually copy files, only display what would happen"
    )]
    pub dry_run: bool,

    #[arg(short, long, action = clap::ArgAction::Count, help = "Log more (-v info, -vv debug)")]
    pub verbose: u8,

    #[arg(short, long, help = "Number of worker threads")]
    pub jobs: Option<usize>,

    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}
