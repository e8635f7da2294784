use std::path::Path;

use log::{debug, info};

use crate::error::RelocateError;
use crate::file;
use crate::format::{self, NameFormat};
use crate::metadata::MetadataReader;
use crate::resolve::Resolver;
use crate::types::{Outcome, RenamePlan};

/// Copy `path` to a name derived from its timestamp. Expected failures never escape: they all come
/// back as an `Outcome` so a caller working through many files can carry on.
pub fn relocate<R: MetadataReader>(
    resolver: &Resolver<R>,
    path: &Path,
    dest_dir: Option<&Path>,
    fmt: &NameFormat,
    dry_run: bool,
) -> Outcome {
    match format::plan(resolver, path, dest_dir, fmt) {
        Ok(plan) => execute(plan, dry_run),
        Err(reason) => unhandled(path, reason),
    }
}

/// Carry out a plan. The source is only ever read.
pub fn execute(plan: RenamePlan, dry_run: bool) -> Outcome {
    if plan.destination.exists() {
        let reason = RelocateError::DestinationCollision(plan.destination);
        return skipped(&plan.source, reason);
    }
    if dry_run {
        return Outcome::Relocated(plan);
    }
    copy_into_place(plan)
}

/// The copy itself, without the up-front existence check. A destination that exists by now is
/// still never replaced.
fn copy_into_place(plan: RenamePlan) -> Outcome {
    match file::copy_noclobber(&plan.source, &plan.destination) {
        Ok(()) => {
            info!("{} -> {}", plan.source.display(), plan.destination.display());
            Outcome::Relocated(plan)
        }
        // Someone else got there between execute's check and the rename
        Err(err) if file::is_already_exists(&err) => {
            skipped(&plan.source, RelocateError::DestinationCollision(plan.destination))
        }
        Err(err) => unhandled(
            &plan.source,
            RelocateError::CopyFailure {
                destination: plan.destination,
                source: err,
            },
        ),
    }
}

pub fn skipped(source: &Path, reason: RelocateError) -> Outcome {
    debug!("skipping {}: {}", source.display(), reason);
    Outcome::Skipped {
        source: source.to_path_buf(),
        reason,
    }
}

pub fn unhandled(source: &Path, reason: RelocateError) -> Outcome {
    debug!("cannot handle {}: {}", source.display(), reason);
    Outcome::Unhandled {
        source: source.to_path_buf(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn exif_jpg(dir: &Path, name: &str) -> PathBuf {
        let to = dir.join(name);
        fs::copy(
            Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/exif.jpg"),
            &to,
        )
        .unwrap();
        to
    }

    fn run(src: &Path, dest: Option<&Path>) -> Outcome {
        relocate(
            &Resolver::with_media_metadata(),
            src,
            dest,
            &NameFormat::default(),
            false,
        )
    }

    #[test]
    fn end_to_end_copy_into_target_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let src = exif_jpg(dir.path(), "IMG_20200517_143000.jpg");

        let outcome = run(&src, Some(&out));
        assert!(outcome.unhandled().is_none(), "{outcome:?}");
        assert!(out.join("2020-05-17 14.30.00.jpg").exists());
        assert!(src.exists());
    }

    #[test]
    fn second_run_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let src = exif_jpg(dir.path(), "IMG_1.jpg");

        assert!(matches!(run(&src, None), Outcome::Relocated(_)));
        let second = run(&src, None);
        assert!(matches!(
            second,
            Outcome::Skipped {
                reason: RelocateError::DestinationCollision(_),
                ..
            }
        ));
        assert_eq!(second.unhandled(), Some(src.as_path()));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn existing_destination_is_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let existing = out.path().join("2020-05-17 14.30.00.jpg");
        fs::write(&existing, b"already here").unwrap();
        let src = exif_jpg(dir.path(), "other.jpg");

        let outcome = run(&src, Some(out.path()));
        assert_eq!(outcome.unhandled(), Some(src.as_path()));
        assert_eq!(fs::read(&existing).unwrap(), b"already here");
    }

    #[test]
    fn missing_source_is_returned_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("vanished.jpg");

        let outcome = run(&src, None);
        assert!(matches!(
            outcome,
            Outcome::Unhandled {
                reason: RelocateError::Unresolved(_),
                ..
            }
        ));
        assert_eq!(outcome.unhandled(), Some(src.as_path()));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn copy_failure_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let src = exif_jpg(dir.path(), "IMG_1.jpg");
        let plan = format::plan(
            &Resolver::with_media_metadata(),
            &src,
            Some(out.path()),
            &NameFormat::default(),
        )
        .unwrap();
        fs::remove_file(&src).unwrap();

        let outcome = execute(plan, false);
        assert!(matches!(
            outcome,
            Outcome::Unhandled {
                reason: RelocateError::CopyFailure { .. },
                ..
            }
        ));
        assert_eq!(outcome.unhandled(), Some(src.as_path()));
        assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[test]
    fn destination_appearing_before_rename_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let src = exif_jpg(dir.path(), "IMG_1.jpg");
        let plan = format::plan(
            &Resolver::with_media_metadata(),
            &src,
            None,
            &NameFormat::default(),
        )
        .unwrap();
        // Lands after execute's existence check would have passed
        fs::write(&plan.destination, b"raced").unwrap();
        let existing = plan.destination.clone();

        let outcome = copy_into_place(plan);
        assert!(matches!(
            outcome,
            Outcome::Skipped {
                reason: RelocateError::DestinationCollision(_),
                ..
            }
        ));
        assert_eq!(fs::read(&existing).unwrap(), b"raced");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn dry_run_copies_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let src = exif_jpg(dir.path(), "IMG_1.jpg");

        let outcome = relocate(
            &Resolver::with_media_metadata(),
            &src,
            None,
            &NameFormat::default(),
            true,
        );
        assert!(matches!(outcome, Outcome::Relocated(_)));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
