use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use filetime::FileTime;
use tempfile::NamedTempFile;

/// Rename `from` to `to`, failing with `AlreadyExists` rather than replacing an existing file.
#[cfg(target_os = "linux")]
pub fn rename_noreplace(from: &Path, to: &Path) -> io::Result<()> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let from_c = CString::new(from.as_os_str().as_bytes())?;
    let to_c = CString::new(to.as_os_str().as_bytes())?;

    let ret = unsafe {
        libc::syscall(
            libc::SYS_renameat2,
            libc::AT_FDCWD,
            from_c.as_ptr(),
            libc::AT_FDCWD,
            to_c.as_ptr(),
            libc::RENAME_NOREPLACE,
        )
    };

    if ret == 0 {
        return Ok(());
    }
    let err = io::Error::last_os_error();
    match err.raw_os_error() {
        // Old kernel, or a filesystem that can't do RENAME_NOREPLACE
        Some(libc::EINVAL) | Some(libc::ENOSYS) => link_noreplace(from, to),
        _ => Err(err),
    }
}

#[cfg(not(target_os = "linux"))]
pub fn rename_noreplace(from: &Path, to: &Path) -> io::Result<()> {
    link_noreplace(from, to)
}

/// Hard links refuse to replace an existing file everywhere, so they double as a portable
/// no-replace rename. The caller drops `from` afterwards.
fn link_noreplace(from: &Path, to: &Path) -> io::Result<()> {
    fs::hard_link(from, to)
}

/// Copy `from` to `to` without ever replacing an existing `to` or leaving a partial file behind.
///
/// The data goes to a temporary file next to `to` first. It gets the source's access and
/// modification times and is then moved into place in one step. If `to` turns up in the
/// meantime the returned error has kind `AlreadyExists`.
pub fn copy_noclobber(from: &Path, to: &Path) -> Result<()> {
    let to_parent = to.parent().context("refusing to copy to filesystem root")?;
    fs::create_dir_all(to_parent)
        .with_context(|| format!("cannot create {}", to_parent.display()))?;

    let tmp_path = NamedTempFile::new_in(to_parent)?.into_temp_path();
    fs::copy(from, &tmp_path).with_context(|| format!("cannot copy {}", from.display()))?;

    let meta = fs::metadata(from)?;
    filetime::set_file_times(
        &tmp_path,
        FileTime::from_last_access_time(&meta),
        FileTime::from_last_modification_time(&meta),
    )?;

    // On success tmp_path no longer exists (or is a second link to `to`), and dropping it cleans
    // up whichever is left
    rename_noreplace(&tmp_path, to)?;
    Ok(())
}

/// True if `err` is, somewhere in its chain, an I/O error saying the destination exists.
pub fn is_already_exists(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<io::Error>())
        .any(|io_err| io_err.kind() == io::ErrorKind::AlreadyExists)
}
