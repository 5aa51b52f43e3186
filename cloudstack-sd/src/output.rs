// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Discovery file output.
///
/// Target groups are written to a temporary file next to the destination and
/// then renamed over it, so Prometheus never reads a partially written file.
use std::{
    io::{BufWriter, Write},
    path::Path
};

use tempfile::NamedTempFile;

use crate::{
    error::{self, Error},
    targets::TargetGroup
};

/// Mode given to a freshly created discovery file.
#[cfg(unix)]
const DEFAULT_MODE: u32 = 0o644;

/// Serializes `groups` as a JSON array and atomically replaces `path`.
///
/// Missing parent directories are created. The temporary file lives in the
/// destination directory so the final rename never crosses filesystems. The
/// replacement keeps the mode of an existing destination; a new file is
/// created world-readable (`0644`) so a scraper running as another user can
/// read it.
///
/// # Errors
///
/// Returns [`Error::Io`] when the directory, the temporary file or the rename
/// fails, and [`Error::Serialize`] when the groups cannot be encoded.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
///
/// use cloudstack_sd::write_target_groups;
///
/// # fn example() -> Result<(), cloudstack_sd::Error> {
/// write_target_groups(Path::new("/etc/prometheus/cloudstack.json"), &[], false)?;
/// # Ok(())
/// # }
/// ```
pub fn write_target_groups(path: &Path, groups: &[TargetGroup], pretty: bool) -> Result<(), Error> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new(".")
    };

    if !directory.exists() {
        std::fs::create_dir_all(directory).map_err(|e| error::io_error(directory, e))?;
    }

    let file = NamedTempFile::new_in(directory).map_err(|e| error::io_error(directory, e))?;

    {
        let mut writer = BufWriter::new(file.as_file());
        if pretty {
            serde_json::to_writer_pretty(&mut writer, groups)?;
        } else {
            serde_json::to_writer(&mut writer, groups)?;
        }
        writer.flush().map_err(|e| error::io_error(file.path(), e))?;
    }

    apply_mode(&file, path)?;
    file.as_file().sync_all().map_err(|e| error::io_error(file.path(), e))?;
    file.persist(path).map_err(|e| error::io_error(path, e.error))?;

    Ok(())
}

#[cfg(unix)]
fn apply_mode(file: &NamedTempFile, destination: &Path) -> Result<(), Error> {
    use std::{fs::Permissions, os::unix::fs::PermissionsExt};

    let mode = match std::fs::metadata(destination) {
        Ok(metadata) if metadata.is_file() => metadata.permissions().mode() & 0o7777,
        _ => DEFAULT_MODE
    };
    file.as_file()
        .set_permissions(Permissions::from_mode(mode))
        .map_err(|e| error::io_error(file.path(), e))
}

#[cfg(not(unix))]
fn apply_mode(_file: &NamedTempFile, _destination: &Path) -> Result<(), Error> {
    Ok(())
}
