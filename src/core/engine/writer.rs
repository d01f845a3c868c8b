//! Writes one file into the destination tree.

use super::config::OperationMode;
use crate::core::transform::Transformed;
use crate::error::FileError;
use filetime::FileTime;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use tracing::warn;

/// What a successful write did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteReport {
    /// Bytes now at the destination
    pub bytes: u64,
    /// The source was removed
    pub moved: bool,
    /// The content was re-encoded rather than copied
    pub reencoded: bool,
}

/// Copies or moves a file to a destination that must not exist yet.
///
/// The destination is opened with create-new semantics, so a file that
/// appeared after the path was resolved is reported as
/// [`FileError::DestinationTaken`] instead of being overwritten.
/// Permissions and access/modification times follow the source.
///
/// A re-encoded file is never moved: the destination holds a lossy copy,
/// so the original stays where it was.
#[derive(Debug, Clone, Copy)]
pub struct FileWriter {
    operation: OperationMode,
}

impl FileWriter {
    pub fn new(operation: OperationMode) -> Self {
        Self { operation }
    }

    pub fn write(
        &self,
        source: &Path,
        dest: &Path,
        content: Transformed,
    ) -> Result<WriteReport, FileError> {
        let source_size = fs::metadata(source)
            .map_err(|e| copy_error(dest, e))?
            .len();

        if self.operation == OperationMode::Move && content == Transformed::Unchanged {
            // Same filesystem: a hard link is an atomic create-new rename
            match fs::hard_link(source, dest) {
                Ok(()) => {
                    fs::remove_file(source).map_err(|e| FileError::Remove {
                        path: source.to_path_buf(),
                        source: e,
                    })?;
                    return Ok(WriteReport {
                        bytes: source_size,
                        moved: true,
                        reencoded: false,
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    return Err(FileError::DestinationTaken {
                        dest: dest.to_path_buf(),
                    });
                }
                // Cross-device or unsupported, fall back to copy + delete
                Err(_) => {}
            }
        }

        let reencoded = matches!(content, Transformed::Reencoded(_));
        let expected = match &content {
            Transformed::Unchanged => source_size,
            Transformed::Reencoded(bytes) => bytes.len() as u64,
        };

        let mut out = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(dest)
            .map_err(|e| {
                if e.kind() == io::ErrorKind::AlreadyExists {
                    FileError::DestinationTaken {
                        dest: dest.to_path_buf(),
                    }
                } else {
                    copy_error(dest, e)
                }
            })?;

        let written = match fill(&mut out, source, &content) {
            Ok(written) => written,
            Err(e) => {
                drop(out);
                let _ = fs::remove_file(dest);
                return Err(copy_error(dest, e));
            }
        };
        drop(out);

        preserve_metadata(source, dest);

        let remove_source = self.operation == OperationMode::Move && !reencoded;
        if remove_source {
            let dest_size = fs::metadata(dest).map_err(|e| copy_error(dest, e))?.len();
            if dest_size != expected || written != expected {
                // Incomplete copy, keep the source
                let _ = fs::remove_file(dest);
                return Err(copy_error(
                    dest,
                    io::Error::other(format!(
                        "verification failed: expected {} bytes, wrote {}",
                        expected, dest_size
                    )),
                ));
            }

            fs::remove_file(source).map_err(|e| FileError::Remove {
                path: source.to_path_buf(),
                source: e,
            })?;
        }

        Ok(WriteReport {
            bytes: written,
            moved: remove_source,
            reencoded,
        })
    }
}

fn fill(out: &mut File, source: &Path, content: &Transformed) -> io::Result<u64> {
    let written = match content {
        Transformed::Unchanged => {
            let mut input = File::open(source)?;
            io::copy(&mut input, out)?
        }
        Transformed::Reencoded(bytes) => {
            out.write_all(bytes)?;
            bytes.len() as u64
        }
    };
    out.flush()?;
    Ok(written)
}

fn preserve_metadata(source: &Path, dest: &Path) {
    let metadata = match fs::metadata(source) {
        Ok(metadata) => metadata,
        Err(e) => {
            warn!(?source, error = %e, "could not read source metadata");
            return;
        }
    };

    if let Err(e) = fs::set_permissions(dest, metadata.permissions()) {
        warn!(?dest, error = %e, "could not copy permissions");
    }

    let accessed = FileTime::from_last_access_time(&metadata);
    let modified = FileTime::from_last_modification_time(&metadata);
    if let Err(e) = filetime::set_file_times(dest, accessed, modified) {
        warn!(?dest, error = %e, "could not copy file times");
    }
}

fn copy_error(dest: &Path, source: io::Error) -> FileError {
    FileError::Copy {
        dest: dest.to_path_buf(),
        source,
    }
}
