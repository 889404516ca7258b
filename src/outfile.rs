//! Output plumbing: timestamped output names and create-only writes.

use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use thiserror::Error;
use tracing::debug;

/// Failure writing the cleaned file. Both variants are terminal; there is
/// no retry path.
#[derive(Debug, Error)]
pub enum WriteError {
    /// Every run must land in a fresh file; an existing one is never
    /// touched. The timestamp in the name makes this rare (two runs inside
    /// the same second), not impossible.
    #[error("output file {path:?} already exists")]
    AlreadyExists { path: PathBuf },

    #[error("could not write output file {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Prefix `base` with the wall-clock time, dashes where colons would be so
/// the name stays valid on every filesystem.
pub fn timestamped_name(at: DateTime<Local>, base: &str) -> String {
    format!("{} {}", at.format("%Y-%m-%d %H-%M-%S"), base)
}

/// Write one `\n`-terminated line per entry to a newly created file.
/// Fails with [`WriteError::AlreadyExists`] rather than overwrite.
pub fn write_cleaned(path: &Path, lines: &[String]) -> Result<(), WriteError> {
    let io_error = |source: io::Error| WriteError::Io {
        path: path.to_owned(),
        source,
    };

    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|source| match source.kind() {
            io::ErrorKind::AlreadyExists => WriteError::AlreadyExists {
                path: path.to_owned(),
            },
            _ => io_error(source),
        })?;

    let mut out = BufWriter::new(file);
    for line in lines {
        debug!(%line, "writing line");
        writeln!(out, "{line}").map_err(io_error)?;
    }
    out.flush().map_err(io_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamp_prefix_uses_dashes_not_colons() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 30, 5).unwrap();
        assert_eq!(
            timestamped_name(at, "Music Page.txt"),
            "2024-03-09 14-30-05 Music Page.txt"
        );
    }

    #[test]
    fn writes_one_line_per_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cleaned.txt");
        write_cleaned(&path, &["<p></p>".to_owned(), " <embed a/>".to_owned()]).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "<p></p>\n <embed a/>\n"
        );
    }

    #[test]
    fn refuses_to_overwrite_an_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cleaned.txt");
        write_cleaned(&path, &[]).unwrap();
        let err = write_cleaned(&path, &[]).unwrap_err();
        assert!(matches!(err, WriteError::AlreadyExists { .. }));
    }
}
