//! Per-run log files named by launch time.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

/// Second-resolution, lexicographically sortable.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Upper bound on same-second launches before giving up on a unique name.
const MAX_SUFFIX: u32 = 1000;

/// File stem for a launch at `at`, e.g. `2026-10-14_09-30-05`.
pub fn file_stem(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Create a fresh log file in `dir` for a launch at `at`.
///
/// The directory is created if missing. When the timestamped name is already
/// taken, `_1`, `_2`, ... is appended; an existing file is never opened.
pub fn create(dir: &Path, at: NaiveDateTime) -> io::Result<(File, PathBuf)> {
    std::fs::create_dir_all(dir)?;

    let stem = file_stem(at);
    for n in 0..MAX_SUFFIX {
        let name = if n == 0 {
            format!("{}.log", stem)
        } else {
            format!("{}_{}.log", stem, n)
        };
        let path = dir.join(name);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((file, path)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }

    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free log file name for {} in {}", stem, dir.display()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn launch_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 7)
            .and_then(|d| d.and_hms_opt(9, 5, 2))
            .unwrap()
    }

    #[test]
    fn test_file_stem_format() {
        assert_eq!(file_stem(launch_time()), "2026-03-07_09-05-02");
    }

    #[test]
    fn test_creates_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("a").join("logs");

        let (_file, path) = create(&dir, launch_time()).unwrap();
        assert!(dir.is_dir());
        assert_eq!(path, dir.join("2026-03-07_09-05-02.log"));
    }

    #[test]
    fn test_same_second_gets_suffix() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("2026-03-07_09-05-02.log"), b"previous run").unwrap();

        let (_first, first) = create(tmp.path(), launch_time()).unwrap();
        let (_second, second) = create(tmp.path(), launch_time()).unwrap();

        assert_eq!(first, tmp.path().join("2026-03-07_09-05-02_1.log"));
        assert_eq!(second, tmp.path().join("2026-03-07_09-05-02_2.log"));
        assert_eq!(
            std::fs::read(tmp.path().join("2026-03-07_09-05-02.log")).unwrap(),
            b"previous run"
        );
    }
}
