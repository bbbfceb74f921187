//! Atomic file replacement for persisted configuration and local files

use fs2::FileExt;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::{Builder, NamedTempFile};

use crate::{Error, Result};

/// Replace the content of `path` in one step.
///
/// The bytes are staged in a uniquely named file next to the target and
/// renamed over it, so readers see the old or the new content and
/// concurrent writers of the same path never share a staging file. Missing
/// parent directories are created. An existing target keeps its
/// permissions.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;

    let mut staged = stage(path, dir)?;
    if let Ok(meta) = fs::metadata(path) {
        staged
            .as_file()
            .set_permissions(meta.permissions())
            .map_err(|e| Error::io(staged.path(), e))?;
    }

    let locked = |_| Error::LockFailed {
        path: path.to_path_buf(),
    };
    staged.as_file().lock_exclusive().map_err(locked)?;
    staged
        .write_all(content)
        .and_then(|()| staged.as_file().sync_all())
        .map_err(|e| Error::io(staged.path(), e))?;
    FileExt::unlock(staged.as_file()).map_err(locked)?;

    staged
        .persist(path)
        .map_err(|e| Error::io(path, e.error))?;
    Ok(())
}

/// An empty `.<name>.<random>.tmp` file in `dir`, removed on drop unless
/// persisted.
fn stage(path: &Path, dir: &Path) -> Result<NamedTempFile> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let prefix = format!(".{name}.");

    Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| Error::io(dir, e))
}

/// Read a whole file as UTF-8 text.
pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn leftovers(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".tmp"))
            .collect()
    }

    #[test]
    fn write_atomic_creates_file_and_parents() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a").join("b").join("test.txt");

        write_atomic(&path, b"hello world").unwrap();

        assert_eq!(read_text(&path).unwrap(), "hello world");
    }

    #[test]
    fn write_atomic_overwrites_and_leaves_no_temp_files() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("test.txt");
        fs::write(&path, "original").unwrap();

        write_atomic(&path, b"updated").unwrap();

        assert_eq!(read_text(&path).unwrap(), "updated");
        assert!(leftovers(temp.path()).is_empty());
    }

    #[test]
    fn concurrent_writes_to_one_file_all_succeed() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("shared.v");
        fs::write(&path, "").unwrap();
        let bodies: Vec<String> = (0..8).map(|n| format!("module m{n}; endmodule")).collect();

        for _ in 0..25 {
            std::thread::scope(|scope| {
                let writers: Vec<_> = bodies
                    .iter()
                    .map(|body| scope.spawn(|| write_atomic(&path, body.as_bytes())))
                    .collect();
                for writer in writers {
                    writer.join().unwrap().unwrap();
                }
            });
            assert!(bodies.contains(&read_text(&path).unwrap()));
        }
        assert!(leftovers(temp.path()).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn write_atomic_keeps_existing_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("script.sh");
        fs::write(&path, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();

        write_atomic(&path, b"#!/bin/sh\necho hi\n").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn read_text_missing_file_is_io_error() {
        let temp = TempDir::new().unwrap();
        let err = read_text(&temp.path().join("missing.txt")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
