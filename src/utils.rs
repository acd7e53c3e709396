use std::io::{self, Read};
use std::path::Path;

use tempfile::NamedTempFile;

/// Streams `reader` into a temp file next to `destination` and renames it over
/// `destination` once the copy finished. On any error the temp file is
/// removed and `destination` is left untouched. Returns the bytes written;
/// an empty stream returns 0 without touching `destination`.
pub fn save_stream_atomically(reader: &mut dyn Read, destination: &Path) -> io::Result<u64> {
    let dir = match destination.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    let written = io::copy(reader, tmp.as_file_mut())?;
    if written == 0 {
        return Ok(0);
    }
    tmp.as_file().sync_all()?;
    tmp.persist(destination).map_err(|e| e.error)?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    struct FailingReader {
        sent: bool,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.sent {
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
            }
            self.sent = true;
            buf[..4].copy_from_slice(b"\x89PNG");
            Ok(4)
        }
    }

    #[test]
    fn test_save_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("Notch.png");
        fs::write(&dest, b"old content that is longer").unwrap();

        let written = save_stream_atomically(&mut &b"new"[..], &dest).unwrap();
        assert_eq!(written, 3);
        assert_eq!(fs::read(&dest).unwrap(), b"new");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_failed_copy_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("Notch.png");

        let err = save_stream_atomically(&mut FailingReader { sent: false }, &dest).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
        assert!(!dest.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_empty_body_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("Notch.png");

        assert_eq!(save_stream_atomically(&mut io::empty(), &dest).unwrap(), 0);
        assert!(!dest.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
