//! Atomic file writes: tmp-file + fsync + rename (spec §4.3 "Write
//! invariants"). Grounded on the teacher's `storage/file_hash.rs`, which
//! uses the same discipline for its SQLite-adjacent on-disk state.

use std::io::Write;
use std::path::Path;

use contextd_domain::error::Result;

/// Write `bytes` to `path` atomically: write to a sibling `.tmp` file,
/// `fsync` it, then rename over the destination. A crash mid-write leaves
/// either the old file or nothing — never a partial file at `path`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp_path = path.with_extension("tmp");
    {
        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_atomic_creates_readable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.gob");
        write_atomic(&path, b"hello").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");
    }

    #[test]
    fn write_atomic_leaves_no_tmp_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.gob");
        write_atomic(&path, b"hello").unwrap();
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn write_atomic_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.gob");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"second");
    }
}
