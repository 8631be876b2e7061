//! Atomic file replacement helpers.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Replace `dest` with `bytes` through a temporary file in the same directory.
///
/// Readers see either the old contents or the new ones, never a partial write.
pub(crate) fn write_atomic(dest: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = parent_dir(dest);
    fs::create_dir_all(dir)?;
    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(dest).map_err(|err| err.error)?;
    Ok(())
}

/// Copy `src` over `dest` atomically.
pub(crate) fn copy_file_atomic(src: &Path, dest: &Path) -> io::Result<()> {
    let dir = parent_dir(dest);
    fs::create_dir_all(dir)?;
    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    let mut source = fs::File::open(src)?;
    io::copy(&mut source, temp.as_file_mut())?;
    temp.as_file().sync_all()?;
    temp.persist(dest).map_err(|err| err.error)?;
    Ok(())
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_atomic_replaces_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("file.bin");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"second");
        let entries = fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn copy_file_atomic_copies_contents() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src.txt");
        let dest = dir.path().join("out").join("dest.txt");
        fs::write(&src, b"payload").unwrap();
        copy_file_atomic(&src, &dest).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"payload");
    }
}
