//! Atomic file writes that leave identical files untouched.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// What happened to one output path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
  Written,
  Unchanged,
}

/// Write `contents` to `path` unless it already holds exactly those bytes.
///
/// The new contents go to a temporary file in the same directory which is
/// then renamed over `path`, so readers never see a partial file.
pub fn write_if_changed(path: &Path, contents: &[u8]) -> io::Result<WriteOutcome> {
  match fs::read(path) {
    Ok(existing) if existing == contents => return Ok(WriteOutcome::Unchanged),
    Ok(_) => {}
    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
    Err(e) => return Err(e),
  }

  let parent = match path.parent() {
    Some(p) if !p.as_os_str().is_empty() => p,
    _ => Path::new("."),
  };
  fs::create_dir_all(parent)?;

  let mut temp = NamedTempFile::new_in(parent)?;
  temp.write_all(contents)?;
  temp.as_file().sync_all()?;
  temp.persist(path).map_err(|e| e.error)?;

  Ok(WriteOutcome::Written)
}
