//! Epoch arithmetic and checkpoint recovery.
//!
//! The id space is split into epochs: epoch 0 starts at id 0, every later
//! epoch `n` starts at `10^17 + (n - 1) * 10^15`. Each epoch is written as
//! `<n>.csv`, and the next epoch to run is recovered from those filenames.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::{Result, COMBINED_STEM, EPOCH_BASE_ID, EPOCH_ID_INCREMENT};

/// Inclusive starting cursor for `epoch`. Epochs are open ended upward.
pub fn epoch_start(epoch: u64) -> u128 {
    match epoch {
        0 => 0,
        n => EPOCH_BASE_ID + u128::from(n - 1) * EPOCH_ID_INCREMENT,
    }
}

/// Path of the checkpoint file for `epoch` inside `dir`.
pub fn checkpoint_path(dir: impl AsRef<Path>, epoch: u64) -> PathBuf {
    dir.as_ref().join(format!("{epoch}.csv"))
}

/// Parses a checkpoint filename. Only `.csv` files with plain ASCII digit stems count.
fn checkpoint_epoch(path: &Path) -> Option<u64> {
    if path.extension()? != "csv" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok()
}

/// Every epoch that has a checkpoint in `dir`, ascending. A missing directory has none.
pub fn written_epochs(dir: impl AsRef<Path>) -> Result<Vec<u64>> {
    let entries = match std::fs::read_dir(dir.as_ref()) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut epochs = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Some(epoch) = checkpoint_epoch(&entry.path()) {
            epochs.push(epoch);
        }
    }
    epochs.sort_unstable();
    Ok(epochs)
}

/// Every `.csv` file in `dir` except the combined archive. Checkpoints come
/// first in epoch order, then any other CSV by name.
pub fn csv_files(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let entries = match std::fs::read_dir(dir.as_ref()) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type()?.is_file() || path.extension().map_or(true, |ext| ext != "csv") {
            continue;
        }
        if path.file_stem().is_some_and(|stem| stem == COMBINED_STEM) {
            continue;
        }
        files.push(path);
    }
    files.sort_by_cached_key(|path| {
        let epoch = checkpoint_epoch(path);
        (epoch.is_none(), epoch, path.clone())
    });
    Ok(files)
}

/// The epoch to run next: one past the highest checkpoint, or 0 if there is none.
///
/// Gaps are not filled in. An epoch that produced no posts leaves no file
/// behind, so it will be handed out again.
pub fn resolve_next_epoch(dir: impl AsRef<Path>) -> Result<u64> {
    Ok(written_epochs(dir)?
        .last()
        .map(|last| last.saturating_add(1))
        .unwrap_or(0))
}
