//! Run-scoped temporary artifacts.
//!
//! Every run gets its own directory under the configured temp directory, so two
//! runs pointed at the same temp directory never share file names. Each file the
//! run creates is registered with a [`Retention`] class that decides whether it
//! survives when intermediates are kept. Files the caller supplied are never
//! registered and therefore never removed.
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::error::Result;

/// How an artifact is treated at cleanup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    /// Internal only; removed at cleanup regardless of settings
    Transient,
    /// Removed at cleanup unless intermediates are kept
    Intermediate,
}

#[derive(Debug)]
pub struct ArtifactLedger {
    run_dir: TempDir,
    entries: Vec<(PathBuf, Retention)>,
    keep_intermediates: bool,
}

impl ArtifactLedger {
    /// Create a fresh run directory inside `temp_root`
    pub fn create(temp_root: &Path, keep_intermediates: bool) -> Result<Self> {
        let run_dir = tempfile::Builder::new()
            .prefix("sen2prep_")
            .tempdir_in(temp_root)?;
        debug!("Run directory: {:?}", run_dir.path());
        Ok(Self {
            run_dir,
            entries: Vec::new(),
            keep_intermediates,
        })
    }

    pub fn run_dir(&self) -> &Path {
        self.run_dir.path()
    }

    /// Reserve `<run_dir>/<stem>.<extension>` for an artifact the run is about to write
    pub fn allocate(&mut self, stem: &str, extension: &str, retention: Retention) -> PathBuf {
        let path = self.run_dir.path().join(format!("{stem}.{extension}"));
        self.entries.push((path.clone(), retention));
        path
    }

    /// Paths currently registered, in allocation order
    pub fn registered(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|(p, _)| p.as_path())
    }

    /// Delete an artifact now and stop tracking it
    pub fn release(&mut self, path: &Path) -> Result<()> {
        self.entries.retain(|(p, _)| p != path);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Remove every transient artifact, and every intermediate unless intermediates
    /// are kept, then return what is left in the run directory. When intermediates
    /// are kept the directory also keeps files other programs wrote into it.
    pub fn cleanup(self) -> Vec<PathBuf> {
        for (path, retention) in &self.entries {
            if !path.exists() {
                continue;
            }
            if *retention == Retention::Intermediate && self.keep_intermediates {
                continue;
            }
            if let Err(e) = fs::remove_file(path) {
                warn!("Failed to remove temporary file {:?}: {}", path, e);
            }
        }

        let retained = if self.keep_intermediates {
            self.leftovers()
        } else {
            Vec::new()
        };

        if retained.is_empty() {
            let dir = self.run_dir.path().to_path_buf();
            if let Err(e) = self.run_dir.close() {
                warn!("Failed to remove run directory {:?}: {}", dir, e);
            }
        } else {
            let dir = self.run_dir.keep();
            info!("Keeping intermediates in {:?}", dir);
        }
        retained
    }

    /// Ledger entries still on disk in allocation order, then anything else
    /// found in the run directory sorted by name
    fn leftovers(&self) -> Vec<PathBuf> {
        let mut kept: Vec<PathBuf> = self
            .entries
            .iter()
            .map(|(p, _)| p.clone())
            .filter(|p| p.exists())
            .collect();
        let mut foreign: Vec<PathBuf> = match fs::read_dir(self.run_dir.path()) {
            Ok(entries) => entries
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| !kept.contains(p))
                .collect(),
            Err(e) => {
                warn!("Failed to list run directory {:?}: {}", self.run_dir.path(), e);
                Vec::new()
            }
        };
        foreign.sort();
        kept.append(&mut foreign);
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn everything_goes_without_retention() {
        let root = tempfile::tempdir().unwrap();
        let mut ledger = ArtifactLedger::create(root.path(), false).unwrap();
        let stack = ledger.allocate("tmp_allbands", "img", Retention::Intermediate);
        let proxy = ledger.allocate("angles_resampled", "vrt", Retention::Transient);
        touch(&stack);
        touch(&proxy);

        assert!(ledger.cleanup().is_empty());
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn retention_keeps_intermediates_only() {
        let root = tempfile::tempdir().unwrap();
        let mut ledger = ArtifactLedger::create(root.path(), true).unwrap();
        let stack = ledger.allocate("tmp_allbands", "img", Retention::Intermediate);
        let proxy = ledger.allocate("angles_resampled", "vrt", Retention::Transient);
        touch(&stack);
        touch(&proxy);

        let kept = ledger.cleanup();
        assert_eq!(kept, vec![stack.clone()]);
        assert!(stack.exists());
        assert!(!proxy.exists());
    }

    #[test]
    fn released_files_are_gone_and_untracked() {
        let root = tempfile::tempdir().unwrap();
        let mut ledger = ArtifactLedger::create(root.path(), true).unwrap();
        let band = ledger.allocate("tmp_B01", "vrt", Retention::Transient);
        touch(&band);
        ledger.release(&band).unwrap();
        assert!(!band.exists());
        assert_eq!(ledger.registered().count(), 0);
        assert!(ledger.cleanup().is_empty());
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn retention_keeps_files_written_by_other_programs() {
        let root = tempfile::tempdir().unwrap();
        let ledger = ArtifactLedger::create(root.path(), true).unwrap();
        let foreign = ledger.run_dir().join("fmask_intermediate_cloudprob.img");
        touch(&foreign);

        assert_eq!(ledger.cleanup(), vec![foreign.clone()]);
        assert!(foreign.exists());
    }

    #[test]
    fn foreign_files_go_without_retention() {
        let root = tempfile::tempdir().unwrap();
        let ledger = ArtifactLedger::create(root.path(), false).unwrap();
        touch(&ledger.run_dir().join("fmask_intermediate_cloudprob.img"));

        assert!(ledger.cleanup().is_empty());
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn empty_run_directory_is_removed_even_with_retention() {
        let root = tempfile::tempdir().unwrap();
        let ledger = ArtifactLedger::create(root.path(), true).unwrap();
        assert!(ledger.cleanup().is_empty());
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn concurrent_ledgers_do_not_share_a_directory() {
        let root = tempfile::tempdir().unwrap();
        let a = ArtifactLedger::create(root.path(), false).unwrap();
        let b = ArtifactLedger::create(root.path(), false).unwrap();
        assert_ne!(a.run_dir(), b.run_dir());
    }

    #[test]
    fn unregistered_files_outside_the_run_are_untouched() {
        let root = tempfile::tempdir().unwrap();
        let supplied = root.path().join("toa.img");
        touch(&supplied);
        let ledger = ArtifactLedger::create(root.path(), false).unwrap();
        ledger.cleanup();
        assert!(supplied.exists());
    }
}
