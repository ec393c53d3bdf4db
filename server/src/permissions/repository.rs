//! Durable storage for ledgers.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use super::error::{GrantError, Result};
use super::ledger::Ledger;

/// Storage backend for one community's ledger.
///
/// `save` must not return until the document is durable.
pub trait LedgerRepository: Send + Sync {
    /// Load the stored ledger, or an empty one if nothing has been stored yet.
    fn load(&self) -> Result<Ledger>;

    /// Replace the stored ledger with `ledger`.
    fn save(&self, ledger: &Ledger) -> Result<()>;
}

/// JSON file repository.
///
/// Every save rewrites the full document: it is written to a sibling
/// temporary file, flushed to disk and renamed over the target.
#[derive(Debug, Clone)]
pub struct FileLedgerRepository {
    path: PathBuf,
}

impl FileLedgerRepository {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl LedgerRepository for FileLedgerRepository {
    fn load(&self) -> Result<Ledger> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ledger::from_json(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Ledger::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, ledger: &Ledger) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = ledger.to_json()?;
        let temp = self.temp_path();
        let written = std::fs::File::create(&temp).and_then(|mut file| {
            file.write_all(contents.as_bytes())?;
            file.sync_all()
        });
        if let Err(e) = written.and_then(|()| std::fs::rename(&temp, &self.path)) {
            let _ = std::fs::remove_file(&temp);
            return Err(e.into());
        }
        tracing::debug!(path = %self.path.display(), "Ledger saved");
        Ok(())
    }
}

/// In-memory repository (for testing).
///
/// Clones share state, so a test can keep a handle to inspect what was saved
/// or to make subsequent saves fail.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedgerRepository {
    stored: Arc<Mutex<Option<Ledger>>>,
    fail_saves: Arc<AtomicBool>,
    fail_after: Arc<Mutex<Option<usize>>>,
    saves: Arc<AtomicUsize>,
}

impl InMemoryLedgerRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an already-stored ledger.
    #[must_use]
    pub fn with_ledger(ledger: Ledger) -> Self {
        let repo = Self::default();
        *repo.stored.lock().unwrap_or_else(PoisonError::into_inner) = Some(ledger);
        repo
    }

    /// Make every following save fail with an I/O error.
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Let `successes` more saves through, then fail every one after them.
    pub fn fail_after(&self, successes: usize) {
        *self.fail_after.lock().unwrap_or_else(PoisonError::into_inner) = Some(successes);
    }

    /// Number of successful saves.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Last successfully saved ledger.
    #[must_use]
    pub fn stored(&self) -> Option<Ledger> {
        self.stored
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl LedgerRepository for InMemoryLedgerRepository {
    fn load(&self) -> Result<Ledger> {
        Ok(self.stored().unwrap_or_default())
    }

    fn save(&self, ledger: &Ledger) -> Result<()> {
        let budget_spent = {
            let mut budget = self.fail_after.lock().unwrap_or_else(PoisonError::into_inner);
            match budget.as_mut() {
                Some(0) => true,
                Some(left) => {
                    *left -= 1;
                    false
                }
                None => false,
            }
        };
        if budget_spent || self.fail_saves.load(Ordering::SeqCst) {
            return Err(GrantError::Storage(std::io::Error::other(
                "simulated write failure",
            )));
        }
        *self.stored.lock().unwrap_or_else(PoisonError::into_inner) = Some(ledger.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
