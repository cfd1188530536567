//! Indexed certificate/key pair storage.
//!
//! Pair `i` lives in `{i:04}.crt` and `{i:04}.key`. Writing a new list
//! reconciles the directory against it: slots whose content already matches
//! are left alone, differing or missing halves are rewritten and slots past
//! the end of the list are deleted.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, info, warn};

use crate::backend::CredentialBackend;
use crate::error::{CertError, CertResult};

const CERT_EXT: &str = "crt";
const KEY_EXT: &str = "key";
const MAX_PAIRS: usize = 10_000;

/// A PEM certificate chain and its private key.
#[derive(Clone, PartialEq, Eq)]
pub struct TlsKeyPair {
    pub certificate: String,
    pub key: String,
}

impl TlsKeyPair {
    pub fn new(certificate: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            certificate: certificate.into(),
            key: key.into(),
        }
    }
}

impl fmt::Debug for TlsKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsKeyPair")
            .field("certificate", &self.certificate)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Files touched by [`CredentialStore::write`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub written: Vec<String>,
    pub unchanged: Vec<String>,
    pub removed: Vec<String>,
}

impl ReconcileReport {
    /// True if the directory already matched.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.written.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Default)]
struct Slot {
    certificate: Option<String>,
    key: Option<String>,
}

/// Certificate/key pairs on top of a [`CredentialBackend`].
#[derive(Debug)]
pub struct CredentialStore<B> {
    backend: B,
}

impl<B: CredentialBackend> CredentialStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Reads every stored pair in slot order.
    ///
    /// Fails if a slot is missing one half or the slot numbers have a gap.
    pub fn read(&self) -> CertResult<Vec<TlsKeyPair>> {
        self.backend.prepare()?;
        let slots = self.slots()?;
        let mut pairs = Vec::with_capacity(slots.len());
        for (expected, (index, slot)) in slots.into_iter().enumerate() {
            if index != expected {
                return Err(CertError::Corrupted(format!(
                    "missing slot {}",
                    slot_name(expected, CERT_EXT)
                )));
            }
            let certificate = slot.certificate.ok_or_else(|| {
                CertError::Corrupted(format!("missing {}", slot_name(index, CERT_EXT)))
            })?;
            let key = slot.key.ok_or_else(|| {
                CertError::Corrupted(format!("missing {}", slot_name(index, KEY_EXT)))
            })?;
            pairs.push(TlsKeyPair {
                certificate: self.backend.read(&certificate)?,
                key: self.backend.read(&key)?,
            });
        }
        Ok(pairs)
    }

    /// Makes the directory hold exactly `pairs`, touching as little as
    /// possible.
    pub fn write(&self, pairs: &[TlsKeyPair]) -> CertResult<ReconcileReport> {
        if pairs.len() > MAX_PAIRS {
            return Err(CertError::TooManyPairs(pairs.len()));
        }
        self.backend.prepare()?;
        let mut slots = self.slots()?;
        let mut report = ReconcileReport::default();

        for (index, pair) in pairs.iter().enumerate() {
            let slot = slots.remove(&index).unwrap_or_default();
            self.sync_file(index, CERT_EXT, slot.certificate, &pair.certificate, &mut report)?;
            self.sync_file(index, KEY_EXT, slot.key, &pair.key, &mut report)?;
        }

        // Whatever is left sits past the end of the new list.
        for slot in slots.into_values() {
            for name in [slot.certificate, slot.key].into_iter().flatten() {
                self.backend.remove(&name)?;
                debug!(file = %name, "removed stale credential");
                report.removed.push(name);
            }
        }

        if !report.is_noop() {
            info!(
                written = report.written.len(),
                removed = report.removed.len(),
                "updated chrony credentials"
            );
        }
        Ok(report)
    }

    fn sync_file(
        &self,
        index: usize,
        ext: &str,
        existing: Option<String>,
        desired: &str,
        report: &mut ReconcileReport,
    ) -> CertResult<()> {
        let name = slot_name(index, ext);
        if existing.is_some() && self.backend.read(&name)? == desired {
            report.unchanged.push(name);
            return Ok(());
        }
        self.backend.write(&name, desired)?;
        report.written.push(name);
        Ok(())
    }

    /// Groups conforming file names by slot index.
    fn slots(&self) -> CertResult<BTreeMap<usize, Slot>> {
        let mut slots: BTreeMap<usize, Slot> = BTreeMap::new();
        for name in self.backend.list()? {
            let Some((stem, ext)) = name.rsplit_once('.') else {
                continue;
            };
            if ext != CERT_EXT && ext != KEY_EXT {
                continue;
            }
            let Some(index) = parse_index(stem) else {
                warn!(file = %name, "ignoring credential file with a non-numeric name");
                continue;
            };
            let slot = slots.entry(index).or_default();
            if ext == CERT_EXT {
                slot.certificate = Some(name);
            } else {
                slot.key = Some(name);
            }
        }
        Ok(slots)
    }
}

fn slot_name(index: usize, ext: &str) -> String {
    format!("{index:04}.{ext}")
}

fn parse_index(stem: &str) -> Option<usize> {
    if stem.len() != 4 || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok()
}
