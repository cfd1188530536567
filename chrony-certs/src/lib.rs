//! NTS server credentials for chrony.
//!
//! Each configured certificate/key pair is stored as two files in a private
//! directory readable only by the chrony service account:
//!
//! ```text
//! /etc/chrony/certs/0000.crt
//! /etc/chrony/certs/0000.key
//! /etc/chrony/certs/0001.crt
//! /etc/chrony/certs/0001.key
//! ```
//!
//! [`CredentialStore::write`] reconciles the directory so unchanged pairs are
//! not rewritten and removed pairs are deleted.

mod backend;
mod error;
mod store;

pub use backend::{
    CredentialBackend, FsCredentialBackend, MemoryCredentialBackend, CERTS_DIR, SERVICE_USER,
};
pub use error::{CertError, CertResult};
pub use store::{CredentialStore, ReconcileReport, TlsKeyPair};
