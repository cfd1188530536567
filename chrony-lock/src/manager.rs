use tracing::{debug, info, warn};

use crate::error::{LockError, LockResult};
use crate::storage::LockStorage;

/// Ownership of the lock as seen by one instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockState {
    Unowned,
    OwnedBySelf,
    OwnedByOther(String),
}

/// Cooperative single-owner lock.
///
/// There is no expiry: a marker stays until its owner releases it.
#[derive(Debug)]
pub struct LockManager<S> {
    storage: S,
}

impl<S: LockStorage> LockManager<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Current owner identity, if any.
    pub fn owner(&self) -> LockResult<Option<String>> {
        Ok(self
            .storage
            .read()?
            .map(|owner| owner.trim().to_string())
            .filter(|owner| !owner.is_empty()))
    }

    pub fn state(&self, identity: &str) -> LockResult<LockState> {
        let identity = normalize(identity)?;
        Ok(match self.owner()? {
            None => LockState::Unowned,
            Some(owner) if owner == identity => LockState::OwnedBySelf,
            Some(owner) => LockState::OwnedByOther(owner),
        })
    }

    /// Takes the lock for `identity` or confirms it already holds it.
    ///
    /// Returns false without touching the marker when another instance owns
    /// it.
    pub fn try_acquire(&self, identity: &str) -> LockResult<bool> {
        let identity = normalize(identity)?;
        if self.owner()?.is_none() && self.storage.create(identity)? {
            info!(owner = identity, "acquired agent lock");
            return Ok(true);
        }
        // Either held already or another instance won the create race.
        match self.owner()? {
            Some(owner) if owner == identity => {
                debug!(owner = identity, "agent lock already held");
                Ok(true)
            }
            Some(owner) => {
                warn!(owner = %owner, requester = identity, "agent lock held by another instance");
                Ok(false)
            }
            None => {
                warn!(requester = identity, "agent lock marker exists but names no owner");
                Ok(false)
            }
        }
    }

    /// Drops the lock held by `identity`.
    ///
    /// Releasing an unowned lock is a no-op. Releasing a lock held by another
    /// instance is a coordination bug and fails with [`LockError::NotOwner`].
    pub fn release(&self, identity: &str) -> LockResult<()> {
        let identity = normalize(identity)?;
        match self.owner()? {
            Some(owner) if owner != identity => Err(LockError::NotOwner {
                requester: identity.to_string(),
                owner: Some(owner),
            }),
            owner => {
                self.storage.remove()?;
                if owner.is_some() {
                    info!(owner = identity, "released agent lock");
                } else {
                    debug!(requester = identity, "agent lock already free");
                }
                Ok(())
            }
        }
    }
}

fn normalize(identity: &str) -> LockResult<&str> {
    let identity = identity.trim();
    if identity.is_empty() {
        return Err(LockError::InvalidIdentity);
    }
    Ok(identity)
}
