//! Operator override requests.
//!
//! The command channel decodes an operator message into a state name and
//! drops it into the [`OverrideSlot`]. The control unit takes it at the start
//! of the next tick. An empty slot (`None`) is the "no request" sentinel.
//! The name is stored as written; resolving it is the control unit's job, so
//! an unknown name is still accepted here and rejected there.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use heapless::String;
use thiserror::Error;

use crate::consts::OVERRIDE_NAME_CAPACITY;

/// Override request name (fixed capacity, no heap).
pub type OverrideName = String<OVERRIDE_NAME_CAPACITY>;

/// Errors raised when submitting an override request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Request name does not fit the slot.
    #[error("override name is {len} bytes, slot holds {capacity}")]
    NameTooLong { len: usize, capacity: usize },
    /// Request name is blank.
    #[error("override name is empty")]
    EmptyName,
}

/// Single-writer / single-reader override slot.
#[derive(Debug, Clone, Default)]
pub struct OverrideSlot {
    inner: Arc<Mutex<Option<OverrideName>>>,
}

impl OverrideSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<OverrideName>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Submit a request, replacing any request not yet consumed.
    pub fn request(&self, name: &str) -> Result<(), CommandError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CommandError::EmptyName);
        }
        let mut buf = OverrideName::new();
        buf.push_str(name).map_err(|_| CommandError::NameTooLong {
            len: name.len(),
            capacity: OVERRIDE_NAME_CAPACITY,
        })?;
        *self.lock() = Some(buf);
        Ok(())
    }

    /// Take the pending request, leaving the slot empty.
    pub fn take(&self) -> Option<OverrideName> {
        self.lock().take()
    }

    pub fn is_pending(&self) -> bool {
        self.lock().is_some()
    }
}
