use thiserror::Error;

use crate::game::types::{EntityId, EntityKind, SlotIndex};

/// Recoverable failures of the sync core. None of them is fatal: callers log
/// and turn them into an absent result or a no-op.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyncError {
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    #[error("entity {entity} not found in slot {slot}")]
    NotFound { entity: EntityId, slot: SlotIndex },
    #[error("slot {0} does not exist")]
    UnknownSlot(SlotIndex),
    #[error("no inactive {0} left in the pool")]
    PoolExhausted(EntityKind),
    #[error("remote message references unknown entity {0}")]
    DesyncPossible(EntityId),
}

impl SyncError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        SyncError::InvalidOperation(reason.into())
    }
}
