//! crates/smartstock_core/src/handoff.rs
//!
//! The transfer buffer: a single-slot, single-use channel carrying one
//! finalized draft from the upload wizard to the add-product screen.

use crate::domain::HandoffDraft;
use tracing::debug;
use uuid::Uuid;

/// Holds at most one [`HandoffDraft`]. Writing replaces whatever was there.
///
/// A draft can be claimed while it is being saved; a claimed draft stays
/// visible through [`TransferBuffer::peek`] but cannot be claimed again until
/// it is released or consumed.
#[derive(Debug, Default)]
pub struct TransferBuffer {
    slot: Option<HandoffDraft>,
    claimed: Option<Uuid>,
}

/// Why [`TransferBuffer::claim`] handed nothing out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimError {
    Empty,
    InFlight(Uuid),
}

impl TransferBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a draft, returning the one it replaced (last write wins).
    pub fn put(&mut self, draft: HandoffDraft) -> Option<HandoffDraft> {
        let replaced = self.slot.replace(draft);
        if let Some(old) = &replaced {
            debug!(draft_id = %old.id, "Transfer buffer overwritten");
        }
        replaced
    }

    pub fn peek(&self) -> Option<&HandoffDraft> {
        self.slot.as_ref()
    }

    /// Marks the current draft as being saved and returns a copy of it.
    pub fn claim(&mut self) -> Result<HandoffDraft, ClaimError> {
        let draft = self.slot.as_ref().ok_or(ClaimError::Empty)?;
        if self.claimed == Some(draft.id) {
            return Err(ClaimError::InFlight(draft.id));
        }
        self.claimed = Some(draft.id);
        debug!(draft_id = %draft.id, "Draft claimed");
        Ok(draft.clone())
    }

    /// Drops the claim on `draft_id` so the draft can be saved again.
    pub fn release(&mut self, draft_id: Uuid) {
        if self.claimed == Some(draft_id) {
            self.claimed = None;
        }
    }

    pub fn is_claimed(&self) -> bool {
        matches!((&self.slot, self.claimed), (Some(draft), Some(id)) if draft.id == id)
    }

    /// Clears the slot only if it still holds the draft with `draft_id`.
    ///
    /// Returns whether a draft was removed. A newer draft written in the
    /// meantime is left in place.
    pub fn consume(&mut self, draft_id: Uuid) -> bool {
        self.release(draft_id);
        match &self.slot {
            Some(draft) if draft.id == draft_id => {
                self.slot = None;
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.slot = None;
        self.claimed = None;
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }
}
