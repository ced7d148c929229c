use crate::{InvariantViolation, MessageSegment};

/// Holds at most one segment across a block boundary.
///
/// A deferred segment has priority over segments of the next inbox message, so the driver must
/// take it before decoding anything new.
#[derive(Debug, Clone, Default)]
pub struct DeferredSegmentSlot {
    segment: Option<MessageSegment>,
}

impl DeferredSegmentSlot {
    /// Creates an empty slot.
    pub const fn new() -> Self {
        Self { segment: None }
    }

    /// Stores `segment`. Fails when the slot is occupied; the offered segment is not stored and
    /// the one already waiting is kept.
    pub fn offer(&mut self, segment: MessageSegment) -> Result<(), InvariantViolation> {
        if let Some(occupied) = &self.segment {
            return Err(InvariantViolation::DeferredSlotOccupied {
                occupied_by: occupied.origin,
                offered: segment.origin,
            });
        }
        self.segment = Some(segment);
        Ok(())
    }

    /// Removes and returns the waiting segment.
    pub fn take_if_present(&mut self) -> Option<MessageSegment> {
        self.segment.take()
    }

    /// The waiting segment.
    pub const fn peek(&self) -> Option<&MessageSegment> {
        self.segment.as_ref()
    }

    /// Whether a segment is waiting.
    pub const fn is_occupied(&self) -> bool {
        self.segment.is_some()
    }
}
