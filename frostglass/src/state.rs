//! Cache validity tracking for one effect instance.

use tracing::trace;

use crate::target::{Ensured, TargetSlot};

/// How much of the cached work is still valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheState {
    /// Nothing cached can be trusted.
    #[default]
    Empty,
    /// The capture target holds current content; the blur must be redone.
    ActorCached,
    /// The brightness target holds the finished blur of the current content.
    Blurred,
}

/// Work a paint has to do, derived from the [`CacheState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintWork {
    /// Capture the source, blur it and present.
    CaptureAndBlur,
    /// Blur the existing capture and present.
    Blur,
    /// Present the cached result.
    Present,
}

/// Three-state validity tracker driving [`crate::effect::BlurEffect`].
#[derive(Debug, Clone, Default)]
pub struct EffectStateMachine {
    state: CacheState,
}

impl EffectStateMachine {
    /// Starts in [`CacheState::Empty`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> CacheState {
        self.state
    }

    /// The work the next paint must perform.
    pub fn required_work(&self) -> PaintWork {
        match self.state {
            CacheState::Empty => PaintWork::CaptureAndBlur,
            CacheState::ActorCached => PaintWork::Blur,
            CacheState::Blurred => PaintWork::Present,
        }
    }

    /// Content, geometry, sigma or mode changed. Everything is stale.
    pub fn invalidate_all(&mut self) {
        self.transition(CacheState::Empty, "invalidate all");
    }

    /// Only post-capture parameters changed. Keeps a valid capture.
    pub fn invalidate_blur(&mut self) {
        if self.state == CacheState::Blurred {
            self.transition(CacheState::ActorCached, "invalidate blur");
        }
    }

    /// Accounts for a target the cache just (re)allocated. A new capture
    /// target holds no content; a new intermediate target invalidates the
    /// blurred result only.
    pub fn target_ensured(&mut self, slot: TargetSlot, ensured: Ensured) {
        if ensured == Ensured::Reused {
            return;
        }
        match slot {
            TargetSlot::Capture => self.invalidate_all(),
            slot if slot.is_intermediate() => self.invalidate_blur(),
            _ => {}
        }
    }

    /// The capture target was repainted.
    pub fn mark_captured(&mut self) {
        self.transition(CacheState::ActorCached, "captured");
    }

    /// The blur passes completed.
    pub fn mark_blurred(&mut self) {
        self.transition(CacheState::Blurred, "blurred");
    }

    /// A stage failed. The next paint starts over.
    pub fn reset(&mut self) {
        self.transition(CacheState::Empty, "reset");
    }

    fn transition(&mut self, next: CacheState, reason: &'static str) {
        if self.state != next {
            trace!(from = ?self.state, to = ?next, reason, "blur cache state");
        }
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blurred() -> EffectStateMachine {
        let mut machine = EffectStateMachine::new();
        machine.mark_captured();
        machine.mark_blurred();
        machine
    }

    #[test]
    fn work_follows_state() {
        let mut machine = EffectStateMachine::new();
        assert_eq!(machine.required_work(), PaintWork::CaptureAndBlur);
        machine.mark_captured();
        assert_eq!(machine.required_work(), PaintWork::Blur);
        machine.mark_blurred();
        assert_eq!(machine.required_work(), PaintWork::Present);
    }

    #[test]
    fn fine_invalidation_never_reaches_empty() {
        let mut machine = blurred();
        machine.invalidate_blur();
        assert_eq!(machine.state(), CacheState::ActorCached);

        let mut machine = EffectStateMachine::new();
        machine.invalidate_blur();
        assert_eq!(machine.state(), CacheState::Empty);
    }

    #[test]
    fn coarse_invalidation_empties() {
        let mut machine = blurred();
        machine.invalidate_all();
        assert_eq!(machine.state(), CacheState::Empty);

        let mut machine = blurred();
        machine.reset();
        assert_eq!(machine.state(), CacheState::Empty);
    }

    #[test]
    fn fresh_targets_invalidate_by_role() {
        let mut machine = blurred();
        machine.target_ensured(TargetSlot::Capture, Ensured::Reused);
        assert_eq!(machine.state(), CacheState::Blurred);

        machine.target_ensured(TargetSlot::HorizontalPass, Ensured::Allocated);
        assert_eq!(machine.state(), CacheState::ActorCached);

        machine.target_ensured(TargetSlot::Capture, Ensured::Allocated);
        assert_eq!(machine.state(), CacheState::Empty);

        let mut machine = blurred();
        machine.target_ensured(TargetSlot::Backdrop, Ensured::Allocated);
        assert_eq!(machine.state(), CacheState::Blurred);
    }
}
