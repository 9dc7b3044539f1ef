//! Presentation Arrays
//!
//! What the host renders for each node:
//! - kind: Block, Text or Container
//! - presentation: settled opacity/offset (written instantly)
//! - transition: an in-flight change sampled at host time
//! - textContent: plain text of a text node
//! - glyphs: per-glyph run while a text node is split for animation
//! - backgroundOffset: parallax shift of a container's background
//!
//! Every write bumps a per-index mutation counter and the shared change
//! signal, so a render effect can track one value instead of every array.

use std::cell::{Cell, RefCell};

use spark_signals::{signal, Signal};

use super::ensure_len;
use crate::animation::transition::Transition;
use crate::types::{NodeKind, Offset, Presentation, Seconds};

// =============================================================================
// Glyph
// =============================================================================

/// One rendered glyph of a split text node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    /// Character to draw (spaces are already replaced by spacers).
    pub ch: char,
    /// Settled presentation before any transition is committed.
    pub presentation: Presentation,
    /// Committed transition, if the glyph's reveal has started.
    pub transition: Option<Transition>,
}

impl Glyph {
    /// Presentation at host time `now`.
    pub fn sample(&self, now: Seconds) -> Presentation {
        match self.transition {
            Some(transition) => transition.sample(now),
            None => self.presentation,
        }
    }
}

// =============================================================================
// Arrays
// =============================================================================

thread_local! {
    static KIND: RefCell<Vec<NodeKind>> = const { RefCell::new(Vec::new()) };
    static PRESENTATION: RefCell<Vec<Presentation>> = const { RefCell::new(Vec::new()) };
    static TRANSITION: RefCell<Vec<Option<Transition>>> = const { RefCell::new(Vec::new()) };
    static TEXT_CONTENT: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
    static GLYPHS: RefCell<Vec<Option<Vec<Glyph>>>> = const { RefCell::new(Vec::new()) };
    static BACKGROUND_OFFSET: RefCell<Vec<Offset>> = const { RefCell::new(Vec::new()) };

    /// Writes per index since allocation.
    static MUTATIONS: RefCell<Vec<u64>> = const { RefCell::new(Vec::new()) };

    /// Writes across all nodes. Monotonic, survives resets.
    static TOTAL_MUTATIONS: Cell<u64> = const { Cell::new(0) };

    /// Bumped on every write so render effects can track presentation changes.
    static CHANGE: Signal<u64> = signal(0);
}

// =============================================================================
// Capacity Management
// =============================================================================

/// Ensure arrays have capacity for the given index.
pub fn ensure_capacity(index: usize) {
    KIND.with(|arr| ensure_len(&mut arr.borrow_mut(), index));
    PRESENTATION.with(|arr| ensure_len(&mut arr.borrow_mut(), index));
    TRANSITION.with(|arr| ensure_len(&mut arr.borrow_mut(), index));
    TEXT_CONTENT.with(|arr| ensure_len(&mut arr.borrow_mut(), index));
    GLYPHS.with(|arr| ensure_len(&mut arr.borrow_mut(), index));
    BACKGROUND_OFFSET.with(|arr| ensure_len(&mut arr.borrow_mut(), index));
    MUTATIONS.with(|arr| ensure_len(&mut arr.borrow_mut(), index));
}

/// Clear values at index.
pub fn clear_at_index(index: usize) {
    fn clear<T: Default>(values: &mut [T], index: usize) {
        if let Some(slot) = values.get_mut(index) {
            *slot = T::default();
        }
    }
    KIND.with(|arr| clear(&mut arr.borrow_mut(), index));
    PRESENTATION.with(|arr| clear(&mut arr.borrow_mut(), index));
    TRANSITION.with(|arr| clear(&mut arr.borrow_mut(), index));
    TEXT_CONTENT.with(|arr| clear(&mut arr.borrow_mut(), index));
    GLYPHS.with(|arr| clear(&mut arr.borrow_mut(), index));
    BACKGROUND_OFFSET.with(|arr| clear(&mut arr.borrow_mut(), index));
    MUTATIONS.with(|arr| clear(&mut arr.borrow_mut(), index));
}

/// Reset all arrays.
pub fn reset() {
    KIND.with(|arr| arr.borrow_mut().clear());
    PRESENTATION.with(|arr| arr.borrow_mut().clear());
    TRANSITION.with(|arr| arr.borrow_mut().clear());
    TEXT_CONTENT.with(|arr| arr.borrow_mut().clear());
    GLYPHS.with(|arr| arr.borrow_mut().clear());
    BACKGROUND_OFFSET.with(|arr| arr.borrow_mut().clear());
    MUTATIONS.with(|arr| arr.borrow_mut().clear());
}

// =============================================================================
// Mutation Tracking
// =============================================================================

fn mark_mutated(index: usize) {
    MUTATIONS.with(|arr| {
        let mut arr = arr.borrow_mut();
        ensure_len(&mut arr, index);
        arr[index] += 1;
    });
    TOTAL_MUTATIONS.with(|total| total.set(total.get() + 1));
    CHANGE.with(|change| change.set(change.get() + 1));
}

/// Number of presentation writes at `index` since it was allocated.
pub fn mutation_count(index: usize) -> u64 {
    MUTATIONS.with(|arr| arr.borrow().get(index).copied().unwrap_or(0))
}

/// Number of presentation writes across all nodes.
pub fn total_mutations() -> u64 {
    TOTAL_MUTATIONS.with(|total| total.get())
}

/// Signal bumped on every presentation write.
pub fn change_signal() -> Signal<u64> {
    CHANGE.with(|change| change.clone())
}

// =============================================================================
// Kind
// =============================================================================

pub fn get_kind(index: usize) -> NodeKind {
    KIND.with(|arr| arr.borrow().get(index).copied().unwrap_or_default())
}

pub fn set_kind(index: usize, kind: NodeKind) {
    KIND.with(|arr| {
        let mut arr = arr.borrow_mut();
        ensure_len(&mut arr, index);
        arr[index] = kind;
    });
}

// =============================================================================
// Presentation + Transition
// =============================================================================

/// Settled presentation at index (ignores any in-flight transition).
pub fn get_presentation(index: usize) -> Presentation {
    PRESENTATION.with(|arr| arr.borrow().get(index).copied().unwrap_or_default())
}

/// Set presentation instantly, cancelling any in-flight transition.
pub fn set_presentation(index: usize, presentation: Presentation) {
    PRESENTATION.with(|arr| {
        let mut arr = arr.borrow_mut();
        ensure_len(&mut arr, index);
        arr[index] = presentation;
    });
    TRANSITION.with(|arr| {
        if let Some(slot) = arr.borrow_mut().get_mut(index) {
            *slot = None;
        }
    });
    mark_mutated(index);
}

/// In-flight transition at index.
pub fn get_transition(index: usize) -> Option<Transition> {
    TRANSITION.with(|arr| arr.borrow().get(index).copied().flatten())
}

/// Commit a transition. The settled presentation becomes its target.
pub fn set_transition(index: usize, transition: Transition) {
    TRANSITION.with(|arr| {
        let mut arr = arr.borrow_mut();
        ensure_len(&mut arr, index);
        arr[index] = Some(transition);
    });
    PRESENTATION.with(|arr| {
        let mut arr = arr.borrow_mut();
        ensure_len(&mut arr, index);
        arr[index] = transition.to;
    });
    mark_mutated(index);
}

/// Presentation at host time `now`, sampling any committed transition.
pub fn sample_presentation(index: usize, now: Seconds) -> Presentation {
    match get_transition(index) {
        Some(transition) => transition.sample(now),
        None => get_presentation(index),
    }
}

// =============================================================================
// Text Content
// =============================================================================

pub fn get_text_content(index: usize) -> String {
    TEXT_CONTENT.with(|arr| arr.borrow().get(index).cloned().unwrap_or_default())
}

pub fn set_text_content(index: usize, content: String) {
    TEXT_CONTENT.with(|arr| {
        let mut arr = arr.borrow_mut();
        ensure_len(&mut arr, index);
        arr[index] = content;
    });
    mark_mutated(index);
}

// =============================================================================
// Glyph Runs
// =============================================================================

/// Replace the glyph run at index.
pub fn set_glyphs(index: usize, glyphs: Vec<Glyph>) {
    GLYPHS.with(|arr| {
        let mut arr = arr.borrow_mut();
        ensure_len(&mut arr, index);
        arr[index] = Some(glyphs);
    });
    mark_mutated(index);
}

/// Drop the glyph run at index (the node renders its plain text again).
pub fn clear_glyphs(index: usize) {
    let had_glyphs = GLYPHS.with(|arr| {
        arr.borrow_mut()
            .get_mut(index)
            .map(|slot| slot.take().is_some())
            .unwrap_or(false)
    });
    if had_glyphs {
        mark_mutated(index);
    }
}

pub fn get_glyphs(index: usize) -> Option<Vec<Glyph>> {
    GLYPHS.with(|arr| arr.borrow().get(index).cloned().flatten())
}

pub fn glyph_count(index: usize) -> usize {
    GLYPHS.with(|arr| {
        arr.borrow()
            .get(index)
            .and_then(|run| run.as_ref().map(Vec::len))
            .unwrap_or(0)
    })
}

/// Commit a transition on one glyph. Ignored if the run has no such glyph.
pub fn set_glyph_transition(index: usize, glyph: usize, transition: Transition) {
    let applied = GLYPHS.with(|arr| {
        let mut arr = arr.borrow_mut();
        let Some(Some(run)) = arr.get_mut(index) else {
            return false;
        };
        let Some(target) = run.get_mut(glyph) else {
            return false;
        };
        target.presentation = transition.to;
        target.transition = Some(transition);
        true
    });
    if applied {
        mark_mutated(index);
    }
}

/// Presentation of one glyph at host time `now`.
pub fn sample_glyph(index: usize, glyph: usize, now: Seconds) -> Option<Presentation> {
    GLYPHS.with(|arr| {
        arr.borrow()
            .get(index)
            .and_then(|run| run.as_ref())
            .and_then(|run| run.get(glyph))
            .map(|g| g.sample(now))
    })
}

// =============================================================================
// Background Offset
// =============================================================================

pub fn get_background_offset(index: usize) -> Offset {
    BACKGROUND_OFFSET.with(|arr| arr.borrow().get(index).copied().unwrap_or_default())
}

pub fn set_background_offset(index: usize, offset: Offset) {
    BACKGROUND_OFFSET.with(|arr| {
        let mut arr = arr.borrow_mut();
        ensure_len(&mut arr, index);
        arr[index] = offset;
    });
    mark_mutated(index);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::transition::Easing;

    fn setup() {
        reset();
    }

    #[test]
    fn test_set_presentation_counts_mutation() {
        setup();
        ensure_capacity(0);

        let before = total_mutations();
        set_presentation(0, Presentation::hidden(Offset::new(0.0, 20.0)));
        assert_eq!(mutation_count(0), 1);
        assert_eq!(total_mutations(), before + 1);
        assert_eq!(get_presentation(0).opacity, 0.0);
    }

    #[test]
    fn test_transition_sampling() {
        setup();
        ensure_capacity(0);

        let from = Presentation::hidden(Offset::new(30.0, 0.0));
        set_presentation(0, from);
        set_transition(0, Transition::new(from, Presentation::REVEALED, 1.0, 0.6, Easing::Ease));

        assert_eq!(sample_presentation(0, 0.5), from);
        assert_eq!(sample_presentation(0, 2.0), Presentation::REVEALED);
        assert_eq!(get_presentation(0), Presentation::REVEALED);

        // Instant write cancels the transition
        set_presentation(0, from);
        assert!(get_transition(0).is_none());
        assert_eq!(sample_presentation(0, 5.0), from);
    }

    #[test]
    fn test_glyph_transition_out_of_range_is_ignored() {
        setup();
        ensure_capacity(0);

        let hidden = Presentation::hidden(Offset::new(0.0, 20.0));
        set_glyphs(0, vec![Glyph { ch: 'a', presentation: hidden, transition: None }]);
        let before = mutation_count(0);

        let t = Transition::new(hidden, Presentation::REVEALED, 0.0, 0.4, Easing::Ease);
        set_glyph_transition(0, 5, t);
        assert_eq!(mutation_count(0), before);

        set_glyph_transition(0, 0, t);
        assert_eq!(mutation_count(0), before + 1);
        assert_eq!(sample_glyph(0, 0, 1.0), Some(Presentation::REVEALED));
    }

    #[test]
    fn test_clear_glyphs_only_counts_when_present() {
        setup();
        ensure_capacity(0);

        clear_glyphs(0);
        assert_eq!(mutation_count(0), 0);

        set_glyphs(0, Vec::new());
        clear_glyphs(0);
        assert_eq!(mutation_count(0), 2);
        assert!(get_glyphs(0).is_none());
    }

    #[test]
    fn test_change_signal_bumps() {
        setup();
        ensure_capacity(0);

        let change = change_signal();
        let before = change.get();
        set_background_offset(0, Offset::new(4.0, -4.0));
        assert_eq!(change.get(), before + 1);
        assert_eq!(get_background_offset(0), Offset::new(4.0, -4.0));
    }
}
