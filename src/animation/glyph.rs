//! Glyph Splitter - Per-character staggered text reveals.
//!
//! A text node is split into one [`GlyphUnit`] per character. Each unit gets
//! a delay `base_delay + index * STAGGER_INTERVAL`, and revealing the node
//! schedules one timer per unit that commits the glyph's transition when it
//! fires.
//!
//! Whitespace becomes a no-break space so the run keeps its width while
//! glyphs are still transparent.
//!
//! # Lifecycle
//!
//! ```text
//! split ──▶ schedule_reveal ──▶ timers fire ──▶ transitions committed
//!                │
//!                └── cancel / drop / re-schedule: pending timers cleared
//! ```
//!
//! [`GlyphSequence`] bundles the source text, its units and the live reveal,
//! which is what a text primitive holds on to.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::animation::presets::{self, DEFAULT_DISTANCE};
use crate::animation::transition::{Easing, Transition};
use crate::engine::arrays::presentation::{self, Glyph};
use crate::engine::scheduler::{self, TimerId};
use crate::engine::NodeHandle;
use crate::types::{Direction, Presentation, Seconds};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Delay added per glyph index.
pub const STAGGER_INTERVAL: Seconds = 0.03;

/// Length of every glyph transition.
pub const GLYPH_DURATION: Seconds = 0.4;

/// Spacer rendered in place of whitespace.
pub const SPACER: char = '\u{00A0}';

// =============================================================================
// SPLIT
// =============================================================================

/// One independently animated character.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphUnit {
    pub index: usize,
    pub display_char: char,
    /// Seconds from the reveal to the start of this glyph's transition.
    pub delay: Seconds,
}

/// Split `text` into glyph units, one per `char`.
///
/// Total for any input; the empty string gives no units.
pub fn split(text: &str, base_delay: Seconds) -> Vec<GlyphUnit> {
    let base_delay = if base_delay.is_finite() { base_delay.max(0.0) } else { 0.0 };
    text.chars()
        .enumerate()
        .map(|(index, ch)| GlyphUnit {
            index,
            display_char: if ch.is_whitespace() { SPACER } else { ch },
            delay: base_delay + index as Seconds * STAGGER_INTERVAL,
        })
        .collect()
}

// =============================================================================
// SCHEDULED REVEAL
// =============================================================================

struct RevealTimers {
    id: u64,
    node: NodeHandle,
    timers: RefCell<Vec<TimerId>>,
    cancelled: Cell<bool>,
}

impl RevealTimers {
    fn cancel(&self) {
        if self.cancelled.replace(true) {
            return;
        }
        let timers = std::mem::take(&mut *self.timers.borrow_mut());
        let cleared = timers.into_iter().filter(|&id| scheduler::clear_timeout(id)).count();
        ACTIVE.with(|active| {
            let mut active = active.borrow_mut();
            if active.get(&self.node.index).is_some_and(|(id, _)| *id == self.id) {
                active.remove(&self.node.index);
            }
        });
        log::trace!("[GLYPH] cancelled reveal on node {} ({cleared} pending)", self.node.index);
    }
}

thread_local! {
    /// Latest reveal per node index, cancelled when a new one is scheduled.
    static ACTIVE: RefCell<HashMap<usize, (u64, Weak<RevealTimers>)>> = RefCell::new(HashMap::new());
    static NEXT_REVEAL: Cell<u64> = const { Cell::new(1) };
}

/// Cancel handle for a scheduled glyph reveal. Cancels on drop.
pub struct GlyphReveal {
    timers: Rc<RevealTimers>,
}

impl GlyphReveal {
    /// Clear every timer that has not fired yet. Idempotent.
    pub fn cancel(&self) {
        self.timers.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.timers.cancelled.get()
    }

    /// Number of glyph timers still waiting to fire.
    pub fn pending_count(&self) -> usize {
        self.timers
            .timers
            .borrow()
            .iter()
            .filter(|&&id| scheduler::is_timer_pending(id))
            .count()
    }

    pub fn is_pending(&self) -> bool {
        self.pending_count() > 0
    }
}

impl Drop for GlyphReveal {
    fn drop(&mut self) {
        self.timers.cancel();
    }
}

impl std::fmt::Debug for GlyphReveal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlyphReveal")
            .field("node", &self.timers.node)
            .field("pending", &self.pending_count())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Install a hidden glyph run on `node` and schedule one transition per unit.
///
/// Every glyph starts at `hidden` and transitions to fully revealed over
/// [`GLYPH_DURATION`], starting `unit.delay` seconds from now. A reveal
/// already scheduled on the same node is cancelled first.
pub fn schedule_reveal(node: NodeHandle, units: &[GlyphUnit], hidden: Presentation) -> GlyphReveal {
    let previous = ACTIVE.with(|active| {
        active
            .borrow()
            .get(&node.index)
            .and_then(|(_, weak)| weak.upgrade())
    });
    if let Some(previous) = previous {
        previous.cancel();
    }

    let id = NEXT_REVEAL.with(|next| {
        let id = next.get();
        next.set(id + 1);
        id
    });
    let timers = Rc::new(RevealTimers {
        id,
        node,
        timers: RefCell::new(Vec::with_capacity(units.len())),
        cancelled: Cell::new(false),
    });

    if !node.is_live() {
        log::debug!("[GLYPH] node {} is not mounted, nothing scheduled", node.index);
        timers.cancelled.set(true);
        return GlyphReveal { timers };
    }

    presentation::set_glyphs(
        node.index,
        units
            .iter()
            .map(|unit| Glyph {
                ch: unit.display_char,
                presentation: hidden,
                transition: None,
            })
            .collect(),
    );

    for unit in units {
        let weak = Rc::downgrade(&timers);
        let glyph = unit.index;
        let timer = scheduler::set_timeout(unit.delay, move || {
            let Some(timers) = weak.upgrade() else { return };
            if timers.cancelled.get() || !timers.node.is_live() {
                log::trace!("[GLYPH] stale glyph timer for node {} ignored", timers.node.index);
                return;
            }
            let transition = Transition::new(
                hidden,
                Presentation::REVEALED,
                scheduler::now(),
                GLYPH_DURATION,
                Easing::Ease,
            );
            presentation::set_glyph_transition(timers.node.index, glyph, transition);
        });
        timers.timers.borrow_mut().push(timer);
    }

    ACTIVE.with(|active| {
        active
            .borrow_mut()
            .insert(node.index, (id, Rc::downgrade(&timers)));
    });

    log::trace!("[GLYPH] scheduled {} glyphs on node {}", units.len(), node.index);
    GlyphReveal { timers }
}

/// Forget every active reveal (for testing).
pub fn reset_glyph_reveals() {
    ACTIVE.with(|active| active.borrow_mut().clear());
}

// =============================================================================
// SEQUENCE
// =============================================================================

/// Source text, its glyph units and the live reveal for one text node.
#[derive(Debug)]
pub struct GlyphSequence {
    node: NodeHandle,
    text: String,
    base_delay: Seconds,
    direction: Direction,
    distance: f32,
    units: Vec<GlyphUnit>,
    reveal: Option<GlyphReveal>,
}

impl GlyphSequence {
    /// Split `text` for `node`. Glyphs travel up over the default distance.
    pub fn new(node: NodeHandle, text: impl Into<String>, base_delay: Seconds) -> Self {
        let text = text.into();
        let units = split(&text, base_delay);
        Self {
            node,
            text,
            base_delay,
            direction: Direction::Up,
            distance: DEFAULT_DISTANCE,
            units,
            reveal: None,
        }
    }

    pub fn with_direction(mut self, direction: Direction, distance: f32) -> Self {
        self.direction = direction;
        self.distance = distance;
        self
    }

    pub fn node(&self) -> NodeHandle {
        self.node
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn units(&self) -> &[GlyphUnit] {
        &self.units
    }

    /// Presentation every glyph starts from.
    pub fn hidden(&self) -> Presentation {
        presets::hidden_presentation(self.direction, self.distance)
    }

    /// Replace the source text. Pending timers from the old text are cleared
    /// before the new units are computed.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.cancel();
        self.text = text.into();
        self.units = split(&self.text, self.base_delay);
    }

    /// Schedule the staggered reveal, cancelling any reveal still pending.
    pub fn reveal(&mut self) {
        self.cancel();
        self.reveal = Some(schedule_reveal(self.node, &self.units, self.hidden()));
    }

    /// Drop the glyph run and show the plain source text again.
    pub fn collapse(&mut self) {
        self.cancel();
        if !self.node.is_live() {
            return;
        }
        presentation::clear_glyphs(self.node.index);
        presentation::set_text_content(self.node.index, self.text.clone());
    }

    /// Clear pending glyph timers without touching what is rendered.
    pub fn cancel(&mut self) {
        if let Some(reveal) = self.reveal.take() {
            reveal.cancel();
        }
    }

    pub fn pending_count(&self) -> usize {
        self.reveal.as_ref().map_or(0, GlyphReveal::pending_count)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{allocate_index, release_index, reset_registry};
    use crate::types::Offset;

    fn setup() {
        reset_registry();
        scheduler::reset_scheduler();
        reset_glyph_reveals();
    }

    fn hidden() -> Presentation {
        Presentation::hidden(Offset::new(0.0, 20.0))
    }

    #[test]
    fn test_split_lengths_and_delays() {
        for text in ["", "a", "hi", "hello world", "héllo ✨ wörld", "\t \n"] {
            let units = split(text, 0.25);
            assert_eq!(units.len(), text.chars().count());
            for pair in units.windows(2) {
                assert!(pair[1].delay >= pair[0].delay);
                assert_eq!(pair[1].index, pair[0].index + 1);
            }
        }
    }

    #[test]
    fn test_split_replaces_whitespace() {
        let units = split("a b\tc", 0.0);
        let chars: String = units.iter().map(|u| u.display_char).collect();
        assert_eq!(chars, "a\u{00A0}b\u{00A0}c");
    }

    #[test]
    fn test_split_delays() {
        let units = split("hi", 0.0);
        assert_eq!(units[0].delay, 0.0);
        assert!((units[1].delay - 0.03).abs() < 1e-9);

        let units = split("abc", 1.0);
        assert!((units[2].delay - 1.06).abs() < 1e-9);
    }

    #[test]
    fn test_schedule_reveal_commits_at_delay() {
        setup();

        let node = allocate_index(None);
        let units = split("hi", 0.0);
        let reveal = schedule_reveal(node, &units, hidden());

        assert_eq!(presentation::glyph_count(node.index), 2);
        assert_eq!(reveal.pending_count(), 2);

        scheduler::advance(0.0);
        let first = presentation::get_glyphs(node.index).unwrap()[0].transition.unwrap();
        assert_eq!(first.start, 0.0);
        assert_eq!(first.duration, GLYPH_DURATION);
        assert!(presentation::get_glyphs(node.index).unwrap()[1].transition.is_none());

        scheduler::advance(0.03);
        let second = presentation::get_glyphs(node.index).unwrap()[1].transition.unwrap();
        assert!((second.start - 0.03).abs() < 1e-9);
        assert!(!reveal.is_pending());

        assert_eq!(presentation::sample_glyph(node.index, 1, 0.03), Some(hidden()));
        assert_eq!(
            presentation::sample_glyph(node.index, 1, 0.5),
            Some(Presentation::REVEALED)
        );
    }

    #[test]
    fn test_cancel_stops_mutations() {
        setup();

        let node = allocate_index(None);
        let reveal = schedule_reveal(node, &split("hello", 0.0), hidden());
        scheduler::advance(0.0);

        reveal.cancel();
        let before = presentation::total_mutations();
        scheduler::advance(1.0);
        assert_eq!(presentation::total_mutations(), before);
        assert_eq!(scheduler::pending_timer_count(), 0);
    }

    #[test]
    fn test_reschedule_cancels_previous() {
        setup();

        let node = allocate_index(None);
        let first = schedule_reveal(node, &split("abc", 0.0), hidden());
        let second = schedule_reveal(node, &split("abc", 0.0), hidden());

        assert!(first.is_cancelled());
        assert_eq!(first.pending_count(), 0);
        assert_eq!(second.pending_count(), 3);
        assert_eq!(scheduler::pending_timer_count(), 3);
    }

    #[test]
    fn test_released_node_timers_are_no_ops() {
        setup();

        let node = allocate_index(None);
        let _keep = allocate_index(None);
        let _reveal = schedule_reveal(node, &split("abc", 0.1), hidden());
        release_index(node.index);

        let before = presentation::total_mutations();
        scheduler::advance(1.0);
        assert_eq!(presentation::total_mutations(), before);
    }

    #[test]
    fn test_timers_skip_node_reusing_the_index() {
        setup();

        let node = allocate_index(None);
        let _keep = allocate_index(None);
        let _reveal = schedule_reveal(node, &split("abc", 0.1), hidden());
        release_index(node.index);

        let reused = allocate_index(None);
        assert_eq!(reused.index, node.index);
        let plain = Glyph {
            ch: 'x',
            presentation: Presentation::REVEALED,
            transition: None,
        };
        presentation::set_glyphs(reused.index, vec![plain; 3]);

        let before = presentation::mutation_count(reused.index);
        scheduler::advance(1.0);
        assert_eq!(presentation::mutation_count(reused.index), before);
        let glyphs = presentation::get_glyphs(reused.index).unwrap();
        assert!(glyphs.iter().all(|glyph| glyph.transition.is_none()));
    }

    #[test]
    fn test_sequence_set_text_cancels_atomically() {
        setup();

        let node = allocate_index(None);
        let mut sequence = GlyphSequence::new(node, "hello", 0.0);
        sequence.reveal();
        assert_eq!(sequence.pending_count(), 5);

        sequence.set_text("hey");
        assert_eq!(sequence.pending_count(), 0);
        assert_eq!(scheduler::pending_timer_count(), 0);
        assert_eq!(sequence.units().len(), 3);

        sequence.reveal();
        assert_eq!(scheduler::pending_timer_count(), 3);
    }

    #[test]
    fn test_sequence_collapse_restores_plain_text() {
        setup();

        let node = allocate_index(None);
        let mut sequence = GlyphSequence::new(node, "hi there", 0.0);
        sequence.reveal();
        scheduler::advance(0.05);

        sequence.collapse();
        assert!(presentation::get_glyphs(node.index).is_none());
        assert_eq!(presentation::get_text_content(node.index), "hi there");
        assert_eq!(scheduler::pending_timer_count(), 0);
    }
}
