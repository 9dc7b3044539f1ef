//! Reveal Controller - Visibility-driven enter/exit state machine.
//!
//! Two layers:
//!
//! - [`reduce`] is the pure state machine. It takes the current state and a
//!   visibility reading and returns the next state plus the effect to run.
//! - [`attach`] is the adapter. It registers a visibility watcher on a node,
//!   feeds each reading through `reduce`, and runs the enter/exit callbacks.
//!
//! # States
//!
//! ```text
//! once:    Idle ──visible──▶ Revealed            (terminal)
//! repeat:  Hidden ◀──hidden── Revealed ◀──visible── Hidden
//! ```
//!
//! # Example
//!
//! ```ignore
//! use spark_reveal::animation::controller::{attach, RevealMode};
//!
//! let handle = attach(node, 0.1, RevealMode::Once, || println!("enter"), None);
//! // ... later, or when `handle` goes out of scope
//! handle.detach();
//! ```

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use spark_signals::{signal, Signal};

use crate::engine::visibility::{self, VisibilityEntry, WatcherId};
use crate::engine::{self, DestroyId, NodeHandle};

// =============================================================================
// STATE MACHINE
// =============================================================================

/// Whether a target reveals once or every time it comes into view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevealMode {
    #[default]
    Once,
    Repeat,
}

impl RevealMode {
    pub fn from_once(once: bool) -> Self {
        if once { Self::Once } else { Self::Repeat }
    }

    pub fn is_once(&self) -> bool {
        matches!(self, Self::Once)
    }
}

/// Reveal phase of one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealState {
    /// Not yet revealed (once mode).
    Idle,
    /// Out of view (repeat mode).
    Hidden,
    /// In view, enter effect has run.
    Revealed,
}

impl RevealState {
    /// Starting state for a mode.
    pub fn initial(mode: RevealMode) -> Self {
        match mode {
            RevealMode::Once => Self::Idle,
            RevealMode::Repeat => Self::Hidden,
        }
    }
}

/// Side effect requested by a state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealEffect {
    Enter,
    Exit,
}

/// Result of feeding one visibility reading to [`reduce`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub state: RevealState,
    pub effect: Option<RevealEffect>,
}

impl Step {
    fn stay(state: RevealState) -> Self {
        Self { state, effect: None }
    }
}

/// Next state for a visibility reading.
///
/// Visible readings reveal from Idle or Hidden and are ignored once Revealed.
/// Hidden readings only matter in repeat mode, where they move Revealed back
/// to Hidden.
pub fn reduce(state: RevealState, mode: RevealMode, visible: bool) -> Step {
    match (state, visible) {
        (RevealState::Idle | RevealState::Hidden, true) => Step {
            state: RevealState::Revealed,
            effect: Some(RevealEffect::Enter),
        },
        (RevealState::Revealed, false) if mode == RevealMode::Repeat => Step {
            state: RevealState::Hidden,
            effect: Some(RevealEffect::Exit),
        },
        (state, _) => Step::stay(state),
    }
}

// =============================================================================
// ADAPTER
// =============================================================================

/// Enter/exit callback.
pub type RevealCallback = Box<dyn FnMut()>;

struct Controller {
    id: u64,
    node: NodeHandle,
    mode: RevealMode,
    state: Cell<RevealState>,
    phase: Signal<RevealState>,
    watcher: Cell<Option<WatcherId>>,
    destroy_hook: Cell<Option<DestroyId>>,
    detached: Cell<bool>,
    on_enter: RefCell<RevealCallback>,
    on_exit: RefCell<Option<RevealCallback>>,
}

thread_local! {
    /// Live controller per node index, so a node never has two watchers.
    static ATTACHED: RefCell<HashMap<usize, (u64, Weak<Controller>)>> = RefCell::new(HashMap::new());
    static NEXT_CONTROLLER: Cell<u64> = const { Cell::new(1) };
}

impl Controller {
    fn handle(&self, entry: VisibilityEntry) {
        if self.detached.get() || !self.node.is_live() {
            log::trace!("[REVEAL] stale reading for node {} ignored", self.node.index);
            return;
        }

        let step = reduce(self.state.get(), self.mode, entry.is_visible);
        if step.state != self.state.get() {
            self.state.set(step.state);
            self.phase.set(step.state);
        }

        // Once-mode targets are done watching after the first reveal
        if self.mode.is_once() && step.state == RevealState::Revealed {
            self.release_watcher();
        }

        match step.effect {
            Some(RevealEffect::Enter) => {
                log::trace!("[REVEAL] enter node {} (ratio {:.2})", self.node.index, entry.ratio);
                match self.on_enter.try_borrow_mut() {
                    Ok(mut on_enter) => on_enter(),
                    Err(_) => log::debug!("[REVEAL] re-entrant enter on node {} skipped", self.node.index),
                }
            }
            Some(RevealEffect::Exit) => {
                log::trace!("[REVEAL] exit node {} (ratio {:.2})", self.node.index, entry.ratio);
                match self.on_exit.try_borrow_mut() {
                    Ok(mut on_exit) => {
                        if let Some(on_exit) = on_exit.as_mut() {
                            on_exit();
                        }
                    }
                    Err(_) => log::debug!("[REVEAL] re-entrant exit on node {} skipped", self.node.index),
                }
            }
            None => {}
        }
    }

    fn release_watcher(&self) {
        if let Some(watcher) = self.watcher.take() {
            visibility::unobserve(watcher);
        }
    }

    fn detach(&self) {
        if self.detached.replace(true) {
            return;
        }
        self.release_watcher();
        if let Some(hook) = self.destroy_hook.take() {
            engine::remove_destroy_callback(self.node.index, hook);
        }
        ATTACHED.with(|attached| {
            let mut attached = attached.borrow_mut();
            if attached.get(&self.node.index).is_some_and(|(id, _)| *id == self.id) {
                attached.remove(&self.node.index);
            }
        });
        log::debug!("[REVEAL] detached controller {} from node {}", self.id, self.node.index);
    }
}

/// Handle to an attached controller. Detaches on drop.
pub struct RevealHandle {
    controller: Rc<Controller>,
}

impl RevealHandle {
    /// Release the watcher. Pending readings for this handle become no-ops.
    pub fn detach(&self) {
        self.controller.detach();
    }

    pub fn is_attached(&self) -> bool {
        !self.controller.detached.get()
    }

    /// Current reveal state.
    pub fn state(&self) -> RevealState {
        self.controller.state.get()
    }

    /// Reactive reveal state.
    pub fn phase(&self) -> Signal<RevealState> {
        self.controller.phase.clone()
    }

    pub fn mode(&self) -> RevealMode {
        self.controller.mode
    }

    pub fn node(&self) -> NodeHandle {
        self.controller.node
    }

    /// Whether the visibility watcher is still registered.
    ///
    /// False after detach, and after the first reveal in once mode.
    pub fn is_watching(&self) -> bool {
        self.controller
            .watcher
            .get()
            .is_some_and(visibility::is_observing)
    }
}

impl Drop for RevealHandle {
    fn drop(&mut self) {
        self.controller.detach();
    }
}

impl std::fmt::Debug for RevealHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevealHandle")
            .field("node", &self.controller.node)
            .field("mode", &self.controller.mode)
            .field("state", &self.controller.state.get())
            .field("attached", &!self.controller.detached.get())
            .finish()
    }
}

/// Attach a reveal controller to `node`.
///
/// Any controller already attached to the same node is detached first. The
/// controller also detaches itself when the node is released.
pub fn attach(
    node: NodeHandle,
    threshold: f32,
    mode: RevealMode,
    on_enter: impl FnMut() + 'static,
    on_exit: Option<RevealCallback>,
) -> RevealHandle {
    let previous = ATTACHED.with(|attached| {
        attached
            .borrow()
            .get(&node.index)
            .and_then(|(_, weak)| weak.upgrade())
    });
    if let Some(previous) = previous {
        log::debug!("[REVEAL] node {} re-attached, detaching controller {}", node.index, previous.id);
        previous.detach();
    }

    let id = NEXT_CONTROLLER.with(|next| {
        let id = next.get();
        next.set(id + 1);
        id
    });
    let initial = RevealState::initial(mode);
    let controller = Rc::new(Controller {
        id,
        node,
        mode,
        state: Cell::new(initial),
        phase: signal(initial),
        watcher: Cell::new(None),
        destroy_hook: Cell::new(None),
        detached: Cell::new(false),
        on_enter: RefCell::new(Box::new(on_enter)),
        on_exit: RefCell::new(on_exit),
    });

    let weak = Rc::downgrade(&controller);
    let watcher = visibility::observe(node, threshold, move |entry| {
        if let Some(controller) = weak.upgrade() {
            controller.handle(entry);
        }
    });
    controller.watcher.set(Some(watcher));

    ATTACHED.with(|attached| {
        attached
            .borrow_mut()
            .insert(node.index, (id, Rc::downgrade(&controller)));
    });

    if node.is_live() {
        let weak = Rc::downgrade(&controller);
        let hook = engine::on_destroy(node.index, move || {
            if let Some(controller) = weak.upgrade() {
                controller.detach();
            }
        });
        controller.destroy_hook.set(Some(hook));
    }

    log::debug!("[REVEAL] attached controller {id} to node {} ({mode:?}, threshold {threshold})", node.index);
    RevealHandle { controller }
}

/// Detach a controller. Same as [`RevealHandle::detach`].
pub fn detach(handle: &RevealHandle) {
    handle.detach();
}

/// Number of nodes with a live controller.
pub fn attached_count() -> usize {
    ATTACHED.with(|attached| {
        attached
            .borrow()
            .values()
            .filter(|(_, weak)| weak.strong_count() > 0)
            .count()
    })
}

/// Forget every controller (for testing).
pub fn reset_controllers() {
    ATTACHED.with(|attached| attached.borrow_mut().clear());
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{allocate_index, release_index, reset_registry};

    fn setup() {
        reset_registry();
        visibility::reset_visibility();
        reset_controllers();
    }

    fn counter() -> (Rc<Cell<u32>>, impl FnMut() + 'static) {
        let count = Rc::new(Cell::new(0));
        let count_clone = count.clone();
        (count, move || count_clone.set(count_clone.get() + 1))
    }

    #[test]
    fn test_reduce_once() {
        let step = reduce(RevealState::Idle, RevealMode::Once, true);
        assert_eq!(step.state, RevealState::Revealed);
        assert_eq!(step.effect, Some(RevealEffect::Enter));

        let step = reduce(RevealState::Revealed, RevealMode::Once, true);
        assert_eq!(step, Step::stay(RevealState::Revealed));

        let step = reduce(RevealState::Revealed, RevealMode::Once, false);
        assert_eq!(step, Step::stay(RevealState::Revealed));

        let step = reduce(RevealState::Idle, RevealMode::Once, false);
        assert_eq!(step, Step::stay(RevealState::Idle));
    }

    #[test]
    fn test_reduce_repeat() {
        let step = reduce(RevealState::Hidden, RevealMode::Repeat, false);
        assert_eq!(step.effect, None);

        let step = reduce(RevealState::Hidden, RevealMode::Repeat, true);
        assert_eq!(step.effect, Some(RevealEffect::Enter));

        let step = reduce(RevealState::Revealed, RevealMode::Repeat, false);
        assert_eq!(step.state, RevealState::Hidden);
        assert_eq!(step.effect, Some(RevealEffect::Exit));
    }

    #[test]
    fn test_once_enters_exactly_once() {
        setup();

        let node = allocate_index(None);
        let (enters, on_enter) = counter();
        let handle = attach(node, 0.5, RevealMode::Once, on_enter, None);

        visibility::report_visibility(node.index, 1.0);
        visibility::report_visibility(node.index, 0.0);
        visibility::report_visibility(node.index, 1.0);

        assert_eq!(enters.get(), 1);
        assert_eq!(handle.state(), RevealState::Revealed);
        assert!(!handle.is_watching());
    }

    #[test]
    fn test_repeat_enter_exit_enter() {
        setup();

        let node = allocate_index(None);
        let (enters, on_enter) = counter();
        let (exits, on_exit) = counter();
        let handle = attach(node, 0.5, RevealMode::Repeat, on_enter, Some(Box::new(on_exit)));

        visibility::report_visibility(node.index, 1.0);
        visibility::report_visibility(node.index, 0.1);
        visibility::report_visibility(node.index, 0.9);

        assert_eq!(enters.get(), 2);
        assert_eq!(exits.get(), 1);
        assert_eq!(handle.phase().get(), RevealState::Revealed);
    }

    #[test]
    fn test_detach_makes_readings_no_ops() {
        setup();

        let node = allocate_index(None);
        let (enters, on_enter) = counter();
        let handle = attach(node, 0.5, RevealMode::Once, on_enter, None);

        detach(&handle);
        assert!(!handle.is_attached());
        visibility::report_visibility(node.index, 1.0);

        assert_eq!(enters.get(), 0);
        assert_eq!(handle.state(), RevealState::Idle);
        assert_eq!(visibility::watcher_count(), 0);
    }

    #[test]
    fn test_drop_detaches() {
        setup();

        let node = allocate_index(None);
        {
            let (_enters, on_enter) = counter();
            let _handle = attach(node, 0.5, RevealMode::Once, on_enter, None);
            assert_eq!(visibility::watcher_count(), 1);
        }
        assert_eq!(visibility::watcher_count(), 0);
        assert_eq!(attached_count(), 0);
    }

    #[test]
    fn test_reattach_keeps_one_watcher() {
        setup();

        let node = allocate_index(None);
        let (first_enters, first) = counter();
        let (second_enters, second) = counter();
        let old = attach(node, 0.5, RevealMode::Once, first, None);
        let new = attach(node, 0.5, RevealMode::Once, second, None);

        assert!(!old.is_attached());
        assert!(new.is_attached());
        assert_eq!(visibility::watchers_for(node.index), 1);

        visibility::report_visibility(node.index, 1.0);
        assert_eq!(first_enters.get(), 0);
        assert_eq!(second_enters.get(), 1);
    }

    #[test]
    fn test_node_release_detaches() {
        setup();

        let node = allocate_index(None);
        let (enters, on_enter) = counter();
        let handle = attach(node, 0.5, RevealMode::Repeat, on_enter, None);

        release_index(node.index);
        assert!(!handle.is_attached());
        assert_eq!(visibility::report_visibility(node.index, 1.0), 0);
        assert_eq!(enters.get(), 0);
    }

    #[test]
    fn test_reattach_does_not_accumulate_destroy_hooks() {
        setup();

        let node = allocate_index(Some("title"));
        let mut handles = Vec::new();
        for _ in 0..10 {
            handles.push(attach(node, 0.5, RevealMode::Once, || {}, None));
        }
        assert_eq!(engine::destroy_callback_count(node.index), 1);

        handles.last().unwrap().detach();
        assert_eq!(engine::destroy_callback_count(node.index), 0);
    }
}
