//! Block Reveal Primitive - Content that fades and slides in when scrolled into view.
//!
//! The block starts transparent at the direction's offset. When a tenth of it
//! is visible, the next frame commits a transition to fully revealed that
//! starts after `delay` and runs for `duration`. With `once: false`, leaving
//! the view snaps it back to the hidden state on the next frame.
//!
//! # Example
//!
//! ```ignore
//! use spark_reveal::primitives::{block_reveal, BlockRevealProps};
//!
//! let card = block_reveal(BlockRevealProps {
//!     direction: Direction::Left,
//!     distance: 30.0,
//!     children: Some(Box::new(|| {
//!         text_reveal(TextRevealProps { text: "Services".into(), ..Default::default() }).into_cleanup();
//!     })),
//!     ..Default::default()
//! });
//! ```

use std::cell::Cell;
use std::rc::Rc;

use crate::animation::controller::{attach, RevealHandle, RevealMode, RevealState};
use crate::animation::presets::hidden_presentation;
use crate::animation::transition::{Easing, Transition};
use crate::engine::arrays::presentation;
use crate::engine::scheduler::{self, FrameId};
use crate::engine::{pop_parent_context, push_parent_context, release_index, NodeHandle};
use crate::types::{ElementKind, NodeKind, Presentation, Seconds};
use super::element::mount_element;
use super::types::{BlockRevealProps, Cleanup, BLOCK_REVEAL_THRESHOLD};

/// A mounted block reveal. Unmounts on drop.
pub struct BlockReveal {
    node: NodeHandle,
    hidden: Presentation,
    controller: RevealHandle,
    pending_frame: Rc<Cell<Option<FrameId>>>,
    unmounted: Cell<bool>,
}

/// Replace whatever frame is pending for this block with a new one.
fn queue_frame(
    pending: &Rc<Cell<Option<FrameId>>>,
    node: NodeHandle,
    commit: impl FnOnce(usize, Seconds) + 'static,
) {
    if let Some(frame) = pending.take() {
        scheduler::cancel_frame(frame);
    }
    let slot = pending.clone();
    let frame = scheduler::request_frame(move |time| {
        slot.set(None);
        if !node.is_live() {
            log::trace!("[BLOCK] frame for released node {} dropped", node.index);
            return;
        }
        commit(node.index, time);
    });
    pending.set(Some(frame));
}

/// Mount a block reveal.
pub fn block_reveal(props: BlockRevealProps) -> BlockReveal {
    // 1. MOUNT NODE
    let node = mount_element(
        props.id.as_deref(),
        NodeKind::Block,
        ElementKind::Block,
        props.class_name,
    );

    // 2. START HIDDEN
    let hidden = hidden_presentation(props.direction, props.distance);
    presentation::set_presentation(node.index, hidden);

    // 3. CHILDREN
    if let Some(children) = props.children {
        push_parent_context(node.index);
        children();
        pop_parent_context();
    }

    // 4. ATTACH CONTROLLER
    let pending_frame: Rc<Cell<Option<FrameId>>> = Rc::new(Cell::new(None));
    let (delay, duration) = (props.delay, props.duration);

    let on_enter = {
        let pending = pending_frame.clone();
        move || {
            queue_frame(&pending, node, move |index, time| {
                let from = presentation::sample_presentation(index, time);
                presentation::set_transition(
                    index,
                    Transition::new(from, Presentation::REVEALED, time + delay, duration, Easing::Ease),
                );
            });
        }
    };
    let on_exit = {
        let pending = pending_frame.clone();
        move || {
            queue_frame(&pending, node, move |index, _| {
                presentation::set_presentation(index, hidden);
            });
        }
    };
    let controller = attach(
        node,
        BLOCK_REVEAL_THRESHOLD,
        RevealMode::from_once(props.once),
        on_enter,
        Some(Box::new(on_exit)),
    );

    BlockReveal {
        node,
        hidden,
        controller,
        pending_frame,
        unmounted: Cell::new(false),
    }
}

impl BlockReveal {
    pub fn node(&self) -> NodeHandle {
        self.node
    }

    pub fn state(&self) -> RevealState {
        self.controller.state()
    }

    pub fn controller(&self) -> &RevealHandle {
        &self.controller
    }

    /// Pre-reveal presentation of this block.
    pub fn hidden(&self) -> Presentation {
        self.hidden
    }

    /// Detach the controller, cancel any pending frame and release the node
    /// (children included).
    pub fn unmount(&self) {
        if self.unmounted.replace(true) {
            return;
        }
        let owns_node = self.controller.is_attached();
        self.controller.detach();
        if let Some(frame) = self.pending_frame.take() {
            scheduler::cancel_frame(frame);
        }
        if owns_node {
            release_index(self.node.index);
        } else {
            log::debug!("[BLOCK] node {} taken over, not released", self.node.index);
        }
    }

    /// Hand ownership to a cleanup closure.
    pub fn into_cleanup(self) -> Cleanup {
        Box::new(move || self.unmount())
    }
}

impl Drop for BlockReveal {
    fn drop(&mut self) {
        self.unmount();
    }
}

// =============================================================================
// Tests
// =============================================================================
