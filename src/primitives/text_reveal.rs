//! Text Reveal Primitive - Text that reveals glyph by glyph when scrolled into view.
//!
//! The text renders as plain content until half of it is visible. It is then
//! split into glyphs that fade and rise into place one after another. With
//! `once: false` the glyphs collapse back to plain text when the node leaves
//! the view, and the next entry reveals again.
//!
//! # Example
//!
//! ```ignore
//! use spark_reveal::primitives::{text_reveal, TextRevealProps};
//!
//! let title = text_reveal(TextRevealProps {
//!     text: "Mountain West".to_string(),
//!     element_kind: ElementKind::parse("h1")?,
//!     ..Default::default()
//! });
//!
//! // Host reports layout, then drives frames with pipeline::step
//! surface::set_bounds(title.node().index, bounds);
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::animation::controller::{attach, RevealHandle, RevealMode, RevealState};
use crate::animation::glyph::GlyphSequence;
use crate::engine::arrays::presentation;
use crate::engine::{release_index, NodeHandle};
use crate::types::NodeKind;
use super::element::mount_element;
use super::types::{Cleanup, TextRevealProps, TEXT_REVEAL_THRESHOLD};

/// A mounted text reveal. Unmounts on drop.
pub struct TextReveal {
    node: NodeHandle,
    controller: RevealHandle,
    sequence: Rc<RefCell<GlyphSequence>>,
    unmounted: Cell<bool>,
}

/// Mount a text reveal.
pub fn text_reveal(props: TextRevealProps) -> TextReveal {
    // 1. MOUNT NODE
    let node = mount_element(
        props.id.as_deref(),
        NodeKind::Text,
        props.element_kind,
        props.class_name,
    );

    // 2. PLAIN TEXT UNTIL REVEALED
    presentation::set_text_content(node.index, props.text.clone());
    let sequence = Rc::new(RefCell::new(GlyphSequence::new(node, props.text, props.delay)));

    // 3. ATTACH CONTROLLER
    let on_enter = {
        let sequence = sequence.clone();
        move || {
            if let Ok(mut sequence) = sequence.try_borrow_mut() {
                sequence.reveal();
            }
        }
    };
    let on_exit = {
        let sequence = sequence.clone();
        move || {
            if let Ok(mut sequence) = sequence.try_borrow_mut() {
                sequence.collapse();
            }
        }
    };
    let controller = attach(
        node,
        TEXT_REVEAL_THRESHOLD,
        RevealMode::from_once(props.once),
        on_enter,
        Some(Box::new(on_exit)),
    );

    TextReveal {
        node,
        controller,
        sequence,
        unmounted: Cell::new(false),
    }
}

impl TextReveal {
    pub fn node(&self) -> NodeHandle {
        self.node
    }

    pub fn state(&self) -> RevealState {
        self.controller.state()
    }

    pub fn controller(&self) -> &RevealHandle {
        &self.controller
    }

    /// Current source text.
    pub fn text(&self) -> String {
        self.sequence.borrow().text().to_string()
    }

    /// Replace the text.
    ///
    /// Pending glyph timers for the old text are cleared first. A repeatable
    /// reveal that is currently in view reveals the new text again; otherwise
    /// the new text shows plainly.
    pub fn set_text(&self, text: impl Into<String>) {
        if self.unmounted.get() {
            return;
        }
        let mut sequence = self.sequence.borrow_mut();
        sequence.set_text(text);
        let replay = self.controller.state() == RevealState::Revealed
            && self.controller.mode() == RevealMode::Repeat;
        if replay {
            sequence.reveal();
        } else {
            sequence.collapse();
        }
    }

    /// Detach the controller, cancel pending glyphs and release the node.
    ///
    /// The node is left alone when another primitive mounted under the same
    /// id has taken it over since.
    pub fn unmount(&self) {
        if self.unmounted.replace(true) {
            return;
        }
        let owns_node = self.controller.is_attached();
        self.controller.detach();
        if let Ok(mut sequence) = self.sequence.try_borrow_mut() {
            sequence.cancel();
        }
        if owns_node {
            release_index(self.node.index);
        } else {
            log::debug!("[ELEMENT] node {} taken over, not released", self.node.index);
        }
    }

    /// Hand ownership to a cleanup closure.
    pub fn into_cleanup(self) -> Cleanup {
        Box::new(move || self.unmount())
    }
}

impl Drop for TextReveal {
    fn drop(&mut self) {
        self.unmount();
    }
}

// =============================================================================
// Tests
// =============================================================================
