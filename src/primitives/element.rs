//! Element Factory - Mount a node for a given element kind.
//!
//! Every reveal primitive mounts its node through here, so the host sees a
//! consistent kind, element and class name regardless of which primitive
//! created it.

use crate::engine::arrays::{presentation, surface};
use crate::engine::{allocate_index, NodeHandle};
use crate::types::{ElementKind, NodeKind};

/// How an element kind renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementSpec {
    /// HTML tag for web hosts.
    pub tag: &'static str,
    /// Starts on its own line.
    pub block_level: bool,
    /// Heading level, 0 for non-headings.
    pub heading_level: u8,
}

/// How an element kind renders.
pub fn element_spec(kind: ElementKind) -> ElementSpec {
    match kind {
        ElementKind::Block => ElementSpec {
            tag: "div",
            block_level: true,
            heading_level: 0,
        },
        ElementKind::Inline => ElementSpec {
            tag: "span",
            block_level: false,
            heading_level: 0,
        },
        ElementKind::Paragraph => ElementSpec {
            tag: "p",
            block_level: true,
            heading_level: 0,
        },
        ElementKind::Heading(level) => ElementSpec {
            tag: kind.tag(),
            block_level: true,
            heading_level: level.get(),
        },
    }
}

/// Allocate a node and record what it is.
pub fn mount_element(
    id: Option<&str>,
    node_kind: NodeKind,
    element: ElementKind,
    class_name: Option<String>,
) -> NodeHandle {
    let node = allocate_index(id);
    presentation::set_kind(node.index, node_kind);
    surface::set_element(node.index, element);
    surface::set_class_name(node.index, class_name);
    log::trace!(
        "[ELEMENT] mounted <{}> as {node_kind:?} at {}",
        element_spec(element).tag,
        node.index
    );
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::reset_registry;
    use crate::types::HeadingLevel;

    #[test]
    fn test_element_spec() {
        assert_eq!(element_spec(ElementKind::Inline).tag, "span");
        assert!(!element_spec(ElementKind::Inline).block_level);

        let h2 = element_spec(ElementKind::Heading(HeadingLevel::new(2).unwrap()));
        assert_eq!(h2.tag, "h2");
        assert_eq!(h2.heading_level, 2);
    }

    #[test]
    fn test_mount_element() {
        reset_registry();

        let node = mount_element(
            Some("title"),
            NodeKind::Text,
            ElementKind::Paragraph,
            Some("lead".to_string()),
        );
        assert_eq!(presentation::get_kind(node.index), NodeKind::Text);
        assert_eq!(surface::get_element(node.index), ElementKind::Paragraph);
        assert_eq!(surface::get_class_name(node.index), Some("lead".to_string()));
    }
}
