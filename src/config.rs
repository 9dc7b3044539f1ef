//! Props loading.
//!
//! Hosts that describe their pages as data (a JSON document per primitive)
//! load props here. Parsing goes through serde with the same defaults as
//! `Default::default()`, then the numeric fields are validated.
//!
//! ```ignore
//! let props = config::text_reveal_from_json(r#"{"text": "Contact", "el": "h2"}"#)?;
//! let title = primitives::text_reveal(props);
//! ```

use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::primitives::{BlockRevealProps, TextRevealProps};

fn from_json<T: DeserializeOwned>(json: &str) -> Result<T> {
    let props = serde_json::from_str(json)?;
    Ok(props)
}

/// Parse and validate text reveal props.
pub fn text_reveal_from_json(json: &str) -> Result<TextRevealProps> {
    let props: TextRevealProps = from_json(json)?;
    props.validate()?;
    log::debug!("[CONFIG] loaded text reveal props ({} chars)", props.text.chars().count());
    Ok(props)
}

/// Parse and validate block reveal props. Children are never loaded from JSON.
pub fn block_reveal_from_json(json: &str) -> Result<BlockRevealProps> {
    let props: BlockRevealProps = from_json(json)?;
    props.validate()?;
    log::debug!("[CONFIG] loaded block reveal props ({:?})", props.direction);
    Ok(props)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RevealError;
    use crate::types::{Direction, ElementKind, HeadingLevel};

    #[test]
    fn test_text_defaults() {
        let props = text_reveal_from_json(r#"{"text": "Hello"}"#).unwrap();
        assert_eq!(props.text, "Hello");
        assert!(props.once);
        assert_eq!(props.delay, 0.0);
        assert_eq!(props.element_kind, ElementKind::Block);
        assert_eq!(props.class_name, None);
    }

    #[test]
    fn test_text_full() {
        let props = text_reveal_from_json(
            r#"{"text": "Services", "className": "title", "once": false, "delay": 0.2, "elementKind": "heading-2"}"#,
        )
        .unwrap();
        assert!(!props.once);
        assert_eq!(props.class_name.as_deref(), Some("title"));
        assert_eq!(props.element_kind, ElementKind::Heading(HeadingLevel::new(2).unwrap()));

        let props = text_reveal_from_json(r#"{"text": "x", "el": "span"}"#).unwrap();
        assert_eq!(props.element_kind, ElementKind::Inline);
    }

    #[test]
    fn test_text_requires_text() {
        assert!(matches!(text_reveal_from_json("{}"), Err(RevealError::Json(_))));
    }

    #[test]
    fn test_unknown_element_kind_rejected() {
        let result = text_reveal_from_json(r#"{"text": "x", "elementKind": "marquee"}"#);
        assert!(matches!(result, Err(RevealError::Json(_))));
    }

    #[test]
    fn test_block_defaults_and_direction_fallback() {
        let props = block_reveal_from_json("{}").unwrap();
        assert_eq!(props.direction, Direction::Up);
        assert_eq!(props.duration, 0.6);
        assert_eq!(props.distance, 20.0);
        assert!(props.children.is_none());

        let props = block_reveal_from_json(r#"{"direction": "diagonal", "distance": 30}"#).unwrap();
        assert_eq!(props.direction, Direction::Up);
        assert_eq!(props.distance, 30.0);
    }

    #[test]
    fn test_block_negative_values_rejected() {
        let result = block_reveal_from_json(r#"{"delay": -0.5}"#);
        assert!(matches!(
            result,
            Err(RevealError::InvalidValue { field: "delay", .. })
        ));
        let result = block_reveal_from_json(r#"{"distance": -1}"#);
        assert!(matches!(
            result,
            Err(RevealError::InvalidValue { field: "distance", .. })
        ));
    }
}
