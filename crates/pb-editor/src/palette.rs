//! Palette of draggable node templates.

use pb_core::{Node, NodeId, NodeKind};
use serde_json::json;

/// A palette entry the user can drag onto the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    /// Template identifier carried by a palette drag.
    pub key: &'static str,
    pub label: &'static str,
    pub kind: NodeKind,
}

/// Supplies fresh nodes for palette-originated drops.
pub trait Palette {
    fn templates(&self) -> &[Template];

    /// Build a node for `template` with the engine-assigned `id`.
    /// Returns `None` for unknown templates.
    fn instantiate(&self, template: &str, id: NodeId) -> Option<Node> {
        self.templates()
            .iter()
            .find(|t| t.key == template)
            .map(|t| Node::new(id, t.kind))
    }
}

const DEFAULT_TEMPLATES: [Template; 4] = [
    Template {
        key: "text",
        label: "Text Block",
        kind: NodeKind::Text,
    },
    Template {
        key: "image",
        label: "Image Placeholder",
        kind: NodeKind::Image,
    },
    Template {
        key: "button",
        label: "Button",
        kind: NodeKind::Button,
    },
    Template {
        key: "section",
        label: "Section Container",
        kind: NodeKind::Container,
    },
];

/// The stock palette: text, image, button and section.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPalette;

impl Palette for DefaultPalette {
    fn templates(&self) -> &[Template] {
        &DEFAULT_TEMPLATES
    }

    fn instantiate(&self, template: &str, id: NodeId) -> Option<Node> {
        let node = match template {
            "text" => Node::new(id, NodeKind::Text).with_property(
                "content",
                json!("This is a text block. Click to edit this text."),
            ),
            "image" => Node::new(id, NodeKind::Image).with_property("alt", json!("Image Placeholder")),
            "button" => Node::new(id, NodeKind::Button).with_property("label", json!("Button")),
            "section" => Node::new(id, NodeKind::Container),
            _ => return None,
        };
        Some(node)
    }
}
