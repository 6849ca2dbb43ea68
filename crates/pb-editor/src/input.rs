//! Drag input abstraction.
//!
//! Renderers report pointer/drag activity as discrete `DragEvent`s. Each
//! event names the surface it was delivered to; the engine never relies on
//! the order in which a UI toolkit bubbles them.

use kurbo::{Point, Rect};
use pb_core::NodeId;

/// A drop surface as reported by a renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum HoverSurface {
    /// The canvas background (top-level append).
    Canvas,
    /// The body of a container (append inside it).
    ContainerBody(NodeId),
    /// An existing node; the pointer's height within `bounds` picks the gap
    /// before or after it.
    Node { id: NodeId, bounds: Rect },
}

/// Identity of a surface, independent of its current geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceKey {
    Canvas,
    ContainerBody(NodeId),
    Node(NodeId),
}

impl HoverSurface {
    pub fn key(&self) -> SurfaceKey {
        match self {
            HoverSurface::Canvas => SurfaceKey::Canvas,
            HoverSurface::ContainerBody(id) => SurfaceKey::ContainerBody(*id),
            HoverSurface::Node { id, .. } => SurfaceKey::Node(*id),
        }
    }
}

impl SurfaceKey {
    /// Target descriptor used in the event log.
    pub fn descriptor(&self) -> String {
        match self {
            SurfaceKey::Canvas => "canvas".to_string(),
            SurfaceKey::ContainerBody(id) => format!("container-{id}"),
            SurfaceKey::Node(id) => format!("component-{id}"),
        }
    }
}

/// A normalized drag event from a renderer or the palette.
#[derive(Debug, Clone, PartialEq)]
pub enum DragEvent {
    /// Drag started on a palette template.
    StartFromPalette { template: String },
    /// Drag started on an existing node.
    StartFromNode { id: NodeId },
    Enter { surface: HoverSurface, pointer: Point },
    /// Fires continuously while the pointer moves over a surface.
    Over { surface: HoverSurface, pointer: Point },
    /// `left_bounds` is false when the pointer merely entered a child of
    /// the surface.
    Leave { surface: HoverSurface, left_bounds: bool },
    Drop { pointer: Point },
    /// The gesture ended, with or without a drop.
    End,
}

impl DragEvent {
    /// Pointer position, if this event carries one.
    pub fn position(&self) -> Option<Point> {
        match self {
            Self::Enter { pointer, .. } | Self::Over { pointer, .. } | Self::Drop { pointer } => {
                Some(*pointer)
            }
            _ => None,
        }
    }
}

/// True if `pointer` is in the upper half of `bounds` (insert before).
pub fn in_upper_half(bounds: Rect, pointer: Point) -> bool {
    pointer.y < bounds.center().y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midpoint_splits_before_and_after() {
        let bounds = Rect::new(0.0, 100.0, 200.0, 140.0);
        assert!(in_upper_half(bounds, Point::new(10.0, 105.0)));
        assert!(in_upper_half(bounds, Point::new(10.0, 119.9)));
        assert!(!in_upper_half(bounds, Point::new(10.0, 120.0)));
        assert!(!in_upper_half(bounds, Point::new(10.0, 139.0)));
    }

    #[test]
    fn surface_identity_ignores_geometry() {
        let id = NodeId::intern("card");
        let a = HoverSurface::Node {
            id,
            bounds: Rect::new(0.0, 0.0, 10.0, 10.0),
        };
        let b = HoverSurface::Node {
            id,
            bounds: Rect::new(5.0, 5.0, 50.0, 50.0),
        };
        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), HoverSurface::ContainerBody(id).key());
        assert_eq!(a.key().descriptor(), "component-card");
    }
}
