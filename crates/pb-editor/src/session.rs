//! Drag session state machine.
//!
//! One session tracks one gesture at a time:
//!
//! ```text
//! Idle ──arm──▶ Armed ──hover──▶ Hovering ──drop──▶ Dropped ──▶ Cooldown ──(elapsed)──▶ Idle
//!                 │                  │                              ▲
//!                 └──────end─────────┴──────────────────────────────┘
//! ```
//!
//! ## Containment priority
//!
//! Enter/over events bubble from a nested surface to its ancestors. A hover
//! only replaces the current target if it is at least as specific (see
//! [`Specificity`]) or comes from the same surface. A less specific surface
//! regains priority only after the current one reports `left_bounds`.
//!
//! ## Cooldown
//!
//! After a drop or drag-end the session ignores hovers until the cooldown
//! deadline passes, so the pointer resting on the drop surface does not
//! re-highlight it. The deadline is checked lazily against the `now` passed
//! to every call; [`DragSession::cancel`] clears it.

use crate::guard::{self, Document};
use crate::input::{HoverSurface, SurfaceKey, in_upper_half};
use crate::palette::Palette;
use kurbo::Point;
use pb_core::{
    EditError, EditResult, NodeId, Path, Tree, children_of, insert_at, locate, move_node,
};
use std::time::{Duration, Instant};

// ─── Sources & targets ───────────────────────────────────────────────────

/// What is being dragged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragSource {
    /// A palette template; no node exists yet.
    Palette { template: String },
    /// An existing node, with its path when the drag started.
    TreeNode { id: NodeId, path: Path },
}

/// Where a drop would land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// Append at the top level.
    Canvas,
    /// Append inside a container's body.
    Container(NodeId),
    /// Insert next to the `anchor` node, before it or `after` it. Kept by id
    /// so the gap survives edits that land between hover and drop.
    NodeGap { anchor: NodeId, after: bool },
}

impl DropTarget {
    /// Resolve against `tree` to a container path plus insertion index.
    pub fn destination(&self, tree: &Tree) -> EditResult<(Path, usize)> {
        match self {
            DropTarget::Canvas => Ok((Path::root(), tree.len())),
            DropTarget::Container(id) => {
                let path = locate(tree, *id)?;
                let len = children_of(tree, &path)?.len();
                Ok((path, len))
            }
            DropTarget::NodeGap { anchor, after } => {
                let path = locate(tree, *anchor)
                    .map_err(|_| EditError::EditFailed(format!("gap anchor {anchor} is gone")))?;
                let index = path.last().unwrap_or_default() + usize::from(*after);
                Ok((path.parent(), index))
            }
        }
    }
}

/// How specific a hover target is. Deeper lists win; within one list a node
/// gap beats a container body, which beats the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Specificity {
    depth: usize,
    rank: u8,
}

/// The current hover target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hover {
    pub target: DropTarget,
    pub surface: SurfaceKey,
    pub specificity: Specificity,
    /// False when dropping here would put a node into itself or a
    /// descendant. The gesture is still consumed by such a drop.
    pub legal: bool,
}

// ─── States ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Armed(DragSource),
    Hovering { source: DragSource, hover: Hover },
    /// Passed through while the drop's edit runs.
    Dropped(DragSource),
    Cooldown { until: Instant },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Armed(_) => "armed",
            SessionState::Hovering { .. } => "hovering",
            SessionState::Dropped(_) => "dropped",
            SessionState::Cooldown { .. } => "cooldown",
        }
    }
}

/// Result of a drop: the gesture is consumed whether or not the edit applied.
#[derive(Debug, Clone, PartialEq)]
pub struct DropOutcome {
    pub source: DragSource,
    /// `None` if the pointer was released without a hover target.
    pub target: Option<DropTarget>,
    /// The inserted or moved node, or why nothing changed.
    pub result: Result<NodeId, EditError>,
}

impl DropOutcome {
    pub fn applied(&self) -> bool {
        self.result.is_ok()
    }
}

// ─── Session ─────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct DragSession {
    state: SessionState,
    cooldown: Duration,
}

impl DragSession {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            state: SessionState::Idle,
            cooldown,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// True while a gesture is armed or hovering.
    pub fn is_dragging(&self) -> bool {
        matches!(
            self.state,
            SessionState::Armed(_) | SessionState::Hovering { .. }
        )
    }

    pub fn source(&self) -> Option<&DragSource> {
        match &self.state {
            SessionState::Armed(source)
            | SessionState::Hovering { source, .. }
            | SessionState::Dropped(source) => Some(source),
            _ => None,
        }
    }

    pub fn hover(&self) -> Option<&Hover> {
        match &self.state {
            SessionState::Hovering { hover, .. } => Some(hover),
            _ => None,
        }
    }

    fn transition(&mut self, next: SessionState) {
        log::debug!("drag session: {} -> {}", self.state.name(), next.name());
        self.state = next;
    }

    /// Fire the cooldown timer if its deadline has passed. Returns true if
    /// the session went back to idle.
    pub fn expire(&mut self, now: Instant) -> bool {
        if let SessionState::Cooldown { until } = self.state
            && now >= until
        {
            self.transition(SessionState::Idle);
            return true;
        }
        false
    }

    /// Start a gesture. An active gesture is cancelled first; a pending
    /// cooldown is cut short.
    pub fn arm(&mut self, source: DragSource, now: Instant) {
        self.expire(now);
        match self.state {
            SessionState::Armed(_) | SessionState::Hovering { .. } => {
                log::debug!("drag session: new drag cancels the active one");
                self.transition(SessionState::Idle);
            }
            SessionState::Cooldown { .. } => self.transition(SessionState::Idle),
            SessionState::Idle | SessionState::Dropped(_) => {}
        }
        self.transition(SessionState::Armed(source));
    }

    pub fn arm_palette(&mut self, template: impl Into<String>, now: Instant) {
        self.arm(
            DragSource::Palette {
                template: template.into(),
            },
            now,
        );
    }

    /// Arm with an existing node, recording its current path.
    pub fn arm_node(&mut self, tree: &Tree, id: NodeId, now: Instant) -> EditResult<()> {
        let path = locate(tree, id)?;
        self.arm(DragSource::TreeNode { id, path }, now);
        Ok(())
    }

    /// Recompute the hover target from an enter/over event on `surface`.
    ///
    /// Returns true if the event took effect. Events are ignored outside a
    /// gesture (including cooldown), when the surface no longer resolves,
    /// and when a less specific surface tries to displace the current one.
    pub fn hover_over(
        &mut self,
        tree: &Tree,
        surface: &HoverSurface,
        pointer: Point,
        now: Instant,
    ) -> bool {
        self.expire(now);
        let (source, current) = match &self.state {
            SessionState::Armed(source) => (source, None),
            SessionState::Hovering { source, hover } => (source, Some(hover)),
            _ => return false,
        };

        let Some((target, specificity)) = target_for(tree, surface, pointer) else {
            log::trace!("hover on unresolvable surface {:?}", surface.key());
            return false;
        };
        let key = surface.key();
        if let Some(current) = current
            && current.surface != key
            && specificity < current.specificity
        {
            log::trace!(
                "hover on {:?} suppressed by {:?}",
                key,
                current.surface
            );
            return false;
        }
        if current.is_some_and(|h| h.surface == key && h.target == target) {
            return true;
        }

        let legal = is_legal(tree, source, &target);
        log::trace!("hover target {target:?} (legal: {legal})");
        let source = source.clone();
        self.transition(SessionState::Hovering {
            source,
            hover: Hover {
                target,
                surface: key,
                specificity,
                legal,
            },
        });
        true
    }

    /// Handle a leave event. Only an explicit `left_bounds` from the surface
    /// that owns the current target yields priority.
    pub fn leave(&mut self, surface: &HoverSurface, left_bounds: bool) -> bool {
        let SessionState::Hovering { source, hover } = &self.state else {
            return false;
        };
        if !left_bounds || hover.surface != surface.key() {
            return false;
        }
        let source = source.clone();
        self.transition(SessionState::Armed(source));
        true
    }

    /// Drop on the current target: run the edit through the rollback guard,
    /// then enter cooldown. Returns `None` if no gesture was active.
    pub fn drop_on(
        &mut self,
        doc: &mut Document,
        palette: &dyn Palette,
        now: Instant,
    ) -> Option<DropOutcome> {
        self.expire(now);
        let prior = self.state.name();
        let (source, target) = match std::mem::replace(&mut self.state, SessionState::Idle) {
            SessionState::Armed(source) => (source, None),
            SessionState::Hovering { source, hover } => (source, Some(hover.target)),
            other => {
                self.state = other;
                return None;
            }
        };
        log::debug!("drag session: {prior} -> dropped");
        self.state = SessionState::Dropped(source.clone());

        let result = match &target {
            Some(target) => guard::apply(doc, |tree| apply_drop(tree, &source, target, palette)),
            None => Err(EditError::EditFailed("released outside a drop target".into())),
        };
        if let Err(err) = &result {
            log::warn!("drop refused: {err}");
        }

        self.begin_cooldown(now);
        Some(DropOutcome {
            source,
            target,
            result,
        })
    }

    /// The gesture ended without a drop: discard it and cool down.
    pub fn end(&mut self, now: Instant) -> bool {
        self.expire(now);
        if !self.is_dragging() {
            return false;
        }
        log::debug!("drag session: gesture ended without a drop");
        self.begin_cooldown(now);
        true
    }

    /// Tear the session down: drop any gesture and cancel a pending cooldown.
    pub fn cancel(&mut self) {
        if self.state != SessionState::Idle {
            self.transition(SessionState::Idle);
        }
    }

    fn begin_cooldown(&mut self, now: Instant) {
        self.transition(SessionState::Cooldown {
            until: now + self.cooldown,
        });
    }
}

// ─── Target resolution ───────────────────────────────────────────────────

/// Map a surface and pointer to a drop target in `tree`.
fn target_for(tree: &Tree, surface: &HoverSurface, pointer: Point) -> Option<(DropTarget, Specificity)> {
    match surface {
        HoverSurface::Canvas => Some((DropTarget::Canvas, Specificity { depth: 0, rank: 0 })),
        HoverSurface::ContainerBody(id) => {
            let path = locate(tree, *id).ok()?;
            children_of(tree, &path).ok()?;
            Some((
                DropTarget::Container(*id),
                Specificity {
                    depth: path.len() + 1,
                    rank: 1,
                },
            ))
        }
        HoverSurface::Node { id, bounds } => {
            let path = locate(tree, *id).ok()?;
            let target = DropTarget::NodeGap {
                anchor: *id,
                after: !in_upper_half(*bounds, pointer),
            };
            Some((target, Specificity { depth: path.len(), rank: 2 }))
        }
    }
}

fn is_legal(tree: &Tree, source: &DragSource, target: &DropTarget) -> bool {
    let DragSource::TreeNode { id, .. } = source else {
        return true;
    };
    let (Ok(from), Ok((into, index))) = (locate(tree, *id), target.destination(tree)) else {
        return false;
    };
    !(from.is_prefix_of(&into) || (into == from.parent() && Some(index) == from.last()))
}

/// Build the edit for a drop of `source` on `target`.
fn apply_drop(
    tree: &Tree,
    source: &DragSource,
    target: &DropTarget,
    palette: &dyn Palette,
) -> EditResult<(Tree, NodeId)> {
    match source {
        DragSource::Palette { template } => {
            let id = NodeId::with_prefix(template);
            let node = palette
                .instantiate(template, id)
                .ok_or_else(|| EditError::EditFailed(format!("unknown template {template:?}")))?;
            let (into, index) = target.destination(tree)?;
            let tree = insert_at(tree, &into.child(index), node)?;
            Ok((tree, id))
        }
        DragSource::TreeNode { id, path } => {
            // The recorded path belongs to the snapshot the drag began on.
            let from = locate(tree, *id)
                .map_err(|_| EditError::EditFailed(format!("dragged node {id} is gone")))?;
            if &from != path {
                log::debug!("re-resolved {id}: [{path}] -> [{from}]");
            }
            let (into, index) = target.destination(tree)?;
            let tree = move_node(tree, &from, &into, index)?;
            Ok((tree, *id))
        }
    }
}
