//! The hosting canvas surface.
//!
//! A `Canvas` is created when the editing surface mounts and disposed when it
//! unmounts. It owns the published document, the one drag session, the
//! selection, the palette and the optional event sink, and routes renderer
//! events between them.

use crate::config::CanvasConfig;
use crate::events::{DragEventKind, EventLog, EventSink, Recorder};
use crate::guard::{self, Document};
use crate::input::{DragEvent, HoverSurface};
use crate::palette::{DefaultPalette, Palette};
use crate::selection::Selection;
use crate::session::{DragSession, DragSource, DropOutcome, DropTarget};
use kurbo::Point;
use pb_core::{EditResult, Node, NodeId, Tree, locate, remove_at, set_property};
use serde_json::{Map, Value, json};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

pub struct Canvas<P: Palette = DefaultPalette> {
    document: Document,
    session: DragSession,
    selection: Option<Selection>,
    palette: P,
    recorder: Recorder,
    config: CanvasConfig,
    /// Outcome of the last drop, reported with the following drag-end.
    last_drop_applied: Option<bool>,
}

impl Canvas<DefaultPalette> {
    /// Mount an empty canvas with the stock palette.
    pub fn new(config: CanvasConfig, now: Instant) -> Self {
        Self::with_palette(Tree::new(), DefaultPalette, config, now)
    }
}

impl<P: Palette> Canvas<P> {
    pub fn with_palette(tree: Tree, palette: P, config: CanvasConfig, now: Instant) -> Self {
        log::debug!("canvas mounted with {} top-level nodes", tree.len());
        Self {
            document: Document::new(tree),
            session: DragSession::new(config.cooldown()),
            selection: None,
            palette,
            recorder: Recorder::new(now, config.dragover_sample_every),
            config,
            last_drop_applied: None,
        }
    }

    /// Start from an existing tree.
    pub fn with_tree(mut self, tree: Tree) -> Self {
        self.document = Document::new(tree);
        self.selection = None;
        self
    }

    /// Attach an observability sink.
    pub fn with_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.recorder.set_sink(Some(Box::new(sink)));
        self
    }

    /// Attach a fresh `EventLog` sized by `event_log_capacity` and return a
    /// handle for the observability panel to read.
    pub fn attach_event_log(&mut self) -> Rc<RefCell<EventLog>> {
        let log = Rc::new(RefCell::new(EventLog::new(self.config.event_log_capacity)));
        self.recorder.set_sink(Some(Box::new(log.clone())));
        log
    }

    pub fn detach_sink(&mut self) {
        self.recorder.set_sink(None);
    }

    pub fn tree(&self) -> &Tree {
        self.document.tree()
    }

    pub fn revision(&self) -> u64 {
        self.document.revision()
    }

    pub fn session(&self) -> &DragSession {
        &self.session
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn palette(&self) -> &P {
        &self.palette
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    // ─── Drag events ─────────────────────────────────────────────────────

    /// Route one renderer event. Returns the outcome if it was a drop that
    /// consumed a gesture.
    pub fn handle(&mut self, event: DragEvent, now: Instant) -> Option<DropOutcome> {
        self.session.expire(now);
        match event {
            DragEvent::StartFromPalette { template } => {
                self.record(
                    DragEventKind::DragStart,
                    now,
                    format!("sidebar-{template}"),
                    None,
                    extra([("componentType", json!(template))]),
                );
                self.session.arm_palette(template, now);
                self.last_drop_applied = None;
                None
            }
            DragEvent::StartFromNode { id } => {
                match self.session.arm_node(self.document.tree(), id, now) {
                    Ok(()) => {
                        let path = self.source_path();
                        self.record(
                            DragEventKind::DragStart,
                            now,
                            format!("component-{id}"),
                            None,
                            extra([("path", json!(path))]),
                        );
                        self.last_drop_applied = None;
                    }
                    Err(err) => log::warn!("drag start ignored: {err}"),
                }
                None
            }
            DragEvent::Enter { surface, pointer } => {
                self.hover(DragEventKind::DragEnter, &surface, pointer, now);
                None
            }
            DragEvent::Over { surface, pointer } => {
                self.hover(DragEventKind::DragOver, &surface, pointer, now);
                None
            }
            DragEvent::Leave {
                surface,
                left_bounds,
            } => {
                if self.session.is_dragging() && left_bounds {
                    self.record(
                        DragEventKind::DragLeave,
                        now,
                        surface.key().descriptor(),
                        None,
                        self.source_extra(),
                    );
                }
                self.session.leave(&surface, left_bounds);
                None
            }
            DragEvent::Drop { pointer } => self.drop_at(pointer, now),
            DragEvent::End => {
                let ended = self.session.end(now);
                if ended || self.last_drop_applied.is_some() {
                    let success = self.last_drop_applied.take().unwrap_or(false);
                    self.record(
                        DragEventKind::DragEnd,
                        now,
                        "canvas".to_string(),
                        None,
                        extra([("success", json!(success))]),
                    );
                }
                None
            }
        }
    }

    /// Service the cooldown timer without an accompanying event.
    pub fn tick(&mut self, now: Instant) {
        self.session.expire(now);
    }

    fn hover(&mut self, kind: DragEventKind, surface: &HoverSurface, pointer: Point, now: Instant) {
        if !self.session.is_dragging() {
            return;
        }
        let mut fields = self.source_extra();
        if let HoverSurface::ContainerBody(id) = surface {
            fields.insert("containerId".into(), json!(id));
        }
        self.record(kind, now, surface.key().descriptor(), Some(pointer), fields);
        self.session
            .hover_over(self.document.tree(), surface, pointer, now);
    }

    fn drop_at(&mut self, pointer: Point, now: Instant) -> Option<DropOutcome> {
        if !self.session.is_dragging() {
            log::trace!("drop outside a gesture ignored");
            return None;
        }

        // Log before the edit, with paths from the snapshot being edited.
        let hover = self.session.hover().cloned();
        let mut fields = self.source_extra();
        let target = match hover.as_ref().map(|h| &h.target) {
            Some(gap @ DropTarget::NodeGap { .. }) => {
                if let Ok((parent, index)) = gap.destination(self.document.tree()) {
                    fields.insert("dropPath".into(), json!(parent.child(index)));
                }
                hover.as_ref().map(|h| h.surface.descriptor())
            }
            Some(DropTarget::Container(id)) => {
                fields.insert("containerId".into(), json!(id));
                hover.as_ref().map(|h| h.surface.descriptor())
            }
            Some(DropTarget::Canvas) | None => Some("canvas".to_string()),
        };
        self.record(
            DragEventKind::Drop,
            now,
            target.unwrap_or_default(),
            Some(pointer),
            fields,
        );

        let outcome = self
            .session
            .drop_on(&mut self.document, &self.palette, now)?;
        self.last_drop_applied = Some(outcome.applied());
        if outcome.applied() {
            self.refresh_selection();
        }
        Some(outcome)
    }

    // ─── Selection & direct edits ────────────────────────────────────────

    pub fn select(&mut self, id: NodeId) -> EditResult<&Selection> {
        let selection = Selection::of(self.document.tree(), id)?;
        Ok(&*self.selection.insert(selection))
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Delete a node and its subtree. This is the only way a node is
    /// destroyed; drag-drop always reinserts what it removes.
    pub fn delete(&mut self, id: NodeId) -> EditResult<Arc<Node>> {
        let removed = guard::apply(&mut self.document, |tree| {
            let path = locate(tree, id)?;
            remove_at(tree, &path)
        })?;
        log::debug!("deleted {id} ({} nodes)", removed.subtree_ids().len());
        self.refresh_selection();
        Ok(removed)
    }

    /// Set one property on a node, for the properties inspector.
    pub fn set_property(&mut self, id: NodeId, key: &str, value: Value) -> EditResult<()> {
        guard::apply(&mut self.document, |tree| {
            let path = locate(tree, id)?;
            Ok((set_property(tree, &path, key, value)?, ()))
        })
    }

    /// Tear the canvas down. Any gesture is dropped and a pending cooldown
    /// is cancelled; the final document is handed back.
    pub fn dispose(mut self) -> Document {
        self.session.cancel();
        log::debug!("canvas disposed at revision {}", self.document.revision());
        self.document
    }

    fn refresh_selection(&mut self) {
        if let Some(selection) = self.selection.take() {
            self.selection = selection.refresh(self.document.tree());
            if self.selection.is_none() {
                log::debug!("selection {} cleared, node is gone", selection.id);
            }
        }
    }

    // ─── Event helpers ───────────────────────────────────────────────────

    fn source_path(&self) -> Option<pb_core::Path> {
        match self.session.source()? {
            DragSource::TreeNode { path, .. } => Some(path.clone()),
            DragSource::Palette { .. } => None,
        }
    }

    fn source_extra(&self) -> Map<String, Value> {
        match self.session.source() {
            Some(DragSource::Palette { template }) => extra([
                ("source", json!("sidebar")),
                ("componentType", json!(template)),
            ]),
            Some(DragSource::TreeNode { path, .. }) => {
                extra([("source", json!("canvas")), ("sourcePath", json!(path))])
            }
            None => Map::new(),
        }
    }

    fn record(
        &mut self,
        kind: DragEventKind,
        now: Instant,
        target: String,
        position: Option<Point>,
        fields: Map<String, Value>,
    ) {
        self.recorder.record(kind, now, target, position, fields);
    }
}

fn extra<const N: usize>(fields: [(&str, Value); N]) -> Map<String, Value> {
    fields
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}
