pub mod canvas;
pub mod config;
pub mod events;
pub mod guard;
pub mod input;
pub mod palette;
pub mod selection;
pub mod session;

pub use canvas::Canvas;
pub use config::CanvasConfig;
pub use events::{DragEventKind, DragLogEvent, EventLog, EventSink};
pub use guard::{BackupGuard, Document};
pub use input::{DragEvent, HoverSurface, SurfaceKey};
pub use palette::{DefaultPalette, Palette, Template};
pub use selection::Selection;
pub use session::{DragSession, DragSource, DropOutcome, DropTarget, Hover, SessionState};

// Re-export geometry types so hosts don't need a direct kurbo dependency
pub use kurbo::{Point, Rect};
