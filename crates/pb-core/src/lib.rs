pub mod edit;
pub mod error;
pub mod id;
pub mod model;
pub mod path;

pub use edit::{insert_at, move_node, remove_at, set_property};
pub use error::{EditError, EditResult};
pub use id::NodeId;
pub use model::*;
pub use path::{Location, Path, children_of, locate, resolve, resolve_slot};
