pub mod color;
pub mod document;
pub mod edit;
pub mod error;
pub mod id;
pub mod model;
pub mod selection;
pub mod tree;

pub use color::{HueSource, XorShiftHues, assign_root_child_color, resolve_color};
pub use edit::{Detached, MovePlan, Origin};
pub use error::{SelectionIssue, TreeError, TreeResult};
pub use id::{ArrowId, NodeId, SummaryId};
pub use model::*;
pub use selection::{SiblingRange, min_common_parent};
