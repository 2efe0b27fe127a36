use serde::{Deserialize, Serialize};

/// Per-(component, layout delegate) placement data. Opaque to the component
/// model: components keep one entry per delegate id they have been placed
/// under, so switching a container's layout and switching back (or undoing
/// across the switch) recovers the earlier placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constraints {
    /// Free-design placement: position and size in container coordinates.
    Absolute {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
    /// Order-driven placement.
    Flow { index: usize },
    /// Cell placement in a bounded grid.
    Grid {
        row: usize,
        col: usize,
        row_span: usize,
        col_span: usize,
    },
}

impl Constraints {
    /// Identifier of the delegate family these constraints belong to.
    pub fn delegate_id(&self) -> &'static str {
        match self {
            Constraints::Absolute { .. } => "absolute",
            Constraints::Flow { .. } => "flow",
            Constraints::Grid { .. } => "grid",
        }
    }
}
