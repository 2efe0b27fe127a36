//! Design-surface mechanics for the form editor: layout delegates, drag
//! gestures, undoable edits and UI-thread dispatch.

pub mod dispatch;
pub mod dragger;
pub mod layout;
pub mod undo;

pub use dispatch::{DispatchError, DispatchHandle, Dispatcher};
pub use dragger::{ComponentDragger, DragMode, DropOutcome, DropPlan, HandlePosition};
pub use layout::{
    AbsoluteLayout, FlowLayout, GridLayout, LayoutError, LayoutRegistry, LayoutSupport, Point,
    ResizeDeltas,
};
pub use undo::{
    DropEdit, PlacementState, PropertyEdit, RemoveEdit, ReorderEdit, UndoManager, UndoableEdit,
};
