//! Undoable edits over the form model.
//!
//! Edits capture enough state to replay a change in either direction.
//! Applying an edit suspends the model's undo recording so the replay does
//! not spawn nested edits.

use uuid::Uuid;

use formic_model::{
    Bounds, Constraints, DetachInfo, FormModel, FormModelEvent, MetaComponent, ModelError, Value,
};

pub trait UndoableEdit {
    fn name(&self) -> &str;
    fn undo(&mut self, model: &mut FormModel) -> Result<(), ModelError>;
    fn redo(&mut self, model: &mut FormModel) -> Result<(), ModelError>;
}

/// Bounded undo/redo stacks. A fresh edit clears the redo stack.
pub struct UndoManager {
    limit: usize,
    undo_stack: Vec<Box<dyn UndoableEdit>>,
    redo_stack: Vec<Box<dyn UndoableEdit>>,
}

impl UndoManager {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    pub fn push(&mut self, edit: Box<dyn UndoableEdit>) {
        self.redo_stack.clear();
        if self.undo_stack.len() >= self.limit {
            self.undo_stack.remove(0);
        }
        self.undo_stack.push(edit);
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo(&mut self, model: &mut FormModel) -> Result<bool, ModelError> {
        let Some(mut edit) = self.undo_stack.pop() else {
            return Ok(false);
        };
        let result = with_recording_suspended(model, |m| edit.undo(m));
        match result {
            Ok(()) => {
                self.redo_stack.push(edit);
                Ok(true)
            }
            Err(err) => {
                // A failed undo leaves the edit off both stacks; replaying
                // it again could only corrupt further.
                log::warn!("undo of '{}' failed: {}", edit.name(), err);
                Err(err)
            }
        }
    }

    pub fn redo(&mut self, model: &mut FormModel) -> Result<bool, ModelError> {
        let Some(mut edit) = self.redo_stack.pop() else {
            return Ok(false);
        };
        let result = with_recording_suspended(model, |m| edit.redo(m));
        match result {
            Ok(()) => {
                self.undo_stack.push(edit);
                Ok(true)
            }
            Err(err) => {
                log::warn!("redo of '{}' failed: {}", edit.name(), err);
                Err(err)
            }
        }
    }
}

/// Runs `f` with undo recording off, restoring the previous state even when
/// `f` fails.
pub fn with_recording_suspended<R>(
    model: &mut FormModel,
    f: impl FnOnce(&mut FormModel) -> R,
) -> R {
    let previous = model.set_undo_recording(false);
    let result = f(model);
    model.set_undo_recording(previous);
    result
}

/// One property value change on one component.
pub struct PropertyEdit {
    pub component: Uuid,
    pub property: String,
    pub old: Option<Value>,
    pub new: Option<Value>,
}

impl PropertyEdit {
    fn apply(&self, model: &mut FormModel, value: &Option<Value>) -> Result<(), ModelError> {
        match value {
            Some(v) => model.set_property(self.component, &self.property, v.clone()),
            None => model.restore_default(self.component, &self.property),
        }
    }
}

impl UndoableEdit for PropertyEdit {
    fn name(&self) -> &str {
        "property change"
    }

    fn undo(&mut self, model: &mut FormModel) -> Result<(), ModelError> {
        let value = self.old.clone();
        self.apply(model, &value)
    }

    fn redo(&mut self, model: &mut FormModel) -> Result<(), ModelError> {
        let value = self.new.clone();
        self.apply(model, &value)
    }
}

/// Removal of a subtree; undo resurrects it at its former slot.
pub struct RemoveEdit {
    pub component: Uuid,
    pub slot: DetachInfo,
    /// Parent-first, as returned by removal. `None` while the subtree lives
    /// in the model.
    pub subtree: Option<Vec<MetaComponent>>,
}

impl UndoableEdit for RemoveEdit {
    fn name(&self) -> &str {
        "delete component"
    }

    fn undo(&mut self, model: &mut FormModel) -> Result<(), ModelError> {
        let subtree = self.subtree.take().unwrap_or_default();
        model.resurrect_component(subtree, &self.slot)
    }

    fn redo(&mut self, model: &mut FormModel) -> Result<(), ModelError> {
        self.subtree = Some(model.remove_component(self.component)?);
        Ok(())
    }
}

/// Reordering of one container's children by permutation.
pub struct ReorderEdit {
    pub container: Uuid,
    pub perm: Vec<usize>,
}

impl ReorderEdit {
    fn inverse(&self) -> Vec<usize> {
        let mut inv = vec![0; self.perm.len()];
        for (i, &target) in self.perm.iter().enumerate() {
            inv[target] = i;
        }
        inv
    }
}

impl UndoableEdit for ReorderEdit {
    fn name(&self) -> &str {
        "reorder components"
    }

    fn undo(&mut self, model: &mut FormModel) -> Result<(), ModelError> {
        model.reorder_sub_components(self.container, &self.inverse())
    }

    fn redo(&mut self, model: &mut FormModel) -> Result<(), ModelError> {
        model.reorder_sub_components(self.container, &self.perm)
    }
}

/// Per-component placement snapshot inside a drop edit.
#[derive(Debug, Clone)]
pub struct PlacementState {
    pub component: Uuid,
    pub delegate_id: String,
    pub constraints: Option<Constraints>,
    pub bounds: Bounds,
}

impl PlacementState {
    pub fn capture(model: &FormModel, component: Uuid, delegate_id: &str) -> Option<Self> {
        let comp = model.component(component).ok()?;
        Some(Self {
            component,
            delegate_id: delegate_id.to_string(),
            constraints: comp.constraints(delegate_id).cloned(),
            bounds: comp.bounds,
        })
    }

    fn apply(&self, model: &mut FormModel) -> Result<(), ModelError> {
        let comp = model.component_mut(self.component)?;
        match &self.constraints {
            Some(c) => comp.set_constraints(c.clone()),
            None => {
                comp.remove_constraints(&self.delegate_id);
            }
        }
        comp.bounds = self.bounds;
        comp.reset_constraints_properties();
        Ok(())
    }
}

/// The committed result of a drag-and-drop gesture: child arrays and
/// placement for every affected container, before and after.
pub struct DropEdit {
    /// (container, children before, children after)
    pub containers: Vec<(Uuid, Vec<Uuid>, Vec<Uuid>)>,
    pub before: Vec<PlacementState>,
    pub after: Vec<PlacementState>,
}

impl DropEdit {
    fn apply(
        &self,
        model: &mut FormModel,
        direction: impl Fn(&(Uuid, Vec<Uuid>, Vec<Uuid>)) -> &Vec<Uuid>,
        states: &[PlacementState],
    ) -> Result<(), ModelError> {
        for entry in &self.containers {
            model.set_children(entry.0, direction(entry).clone())?;
        }
        for state in states {
            state.apply(model)?;
        }
        for entry in &self.containers {
            model.notify(FormModelEvent::LayoutChanged {
                container: entry.0,
                component: entry.0,
            });
        }
        Ok(())
    }
}

impl UndoableEdit for DropEdit {
    fn name(&self) -> &str {
        "move components"
    }

    fn undo(&mut self, model: &mut FormModel) -> Result<(), ModelError> {
        let states = self.before.clone();
        self.apply(model, |entry| &entry.1, &states)
    }

    fn redo(&mut self, model: &mut FormModel) -> Result<(), ModelError> {
        let states = self.after.clone();
        self.apply(model, |entry| &entry.2, &states)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formic_model::{ComponentClass, PropertyValue};

    fn model_with_button() -> (FormModel, Uuid) {
        let mut model = FormModel::new("Form1");
        let root = model.root();
        let button = model
            .add_component(root, ComponentClass::Button, -1)
            .unwrap();
        (model, button)
    }

    #[test]
    fn property_edit_round_trips() {
        let (mut model, button) = model_with_button();
        let new = Value::literal(PropertyValue::String("Go".into()));
        model.set_property(button, "Text", new.clone()).unwrap();

        let mut manager = UndoManager::new(16);
        manager.push(Box::new(PropertyEdit {
            component: button,
            property: "Text".into(),
            old: None,
            new: Some(new.clone()),
        }));

        assert!(manager.undo(&mut model).unwrap());
        assert_eq!(model.property_value(button, "Text").unwrap(), None);
        assert!(manager.redo(&mut model).unwrap());
        assert_eq!(model.property_value(button, "Text").unwrap(), Some(&new));
    }

    #[test]
    fn remove_edit_resurrects_the_subtree() {
        let (mut model, _) = model_with_button();
        let root = model.root();
        let panel = model.add_component(root, ComponentClass::Panel, -1).unwrap();
        let inner = model
            .add_component(panel, ComponentClass::Label, -1)
            .unwrap();

        let slot = model.slot_of(panel).unwrap();
        let subtree = model.remove_component(panel).unwrap();
        let mut edit = RemoveEdit {
            component: panel,
            slot,
            subtree: Some(subtree),
        };

        edit.undo(&mut model).unwrap();
        assert!(model.component(panel).is_ok());
        assert!(model.component(inner).is_ok());
        assert_eq!(model.component(panel).unwrap().sub_components(), &[inner]);
        // Panel returned to index 1 behind the button.
        assert_eq!(model.component_index(panel), Some(1));

        edit.redo(&mut model).unwrap();
        assert!(model.component(panel).is_err());
    }

    #[test]
    fn reorder_edit_inverts_its_permutation() {
        let (mut model, a) = model_with_button();
        let root = model.root();
        let b = model.add_component(root, ComponentClass::Label, -1).unwrap();
        let c = model
            .add_component(root, ComponentClass::TextBox, -1)
            .unwrap();

        let mut edit = ReorderEdit {
            container: root,
            perm: vec![1, 0, 2],
        };
        edit.redo(&mut model).unwrap();
        assert_eq!(model.component(root).unwrap().sub_components(), &[b, a, c]);
        edit.undo(&mut model).unwrap();
        assert_eq!(model.component(root).unwrap().sub_components(), &[a, b, c]);
    }

    #[test]
    fn push_clears_redo() {
        let (mut model, button) = model_with_button();
        let mut manager = UndoManager::new(16);
        manager.push(Box::new(PropertyEdit {
            component: button,
            property: "Text".into(),
            old: None,
            new: Some(Value::literal(PropertyValue::String("A".into()))),
        }));
        manager.undo(&mut model).unwrap();
        assert!(manager.can_redo());
        manager.push(Box::new(PropertyEdit {
            component: button,
            property: "Text".into(),
            old: None,
            new: Some(Value::literal(PropertyValue::String("B".into()))),
        }));
        assert!(!manager.can_redo());
    }
}
