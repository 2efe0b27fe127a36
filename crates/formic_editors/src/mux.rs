//! Editor registry and the per-property editor multiplexer.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use formic_model::{FormModel, FormProperty, Value, ValueType};

use crate::standard::{
    BooleanEditor, ColorEditor, ConnectionEditor, DoubleEditor, ExpressionEditor, IntegerEditor,
    StringListEditor, TagsEditor, TextEditor,
};
use crate::{EditorError, PropertyEditor};

/// All known editors, grouped by the value type they edit.
pub struct EditorRegistry {
    by_type: HashMap<ValueType, Vec<Arc<dyn PropertyEditor>>>,
    by_id: HashMap<&'static str, Arc<dyn PropertyEditor>>,
}

impl EditorRegistry {
    /// A registry holding the built-in editors.
    pub fn new() -> Self {
        let mut registry = Self {
            by_type: HashMap::new(),
            by_id: HashMap::new(),
        };
        registry.register(Arc::new(TextEditor));
        registry.register(Arc::new(IntegerEditor));
        registry.register(Arc::new(DoubleEditor));
        registry.register(Arc::new(BooleanEditor));
        registry.register(Arc::new(ColorEditor));
        registry.register(Arc::new(StringListEditor));
        registry.register(Arc::new(ExpressionEditor));
        registry.register(Arc::new(ConnectionEditor::new(ValueType::Text)));
        registry
    }

    pub fn register(&mut self, editor: Arc<dyn PropertyEditor>) {
        self.by_type
            .entry(editor.value_type())
            .or_default()
            .push(Arc::clone(&editor));
        self.by_id.insert(editor.id(), editor);
    }

    pub fn editor(&self, id: &str) -> Result<Arc<dyn PropertyEditor>, EditorError> {
        self.by_id
            .get(id)
            .cloned()
            .ok_or_else(|| EditorError::UnknownEditor(id.to_string()))
    }

    pub fn editors_for(&self, value_type: ValueType) -> Vec<Arc<dyn PropertyEditor>> {
        self.by_type.get(&value_type).cloned().unwrap_or_default()
    }
}

impl Default for EditorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The applicable editors for one property, with the active editor at the
/// front.
pub struct EditorMux {
    editors: Vec<Arc<dyn PropertyEditor>>,
}

impl EditorMux {
    /// Builds the editor list for a property: the type-registered editors,
    /// a tag editor synthesized from the descriptor's choices, and the
    /// property's own editor selection activated on top.
    pub fn for_property(
        registry: &EditorRegistry,
        prop: &FormProperty,
    ) -> Result<Self, EditorError> {
        let mut editors = registry.editors_for(prop.value_type());
        if let Some(tags) = &prop.descriptor().tags {
            insert_preferred(
                &mut editors,
                Arc::new(TagsEditor::new(prop.value_type(), tags.clone())),
            );
        }
        let preferred = prop
            .current_editor()
            .map(str::to_string)
            .or_else(|| prop.descriptor().explicit_editor.clone());
        if let Some(id) = preferred {
            match registry.editor(&id) {
                Ok(editor) => insert_preferred(&mut editors, editor),
                Err(_) => {
                    if let Some(pos) = editors.iter().position(|e| e.id() == id) {
                        let editor = editors.remove(pos);
                        editors.insert(0, editor);
                    } else {
                        log::warn!("property '{}' names unknown editor '{}'", prop.name(), id);
                    }
                }
            }
        }
        if editors.is_empty() {
            return Err(EditorError::NoEditor(prop.value_type()));
        }
        Ok(Self { editors })
    }

    pub fn editors(&self) -> &[Arc<dyn PropertyEditor>] {
        &self.editors
    }

    /// The editor in charge: always the front of the list.
    pub fn active(&self) -> &dyn PropertyEditor {
        self.editors[0].as_ref()
    }

    /// Switches the active editor, keeping the rest of the list order.
    pub fn activate(&mut self, id: &str) -> Result<(), EditorError> {
        let pos = self
            .editors
            .iter()
            .position(|e| e.id() == id)
            .ok_or_else(|| EditorError::UnknownEditor(id.to_string()))?;
        let editor = self.editors.remove(pos);
        self.editors.insert(0, editor);
        Ok(())
    }
}

/// Replaces the first editor with a matching id, otherwise prepends; either
/// way the preferred editor ends up active.
fn insert_preferred(editors: &mut Vec<Arc<dyn PropertyEditor>>, editor: Arc<dyn PropertyEditor>) {
    if let Some(pos) = editors.iter().position(|e| e.id() == editor.id()) {
        editors.remove(pos);
    }
    editors.insert(0, editor);
}

/// Staging surface behind the custom editor dialog: each editor mode keeps
/// its own pending text, and nothing touches the model until commit.
pub struct FormCustomEditor {
    mux: EditorMux,
    staged: HashMap<String, String>,
}

impl FormCustomEditor {
    pub fn new(mux: EditorMux) -> Self {
        Self {
            mux,
            staged: HashMap::new(),
        }
    }

    pub fn mux(&self) -> &EditorMux {
        &self.mux
    }

    /// Stages text for the active editor mode.
    pub fn stage(&mut self, text: impl Into<String>) {
        self.staged.insert(self.mux.active().id().to_string(), text.into());
    }

    pub fn staged_text(&self) -> Option<&str> {
        self.staged.get(self.mux.active().id()).map(String::as_str)
    }

    /// Switches modes. Text staged in other modes is kept, so flipping back
    /// and forth loses nothing.
    pub fn select_editor(&mut self, id: &str) -> Result<(), EditorError> {
        self.mux.activate(id)
    }

    /// Parses the active mode's staged text and writes it to the model,
    /// recording the editor choice on the property. A parse failure leaves
    /// the model untouched.
    pub fn commit(
        &mut self,
        model: &mut FormModel,
        component: Uuid,
        property: &str,
    ) -> Result<Value, EditorError> {
        let active_id = self.mux.active().id();
        let text = self
            .staged
            .get(active_id)
            .cloned()
            .unwrap_or_default();
        let value = self.mux.active().parse_text(&text)?;
        model.set_property(component, property, value.clone())?;
        if let Some(prop) = model
            .component_mut(component)?
            .property_mut(property)
        {
            prop.set_current_editor(Some(active_id.to_string()));
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formic_model::{ComponentClass, PropertyDescriptor, PropertyValue};

    #[test]
    fn explicit_editor_replaces_its_match_and_leads() {
        let registry = EditorRegistry::new();
        let desc = PropertyDescriptor::new("Caption", ValueType::Text).with_editor("connection");
        let prop = FormProperty::new(desc);
        let mux = EditorMux::for_property(&registry, &prop).unwrap();
        assert_eq!(mux.active().id(), "connection");
        // No duplicate left behind in the type list.
        let connections = mux
            .editors()
            .iter()
            .filter(|e| e.id() == "connection")
            .count();
        assert_eq!(connections, 1);
    }

    #[test]
    fn current_editor_outranks_the_descriptor() {
        let registry = EditorRegistry::new();
        let desc = PropertyDescriptor::new("Caption", ValueType::Text).with_editor("connection");
        let mut prop = FormProperty::new(desc);
        prop.set_current_editor(Some("text".to_string()));
        let mux = EditorMux::for_property(&registry, &prop).unwrap();
        assert_eq!(mux.active().id(), "text");
    }

    #[test]
    fn descriptor_tags_synthesize_a_combo_editor() {
        let registry = EditorRegistry::new();
        let desc = PropertyDescriptor::new("DropDownStyle", ValueType::Int).with_tags(vec![
            ("Simple", PropertyValue::Integer(0)),
            ("DropDown", PropertyValue::Integer(1)),
        ]);
        let prop = FormProperty::new(desc);
        let mux = EditorMux::for_property(&registry, &prop).unwrap();
        assert_eq!(mux.active().id(), "tags");
        assert_eq!(
            mux.active().tags(),
            Some(vec!["Simple".to_string(), "DropDown".to_string()])
        );
    }

    #[test]
    fn staged_text_survives_mode_switches() {
        let registry = EditorRegistry::new();
        let prop = FormProperty::new(PropertyDescriptor::new("Text", ValueType::Text));
        let mux = EditorMux::for_property(&registry, &prop).unwrap();
        let mut editor = FormCustomEditor::new(mux);

        editor.stage("hello");
        editor.select_editor("connection").unwrap();
        editor.stage("lblStatus.Text");
        editor.select_editor("text").unwrap();
        assert_eq!(editor.staged_text(), Some("hello"));
        editor.select_editor("connection").unwrap();
        assert_eq!(editor.staged_text(), Some("lblStatus.Text"));
    }

    #[test]
    fn commit_writes_through_and_records_the_editor() {
        let registry = EditorRegistry::new();
        let mut model = FormModel::new("Form1");
        let root = model.root();
        let button = model
            .add_component(root, ComponentClass::Button, -1)
            .unwrap();

        let prop = model
            .component(button)
            .unwrap()
            .property("Text")
            .unwrap()
            .clone();
        let mux = EditorMux::for_property(&registry, &prop).unwrap();
        let mut editor = FormCustomEditor::new(mux);
        editor.stage("Go");
        editor.commit(&mut model, button, "Text").unwrap();

        assert_eq!(
            model.property_value(button, "Text").unwrap(),
            Some(&Value::literal(PropertyValue::String("Go".into())))
        );
        assert_eq!(
            model
                .component(button)
                .unwrap()
                .property("Text")
                .unwrap()
                .current_editor(),
            Some("text")
        );
    }

    #[test]
    fn invalid_input_leaves_the_model_untouched() {
        let registry = EditorRegistry::new();
        let mut model = FormModel::new("Form1");
        let root = model.root();
        let bar = model
            .add_component(root, ComponentClass::ProgressBar, -1)
            .unwrap();

        let prop = model
            .component(bar)
            .unwrap()
            .property("Value")
            .unwrap()
            .clone();
        let mux = EditorMux::for_property(&registry, &prop).unwrap();
        let mut editor = FormCustomEditor::new(mux);
        editor.stage("not-a-number");
        assert!(editor.commit(&mut model, bar, "Value").is_err());
        assert_eq!(model.property_value(bar, "Value").unwrap(), None);
    }
}
