//! Property editors for the form designer's property sheet.
//!
//! Every property type has one or more registered editors; a property keeps
//! a list of the applicable ones with the active editor at the front. The
//! multiplexer in [`mux`] builds and reorders that list.

pub mod mux;
pub mod standard;

use formic_model::{ModelError, Value, ValueType};

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("'{input}' is not a valid {editor} value: {reason}")]
    Invalid {
        editor: &'static str,
        input: String,
        reason: String,
    },
    #[error("no editor registered for {0:?}")]
    NoEditor(ValueType),
    #[error("unknown editor id: {0}")]
    UnknownEditor(String),
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// One way of editing a property value as text, plus optional extras:
/// enumerated tags for combo-style editing and a custom panel.
pub trait PropertyEditor {
    fn id(&self) -> &'static str;

    fn value_type(&self) -> ValueType;

    /// The value rendered for the inline text field.
    fn as_text(&self, value: &Value) -> String;

    /// Parses inline text back into a value; rejects text the editor cannot
    /// represent without touching the property.
    fn parse_text(&self, text: &str) -> Result<Value, EditorError>;

    /// Enumerated choices, when the editor is tag-based.
    fn tags(&self) -> Option<Vec<String>> {
        None
    }

    /// Whether the editor offers a custom dialog beyond inline text.
    fn supports_custom_panel(&self) -> bool {
        false
    }
}

pub use mux::{EditorMux, EditorRegistry, FormCustomEditor};
