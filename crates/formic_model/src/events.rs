use serde::{Deserialize, Serialize};

use crate::error::ModelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    Click,
    DoubleClick,
    Load,
    TextChanged,
    SelectedIndexChanged,
    CheckedChanged,
    KeyDown,
    KeyUp,
    MouseDown,
    MouseUp,
    MouseMove,
    GotFocus,
    LostFocus,
    Resize,
    FormClosing,
    Tick,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Click => "Click",
            EventType::DoubleClick => "DoubleClick",
            EventType::Load => "Load",
            EventType::TextChanged => "TextChanged",
            EventType::SelectedIndexChanged => "SelectedIndexChanged",
            EventType::CheckedChanged => "CheckedChanged",
            EventType::KeyDown => "KeyDown",
            EventType::KeyUp => "KeyUp",
            EventType::MouseDown => "MouseDown",
            EventType::MouseUp => "MouseUp",
            EventType::MouseMove => "MouseMove",
            EventType::GotFocus => "GotFocus",
            EventType::LostFocus => "LostFocus",
            EventType::Resize => "Resize",
            EventType::FormClosing => "FormClosing",
            EventType::Tick => "Tick",
        }
    }

    /// Parameter signature for generated event handlers.
    pub fn parameters(&self) -> &'static str {
        match self {
            EventType::MouseDown | EventType::MouseUp | EventType::MouseMove => {
                "sender As Object, e As MouseEventArgs"
            }
            EventType::KeyDown | EventType::KeyUp => "sender As Object, e As KeyEventArgs",
            EventType::FormClosing => "sender As Object, e As FormClosingEventArgs",
            _ => "sender As Object, e As EventArgs",
        }
    }
}

/// Design-time proxy for one event of a component: the name of the handler
/// the generated code wires to it, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventProperty {
    event: EventType,
    handler: Option<String>,
}

impl EventProperty {
    pub fn new(event: EventType) -> Self {
        Self {
            event,
            handler: None,
        }
    }

    pub fn event(&self) -> EventType {
        self.event
    }

    pub fn handler(&self) -> Option<&str> {
        self.handler.as_deref()
    }

    /// Sets (or clears) the handler name. A malformed name is rejected so
    /// the hosting property sheet can refuse the edit in place.
    pub fn set_handler(&mut self, handler: Option<String>) -> Result<Option<String>, ModelError> {
        if let Some(name) = handler.as_deref() {
            if !is_valid_identifier(name) {
                return Err(ModelError::InvalidIdentifier(name.to_string()));
            }
        }
        let old = self.handler.take();
        self.handler = handler;
        Ok(old)
    }
}

/// Identifier rule for generated handler names: leading letter or
/// underscore, then letters, digits or underscores.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_validation() {
        assert!(is_valid_identifier("btnOk_Click"));
        assert!(is_valid_identifier("_handler1"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("1stClick"));
        assert!(!is_valid_identifier("do it"));
    }

    #[test]
    fn bad_handler_name_leaves_property_untouched() {
        let mut ev = EventProperty::new(EventType::Click);
        ev.set_handler(Some("btnOk_Click".to_string())).unwrap();
        assert!(ev.set_handler(Some("not a name".to_string())).is_err());
        assert_eq!(ev.handler(), Some("btnOk_Click"));
    }
}
