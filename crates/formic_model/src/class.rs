use serde::{Deserialize, Serialize};

use crate::events::EventType;
use crate::properties::PropertyBag;
use crate::value::{PropertyValue, ValueType};

/// How a component behaves structurally in the design tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComponentKind {
    /// Non-visual component (lives in the component tray).
    Plain,
    /// Visual leaf component.
    Visual,
    /// Visual component that owns an ordered list of children.
    Container,
    /// The top-level form surface.
    FormRoot,
}

impl ComponentKind {
    pub fn is_visual(&self) -> bool {
        !matches!(self, ComponentKind::Plain)
    }

    pub fn is_container(&self) -> bool {
        matches!(self, ComponentKind::Container | ComponentKind::FormRoot)
    }
}

/// Access mode of a property on the live instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Access {
    ReadWrite,
    /// The design value is stored and generated but never applied to the
    /// live instance.
    NoWrite,
    /// Reads never consult the live instance; no default is captured.
    DetachedRead,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub name: String,
    pub display_name: String,
    pub value_type: ValueType,
    pub access: Access,
    pub default_hint: Option<PropertyValue>,
    /// Enumerated values: (display tag, value) pairs.
    pub tags: Option<Vec<(String, PropertyValue)>>,
    /// Editor id declared for this property, overriding the type default.
    pub explicit_editor: Option<String>,
}

impl PropertyDescriptor {
    pub fn new(name: &str, value_type: ValueType) -> Self {
        Self {
            name: name.to_string(),
            display_name: name.to_string(),
            value_type,
            access: Access::ReadWrite,
            default_hint: None,
            tags: None,
            explicit_editor: None,
        }
    }

    pub fn with_default(mut self, v: impl Into<PropertyValue>) -> Self {
        self.default_hint = Some(v.into());
        self
    }

    pub fn with_access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    pub fn with_tags(mut self, tags: Vec<(&str, PropertyValue)>) -> Self {
        self.tags = Some(
            tags.into_iter()
                .map(|(t, v)| (t.to_string(), v))
                .collect(),
        );
        self
    }

    pub fn with_editor(mut self, editor_id: &str) -> Self {
        self.explicit_editor = Some(editor_id.to_string());
        self
    }
}

/// The component classes the designer knows how to introspect. Stands in for
/// a reflection layer: each class yields typed, named, gettable/settable
/// property descriptors plus event descriptors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ComponentClass {
    Form,
    Button,
    Label,
    TextBox,
    CheckBox,
    ComboBox,
    ListBox,
    Panel,
    Frame,
    TabControl,
    ProgressBar,
    MenuBar,
    MenuItem,
    Timer,
    /// Arbitrary custom component (fully qualified name).
    Custom(String),
}

impl ComponentClass {
    /// Parse a class name (case-insensitive) into a ComponentClass.
    pub fn from_name(name: &str) -> ComponentClass {
        match name.to_lowercase().as_str() {
            "form" => ComponentClass::Form,
            "button" => ComponentClass::Button,
            "label" => ComponentClass::Label,
            "textbox" => ComponentClass::TextBox,
            "checkbox" => ComponentClass::CheckBox,
            "combobox" => ComponentClass::ComboBox,
            "listbox" => ComponentClass::ListBox,
            "panel" => ComponentClass::Panel,
            "frame" | "groupbox" => ComponentClass::Frame,
            "tabcontrol" => ComponentClass::TabControl,
            "progressbar" => ComponentClass::ProgressBar,
            "menubar" | "menustrip" => ComponentClass::MenuBar,
            "menuitem" => ComponentClass::MenuItem,
            "timer" => ComponentClass::Timer,
            _ => ComponentClass::Custom(name.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ComponentClass::Form => "Form",
            ComponentClass::Button => "Button",
            ComponentClass::Label => "Label",
            ComponentClass::TextBox => "TextBox",
            ComponentClass::CheckBox => "CheckBox",
            ComponentClass::ComboBox => "ComboBox",
            ComponentClass::ListBox => "ListBox",
            ComponentClass::Panel => "Panel",
            ComponentClass::Frame => "Frame",
            ComponentClass::TabControl => "TabControl",
            ComponentClass::ProgressBar => "ProgressBar",
            ComponentClass::MenuBar => "MenuBar",
            ComponentClass::MenuItem => "MenuItem",
            ComponentClass::Timer => "Timer",
            ComponentClass::Custom(s) => s.as_str(),
        }
    }

    /// Fully qualified class name used in generated code.
    pub fn qualified_name(&self) -> String {
        match self {
            ComponentClass::Form => "System.Windows.Forms.Form".to_string(),
            ComponentClass::Button => "System.Windows.Forms.Button".to_string(),
            ComponentClass::Label => "System.Windows.Forms.Label".to_string(),
            ComponentClass::TextBox => "System.Windows.Forms.TextBox".to_string(),
            ComponentClass::CheckBox => "System.Windows.Forms.CheckBox".to_string(),
            ComponentClass::ComboBox => "System.Windows.Forms.ComboBox".to_string(),
            ComponentClass::ListBox => "System.Windows.Forms.ListBox".to_string(),
            ComponentClass::Panel => "System.Windows.Forms.Panel".to_string(),
            ComponentClass::Frame => "System.Windows.Forms.GroupBox".to_string(),
            ComponentClass::TabControl => "System.Windows.Forms.TabControl".to_string(),
            ComponentClass::ProgressBar => "System.Windows.Forms.ProgressBar".to_string(),
            ComponentClass::MenuBar => "System.Windows.Forms.MenuStrip".to_string(),
            ComponentClass::MenuItem => "System.Windows.Forms.ToolStripMenuItem".to_string(),
            ComponentClass::Timer => "System.Windows.Forms.Timer".to_string(),
            ComponentClass::Custom(s) => s.clone(),
        }
    }

    pub fn kind(&self) -> ComponentKind {
        match self {
            ComponentClass::Form => ComponentKind::FormRoot,
            ComponentClass::Panel | ComponentClass::Frame | ComponentClass::TabControl => {
                ComponentKind::Container
            }
            ComponentClass::Timer => ComponentKind::Plain,
            _ => ComponentKind::Visual,
        }
    }

    /// Menu-bar components get routed into the container's dedicated menu
    /// slot instead of the ordered child list.
    pub fn is_menu_bar(&self) -> bool {
        matches!(self, ComponentClass::MenuBar)
    }

    /// Only the form surface carries a menu bar.
    pub fn supports_menu(&self) -> bool {
        matches!(self, ComponentClass::Form)
    }

    pub fn default_name_prefix(&self) -> &str {
        match self {
            ComponentClass::Form => "Form",
            ComponentClass::Button => "btn",
            ComponentClass::Label => "lbl",
            ComponentClass::TextBox => "txt",
            ComponentClass::CheckBox => "chk",
            ComponentClass::ComboBox => "cbo",
            ComponentClass::ListBox => "lst",
            ComponentClass::Panel => "pnl",
            ComponentClass::Frame => "fra",
            ComponentClass::TabControl => "tab",
            ComponentClass::ProgressBar => "prg",
            ComponentClass::MenuBar => "mnu",
            ComponentClass::MenuItem => "mni",
            ComponentClass::Timer => "tmr",
            ComponentClass::Custom(_) => "ctl",
        }
    }

    pub fn default_size(&self) -> (i32, i32) {
        match self {
            ComponentClass::Form => (640, 480),
            ComponentClass::Button => (96, 28),
            ComponentClass::Label => (80, 20),
            ComponentClass::TextBox => (120, 24),
            ComponentClass::CheckBox => (110, 22),
            ComponentClass::ComboBox => (130, 24),
            ComponentClass::ListBox => (130, 100),
            ComponentClass::Panel => (200, 150),
            ComponentClass::Frame => (200, 150),
            ComponentClass::TabControl => (260, 180),
            ComponentClass::ProgressBar => (150, 20),
            ComponentClass::MenuBar => (0, 24),
            ComponentClass::MenuItem => (0, 22),
            ComponentClass::Timer => (32, 32),
            ComponentClass::Custom(_) => (100, 100),
        }
    }

    /// Property descriptors introspected for this class.
    pub fn property_descriptors(&self) -> Vec<PropertyDescriptor> {
        let mut props = Vec::new();

        if self.kind().is_visual() {
            props.push(
                PropertyDescriptor::new("Enabled", ValueType::Bool).with_default(true),
            );
            props.push(
                PropertyDescriptor::new("Visible", ValueType::Bool).with_default(true),
            );
            props.push(
                PropertyDescriptor::new("BackColor", ValueType::Color)
                    .with_default(PropertyValue::Color("#f8fafc".to_string())),
            );
            props.push(
                PropertyDescriptor::new("ForeColor", ValueType::Color)
                    .with_default(PropertyValue::Color("#0f172a".to_string())),
            );
            props.push(
                PropertyDescriptor::new("Font", ValueType::Text)
                    .with_default("Segoe UI, 12px"),
            );
        }

        match self {
            ComponentClass::Form => {
                props.push(PropertyDescriptor::new("Text", ValueType::Text).with_default(""));
            }
            ComponentClass::Button => {
                props.push(PropertyDescriptor::new("Text", ValueType::Text).with_default(""));
                props.push(
                    PropertyDescriptor::new("Focused", ValueType::Bool)
                        .with_default(false)
                        .with_access(Access::NoWrite),
                );
            }
            ComponentClass::Label => {
                props.push(PropertyDescriptor::new("Text", ValueType::Text).with_default(""));
            }
            ComponentClass::TextBox => {
                props.push(PropertyDescriptor::new("Text", ValueType::Text).with_default(""));
                props.push(
                    PropertyDescriptor::new("ReadOnly", ValueType::Bool).with_default(false),
                );
                props.push(
                    PropertyDescriptor::new("Focused", ValueType::Bool)
                        .with_default(false)
                        .with_access(Access::NoWrite),
                );
                props.push(
                    PropertyDescriptor::new("SelectionStart", ValueType::Int)
                        .with_access(Access::DetachedRead),
                );
            }
            ComponentClass::CheckBox => {
                props.push(PropertyDescriptor::new("Text", ValueType::Text).with_default(""));
                props.push(
                    PropertyDescriptor::new("Checked", ValueType::Bool).with_default(false),
                );
            }
            ComponentClass::ComboBox => {
                props.push(
                    PropertyDescriptor::new("Items", ValueType::TextList)
                        .with_default(PropertyValue::StringArray(vec![])),
                );
                props.push(
                    PropertyDescriptor::new("SelectedIndex", ValueType::Int).with_default(-1),
                );
                props.push(
                    PropertyDescriptor::new("DropDownStyle", ValueType::Int)
                        .with_default(1)
                        .with_tags(vec![
                            ("Simple", PropertyValue::Integer(0)),
                            ("DropDown", PropertyValue::Integer(1)),
                            ("DropDownList", PropertyValue::Integer(2)),
                        ]),
                );
            }
            ComponentClass::ListBox => {
                props.push(
                    PropertyDescriptor::new("Items", ValueType::TextList)
                        .with_default(PropertyValue::StringArray(vec![])),
                );
                props.push(
                    PropertyDescriptor::new("SelectedIndex", ValueType::Int).with_default(-1),
                );
            }
            ComponentClass::Panel => {
                props.push(
                    PropertyDescriptor::new("BorderStyle", ValueType::Text)
                        .with_default("None")
                        .with_tags(vec![
                            ("None", PropertyValue::String("None".to_string())),
                            (
                                "FixedSingle",
                                PropertyValue::String("FixedSingle".to_string()),
                            ),
                            ("Fixed3D", PropertyValue::String("Fixed3D".to_string())),
                        ]),
                );
            }
            ComponentClass::Frame => {
                props.push(PropertyDescriptor::new("Text", ValueType::Text).with_default(""));
            }
            ComponentClass::TabControl => {
                props.push(
                    PropertyDescriptor::new("SelectedIndex", ValueType::Int).with_default(0),
                );
            }
            ComponentClass::ProgressBar => {
                props.push(PropertyDescriptor::new("Value", ValueType::Int).with_default(0));
                props.push(PropertyDescriptor::new("Minimum", ValueType::Int).with_default(0));
                props.push(
                    PropertyDescriptor::new("Maximum", ValueType::Int).with_default(100),
                );
            }
            ComponentClass::MenuBar => {}
            ComponentClass::MenuItem => {
                props.push(PropertyDescriptor::new("Text", ValueType::Text).with_default(""));
            }
            ComponentClass::Timer => {
                props.push(
                    PropertyDescriptor::new("Interval", ValueType::Int).with_default(1000),
                );
                props.push(
                    PropertyDescriptor::new("Enabled", ValueType::Bool).with_default(false),
                );
            }
            ComponentClass::Custom(_) => {
                props.push(PropertyDescriptor::new("Text", ValueType::Text).with_default(""));
            }
        }

        props
    }

    /// Events introspected for this class.
    pub fn event_types(&self) -> Vec<EventType> {
        match self {
            ComponentClass::Form => vec![
                EventType::Load,
                EventType::FormClosing,
                EventType::Resize,
            ],
            ComponentClass::Button | ComponentClass::MenuItem => {
                vec![EventType::Click, EventType::MouseDown, EventType::MouseUp]
            }
            ComponentClass::Label => vec![EventType::Click],
            ComponentClass::TextBox => vec![
                EventType::TextChanged,
                EventType::KeyDown,
                EventType::KeyUp,
                EventType::GotFocus,
                EventType::LostFocus,
            ],
            ComponentClass::CheckBox => vec![EventType::CheckedChanged, EventType::Click],
            ComponentClass::ComboBox | ComponentClass::ListBox => vec![
                EventType::SelectedIndexChanged,
                EventType::Click,
            ],
            ComponentClass::Panel | ComponentClass::Frame => {
                vec![EventType::Click, EventType::Resize]
            }
            ComponentClass::TabControl => vec![EventType::SelectedIndexChanged],
            ComponentClass::ProgressBar | ComponentClass::MenuBar => vec![],
            ComponentClass::Timer => vec![EventType::Tick],
            ComponentClass::Custom(_) => vec![EventType::Click],
        }
    }

    /// Builds the initial live-instance state from the descriptor defaults.
    pub fn default_instance(&self) -> PropertyBag {
        let mut bag = PropertyBag::new();
        for desc in self.property_descriptors() {
            if let Some(hint) = desc.default_hint {
                bag.set_raw(desc.name, hint);
            }
        }
        bag
    }
}
