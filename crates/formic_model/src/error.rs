use uuid::Uuid;

use crate::value::ValueType;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("unknown component: {0}")]
    UnknownComponent(Uuid),
    #[error("component {component} has no property '{name}'")]
    UnknownProperty { component: String, name: String },
    #[error("duplicate component name: {0}")]
    DuplicateName(String),
    #[error("'{0}' is not a valid identifier")]
    InvalidIdentifier(String),
    #[error("property '{property}' expects {expected:?}, got {actual:?}")]
    TypeMismatch {
        property: String,
        expected: ValueType,
        actual: ValueType,
    },
    #[error("component {0} is read-only")]
    ReadOnly(String),
    #[error("component {0} is not a container")]
    NotAContainer(String),
    #[error("component {0} is no longer in the model")]
    NotInModel(Uuid),
    #[error("the form root cannot be removed")]
    CannotRemoveRoot,
    #[error("invalid permutation: {0}")]
    InvalidPermutation(String),
    #[error("component {component} does not handle event '{event}'")]
    UnknownEvent { component: String, event: String },
}

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("XML attribute error: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed fragment: {0}")]
    Malformed(String),
}
