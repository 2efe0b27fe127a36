pub mod binding;
pub mod class;
pub mod codegen;
pub mod component;
pub mod constraints;
pub mod error;
pub mod events;
pub mod model;
pub mod properties;
pub mod serialization;
pub mod value;

pub use binding::{BindingProperty, MetaBinding, UpdateStrategy};
pub use class::{Access, ComponentClass, ComponentKind, PropertyDescriptor};
pub use component::{Bounds, MetaComponent, AUX_CREATION_CODE, AUX_LAYER};
pub use constraints::Constraints;
pub use error::{ModelError, PersistError};
pub use events::{is_valid_identifier, EventProperty, EventType};
pub use model::{DetachInfo, FormModel, FormModelEvent};
pub use properties::{FormProperty, PropertyBag};
pub use value::{Connection, DesignValue, IgnoreReason, PropertyValue, RealValue, Value, ValueType};
