pub mod json;
pub mod xml;

pub use json::{model_from_json, model_to_json};
pub use xml::{read_from_xml, store_to_xml};
