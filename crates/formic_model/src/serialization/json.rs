use crate::error::PersistError;
use crate::model::FormModel;

pub fn model_to_json(model: &FormModel) -> Result<String, PersistError> {
    Ok(serde_json::to_string_pretty(model)?)
}

pub fn model_from_json(json: &str) -> Result<FormModel, PersistError> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ComponentClass;
    use crate::value::Value;

    #[test]
    fn model_round_trips_through_json() {
        let mut model = FormModel::new("Form1");
        let root = model.root();
        let btn = model.add_component(root, ComponentClass::Button, -1).unwrap();
        model.set_property(btn, "Text", Value::literal("OK")).unwrap();

        let json = model_to_json(&model).unwrap();
        let restored = model_from_json(&json).unwrap();
        let restored_btn = restored.find_by_name("btn1").unwrap();
        assert_eq!(restored_btn.id(), btn);
        assert_eq!(
            restored.property_value(btn, "Text").unwrap(),
            Some(&Value::literal("OK"))
        );
    }
}
