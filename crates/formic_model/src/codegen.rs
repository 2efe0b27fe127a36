//! Renders a form model as VB.NET-style designer initialization code.
//!
//! Child order in the model is authoritative: components are declared and
//! added in exactly the order they appear in their parent's child list.

use uuid::Uuid;

use crate::component::MetaComponent;
use crate::model::FormModel;

/// Generates the `InitializeComponent` body for the whole form.
pub fn generate_initializer(model: &FormModel) -> String {
    let mut code = String::new();
    let order = creation_order(model);

    code.push_str("    Private Sub InitializeComponent()\n");

    // Field creation, in creation order.
    for &id in &order {
        if let Ok(comp) = model.component(id) {
            if id == model.root() {
                continue;
            }
            code.push_str(&format!(
                "        Me.{} = {}\n",
                comp.name(),
                comp.creation_code()
            ));
        }
    }
    code.push_str("        Me.SuspendLayout()\n");

    for &id in &order {
        if let Ok(comp) = model.component(id) {
            emit_component(&mut code, model, comp);
        }
    }

    // Containment, children first so nested containers are filled before
    // being added themselves.
    for &id in order.iter().rev() {
        let Ok(comp) = model.component(id) else {
            continue;
        };
        for &child in comp.sub_components() {
            if let Ok(child_comp) = model.component(child) {
                if id == model.root() {
                    code.push_str(&format!(
                        "        Me.Controls.Add(Me.{})\n",
                        child_comp.name()
                    ));
                } else {
                    code.push_str(&format!(
                        "        Me.{}.Controls.Add(Me.{})\n",
                        comp.name(),
                        child_comp.name()
                    ));
                }
            }
        }
        if let Some(menu) = comp.menu() {
            if let Ok(menu_comp) = model.component(menu) {
                code.push_str(&format!(
                    "        Me.MainMenuStrip = Me.{}\n",
                    menu_comp.name()
                ));
                code.push_str(&format!(
                    "        Me.Controls.Add(Me.{})\n",
                    menu_comp.name()
                ));
            }
        }
    }

    code.push_str("        Me.ResumeLayout(False)\n");
    code.push_str("    End Sub\n");
    code
}

/// Generates `AddHandler` wiring plus empty handler stubs for every bound
/// event of the form.
pub fn generate_event_handlers(model: &FormModel) -> String {
    let mut code = String::new();
    for &id in &creation_order(model) {
        let Ok(comp) = model.component(id) else {
            continue;
        };
        for event in comp.events() {
            if let Some(handler) = event.handler() {
                code.push_str(&format!(
                    "    Private Sub {}({}) Handles {}.{}\n\n    End Sub\n\n",
                    handler,
                    event.event().parameters(),
                    comp.name(),
                    event.event().as_str()
                ));
            }
        }
    }
    code
}

fn emit_component(code: &mut String, model: &FormModel, comp: &MetaComponent) {
    let target = if comp.id() == model.root() {
        "Me".to_string()
    } else {
        format!("Me.{}", comp.name())
    };

    code.push_str("        '\n");
    code.push_str(&format!("        '{}\n", comp.name()));
    code.push_str("        '\n");

    if comp.kind().is_visual() && comp.id() != model.root() {
        code.push_str(&format!(
            "        {}.Location = New System.Drawing.Point({}, {})\n",
            target, comp.bounds.x, comp.bounds.y
        ));
        code.push_str(&format!(
            "        {}.Size = New System.Drawing.Size({}, {})\n",
            target, comp.bounds.width, comp.bounds.height
        ));
    }

    // Only changed properties generate assignments.
    for prop in comp.properties() {
        let Some(init) = prop.initialization_code() else {
            continue;
        };
        if let Some(pre) = prop.pre_code() {
            code.push_str(&format!("        {pre}\n"));
        }
        code.push_str(&format!("        {}.{} = {}\n", target, prop.name(), init));
        if let Some(post) = prop.post_code() {
            code.push_str(&format!("        {post}\n"));
        }
    }

    if comp.id() != model.root() {
        code.push_str(&format!("        {}.Name = \"{}\"\n", target, comp.name()));
    }
}

/// Root-first traversal following the ordered child lists, menu slot last
/// per container.
fn creation_order(model: &FormModel) -> Vec<Uuid> {
    let mut order = vec![model.root()];
    let mut i = 0;
    while i < order.len() {
        if let Ok(comp) = model.component(order[i]) {
            order.extend(comp.sub_components().iter().copied());
            if let Some(menu) = comp.menu() {
                order.push(menu);
            }
        }
        i += 1;
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ComponentClass;
    use crate::value::Value;

    #[test]
    fn changed_properties_generate_in_child_order() {
        let mut model = FormModel::new("Form1");
        let root = model.root();
        let a = model.add_component(root, ComponentClass::Button, -1).unwrap();
        let b = model.add_component(root, ComponentClass::Button, -1).unwrap();
        model.set_property(a, "Text", Value::literal("First")).unwrap();
        model.set_property(b, "Text", Value::literal("Second")).unwrap();

        let code = generate_initializer(&model);
        let first = code.find("\"First\"").unwrap();
        let second = code.find("\"Second\"").unwrap();
        assert!(first < second);

        // Unchanged properties generate nothing.
        assert!(!code.contains("Enabled"));
    }

    #[test]
    fn pre_and_post_code_wrap_the_assignment() {
        let mut model = FormModel::new("Form1");
        let root = model.root();
        let a = model.add_component(root, ComponentClass::Button, -1).unwrap();
        model.set_property(a, "Text", Value::literal("Go")).unwrap();
        {
            let comp = model.component_mut(a).unwrap();
            let prop = comp.property_mut("Text").unwrap();
            prop.set_pre_code(Some("' before".to_string()));
            prop.set_post_code(Some("' after".to_string()));
        }
        let code = generate_initializer(&model);
        let pre = code.find("' before").unwrap();
        let assign = code.find(".Text = \"Go\"").unwrap();
        let post = code.find("' after").unwrap();
        assert!(pre < assign && assign < post);
    }

    #[test]
    fn event_wiring_uses_handler_names() {
        let mut model = FormModel::new("Form1");
        let root = model.root();
        let a = model.add_component(root, ComponentClass::Button, -1).unwrap();
        model
            .set_event_handler(a, crate::events::EventType::Click, Some("btn1_Click".into()))
            .unwrap();
        let code = generate_event_handlers(&model);
        assert!(code.contains("Private Sub btn1_Click"));
        assert!(code.contains("Handles btn1.Click"));
    }
}
