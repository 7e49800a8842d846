//! Subcommand bodies. Each takes already-loaded state and returns what
//! the binary prints.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use cmm_registry::{ModelRegistry, Operation, OperationOutcome, Paging};
use serde::Deserialize;

/// A script file holds one operation or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum Script {
    Many(Vec<Operation>),
    One(Operation),
}

/// Parses an operation script.
///
/// # Errors
///
/// Returns an error if `text` is neither an operation nor a list of them.
pub fn parse_script(text: &str) -> Result<Vec<Operation>> {
    let script: Script = serde_json::from_str(text).context("Invalid operation script")?;
    Ok(match script {
        Script::Many(ops) => ops,
        Script::One(op) => vec![op],
    })
}

/// Applies each script in turn.
///
/// # Errors
///
/// Returns an error naming the script and operation that failed. Scripts
/// and operations before it stay applied.
pub fn apply(registry: &ModelRegistry, scripts: &[impl AsRef<Path>]) -> Result<Vec<OperationOutcome>> {
    let mut outcomes = Vec::new();
    for script in scripts {
        let path = script.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let ops = parse_script(&text).with_context(|| format!("In {}", path.display()))?;
        tracing::info!(script = %path.display(), operations = ops.len(), "applying script");
        outcomes.extend(
            registry
                .apply_all(ops)
                .with_context(|| format!("In {}", path.display()))?,
        );
    }
    Ok(outcomes)
}

/// One line per outcome.
pub fn describe(outcome: &OperationOutcome) -> String {
    match outcome {
        OperationOutcome::Model(model) => format!(
            "model {} ({}:{}) {}",
            model.name, model.namespace_prefix, model.namespace_uri, model.status
        ),
        OperationOutcome::Class(class) => format!(
            "{} {} ({} properties)",
            class.kind,
            class.prefixed_name,
            class.properties.len()
        ),
        OperationOutcome::Constraint(constraint) => format!(
            "constraint {} {} ({} parameters)",
            constraint.prefixed_name,
            constraint.constraint_type,
            constraint.parameters.len()
        ),
        OperationOutcome::Deleted { name } => format!("deleted {name}"),
    }
}

/// Text listing of one model, or all of them with the registry counts.
///
/// # Errors
///
/// Returns an error if `model` is given and unknown.
pub fn show(registry: &ModelRegistry, model: Option<&str>) -> Result<String> {
    let mut out = String::new();
    let models = match model {
        Some(name) => vec![registry.get_model(name)?],
        None => registry.list_models(Paging::new(0, usize::MAX)).items,
    };
    for model in &models {
        let _ = writeln!(
            out,
            "{} [{}] {} <{}>",
            model.name, model.status, model.namespace_prefix, model.namespace_uri
        );
        for class in registry.list_classes(&model.name, None)? {
            let parent = class.parent_name.as_deref().unwrap_or("-");
            let _ = writeln!(out, "  {} {} : {}", class.kind, class.prefixed_name, parent);
            for prop in &class.properties {
                let _ = write!(
                    out,
                    "    {} {}{}",
                    prop.name,
                    prop.data_type,
                    if prop.mandatory { " (mandatory)" } else { "" }
                );
                let names: Vec<&str> = prop.constraint_names().collect();
                if !names.is_empty() {
                    let _ = write!(out, " [{}]", names.join(", "));
                }
                out.push('\n');
            }
        }
        for constraint in registry.list_constraints(&model.name)? {
            let _ = writeln!(
                out,
                "  constraint {} {}",
                constraint.prefixed_name, constraint.constraint_type
            );
        }
        let dependencies = registry.dependencies(&model.name)?;
        if !dependencies.is_empty() {
            let _ = writeln!(out, "  depends on: {}", dependencies.join(", "));
        }
    }
    if model.is_none() {
        let info = registry.info();
        let _ = writeln!(
            out,
            "{} models, {} active ({} types, {} aspects)",
            models.len(),
            info.active_models,
            info.active_types,
            info.active_aspects
        );
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmm_registry::{ConstraintParameter, ConstraintType, NewConstraint, NewProperty};
    use cmm_test_helpers::hr_fixture;

    #[test]
    fn script_may_be_single_or_list() {
        let one = r#"{"op": "delete_model", "model": "m"}"#;
        let many = r#"[{"op": "delete_model", "model": "a"}, {"op": "delete_model", "model": "b"}]"#;
        assert_eq!(parse_script(one).unwrap().len(), 1);
        assert_eq!(parse_script(many).unwrap().len(), 2);
        assert!(parse_script(r#"{"op": "explode"}"#).is_err());
    }

    #[test]
    fn show_lists_classes_and_dependencies() {
        let registry = hr_fixture();
        registry.activate_model("base").unwrap();
        let text = show(&registry, None).unwrap();
        assert!(text.contains("base [active] base <"));
        assert!(text.contains("  type hr:contract : base:document"));
        assert!(text.contains("    ref d:text"));
        assert!(text.contains("  depends on: base"));
        assert!(text.ends_with("2 models, 1 active (1 types, 1 aspects)\n"));

        let one = show(&registry, Some("hr")).unwrap();
        assert!(!one.contains("base [active]"));
        assert!(show(&registry, Some("nope")).is_err());
    }

    #[test]
    fn show_lists_constraints() {
        let registry = hr_fixture();
        registry
            .create_constraint(
                "hr",
                NewConstraint::new("code", ConstraintType::Regex)
                    .parameter(ConstraintParameter::simple("expression", "[A-Z]{3}")),
            )
            .unwrap();
        registry
            .add_property(
                "hr",
                "contract",
                NewProperty::new("code").constraint_ref("hr:code"),
            )
            .unwrap();
        let text = show(&registry, Some("hr")).unwrap();
        assert!(text.contains("  constraint hr:code REGEX"), "{text}");
        assert!(text.contains("    code d:text [code]"), "{text}");
    }
}
