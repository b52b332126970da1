// Memoir
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Configuration overlay.
//!
//! [`resolve`] lays a nested JSON mapping over a schema's defaults and
//! produces the fully resolved [`ParamTree`]. Every failure mode
//! (unknown key, type mismatch, constraint violation, missing required
//! value) surfaces here, before anything executes.

use super::schema::ParamSchema;
use super::tree::{ParamNode, ParamTree};
use super::value::ParamValue;
use memoir_common::{NodePath, ParamError, ParamResult};
use serde_json::Value;

/// Resolve `schema` against a nested configuration mapping.
///
/// `config` must be a JSON object or `null` (no overrides). Keys route to
/// declarations by name; a key naming a nested child must carry an object,
/// which is overlaid recursively.
pub fn resolve(schema: &ParamSchema, config: &Value) -> ParamResult<ParamTree> {
    resolve_node(schema, config, NodePath::root())
}

/// Resolve a schema purely from its defaults.
pub fn defaults(schema: &ParamSchema) -> ParamResult<ParamTree> {
    resolve(schema, &Value::Null)
}

fn resolve_node(schema: &ParamSchema, config: &Value, path: NodePath) -> ParamResult<ParamTree> {
    let overrides = match config {
        Value::Null => None,
        Value::Object(obj) => Some(obj),
        other => {
            return Err(ParamError::TypeMismatch {
                path,
                expected: "a configuration mapping".to_string(),
                got: json_kind(other).to_string(),
            });
        }
    };

    if let Some(obj) = overrides {
        for key in obj.keys() {
            if !schema.declares(key) {
                return Err(ParamError::UnknownKey(path.child(key)));
            }
        }
    }

    let mut entries = Vec::with_capacity(schema.params().len() + schema.children().len());

    for spec in schema.params() {
        let leaf_path = path.child(spec.name());
        let supplied = overrides.and_then(|obj| obj.get(spec.name()));
        match supplied {
            Some(raw) => {
                let value = ParamValue::from_json(raw, &leaf_path)?;
                let accepted = spec.check_value(value, &leaf_path)?;
                entries.push((spec.name().to_string(), ParamNode::Leaf(accepted)));
            }
            None => match spec.default() {
                Some(default) => {
                    entries.push((spec.name().to_string(), ParamNode::Leaf(default.clone())));
                }
                None if spec.is_required() => {
                    return Err(ParamError::MissingRequired(leaf_path));
                }
                None => {} // optional and unset: absent from the tree
            },
        }
    }

    for (name, child_schema) in schema.children() {
        let child_path = path.child(name);
        let child_config = match overrides.and_then(|obj| obj.get(name)) {
            None => Value::Null,
            Some(value @ Value::Object(_)) => value.clone(),
            Some(other) => {
                return Err(ParamError::TypeMismatch {
                    path: child_path,
                    expected: "a nested configuration mapping".to_string(),
                    got: json_kind(other).to_string(),
                });
            }
        };
        let child_tree = resolve_node(child_schema, &child_config, child_path)?;
        entries.push((name.clone(), ParamNode::Nested(child_tree)));
    }

    Ok(ParamTree::new(schema.label(), path, entries))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::constraint::Constraint;
    use crate::params::value::TypeTag;
    use serde_json::json;

    fn sim_schema() -> ParamSchema {
        let output = ParamSchema::builder("Output")
            .param("precision", 6)
            .param("fmt", "csv")
            .build()
            .unwrap();
        ParamSchema::builder("Sim")
            .param("steps", 100)
            .param("dt", 0.01)
            .param_with("method", "euler", Constraint::choice([ParamValue::from("euler"), ParamValue::from("rk4")]))
            .child("output", output)
            .build()
            .unwrap()
    }

    #[test]
    fn test_defaults_only() {
        let tree = defaults(&sim_schema()).unwrap();
        assert_eq!(tree.get_i64("steps"), Some(100));
        assert_eq!(tree.get_f64("dt"), Some(0.01));
        assert_eq!(tree.child("output").unwrap().get_i64("precision"), Some(6));
    }

    #[test]
    fn test_overlay_routes_nested_keys() {
        let config = json!({"steps": 500, "output": {"precision": 12}});
        let tree = resolve(&sim_schema(), &config).unwrap();
        assert_eq!(tree.get_i64("steps"), Some(500));
        // untouched values keep their defaults
        assert_eq!(tree.get_f64("dt"), Some(0.01));
        let output = tree.child("output").unwrap();
        assert_eq!(output.get_i64("precision"), Some(12));
        assert_eq!(output.get_str("fmt"), Some("csv"));
    }

    #[test]
    fn test_unknown_key_fails() {
        let err = resolve(&sim_schema(), &json!({"stepz": 1})).unwrap_err();
        assert!(matches!(err, ParamError::UnknownKey(ref path) if path.to_string() == "stepz"));
        let err = resolve(&sim_schema(), &json!({"output": {"depth": 1}})).unwrap_err();
        assert!(matches!(err, ParamError::UnknownKey(ref path) if path.to_string() == "output.depth"));
    }

    #[test]
    fn test_type_mismatch_fails() {
        let err = resolve(&sim_schema(), &json!({"steps": "many"})).unwrap_err();
        assert!(matches!(err, ParamError::TypeMismatch { .. }));
        // int for a float default is widened, not rejected
        let tree = resolve(&sim_schema(), &json!({"dt": 1})).unwrap();
        assert_eq!(tree.get("dt"), Some(&ParamValue::Float(1.0)));
    }

    #[test]
    fn test_scalar_for_nested_node_fails() {
        let err = resolve(&sim_schema(), &json!({"output": 3})).unwrap_err();
        assert!(matches!(err, ParamError::TypeMismatch { .. }));
    }

    #[test]
    fn test_mapping_for_leaf_fails() {
        let err = resolve(&sim_schema(), &json!({"steps": {"n": 1}})).unwrap_err();
        assert!(matches!(err, ParamError::TypeMismatch { .. }));
    }

    #[test]
    fn test_constraint_violation_fails() {
        let err = resolve(&sim_schema(), &json!({"method": "verlet"})).unwrap_err();
        assert!(matches!(err, ParamError::ConstraintViolation { .. }));
    }

    #[test]
    fn test_required_and_optional() {
        let schema = ParamSchema::builder("Fit")
            .required("seed", Constraint::of_type(TypeTag::Int))
            .optional("note", Constraint::of_type(TypeTag::Str))
            .build()
            .unwrap();
        let err = resolve(&schema, &json!({})).unwrap_err();
        assert!(matches!(err, ParamError::MissingRequired(_)));

        let tree = resolve(&schema, &json!({"seed": 7})).unwrap();
        assert_eq!(tree.get_i64("seed"), Some(7));
        assert!(tree.get("note").is_none());

        let tree = resolve(&schema, &json!({"seed": 7, "note": "trial"})).unwrap();
        assert_eq!(tree.get_str("note"), Some("trial"));
    }

    #[test]
    fn test_map_valued_leaf_accepts_object() {
        let schema = ParamSchema::builder("Plot")
            .param("style", ParamValue::Map(std::collections::BTreeMap::new()))
            .build()
            .unwrap();
        let tree = resolve(&schema, &json!({"style": {"lw": 2}})).unwrap();
        assert_eq!(tree.get("style").unwrap().tag(), TypeTag::Map);
    }

    #[test]
    fn test_file_ref_leaf() {
        let schema = ParamSchema::builder("Load")
            .optional("input", Constraint::of_type(TypeTag::File))
            .build()
            .unwrap();
        let tree = resolve(&schema, &json!({"input": {"$file": "data.csv"}})).unwrap();
        assert_eq!(tree.get("input").unwrap().tag(), TypeTag::File);
    }
}
