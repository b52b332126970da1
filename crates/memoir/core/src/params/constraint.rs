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

//! Value constraints attached to parameter declarations.
//!
//! A constraint is checked when a configuration value is overlaid onto a
//! declaration, never at run time. `Any` defers entirely to the type
//! inferred from the declaration's default.

use super::value::{ParamValue, TypeTag};
use memoir_common::{NodePath, ParamError, ParamResult};

/// Constraint on the values a parameter accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// No explicit constraint; the default's type governs.
    Any,
    /// Value tag must be one of the listed tags (after numeric widening).
    OfType(Vec<TypeTag>),
    /// Numeric value within the inclusive range.
    Range { min: f64, max: f64 },
    /// Value must equal one of the alternatives.
    Choice(Vec<ParamValue>),
    /// First matching alternative wins.
    Union(Vec<Constraint>),
    /// List whose every element satisfies the inner constraint.
    ListOf(Box<Constraint>),
    /// Map whose every entry value satisfies the inner constraint.
    MapOf(Box<Constraint>),
}

impl Constraint {
    /// Constraint accepting a single type.
    pub fn of_type(tag: TypeTag) -> Self {
        Constraint::OfType(vec![tag])
    }

    /// Constraint accepting any of the given types.
    pub fn one_of_types(tags: impl IntoIterator<Item = TypeTag>) -> Self {
        Constraint::OfType(tags.into_iter().collect())
    }

    /// Numeric range constraint (inclusive on both ends).
    pub fn range(min: f64, max: f64) -> Self {
        Constraint::Range { min, max }
    }

    /// Enumerated-alternatives constraint.
    pub fn choice(values: impl IntoIterator<Item = ParamValue>) -> Self {
        Constraint::Choice(values.into_iter().collect())
    }

    /// Union of constraints, tried left to right.
    pub fn union(alternatives: impl IntoIterator<Item = Constraint>) -> Self {
        Constraint::Union(alternatives.into_iter().collect())
    }

    /// List-of constraint.
    pub fn list_of(element: Constraint) -> Self {
        Constraint::ListOf(Box::new(element))
    }

    /// Map-of constraint.
    pub fn map_of(element: Constraint) -> Self {
        Constraint::MapOf(Box::new(element))
    }

    /// Check `value` against this constraint.
    ///
    /// Returns the accepted value, widened where the constraint names a
    /// float type and the value is an integer.
    pub fn check(&self, value: ParamValue, path: &NodePath) -> ParamResult<ParamValue> {
        match self {
            Constraint::Any => Ok(value),
            Constraint::OfType(tags) => {
                if tags.contains(&value.tag()) {
                    return Ok(value);
                }
                if tags.contains(&TypeTag::Float) && value.tag() == TypeTag::Int {
                    return Ok(value.widen_toward(TypeTag::Float));
                }
                Err(ParamError::TypeMismatch {
                    path: path.clone(),
                    expected: describe_tags(tags),
                    got: format!("{} ({})", value.tag(), value),
                })
            }
            Constraint::Range { min, max } => match value.as_f64() {
                Some(x) if x >= *min && x <= *max => Ok(value),
                Some(x) => Err(ParamError::ConstraintViolation {
                    path: path.clone(),
                    reason: format!("value {} outside range [{}, {}]", x, min, max),
                }),
                None => Err(ParamError::TypeMismatch {
                    path: path.clone(),
                    expected: "a number".to_string(),
                    got: value.tag().to_string(),
                }),
            },
            Constraint::Choice(choices) => {
                if choices.contains(&value) {
                    return Ok(value);
                }
                // an int may stand in for a float alternative
                let widened = value.clone().widen_toward(TypeTag::Float);
                if widened != value && choices.contains(&widened) {
                    return Ok(widened);
                }
                Err(ParamError::ConstraintViolation {
                    path: path.clone(),
                    reason: format!("{} is not one of {}", value, describe_values(choices)),
                })
            }
            Constraint::Union(alternatives) => {
                for alternative in alternatives {
                    if let Ok(accepted) = alternative.check(value.clone(), path) {
                        return Ok(accepted);
                    }
                }
                Err(ParamError::ConstraintViolation {
                    path: path.clone(),
                    reason: format!("none of the alternatives accept {}", value),
                })
            }
            Constraint::ListOf(element) => match value {
                ParamValue::List(items) => {
                    let mut checked = Vec::with_capacity(items.len());
                    for (index, item) in items.into_iter().enumerate() {
                        checked.push(element.check(item, path).map_err(|err| {
                            ParamError::ConstraintViolation {
                                path: path.clone(),
                                reason: format!("element {}: {}", index, err),
                            }
                        })?);
                    }
                    Ok(ParamValue::List(checked))
                }
                other => Err(ParamError::TypeMismatch {
                    path: path.clone(),
                    expected: "a list".to_string(),
                    got: other.tag().to_string(),
                }),
            },
            Constraint::MapOf(element) => match value {
                ParamValue::Map(entries) => {
                    let mut checked = std::collections::BTreeMap::new();
                    for (key, item) in entries {
                        let accepted = element.check(item, path).map_err(|err| {
                            ParamError::ConstraintViolation {
                                path: path.clone(),
                                reason: format!("entry {:?}: {}", key, err),
                            }
                        })?;
                        checked.insert(key, accepted);
                    }
                    Ok(ParamValue::Map(checked))
                }
                other => Err(ParamError::TypeMismatch {
                    path: path.clone(),
                    expected: "a map".to_string(),
                    got: other.tag().to_string(),
                }),
            },
        }
    }
}

fn describe_tags(tags: &[TypeTag]) -> String {
    match tags {
        [] => "nothing".to_string(),
        [only] => only.to_string(),
        _ => {
            let names: Vec<String> = tags.iter().map(TypeTag::to_string).collect();
            format!("one of {}", names.join(", "))
        }
    }
}

fn describe_values(values: &[ParamValue]) -> String {
    let rendered: Vec<String> = values.iter().map(ParamValue::to_string).collect();
    format!("({})", rendered.join(", "))
}
