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

//! Parameter declarations.
//!
//! A [`ParamSchema`] is one level of named declarations plus nested child
//! schemas, in declaration order. Defaults are validated against their own
//! constraints when the schema is built, so a malformed declaration fails
//! long before any configuration is overlaid.

use super::constraint::Constraint;
use super::value::ParamValue;
use memoir_common::{NodePath, ParamError, ParamResult};

/// A single parameter declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    name: String,
    default: Option<ParamValue>,
    constraint: Constraint,
    required: bool,
}

impl ParamSpec {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default(&self) -> Option<&ParamValue> {
        self.default.as_ref()
    }

    pub fn constraint(&self) -> &Constraint {
        &self.constraint
    }

    /// Must be supplied by the configuration overlay.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// May be absent from the resolved tree altogether.
    pub fn is_optional(&self) -> bool {
        !self.required && self.default.is_none()
    }

    /// Check a configured value against this declaration.
    ///
    /// The value is first widened toward the default's type (an int
    /// configured for a float parameter becomes that float), then checked
    /// against the constraint. With no explicit constraint the default's
    /// type governs.
    pub fn check_value(&self, value: ParamValue, path: &NodePath) -> ParamResult<ParamValue> {
        let value = match self.default.as_ref() {
            Some(default) => value.widen_toward(default.tag()),
            None => value,
        };
        match (&self.constraint, self.default.as_ref()) {
            (Constraint::Any, Some(default)) => Constraint::of_type(default.tag()).check(value, path),
            (constraint, _) => constraint.check(value, path),
        }
    }
}

/// Ordered declarations for one node of a parameter tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSchema {
    label: String,
    params: Vec<ParamSpec>,
    children: Vec<(String, ParamSchema)>,
}

impl ParamSchema {
    /// Start building a schema; `label` is the type name of the node and
    /// participates in the parameter digest.
    pub fn builder(label: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            label: label.into(),
            params: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Leaf declarations in declaration order.
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Nested schemas in declaration order.
    pub fn children(&self) -> &[(String, ParamSchema)] {
        &self.children
    }

    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|spec| spec.name == name)
    }

    pub fn child(&self, name: &str) -> Option<&ParamSchema> {
        self.children.iter().find(|(child, _)| child == name).map(|(_, schema)| schema)
    }

    /// Whether `name` is declared at this level, as a leaf or a child.
    pub fn declares(&self, name: &str) -> bool {
        self.param(name).is_some() || self.child(name).is_some()
    }
}

/// Builder for [`ParamSchema`].
pub struct SchemaBuilder {
    label: String,
    params: Vec<ParamSpec>,
    children: Vec<(String, ParamSchema)>,
}

impl SchemaBuilder {
    /// Declare a parameter whose type is inferred from its default.
    pub fn param(self, name: impl Into<String>, default: impl Into<ParamValue>) -> Self {
        self.param_with(name, default, Constraint::Any)
    }

    /// Declare a parameter with a default and an explicit constraint.
    pub fn param_with(mut self, name: impl Into<String>, default: impl Into<ParamValue>, constraint: Constraint) -> Self {
        self.params.push(ParamSpec {
            name: name.into(),
            default: Some(default.into()),
            constraint,
            required: false,
        });
        self
    }

    /// Declare a parameter with no default that the configuration must set.
    pub fn required(mut self, name: impl Into<String>, constraint: Constraint) -> Self {
        self.params.push(ParamSpec {
            name: name.into(),
            default: None,
            constraint,
            required: true,
        });
        self
    }

    /// Declare a parameter with no default that may be left unset.
    pub fn optional(mut self, name: impl Into<String>, constraint: Constraint) -> Self {
        self.params.push(ParamSpec {
            name: name.into(),
            default: None,
            constraint,
            required: false,
        });
        self
    }

    /// Declare a nested parametric node.
    pub fn child(mut self, name: impl Into<String>, schema: ParamSchema) -> Self {
        self.children.push((name.into(), schema));
        self
    }

    /// Validate the declarations and produce the schema.
    pub fn build(self) -> ParamResult<ParamSchema> {
        let mut seen = std::collections::BTreeSet::new();
        for spec in &self.params {
            if spec.name.contains('.') {
                return Err(ParamError::InvalidSchema(format!("parameter name {:?} contains a dot", spec.name)));
            }
            if !seen.insert(spec.name.clone()) {
                return Err(ParamError::InvalidSchema(format!("duplicate declaration {:?} in {}", spec.name, self.label)));
            }
            if let Some(default) = &spec.default {
                default.ensure_finite()?;
                let path = NodePath::parse(&spec.name);
                spec.check_value(default.clone(), &path).map_err(|err| {
                    ParamError::InvalidSchema(format!("default for {:?} violates its own constraint: {}", spec.name, err))
                })?;
            }
        }
        for (name, _) in &self.children {
            if name.contains('.') {
                return Err(ParamError::InvalidSchema(format!("child name {:?} contains a dot", name)));
            }
            if !seen.insert(name.clone()) {
                return Err(ParamError::InvalidSchema(format!("duplicate declaration {:?} in {}", name, self.label)));
            }
        }
        Ok(ParamSchema {
            label: self.label,
            params: self.params,
            children: self.children,
        })
    }
}
