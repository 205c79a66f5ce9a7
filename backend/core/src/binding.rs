//! Binding tree: UI affordances an app offers per location, and the forms
//! they open.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::call::Call;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    #[default]
    Text,
    StaticSelect,
    DynamicSelect,
    Bool,
    User,
    Channel,
    Markdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextSubtype {
    Input,
    Textarea,
    Email,
    Number,
    Password,
    Tel,
    Url,
}

/// One choice of a select field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub icon_data: String,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self { label: label.into(), value: value.into(), icon_data: String::new() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_required: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub readonly: bool,
    /// Present (default) value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hint: String,
    /// Autocomplete position; 0 means the field is passed as a flag.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub position: i32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub modal_label: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub refresh: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub multiselect: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookup: Option<Call>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<TextSubtype>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
}

fn is_zero(v: &i32) -> bool {
    *v == 0
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self { name: name.into(), field_type, ..Default::default() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Form {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub header: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub footer: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub icon: String,
    /// Fetched when the form definition is needed or must be refreshed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Call>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submit: Option<Call>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub submit_buttons: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
}

impl Form {
    /// Field names must be non-empty and unique within a form.
    pub fn validate(&self) -> Result<(), AppError> {
        let label = if self.title.is_empty() {
            self.submit.as_ref().map(|c| c.path.clone()).unwrap_or_default()
        } else {
            self.title.clone()
        };
        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.is_empty() {
                return Err(AppError::UnnamedField { form: label });
            }
            if !seen.insert(field.name.as_str()) {
                return Err(AppError::DuplicateField { form: label, field: field.name.clone() });
            }
        }
        Ok(())
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.name == name)
    }

    fn collect_calls<'a>(&'a self, out: &mut Vec<&'a Call>) {
        out.extend(self.source.iter());
        out.extend(self.submit.iter());
        for field in &self.fields {
            out.extend(field.lookup.iter());
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub app_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub location: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub icon: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hint: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submit: Option<Call>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<Form>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bindings: Vec<Binding>,
}

impl Binding {
    pub fn at(location: impl Into<String>, bindings: Vec<Binding>) -> Self {
        Self { location: location.into(), bindings, ..Default::default() }
    }

    /// Every call reachable from this node, depth first.
    pub fn calls(&self) -> Vec<&Call> {
        let mut out = Vec::new();
        self.collect_calls(&mut out);
        out
    }

    fn collect_calls<'a>(&'a self, out: &mut Vec<&'a Call>) {
        out.extend(self.submit.iter());
        if let Some(form) = &self.form {
            form.collect_calls(out);
        }
        for child in &self.bindings {
            child.collect_calls(out);
        }
    }

    pub fn validate_forms(&self) -> Result<(), AppError> {
        if let Some(form) = &self.form {
            form.validate()?;
        }
        self.bindings.iter().try_for_each(Binding::validate_forms)
    }
}

/// Sorted, de-duplicated set of call paths referenced anywhere in `bindings`.
pub fn collect_call_paths(bindings: &[Binding]) -> Vec<String> {
    let mut paths: Vec<String> = bindings
        .iter()
        .flat_map(|b| b.calls())
        .map(|c| c.path.clone())
        .collect();
    paths.sort();
    paths.dedup();
    paths
}
