// SPDX-License-Identifier: MPL-2.0

//! Registration form answers and their validation

use super::fields::{CustomField, FieldKind};
use crate::api::types::NewCustomer;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

static EMAIL_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").ok());

/// Answer to one custom field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Many(Vec<String>),
}

impl FieldValue {
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Many(items) => items.is_empty(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Many(items) => write!(f, "{}", items.join(", ")),
        }
    }
}

/// Per-field validation messages, keyed by field id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: BTreeMap<String, String>,
}

impl ValidationErrors {
    fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// A participant's answers for one event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    pub nama: String,
    pub email: String,
    pub no_hp: String,
    pub alamat: String,
    pub answers: BTreeMap<String, FieldValue>,
}

impl RegistrationForm {
    /// Check the fixed fields and the event's custom fields
    pub fn validate(&self, fields: &[CustomField]) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        for (id, label, value) in [
            ("nama", "Name", &self.nama),
            ("email", "Email", &self.email),
            ("noHp", "Phone number", &self.no_hp),
            ("alamat", "Address", &self.alamat),
        ] {
            if value.trim().is_empty() {
                errors.add(id, format!("{} is required", label));
            }
        }

        if !self.email.trim().is_empty() && !is_valid_email(self.email.trim()) {
            errors.add("email", "Invalid email format");
        }

        for field in fields {
            if let Some(message) = check_field(field, self.answers.get(&field.field_id)) {
                errors.add(&field.field_id, message);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate and build the request body for `POST /customers`
    pub fn into_new_customer(
        self,
        event_id: &str,
        fields: &[CustomField],
    ) -> Result<NewCustomer, ValidationErrors> {
        self.validate(fields)?;

        // Unknown and empty answers are not sent
        let registration_data = self
            .answers
            .into_iter()
            .filter(|(id, value)| !value.is_empty() && fields.iter().any(|f| &f.field_id == id))
            .collect();

        Ok(NewCustomer {
            event: event_id.to_string(),
            nama: self.nama.trim().to_string(),
            email: self.email.trim().to_string(),
            no_hp: self.no_hp.trim().to_string(),
            alamat: self.alamat.trim().to_string(),
            registration_data,
        })
    }
}

fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(email))
}

fn check_field(field: &CustomField, value: Option<&FieldValue>) -> Option<String> {
    let value = match value {
        Some(value) if !value.is_empty() => value,
        _ if field.required => return Some(format!("{} is required", field.label)),
        _ => return None,
    };

    match (&field.kind, value) {
        (FieldKind::Text | FieldKind::Textarea, FieldValue::Text(_)) => None,
        (FieldKind::Select { options } | FieldKind::Radio { options }, FieldValue::Text(choice)) => {
            if options.iter().any(|o| o == choice) {
                None
            } else {
                Some(format!("'{}' is not an option for {}", choice, field.label))
            }
        }
        (FieldKind::Checkbox { options }, FieldValue::Many(choices)) => choices
            .iter()
            .find(|choice| !options.contains(choice))
            .map(|choice| format!("'{}' is not an option for {}", choice, field.label)),
        (FieldKind::Checkbox { .. }, FieldValue::Text(_)) => {
            Some(format!("{} expects a list of options", field.label))
        }
        (kind, FieldValue::Many(_)) => Some(format!(
            "{} is a {} field and takes a single value",
            field.label,
            kind.name()
        )),
    }
}
