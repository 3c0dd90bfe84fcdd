// SPDX-License-Identifier: MPL-2.0

//! Custom registration fields defined per event

use serde::{Deserialize, Serialize};

/// Input kind of a custom field, tagged by `type` on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Textarea,
    Select {
        #[serde(default)]
        options: Vec<String>,
    },
    Radio {
        #[serde(default)]
        options: Vec<String>,
    },
    Checkbox {
        #[serde(default)]
        options: Vec<String>,
    },
}

impl FieldKind {
    /// Declared options for choice kinds
    pub fn options(&self) -> Option<&[String]> {
        match self {
            FieldKind::Text | FieldKind::Textarea => None,
            FieldKind::Select { options }
            | FieldKind::Radio { options }
            | FieldKind::Checkbox { options } => Some(options),
        }
    }

    /// Whether answers are a list rather than a single string
    pub fn is_multi(&self) -> bool {
        matches!(self, FieldKind::Checkbox { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Textarea => "textarea",
            FieldKind::Select { .. } => "select",
            FieldKind::Radio { .. } => "radio",
            FieldKind::Checkbox { .. } => "checkbox",
        }
    }
}

/// One extra question on an event's registration form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomField {
    pub field_id: String,
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl CustomField {
    /// New field with an id derived from `label` and the current time
    pub fn new(label: impl Into<String>, kind: FieldKind, required: bool) -> Self {
        let label = label.into();
        let millis = chrono::Utc::now().timestamp_millis();
        Self {
            field_id: generate_field_id(&label, millis),
            label,
            required,
            placeholder: None,
            kind,
        }
    }

    /// Parse a command-line field definition `KIND[*]:LABEL[:OPTION,OPTION...]`
    ///
    /// A `*` after the kind marks the field required, e.g.
    /// `select*:Shirt size:S,M,L` or `textarea:Notes`.
    pub fn from_spec(spec: &str) -> Result<Self, String> {
        let mut parts = spec.splitn(3, ':');
        let kind_part = parts.next().unwrap_or_default().trim();
        let label = parts.next().map(str::trim).unwrap_or_default();
        let options: Vec<String> = parts
            .next()
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        if label.is_empty() {
            return Err(format!("'{}' has no label (KIND:LABEL[:OPTIONS])", spec));
        }
        let (kind_name, required) = match kind_part.strip_suffix('*') {
            Some(name) => (name, true),
            None => (kind_part, false),
        };

        let kind = match kind_name.to_ascii_lowercase().as_str() {
            "text" => FieldKind::Text,
            "textarea" => FieldKind::Textarea,
            "select" => FieldKind::Select { options },
            "radio" => FieldKind::Radio { options },
            "checkbox" => FieldKind::Checkbox { options },
            other => return Err(format!("unknown field type '{}'", other)),
        };
        if kind.options().is_some_and(<[String]>::is_empty) {
            return Err(format!("{} field '{}' needs options", kind.name(), label));
        }

        Ok(Self::new(label, kind, required))
    }
}

/// Field id: lowercase label reduced to `[a-z0-9]`, plus the last four
/// digits of `timestamp_millis`
pub fn generate_field_id(label: &str, timestamp_millis: i64) -> String {
    let stem: String = label
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect();
    format!("{}{:04}", stem, timestamp_millis.rem_euclid(10_000))
}
