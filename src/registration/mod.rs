// SPDX-License-Identifier: MPL-2.0

//! Event registration forms
//!
//! Events can declare extra questions on top of the fixed name, email,
//! phone and address fields. This module models those questions and checks
//! a participant's answers before they are submitted.

mod fields;
mod form;

pub use fields::{CustomField, FieldKind, generate_field_id};
pub use form::{FieldValue, RegistrationForm, ValidationErrors};
