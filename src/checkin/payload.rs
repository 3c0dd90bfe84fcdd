// SPDX-License-Identifier: GPL-3.0-only

//! Ticket payload parsing
//!
//! A ticket QR code carries a JSON object with at least a `customerId`
//! string. Any other fields are ignored.

use crate::errors::ScanError;
use serde_json::Value;

/// Identity extracted from a scanned ticket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTicket {
    pub customer_id: String,
}

impl DecodedTicket {
    /// Parse decoded barcode text
    ///
    /// Fails with `MalformedPayload` when the text is not a JSON object or
    /// lacks a non-empty string `customerId`.
    pub fn parse(text: &str) -> Result<Self, ScanError> {
        let value: Value = serde_json::from_str(text.trim())
            .map_err(|e| ScanError::MalformedPayload(e.to_string()))?;
        let object = value.as_object().ok_or_else(|| {
            ScanError::MalformedPayload("expected a JSON object".to_string())
        })?;

        match object.get("customerId") {
            Some(Value::String(id)) if !id.trim().is_empty() => Ok(Self {
                customer_id: id.trim().to_string(),
            }),
            Some(Value::Null) | None => Err(ScanError::MalformedPayload(
                "missing customerId".to_string(),
            )),
            Some(Value::String(_)) => Err(ScanError::MalformedPayload(
                "empty customerId".to_string(),
            )),
            Some(_) => Err(ScanError::MalformedPayload(
                "customerId is not a string".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_ticket() {
        let ticket = DecodedTicket::parse(r#"{"customerId":"abc123","event":"e1"}"#).unwrap();
        assert_eq!(ticket.customer_id, "abc123");
    }

    #[test]
    fn test_surrounding_whitespace_is_tolerated() {
        let ticket = DecodedTicket::parse("  {\"customerId\": \" abc \"}\n").unwrap();
        assert_eq!(ticket.customer_id, "abc");
    }

    #[test]
    fn test_plain_text_is_malformed() {
        assert!(matches!(
            DecodedTicket::parse("https://example.com/ticket/abc"),
            Err(ScanError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_missing_or_empty_id_is_malformed() {
        for text in [
            r#"{"name":"Budi"}"#,
            r#"{"customerId":null}"#,
            r#"{"customerId":""}"#,
            r#"{"customerId":42}"#,
            r#"["abc123"]"#,
        ] {
            assert!(
                matches!(DecodedTicket::parse(text), Err(ScanError::MalformedPayload(_))),
                "{} should be rejected",
                text
            );
        }
    }

    #[test]
    fn test_error_message_mentions_field() {
        let err = DecodedTicket::parse(r#"{"id":"x"}"#).unwrap_err();
        assert_eq!(err.to_string(), "Invalid barcode format: missing customerId");
    }
}
