//! Message attribute codec
//!
//! A signal travels as three string attributes on an otherwise fixed message:
//! ```text
//! signal_id   = <deployment token>
//! instance_id = <instance identifier>
//! status      = SUCCESS | FAILURE
//! ```
//!
//! Consumers should read the attributes, never the body.

use std::collections::BTreeMap;
use thiserror::Error;

use crate::{attributes, SignalMessage, Status, StatusParseError};

/// Errors that can occur while decoding attributes
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CodecError {
    #[error("Missing message attribute: {0}")]
    MissingAttribute(&'static str),

    #[error("Empty message attribute: {0}")]
    EmptyAttribute(&'static str),

    #[error("Invalid status attribute: {0}")]
    InvalidStatus(#[from] StatusParseError),
}

/// Encode a signal into its attribute map
pub fn encode_attributes(signal: &SignalMessage) -> BTreeMap<String, String> {
    let mut attrs = BTreeMap::new();
    attrs.insert(attributes::SIGNAL_ID.to_string(), signal.signal_id.clone());
    attrs.insert(
        attributes::INSTANCE_ID.to_string(),
        signal.instance_id.clone(),
    );
    attrs.insert(
        attributes::STATUS.to_string(),
        signal.status.as_str().to_string(),
    );
    attrs
}

/// Decode a signal from an attribute map
///
/// Attributes other than the three known ones are ignored.
pub fn decode_attributes(attrs: &BTreeMap<String, String>) -> Result<SignalMessage, CodecError> {
    let signal_id = required(attrs, attributes::SIGNAL_ID)?;
    let instance_id = required(attrs, attributes::INSTANCE_ID)?;
    let status: Status = attrs
        .get(attributes::STATUS)
        .ok_or(CodecError::MissingAttribute(attributes::STATUS))?
        .parse()?;

    Ok(SignalMessage {
        signal_id,
        instance_id,
        status,
    })
}

fn required(attrs: &BTreeMap<String, String>, name: &'static str) -> Result<String, CodecError> {
    match attrs.get(name) {
        None => Err(CodecError::MissingAttribute(name)),
        Some(value) if value.is_empty() => Err(CodecError::EmptyAttribute(name)),
        Some(value) => Ok(value.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_signal() -> SignalMessage {
        SignalMessage::new("deploy-42", "i-0123456789abcdef0", Status::Failure)
    }

    #[test]
    fn test_encode_exact_attributes() {
        let attrs = encode_attributes(&create_test_signal());

        assert_eq!(attrs.len(), 3);
        assert_eq!(attrs["signal_id"], "deploy-42");
        assert_eq!(attrs["instance_id"], "i-0123456789abcdef0");
        assert_eq!(attrs["status"], "FAILURE");
    }

    #[test]
    fn test_decode_ignores_extra_attributes() {
        let mut attrs = encode_attributes(&create_test_signal());
        attrs.insert("trace_id".into(), "abc".into());

        let decoded = decode_attributes(&attrs).expect("decode failed");
        assert_eq!(decoded, create_test_signal());
    }

    #[test]
    fn test_decode_missing_attribute() {
        let mut attrs = encode_attributes(&create_test_signal());
        attrs.remove("instance_id");

        let result = decode_attributes(&attrs);
        assert_eq!(result, Err(CodecError::MissingAttribute("instance_id")));
    }

    #[test]
    fn test_decode_empty_signal_id() {
        let mut attrs = encode_attributes(&create_test_signal());
        attrs.insert("signal_id".into(), String::new());

        let result = decode_attributes(&attrs);
        assert_eq!(result, Err(CodecError::EmptyAttribute("signal_id")));
    }

    #[test]
    fn test_decode_invalid_status() {
        let mut attrs = encode_attributes(&create_test_signal());
        attrs.insert("status".into(), "PENDING".into());

        let result = decode_attributes(&attrs);
        assert!(matches!(result, Err(CodecError::InvalidStatus(_))));
    }
}
