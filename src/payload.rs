use crate::response::{ErrorResponse, malformed_json};
use serde::de::DeserializeOwned;

/// A structure that maps an HTTP request payload and defines how its
/// contents get validated.
pub trait Payload: DeserializeOwned {
    /// Ensures that the payload and its values are structured properly.
    fn validate(&self) -> Result<(), ErrorResponse>;
}

/// Deserializes a JSON request body into a [`Payload`] and validates it.
///
/// # Errors
///
/// A body that fails to parse yields the standard malformed-JSON error
/// response; a parsed payload that fails its own validation propagates the
/// validation error response.
pub fn parse<T>(body: &[u8]) -> Result<T, ErrorResponse>
where
    T: Payload,
{
    let payload: T = serde_json::from_slice(body).map_err(malformed_json)?;
    payload.validate()?;
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::bad_request;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct CreateProduct {
        name: String,
        quantity: i64,
    }

    impl Payload for CreateProduct {
        fn validate(&self) -> Result<(), ErrorResponse> {
            if self.name.is_empty() {
                return Err(bad_request("10001", "name must not be empty"));
            }
            if self.quantity < 0 {
                return Err(bad_request("10002", "quantity must not be negative"));
            }
            Ok(())
        }
    }

    #[test]
    fn test_parse_valid_payload() {
        let payload: CreateProduct = parse(br#"{ "name": "widget", "quantity": 3 }"#).unwrap();
        assert_eq!(payload.name, "widget");
        assert_eq!(payload.quantity, 3);
    }

    #[test]
    fn test_malformed_json_rejected() {
        let err = parse::<CreateProduct>(b"{ not json").unwrap_err();
        assert_eq!(err.status, 400);
        assert_eq!(err.code, "00004");
    }

    #[test]
    fn test_validation_failure_propagates() {
        let err = parse::<CreateProduct>(br#"{ "name": "", "quantity": 3 }"#).unwrap_err();
        assert_eq!(err.status, 400);
        assert_eq!(err.code, "10001");
    }
}
