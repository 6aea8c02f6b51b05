//! Fail-soft operation results.
//!
//! Top-level ledger operations never return `Err` to their caller. They
//! resolve to an [`Outcome`] whose `success` flag is the only thing callers
//! branch on; the payload fields are flattened next to `success`/`message`
//! when serialized.

use serde::Serialize;

use crate::error::{DomainError, DomainResult, ErrorKind};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
    #[serde(flatten)]
    pub payload: Option<T>,
}

impl<T> Outcome<T> {
    pub fn ok(message: impl Into<String>, payload: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            error: None,
            payload: Some(payload),
        }
    }

    pub fn failed(error: &DomainError) -> Self {
        Self {
            success: false,
            message: error.to_string(),
            error: Some(error.kind()),
            payload: None,
        }
    }

    /// Fold a domain result into an outcome.
    ///
    /// Store failures are prefixed with `"{operation} failed: "`; domain
    /// failures keep their own message.
    pub fn from_result(
        result: DomainResult<T>,
        operation: &str,
        message: impl FnOnce(&T) -> String,
    ) -> Self {
        match result {
            Ok(payload) => Self::ok(message(&payload), payload),
            Err(e @ DomainError::Store(_)) => Self {
                success: false,
                message: format!("{operation} failed: {e}"),
                error: Some(e.kind()),
                payload: None,
            },
            Err(e) => Self::failed(&e),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn payload(&self) -> Option<&T> {
        self.payload.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize)]
    struct Moved {
        reference_number: String,
    }

    #[test]
    fn success_flattens_payload_next_to_flag() {
        let o = Outcome::ok(
            "Successfully transferred 3 units",
            Moved {
                reference_number: "TRANSFER-20240101120000".into(),
            },
        );
        let v = serde_json::to_value(&o).unwrap();
        assert_eq!(v["success"], true);
        assert_eq!(v["reference_number"], "TRANSFER-20240101120000");
        assert!(v.get("error").is_none());
    }

    #[test]
    fn domain_failure_keeps_its_message() {
        let o: Outcome<Moved> = Outcome::from_result(
            Err(DomainError::ProductNotInSource),
            "Transfer",
            |_| unreachable!(),
        );
        assert!(!o.is_success());
        assert_eq!(o.message, "Product not found in source warehouse");
        assert_eq!(o.error, Some(ErrorKind::ProductNotInSource));
        assert!(o.payload().is_none());
    }

    #[test]
    fn store_failure_is_prefixed_with_operation() {
        let o: Outcome<Moved> =
            Outcome::from_result(Err(DomainError::store("connection reset")), "Transfer", |_| {
                unreachable!()
            });
        assert_eq!(o.message, "Transfer failed: store error: connection reset");
        assert_eq!(o.error, Some(ErrorKind::StoreError));
    }
}
