//! Classification of failed registration requests
//!
//! The message text decides the category, in priority order:
//!
//! | message contains                 | reported failure                 |
//! |----------------------------------|----------------------------------|
//! | `ECONNREFUSED`, `ENOTFOUND`, `405` | invalid instance URL           |
//! | `401`                            | invalid credentials              |
//! | `400`, `404`                     | reasons from the response body   |
//! | anything else                    | package not created              |

use crate::core::error::{RegistrationError, ServiceError};
use crate::core::payload::{interpolate, is_truthy};
use crate::core::safe_json::to_string_with_cycle_guard;
use serde_json::Value;

const INVALID_URL_MARKERS: &[&str] = &["ECONNREFUSED", "ENOTFOUND", "405"];
const UNAUTHORIZED_MARKERS: &[&str] = &["401"];
const REJECTED_MARKERS: &[&str] = &["400", "404"];

/// Outcome of classifying one failed request
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Failure to report; `None` when a 400/404 body carries no known reason
    pub failure: Option<RegistrationError>,
    /// Response body to log at debug level
    pub response_dump: Option<String>,
}

fn contains_any(message: &str, markers: &[&str]) -> bool {
    markers.iter().any(|marker| message.contains(marker))
}

/// Reasons a 400/404 response gives for rejecting the registration
///
/// `result.errorMessage` wins over `result.details.errors[*].message`.
/// Returns `None` when the body has neither.
pub fn rejection_reasons(body: Option<&Value>) -> Option<Vec<String>> {
    let result = body?.get("result")?;

    let error_message = result.get("errorMessage");
    if is_truthy(error_message) {
        return Some(vec![interpolate(error_message)]);
    }

    let errors = result.get("details")?.get("errors")?.as_array()?;
    if errors.is_empty() {
        return None;
    }
    Some(
        errors
            .iter()
            .map(|entry| interpolate(entry.get("message")))
            .collect(),
    )
}

/// Map a failed request to the failure reported to the pipeline
pub fn classify(error: &ServiceError) -> Classification {
    let message = error.message.as_str();

    if contains_any(message, INVALID_URL_MARKERS) {
        return Classification {
            failure: Some(RegistrationError::InvalidInstanceUrl),
            response_dump: None,
        };
    }

    if contains_any(message, UNAUTHORIZED_MARKERS) {
        return Classification {
            failure: Some(RegistrationError::Unauthorized),
            response_dump: error.body.as_ref().map(to_string_with_cycle_guard),
        };
    }

    if contains_any(message, REJECTED_MARKERS) {
        return Classification {
            failure: rejection_reasons(error.body.as_ref()).map(RegistrationError::rejected),
            response_dump: None,
        };
    }

    Classification {
        failure: Some(RegistrationError::NotCreated),
        response_dump: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn failure(error: ServiceError) -> Option<String> {
        classify(&error).failure.map(|e| e.to_string())
    }

    #[test]
    fn test_connection_refused_is_invalid_url() {
        let message = failure(ServiceError::new("connect ECONNREFUSED 127.0.0.1:443")).unwrap();
        assert!(message.starts_with("ServiceNow Instance URL is NOT valid"));
    }

    #[test]
    fn test_dns_failure_is_invalid_url() {
        let error = ServiceError::new("getaddrinfo ENOTFOUND nowhere.invalid");
        assert_eq!(
            classify(&error).failure,
            Some(RegistrationError::InvalidInstanceUrl)
        );
    }

    #[test]
    fn test_method_not_allowed_is_invalid_url() {
        let error = ServiceError::status(405, Some(json!({"error": "nope"})));
        assert_eq!(
            classify(&error).failure,
            Some(RegistrationError::InvalidInstanceUrl)
        );
    }

    #[test]
    fn test_unauthorized_dumps_response_body() {
        let error = ServiceError::status(401, Some(json!({"result": {"errorMessage": "bad creds"}})));
        let classification = classify(&error);

        assert!(
            classification
                .failure
                .unwrap()
                .to_string()
                .contains("Invalid username and password or Invalid token and toolid")
        );
        assert_eq!(
            classification.response_dump.as_deref(),
            Some(r#"{"result":{"errorMessage":"bad creds"}}"#)
        );
    }

    #[test]
    fn test_unauthorized_without_body_dumps_nothing() {
        let classification = classify(&ServiceError::status(401, None));
        assert_eq!(classification.failure, Some(RegistrationError::Unauthorized));
        assert_eq!(classification.response_dump, None);
    }

    #[test]
    fn test_bad_request_reports_error_message() {
        let error = ServiceError::status(
            400,
            Some(json!({"result": {"errorMessage": "Tool not found"}})),
        );

        assert_eq!(
            failure(error).unwrap(),
            "[ServiceNow DevOps] Package Registration is not Successful. Tool not found Please provide valid inputs."
        );
    }

    #[test]
    fn test_bad_request_concatenates_detail_errors() {
        let error = ServiceError::status(
            400,
            Some(json!({"result": {"details": {"errors": [{"message": "A"}, {"message": "B"}]}}})),
        );

        let message = failure(error).unwrap();
        assert!(message.contains("A Please provide valid inputs.B Please provide valid inputs."));
    }

    #[test]
    fn test_error_message_wins_over_detail_errors() {
        let body = json!({
            "result": {
                "errorMessage": "primary",
                "details": {"errors": [{"message": "secondary"}]}
            }
        });
        assert_eq!(rejection_reasons(Some(&body)), Some(vec!["primary".to_string()]));
    }

    #[test]
    fn test_not_found_without_known_shape_reports_nothing() {
        assert_eq!(failure(ServiceError::status(404, None)), None);
        assert_eq!(
            failure(ServiceError::status(404, Some(json!({"result": {}})))),
            None
        );
        assert_eq!(
            failure(ServiceError::status(
                400,
                Some(json!({"result": {"details": {"errors": []}}}))
            )),
            None
        );
    }

    #[test]
    fn test_detail_entry_without_message_reads_undefined() {
        let body = json!({"result": {"details": {"errors": [{"code": 7}]}}});
        assert_eq!(
            rejection_reasons(Some(&body)),
            Some(vec!["undefined".to_string()])
        );
    }

    #[test]
    fn test_other_failures_are_not_created() {
        let message = failure(ServiceError::status(500, None)).unwrap();
        assert_eq!(
            message,
            "ServiceNow Package is NOT created. Please check ServiceNow logs for more details."
        );
    }

    #[test]
    fn test_markers_are_checked_in_priority_order() {
        // a refused connection to a host whose name contains 401
        let error = ServiceError::new("connect ECONNREFUSED host401.example.com:443");
        assert_eq!(
            classify(&error).failure,
            Some(RegistrationError::InvalidInstanceUrl)
        );
    }
}
