use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::response::{ApiError, AppJson, FieldError, Success};
use crate::store::models::{Contact, NewContact};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

/// Raw contact form. Every field is optional here so that missing fields are
/// reported alongside the other validation problems.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ContactCreated {
    pub id: u64,
}

impl ContactRequest {
    /// Check every field and either build the insert payload or report all
    /// offending fields at once.
    pub fn validate(self) -> Result<NewContact, Vec<FieldError>> {
        let mut errors = Vec::new();

        let first_name = required("firstName", self.first_name, &mut errors);
        let last_name = required("lastName", self.last_name, &mut errors);
        let email = required("email", self.email, &mut errors);
        let message = required("message", self.message, &mut errors);

        if let Some(ref email) = email {
            if !looks_like_email(email) {
                errors.push(FieldError::new("email", "Invalid email address"));
            }
        }

        match (first_name, last_name, email, message) {
            (Some(first_name), Some(last_name), Some(email), Some(message))
                if errors.is_empty() =>
            {
                Ok(NewContact {
                    first_name,
                    last_name,
                    email,
                    company: self
                        .company
                        .map(|c| c.trim().to_string())
                        .filter(|c| !c.is_empty()),
                    message,
                })
            }
            _ => Err(errors),
        }
    }
}

fn required(field: &str, value: Option<String>, errors: &mut Vec<FieldError>) -> Option<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Some(v),
        Some(_) => {
            errors.push(FieldError::new(field, format!("{field} must not be empty")));
            None
        }
        None => {
            errors.push(FieldError::new(field, format!("{field} is required")));
            None
        }
    }
}

fn looks_like_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn create_contact(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<ContactRequest>,
) -> Result<(StatusCode, Json<Success<ContactCreated>>), ApiError> {
    let contact = req
        .validate()
        .map_err(|errors| ApiError::validation("Please check your form data", errors))?;

    let contact = state.store.create_contact(contact).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to store contact");
        ApiError::internal("An error occurred while sending your message. Please try again.")
    })?;

    tracing::debug!(contact_id = contact.id, "Created contact");

    Ok((
        StatusCode::CREATED,
        Success::with_message(
            ContactCreated { id: contact.id },
            "Thank you for your message! We'll get back to you within 24 hours.",
        ),
    ))
}

pub async fn list_contacts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Contact>>, ApiError> {
    let contacts = state.store.get_contacts().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to list contacts");
        ApiError::internal("Failed to retrieve contacts")
    })?;

    Ok(Json(contacts))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ContactRequest {
        ContactRequest {
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            email: Some("ada@example.com".to_string()),
            company: Some("  ".to_string()),
            message: Some("Hello".to_string()),
        }
    }

    fn fields(errors: &[FieldError]) -> Vec<&str> {
        errors.iter().map(|e| e.field.as_str()).collect()
    }

    #[test]
    fn accepts_a_complete_form() {
        let contact = valid().validate().unwrap();
        assert_eq!(contact.first_name, "Ada");
        assert_eq!(contact.email, "ada@example.com");
        assert_eq!(contact.company, None);
    }

    #[test]
    fn reports_every_missing_field() {
        let errors = ContactRequest::default().validate().unwrap_err();
        assert_eq!(
            fields(&errors),
            vec!["firstName", "lastName", "email", "message"]
        );
    }

    #[test]
    fn blank_fields_are_rejected() {
        let mut req = valid();
        req.message = Some("   ".to_string());
        let errors = req.validate().unwrap_err();
        assert_eq!(fields(&errors), vec!["message"]);
    }

    #[test]
    fn email_shape_is_checked() {
        for bad in ["ada", "ada@", "@example.com", "ada@example", "a da@example.com", "a@b@c.d"] {
            let mut req = valid();
            req.email = Some(bad.to_string());
            let errors = req.validate().unwrap_err();
            assert_eq!(fields(&errors), vec!["email"], "{bad} should be rejected");
        }
    }
}
