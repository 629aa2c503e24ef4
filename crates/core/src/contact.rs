//! Contact-form and customer-contact validation.

use serde::Deserialize;
use validator::Validate;

use crate::error::CoreError;
use crate::types::DbId;

/// Payload of `POST /api/contact`.
///
/// Every field is optional at the decoding stage so that a missing field is
/// reported as a validation error (400) rather than a body rejection.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ContactForm {
    #[validate(required(message = "name is required"), length(max = 200))]
    pub name: Option<String>,
    #[validate(
        required(message = "email is required"),
        email(message = "email must be a valid address")
    )]
    pub email: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    #[validate(length(max = 200))]
    pub subject: Option<String>,
    #[validate(
        required(message = "message is required"),
        length(max = 5000)
    )]
    pub message: Option<String>,
    /// Listing the enquiry is about, if any.
    pub puppy_id: Option<DbId>,
}

impl ContactForm {
    /// Validate the form, treating whitespace-only required fields as missing.
    pub fn check(&self) -> Result<(), CoreError> {
        for (field, value) in [
            ("name", &self.name),
            ("email", &self.email),
            ("message", &self.message),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(CoreError::Validation(format!("{field} is required")));
            }
        }
        self.validate()
            .map_err(|e| CoreError::Validation(e.to_string()))
    }
}

/// Customer details captured when a reservation is submitted.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CustomerContact {
    #[validate(length(min = 1, max = 200, message = "customer_name is required"))]
    pub customer_name: String,
    #[validate(email(message = "customer_email must be a valid address"))]
    pub customer_email: String,
    #[validate(length(max = 50))]
    pub customer_phone: Option<String>,
    #[validate(length(max = 5000))]
    pub message: Option<String>,
}

impl CustomerContact {
    pub fn check(&self) -> Result<(), CoreError> {
        if self.customer_name.trim().is_empty() {
            return Err(CoreError::Validation("customer_name is required".into()));
        }
        self.validate()
            .map_err(|e| CoreError::Validation(e.to_string()))
    }
}
