//! Contact form.

use axum::extract::State;
use axum::Json;
use goldipuppy_core::contact::ContactForm;

use crate::error::AppResult;
use crate::notifications::contact_email;
use crate::response::SuccessResponse;
use crate::state::AppState;

/// POST /api/contact
///
/// Missing or invalid `name`, `email` or `message` is a 400. Otherwise the
/// form is mailed to the operator over SMTP and the answer is 200 whether
/// or not delivery worked; failures are only logged.
pub async fn submit_contact(
    State(state): State<AppState>,
    Json(form): Json<ContactForm>,
) -> AppResult<Json<SuccessResponse>> {
    form.check()?;

    match &state.contact_mailer {
        Some(mailer) => {
            let email = contact_email(&state.config.store, &form);
            if let Err(e) = mailer.send(&email).await {
                tracing::error!(error = %e, transport = mailer.name(), "Contact form email failed");
            }
        }
        None => {
            tracing::warn!("No SMTP transport configured, contact form not mailed");
        }
    }

    Ok(Json(SuccessResponse::ok()))
}
