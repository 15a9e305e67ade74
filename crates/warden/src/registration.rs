//! Account registration.

use serde::de::IgnoredAny;
use warden_protocol::{RegisterRequest, paths};
use warden_session::{AuthorizedClient, Notice, SessionError};
use warden_transport::HttpTransport;

pub const REGISTER_OK: &str = "Registration successful! Please log in.";

/// Creates an account and reports the outcome as a notice.
///
/// Registration never logs in; the session is left exactly as it was.
pub(crate) async fn register<T: HttpTransport>(
    http: &AuthorizedClient<T>,
    form: &RegisterRequest,
) -> Result<(), SessionError> {
    let result = submit(http, form).await;
    let notice = match &result {
        Ok(()) => Notice::success(REGISTER_OK),
        Err(SessionError::Validation(errors)) => {
            Notice::error(format!("Registration failed: {}", errors.summary()))
        }
        Err(e) => Notice::error(format!("Registration failed: {e}")),
    };
    http.session().notify(notice);
    result
}

async fn submit<T: HttpTransport>(
    http: &AuthorizedClient<T>,
    form: &RegisterRequest,
) -> Result<(), SessionError> {
    form.validate().map_err(SessionError::Validation)?;
    let _: IgnoredAny = http.post_json(paths::REGISTER, form).await?;
    tracing::info!(username = %form.username, "account registered");
    Ok(())
}
