use axum::{extract::Request, middleware::Next, response::Response};

use crate::{
    error::{AppError, Result},
    user::UserRole,
};

use super::auth::AuthUser;

/// Role gate layered after `auth_middleware`. The role comes from the token
/// claims, so no extra directory lookup happens per request.
pub async fn admin_authorization(
    auth: AuthUser,
    request: Request,
    next: Next,
) -> Result<Response> {
    if auth.role != UserRole::Admin {
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }

    Ok(next.run(request).await)
}
