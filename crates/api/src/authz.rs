use axum::http::StatusCode;

use crate::app::errors;
use crate::context::PrincipalContext;

/// Gate for the admin surface: the token must carry the `admin` role.
pub fn require_admin(principal: &PrincipalContext) -> Result<(), axum::response::Response> {
    if principal.is_admin() {
        Ok(())
    } else {
        Err(errors::json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            "admin role required",
        ))
    }
}
