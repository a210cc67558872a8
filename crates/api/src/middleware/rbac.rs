//! Role-based access control (RBAC) extractors.
//!
//! Each extractor wraps [`AuthUser`] and rejects requests whose role does not
//! meet the requirement.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use presensi_core::error::CoreError;
use presensi_core::roles::is_curriculum_staff;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires `kurikulum` or `admin` role. Rejects with 403 Forbidden otherwise.
///
/// Guards attendance confirmation, substitution and leave decisions.
///
/// ```ignore
/// async fn approve(RequireCurriculum(user): RequireCurriculum) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireCurriculum(pub AuthUser);

impl FromRequestParts<AppState> for RequireCurriculum {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !is_curriculum_staff(&user.role) {
            return Err(AppError::Core(CoreError::Forbidden(
                "Kurikulum or Admin role required".into(),
            )));
        }
        Ok(RequireCurriculum(user))
    }
}

/// Requires any authenticated user (any valid role).
///
/// Functionally equivalent to [`AuthUser`] but named explicitly for routes
/// where "this route requires authentication" should be self-documenting.
pub struct RequireAuth(pub AuthUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        Ok(RequireAuth(user))
    }
}
