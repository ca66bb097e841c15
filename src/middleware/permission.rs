use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    RequestPartsExt,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::Serialize;
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{
    database::Database,
    error::AppError,
    models::{User, UserRole},
    state::AppState,
    utils::verify_token,
};

pub const AUTH_COOKIE: &str = "auth_token";

/// The authenticated caller, resolved from a bearer token or the
/// `auth_token` cookie.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
}

impl CurrentUser {
    pub fn from_user(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
        }
    }

    pub fn has_role(&self, roles: &[UserRole]) -> bool {
        roles.contains(&self.role)
    }

    pub fn require_role(&self, roles: &[UserRole]) -> Result<(), AppError> {
        if self.has_role(roles) {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts, state).await.ok_or(AppError::Unauthorized)?;

        let claims = verify_token(&token, &state.config.jwt_secret)
            .map_err(|_| AppError::InvalidToken)?;

        // Deactivated or deleted accounts lose access even with a live token
        let user = get_active_user(&state.db, claims.sub)
            .await?
            .ok_or(AppError::Unauthorized)?;

        Ok(CurrentUser::from_user(user))
    }
}

async fn extract_token(parts: &mut Parts, state: &AppState) -> Option<String> {
    if let Ok(TypedHeader(Authorization(bearer))) =
        parts.extract::<TypedHeader<Authorization<Bearer>>>().await
    {
        return Some(bearer.token().to_string());
    }

    let cookies = Cookies::from_request_parts(parts, state).await.ok()?;
    let token = cookies.get(AUTH_COOKIE)?.value().to_string();
    Some(token)
}

pub async fn get_active_user(db: &Database, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND is_active = true")
        .bind(user_id)
        .fetch_optional(db)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: UserRole) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            email: "someone@mandi.in".into(),
            first_name: "Ravi".into(),
            last_name: "Kumar".into(),
            role,
        }
    }

    #[test]
    fn role_guard() {
        let vendor = user(UserRole::Vendor);
        assert!(vendor.require_role(&[UserRole::Vendor]).is_ok());
        assert!(matches!(
            vendor.require_role(&[UserRole::Supplier, UserRole::Admin]),
            Err(AppError::Forbidden)
        ));
        assert!(!vendor.is_admin());
        assert!(user(UserRole::Admin).is_admin());
    }
}
