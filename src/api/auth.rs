//! Bearer-token authentication and role gates.
//!
//! A token is either a static one from `config.toml`, which a [`TokenVerifier`]
//! maps to the e-mail of an account, or a session token issued by `POST /login`.
//! The account row then supplies the role. Handlers take an [`AuthUser`] and call
//! [`AuthUser::require`] with the roles allowed on the route.

use super::AppState;
use crate::{
    config::settings::TokenConfig,
    core::{session, user},
    entities::{Role, user as user_entity},
    errors::{Error, Result},
};
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use chrono::Utc;
use std::collections::HashMap;
use tracing::debug;

/// Every role
pub const ANY_ROLE: &[Role] = &[Role::Admin, Role::Seller, Role::Kitchen];
/// Administrators only
pub const ADMIN: &[Role] = &[Role::Admin];
/// Front-of-house staff
pub const ADMIN_SELLER: &[Role] = &[Role::Admin, Role::Seller];
/// Kitchen staff
pub const ADMIN_KITCHEN: &[Role] = &[Role::Admin, Role::Kitchen];

/// Resolves bearer tokens to account e-mails.
pub trait TokenVerifier: Send + Sync {
    /// Returns the e-mail of the account `token` authenticates, if any.
    fn verify(&self, token: &str) -> Option<String>;
}

/// Verifier backed by the `[[tokens]]` table of `config.toml`
#[derive(Debug, Clone, Default)]
pub struct ConfigTokenVerifier {
    tokens: HashMap<String, String>,
}

impl ConfigTokenVerifier {
    #[must_use]
    pub fn from_tokens(tokens: &[TokenConfig]) -> Self {
        Self {
            tokens: tokens
                .iter()
                .map(|t| (t.token.clone(), t.email.clone()))
                .collect(),
        }
    }
}

impl TokenVerifier for ConfigTokenVerifier {
    fn verify(&self, token: &str) -> Option<String> {
        self.tokens.get(token).cloned()
    }
}

pub(super) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// The authenticated caller
#[derive(Debug, Clone)]
pub struct AuthUser(pub user_entity::Model);

impl AuthUser {
    /// Fails with [`Error::Forbidden`] unless the caller holds one of `roles`.
    pub fn require(&self, roles: &[Role]) -> Result<()> {
        if roles.contains(&self.0.rol) {
            Ok(())
        } else {
            debug!("User {} ({:?}) denied", self.0.id, self.0.rol);
            Err(Error::Forbidden)
        }
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.0.rol, Role::Admin)
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = bearer_token(&parts.headers).ok_or_else(|| Error::Unauthorized {
            message: "Access denied, no token provided".to_string(),
        })?;

        let account = if let Some(email) = state.verifier.verify(token) {
            user::get_user_by_email(state.db.as_ref(), &email)
                .await?
                .ok_or_else(|| Error::Unauthorized {
                    message: "User not found".to_string(),
                })?
        } else {
            session::resolve_session(state.db.as_ref(), token, Utc::now())
                .await?
                .ok_or_else(|| Error::Unauthorized {
                    message: "Invalid token".to_string(),
                })?
        };

        if !account.activo {
            return Err(Error::Unauthorized {
                message: "User is inactive".to_string(),
            });
        }
        Ok(Self(account))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(bearer_token(&headers), Some("abc123"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc123"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_config_verifier() {
        let verifier = ConfigTokenVerifier::from_tokens(&[TokenConfig {
            token: "secreto".to_string(),
            email: "admin@example.com".to_string(),
        }]);
        assert_eq!(
            verifier.verify("secreto").as_deref(),
            Some("admin@example.com")
        );
        assert_eq!(verifier.verify("otro"), None);
    }
}
