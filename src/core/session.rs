//! Login sessions - password login, token resolution and logout.
//!
//! Sessions are rows in `sesiones`, so every server process sees the same
//! set and a logout takes effect immediately.

use crate::{
    core::{
        credentials::{PasswordHasher, TokenIssuer},
        user::{self, UserSummary},
    },
    entities::{Session, session, user as user_entity},
    errors::{Error, Result},
};
use chrono::{DateTime, TimeDelta, Utc};
use sea_orm::{Set, prelude::*};
use serde::Serialize;
use tracing::{debug, info, instrument};

/// Session lifetime when `config.toml` does not set one
pub const DEFAULT_SESSION_MINUTES: i64 = 15;

/// Successful login
#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub token: String,
    pub expira: DateTime<Utc>,
    pub usuario: UserSummary,
}

fn invalid_credentials() -> Error {
    Error::Unauthorized {
        message: "Invalid credentials".to_string(),
    }
}

/// Checks an e-mail/password pair and opens a session valid for `ttl`.
///
/// Unknown e-mails, accounts without a password and wrong passwords all fail
/// with the same [`Error::Unauthorized`] message.
#[instrument(skip(db, hasher, issuer, contrasena))]
pub async fn login_at(
    db: &DatabaseConnection,
    hasher: &dyn PasswordHasher,
    issuer: &dyn TokenIssuer,
    correo: &str,
    contrasena: &str,
    ttl: TimeDelta,
    now: DateTime<Utc>,
) -> Result<LoginOutcome> {
    let account = user::get_user_by_email(db, correo)
        .await?
        .ok_or_else(invalid_credentials)?;
    let matches = account
        .contrasena
        .as_deref()
        .is_some_and(|hash| hasher.verify(contrasena, hash));
    if !matches {
        debug!("Rejected login for {correo}");
        return Err(invalid_credentials());
    }
    if !account.activo {
        return Err(Error::Unauthorized {
            message: "User is inactive".to_string(),
        });
    }

    purge_expired(db, now).await?;
    let token = issuer.issue()?;
    let expira = now + ttl;
    session::ActiveModel {
        token: Set(token.clone()),
        usuario_id: Set(account.id),
        created_at: Set(now),
        expires_at: Set(expira),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("User {} logged in", account.id);
    Ok(LoginOutcome {
        token,
        expira,
        usuario: account.into(),
    })
}

/// [`login_at`] with the current time.
pub async fn login(
    db: &DatabaseConnection,
    hasher: &dyn PasswordHasher,
    issuer: &dyn TokenIssuer,
    correo: &str,
    contrasena: &str,
    ttl: TimeDelta,
) -> Result<LoginOutcome> {
    login_at(db, hasher, issuer, correo, contrasena, ttl, Utc::now()).await
}

/// Resolves a session token to its account.
///
/// Returns `Ok(None)` for tokens that were never issued or were logged out,
/// and [`Error::Unauthorized`] for expired ones (which are deleted).
pub async fn resolve_session(
    db: &DatabaseConnection,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Option<user_entity::Model>> {
    let Some((found, account)) = Session::find()
        .filter(session::Column::Token.eq(token))
        .find_also_related(user_entity::Entity)
        .one(db)
        .await?
    else {
        return Ok(None);
    };

    if found.expires_at <= now {
        Session::delete_by_id(found.id).exec(db).await?;
        return Err(Error::Unauthorized {
            message: "Token expired".to_string(),
        });
    }
    Ok(account)
}

/// Ends the session identified by `token`. Returns whether one existed.
pub async fn logout(db: &DatabaseConnection, token: &str) -> Result<bool> {
    let result = Session::delete_many()
        .filter(session::Column::Token.eq(token))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

/// Ends every session of a user.
pub async fn revoke_user_sessions<C>(db: &C, user_id: i64) -> Result<u64>
where
    C: ConnectionTrait,
{
    let result = Session::delete_many()
        .filter(session::Column::UsuarioId.eq(user_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Deletes sessions that expired at or before `now`.
pub async fn purge_expired(db: &DatabaseConnection, now: DateTime<Utc>) -> Result<u64> {
    let result = Session::delete_many()
        .filter(session::Column::ExpiresAt.lte(now))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
