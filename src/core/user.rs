//! User business logic - account management.
//!
//! Accounts are identified by e-mail for authentication. Passwords are not
//! handled here; credentials are verified by the token layer.

use crate::{
    config::settings::UserConfig,
    core::{PageRequest, Pagination, clean_optional, credentials::PasswordHasher, like_pattern, session},
    entities::{Order, Role, User, order, user},
    errors::{Error, Result},
};
use sea_orm::{Condition, PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Fields required to create a user
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub nombre: String,
    pub nit: String,
    pub nrc: Option<String>,
    pub giro: Option<String>,
    pub correo: String,
    pub telefono: String,
    pub rol: Role,
    /// Plain-text password; accounts created without one cannot log in
    #[serde(default)]
    pub contrasena: Option<String>,
}

/// Partial update of a user; absent fields keep their value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserChanges {
    pub nombre: Option<String>,
    pub nit: Option<String>,
    pub nrc: Option<String>,
    pub giro: Option<String>,
    pub correo: Option<String>,
    pub telefono: Option<String>,
    pub rol: Option<Role>,
    pub activo: Option<bool>,
    /// New plain-text password; changing it ends the user's sessions
    pub contrasena: Option<String>,
}

/// Reduced view of a user shown to non-admin callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub nombre: String,
    pub correo: String,
    pub telefono: String,
    pub rol: Role,
}

impl From<user::Model> for UserSummary {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            nombre: user.nombre,
            correo: user.correo,
            telefono: user.telefono,
            rol: user.rol,
        }
    }
}

/// A page of users
#[derive(Debug, Clone, Serialize)]
pub struct UserPage {
    pub usuarios: Vec<user::Model>,
    pub pagination: Pagination,
}

fn validate_email(correo: &str) -> Result<()> {
    let valid = correo
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if valid {
        Ok(())
    } else {
        Err(Error::invalid_input(format!("Invalid e-mail address: {correo}")))
    }
}

fn require(value: &str, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid_input(format!("Field '{field}' is required")));
    }
    Ok(trimmed.to_string())
}

/// Lists users, newest id first, optionally filtered by name, e-mail or NIT.
pub async fn list_users(
    db: &DatabaseConnection,
    request: PageRequest,
    search: Option<&str>,
) -> Result<UserPage> {
    let mut query = User::find().order_by_desc(user::Column::Id);
    if let Some(term) = search.filter(|s| !s.trim().is_empty()) {
        let pattern = like_pattern(term);
        query = query.filter(
            Condition::any()
                .add(user::Column::Nombre.like(pattern.as_str()))
                .add(user::Column::Correo.like(pattern.as_str()))
                .add(user::Column::Nit.like(pattern.as_str())),
        );
    }

    let paginator = query.paginate(db, request.limit());
    let total = paginator.num_items().await?;
    let usuarios = paginator.fetch_page(request.page() - 1).await?;

    Ok(UserPage {
        usuarios,
        pagination: Pagination::new(total, request),
    })
}

/// Finds a user by ID.
pub async fn get_user_by_id<C>(db: &C, user_id: i64) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Finds a user by login e-mail.
pub async fn get_user_by_email(
    db: &DatabaseConnection,
    correo: &str,
) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::Correo.eq(correo.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

async fn ensure_unique(
    db: &DatabaseConnection,
    correo: Option<&str>,
    nit: Option<&str>,
    exclude_id: Option<i64>,
) -> Result<()> {
    if let Some(correo) = correo {
        let mut query = User::find().filter(user::Column::Correo.eq(correo));
        if let Some(id) = exclude_id {
            query = query.filter(user::Column::Id.ne(id));
        }
        if query.one(db).await?.is_some() {
            return Err(Error::invalid_input("E-mail is already registered"));
        }
    }
    if let Some(nit) = nit {
        let mut query = User::find().filter(user::Column::Nit.eq(nit));
        if let Some(id) = exclude_id {
            query = query.filter(user::Column::Id.ne(id));
        }
        if query.one(db).await?.is_some() {
            return Err(Error::invalid_input("NIT is already registered"));
        }
    }
    Ok(())
}

fn hash_password(hasher: &dyn PasswordHasher, contrasena: &str) -> Result<String> {
    if contrasena.trim().is_empty() {
        return Err(Error::invalid_input("Field 'contrasena' cannot be empty"));
    }
    hasher.hash(contrasena)
}

/// Creates a user after validating required fields and uniqueness of e-mail and NIT.
///
/// A supplied password is stored only as the hash produced by `hasher`.
pub async fn create_user(
    db: &DatabaseConnection,
    hasher: &dyn PasswordHasher,
    new_user: NewUser,
) -> Result<user::Model> {
    let nombre = require(&new_user.nombre, "nombre")?;
    let nit = require(&new_user.nit, "nit")?;
    let correo = require(&new_user.correo, "correo")?;
    let telefono = require(&new_user.telefono, "telefono")?;
    validate_email(&correo)?;
    ensure_unique(db, Some(&correo), Some(&nit), None).await?;
    let contrasena = new_user
        .contrasena
        .as_deref()
        .map(|c| hash_password(hasher, c))
        .transpose()?;

    user::ActiveModel {
        nombre: Set(nombre),
        nit: Set(nit),
        nrc: Set(clean_optional(new_user.nrc)),
        giro: Set(clean_optional(new_user.giro)),
        correo: Set(correo),
        telefono: Set(telefono),
        rol: Set(new_user.rol),
        contrasena: Set(contrasena),
        activo: Set(true),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Applies a partial update to a user.
pub async fn update_user(
    db: &DatabaseConnection,
    hasher: &dyn PasswordHasher,
    user_id: i64,
    changes: UserChanges,
) -> Result<user::Model> {
    let existing = get_user_by_id(db, user_id)
        .await?
        .ok_or_else(|| Error::not_found("User", user_id))?;

    let correo = changes
        .correo
        .as_deref()
        .map(|c| require(c, "correo"))
        .transpose()?;
    if let Some(correo) = &correo {
        validate_email(correo)?;
    }
    let nit = changes
        .nit
        .as_deref()
        .map(|n| require(n, "nit"))
        .transpose()?;
    ensure_unique(db, correo.as_deref(), nit.as_deref(), Some(user_id)).await?;
    let contrasena = changes
        .contrasena
        .as_deref()
        .map(|c| hash_password(hasher, c))
        .transpose()?;

    let mut active: user::ActiveModel = existing.into();
    if let Some(nombre) = changes.nombre.as_deref() {
        active.nombre = Set(require(nombre, "nombre")?);
    }
    if let Some(telefono) = changes.telefono.as_deref() {
        active.telefono = Set(require(telefono, "telefono")?);
    }
    if let Some(correo) = correo {
        active.correo = Set(correo);
    }
    if let Some(nit) = nit {
        active.nit = Set(nit);
    }
    if changes.nrc.is_some() {
        active.nrc = Set(clean_optional(changes.nrc));
    }
    if changes.giro.is_some() {
        active.giro = Set(clean_optional(changes.giro));
    }
    if let Some(rol) = changes.rol {
        active.rol = Set(rol);
    }
    if let Some(activo) = changes.activo {
        active.activo = Set(activo);
    }
    let password_changed = contrasena.is_some();
    if let Some(hash) = contrasena {
        active.contrasena = Set(Some(hash));
    }

    let txn = db.begin().await?;
    let updated = active.update(&txn).await?;
    if password_changed {
        session::revoke_user_sessions(&txn, user_id).await?;
    }
    txn.commit().await?;
    Ok(updated)
}

/// Deletes a user.
///
/// Users cannot delete their own account, and accounts that registered orders
/// are kept for the order history (deactivate them instead).
pub async fn delete_user(db: &DatabaseConnection, acting_user_id: i64, user_id: i64) -> Result<()> {
    if acting_user_id == user_id {
        return Err(Error::invalid_input("You cannot delete your own user"));
    }

    let existing = get_user_by_id(db, user_id)
        .await?
        .ok_or_else(|| Error::not_found("User", user_id))?;

    let orders = Order::find()
        .filter(order::Column::UsuarioId.eq(user_id))
        .count(db)
        .await?;
    if orders > 0 {
        return Err(Error::invalid_input(
            "Cannot delete a user that registered orders; deactivate it instead",
        ));
    }

    let txn = db.begin().await?;
    session::revoke_user_sessions(&txn, user_id).await?;
    existing.delete(&txn).await?;
    txn.commit().await?;
    Ok(())
}

/// Creates the configured bootstrap accounts that do not exist yet.
pub async fn seed_users(
    db: &DatabaseConnection,
    hasher: &dyn PasswordHasher,
    users: &[UserConfig],
) -> Result<usize> {
    let mut created = 0;
    for account in users {
        if get_user_by_email(db, &account.email).await?.is_some() {
            continue;
        }
        create_user(
            db,
            hasher,
            NewUser {
                nombre: account.name.clone(),
                nit: account.nit.clone(),
                nrc: None,
                giro: None,
                correo: account.email.clone(),
                telefono: account.phone.clone(),
                rol: account.role,
                contrasena: account.password.clone(),
            },
        )
        .await?;
        info!("Seeded user account {}", account.email);
        created += 1;
    }
    Ok(created)
}
