use std::collections::HashMap;

use chrono::{Duration, Utc};
use sqlx::{Pool, QueryBuilder, Sqlite};

use crate::{
    authentication::{
        cryptography::{hash_password, verify_password},
        jwt::{generate_jwt_session, SessionData},
    },
    error::{Error, FieldErrors},
    pagination::{Page, PageRequest},
    schema::{Id, User, UserRole, UserRow, UserView},
    validation::{validate_password, validate_registration, PasswordForm, RegisterForm},
};

use super::is_subscribed;

pub async fn get_user_by_email(email: &str, pool: &Pool<Sqlite>) -> Result<Option<User>, Error> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE LOWER(email) = LOWER(?)")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn get_user_by_id(user_id: Id, pool: &Pool<Sqlite>) -> Result<Option<User>, Error> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn get_users_by_ids(
    ids: &[Id],
    pool: &Pool<Sqlite>,
) -> Result<HashMap<Id, User>, Error> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM users WHERE id IN (");
    let mut separated = query.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    let rows: Vec<User> = query.build_query_as().fetch_all(pool).await?;

    Ok(rows.into_iter().map(|user| (user.id, user)).collect())
}

pub async fn get_user(user_id: Id, pool: &Pool<Sqlite>) -> Result<User, Error> {
    get_user_by_id(user_id, pool)
        .await?
        .ok_or_else(|| Error::not_found("User not found."))
}

/// Resolves the session to a stored, active account. Unsafe requests go
/// through here before touching anything else.
pub async fn get_active_user(session: &SessionData, pool: &Pool<Sqlite>) -> Result<User, Error> {
    let user = get_user_by_id(session.user_id, pool)
        .await?
        .ok_or_else(|| Error::Unauthorized("User not found.".to_owned()))?;

    if !user.is_active {
        return Err(Error::Forbidden("User account is disabled.".to_owned()));
    }

    Ok(user)
}

/// Creates a user; the password is stored as an argon2 hash.
pub async fn register_user(form: RegisterForm, pool: &Pool<Sqlite>) -> Result<User, Error> {
    let new_user = validate_registration(form)?;

    let mut errors = FieldErrors::default();
    if get_user_by_email(&new_user.email, pool).await?.is_some() {
        errors.add("email", "A user with that email already exists.");
    }
    let taken: Option<(Id,)> = sqlx::query_as("SELECT id FROM users WHERE username = ?")
        .bind(&new_user.username)
        .fetch_optional(pool)
        .await?;
    if taken.is_some() {
        errors.add("username", "A user with that username already exists.");
    }
    errors.into_result()?;

    let password = hash_password(&new_user.password)?;

    let user: Option<User> = sqlx::query_as(
        "
        INSERT INTO users (email, username, first_name, last_name, password, role, is_active, date_joined)
        VALUES (?, ?, ?, ?, ?, ?, 1, ?)
        ON CONFLICT DO NOTHING RETURNING *
    ",
    )
    .bind(&new_user.email)
    .bind(&new_user.username)
    .bind(&new_user.first_name)
    .bind(&new_user.last_name)
    .bind(password)
    .bind(UserRole::User)
    .bind(Utc::now())
    .fetch_optional(pool)
    .await?;

    let user = user.ok_or_else(|| {
        Error::validation("username", "A user with that username already exists.")
    })?;
    log::info!("Registered user {} ({})", user.username, user.id);

    Ok(user)
}

pub async fn login_user(
    email: &str,
    password: &str,
    secret: &str,
    lifetime: Duration,
    pool: &Pool<Sqlite>,
) -> Result<String, Error> {
    let invalid = || Error::validation("non_field_errors", "Unable to log in with provided credentials.");

    let user = get_user_by_email(email, pool).await?.ok_or_else(invalid)?;
    if !verify_password(password, &user.password)? || !user.is_active {
        return Err(invalid());
    }

    generate_jwt_session(&user, secret, lifetime)
}

pub async fn set_password(
    user: &User,
    form: PasswordForm,
    pool: &Pool<Sqlite>,
) -> Result<(), Error> {
    let (current, new) = validate_password(form)?;
    if !verify_password(&current, &user.password)? {
        return Err(Error::validation("current_password", "Invalid password."));
    }

    sqlx::query("UPDATE users SET password = ? WHERE id = ?")
        .bind(hash_password(&new)?)
        .bind(user.id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn list_users(request: PageRequest, pool: &Pool<Sqlite>) -> Result<Page<User>, Error> {
    let rows: Vec<UserRow> =
        sqlx::query_as("SELECT u.*, COUNT(*) OVER() AS count FROM users u ORDER BY u.username LIMIT ? OFFSET ?")
            .bind(request.limit)
            .bind(request.offset())
            .fetch_all(pool)
            .await?;

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);
    let total_count = if rows.is_empty() && request.page > 1 {
        count_users(pool).await?
    } else {
        total_count
    };
    let rows: Vec<User> = rows.into_iter().map(User::from).collect();

    Ok(Page::from_rows(rows, total_count, request))
}

async fn count_users(pool: &Pool<Sqlite>) -> Result<i64, Error> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    Ok(count.0)
}

pub async fn set_user_role(user_id: Id, role: UserRole, pool: &Pool<Sqlite>) -> Result<(), Error> {
    let result = sqlx::query("UPDATE users SET role = ? WHERE id = ?")
        .bind(role)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::not_found("User not found."));
    }
    Ok(())
}

pub async fn set_user_active(user_id: Id, is_active: bool, pool: &Pool<Sqlite>) -> Result<(), Error> {
    let result = sqlx::query("UPDATE users SET is_active = ? WHERE id = ?")
        .bind(is_active)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::not_found("User not found."));
    }
    Ok(())
}

pub async fn user_view(
    viewer: Option<Id>,
    user: &User,
    pool: &Pool<Sqlite>,
) -> Result<UserView, Error> {
    let subscribed = match viewer {
        Some(viewer) => is_subscribed(viewer, user.id, pool).await?,
        None => false,
    };

    Ok(UserView::from_user(user, subscribed))
}

pub async fn delete_user(user_id: Id, pool: &Pool<Sqlite>) -> Result<(), Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::not_found("User not found."));
    }
    Ok(())
}
