use std::collections::HashSet;

use chrono::Utc;
use sqlx::{Pool, QueryBuilder, Sqlite};

use crate::{
    error::Error,
    pagination::{Page, PageRequest},
    schema::{Id, User, UserRow, UserView, SubscriptionView},
};

use super::{count_author_recipes, get_user, list_author_recipes};

pub async fn subscribe(user_id: Id, author_id: Id, pool: &Pool<Sqlite>) -> Result<User, Error> {
    let author = get_user(author_id, pool).await?;

    if user_id == author_id {
        return Err(Error::validation(
            "errors",
            "You cannot subscribe to yourself.",
        ));
    }

    let result = sqlx::query(
        "INSERT INTO subscriptions (user_id, author_id, date_added) VALUES (?, ?, ?) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(author_id)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::Conflict(
            "You are already subscribed to this author.".to_owned(),
        ));
    }
    log::debug!("User {user_id} subscribed to {author_id}");

    Ok(author)
}

pub async fn unsubscribe(user_id: Id, author_id: Id, pool: &Pool<Sqlite>) -> Result<(), Error> {
    get_user(author_id, pool).await?;

    let result = sqlx::query("DELETE FROM subscriptions WHERE user_id = ? AND author_id = ?")
        .bind(user_id)
        .bind(author_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::not_found("You are not subscribed to this author."));
    }

    Ok(())
}

pub async fn is_subscribed(user_id: Id, author_id: Id, pool: &Pool<Sqlite>) -> Result<bool, Error> {
    Ok(subscribed_among(user_id, &[author_id], pool)
        .await?
        .contains(&author_id))
}

/// Which of `author_ids` the user follows.
pub async fn subscribed_among(
    user_id: Id,
    author_ids: &[Id],
    pool: &Pool<Sqlite>,
) -> Result<HashSet<Id>, Error> {
    if author_ids.is_empty() {
        return Ok(HashSet::new());
    }

    let mut query =
        QueryBuilder::<Sqlite>::new("SELECT author_id FROM subscriptions WHERE user_id = ");
    query.push_bind(user_id).push(" AND author_id IN (");
    let mut separated = query.separated(", ");
    for id in author_ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    let rows: Vec<(Id,)> = query.build_query_as().fetch_all(pool).await?;

    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Author card with recipe previews, as seen by a follower.
pub async fn subscription_view(
    author: &User,
    recipes_limit: Option<i64>,
    pool: &Pool<Sqlite>,
) -> Result<SubscriptionView, Error> {
    Ok(SubscriptionView {
        author: UserView::from_user(author, true),
        recipes: list_author_recipes(author.id, recipes_limit, pool).await?,
        recipes_count: count_author_recipes(author.id, pool).await?,
    })
}

pub async fn list_subscriptions(
    user_id: Id,
    request: PageRequest,
    recipes_limit: Option<i64>,
    pool: &Pool<Sqlite>,
) -> Result<Page<SubscriptionView>, Error> {
    let rows: Vec<UserRow> = sqlx::query_as(
        "
        SELECT u.*, COUNT(*) OVER() AS count
        FROM subscriptions s
        INNER JOIN users u ON u.id = s.author_id
        WHERE s.user_id = ?
        ORDER BY u.username
        LIMIT ? OFFSET ?
    ",
    )
    .bind(user_id)
    .bind(request.limit)
    .bind(request.offset())
    .fetch_all(pool)
    .await?;

    let total_count = match rows.first() {
        Some(row) => row.count,
        None => count_subscriptions(user_id, pool).await?,
    };

    let mut views = Vec::with_capacity(rows.len());
    for row in rows {
        let author = User::from(row);
        views.push(subscription_view(&author, recipes_limit, pool).await?);
    }

    Ok(Page::from_rows(views, total_count, request))
}

async fn count_subscriptions(user_id: Id, pool: &Pool<Sqlite>) -> Result<i64, Error> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM subscriptions WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    Ok(count.0)
}
