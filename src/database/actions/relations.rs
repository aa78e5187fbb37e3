use std::collections::HashSet;

use chrono::Utc;
use sqlx::{Pool, QueryBuilder, Sqlite};

use crate::{
    error::Error,
    schema::{Id, RecipeShort},
};

use super::get_recipe_or_404;

/// Per-user recipe lists; both share the same (user, recipe) shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeList {
    Favorites,
    ShoppingCart,
}

impl RecipeList {
    fn table(&self) -> &'static str {
        match self {
            RecipeList::Favorites => "favorites",
            RecipeList::ShoppingCart => "shopping_cart",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            RecipeList::Favorites => "favorites",
            RecipeList::ShoppingCart => "shopping cart",
        }
    }
}

/// Adds the recipe to the user's list. A second add is a conflict.
pub async fn add_to_list(
    list: RecipeList,
    user_id: Id,
    recipe_id: Id,
    pool: &Pool<Sqlite>,
) -> Result<RecipeShort, Error> {
    let recipe = get_recipe_or_404(recipe_id, pool).await?;

    let query = match list {
        RecipeList::Favorites => {
            sqlx::query(
                "INSERT INTO favorites (user_id, recipe_id, date_added) VALUES (?, ?, ?) ON CONFLICT DO NOTHING",
            )
            .bind(user_id)
            .bind(recipe_id)
            .bind(Utc::now())
        }
        RecipeList::ShoppingCart => sqlx::query(
            "INSERT INTO shopping_cart (user_id, recipe_id) VALUES (?, ?) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(recipe_id),
    };

    let result = query.execute(pool).await?;
    if result.rows_affected() == 0 {
        return Err(Error::Conflict(format!(
            "Recipe is already in {}.",
            list.label()
        )));
    }
    log::debug!("User {user_id} added recipe {recipe_id} to {}", list.table());

    Ok(RecipeShort::from(&recipe))
}

pub async fn remove_from_list(
    list: RecipeList,
    user_id: Id,
    recipe_id: Id,
    pool: &Pool<Sqlite>,
) -> Result<(), Error> {
    get_recipe_or_404(recipe_id, pool).await?;

    let mut query = QueryBuilder::<Sqlite>::new("DELETE FROM ");
    query
        .push(list.table())
        .push(" WHERE user_id = ")
        .push_bind(user_id)
        .push(" AND recipe_id = ")
        .push_bind(recipe_id);

    let result = query.build().execute(pool).await?;
    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!(
            "Recipe is not in {}.",
            list.label()
        )));
    }

    Ok(())
}

pub async fn add_to_favorites(
    user_id: Id,
    recipe_id: Id,
    pool: &Pool<Sqlite>,
) -> Result<RecipeShort, Error> {
    add_to_list(RecipeList::Favorites, user_id, recipe_id, pool).await
}

pub async fn remove_from_favorites(
    user_id: Id,
    recipe_id: Id,
    pool: &Pool<Sqlite>,
) -> Result<(), Error> {
    remove_from_list(RecipeList::Favorites, user_id, recipe_id, pool).await
}

pub async fn add_to_shopping_cart(
    user_id: Id,
    recipe_id: Id,
    pool: &Pool<Sqlite>,
) -> Result<RecipeShort, Error> {
    add_to_list(RecipeList::ShoppingCart, user_id, recipe_id, pool).await
}

pub async fn remove_from_shopping_cart(
    user_id: Id,
    recipe_id: Id,
    pool: &Pool<Sqlite>,
) -> Result<(), Error> {
    remove_from_list(RecipeList::ShoppingCart, user_id, recipe_id, pool).await
}

async fn is_listed(
    list: RecipeList,
    user_id: Id,
    recipe_id: Id,
    pool: &Pool<Sqlite>,
) -> Result<bool, Error> {
    Ok(listed_among(list, user_id, &[recipe_id], pool)
        .await?
        .contains(&recipe_id))
}

pub async fn is_favorited_by(
    recipe_id: Id,
    user_id: Id,
    pool: &Pool<Sqlite>,
) -> Result<bool, Error> {
    is_listed(RecipeList::Favorites, user_id, recipe_id, pool).await
}

pub async fn is_in_cart_of(recipe_id: Id, user_id: Id, pool: &Pool<Sqlite>) -> Result<bool, Error> {
    is_listed(RecipeList::ShoppingCart, user_id, recipe_id, pool).await
}

/// Which of `recipe_ids` are on the user's list.
pub async fn listed_among(
    list: RecipeList,
    user_id: Id,
    recipe_ids: &[Id],
    pool: &Pool<Sqlite>,
) -> Result<HashSet<Id>, Error> {
    if recipe_ids.is_empty() {
        return Ok(HashSet::new());
    }

    let mut query = QueryBuilder::<Sqlite>::new("SELECT recipe_id FROM ");
    query
        .push(list.table())
        .push(" WHERE user_id = ")
        .push_bind(user_id)
        .push(" AND recipe_id IN (");
    let mut separated = query.separated(", ");
    for id in recipe_ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    let rows: Vec<(Id,)> = query.build_query_as().fetch_all(pool).await?;

    Ok(rows.into_iter().map(|(id,)| id).collect())
}
