use sqlx::{Pool, QueryBuilder, Sqlite};

use crate::{
    error::Error,
    schema::{Id, Ingredient, RecipePart},
    validation::validate_ingredient,
};

/// Returns the existing (name, unit) pair, or creates it.
pub async fn create_ingredient(
    name: &str,
    measurement_unit: &str,
    pool: &Pool<Sqlite>,
) -> Result<Ingredient, Error> {
    validate_ingredient(name, measurement_unit)?;

    sqlx::query(
        "INSERT INTO ingredients (name, measurement_unit, search_name) VALUES (?, ?, ?) ON CONFLICT DO NOTHING",
    )
    .bind(name)
    .bind(measurement_unit)
    .bind(name.to_lowercase())
    .execute(pool)
    .await?;

    let ingredient: Ingredient =
        sqlx::query_as("SELECT * FROM ingredients WHERE name = ? AND measurement_unit = ?")
            .bind(name)
            .bind(measurement_unit)
            .fetch_one(pool)
            .await?;

    Ok(ingredient)
}

pub async fn get_ingredient(id: Id, pool: &Pool<Sqlite>) -> Result<Option<Ingredient>, Error> {
    let ingredient: Option<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(ingredient)
}

/// Case-insensitive name prefix search, ordered by name. Matching runs on
/// `search_name` so non-ASCII names fold too.
pub async fn list_ingredients(
    prefix: Option<&str>,
    pool: &Pool<Sqlite>,
) -> Result<Vec<Ingredient>, Error> {
    let list: Vec<Ingredient> = match prefix.map(str::trim).filter(|p| !p.is_empty()) {
        Some(prefix) => {
            sqlx::query_as(
                "SELECT * FROM ingredients WHERE search_name LIKE ? ESCAPE '\\' ORDER BY name, measurement_unit",
            )
            .bind(format!("{}%", escape_like(&prefix.to_lowercase())))
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as("SELECT * FROM ingredients ORDER BY name, measurement_unit")
                .fetch_all(pool)
                .await?
        }
    };

    Ok(list)
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Ids out of `ids` that have no ingredient row.
pub async fn missing_ingredient_ids(ids: &[Id], pool: &Pool<Sqlite>) -> Result<Vec<Id>, Error> {
    if ids.is_empty() {
        return Ok(vec![]);
    }

    let mut query = QueryBuilder::<Sqlite>::new("SELECT id FROM ingredients WHERE id IN (");
    let mut separated = query.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    let found: Vec<(Id,)> = query.build_query_as().fetch_all(pool).await?;

    Ok(ids
        .iter()
        .filter(|id| !found.iter().any(|(found,)| found == *id))
        .copied()
        .collect())
}

pub async fn list_recipe_parts(
    recipe_ids: &[Id],
    pool: &Pool<Sqlite>,
) -> Result<Vec<RecipePart>, Error> {
    if recipe_ids.is_empty() {
        return Ok(vec![]);
    }

    let mut query = QueryBuilder::<Sqlite>::new(
        "SELECT rp.recipe_id AS recipe_id, i.id AS id, i.name AS name, i.measurement_unit AS measurement_unit, rp.amount AS amount
        FROM recipe_ingredients rp
        INNER JOIN ingredients i ON i.id = rp.ingredient_id
        WHERE rp.recipe_id IN (",
    );
    let mut separated = query.separated(", ");
    for id in recipe_ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(") ORDER BY rp.id");

    let rows: Vec<RecipePart> = query.build_query_as().fetch_all(pool).await?;

    Ok(rows)
}
