use sqlx::{Pool, QueryBuilder, Sqlite};

use crate::{
    error::Error,
    schema::{Id, LinkedRecipeTag, Tag},
    validation::validate_tag,
};

/// Returns the existing tag with the same slug, or creates it.
pub async fn create_tag(
    name: &str,
    color: &str,
    slug: &str,
    pool: &Pool<Sqlite>,
) -> Result<Tag, Error> {
    validate_tag(name, color, slug)?;

    if let Some(tag) = find_tag(slug, pool).await? {
        return Ok(tag);
    }

    let tag: Option<Tag> = sqlx::query_as(
        "INSERT INTO tags (name, color, slug) VALUES (?, ?, ?) ON CONFLICT DO NOTHING RETURNING *",
    )
    .bind(name)
    .bind(color)
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    tag.ok_or_else(|| Error::Conflict(format!("Tag {name} conflicts with an existing tag")))
}

pub async fn get_tag(id: Id, pool: &Pool<Sqlite>) -> Result<Option<Tag>, Error> {
    let tag: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(tag)
}

pub async fn find_tag(slug: &str, pool: &Pool<Sqlite>) -> Result<Option<Tag>, Error> {
    let tag: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE slug = ?")
        .bind(slug)
        .fetch_optional(pool)
        .await?;

    Ok(tag)
}

pub async fn list_tags(pool: &Pool<Sqlite>) -> Result<Vec<Tag>, Error> {
    let list: Vec<Tag> = sqlx::query_as("SELECT * FROM tags ORDER BY name")
        .fetch_all(pool)
        .await?;

    Ok(list)
}

/// Ids out of `ids` that have no tag row.
pub async fn missing_tag_ids(ids: &[Id], pool: &Pool<Sqlite>) -> Result<Vec<Id>, Error> {
    if ids.is_empty() {
        return Ok(vec![]);
    }

    let mut query = QueryBuilder::<Sqlite>::new("SELECT id FROM tags WHERE id IN (");
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

pub async fn list_recipe_tags(
    recipe_ids: &[Id],
    pool: &Pool<Sqlite>,
) -> Result<Vec<LinkedRecipeTag>, Error> {
    if recipe_ids.is_empty() {
        return Ok(vec![]);
    }

    let mut query = QueryBuilder::<Sqlite>::new(
        "SELECT rt.recipe_id AS recipe_id, t.id AS id, t.name AS name, t.color AS color, t.slug AS slug
        FROM recipe_tags rt
        INNER JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id IN (",
    );
    let mut separated = query.separated(", ");
    for id in recipe_ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(") ORDER BY t.name");

    let list: Vec<LinkedRecipeTag> = query.build_query_as().fetch_all(pool).await?;

    Ok(list)
}
