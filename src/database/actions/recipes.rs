use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sqlx::{Pool, QueryBuilder, Sqlite, Transaction};

use crate::{
    error::Error,
    pagination::{Page, PageRequest},
    schema::{Id, Recipe, RecipePart, RecipeRow, RecipeShort, RecipeView, Tag, UserView},
    validation::RecipeDraft,
};

use super::{
    get_users_by_ids, list_recipe_parts, list_recipe_tags, listed_among, subscribed_among,
    RecipeList,
};

/// Listing filters; the relation flags only apply to a known viewer.
/// `author` matches a username or a numeric user id.
#[derive(Debug, Default, Clone)]
pub struct RecipeFilter {
    pub tags: Vec<String>,
    pub author: Option<String>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

pub async fn create_recipe(
    author_id: Id,
    draft: RecipeDraft,
    pool: &Pool<Sqlite>,
) -> Result<Id, Error> {
    let image = draft
        .image
        .ok_or_else(|| Error::validation("image", "This field is required."))?;

    let mut tr = pool.begin().await?;

    let recipe: (Id,) = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, image, text, cooking_time, pub_date)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING id
    ",
    )
    .bind(author_id)
    .bind(&draft.name)
    .bind(image)
    .bind(&draft.text)
    .bind(draft.cooking_time)
    .bind(Utc::now())
    .fetch_one(&mut *tr)
    .await?;

    let recipe_id = recipe.0;
    replace_recipe_links(&mut tr, recipe_id, &draft.tags, &draft.ingredients).await?;

    tr.commit().await?;
    log::debug!("Recipe {recipe_id} created by user {author_id}");

    Ok(recipe_id)
}

/// Rewrites the recipe row and replaces its whole tag set and ingredient
/// list in one transaction.
pub async fn update_recipe(
    recipe_id: Id,
    draft: RecipeDraft,
    pool: &Pool<Sqlite>,
) -> Result<(), Error> {
    let mut tr = pool.begin().await?;

    let result = sqlx::query(
        "
        UPDATE recipes
        SET name = ?, text = ?, cooking_time = ?, image = COALESCE(?, image)
        WHERE id = ?
    ",
    )
    .bind(&draft.name)
    .bind(&draft.text)
    .bind(draft.cooking_time)
    .bind(draft.image.as_deref())
    .bind(recipe_id)
    .execute(&mut *tr)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::not_found("Recipe not found."));
    }

    replace_recipe_links(&mut tr, recipe_id, &draft.tags, &draft.ingredients).await?;

    tr.commit().await?;
    log::debug!("Recipe {recipe_id} updated");

    Ok(())
}

async fn replace_recipe_links(
    tr: &mut Transaction<'_, Sqlite>,
    recipe_id: Id,
    tags: &[Id],
    ingredients: &[(Id, i64)],
) -> Result<(), Error> {
    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = ?")
        .bind(recipe_id)
        .execute(&mut **tr)
        .await?;

    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = ?")
        .bind(recipe_id)
        .execute(&mut **tr)
        .await?;

    if !tags.is_empty() {
        let mut query = QueryBuilder::<Sqlite>::new("INSERT INTO recipe_tags (recipe_id, tag_id) ");
        query.push_values(tags, |mut row, tag_id| {
            row.push_bind(recipe_id).push_bind(*tag_id);
        });
        query.build().execute(&mut **tr).await?;
    }

    if !ingredients.is_empty() {
        let mut query = QueryBuilder::<Sqlite>::new(
            "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ",
        );
        query.push_values(ingredients, |mut row, (ingredient_id, amount)| {
            row.push_bind(recipe_id)
                .push_bind(*ingredient_id)
                .push_bind(*amount);
        });
        query.build().execute(&mut **tr).await?;
    }

    Ok(())
}

/// Deletes the recipe; ingredient lines, tag links, favorites and cart
/// entries go with it through the foreign keys.
pub async fn delete_recipe(recipe_id: Id, pool: &Pool<Sqlite>) -> Result<(), Error> {
    let result = sqlx::query("DELETE FROM recipes WHERE id = ?")
        .bind(recipe_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::not_found("Recipe not found."));
    }
    log::debug!("Recipe {recipe_id} deleted");

    Ok(())
}

pub async fn get_recipe(id: Id, pool: &Pool<Sqlite>) -> Result<Option<Recipe>, Error> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn get_recipe_or_404(id: Id, pool: &Pool<Sqlite>) -> Result<Recipe, Error> {
    get_recipe(id, pool)
        .await?
        .ok_or_else(|| Error::not_found("Recipe not found."))
}

pub async fn fetch_recipes(
    filter: &RecipeFilter,
    viewer: Option<Id>,
    request: PageRequest,
    pool: &Pool<Sqlite>,
) -> Result<Page<RecipeView>, Error> {
    let mut query =
        QueryBuilder::<Sqlite>::new("SELECT r.*, COUNT(*) OVER() AS count FROM recipes r WHERE 1 = 1");
    push_recipe_filters(&mut query, filter, viewer);
    query
        .push(" ORDER BY r.pub_date DESC, r.id DESC LIMIT ")
        .push_bind(request.limit)
        .push(" OFFSET ")
        .push_bind(request.offset());

    let rows: Vec<RecipeRow> = query.build_query_as().fetch_all(pool).await?;

    let total_count = match rows.first() {
        Some(row) => row.count,
        None if request.page > 1 => count_recipes(filter, viewer, pool).await?,
        None => 0,
    };
    let recipes: Vec<Recipe> = rows.into_iter().map(Recipe::from).collect();
    let views = load_recipe_views(recipes, viewer, pool).await?;

    Ok(Page::from_rows(views, total_count, request))
}

async fn count_recipes(
    filter: &RecipeFilter,
    viewer: Option<Id>,
    pool: &Pool<Sqlite>,
) -> Result<i64, Error> {
    let mut query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM recipes r WHERE 1 = 1");
    push_recipe_filters(&mut query, filter, viewer);

    let count: (i64,) = query.build_query_as().fetch_one(pool).await?;
    Ok(count.0)
}

fn push_recipe_filters(
    query: &mut QueryBuilder<'_, Sqlite>,
    filter: &RecipeFilter,
    viewer: Option<Id>,
) {
    if let Some(author) = &filter.author {
        query
            .push(" AND r.author_id IN (SELECT id FROM users WHERE username = ")
            .push_bind(author.to_owned())
            .push(" OR CAST(id AS TEXT) = ")
            .push_bind(author.to_owned())
            .push(")");
    }

    if !filter.tags.is_empty() {
        query.push(
            " AND EXISTS (SELECT 1 FROM recipe_tags rt INNER JOIN tags t ON t.id = rt.tag_id WHERE rt.recipe_id = r.id AND t.slug IN (",
        );
        let mut separated = query.separated(", ");
        for slug in &filter.tags {
            separated.push_bind(slug.to_owned());
        }
        separated.push_unseparated("))");
    }

    // Relation filters mean nothing without a viewer.
    if let Some(viewer) = viewer {
        if filter.is_favorited {
            query
                .push(" AND EXISTS (SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = ")
                .push_bind(viewer)
                .push(")");
        }
        if filter.is_in_shopping_cart {
            query
                .push(" AND EXISTS (SELECT 1 FROM shopping_cart c WHERE c.recipe_id = r.id AND c.user_id = ")
                .push_bind(viewer)
                .push(")");
        }
    }
}

/// Builds full projections for `recipes`, batching every lookup.
pub async fn load_recipe_views(
    recipes: Vec<Recipe>,
    viewer: Option<Id>,
    pool: &Pool<Sqlite>,
) -> Result<Vec<RecipeView>, Error> {
    if recipes.is_empty() {
        return Ok(vec![]);
    }

    let recipe_ids: Vec<Id> = recipes.iter().map(|recipe| recipe.id).collect();
    let author_ids: Vec<Id> = recipes
        .iter()
        .map(|recipe| recipe.author_id)
        .collect::<HashSet<Id>>()
        .into_iter()
        .collect();

    let mut tags: HashMap<Id, Vec<Tag>> = HashMap::new();
    for tag in list_recipe_tags(&recipe_ids, pool).await? {
        tags.entry(tag.recipe_id).or_default().push(tag.into());
    }

    let mut parts: HashMap<Id, Vec<RecipePart>> = HashMap::new();
    for part in list_recipe_parts(&recipe_ids, pool).await? {
        parts.entry(part.recipe_id).or_default().push(part);
    }

    let authors = get_users_by_ids(&author_ids, pool).await?;

    let (subscribed, favorited, in_cart) = match viewer {
        Some(viewer) => (
            subscribed_among(viewer, &author_ids, pool).await?,
            listed_among(RecipeList::Favorites, viewer, &recipe_ids, pool).await?,
            listed_among(RecipeList::ShoppingCart, viewer, &recipe_ids, pool).await?,
        ),
        None => (HashSet::new(), HashSet::new(), HashSet::new()),
    };

    recipes
        .into_iter()
        .map(|recipe| {
            let author = authors.get(&recipe.author_id).ok_or_else(|| {
                Error::Internal(format!("Author of recipe {} is missing", recipe.id))
            })?;

            Ok(RecipeView {
                id: recipe.id,
                tags: tags.remove(&recipe.id).unwrap_or_default(),
                author: UserView::from_user(author, subscribed.contains(&author.id)),
                ingredients: parts.remove(&recipe.id).unwrap_or_default(),
                is_favorited: favorited.contains(&recipe.id),
                is_in_shopping_cart: in_cart.contains(&recipe.id),
                name: recipe.name,
                image: recipe.image,
                text: recipe.text,
                cooking_time: recipe.cooking_time,
            })
        })
        .collect()
}

pub async fn recipe_view(
    recipe_id: Id,
    viewer: Option<Id>,
    pool: &Pool<Sqlite>,
) -> Result<RecipeView, Error> {
    let recipe = get_recipe_or_404(recipe_id, pool).await?;

    load_recipe_views(vec![recipe], viewer, pool)
        .await?
        .pop()
        .ok_or_else(|| Error::not_found("Recipe not found."))
}

/// Newest recipes of `author_id`, at most `limit` when given.
pub async fn list_author_recipes(
    author_id: Id,
    limit: Option<i64>,
    pool: &Pool<Sqlite>,
) -> Result<Vec<RecipeShort>, Error> {
    let rows: Vec<RecipeShort> = sqlx::query_as(
        "
        SELECT id, name, image, cooking_time
        FROM recipes
        WHERE author_id = ?
        ORDER BY pub_date DESC, id DESC
        LIMIT ?
    ",
    )
    .bind(author_id)
    .bind(limit.map(|l| l.max(0)).unwrap_or(-1))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn count_author_recipes(author_id: Id, pool: &Pool<Sqlite>) -> Result<i64, Error> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipes WHERE author_id = ?")
        .bind(author_id)
        .fetch_one(pool)
        .await?;

    Ok(count.0)
}
