use sqlx::{Pool, Sqlite};

use crate::{
    error::Error,
    schema::{Id, ShoppingListItem},
};

/// Sums every ingredient line across the user's cart, one row per
/// (name, unit) pair, ordered by name.
pub async fn shopping_list(user_id: Id, pool: &Pool<Sqlite>) -> Result<Vec<ShoppingListItem>, Error> {
    let rows: Vec<ShoppingListItem> = sqlx::query_as(
        "
        SELECT i.name AS name, i.measurement_unit AS measurement_unit, SUM(ri.amount) AS amount
        FROM shopping_cart c
        INNER JOIN recipe_ingredients ri ON ri.recipe_id = c.recipe_id
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE c.user_id = ?
        GROUP BY i.name, i.measurement_unit
        ORDER BY i.name, i.measurement_unit
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub fn render_shopping_list(items: &[ShoppingListItem]) -> String {
    items
        .iter()
        .map(|item| format!("{}\t{}\t{}", item.name, item.measurement_unit, item.amount))
        .collect::<Vec<String>>()
        .join("\n")
}
