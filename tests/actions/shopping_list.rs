use foodgram::{
    actions::{add_to_shopping_cart, render_shopping_list, shopping_list},
    Error,
};

use crate::util::TestContext;

/// Tests that the same ingredient across cart recipes is summed.
///
/// Expected: "Eggs, pcs" 2 + 3 becomes one line of 5
#[tokio::test]
async fn sums_amounts_per_ingredient() -> Result<(), Error> {
    let test = TestContext::new().await?;
    let chef = test.user("chef").await?;
    let reader = test.user("reader").await?;
    let tag = test.tag("breakfast").await?;
    let eggs = test.ingredient("Eggs", "pcs").await?;
    let flour = test.ingredient("Flour", "g").await?;

    let omelette = test.recipe(&chef, "Omelette", &[(eggs.id, 2)], &[tag.id]).await?;
    let pancakes = test
        .recipe(&chef, "Pancakes", &[(eggs.id, 3), (flour.id, 200)], &[tag.id])
        .await?;
    let _ignored = test.recipe(&chef, "Not in cart", &[(eggs.id, 10)], &[tag.id]).await?;

    add_to_shopping_cart(reader.id, omelette, &test.pool).await?;
    add_to_shopping_cart(reader.id, pancakes, &test.pool).await?;

    let items = shopping_list(reader.id, &test.pool).await?;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].name, "Eggs");
    assert_eq!(items[0].measurement_unit, "pcs");
    assert_eq!(items[0].amount, 5);
    assert_eq!(items[1].name, "Flour");
    assert_eq!(items[1].amount, 200);

    assert_eq!(render_shopping_list(&items), "Eggs\tpcs\t5\nFlour\tg\t200");

    Ok(())
}

#[tokio::test]
async fn empty_cart_gives_empty_list() -> Result<(), Error> {
    let test = TestContext::new().await?;
    let reader = test.user("reader").await?;

    assert!(shopping_list(reader.id, &test.pool).await?.is_empty());

    Ok(())
}
