use foodgram::{
    actions::{
        add_to_favorites, add_to_shopping_cart, listed_among, remove_from_favorites,
        remove_from_shopping_cart, RecipeList,
    },
    Error,
};

use crate::util::TestContext;

/// Tests that a second favorite of the same recipe is refused.
///
/// Expected: Ok with the short projection first, Err(Conflict) second
#[tokio::test]
async fn favorite_twice_conflicts() -> Result<(), Error> {
    let test = TestContext::new().await?;
    let author = test.user("chef").await?;
    let tag = test.tag("dinner").await?;
    let eggs = test.ingredient("Eggs", "pcs").await?;
    let id = test.recipe(&author, "Eggs", &[(eggs.id, 2)], &[tag.id]).await?;

    let short = add_to_favorites(author.id, id, &test.pool).await?;
    assert_eq!(short.id, id);
    assert_eq!(short.name, "Eggs");
    assert_eq!(short.cooking_time, 30);

    match add_to_favorites(author.id, id, &test.pool).await {
        Err(Error::Conflict(message)) => assert_eq!(message, "Recipe is already in favorites."),
        other => panic!("expected conflict, got {other:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn removing_absent_favorite_fails() -> Result<(), Error> {
    let test = TestContext::new().await?;
    let author = test.user("chef").await?;
    let tag = test.tag("dinner").await?;
    let eggs = test.ingredient("Eggs", "pcs").await?;
    let id = test.recipe(&author, "Eggs", &[(eggs.id, 2)], &[tag.id]).await?;

    assert!(matches!(
        remove_from_favorites(author.id, id, &test.pool).await,
        Err(Error::NotFound(_))
    ));

    add_to_favorites(author.id, id, &test.pool).await?;
    remove_from_favorites(author.id, id, &test.pool).await?;
    assert!(matches!(
        remove_from_favorites(author.id, id, &test.pool).await,
        Err(Error::NotFound(_))
    ));

    Ok(())
}

#[tokio::test]
async fn missing_recipe_is_not_found() -> Result<(), Error> {
    let test = TestContext::new().await?;
    let user = test.user("reader").await?;

    assert!(matches!(
        add_to_favorites(user.id, 999, &test.pool).await,
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        add_to_shopping_cart(user.id, 999, &test.pool).await,
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        remove_from_shopping_cart(user.id, 999, &test.pool).await,
        Err(Error::NotFound(_))
    ));

    Ok(())
}

#[tokio::test]
async fn lists_are_independent() -> Result<(), Error> {
    let test = TestContext::new().await?;
    let author = test.user("chef").await?;
    let reader = test.user("reader").await?;
    let tag = test.tag("dinner").await?;
    let eggs = test.ingredient("Eggs", "pcs").await?;
    let first = test.recipe(&author, "First", &[(eggs.id, 1)], &[tag.id]).await?;
    let second = test.recipe(&author, "Second", &[(eggs.id, 2)], &[tag.id]).await?;

    add_to_shopping_cart(reader.id, first, &test.pool).await?;
    add_to_favorites(reader.id, second, &test.pool).await?;
    add_to_shopping_cart(author.id, second, &test.pool).await?;

    let cart = listed_among(RecipeList::ShoppingCart, reader.id, &[first, second], &test.pool).await?;
    assert!(cart.contains(&first));
    assert!(!cart.contains(&second));

    let favorites = listed_among(RecipeList::Favorites, reader.id, &[first, second], &test.pool).await?;
    assert_eq!(favorites.len(), 1);
    assert!(favorites.contains(&second));

    match add_to_shopping_cart(reader.id, first, &test.pool).await {
        Err(Error::Conflict(message)) => {
            assert_eq!(message, "Recipe is already in shopping cart.")
        }
        other => panic!("expected conflict, got {other:?}"),
    }

    Ok(())
}
