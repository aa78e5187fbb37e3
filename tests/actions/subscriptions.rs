use foodgram::{
    actions::{is_subscribed, list_subscriptions, subscribe, unsubscribe, user_view},
    pagination::PageRequest,
    Error,
};

use crate::util::TestContext;

/// Tests that following oneself is refused.
///
/// Expected: Err(Validation), no edge stored
#[tokio::test]
async fn cannot_subscribe_to_self() -> Result<(), Error> {
    let test = TestContext::new().await?;
    let user = test.user("chef").await?;

    assert!(matches!(
        subscribe(user.id, user.id, &test.pool).await,
        Err(Error::Validation(_))
    ));
    assert!(!is_subscribed(user.id, user.id, &test.pool).await?);

    Ok(())
}

#[tokio::test]
async fn subscribing_twice_conflicts() -> Result<(), Error> {
    let test = TestContext::new().await?;
    let chef = test.user("chef").await?;
    let reader = test.user("reader").await?;

    let author = subscribe(reader.id, chef.id, &test.pool).await?;
    assert_eq!(author.id, chef.id);
    assert!(is_subscribed(reader.id, chef.id, &test.pool).await?);
    assert!(!is_subscribed(chef.id, reader.id, &test.pool).await?);

    assert!(matches!(
        subscribe(reader.id, chef.id, &test.pool).await,
        Err(Error::Conflict(_))
    ));

    Ok(())
}

#[tokio::test]
async fn unknown_author_is_not_found() -> Result<(), Error> {
    let test = TestContext::new().await?;
    let reader = test.user("reader").await?;

    assert!(matches!(
        subscribe(reader.id, 999, &test.pool).await,
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        unsubscribe(reader.id, 999, &test.pool).await,
        Err(Error::NotFound(_))
    ));

    Ok(())
}

#[tokio::test]
async fn unsubscribe_requires_edge() -> Result<(), Error> {
    let test = TestContext::new().await?;
    let chef = test.user("chef").await?;
    let reader = test.user("reader").await?;

    assert!(matches!(
        unsubscribe(reader.id, chef.id, &test.pool).await,
        Err(Error::NotFound(_))
    ));

    subscribe(reader.id, chef.id, &test.pool).await?;
    unsubscribe(reader.id, chef.id, &test.pool).await?;
    assert!(!is_subscribed(reader.id, chef.id, &test.pool).await?);

    Ok(())
}

/// Tests the followed-authors listing with a capped recipe preview.
///
/// Expected: one author card, two previews out of three recipes, count 3
#[tokio::test]
async fn listing_caps_recipe_preview() -> Result<(), Error> {
    let test = TestContext::new().await?;
    let chef = test.user("chef").await?;
    let reader = test.user("reader").await?;
    let tag = test.tag("dinner").await?;
    let eggs = test.ingredient("Eggs", "pcs").await?;
    for name in ["One", "Two", "Three"] {
        test.recipe(&chef, name, &[(eggs.id, 1)], &[tag.id]).await?;
    }

    subscribe(reader.id, chef.id, &test.pool).await?;

    let page = list_subscriptions(reader.id, PageRequest::new(1, 6), Some(2), &test.pool).await?;
    assert_eq!(page.count, 1);
    let card = &page.results[0];
    assert_eq!(card.author.id, chef.id);
    assert!(card.author.is_subscribed);
    assert_eq!(card.recipes.len(), 2);
    assert_eq!(card.recipes_count, 3);

    let page = list_subscriptions(reader.id, PageRequest::new(1, 6), None, &test.pool).await?;
    assert_eq!(page.results[0].recipes.len(), 3);

    let view = user_view(Some(reader.id), &chef, &test.pool).await?;
    assert!(view.is_subscribed);
    let view = user_view(None, &chef, &test.pool).await?;
    assert!(!view.is_subscribed);

    Ok(())
}
