use foodgram::{
    actions::{create_ingredient, create_tag, get_ingredient, list_ingredients, list_tags},
    seed::{load_ingredients, load_tags, IngredientSeed, TagSeed},
    Error,
};

use crate::util::TestContext;

#[tokio::test]
async fn ingredient_search_is_case_insensitive_prefix() -> Result<(), Error> {
    let test = TestContext::new().await?;
    for (name, unit) in [("Sugar", "g"), ("sugar syrup", "ml"), ("Brown sugar", "g")] {
        test.ingredient(name, unit).await?;
    }

    let found = list_ingredients(Some("SUG"), &test.pool).await?;
    let names: Vec<&str> = found.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"Sugar"));
    assert!(names.contains(&"sugar syrup"));

    assert_eq!(list_ingredients(None, &test.pool).await?.len(), 3);
    assert_eq!(list_ingredients(Some("%"), &test.pool).await?.len(), 0);

    Ok(())
}

#[tokio::test]
async fn ingredient_search_folds_cyrillic() -> Result<(), Error> {
    let test = TestContext::new().await?;
    test.ingredient("Яйца", "шт").await?;
    test.ingredient("Eggs", "pcs").await?;

    for prefix in ["яй", "ЯЙ", "Яй"] {
        let found = list_ingredients(Some(prefix), &test.pool).await?;
        assert_eq!(found.len(), 1, "prefix {prefix}");
        assert_eq!(found[0].name, "Яйца");
    }
    assert_eq!(list_ingredients(Some("eg"), &test.pool).await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn catalog_creation_is_get_or_create() -> Result<(), Error> {
    let test = TestContext::new().await?;

    let first = create_ingredient("Salt", "g", &test.pool).await?;
    let again = create_ingredient("Salt", "g", &test.pool).await?;
    let other_unit = create_ingredient("Salt", "pinch", &test.pool).await?;
    assert_eq!(first, again);
    assert_ne!(first.id, other_unit.id);
    assert_eq!(get_ingredient(first.id, &test.pool).await?, Some(first));

    let tag = create_tag("Lunch", "#49B64E", "lunch", &test.pool).await?;
    let same = create_tag("Lunch", "#49B64E", "lunch", &test.pool).await?;
    assert_eq!(tag, same);

    assert!(matches!(
        create_tag("Bad", "green", "bad", &test.pool).await,
        Err(Error::Validation(e)) if e.contains("color")
    ));

    Ok(())
}

/// Tests loading seed records twice.
///
/// Expected: second load adds no rows
#[tokio::test]
async fn seeds_load_idempotently() -> Result<(), Error> {
    let test = TestContext::new().await?;

    for _ in 0..2 {
        let ingredients: Vec<IngredientSeed> = serde_json::from_str(
            r#"[{"name": "Flour", "measurement_unit": "g"}, {"name": "Milk", "measurement_unit": "ml"}]"#,
        )?;
        assert_eq!(load_ingredients(ingredients, &test.pool).await?, 2);

        let tags: Vec<TagSeed> = serde_json::from_str(
            r##"[{"name": "Breakfast", "color": "#E26C2D", "slug": "breakfast"}]"##,
        )?;
        assert_eq!(load_tags(tags, &test.pool).await?, 1);
    }

    assert_eq!(list_ingredients(None, &test.pool).await?.len(), 2);
    assert_eq!(list_tags(&test.pool).await?.len(), 1);

    Ok(())
}
