//! Shared fixtures: an in-memory database with the schema applied and
//! helpers that insert users, catalog entries and recipes through the
//! same actions the server uses.

use foodgram::{
    actions::{create_ingredient, create_recipe, create_tag, get_user, register_user, set_user_role},
    api::state::AppState,
    jwt::generate_jwt_session,
    pool::connect_in_memory,
    schema::{Id, Ingredient, Tag, User, UserRole},
    validation::{validate_recipe, IngredientAmountForm, RecipeForm, RegisterForm, WriteMode},
    Config, Error,
};
use sqlx::{Pool, Sqlite};

pub const SECRET: &str = "test-secret";
pub const PASSWORD: &str = "correct-horse-battery";

pub struct TestContext {
    pub pool: Pool<Sqlite>,
    pub state: AppState,
}

impl TestContext {
    pub async fn new() -> Result<Self, Error> {
        let pool = connect_in_memory().await?;
        let state = AppState::new(pool.clone(), None, Config::with_secret(SECRET));

        Ok(Self { pool, state })
    }

    pub async fn user(&self, username: &str) -> Result<User, Error> {
        register_user(
            RegisterForm {
                email: Some(format!("{username}@example.com")),
                username: Some(username.to_owned()),
                first_name: Some("Test".to_owned()),
                last_name: Some("User".to_owned()),
                password: Some(PASSWORD.to_owned()),
            },
            &self.pool,
        )
        .await
    }

    pub async fn admin(&self, username: &str) -> Result<User, Error> {
        let user = self.user(username).await?;
        set_user_role(user.id, UserRole::Admin, &self.pool).await?;

        get_user(user.id, &self.pool).await
    }

    /// Tag names and colors are unique, so both derive from the slug.
    pub async fn tag(&self, slug: &str) -> Result<Tag, Error> {
        create_tag(&slug.to_uppercase(), &tag_color(slug), slug, &self.pool).await
    }

    pub async fn ingredient(&self, name: &str, unit: &str) -> Result<Ingredient, Error> {
        create_ingredient(name, unit, &self.pool).await
    }

    pub async fn recipe(
        &self,
        author: &User,
        name: &str,
        ingredients: &[(Id, i64)],
        tags: &[Id],
    ) -> Result<Id, Error> {
        let draft = validate_recipe(
            recipe_form(name, ingredients, tags),
            WriteMode::Create,
            &self.pool,
        )
        .await?;

        create_recipe(author.id, draft, &self.pool).await
    }

    pub fn token(&self, user: &User) -> String {
        generate_jwt_session(user, SECRET, chrono::Duration::hours(1)).unwrap()
    }

    pub fn auth_header(&self, user: &User) -> String {
        format!("Token {}", self.token(user))
    }
}

pub fn tag_color(slug: &str) -> String {
    let hex: String = slug.bytes().take(3).map(|b| format!("{b:02X}")).collect();
    format!("#{hex}")
}

pub fn recipe_form(name: &str, ingredients: &[(Id, i64)], tags: &[Id]) -> RecipeForm {
    RecipeForm {
        name: Some(name.to_owned()),
        image: Some("data:image/png;base64,iVBORw0KGgo=".to_owned()),
        text: Some("Mix everything and bake.".to_owned()),
        cooking_time: Some(30),
        ingredients: Some(
            ingredients
                .iter()
                .map(|(id, amount)| IngredientAmountForm {
                    id: *id,
                    amount: *amount,
                })
                .collect(),
        ),
        tags: Some(tags.to_vec()),
    }
}
