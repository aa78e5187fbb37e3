use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type Id = i64;

#[derive(Clone, Debug, PartialEq, sqlx::Type, Serialize, Eq, Hash, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Admin,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct User {
    pub id: Id,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub role: UserRole,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct UserRow {
    pub id: Id,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub role: UserRole,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,

    pub count: i64,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            password: row.password,
            role: row.role,
            is_active: row.is_active,
            date_joined: row.date_joined,
        }
    }
}

/// Public projection of a user as seen by `viewer`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserView {
    pub email: String,
    pub id: Id,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl UserView {
    pub fn from_user(user: &User, is_subscribed: bool) -> Self {
        Self {
            email: user.email.to_owned(),
            id: user.id,
            username: user.username.to_owned(),
            first_name: user.first_name.to_owned(),
            last_name: user.last_name.to_owned(),
            is_subscribed,
        }
    }
}

/// Returned once on registration; no subscription flag.
#[derive(Debug, Clone, Serialize)]
pub struct RegisteredUser {
    pub email: String,
    pub id: Id,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<&User> for RegisteredUser {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.to_owned(),
            id: user.id,
            username: user.username.to_owned(),
            first_name: user.first_name.to_owned(),
            last_name: user.last_name.to_owned(),
        }
    }
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tag {
    pub id: Id,
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct LinkedRecipeTag {
    pub recipe_id: Id,
    pub id: Id,
    pub name: String,
    pub color: String,
    pub slug: String,
}

impl From<LinkedRecipeTag> for Tag {
    fn from(value: LinkedRecipeTag) -> Self {
        Self {
            id: value.id,
            name: value.name,
            color: value.color,
            slug: value.slug,
        }
    }
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ingredient {
    pub id: Id,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct Recipe {
    pub id: Id,
    pub author_id: Id,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i64,
    pub pub_date: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct RecipeRow {
    pub id: Id,
    pub author_id: Id,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i64,
    pub pub_date: DateTime<Utc>,

    pub count: i64,
}

impl From<RecipeRow> for Recipe {
    fn from(row: RecipeRow) -> Self {
        Self {
            id: row.id,
            author_id: row.author_id,
            name: row.name,
            image: row.image,
            text: row.text,
            cooking_time: row.cooking_time,
            pub_date: row.pub_date,
        }
    }
}

/// One ingredient line of a recipe, joined with its catalog entry.
#[derive(sqlx::FromRow, Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RecipePart {
    #[serde(skip)]
    pub recipe_id: Id,
    pub id: Id,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RecipeShort {
    pub id: Id,
    pub name: String,
    pub image: String,
    pub cooking_time: i64,
}

impl From<&Recipe> for RecipeShort {
    fn from(recipe: &Recipe) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name.to_owned(),
            image: recipe.image.to_owned(),
            cooking_time: recipe.cooking_time,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeView {
    pub id: Id,
    pub tags: Vec<Tag>,
    pub author: UserView,
    pub ingredients: Vec<RecipePart>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionView {
    #[serde(flatten)]
    pub author: UserView,
    pub recipes: Vec<RecipeShort>,
    pub recipes_count: i64,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ShoppingListItem {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}
