use std::collections::HashSet;

use serde::Deserialize;
use sqlx::{Pool, Sqlite};

use crate::{
    actions::{missing_ingredient_ids, missing_tag_ids},
    constants::{
        MAX_AMOUNT, MAX_COOKING_TIME, MAX_LEN_EMAIL, MAX_LEN_NAME, MAX_LEN_PASSWORD,
        MAX_LEN_RECIPE_NAME, MAX_LEN_TITLE, MIN_AMOUNT, MIN_COOKING_TIME,
    },
    error::{Error, FieldErrors},
    schema::Id,
};

const REQUIRED: &str = "This field is required.";
const BLANK: &str = "This field may not be blank.";

#[derive(Deserialize, Debug, Default, Clone)]
pub struct IngredientAmountForm {
    pub id: Id,
    pub amount: i64,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct RecipeForm {
    pub name: Option<String>,
    pub image: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i64>,
    pub ingredients: Option<Vec<IngredientAmountForm>>,
    pub tags: Option<Vec<Id>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Create,
    Update,
}

/// A recipe payload that passed validation; every referenced id exists.
#[derive(Debug, Clone)]
pub struct RecipeDraft {
    pub name: String,
    /// `None` on update keeps the stored image.
    pub image: Option<String>,
    pub text: String,
    pub cooking_time: i64,
    pub ingredients: Vec<(Id, i64)>,
    pub tags: Vec<Id>,
}

fn check_text(errors: &mut FieldErrors, field: &str, value: Option<&str>, max_len: usize) {
    match value.map(str::trim) {
        None => errors.add(field, REQUIRED),
        Some("") => errors.add(field, BLANK),
        Some(v) if v.chars().count() > max_len => errors.add(
            field,
            &format!("Ensure this field has no more than {max_len} characters."),
        ),
        Some(_) => {}
    }
}

fn check_range(errors: &mut FieldErrors, field: &str, value: i64, min: i64, max: i64) {
    if value < min {
        errors.add(
            field,
            &format!("Ensure this value is greater than or equal to {min}."),
        );
    } else if value > max {
        errors.add(
            field,
            &format!("Ensure this value is less than or equal to {max}."),
        );
    }
}

/// Field checks that need no database access.
pub fn check_recipe(form: &RecipeForm, mode: WriteMode) -> FieldErrors {
    let mut errors = FieldErrors::default();

    check_text(&mut errors, "name", form.name.as_deref(), MAX_LEN_RECIPE_NAME);

    if form.text.is_none() {
        errors.add("text", REQUIRED);
    }

    match form.cooking_time {
        None => errors.add("cooking_time", REQUIRED),
        Some(time) => check_range(
            &mut errors,
            "cooking_time",
            time,
            MIN_COOKING_TIME,
            MAX_COOKING_TIME,
        ),
    }

    match &form.ingredients {
        None => errors.add("ingredients", REQUIRED),
        Some(ingredients) if ingredients.is_empty() => {
            errors.add("ingredients", "Add at least one ingredient.")
        }
        Some(ingredients) => {
            let unique: HashSet<Id> = ingredients.iter().map(|i| i.id).collect();
            if unique.len() != ingredients.len() {
                errors.add("ingredients", "Ingredients must not repeat.");
            }
            for ingredient in ingredients {
                check_range(
                    &mut errors,
                    "ingredients",
                    ingredient.amount,
                    MIN_AMOUNT,
                    MAX_AMOUNT,
                );
            }
        }
    }

    match &form.tags {
        None => errors.add("tags", REQUIRED),
        Some(tags) if tags.is_empty() => errors.add("tags", "Add at least one tag."),
        Some(tags) => {
            let unique: HashSet<Id> = tags.iter().copied().collect();
            if unique.len() != tags.len() {
                errors.add("tags", "Tags must not repeat.");
            }
        }
    }

    match (mode, form.image.as_deref().map(str::trim)) {
        (WriteMode::Create, None) => errors.add("image", REQUIRED),
        (_, Some("")) => errors.add("image", "The image field may not be empty."),
        _ => {}
    }

    errors
}

pub async fn validate_recipe(
    form: RecipeForm,
    mode: WriteMode,
    pool: &Pool<Sqlite>,
) -> Result<RecipeDraft, Error> {
    let mut errors = check_recipe(&form, mode);

    let ingredient_ids: Vec<Id> = form
        .ingredients
        .iter()
        .flatten()
        .map(|ingredient| ingredient.id)
        .collect();
    for id in missing_ingredient_ids(&ingredient_ids, pool).await? {
        errors.add("ingredients", &format!("Ingredient {id} does not exist."));
    }

    let tag_ids: Vec<Id> = form.tags.iter().flatten().copied().collect();
    for id in missing_tag_ids(&tag_ids, pool).await? {
        errors.add("tags", &format!("Tag {id} does not exist."));
    }

    errors.into_result()?;

    match (form.name, form.text, form.cooking_time, form.ingredients, form.tags) {
        (Some(name), Some(text), Some(cooking_time), Some(ingredients), Some(tags)) => {
            Ok(RecipeDraft {
                name: name.trim().to_owned(),
                image: form.image.map(|image| image.trim().to_owned()),
                text: text.trim().to_owned(),
                cooking_time,
                ingredients: ingredients.into_iter().map(|i| (i.id, i.amount)).collect(),
                tags,
            })
        }
        _ => Err(Error::validation("non_field_errors", "Invalid data.")),
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct RegisterForm {
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

/// `^[a-zA-Z0-9]+([_.-]?[a-zA-Z0-9])*$`: separators only between
/// alphanumerics, never doubled, never leading or trailing.
pub fn is_valid_username(username: &str) -> bool {
    let mut previous_separator = true;
    for c in username.chars() {
        if c.is_ascii_alphanumeric() {
            previous_separator = false;
        } else if matches!(c, '_' | '.' | '-') && !previous_separator {
            previous_separator = true;
        } else {
            return false;
        }
    }
    !username.is_empty() && !previous_separator
}

fn check_new_password(errors: &mut FieldErrors, field: &str, password: Option<&str>) {
    match password {
        None => errors.add(field, REQUIRED),
        Some("") => errors.add(field, BLANK),
        Some(p) if p.chars().count() < 8 => errors.add(
            field,
            "This password is too short. It must contain at least 8 characters.",
        ),
        Some(p) if p.chars().count() > MAX_LEN_PASSWORD => errors.add(
            field,
            &format!("Ensure this field has no more than {MAX_LEN_PASSWORD} characters."),
        ),
        Some(p) if p.chars().all(|c| c.is_ascii_digit()) => {
            errors.add(field, "This password is entirely numeric.")
        }
        Some(_) => {}
    }
}

pub fn validate_registration(form: RegisterForm) -> Result<NewUser, Error> {
    let mut errors = FieldErrors::default();

    check_text(&mut errors, "email", form.email.as_deref(), MAX_LEN_EMAIL);
    if let Some(email) = form.email.as_deref().map(str::trim) {
        if !email.is_empty() && !is_valid_email(email) {
            errors.add("email", "Enter a valid email address.");
        }
    }

    check_text(&mut errors, "username", form.username.as_deref(), MAX_LEN_NAME);
    if let Some(username) = form.username.as_deref().map(str::trim) {
        if !username.is_empty() && !is_valid_username(username) {
            errors.add(
                "username",
                "Username may contain only letters, digits and the separators -, . and _ between them.",
            );
        }
    }

    check_text(&mut errors, "first_name", form.first_name.as_deref(), MAX_LEN_NAME);
    check_text(&mut errors, "last_name", form.last_name.as_deref(), MAX_LEN_NAME);
    check_new_password(&mut errors, "password", form.password.as_deref());

    errors.into_result()?;

    match (form.email, form.username, form.first_name, form.last_name, form.password) {
        (Some(email), Some(username), Some(first_name), Some(last_name), Some(password)) => {
            Ok(NewUser {
                email: email.trim().to_owned(),
                username: username.trim().to_owned(),
                first_name: first_name.trim().to_owned(),
                last_name: last_name.trim().to_owned(),
                password,
            })
        }
        _ => Err(Error::validation("non_field_errors", "Invalid data.")),
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct LoginForm {
    pub email: Option<String>,
    pub password: Option<String>,
}

pub fn validate_login(form: LoginForm) -> Result<(String, String), Error> {
    let mut errors = FieldErrors::default();
    check_text(&mut errors, "email", form.email.as_deref(), MAX_LEN_EMAIL);
    if form.password.as_deref().map_or(true, str::is_empty) {
        errors.add("password", REQUIRED);
    }
    errors.into_result()?;

    match (form.email, form.password) {
        (Some(email), Some(password)) => Ok((email.trim().to_owned(), password)),
        _ => Err(Error::validation("non_field_errors", "Invalid data.")),
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct PasswordForm {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

pub fn validate_password(form: PasswordForm) -> Result<(String, String), Error> {
    let mut errors = FieldErrors::default();
    if form.current_password.as_deref().map_or(true, str::is_empty) {
        errors.add("current_password", REQUIRED);
    }
    check_new_password(&mut errors, "new_password", form.new_password.as_deref());
    errors.into_result()?;

    match (form.current_password, form.new_password) {
        (Some(current), Some(new)) => Ok((current, new)),
        _ => Err(Error::validation("non_field_errors", "Invalid data.")),
    }
}

/// `^#[0-9A-Fa-f]{3,6}$`
pub fn is_valid_color(color: &str) -> bool {
    match color.strip_prefix('#') {
        Some(hex) => (3..=6).contains(&hex.len()) && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

pub fn validate_tag(name: &str, color: &str, slug: &str) -> Result<(), Error> {
    let mut errors = FieldErrors::default();
    check_text(&mut errors, "name", Some(name), MAX_LEN_TITLE);
    if !is_valid_color(color) {
        errors.add("color", "Enter a valid HEX color, e.g. #49B64E.");
    }
    check_text(&mut errors, "slug", Some(slug), MAX_LEN_TITLE);
    if !slug.is_empty() && !is_valid_slug(slug) {
        errors.add("slug", "Enter a valid slug.");
    }
    errors.into_result()
}

pub fn validate_ingredient(name: &str, measurement_unit: &str) -> Result<(), Error> {
    let mut errors = FieldErrors::default();
    check_text(&mut errors, "name", Some(name), MAX_LEN_TITLE);
    check_text(&mut errors, "measurement_unit", Some(measurement_unit), MAX_LEN_TITLE);
    errors.into_result()
}
