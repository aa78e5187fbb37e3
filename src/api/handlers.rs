use serde_json::json;
use warp::{
    http::{header, Response, StatusCode},
    reject::Rejection,
    reply, Reply,
};

use crate::{
    actions::{self, RecipeFilter},
    cache::cache::{cached, invalidate_catalog, CacheKeyType},
    constants::{RECIPE_COUNT_PER_PAGE, SHOPPING_LIST_FILENAME, USER_COUNT_PER_PAGE},
    error::Error,
    form::{Form, FormData},
    jwt::SessionData,
    permissions::{authorize_recipe, ActionType},
    schema::{Id, RegisteredUser, UserView},
    validation::{
        validate_login, validate_recipe, LoginForm, PasswordForm, RecipeForm, RegisterForm,
        WriteMode,
    },
};

use super::state::AppState;

// Accounts

pub async fn register(form: RegisterForm, state: AppState) -> Result<impl Reply, Rejection> {
    let user = actions::register_user(form, &state.pool).await?;

    Ok(reply::with_status(
        reply::json(&RegisteredUser::from(&user)),
        StatusCode::CREATED,
    ))
}

pub async fn login(form: LoginForm, state: AppState) -> Result<impl Reply, Rejection> {
    let (email, password) = validate_login(form)?;
    let token = actions::login_user(
        &email,
        &password,
        &state.secret,
        state.config.session_lifetime(),
        &state.pool,
    )
    .await?;

    Ok(reply::json(&json!({ "auth_token": token })))
}

pub async fn list_users(
    query: FormData,
    session: Option<SessionData>,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let viewer = session.map(|s| s.user_id);
    let request = Form::from_data(query).page_request(USER_COUNT_PER_PAGE)?;

    let page = actions::list_users(request, &state.pool).await?;
    let subscribed = match viewer {
        Some(viewer) => {
            let ids: Vec<Id> = page.results.iter().map(|user| user.id).collect();
            actions::subscribed_among(viewer, &ids, &state.pool).await?
        }
        None => Default::default(),
    };

    let page = page.map(|user| UserView::from_user(&user, subscribed.contains(&user.id)));

    Ok(reply::json(&page))
}

pub async fn get_user(
    user_id: Id,
    session: Option<SessionData>,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let viewer = session.map(|s| s.user_id);
    let user = actions::get_user(user_id, &state.pool).await?;
    let view = actions::user_view(viewer, &user, &state.pool).await?;

    Ok(reply::json(&view))
}

pub async fn me(session: SessionData, state: AppState) -> Result<impl Reply, Rejection> {
    let user = actions::get_active_user(&session, &state.pool).await?;

    Ok(reply::json(&UserView::from_user(&user, false)))
}

pub async fn set_password(
    session: SessionData,
    form: PasswordForm,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let user = actions::get_active_user(&session, &state.pool).await?;
    actions::set_password(&user, form, &state.pool).await?;

    Ok(reply::with_status(reply(), StatusCode::NO_CONTENT))
}

// Subscriptions

pub async fn subscribe(
    author_id: Id,
    query: FormData,
    session: SessionData,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let user = actions::get_active_user(&session, &state.pool).await?;
    user.authenticate(ActionType::ManageOwnSubscriptions)?;
    let recipes_limit = Form::from_data(query).get_number::<i64>("recipes_limit")?;

    let author = actions::subscribe(user.id, author_id, &state.pool).await?;
    let view = actions::subscription_view(&author, recipes_limit, &state.pool).await?;

    Ok(reply::with_status(reply::json(&view), StatusCode::CREATED))
}

pub async fn unsubscribe(
    author_id: Id,
    session: SessionData,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let user = actions::get_active_user(&session, &state.pool).await?;
    user.authenticate(ActionType::ManageOwnSubscriptions)?;
    actions::unsubscribe(user.id, author_id, &state.pool).await?;

    Ok(reply::with_status(reply(), StatusCode::NO_CONTENT))
}

pub async fn list_subscriptions(
    query: FormData,
    session: SessionData,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let user = actions::get_active_user(&session, &state.pool).await?;
    let form = Form::from_data(query);
    let request = form.page_request(USER_COUNT_PER_PAGE)?;
    let recipes_limit = form.get_number::<i64>("recipes_limit")?;

    let page = actions::list_subscriptions(user.id, request, recipes_limit, &state.pool).await?;

    Ok(reply::json(&page))
}

// Catalog

pub async fn list_tags(state: AppState) -> Result<impl Reply, Rejection> {
    let pool = state.pool.clone();
    let tags = cached(CacheKeyType::Tag.new("all"), state.cache.clone(), || async move {
        actions::list_tags(&pool).await
    })
    .await?;

    Ok(reply::json(&tags))
}

pub async fn get_tag(tag_id: Id, state: AppState) -> Result<impl Reply, Rejection> {
    let pool = state.pool.clone();
    let tag = cached(CacheKeyType::Tag.new(tag_id), state.cache.clone(), || async move {
        actions::get_tag(tag_id, &pool).await
    })
    .await?
    .ok_or_else(|| Error::not_found("Tag not found."))?;

    Ok(reply::json(&tag))
}

pub async fn list_ingredients(query: FormData, state: AppState) -> Result<impl Reply, Rejection> {
    let prefix = Form::from_data(query)
        .get_str("name")
        .map(|name| name.trim().to_lowercase())
        .unwrap_or_default();

    let pool = state.pool.clone();
    let key = CacheKeyType::Ingredient.new(format!("search-{prefix}"));
    let ingredients = cached(key, state.cache.clone(), || async move {
        actions::list_ingredients(Some(prefix.as_str()), &pool).await
    })
    .await?;

    Ok(reply::json(&ingredients))
}

pub async fn get_ingredient(ingredient_id: Id, state: AppState) -> Result<impl Reply, Rejection> {
    let pool = state.pool.clone();
    let key = CacheKeyType::Ingredient.new(ingredient_id);
    let ingredient = cached(key, state.cache.clone(), || async move {
        actions::get_ingredient(ingredient_id, &pool).await
    })
    .await?
    .ok_or_else(|| Error::not_found("Ingredient not found."))?;

    Ok(reply::json(&ingredient))
}

#[derive(serde::Deserialize)]
pub struct TagForm {
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(serde::Deserialize)]
pub struct IngredientForm {
    pub name: String,
    pub measurement_unit: String,
}

pub async fn create_tag(
    session: SessionData,
    form: TagForm,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let user = actions::get_active_user(&session, &state.pool).await?;
    user.authenticate(ActionType::ManageCatalog)?;

    let tag = actions::create_tag(&form.name, &form.color, &form.slug, &state.pool).await?;
    invalidate_catalog(CacheKeyType::Tag, state.cache.clone()).await;

    Ok(reply::with_status(reply::json(&tag), StatusCode::CREATED))
}

pub async fn create_ingredient(
    session: SessionData,
    form: IngredientForm,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let user = actions::get_active_user(&session, &state.pool).await?;
    user.authenticate(ActionType::ManageCatalog)?;

    let ingredient =
        actions::create_ingredient(&form.name, &form.measurement_unit, &state.pool).await?;
    invalidate_catalog(CacheKeyType::Ingredient, state.cache.clone()).await;

    Ok(reply::with_status(reply::json(&ingredient), StatusCode::CREATED))
}

// Recipes

fn recipe_filter(form: &Form) -> Result<RecipeFilter, Error> {
    Ok(RecipeFilter {
        tags: form.get_all("tags"),
        author: form
            .get_str("author")
            .map(str::trim)
            .filter(|author| !author.is_empty())
            .map(str::to_owned),
        is_favorited: form.get_flag("is_favorited"),
        is_in_shopping_cart: form.get_flag("is_in_shopping_cart"),
    })
}

pub async fn list_recipes(
    query: FormData,
    session: Option<SessionData>,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let form = Form::from_data(query);
    let filter = recipe_filter(&form)?;
    let request = form.page_request(RECIPE_COUNT_PER_PAGE)?;
    let viewer = session.map(|s| s.user_id);

    let page = actions::fetch_recipes(&filter, viewer, request, &state.pool).await?;

    Ok(reply::json(&page))
}

pub async fn get_recipe(
    recipe_id: Id,
    session: Option<SessionData>,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let viewer = session.map(|s| s.user_id);
    let view = actions::recipe_view(recipe_id, viewer, &state.pool).await?;

    Ok(reply::json(&view))
}

pub async fn create_recipe(
    session: SessionData,
    form: RecipeForm,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let user = actions::get_active_user(&session, &state.pool).await?;
    user.authenticate(ActionType::CreateRecipes)?;

    let draft = validate_recipe(form, WriteMode::Create, &state.pool).await?;
    let recipe_id = actions::create_recipe(user.id, draft, &state.pool).await?;
    let view = actions::recipe_view(recipe_id, Some(user.id), &state.pool).await?;

    Ok(reply::with_status(reply::json(&view), StatusCode::CREATED))
}

pub async fn update_recipe(
    recipe_id: Id,
    session: SessionData,
    form: RecipeForm,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let user = actions::get_active_user(&session, &state.pool).await?;
    let recipe = actions::get_recipe_or_404(recipe_id, &state.pool).await?;
    authorize_recipe(&user, &recipe)?;

    let draft = validate_recipe(form, WriteMode::Update, &state.pool).await?;
    actions::update_recipe(recipe_id, draft, &state.pool).await?;
    let view = actions::recipe_view(recipe_id, Some(user.id), &state.pool).await?;

    Ok(reply::json(&view))
}

pub async fn delete_recipe(
    recipe_id: Id,
    session: SessionData,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let user = actions::get_active_user(&session, &state.pool).await?;
    let recipe = actions::get_recipe_or_404(recipe_id, &state.pool).await?;
    authorize_recipe(&user, &recipe)?;

    actions::delete_recipe(recipe_id, &state.pool).await?;

    Ok(reply::with_status(reply(), StatusCode::NO_CONTENT))
}

pub async fn add_favorite(
    recipe_id: Id,
    session: SessionData,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let user = actions::get_active_user(&session, &state.pool).await?;
    user.authenticate(ActionType::ManageOwnFavorites)?;
    let recipe = actions::add_to_favorites(user.id, recipe_id, &state.pool).await?;

    Ok(reply::with_status(reply::json(&recipe), StatusCode::CREATED))
}

pub async fn remove_favorite(
    recipe_id: Id,
    session: SessionData,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let user = actions::get_active_user(&session, &state.pool).await?;
    user.authenticate(ActionType::ManageOwnFavorites)?;
    actions::remove_from_favorites(user.id, recipe_id, &state.pool).await?;

    Ok(reply::with_status(reply(), StatusCode::NO_CONTENT))
}

pub async fn add_to_cart(
    recipe_id: Id,
    session: SessionData,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let user = actions::get_active_user(&session, &state.pool).await?;
    user.authenticate(ActionType::ManageOwnShoppingCart)?;
    let recipe = actions::add_to_shopping_cart(user.id, recipe_id, &state.pool).await?;

    Ok(reply::with_status(reply::json(&recipe), StatusCode::CREATED))
}

pub async fn remove_from_cart(
    recipe_id: Id,
    session: SessionData,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let user = actions::get_active_user(&session, &state.pool).await?;
    user.authenticate(ActionType::ManageOwnShoppingCart)?;
    actions::remove_from_shopping_cart(user.id, recipe_id, &state.pool).await?;

    Ok(reply::with_status(reply(), StatusCode::NO_CONTENT))
}

pub async fn download_shopping_cart(
    session: SessionData,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let user = actions::get_active_user(&session, &state.pool).await?;
    let items = actions::shopping_list(user.id, &state.pool).await?;

    let response = Response::builder()
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{SHOPPING_LIST_FILENAME}\""),
        )
        .body(actions::render_shopping_list(&items))
        .map_err(|e| Error::Internal(e.to_string()))?;

    Ok(response)
}
