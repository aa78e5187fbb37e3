use serde::de::DeserializeOwned;
use warp::{filters::BoxedFilter, Filter, Rejection, Reply};

use crate::{
    form::FormData,
    middleware::{with_possible_session, with_session},
    schema::Id,
};

use super::{
    handlers,
    rejection::handle_rejection,
    state::{with_state, AppState},
};

const MAX_BODY_SIZE: u64 = 1024 * 1024 * 16;

fn json_body<T: DeserializeOwned + Send>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone
{
    warp::body::content_length_limit(MAX_BODY_SIZE).and(warp::body::json())
}

fn query() -> impl Filter<Extract = (FormData,), Error = Rejection> + Clone {
    warp::query::<FormData>()
}

fn account_routes(state: &AppState) -> BoxedFilter<(impl Reply,)> {
    let session = with_session(state.secret.clone());
    let possible_session = with_possible_session(state.secret.clone());

    let register = warp::path!("users")
        .and(warp::post())
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(handlers::register);

    let login = warp::path!("auth" / "token" / "login")
        .and(warp::post())
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(handlers::login);

    let list_users = warp::path!("users")
        .and(warp::get())
        .and(query())
        .and(possible_session.clone())
        .and(with_state(state.clone()))
        .and_then(handlers::list_users);

    let me = warp::path!("users" / "me")
        .and(warp::get())
        .and(session.clone())
        .and(with_state(state.clone()))
        .and_then(handlers::me);

    let set_password = warp::path!("users" / "set_password")
        .and(warp::post())
        .and(session.clone())
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(handlers::set_password);

    let subscriptions = warp::path!("users" / "subscriptions")
        .and(warp::get())
        .and(query())
        .and(session.clone())
        .and(with_state(state.clone()))
        .and_then(handlers::list_subscriptions);

    let get_user = warp::path!("users" / Id)
        .and(warp::get())
        .and(possible_session)
        .and(with_state(state.clone()))
        .and_then(handlers::get_user);

    let subscribe = warp::path!("users" / Id / "subscribe")
        .and(warp::post())
        .and(query())
        .and(session.clone())
        .and(with_state(state.clone()))
        .and_then(handlers::subscribe);

    let unsubscribe = warp::path!("users" / Id / "subscribe")
        .and(warp::delete())
        .and(session)
        .and(with_state(state.clone()))
        .and_then(handlers::unsubscribe);

    register
        .or(login)
        .or(list_users)
        .or(me)
        .or(set_password)
        .or(subscriptions)
        .or(get_user)
        .or(subscribe)
        .or(unsubscribe)
        .boxed()
}

fn catalog_routes(state: &AppState) -> BoxedFilter<(impl Reply,)> {
    let session = with_session(state.secret.clone());

    let list_tags = warp::path!("tags")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::list_tags);

    let get_tag = warp::path!("tags" / Id)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::get_tag);

    let create_tag = warp::path!("tags")
        .and(warp::post())
        .and(session.clone())
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(handlers::create_tag);

    let list_ingredients = warp::path!("ingredients")
        .and(warp::get())
        .and(query())
        .and(with_state(state.clone()))
        .and_then(handlers::list_ingredients);

    let get_ingredient = warp::path!("ingredients" / Id)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::get_ingredient);

    let create_ingredient = warp::path!("ingredients")
        .and(warp::post())
        .and(session)
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(handlers::create_ingredient);

    list_tags
        .or(get_tag)
        .or(create_tag)
        .or(list_ingredients)
        .or(get_ingredient)
        .or(create_ingredient)
        .boxed()
}

fn recipe_routes(state: &AppState) -> BoxedFilter<(impl Reply,)> {
    let session = with_session(state.secret.clone());
    let possible_session = with_possible_session(state.secret.clone());

    let list = warp::path!("recipes")
        .and(warp::get())
        .and(query())
        .and(possible_session.clone())
        .and(with_state(state.clone()))
        .and_then(handlers::list_recipes);

    let create = warp::path!("recipes")
        .and(warp::post())
        .and(session.clone())
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(handlers::create_recipe);

    let download = warp::path!("recipes" / "download_shopping_cart")
        .and(warp::get())
        .and(session.clone())
        .and(with_state(state.clone()))
        .and_then(handlers::download_shopping_cart);

    let get = warp::path!("recipes" / Id)
        .and(warp::get())
        .and(possible_session)
        .and(with_state(state.clone()))
        .and_then(handlers::get_recipe);

    let update = warp::path!("recipes" / Id)
        .and(warp::patch())
        .and(session.clone())
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(handlers::update_recipe);

    let delete = warp::path!("recipes" / Id)
        .and(warp::delete())
        .and(session.clone())
        .and(with_state(state.clone()))
        .and_then(handlers::delete_recipe);

    let add_favorite = warp::path!("recipes" / Id / "favorite")
        .and(warp::post())
        .and(session.clone())
        .and(with_state(state.clone()))
        .and_then(handlers::add_favorite);

    let remove_favorite = warp::path!("recipes" / Id / "favorite")
        .and(warp::delete())
        .and(session.clone())
        .and(with_state(state.clone()))
        .and_then(handlers::remove_favorite);

    let add_to_cart = warp::path!("recipes" / Id / "shopping_cart")
        .and(warp::post())
        .and(session.clone())
        .and(with_state(state.clone()))
        .and_then(handlers::add_to_cart);

    let remove_from_cart = warp::path!("recipes" / Id / "shopping_cart")
        .and(warp::delete())
        .and(session)
        .and(with_state(state.clone()))
        .and_then(handlers::remove_from_cart);

    list.or(create)
        .or(download)
        .or(get)
        .or(update)
        .or(delete)
        .or(add_favorite)
        .or(remove_favorite)
        .or(add_to_cart)
        .or(remove_from_cart)
        .boxed()
}

/// Every endpoint under `/api`, with errors rendered as JSON.
pub fn routes(state: AppState) -> BoxedFilter<(impl Reply,)> {
    warp::path("api")
        .and(
            account_routes(&state)
                .or(catalog_routes(&state))
                .or(recipe_routes(&state)),
        )
        .recover(handle_rejection)
        .boxed()
}
