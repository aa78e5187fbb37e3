use foodgram::{
    actions::{set_user_active, subscribe},
    api::routes::routes,
    Error,
};
use serde_json::json;
use warp::http::StatusCode;

use super::json;
use crate::util::{TestContext, PASSWORD};

/// Tests the register, login and `me` round trip over HTTP.
///
/// Expected: 201 without password, token on login, `me` resolves the user
#[tokio::test]
async fn register_login_me() -> Result<(), Error> {
    let test = TestContext::new().await?;
    let api = routes(test.state.clone());

    let response = warp::test::request()
        .method("POST")
        .path("/api/users/")
        .json(&json!({
            "email": "chef@example.com",
            "username": "chef",
            "first_name": "Gordon",
            "last_name": "Chef",
            "password": PASSWORD,
        }))
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json(&response);
    assert_eq!(body["username"], "chef");
    assert!(body.get("password").is_none());

    let response = warp::test::request()
        .method("POST")
        .path("/api/auth/token/login/")
        .json(&json!({ "email": "chef@example.com", "password": PASSWORD }))
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let token = json(&response)["auth_token"]
        .as_str()
        .map(str::to_owned)
        .unwrap();

    let response = warp::test::request()
        .method("GET")
        .path("/api/users/me/")
        .header("authorization", format!("Token {token}"))
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json(&response);
    assert_eq!(body["email"], "chef@example.com");
    assert_eq!(body["is_subscribed"], false);

    Ok(())
}

#[tokio::test]
async fn invalid_registration_lists_fields() -> Result<(), Error> {
    let test = TestContext::new().await?;
    let api = routes(test.state.clone());

    let response = warp::test::request()
        .method("POST")
        .path("/api/users/")
        .json(&json!({ "email": "not-an-email", "username": "chef" }))
        .reply(&api)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json(&response);
    assert!(body.get("email").is_some());
    assert!(body.get("password").is_some());
    assert!(body.get("username").is_none());

    Ok(())
}

#[tokio::test]
async fn me_requires_token() -> Result<(), Error> {
    let test = TestContext::new().await?;
    let api = routes(test.state.clone());

    let response = warp::test::request()
        .method("GET")
        .path("/api/users/me/")
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = warp::test::request()
        .method("GET")
        .path("/api/users/me/")
        .header("authorization", "Token not.a.token")
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

/// Tests that the user list and profile are public reads.
///
/// Expected: 200 without a token and `is_subscribed` only for the reader
#[tokio::test]
async fn user_reads_are_open() -> Result<(), Error> {
    let test = TestContext::new().await?;
    let api = routes(test.state.clone());
    let chef = test.user("chef").await?;
    let reader = test.user("reader").await?;
    subscribe(reader.id, chef.id, &test.pool).await?;

    let response = warp::test::request()
        .method("GET")
        .path("/api/users/")
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = json(&response);
    assert_eq!(page["count"], 2);
    assert_eq!(page["results"][0]["username"], "chef");
    assert_eq!(page["results"][0]["is_subscribed"], false);

    let response = warp::test::request()
        .method("GET")
        .path(&format!("/api/users/{}/", chef.id))
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(&response)["is_subscribed"], false);

    let response = warp::test::request()
        .method("GET")
        .path(&format!("/api/users/{}/", chef.id))
        .header("authorization", test.auth_header(&reader))
        .reply(&api)
        .await;
    assert_eq!(json(&response)["is_subscribed"], true);

    let response = warp::test::request()
        .method("GET")
        .path("/api/users/")
        .header("authorization", test.auth_header(&reader))
        .reply(&api)
        .await;
    assert_eq!(json(&response)["results"][0]["is_subscribed"], true);

    Ok(())
}

#[tokio::test]
async fn inactive_account_is_forbidden() -> Result<(), Error> {
    let test = TestContext::new().await?;
    let api = routes(test.state.clone());
    let user = test.user("chef").await?;
    let header = test.auth_header(&user);
    set_user_active(user.id, false, &test.pool).await?;

    let response = warp::test::request()
        .method("GET")
        .path("/api/users/me/")
        .header("authorization", header)
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn subscribe_over_http() -> Result<(), Error> {
    let test = TestContext::new().await?;
    let api = routes(test.state.clone());
    let chef = test.user("chef").await?;
    let reader = test.user("reader").await?;
    let tag = test.tag("dinner").await?;
    let eggs = test.ingredient("Eggs", "pcs").await?;
    test.recipe(&chef, "One", &[(eggs.id, 1)], &[tag.id]).await?;
    test.recipe(&chef, "Two", &[(eggs.id, 2)], &[tag.id]).await?;

    let response = warp::test::request()
        .method("POST")
        .path(&format!("/api/users/{}/subscribe/?recipes_limit=1", chef.id))
        .header("authorization", test.auth_header(&reader))
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json(&response);
    assert_eq!(body["id"], chef.id);
    assert_eq!(body["is_subscribed"], true);
    assert_eq!(body["recipes"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["recipes_count"], 2);

    let response = warp::test::request()
        .method("POST")
        .path(&format!("/api/users/{}/subscribe/", reader.id))
        .header("authorization", test.auth_header(&reader))
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = warp::test::request()
        .method("GET")
        .path("/api/users/subscriptions/")
        .header("authorization", test.auth_header(&reader))
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(&response)["count"], 1);

    let response = warp::test::request()
        .method("DELETE")
        .path(&format!("/api/users/{}/subscribe/", chef.id))
        .header("authorization", test.auth_header(&reader))
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    Ok(())
}
