use foodgram::{
    actions::{get_active_user, list_users, login_user, register_user, set_password, set_user_active},
    jwt::{verify_jwt_session, SessionData},
    pagination::PageRequest,
    validation::{PasswordForm, RegisterForm},
    Error,
};

use crate::util::{TestContext, PASSWORD, SECRET};

#[tokio::test]
async fn registration_rejects_taken_email_and_username() -> Result<(), Error> {
    let test = TestContext::new().await?;
    test.user("chef").await?;

    let result = register_user(
        RegisterForm {
            email: Some("CHEF@example.com".to_owned()),
            username: Some("chef".to_owned()),
            first_name: Some("Other".to_owned()),
            last_name: Some("Chef".to_owned()),
            password: Some(PASSWORD.to_owned()),
        },
        &test.pool,
    )
    .await;

    match result {
        Err(Error::Validation(errors)) => {
            assert!(errors.contains("email"));
            assert!(errors.contains("username"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn password_is_stored_hashed() -> Result<(), Error> {
    let test = TestContext::new().await?;
    let user = test.user("chef").await?;

    assert_ne!(user.password, PASSWORD);
    assert!(user.password.starts_with("$argon2"));

    Ok(())
}

/// Tests login by email and the issued session contents.
///
/// Expected: a verifiable token for the right user; wrong password refused
#[tokio::test]
async fn login_issues_session() -> Result<(), Error> {
    let test = TestContext::new().await?;
    let user = test.user("chef").await?;
    let lifetime = chrono::Duration::hours(1);

    let token = login_user("chef@example.com", PASSWORD, SECRET, lifetime, &test.pool).await?;
    let session = verify_jwt_session(&token, SECRET)?;
    assert_eq!(session.user_id, user.id);
    assert_eq!(session.username, "chef");

    assert!(matches!(
        login_user("chef@example.com", "wrong-password", SECRET, lifetime, &test.pool).await,
        Err(Error::Validation(_))
    ));
    assert!(matches!(
        login_user("nobody@example.com", PASSWORD, SECRET, lifetime, &test.pool).await,
        Err(Error::Validation(_))
    ));

    Ok(())
}

#[tokio::test]
async fn inactive_users_are_locked_out() -> Result<(), Error> {
    let test = TestContext::new().await?;
    let user = test.user("chef").await?;
    let session = SessionData::from(verify_jwt_session(&test.token(&user), SECRET)?);

    set_user_active(user.id, false, &test.pool).await?;

    assert!(matches!(
        get_active_user(&session, &test.pool).await,
        Err(Error::Forbidden(_))
    ));
    assert!(matches!(
        login_user(
            "chef@example.com",
            PASSWORD,
            SECRET,
            chrono::Duration::hours(1),
            &test.pool
        )
        .await,
        Err(Error::Validation(_))
    ));

    Ok(())
}

#[tokio::test]
async fn set_password_checks_current() -> Result<(), Error> {
    let test = TestContext::new().await?;
    let user = test.user("chef").await?;
    let lifetime = chrono::Duration::hours(1);

    let wrong = PasswordForm {
        current_password: Some("not-my-password".to_owned()),
        new_password: Some("brand-new-secret".to_owned()),
    };
    assert!(matches!(
        set_password(&user, wrong, &test.pool).await,
        Err(Error::Validation(e)) if e.contains("current_password")
    ));

    let form = PasswordForm {
        current_password: Some(PASSWORD.to_owned()),
        new_password: Some("brand-new-secret".to_owned()),
    };
    set_password(&user, form, &test.pool).await?;

    login_user("chef@example.com", "brand-new-secret", SECRET, lifetime, &test.pool).await?;
    assert!(login_user("chef@example.com", PASSWORD, SECRET, lifetime, &test.pool)
        .await
        .is_err());

    Ok(())
}

#[tokio::test]
async fn users_are_paginated_by_username() -> Result<(), Error> {
    let test = TestContext::new().await?;
    for name in ["carol", "alice", "bob"] {
        test.user(name).await?;
    }

    let page = list_users(PageRequest::new(1, 2), &test.pool).await?;
    assert_eq!(page.count, 3);
    let names: Vec<&str> = page.results.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(names, vec!["alice", "bob"]);
    assert_eq!(page.next, Some(2));

    Ok(())
}
