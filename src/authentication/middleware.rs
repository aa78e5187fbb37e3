use std::sync::Arc;

use warp::{reject::Rejection, Filter};

use crate::{constants::AUTH_HEADER_SCHEMES, error::Error};

use super::jwt::{verify_jwt_session, SessionData};

/// Strips the `Token ` / `Bearer ` prefix of an `Authorization` header.
pub fn parse_authorization(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !AUTH_HEADER_SCHEMES
        .iter()
        .any(|s| s.eq_ignore_ascii_case(scheme))
    {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

fn session_from_header(header: Option<String>, secret: &str) -> Result<SessionData, Error> {
    let header = header.ok_or_else(|| {
        Error::Unauthorized("Authentication credentials were not provided.".to_owned())
    })?;
    let token = parse_authorization(&header)
        .ok_or_else(|| Error::Unauthorized("Invalid authorization header.".to_owned()))?;

    verify_jwt_session(token, secret).map(SessionData::from)
}

pub fn with_session(
    secret: Arc<str>,
) -> impl Filter<Extract = (SessionData,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(move |header: Option<String>| {
        let secret = secret.clone();
        async move { session_from_header(header, &secret).map_err(warp::reject::custom) }
    })
}

pub fn with_possible_session(
    secret: Arc<str>,
) -> impl Filter<Extract = (Option<SessionData>,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization").map(move |header: Option<String>| {
        if header.is_none() {
            return None;
        }
        match session_from_header(header, &secret) {
            Ok(data) => Some(data),
            Err(e) => {
                log::debug!("Ignoring session: {e}");
                None
            }
        }
    })
}
