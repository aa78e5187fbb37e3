mod accounts;

use serde_json::Value;
use warp::{http::Response, hyper::body::Bytes};

pub fn json(response: &Response<Bytes>) -> Value {
    serde_json::from_slice(response.body()).unwrap()
}
