//! Request body extraction for message submissions.
//!
//! Browsers post `message[message]=...` form fields; API clients post JSON.
//! Both end up as the same nested JSON value so whitelisting happens in one
//! place.

use axum::{
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
    Form, Json,
};
use serde_json::{Map, Value};

/// Raw, not yet whitelisted submission parameters.
#[derive(Debug)]
pub struct SubmittedParams(pub Value);

impl<S> FromRequest<S> for SubmittedParams
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        if is_json {
            let Json(value) = Json::<Value>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(value))
        } else {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(nest_form_pairs(&pairs)))
        }
    }
}

/// Turn bracketed form keys into nested objects.
///
/// `message[message]=hi&commit=Send` becomes
/// `{"message": {"message": "hi"}, "commit": "Send"}`. Later keys win.
pub fn nest_form_pairs(pairs: &[(String, String)]) -> Value {
    let mut root = Map::new();
    for (key, value) in pairs {
        let path = split_key(key);
        if path.iter().any(|segment| segment.is_empty()) {
            continue;
        }
        insert_path(&mut root, &path, value);
    }
    Value::Object(root)
}

fn split_key(key: &str) -> Vec<&str> {
    match key.find('[') {
        Some(i) => {
            let mut path = vec![&key[..i]];
            path.extend(key[i..].split('[').skip(1).map(|s| s.trim_end_matches(']')));
            path
        }
        None => vec![key],
    }
}

fn insert_path(map: &mut Map<String, Value>, path: &[&str], value: &str) {
    let (head, rest) = match path.split_first() {
        Some(split) => split,
        None => return,
    };

    if rest.is_empty() {
        map.insert(head.to_string(), Value::String(value.to_string()));
        return;
    }

    let entry = map
        .entry(head.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    if let Value::Object(child) = entry {
        insert_path(child, rest, value);
    }
}
