use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Stamps the request path onto error bodies produced by [`crate::error::AppError`],
/// completing the `{detail, status, timestamp, path}` shape from spec.md §7
/// without requiring every handler to thread the path through by hand.
pub async fn attach_error_path(req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let response = next.run(req).await;

    if response.status().as_u16() < 400 {
        return response;
    }

    let (parts, body) = response.into_parts();
    let Ok(bytes) = to_bytes(body, 1024 * 1024).await else {
        return (StatusCode::INTERNAL_SERVER_ERROR, "error serializing response").into_response();
    };

    let mut value: serde_json::Value = match serde_json::from_slice(&bytes) {
        Ok(v) => v,
        Err(_) => return Response::from_parts(parts, Body::from(bytes)),
    };

    if let Some(obj) = value.as_object_mut() {
        obj.insert("path".to_string(), serde_json::Value::String(path));
    }

    let new_body = serde_json::to_vec(&value).unwrap_or(bytes.to_vec());
    Response::from_parts(parts, Body::from(new_body))
}
