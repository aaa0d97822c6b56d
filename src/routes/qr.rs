use std::collections::HashMap;
use std::sync::Arc;

use poem::http::{Method, StatusCode};
use poem::web::Data;
use poem::{Body, Request, Response, handler};

use crate::AppState;
use crate::core::request::validate;
use crate::schemas::common::ErrorBody;

/// Renders a QR code from query/form parameters.
///
/// GET reads the query string only; POST additionally reads an
/// urlencoded form body whose fields override the query. The merged bag
/// goes through the validator before any rendering work starts.
#[handler]
pub async fn create_qr_code(
    req: &Request,
    body: Body,
    state: Data<&Arc<AppState>>,
) -> Response {
    let mut params: HashMap<String, String> =
        url::form_urlencoded::parse(req.uri().query().unwrap_or("").as_bytes())
            .into_owned()
            .collect();

    if req.method() == Method::POST && is_urlencoded_form(req) {
        let bytes = match body.into_bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!("unreadable form body: {e}");
                return json_error(
                    StatusCode::BAD_REQUEST,
                    ErrorBody::new("unable to read request body"),
                );
            }
        };
        params.extend(url::form_urlencoded::parse(&bytes).into_owned());
    }

    let request = match validate(&params) {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!("parameter validation failed: {e}");
            return json_error(StatusCode::BAD_REQUEST, ErrorBody::new(e.to_string()));
        }
    };

    tracing::info!(
        "rendering qr: format={:?}, size={}x{}, depth={:?}, optimize={}",
        request.format,
        request.dimension,
        request.dimension,
        request.bit_depth,
        request.optimize
    );

    match state.engine.render(request).await {
        Ok(image) => {
            tracing::info!("render completed, size: {} bytes", image.bytes.len());
            Response::builder()
                .content_type(image.content_type)
                .body(image.bytes)
        }
        Err(e) => {
            tracing::error!("render error: {e:#}");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::with_details("rendering failed", e.to_string()),
            )
        }
    }
}

fn is_urlencoded_form(req: &Request) -> bool {
    req.content_type()
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
}

fn json_error(status: StatusCode, body: ErrorBody) -> Response {
    let payload = serde_json::to_vec(&body)
        .unwrap_or_else(|_| br#"{"error":"internal error"}"#.to_vec());
    Response::builder()
        .status(status)
        .content_type("application/json")
        .body(payload)
}
