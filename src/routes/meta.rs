use std::sync::Arc;

use poem::web::Data;
use poem_openapi::{
    OpenApi, Tags,
    payload::{Json, PlainText},
};

use crate::{
    AppState,
    core::renderer::{CONTENT_TYPE_EPS, CONTENT_TYPE_JPEG, CONTENT_TYPE_PNG, CONTENT_TYPE_SVG},
    schemas::meta::FormatInfo,
};

#[derive(Tags)]
enum ApiMetaTags {
    Meta,
}

pub struct ApiMeta;

#[OpenApi()]
impl ApiMeta {
    /// Index
    ///
    /// Short usage pointer for the QR endpoint.
    #[oai(path = "/", method = "get", tag = "ApiMetaTags::Meta")]
    async fn index(&self) -> PlainText<String> {
        PlainText(
            "QR Renderer\n\
             \n\
             GET/POST /v1/create-qr-code?data=<text>\n\
             Optional: size, ecc, color, bgcolor, margin, qzone, format,\n\
             depth, dpi, optimize, charset-source, charset-target\n\
             \n\
             Interactive docs: /docs\n"
                .to_string(),
        )
    }

    /// List Supported Formats
    ///
    /// Get list of all supported output formats
    #[oai(path = "/formats", method = "get", tag = "ApiMetaTags::Meta")]
    async fn list_formats(&self) -> Json<Vec<FormatInfo>> {
        let info = |name: &str, content_type: &str, vector: bool| FormatInfo {
            name: name.to_string(),
            content_type: content_type.to_string(),
            vector,
        };
        Json(vec![
            info("png", CONTENT_TYPE_PNG, false),
            // gif requests are served as PNG byte streams
            info("gif", CONTENT_TYPE_PNG, false),
            info("jpeg", CONTENT_TYPE_JPEG, false),
            info("jpg", CONTENT_TYPE_JPEG, false),
            info("svg", CONTENT_TYPE_SVG, true),
            info("eps", CONTENT_TYPE_EPS, true),
        ])
    }

    #[oai(path = "/health", method = "get")]
    async fn health(&self, state: Data<&Arc<AppState>>) -> Json<serde_json::Value> {
        let status = state.engine.health_check();

        Json(serde_json::json!({
            "status": "healthy",
            "optimizer": {
                "available": status.optimizer_available,
            },
            "optimizer_slots": {
                "available": status.available_permits,
                "capacity": status.max_concurrent,
            }
        }))
    }
}
