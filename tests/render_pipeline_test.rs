use poem::http::StatusCode;
use poem::test::TestClient;
use qr_renderer::core::renderer::RenderingEngine;
use qr_renderer::settings::Config;
use qr_renderer::{AppState, init_openapi_route};
use serde_json::Value;
use std::sync::Arc;

fn test_config() -> Config {
    Config {
        env: "file".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        prefix: None,
        // deliberately missing binary so optimization always falls back
        optimizer_bin: "qr-renderer-no-such-binary".to_string(),
        optimizer_slots: 2,
    }
}

fn test_client() -> TestClient<impl poem::Endpoint> {
    let config = test_config();
    let engine = Arc::new(RenderingEngine::new(&config));
    let app_state = Arc::new(AppState { engine });
    TestClient::new(init_openapi_route(app_state, &config))
}

#[tokio::test]
async fn renders_hello_world_as_square_png() {
    let cli = test_client();

    let resp = cli
        .get("/v1/create-qr-code?data=HelloWorld&size=100x100")
        .send()
        .await;
    resp.assert_status_is_ok();
    resp.assert_content_type("image/png");

    let bytes = resp.0.into_body().into_vec().await.unwrap();
    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!(decoded.width(), 100);
    assert_eq!(decoded.height(), 100);
}

#[tokio::test]
async fn renders_svg_with_svg_root_element() {
    let cli = test_client();

    let resp = cli.get("/v1/create-qr-code?data=Test&format=svg").send().await;
    resp.assert_status_is_ok();
    resp.assert_content_type("image/svg+xml");

    let body = resp.0.into_body().into_string().await.unwrap();
    assert!(body.contains("<svg "));
}

#[tokio::test]
async fn renders_eps_placeholder() {
    let cli = test_client();

    let resp = cli
        .get("/v1/create-qr-code?data=Test&format=eps&size=120x120")
        .send()
        .await;
    resp.assert_status_is_ok();
    resp.assert_content_type("application/postscript");

    let body = resp.0.into_body().into_string().await.unwrap();
    assert!(body.starts_with("%!PS-Adobe-3.0 EPSF-3.0"));
    assert!(body.contains("%%BoundingBox: 0 0 120 120"));
}

#[tokio::test]
async fn gif_requests_are_served_as_png() {
    let cli = test_client();

    let resp = cli.get("/v1/create-qr-code?data=Test&format=gif").send().await;
    resp.assert_status_is_ok();
    resp.assert_content_type("image/png");
}

#[tokio::test]
async fn jpeg_requests_carry_the_jpeg_content_type() {
    let cli = test_client();

    let resp = cli
        .get("/v1/create-qr-code?data=Test&format=jpeg&size=80x80")
        .send()
        .await;
    resp.assert_status_is_ok();
    resp.assert_content_type("image/jpeg");

    let bytes = resp.0.into_body().into_vec().await.unwrap();
    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!(decoded.width(), 80);
}

#[tokio::test]
async fn missing_data_is_a_400_regardless_of_other_parameters() {
    let cli = test_client();

    let resp = cli.get("/v1/create-qr-code?size=200x200&ecc=L").send().await;
    resp.assert_status(StatusCode::BAD_REQUEST);

    let body: Value =
        serde_json::from_str(&resp.0.into_body().into_string().await.unwrap()).unwrap();
    assert!(body["error"].as_str().unwrap().contains("data"));
}

#[tokio::test]
async fn non_square_size_is_rejected() {
    let cli = test_client();

    let resp = cli.get("/v1/create-qr-code?data=x&size=100x200").send().await;
    resp.assert_status(StatusCode::BAD_REQUEST);

    let body: Value =
        serde_json::from_str(&resp.0.into_body().into_string().await.unwrap()).unwrap();
    assert!(body["error"].as_str().unwrap().contains("size"));
}

#[tokio::test]
async fn invalid_ecc_names_the_parameter() {
    let cli = test_client();

    let resp = cli.get("/v1/create-qr-code?data=test&ecc=X").send().await;
    resp.assert_status(StatusCode::BAD_REQUEST);

    let body: Value =
        serde_json::from_str(&resp.0.into_body().into_string().await.unwrap()).unwrap();
    assert!(body["error"].as_str().unwrap().contains("ecc"));
}

#[tokio::test]
async fn invalid_color_names_the_parameter() {
    let cli = test_client();

    let resp = cli
        .get("/v1/create-qr-code?data=test&color=invalidcolor")
        .send()
        .await;
    resp.assert_status(StatusCode::BAD_REQUEST);

    let body: Value =
        serde_json::from_str(&resp.0.into_body().into_string().await.unwrap()).unwrap();
    assert!(body["error"].as_str().unwrap().contains("color"));
}

#[tokio::test]
async fn depth_is_never_silently_coerced() {
    let cli = test_client();

    let resp = cli.get("/v1/create-qr-code?data=x&depth=7").send().await;
    resp.assert_status(StatusCode::BAD_REQUEST);

    let body: Value =
        serde_json::from_str(&resp.0.into_body().into_string().await.unwrap()).unwrap();
    assert!(body["error"].as_str().unwrap().contains("depth"));
}

#[tokio::test]
async fn dpi_bounds_are_enforced() {
    let cli = test_client();

    for dpi in ["50", "1000"] {
        let resp = cli
            .get(format!("/v1/create-qr-code?data=x&dpi={dpi}"))
            .send()
            .await;
        resp.assert_status(StatusCode::BAD_REQUEST);
    }
    for dpi in ["96", "300"] {
        let resp = cli
            .get(format!("/v1/create-qr-code?data=x&dpi={dpi}"))
            .send()
            .await;
        resp.assert_status_is_ok();
    }
}

#[tokio::test]
async fn margin_enlarges_the_rendered_image() {
    let cli = test_client();

    let resp = cli
        .get("/v1/create-qr-code?data=x&size=100x100&margin=20")
        .send()
        .await;
    resp.assert_status_is_ok();

    let bytes = resp.0.into_body().into_vec().await.unwrap();
    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!(decoded.width(), 140);
    assert_eq!(decoded.height(), 140);
}

#[tokio::test]
async fn one_bit_optimize_falls_back_to_plain_output() {
    let cli = test_client();

    let plain = cli.get("/v1/create-qr-code?data=x&depth=1").send().await;
    plain.assert_status_is_ok();
    plain.assert_content_type("image/png");
    let plain_bytes = plain.0.into_body().into_vec().await.unwrap();

    let optimized = cli
        .get("/v1/create-qr-code?data=x&depth=1&optimize=true")
        .send()
        .await;
    optimized.assert_status_is_ok();
    optimized.assert_content_type("image/png");
    let optimized_bytes = optimized.0.into_body().into_vec().await.unwrap();

    assert_eq!(plain_bytes, optimized_bytes);
}

#[tokio::test]
async fn post_form_fields_override_the_query_string() {
    let cli = test_client();

    let resp = cli
        .post("/v1/create-qr-code?data=FromQuery&size=100x200")
        .content_type("application/x-www-form-urlencoded")
        .body("size=100x100")
        .send()
        .await;
    resp.assert_status_is_ok();

    let bytes = resp.0.into_body().into_vec().await.unwrap();
    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!(decoded.width(), 100);
}

#[tokio::test]
async fn percent_encoded_data_is_decoded() {
    let cli = test_client();

    let resp = cli
        .get("/v1/create-qr-code?data=Hello%20W%C3%B6rld&size=50x50")
        .send()
        .await;
    resp.assert_status_is_ok();
    resp.assert_content_type("image/png");
}

#[tokio::test]
async fn colored_request_renders_with_requested_colors() {
    let cli = test_client();

    let resp = cli
        .get("/v1/create-qr-code?data=x&size=60x60&color=f00&bgcolor=0-0-255")
        .send()
        .await;
    resp.assert_status_is_ok();

    let bytes = resp.0.into_body().into_vec().await.unwrap();
    let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
    let mut seen_red = false;
    let mut seen_blue = false;
    for px in decoded.pixels() {
        if px.0 == [255, 0, 0] {
            seen_red = true;
        }
        if px.0 == [0, 0, 255] {
            seen_blue = true;
        }
    }
    assert!(seen_red && seen_blue);
}

#[tokio::test]
async fn health_endpoint_reports_optimizer_state() {
    let cli = test_client();

    let resp = cli.get("/health").send().await;
    resp.assert_status_is_ok();

    let health: Value =
        serde_json::from_str(&resp.0.into_body().into_string().await.unwrap()).unwrap();
    assert_eq!(health["status"].as_str().unwrap(), "healthy");
    assert_eq!(health["optimizer"]["available"].as_bool().unwrap(), false);
    assert!(health["optimizer_slots"]["capacity"].is_number());
}

#[tokio::test]
async fn formats_endpoint_lists_all_output_formats() {
    let cli = test_client();

    let resp = cli.get("/formats").send().await;
    resp.assert_status_is_ok();

    let formats: Value =
        serde_json::from_str(&resp.0.into_body().into_string().await.unwrap()).unwrap();
    let names: Vec<&str> = formats
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    for expected in ["png", "gif", "jpeg", "jpg", "svg", "eps"] {
        assert!(names.contains(&expected), "missing format {expected}");
    }
}
