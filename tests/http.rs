use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use normality_check::{charts::ChartSize, config::ServerConfig, web};
use tower::ServiceExt;

fn app() -> Router {
    web::router(ServerConfig {
        chart_size: ChartSize {
            width: 320,
            height: 240,
        },
        max_body_bytes: 1024,
        ..ServerConfig::default()
    })
}

fn form_encode(text: &str) -> String {
    text.bytes()
        .map(|b| match b {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'.' | b'-' | b'_' => (b as char).to_string(),
            b' ' => "+".to_string(),
            b => format!("%{b:02X}"),
        })
        .collect()
}

fn form_post(body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

fn submit(numbers: &str) -> Request<Body> {
    form_post(format!("numbers={}", form_encode(numbers)))
}

fn api_post(json: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/analyze")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

async fn body_string(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_get_renders_empty_form() {
    let response = app()
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("<textarea name=\"numbers\""));
    assert!(!html.contains("Results"));
}

#[tokio::test]
async fn test_valid_submission_shows_results() {
    let response = app().oneshot(submit("1,2,3,4,5,6,7,8,9,10")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("<h2>Results</h2>"));
    assert!(html.contains("<tr><th>n</th><td>10</td></tr>"));
    assert!(html.contains("<tr><th>Mean</th><td>5.5000</td></tr>"));
    assert!(html.contains("<tr><th>Median</th><td>5.5000</td></tr>"));
    assert!(html.contains("No evidence against normality (fail to reject H0)"));
    assert_eq!(html.matches("src=\"data:image/png;base64,").count(), 2);
    // submitted text stays in the form
    assert!(html.contains(">1,2,3,4,5,6,7,8,9,10</textarea>"));
}

#[tokio::test]
async fn test_count_error_rerenders_form() {
    let response = app().oneshot(submit("1,2,3,4,5,6,7,8,9")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("Please enter between 10 and 15 numbers."));
    assert!(!html.contains("<h2>Results</h2>"));
}

#[tokio::test]
async fn test_invalid_token_rerenders_form() {
    let response = app()
        .oneshot(submit("1,2,x,4,5,6,7,8,9,10"))
        .await
        .unwrap();
    let html = body_string(response).await;
    assert!(html.contains("Invalid number: x"));
    assert!(!html.contains("<h2>Results</h2>"));
}

#[tokio::test]
async fn test_missing_field_is_required() {
    let response = app().oneshot(form_post(String::new())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("This field is required."));
}

#[tokio::test]
async fn test_constant_input_is_server_error() {
    let response = app()
        .oneshot(submit("3 3 3 3 3 3 3 3 3 3"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_far_outlier_is_server_error_and_server_keeps_serving() {
    let app = app();
    let response = app
        .clone()
        .oneshot(submit("0 1 2 3 4 5 6 7 8 9 10 11 12 13 1e15"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_string(response).await, "analysis failed");

    let response = app.oneshot(submit("1,2,3,4,5,6,7,8,9,10")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("<h2>Results</h2>"));
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let numbers = "1 ".repeat(2048);
    let response = app().oneshot(submit(&numbers)).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_api_returns_report_and_images() {
    let response = app()
        .oneshot(api_post(serde_json::json!({ "numbers": "1;2;3;4;5;6;7;8;9;10;11;12" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["results"]["n"], 12);
    assert_eq!(body["results"]["mean"], 6.5);
    assert_eq!(body["results"]["median"], 6.5);
    for key in ["histogram_png", "qq_png"] {
        let png = STANDARD.decode(body[key].as_str().unwrap()).unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }
}

#[tokio::test]
async fn test_api_validation_error() {
    let response = app()
        .oneshot(api_post(serde_json::json!({ "numbers": "1 2 three" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["error"], "Invalid number: three");
}

#[tokio::test]
async fn test_healthz() {
    let response = app()
        .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}
