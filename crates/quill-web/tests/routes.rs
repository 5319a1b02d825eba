//! Router tests driven through `tower::ServiceExt::oneshot`

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use quill_config::QuillConfig;
use quill_web::{app, AppState};
use serde_json::Value;
use tower::ServiceExt;

fn test_app() -> Router {
    app_with(QuillConfig::default())
}

fn app_with(config: QuillConfig) -> Router {
    app(AppState::new(config).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_form(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/repl")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

// ============================================================================
// REPL
// ============================================================================

#[tokio::test]
async fn root_redirects_to_repl() {
    let response = test_app().oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/repl");
}

#[tokio::test]
async fn empty_history_renders_form() {
    let (status, body) = send(&test_app(), get("/repl")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<form method=\"post\" action=\"/repl\">"));
    assert!(body.contains("name=\"expr\""));
}

#[tokio::test]
async fn posting_an_expression_appends_and_renders_it() {
    let app = test_app();
    let (status, body) = send(&app, post_form("expr=%28%2B+1+2%29")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<td><pre>(+ 1 2)</pre></td><td>3</td>"));

    let (_, body) = send(&app, post_form("expr=%28println+%22hi%22%29")).await;
    assert!(body.contains("<td><pre>(+ 1 2)</pre></td>"));
    assert!(body.contains("<td><pre>hi\n</pre></td>"));

    let (_, body) = send(&app, get("/repl")).await;
    let first = body.find("(+ 1 2)").unwrap();
    let second = body.find("(println").unwrap();
    assert!(first < second, "history renders oldest first");
}

#[tokio::test]
async fn captured_script_tags_are_escaped() {
    let (_, body) = send(
        &test_app(),
        post_form("expr=%28println+%22%3Cscript%3Ealert%281%29%3C%2Fscript%3E%22%29"),
    )
    .await;
    assert!(body.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    assert!(!body.contains("<script>"));
}

#[tokio::test]
async fn failures_are_shown_not_raised() {
    let app = test_app();
    let (status, body) = send(&app, post_form("expr=%28%2B+1")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("EOF while reading"));

    let (status, body) = send(&app, post_form("")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("EOF while reading"));
}

#[tokio::test]
async fn result_symbols_link_into_the_browser() {
    let (_, body) = send(&test_app(), post_form("expr=%27map")).await;
    assert!(body.contains("<td><a href=\"/ns/quill.core/map\">map</a></td>"));
}

#[tokio::test]
async fn timeout_is_recorded_as_stderr() {
    let mut config = QuillConfig::default();
    config.repl.eval_timeout_secs = Some(0);
    let app = app_with(config);

    let (status, body) = send(&app, post_form("expr=%28count+%28range+2000000%29%29")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Evaluation timed out after 0s"));
}

#[tokio::test]
async fn oversized_bodies_are_rejected() {
    let mut config = QuillConfig::default();
    config.server.max_body_bytes = 16;
    let app = app_with(config);

    let (status, _) = send(&app, post_form(&format!("expr={}", "1".repeat(64)))).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

// ============================================================================
// NAMESPACE BROWSER
// ============================================================================

#[tokio::test]
async fn namespace_index_links_every_namespace() {
    let (status, body) = send(&test_app(), get("/ns")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<a href=\"/ns/quill.core\">quill.core</a>"));
    assert!(body.contains("<a href=\"/ns/user\">user</a>"));
}

#[tokio::test]
async fn namespace_page_links_symbols() {
    let (status, body) = send(&test_app(), get("/ns/quill.core")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<a href=\"/ns/quill.core/map\">map</a>"));
    assert!(body.contains("<a href=\"/ns/quill.core/swap%21\">swap!</a>"));
}

#[tokio::test]
async fn symbol_page_decodes_encoded_names() {
    let (status, body) = send(&test_app(), get("/ns/quill.core/swap%21")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<h1>swap!</h1>"));
    assert!(body.contains("<a href=\"/ns/quill.core\">quill.core</a>"));
}

#[tokio::test]
async fn definitions_from_the_repl_are_browsable() {
    let app = test_app();
    send(
        &app,
        post_form("expr=%28defn+greet+%5Bn%5D+%28str+%22hi+%22+n%29%29"),
    )
    .await;

    let (_, body) = send(&app, get("/ns/user")).await;
    assert!(body.contains("<a href=\"/ns/user/greet\">greet</a>"));

    let (_, body) = send(&app, get("/ns/user/greet")).await;
    assert!(body.contains("<pre>(defn greet [n] (str &quot;hi &quot; n))</pre>")
        || body.contains("<pre>(defn greet [n] (str \"hi \" n))</pre>"));
}

#[tokio::test]
async fn unknown_namespaces_and_symbols_are_404() {
    let app = test_app();
    let (status, body) = send(&app, get("/ns/nonexistent.ns/foo")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("No such symbol: nonexistent.ns/foo"));

    let (status, body) = send(&app, get("/ns/nonexistent.ns")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("No such namespace: nonexistent.ns"));
}

// ============================================================================
// JSON AND HEALTH
// ============================================================================

#[tokio::test]
async fn history_api_lists_records_as_json() {
    let app = test_app();
    send(&app, post_form("expr=%28%2B+1+2%29")).await;

    let (status, body) = send(&app, get("/api/history")).await;
    assert_eq!(status, StatusCode::OK);
    let records: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(records.as_array().unwrap().len(), 1);
    assert_eq!(records[0]["expression"], "(+ 1 2)");
    assert_eq!(records[0]["result"], "3");
    assert_eq!(records[0]["stderr"], "");
}

#[tokio::test]
async fn health_reports_service_name() {
    let (status, body) = send(&test_app(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "quill-web");
}

#[test]
fn invalid_repl_settings_are_rejected() {
    let mut config = QuillConfig::default();
    config.repl.max_depth = 0;
    assert!(AppState::new(config).is_err());
}
