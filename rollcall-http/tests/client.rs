use rollcall_http::{Auth, HttpClient, HttpError, RequestOpts};
use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> HttpClient {
    HttpClient::new(&format!("{}/v1/", server.uri()))
        .unwrap()
        .with_default_header("notion-version", "2022-06-28")
        .unwrap()
}

#[tokio::test]
async fn get_sends_auth_default_headers_and_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/blocks/abc/children"))
        .and(header("authorization", "Bearer ntn_token"))
        .and(header("notion-version", "2022-06-28"))
        .and(query_param("page_size", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let got: Value = client_for(&server)
        .get_json(
            "blocks/abc/children",
            RequestOpts {
                auth: Some(Auth::Bearer("ntn_token")),
                query: Some(vec![("page_size", "100".into())]),
                ..Default::default()
            },
        )
        .await
        .expect("get ok");

    assert_eq!(got, json!({ "results": [] }));
}

#[tokio::test]
async fn patch_serializes_body() {
    let server = MockServer::start().await;
    let body = json!({ "properties": { "Durum": { "select": { "name": "Gidildi" } } } });
    Mock::given(method("PATCH"))
        .and(path("/v1/pages/row-1"))
        .and(body_json(&body))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "row-1" })))
        .expect(1)
        .mount(&server)
        .await;

    let got: Value = client_for(&server)
        .patch_json("pages/row-1", &body, RequestOpts::default())
        .await
        .expect("patch ok");
    assert_eq!(got["id"], "row-1");
}

#[tokio::test]
async fn server_errors_are_retried_then_succeed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/databases/db/query"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/databases/db/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(&server)
        .await;

    let got: Value = client_for(&server)
        .post_json("databases/db/query", &json!({}), RequestOpts::default())
        .await
        .expect("retried into success");
    assert_eq!(got["ok"], true);
}

#[tokio::test]
async fn client_errors_surface_notion_message_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/databases/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "object": "error",
            "status": 404,
            "code": "object_not_found",
            "message": "Could not find database"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get_json::<Value>("databases/missing", RequestOpts::default())
        .await
        .unwrap_err();

    assert_eq!(err.status().map(|s| s.as_u16()), Some(404));
    match err {
        HttpError::Api { message, .. } => {
            assert_eq!(message, "object_not_found: Could not find database")
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn undecodable_success_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get_json::<Value>("users/me", RequestOpts::default())
        .await
        .unwrap_err();
    assert!(matches!(err, HttpError::Decode(_, _)));
}

#[tokio::test]
async fn requests_without_auth_send_no_authorization_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/ping"))
        .respond_with(|req: &wiremock::Request| {
            if req.headers.contains_key("authorization") {
                ResponseTemplate::new(400)
            } else {
                ResponseTemplate::new(200).set_body_json(json!({ "ok": true }))
            }
        })
        .expect(1)
        .mount(&server)
        .await;

    let got: Value = client_for(&server)
        .get_json("ping", RequestOpts::default())
        .await
        .expect("unauthenticated get ok");
    assert_eq!(got["ok"], true);
}
