use chrono::NaiveDate;
use rollcall_core::Status;
use rollcall_notion::{DatabaseId, NotionClient, RecordId, StatusStore};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> NotionClient {
    NotionClient::new("ntn_test", &format!("{}/v1/", server.uri())).unwrap()
}

fn day(d: u32, m: u32, y: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn children(results: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "object": "list",
        "results": results,
        "has_more": false,
        "next_cursor": null
    }))
}

#[tokio::test]
async fn dated_page_resolves_to_its_databases() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/blocks/parent/children"))
        .and(header("authorization", "Bearer ntn_test"))
        .and(header("notion-version", "2022-06-28"))
        .respond_with(children(json!([
            { "id": "p-26", "type": "child_page", "child_page": { "title": "26.09.2025 Cuma" } },
            { "id": "p-27", "type": "child_page", "child_page": { "title": "Yoklama 27.09.2025 Cumartesi" } }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/blocks/p-27/children"))
        .respond_with(children(json!([
            { "id": "para", "type": "paragraph" },
            { "id": "db-27", "type": "child_database", "child_database": { "title": "Liste" } }
        ])))
        .mount(&server)
        .await;

    let dbs = client(&server)
        .databases_for_dates("parent", &[day(27, 9, 2025)])
        .await
        .unwrap();
    assert_eq!(dbs, [DatabaseId("db-27".into())]);
}

#[tokio::test]
async fn dated_database_is_returned_directly() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/blocks/parent/children"))
        .respond_with(children(json!([
            { "id": "db-x", "type": "child_database", "child_database": { "title": "27/09/2025" } }
        ])))
        .mount(&server)
        .await;

    let client = client(&server);
    assert_eq!(
        client.databases_for_dates("parent", &[day(27, 9, 2025), day(26, 9, 2025)]).await.unwrap(),
        [DatabaseId("db-x".into())]
    );
    assert!(client.databases_for_dates("parent", &[day(28, 9, 2025)]).await.unwrap().is_empty());
}

#[tokio::test]
async fn children_listing_follows_cursors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/blocks/parent/children"))
        .and(query_param("start_cursor", "c2"))
        .respond_with(children(json!([
            { "id": "p-2", "type": "child_page", "child_page": { "title": "28-09-2025" } }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/blocks/parent/children"))
        .and(query_param("page_size", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "id": "p-1", "type": "child_page", "child_page": { "title": "27.09.2025" } }],
            "has_more": true,
            "next_cursor": "c2"
        })))
        .mount(&server)
        .await;
    for (page, db) in [("p-1", "db-1"), ("p-2", "db-2")] {
        Mock::given(method("GET"))
            .and(path(format!("/v1/blocks/{page}/children")))
            .respond_with(children(json!([
                { "id": db, "type": "child_database", "child_database": { "title": "" } }
            ])))
            .mount(&server)
            .await;
    }

    let dbs = client(&server)
        .databases_for_dates("parent", &[day(28, 9, 2025), day(27, 9, 2025)])
        .await
        .unwrap();
    // Ordered by the requested dates, not by listing order.
    assert_eq!(dbs, [DatabaseId("db-2".into()), DatabaseId("db-1".into())]);
}

#[tokio::test]
async fn record_lookup_matches_title_or_text_ignoring_case() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/databases/db-27/query"))
        .and(body_json(json!({ "page_size": 100 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                { "id": "r-1", "properties": {
                    "İsim": { "type": "title", "title": [{ "plain_text": "Mehmet Kaya" }] }
                } },
                { "id": "r-2", "properties": {
                    "İsim": { "type": "title", "title": [{ "plain_text": "Grup B" }] },
                    "Not": { "type": "rich_text", "rich_text": [{ "plain_text": "Ayşe Demir (yedek)" }] }
                } }
            ],
            "has_more": false
        })))
        .mount(&server)
        .await;

    let client = client(&server);
    let db = DatabaseId("db-27".into());
    assert_eq!(
        client.find_record_by_name(&db, "mehmet kaya").await.unwrap(),
        Some(RecordId("r-1".into()))
    );
    assert_eq!(
        client.find_record_by_name(&db, "Ayşe Demir").await.unwrap(),
        Some(RecordId("r-2".into()))
    );
    assert_eq!(client.find_record_by_name(&db, "Zeynep").await.unwrap(), None);
    assert_eq!(client.find_record_by_name(&db, "  ").await.unwrap(), None);
}

#[tokio::test]
async fn status_is_written_by_column_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/databases/db-27"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "database",
            "properties": {
                "İsim": { "type": "title" },
                "Durum": { "type": "select" }
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/v1/pages/r-1"))
        .and(body_json(json!({ "properties": { "Durum": { "select": { "name": "Kaldı" } } } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "r-1" })))
        .expect(1)
        .mount(&server)
        .await;

    let ok = client(&server)
        .set_status(&DatabaseId("db-27".into()), &RecordId("r-1".into()), Status::Postponed)
        .await
        .unwrap();
    assert!(ok);
}

#[tokio::test]
async fn missing_status_column_is_a_refusal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/databases/db-27"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "properties": { "İsim": { "type": "title" } }
        })))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let ok = client(&server)
        .set_status(&DatabaseId("db-27".into()), &RecordId("r-1".into()), Status::Attended)
        .await
        .unwrap();
    assert!(!ok);
}
