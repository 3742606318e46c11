//! SupabaseStore 的 PostgREST 请求格式与错误映射

use std::time::Duration;

use apexnurse_api::error::ApiError;
use apexnurse_api::infrastructure::{RestClient, RowQuery};
use apexnurse_api::{AppError, RowStore, SupabaseStore};
use axum::http::StatusCode;
use mockito::{Matcher, Server};
use serde_json::json;

const KEY: &str = "service-role-key";

fn store_for(url: &str, timeout: Duration) -> SupabaseStore {
    let client = RestClient::new(url, KEY, timeout).expect("创建客户端失败");
    SupabaseStore::new(client)
}

#[tokio::test]
async fn test_select_sends_postgrest_params() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/rest/v1/questions")
        .match_header("apikey", KEY)
        .match_header("authorization", format!("Bearer {}", KEY).as_str())
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("select".into(), "paper,series".into()),
            Matcher::UrlEncoded("paper".into(), "ilike.*Paper*1*".into()),
            Matcher::UrlEncoded("order".into(), "id.desc".into()),
            Matcher::UrlEncoded("limit".into(), "5".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([{"paper": "Paper 1", "series": "Quicktest 1"}]).to_string())
        .create_async()
        .await;

    let store = store_for(&server.url(), Duration::from_secs(5));
    let query = RowQuery::from("questions")
        .select("paper,series")
        .ilike_contains("paper", "Paper 1")
        .order_desc("id")
        .limit(5);

    let rows = store.select(&query).await.unwrap();
    assert_eq!(rows, vec![json!({"paper": "Paper 1", "series": "Quicktest 1"})]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_unlimited_select_is_paged() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/rest/v1/questions")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("limit".into(), "1000".into()),
            Matcher::UrlEncoded("offset".into(), "0".into()),
        ]))
        .with_status(200)
        .with_body(json!([{"id": 1}, {"id": 2}]).to_string())
        .expect(1)
        .create_async()
        .await;

    let store = store_for(&server.url(), Duration::from_secs(5));
    let rows = store.select(&RowQuery::from("questions")).await.unwrap();
    assert_eq!(rows.len(), 2);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_error_status_is_fetch_failure() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/rest/v1/questions")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body(r#"{"message":"relation does not exist"}"#)
        .create_async()
        .await;

    let store = store_for(&server.url(), Duration::from_secs(5));
    let err = store
        .select(&RowQuery::from("questions").limit(1))
        .await
        .unwrap_err();

    match &err {
        AppError::Api(ApiError::FetchFailed { table, status, .. }) => {
            assert_eq!(table, "questions");
            assert_eq!(*status, Some(500));
        }
        other => panic!("意外的错误类型: {:?}", other),
    }
    assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    assert!(!err.is_retriable());
}

#[tokio::test]
async fn test_insert_returns_representation() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/rest/v1/performance")
        .match_header("prefer", "return=representation")
        .match_body(Matcher::PartialJson(json!({"user_id": "nurse-1", "score": 8})))
        .with_status(201)
        .with_body(json!([{"id": 42, "user_id": "nurse-1", "score": 8}]).to_string())
        .create_async()
        .await;

    let store = store_for(&server.url(), Duration::from_secs(5));
    let stored = store
        .insert("performance", json!({"user_id": "nurse-1", "score": 8, "total": 10}))
        .await
        .unwrap();

    assert_eq!(stored["id"], json!(42));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_insert_rejected_is_write_failure() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/rest/v1/attempts")
        .with_status(401)
        .with_body("invalid api key")
        .create_async()
        .await;

    let store = store_for(&server.url(), Duration::from_secs(5));
    let err = store
        .insert("attempts", json!({"user_id": "nurse-1"}))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AppError::Api(ApiError::WriteFailed { status: Some(401), .. })
    ));
    assert_eq!(err.kind(), "remote_write_error");
}

#[tokio::test]
async fn test_slow_store_times_out() {
    // 只接受连接、从不响应
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let _server = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let store = store_for(&format!("http://{}", addr), Duration::from_millis(200));
    let err = store
        .select(&RowQuery::from("questions").limit(1))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Api(ApiError::Timeout { .. })));
    assert_eq!(err.status_code(), StatusCode::GATEWAY_TIMEOUT);
    assert!(err.is_retriable());
}
