mod common;

use std::sync::Arc;

use common::{route, Harness};
use sami_core::auth::{MemoryTokenStorage, TokenStorage};
use sami_core::dashboard::DashboardStats;
use sami_core::{ApiClient, ApiError, QueryParams, Resource, SessionEvent};
use serde_json::json;
use wiremock::matchers::{body_json, body_string, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_bearer_token_attached_when_stored() {
    let h = Harness::with_token("tok-123").await;
    Mock::given(method("GET"))
        .and(path(route("/status")))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"database": "connected"})))
        .expect(1)
        .mount(&h.server)
        .await;

    let body = h.api.system_status().await.expect("status succeeds");
    assert_eq!(body, json!({"database": "connected"}));
}

#[tokio::test]
async fn test_every_request_carries_the_current_token() {
    let h = Harness::with_token("first").await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&h.server)
        .await;

    h.api.vehicles().await.unwrap();
    h.storage.store("second").unwrap();
    h.api.rfid_readers().await.unwrap();

    assert_eq!(
        h.authorization_headers().await,
        vec![Some("Bearer first".to_string()), Some("Bearer second".to_string())]
    );
}

#[tokio::test]
async fn test_anonymous_request_has_no_authorization_header() {
    let h = Harness::new().await;
    Mock::given(method("GET"))
        .and(path(route("/health")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "healthy"})))
        .expect(1)
        .mount(&h.server)
        .await;

    let body = h.api.health_check().await.expect("anonymous request proceeds");
    assert_eq!(body["status"], "healthy");
    assert_eq!(h.authorization_headers().await, vec![None]);
}

#[tokio::test]
async fn test_unauthorized_clears_token_and_emits_once() {
    let h = Harness::with_token("expired").await;
    let mut events = h.api.session_events().subscribe();
    Mock::given(method("GET"))
        .and(path(route("/fuel/tanks")))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Could not validate credentials"})))
        .mount(&h.server)
        .await;

    let result = h.api.fuel_tanks().await;

    assert!(matches!(result, Err(ApiError::Unauthorized)));
    assert_eq!(h.storage.load().unwrap(), None);
    assert_eq!(events.try_recv().unwrap(), SessionEvent::Expired);
    assert!(events.try_recv().is_err(), "exactly one expiry event");
}

#[tokio::test]
async fn test_unauthorized_from_write_endpoint_is_handled_the_same() {
    let h = Harness::with_token("expired").await;
    let mut events = h.api.session_events().subscribe();
    Mock::given(method("POST"))
        .and(path(route("/camera/cam-1/start")))
        .respond_with(ResponseTemplate::new(401))
        .mount(&h.server)
        .await;

    assert!(h.api.start_camera("cam-1").await.unwrap_err().is_unauthorized());
    assert_eq!(h.storage.load().unwrap(), None);
    assert_eq!(events.try_recv().unwrap(), SessionEvent::Expired);
}

#[tokio::test]
async fn test_other_errors_pass_through_and_keep_token() {
    let h = Harness::with_token("tok").await;
    let mut events = h.api.session_events().subscribe();
    Mock::given(method("GET"))
        .and(path(route("/employees/99")))
        .respond_with(ResponseTemplate::new(404).set_body_string("Employee not found"))
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path(route("/reports/templates")))
        .respond_with(ResponseTemplate::new(503).set_body_string("down"))
        .mount(&h.server)
        .await;

    let not_found = h.api.fetch_one(Resource::Employees, 99).await.unwrap_err();
    assert!(matches!(not_found, ApiError::NotFound(ref body) if body == "Employee not found"));

    let server_error = h.api.report_templates().await.unwrap_err();
    assert!(matches!(server_error, ApiError::ServerError(..)));
    assert_eq!(server_error.status(), Some(reqwest::StatusCode::SERVICE_UNAVAILABLE));

    assert_eq!(h.storage.load().unwrap().as_deref(), Some("tok"));
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_network_failure_is_reported_once() {
    let storage = Arc::new(MemoryTokenStorage::with_token("tok"));
    // Nothing listens on the discard port
    let api = ApiClient::new("http://127.0.0.1:9/api/v1", storage.clone()).unwrap();

    let err = api.events(None).await.unwrap_err();
    assert!(err.is_network());
    assert_eq!(storage.load().unwrap().as_deref(), Some("tok"));
}

#[tokio::test]
async fn test_limit_params_forwarded_and_body_returned_unmodified() {
    let h = Harness::with_token("tok").await;
    let body = json!([{"id": 1, "first_name": "Ana", "extra": {"nested": [1, 2]}}]);
    Mock::given(method("GET"))
        .and(path(route("/employees")))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
        .expect(1)
        .mount(&h.server)
        .await;

    let returned = h.api.employees(Some(&QueryParams::limit(1))).await.unwrap();
    assert_eq!(returned, body);

    let requests = h.server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.query(), Some("limit=1"));
}

#[tokio::test]
async fn test_list_endpoints_share_param_forwarding() {
    let h = Harness::new().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&h.server)
        .await;

    let params = QueryParams::limit(1);
    h.api.assets(Some(&params)).await.unwrap();
    h.api.fuel_transactions(Some(&params)).await.unwrap();
    h.api.vehicle_history("truck-7", Some(&params)).await.unwrap();
    h.api.rfid_transactions(Some(&params)).await.unwrap();
    h.api.report_history(Some(&params)).await.unwrap();

    let requests = h.server.received_requests().await.unwrap();
    let seen: Vec<(String, Option<String>)> = requests
        .iter()
        .map(|r| (r.url.path().to_string(), r.url.query().map(str::to_string)))
        .collect();
    let limit = Some("limit=1".to_string());
    assert_eq!(
        seen,
        vec![
            (route("/assets"), limit.clone()),
            (route("/fuel/transactions"), limit.clone()),
            (route("/gps/vehicles/truck-7/history"), limit.clone()),
            (route("/rfid/transactions/recent"), limit.clone()),
            (route("/reports/history"), limit),
        ]
    );
}

#[tokio::test]
async fn test_login_is_form_encoded_and_never_sends_a_token() {
    let h = Harness::with_token("stale").await;
    Mock::given(method("POST"))
        .and(path(route("/auth/login")))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("username=user%40x.com&password=good-pass"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "fresh", "token_type": "bearer"})),
        )
        .expect(1)
        .mount(&h.server)
        .await;

    let token = h.api.login("user@x.com", "good-pass").await.unwrap();
    assert_eq!(token.access_token, "fresh");
    assert_eq!(h.authorization_headers().await, vec![None]);
}

#[tokio::test]
async fn test_voice_and_report_defaults() {
    let h = Harness::with_token("tok").await;
    Mock::given(method("POST"))
        .and(path(route("/voice/record")))
        .and(body_json(json!({"duration": 5})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path(route("/voice/speak")))
        .and(body_json(json!({"text": "Fuel level nominal"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"spoken": true})))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path(route("/reports/statistics")))
        .and(query_param("period", "month"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total": 3})))
        .expect(1)
        .mount(&h.server)
        .await;

    h.api.record_voice(None).await.unwrap();
    h.api.speak_text("Fuel level nominal").await.unwrap();
    let stats = h.api.report_statistics(None).await.unwrap();
    assert_eq!(stats["total"], 3);
}

#[tokio::test]
async fn test_crud_verbs_and_empty_bodies() {
    let h = Harness::with_token("tok").await;
    Mock::given(method("PUT"))
        .and(path(route("/assets/3")))
        .and(body_json(json!({"status": "maintenance"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 3, "status": "maintenance"})))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(route("/projects/8")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&h.server)
        .await;

    let updated = h
        .api
        .update(Resource::Assets, 3, &json!({"status": "maintenance"}))
        .await
        .unwrap();
    assert_eq!(updated["status"], "maintenance");

    let deleted = h.api.remove(Resource::Projects, 8).await.unwrap();
    assert!(deleted.is_null());
}

#[tokio::test]
async fn test_invalid_json_is_reported() {
    let h = Harness::new().await;
    Mock::given(method("GET"))
        .and(path(route("/voice/status")))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
        .mount(&h.server)
        .await;

    let err = h.api.voice_status().await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_dashboard_stats_counts_each_list() {
    let h = Harness::with_token("tok").await;
    for (resource, body) in [
        ("/employees", json!([{"id": 1}])),
        ("/assets", json!([{"id": 1}])),
        ("/projects", json!([])),
        ("/events", json!([{"id": 9}])),
    ] {
        Mock::given(method("GET"))
            .and(path(route(resource)))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&h.server)
            .await;
    }

    let stats = DashboardStats::load(&h.api).await.unwrap();
    assert_eq!(
        stats,
        DashboardStats {
            employees: 1,
            assets: 1,
            projects: 0,
            events: 1,
        }
    );
}
