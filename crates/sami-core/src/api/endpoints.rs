//! Typed endpoint functions for the SAMI backend.
//!
//! Each function names a verb and a route and forwards its params or body.
//! Response bodies come back exactly as the backend sent them.

use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Value};

use crate::models::{TokenResponse, User};

use super::client::ApiClient;
use super::error::ApiResult;
use super::params::QueryParams;

/// Recording length used when the caller doesn't specify one
pub const DEFAULT_RECORD_SECONDS: u32 = 5;

/// Period used for report statistics when the caller doesn't specify one
pub const DEFAULT_STATISTICS_PERIOD: &str = "month";

/// Deadline for the server-side logout call. Local logout waits on it.
pub const LOGOUT_TIMEOUT: Duration = Duration::from_secs(5);

/// CRUD resources that share the list/get/create/update/delete shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Employees,
    Assets,
    Projects,
    Events,
}

impl Resource {
    pub fn path(&self) -> &'static str {
        match self {
            Resource::Employees => "/employees",
            Resource::Assets => "/assets",
            Resource::Projects => "/projects",
            Resource::Events => "/events",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "employees" | "employee" => Some(Resource::Employees),
            "assets" | "asset" => Some(Resource::Assets),
            "projects" | "project" => Some(Resource::Projects),
            "events" | "event" => Some(Resource::Events),
            _ => None,
        }
    }
}

impl ApiClient {
    // ===== Auth =====

    /// Exchange credentials for a token. Sent form-encoded without any
    /// stored token attached.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<TokenResponse> {
        self.post_form_anonymous("/auth/login", &[("username", email), ("password", password)])
            .await
    }

    pub async fn current_user(&self) -> ApiResult<User> {
        self.get("/auth/me", None).await
    }

    /// Tell the backend the token is done with. Bounded by [`LOGOUT_TIMEOUT`].
    pub async fn logout(&self) -> ApiResult<Value> {
        self.post_empty_within("/auth/logout", LOGOUT_TIMEOUT).await
    }

    pub async fn refresh_token(&self) -> ApiResult<TokenResponse> {
        self.post_empty("/auth/refresh").await
    }

    pub async fn verify_token(&self) -> ApiResult<Value> {
        self.get("/auth/verify-token", None).await
    }

    // ===== System =====

    pub async fn system_status(&self) -> ApiResult<Value> {
        self.get("/status", None).await
    }

    pub async fn health_check(&self) -> ApiResult<Value> {
        self.get("/health", None).await
    }

    // ===== Employees / Assets / Projects / Events =====

    pub async fn list(&self, resource: Resource, params: Option<&QueryParams>) -> ApiResult<Value> {
        self.get(resource.path(), params).await
    }

    pub async fn fetch_one(&self, resource: Resource, id: i64) -> ApiResult<Value> {
        self.get(&format!("{}/{}", resource.path(), id), None).await
    }

    pub async fn create<B: Serialize + ?Sized>(&self, resource: Resource, data: &B) -> ApiResult<Value> {
        self.post(resource.path(), Some(data)).await
    }

    pub async fn update<B: Serialize + ?Sized>(
        &self,
        resource: Resource,
        id: i64,
        data: &B,
    ) -> ApiResult<Value> {
        self.put(&format!("{}/{}", resource.path(), id), data).await
    }

    pub async fn remove(&self, resource: Resource, id: i64) -> ApiResult<Value> {
        self.delete(&format!("{}/{}", resource.path(), id)).await
    }

    pub async fn employees(&self, params: Option<&QueryParams>) -> ApiResult<Value> {
        self.list(Resource::Employees, params).await
    }

    pub async fn assets(&self, params: Option<&QueryParams>) -> ApiResult<Value> {
        self.list(Resource::Assets, params).await
    }

    pub async fn projects(&self, params: Option<&QueryParams>) -> ApiResult<Value> {
        self.list(Resource::Projects, params).await
    }

    pub async fn events(&self, params: Option<&QueryParams>) -> ApiResult<Value> {
        self.list(Resource::Events, params).await
    }

    pub async fn acknowledge_event(&self, id: i64) -> ApiResult<Value> {
        self.post_empty(&format!("/events/{}/acknowledge", id)).await
    }

    pub async fn employee_check_in<B: Serialize + ?Sized>(&self, data: &B) -> ApiResult<Value> {
        self.post("/employees/check-in", Some(data)).await
    }

    pub async fn employee_check_out<B: Serialize + ?Sized>(&self, data: &B) -> ApiResult<Value> {
        self.post("/employees/check-out", Some(data)).await
    }

    pub async fn employee_check_ins(&self, id: i64, params: Option<&QueryParams>) -> ApiResult<Value> {
        self.get(&format!("/employees/{}/check-ins", id), params).await
    }

    pub async fn employees_present_count(&self) -> ApiResult<Value> {
        self.get("/employees/present/count", None).await
    }

    // ===== Fuel =====

    pub async fn fuel_transactions(&self, params: Option<&QueryParams>) -> ApiResult<Value> {
        self.get("/fuel/transactions", params).await
    }

    pub async fn fuel_tanks(&self) -> ApiResult<Value> {
        self.get("/fuel/tanks", None).await
    }

    pub async fn fuel_consumption(&self, params: Option<&QueryParams>) -> ApiResult<Value> {
        self.get("/fuel/consumption", params).await
    }

    // ===== GPS =====

    pub async fn vehicles(&self) -> ApiResult<Value> {
        self.get("/gps/vehicles", None).await
    }

    pub async fn vehicle_location(&self, vehicle_id: &str) -> ApiResult<Value> {
        self.get(&format!("/gps/vehicles/{}/location", vehicle_id), None)
            .await
    }

    pub async fn vehicle_history(
        &self,
        vehicle_id: &str,
        params: Option<&QueryParams>,
    ) -> ApiResult<Value> {
        self.get(&format!("/gps/vehicles/{}/history", vehicle_id), params)
            .await
    }

    pub async fn gps_recent_alerts(&self, params: Option<&QueryParams>) -> ApiResult<Value> {
        self.get("/gps/alerts/recent", params).await
    }

    // ===== Voice =====

    pub async fn voice_status(&self) -> ApiResult<Value> {
        self.get("/voice/status", None).await
    }

    pub async fn voice_commands(&self) -> ApiResult<Value> {
        self.get("/voice/commands", None).await
    }

    /// Record from the backend's microphone. `None` records for
    /// [`DEFAULT_RECORD_SECONDS`].
    pub async fn record_voice(&self, duration: Option<u32>) -> ApiResult<Value> {
        let body = json!({ "duration": duration.unwrap_or(DEFAULT_RECORD_SECONDS) });
        self.post("/voice/record", Some(&body)).await
    }

    pub async fn speak_text(&self, text: &str) -> ApiResult<Value> {
        self.post("/voice/speak", Some(&json!({ "text": text }))).await
    }

    // ===== Camera =====

    pub async fn cameras(&self) -> ApiResult<Value> {
        self.get("/camera/status", None).await
    }

    pub async fn camera_status(&self, camera_id: &str) -> ApiResult<Value> {
        self.get(&format!("/camera/{}/status", camera_id), None).await
    }

    pub async fn start_camera(&self, camera_id: &str) -> ApiResult<Value> {
        self.post_empty(&format!("/camera/{}/start", camera_id)).await
    }

    pub async fn stop_camera(&self, camera_id: &str) -> ApiResult<Value> {
        self.post_empty(&format!("/camera/{}/stop", camera_id)).await
    }

    pub async fn capture_image(&self, camera_id: &str) -> ApiResult<Value> {
        self.post_empty(&format!("/camera/{}/capture", camera_id)).await
    }

    pub async fn start_all_cameras(&self) -> ApiResult<Value> {
        self.post_empty("/camera/start-all").await
    }

    pub async fn stop_all_cameras(&self) -> ApiResult<Value> {
        self.post_empty("/camera/stop-all").await
    }

    // ===== RFID =====

    pub async fn rfid_readers(&self) -> ApiResult<Value> {
        self.get("/rfid/readers/status", None).await
    }

    pub async fn rfid_reader_status(&self, reader_id: &str) -> ApiResult<Value> {
        self.get(&format!("/rfid/readers/{}/status", reader_id), None)
            .await
    }

    pub async fn start_rfid_reader(&self, reader_id: &str) -> ApiResult<Value> {
        self.post_empty(&format!("/rfid/readers/{}/start", reader_id))
            .await
    }

    pub async fn stop_rfid_reader(&self, reader_id: &str) -> ApiResult<Value> {
        self.post_empty(&format!("/rfid/readers/{}/stop", reader_id))
            .await
    }

    pub async fn start_all_rfid_readers(&self) -> ApiResult<Value> {
        self.post_empty("/rfid/readers/start-all").await
    }

    pub async fn stop_all_rfid_readers(&self) -> ApiResult<Value> {
        self.post_empty("/rfid/readers/stop-all").await
    }

    pub async fn rfid_transactions(&self, params: Option<&QueryParams>) -> ApiResult<Value> {
        self.get("/rfid/transactions/recent", params).await
    }

    // ===== Reports =====

    pub async fn report_templates(&self) -> ApiResult<Value> {
        self.get("/reports/templates", None).await
    }

    pub async fn generate_report<B: Serialize + ?Sized>(&self, data: &B) -> ApiResult<Value> {
        self.post("/reports/generate", Some(data)).await
    }

    pub async fn report_history(&self, params: Option<&QueryParams>) -> ApiResult<Value> {
        self.get("/reports/history", params).await
    }

    /// `None` asks for [`DEFAULT_STATISTICS_PERIOD`].
    pub async fn report_statistics(&self, period: Option<&str>) -> ApiResult<Value> {
        let params =
            QueryParams::new().with("period", period.unwrap_or(DEFAULT_STATISTICS_PERIOD));
        self.get("/reports/statistics", Some(&params)).await
    }
}
