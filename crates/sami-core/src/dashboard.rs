//! Dashboard view data assembled from several endpoints.
//!
//! These helpers sit above the endpoint layer. They read the raw bodies the
//! endpoints return and pick out what the dashboard panels show.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::api::{ApiClient, ApiResult, QueryParams};
use crate::models::SystemStatus;
use crate::utils::{age_display, parse_timestamp};

/// Number of events shown in the recent activity panel
pub const RECENT_ACTIVITY_LIMIT: u32 = 5;

/// Headline counts for the dashboard stat cards.
///
/// Each list is requested with `{limit: 1}`, so a count of 1 means
/// "at least one record exists".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub employees: usize,
    pub assets: usize,
    pub projects: usize,
    pub events: usize,
}

impl DashboardStats {
    /// Fetch all four lists concurrently. The first failure wins.
    pub async fn load(api: &ApiClient) -> ApiResult<Self> {
        let params = QueryParams::limit(1);
        let (employees, assets, projects, events) = futures::try_join!(
            api.employees(Some(&params)),
            api.assets(Some(&params)),
            api.projects(Some(&params)),
            api.events(Some(&params)),
        )?;

        Ok(Self {
            employees: list_len(&employees),
            assets: list_len(&assets),
            projects: list_len(&projects),
            events: list_len(&events),
        })
    }
}

fn list_len(body: &Value) -> usize {
    body.as_array().map(Vec::len).unwrap_or(0)
}

/// One row of the recent activity panel, read from an event record.
#[derive(Debug, Clone, Deserialize)]
pub struct ActivityItem {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub detected_at: Option<String>,
}

impl ActivityItem {
    pub fn detected_at(&self) -> Option<DateTime<Utc>> {
        self.detected_at.as_deref().and_then(parse_timestamp)
    }

    /// "5m ago", or "unknown" when the record has no usable timestamp
    pub fn age(&self, now: DateTime<Utc>) -> String {
        self.detected_at()
            .map(|at| age_display(at, now))
            .unwrap_or_else(|| "unknown".to_string())
    }

    pub fn is_acknowledged(&self) -> bool {
        matches!(self.status.as_deref(), Some("acknowledged") | Some("resolved"))
    }
}

/// Read activity rows out of an events list body. Entries that aren't
/// objects are skipped.
pub fn activity_from_events(body: &Value) -> Vec<ActivityItem> {
    body.as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

pub async fn recent_activity(api: &ApiClient) -> ApiResult<Vec<ActivityItem>> {
    let body = api
        .events(Some(&QueryParams::limit(RECENT_ACTIVITY_LIMIT)))
        .await?;
    Ok(activity_from_events(&body))
}

pub async fn system_status(api: &ApiClient) -> ApiResult<SystemStatus> {
    let body = api.system_status().await?;
    Ok(SystemStatus::from_value(body))
}
