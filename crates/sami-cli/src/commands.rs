//! Command implementations. Each returns once its output is printed.

use std::io::{self, Write};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use sami_core::dashboard::{self, ActivityItem, DashboardStats};
use sami_core::{poll, ApiError, Config, QueryParams, SessionError, SessionEvent, SessionStore, SystemStatus};
use sami_core::utils::{format_date, truncate_string};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::args::ListTarget;

/// Environment variable read instead of prompting for a password
const PASSWORD_ENV: &str = "SAMI_PASSWORD";

/// Width of the title column in the activity list
const ACTIVITY_TITLE_WIDTH: usize = 48;

/// How a command ended, when that matters beyond success or failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    /// The backend rejected the token while the command was running
    SessionExpired,
}

// ============================================================================
// Session
// ============================================================================

pub async fn login(session: &SessionStore, config: &mut Config, email: Option<String>) -> Result<()> {
    let email = match email {
        Some(email) => email,
        None => prompt_email(config.last_email.as_deref())?,
    };
    if email.is_empty() {
        return Err(anyhow!("Email is required"));
    }

    let password = match std::env::var(PASSWORD_ENV) {
        Ok(password) if !password.is_empty() => password,
        _ => rpassword::prompt_password("Password: ")?,
    };

    println!("Authenticating...");
    let user = match session.login(&email, &password).await {
        Ok(user) => user,
        Err(SessionError::Api(ApiError::Unauthorized)) => {
            return Err(anyhow!("Invalid email or password"));
        }
        Err(SessionError::Api(e)) if e.is_network() => {
            return Err(anyhow!(
                "Unable to reach {}. Is the backend running?",
                session.api().base_url()
            ));
        }
        Err(e) => return Err(e.into()),
    };

    config.last_email = Some(email);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }

    println!("Logged in as {}", user.display_label());
    Ok(())
}

fn prompt_email(last_email: Option<&str>) -> Result<String> {
    match last_email {
        Some(last) => print!("Email [{}]: ", last),
        None => print!("Email: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    Ok(match last_email {
        Some(last) if input.is_empty() => last.to_string(),
        _ => input.to_string(),
    })
}

pub async fn logout(session: &SessionStore) -> Result<()> {
    session.logout().await;
    println!("Logged out");
    Ok(())
}

pub async fn whoami(session: &SessionStore) -> Result<()> {
    let user = session.require_user().await?;
    println!("{}", user.full_name());
    println!("  Email:      {}", user.email);
    println!("  Role:       {}", user.role);
    if let Some(department) = user.department.as_deref() {
        println!("  Department: {}", department);
    }
    if !user.is_active {
        println!("  (account inactive)");
    }
    Ok(())
}

// ============================================================================
// System
// ============================================================================

pub async fn status(session: &SessionStore) -> Result<()> {
    session.require_user().await?;
    let status = dashboard::system_status(session.api()).await?;
    print_status(&status);
    Ok(())
}

pub async fn health(session: &SessionStore) -> Result<()> {
    let body = session.api().health_check().await?;
    let state = body.get("status").and_then(Value::as_str).unwrap_or("unknown");
    println!("{} is {}", session.api().base_url(), state);
    Ok(())
}

pub async fn show_dashboard(session: &SessionStore) -> Result<()> {
    let user = session.require_user().await?;
    let api = session.api();

    let (stats, activity, status) = tokio::try_join!(
        DashboardStats::load(api),
        dashboard::recent_activity(api),
        dashboard::system_status(api),
    )?;

    println!("Welcome back, {}", user.first_name);
    println!();
    print_stats(&stats);
    println!();
    print_activity(&activity);
    println!();
    print_status(&status);
    Ok(())
}

/// Re-fetch status and recent activity until Ctrl-C or the session ends.
pub async fn watch(
    session: &SessionStore,
    events: &mut broadcast::Receiver<SessionEvent>,
    interval: Duration,
) -> Result<Outcome> {
    session.require_user().await?;
    println!(
        "Refreshing every {}s, press Ctrl-C to stop",
        interval.as_secs()
    );

    let status_api = session.api().clone();
    let (status_poller, mut status_rx) = poll::spawn("status", interval, move || {
        let api = status_api.clone();
        async move { dashboard::system_status(&api).await }
    });

    let activity_api = session.api().clone();
    let (activity_poller, mut activity_rx) = poll::spawn("activity", interval, move || {
        let api = activity_api.clone();
        async move { dashboard::recent_activity(&api).await }
    });

    let outcome = loop {
        tokio::select! {
            Some(result) = status_rx.recv() => match result {
                Ok(status) => {
                    println!("[{}]", Utc::now().format("%H:%M:%S"));
                    print_status(&status);
                }
                Err(e) => warn!(error = %e, "Status refresh failed"),
            },
            Some(result) = activity_rx.recv() => match result {
                Ok(items) => print_activity(&items),
                Err(e) => warn!(error = %e, "Activity refresh failed"),
            },
            event = events.recv() => match event {
                Ok(SessionEvent::Expired) => break Outcome::SessionExpired,
                Ok(event) if event.requires_login() => break Outcome::Done,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => break Outcome::Done,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break Outcome::Done;
            }
        }
    };

    status_poller.stop().await;
    activity_poller.stop().await;
    Ok(outcome)
}

// ============================================================================
// Lists
// ============================================================================

pub async fn get(session: &SessionStore, target: ListTarget, params: QueryParams) -> Result<()> {
    session.require_user().await?;
    let api = session.api();
    let params = Some(&params);

    let body = match target {
        ListTarget::Resource(resource) => api.list(resource, params).await?,
        ListTarget::FuelTransactions => api.fuel_transactions(params).await?,
        ListTarget::RfidTransactions => api.rfid_transactions(params).await?,
        ListTarget::ReportHistory => api.report_history(params).await?,
    };

    let rendered = serde_json::to_string_pretty(&body).context("Failed to render response")?;
    println!("{}", rendered);
    Ok(())
}

// ============================================================================
// Output
// ============================================================================

fn print_stats(stats: &DashboardStats) {
    println!("Overview");
    println!("  Employees  {}", stats.employees);
    println!("  Assets     {}", stats.assets);
    println!("  Projects   {}", stats.projects);
    println!("  Events     {}", stats.events);
}

fn print_activity(items: &[ActivityItem]) {
    println!("Recent activity");
    if items.is_empty() {
        println!("  No recent events");
        return;
    }

    let now = Utc::now();
    for item in items {
        let marker = if item.is_acknowledged() { " " } else { "*" };
        let when = item
            .detected_at
            .as_deref()
            .map(format_date)
            .unwrap_or_default();
        println!(
            "  {} {:<width$} {:>8}  {}",
            marker,
            truncate_string(&item.title, ACTIVITY_TITLE_WIDTH),
            item.age(now),
            when,
            width = ACTIVITY_TITLE_WIDTH,
        );
    }
}

fn print_status(status: &SystemStatus) {
    println!(
        "System status ({}/{} online)",
        status.online_count(),
        status.services.len()
    );
    for service in &status.services {
        println!(
            "  {} {:<10} {:<9} {}",
            service.state.symbol(),
            service.name,
            service.state.to_string(),
            service.description
        );
    }
}
