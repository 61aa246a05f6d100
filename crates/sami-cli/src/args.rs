//! Command-line parsing for the `sami` binary.

use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use sami_core::{QueryParams, Resource};
use serde_json::Value;

pub const USAGE: &str = "\
Usage: sami <command> [args]

Commands:
  login [email]                    Sign in (password from prompt or SAMI_PASSWORD)
  logout                           Sign out and forget the stored token
  whoami                           Show the signed-in user
  status                           Show subsystem status
  health                           Check that the backend is reachable
  dashboard                        Stat cards, recent activity and status
  watch [secs]                     Re-fetch status and activity until Ctrl-C
  get <list> [--limit N] [k=v...]  Fetch a list as JSON
  help                             Show this message

Lists: employees, assets, projects, events, fuel-transactions,
       rfid-transactions, report-history

Environment:
  SAMI_API_URL   Backend base URL (default http://localhost:8000/api/v1)
  SAMI_LOG_DIR   Also write a daily log file to this directory
  RUST_LOG       Log filter (default warn)";

/// Lists reachable through `sami get`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListTarget {
    Resource(Resource),
    FuelTransactions,
    RfidTransactions,
    ReportHistory,
}

impl ListTarget {
    fn parse(name: &str) -> Option<Self> {
        if let Some(resource) = Resource::parse(name) {
            return Some(ListTarget::Resource(resource));
        }
        match name {
            "fuel-transactions" => Some(ListTarget::FuelTransactions),
            "rfid-transactions" => Some(ListTarget::RfidTransactions),
            "report-history" | "reports" => Some(ListTarget::ReportHistory),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum Command {
    Login { email: Option<String> },
    Logout,
    WhoAmI,
    Status,
    Health,
    Dashboard,
    Watch { interval: Option<Duration> },
    Get { target: ListTarget, params: QueryParams },
    Help,
}

impl Command {
    /// Parse everything after the program name
    pub fn parse(args: &[String]) -> Result<Self> {
        let Some((name, rest)) = args.split_first() else {
            return Ok(Command::Help);
        };

        let command = match name.as_str() {
            "login" => Command::Login {
                email: rest.first().cloned(),
            },
            "logout" => Command::Logout,
            "whoami" => Command::WhoAmI,
            "status" => Command::Status,
            "health" => Command::Health,
            "dashboard" => Command::Dashboard,
            "watch" => {
                let interval = match rest.first() {
                    Some(secs) => Some(parse_interval(secs)?),
                    None => None,
                };
                Command::Watch { interval }
            }
            "get" => {
                let (list, params) = rest
                    .split_first()
                    .ok_or_else(|| anyhow!("`get` needs a list name, see `sami help`"))?;
                let target = ListTarget::parse(list)
                    .ok_or_else(|| anyhow!("Unknown list '{}', see `sami help`", list))?;
                Command::Get {
                    target,
                    params: parse_params(params)?,
                }
            }
            "help" | "--help" | "-h" => Command::Help,
            other => bail!("Unknown command '{}', see `sami help`", other),
        };
        Ok(command)
    }

    /// Whether the command reports 401s as an expired session.
    /// A rejected login is a bad password, not an expiry.
    pub fn reports_expiry(&self) -> bool {
        !matches!(self, Command::Login { .. } | Command::Help)
    }
}

fn parse_interval(raw: &str) -> Result<Duration> {
    let secs: u64 = raw
        .parse()
        .map_err(|_| anyhow!("Interval must be a whole number of seconds, got '{}'", raw))?;
    if secs == 0 {
        bail!("Interval must be at least one second");
    }
    Ok(Duration::from_secs(secs))
}

/// `--limit N` and `key=value` pairs. A key given twice becomes a list.
fn parse_params(args: &[String]) -> Result<QueryParams> {
    let mut params = QueryParams::new();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        if arg == "--limit" {
            let raw = iter
                .next()
                .ok_or_else(|| anyhow!("--limit needs a value"))?;
            let limit: u32 = raw
                .parse()
                .map_err(|_| anyhow!("--limit must be a number, got '{}'", raw))?;
            params.insert("limit", limit);
            continue;
        }

        let (key, value) = arg
            .split_once('=')
            .filter(|(key, _)| !key.is_empty())
            .ok_or_else(|| anyhow!("Expected key=value, got '{}'", arg))?;
        let value = Value::String(value.to_string());

        let merged = match params.as_map().get(key).cloned() {
            Some(Value::Array(mut items)) => {
                items.push(value);
                Value::Array(items)
            }
            Some(existing) => Value::Array(vec![existing, value]),
            None => value,
        };
        params.insert(key, merged);
    }

    Ok(params)
}
