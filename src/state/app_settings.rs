use log::LevelFilter;
use std::str::FromStr;
use std::time::Duration;
use tourneyfund_api::client::FundApi;
use tourneyfund_api::storage::SessionStorage;

#[derive(Debug, Default, Clone)]
pub struct AppSettings {
    pub full_screen: bool,
    pub log_level: Option<LevelFilter>,
    /// `--api-url`; wins over `TOURNEYFUND_API_URL`.
    pub api_url: Option<String>,
    pub request_timeout: Option<Duration>,
}

impl AppSettings {
    pub fn load() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let log_level = lookup("TOURNEYFUND_LOG").and_then(|v| parse_log_level(&v));
        let request_timeout = lookup("TOURNEYFUND_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);
        Self { full_screen: false, log_level, api_url: None, request_timeout }
    }

    pub fn build_api(&self) -> FundApi {
        let storage = SessionStorage::from_env();
        let api = match self.api_url.as_deref() {
            Some(url) => FundApi::new(url, storage),
            None => FundApi::from_env(storage),
        };
        match self.request_timeout {
            Some(timeout) => api.with_timeout(timeout),
            None => api,
        }
    }
}

fn parse_log_level(value: &str) -> Option<LevelFilter> {
    LevelFilter::from_str(value.trim()).ok()
}

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Run { api_url: Option<String> },
    Logout,
    Help,
    Version,
}

pub fn parse_args<I, S>(args: I) -> Result<CliCommand, String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut api_url = None;
    let mut args = args.into_iter().map(Into::into);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(CliCommand::Help),
            "-V" | "--version" => return Ok(CliCommand::Version),
            "--logout" => return Ok(CliCommand::Logout),
            "--api-url" => match args.next() {
                Some(url) if !url.trim().is_empty() => api_url = Some(url),
                _ => return Err("--api-url needs a value".into()),
            },
            other => match other.strip_prefix("--api-url=") {
                Some(url) if !url.trim().is_empty() => api_url = Some(url.to_owned()),
                _ => return Err(format!("Unknown argument: {other}")),
            },
        }
    }
    Ok(CliCommand::Run { api_url })
}
