//! Site configuration: optional JSON file plus environment overrides.

use std::{
    env, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::{handoff::HandoffSettings, links::HandoffLinks};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/site.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "NEXTQUEST_SITE_CONFIG_PATH";
const ENVIRONMENT_ENV: &str = "NEXTQUEST_ENV";
const PREVIEW_API_URL_ENV: &str = "NEXTQUEST_PREVIEW_API_URL";
const FALLBACK_DELAY_ENV: &str = "NEXTQUEST_FALLBACK_DELAY_MS";
const STATIC_DIR_ENV: &str = "STATIC_DIR";

const DEFAULT_FALLBACK_DELAY: Duration = Duration::from_millis(900);
const DEFAULT_DEV_GUARD_TTL: Duration = Duration::from_secs(5 * 60);
const DEFAULT_PREVIEW_TIMEOUT: Duration = Duration::from_millis(4_000);
const DEFAULT_APP_SCHEME: &str = "nextquest";
const DEFAULT_IOS_STORE_URL: &str = "https://apps.apple.com/app/nextquest";
const DEFAULT_ANDROID_STORE_URL: &str =
    "https://play.google.com/store/apps/details?id=com.nextquest";

/// Deployment flavour. Development shortens loop guards and surfaces preview failures in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local testing.
    Development,
    /// Public deployment.
    Production,
}

impl Environment {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Environment::Development),
            "production" | "prod" => Some(Environment::Production),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    environment: Environment,
    preview_api_url: Option<String>,
    preview_timeout: Duration,
    fallback_delay: Duration,
    dev_guard_ttl: Duration,
    app_scheme: String,
    ios_store_url: String,
    android_store_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Production,
            preview_api_url: None,
            preview_timeout: DEFAULT_PREVIEW_TIMEOUT,
            fallback_delay: DEFAULT_FALLBACK_DELAY,
            dev_guard_ttl: DEFAULT_DEV_GUARD_TTL,
            app_scheme: DEFAULT_APP_SCHEME.into(),
            ios_store_url: DEFAULT_IOS_STORE_URL.into(),
            android_store_url: DEFAULT_ANDROID_STORE_URL.into(),
        }
    }
}

impl AppConfig {
    /// Load the configuration file (if any) and apply environment overrides.
    pub fn load() -> Self {
        let raw = read_config_file(&resolve_config_path());
        Self::from_sources(raw, |key| env::var(key).ok())
    }

    /// Merge a parsed file with environment lookups. Environment wins.
    pub fn from_sources<F>(raw: Option<RawConfig>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = raw.map(Self::from).unwrap_or_default();

        if let Some(value) = lookup(ENVIRONMENT_ENV) {
            match Environment::parse(&value) {
                Some(environment) => config.environment = environment,
                None => warn!(value = %value, "unknown {ENVIRONMENT_ENV}; keeping {:?}", config.environment),
            }
        }

        if let Some(url) = lookup(PREVIEW_API_URL_ENV) {
            config.preview_api_url = non_empty(url);
        }

        if let Some(value) = lookup(FALLBACK_DELAY_ENV) {
            match value.trim().parse::<u64>() {
                Ok(ms) => config.fallback_delay = Duration::from_millis(ms),
                Err(err) => warn!(value = %value, error = %err, "invalid {FALLBACK_DELAY_ENV}; ignoring"),
            }
        }

        config
    }

    /// Whether the site runs in development mode.
    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    /// Configured deployment flavour.
    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Base URL of the preview API, without trailing slash handling.
    pub fn preview_api_url(&self) -> Option<&str> {
        self.preview_api_url.as_deref()
    }

    /// Upper bound for a single preview request.
    pub fn preview_timeout(&self) -> Duration {
        self.preview_timeout
    }

    /// Delay between the app launch and the store fallback.
    pub fn fallback_delay(&self) -> Duration {
        self.fallback_delay
    }

    /// Loop-guard lifetime: bounded in development, session-long in production.
    pub fn guard_ttl(&self) -> Option<Duration> {
        self.is_development().then_some(self.dev_guard_ttl)
    }

    /// Scheme and store URLs.
    pub fn links(&self) -> HandoffLinks {
        HandoffLinks::new(
            self.app_scheme.clone(),
            self.ios_store_url.clone(),
            self.android_store_url.clone(),
        )
    }

    /// Settings handed to every handoff controller.
    pub fn handoff_settings(&self) -> HandoffSettings {
        HandoffSettings {
            links: self.links(),
            fallback_delay: self.fallback_delay,
            guard_ttl: self.guard_ttl(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
pub struct RawConfig {
    environment: Option<Environment>,
    preview_api_url: Option<String>,
    preview_timeout_ms: Option<u64>,
    fallback_delay_ms: Option<u64>,
    dev_guard_ttl_secs: Option<u64>,
    app_scheme: Option<String>,
    ios_store_url: Option<String>,
    android_store_url: Option<String>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            environment: value.environment.unwrap_or(defaults.environment),
            preview_api_url: value.preview_api_url.and_then(non_empty),
            preview_timeout: value
                .preview_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.preview_timeout),
            fallback_delay: value
                .fallback_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.fallback_delay),
            dev_guard_ttl: value
                .dev_guard_ttl_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.dev_guard_ttl),
            app_scheme: value.app_scheme.unwrap_or(defaults.app_scheme),
            ios_store_url: value.ios_store_url.unwrap_or(defaults.ios_store_url),
            android_store_url: value.android_store_url.unwrap_or(defaults.android_store_url),
        }
    }
}

/// Directory holding the stylesheet and the handoff relay script.
pub fn static_dir() -> PathBuf {
    env::var_os(STATIC_DIR_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from("static"))
}

fn read_config_file(path: &Path) -> Option<RawConfig> {
    match fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
            Ok(raw) => {
                info!(path = %path.display(), "loaded site config");
                Some(raw)
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to parse config; falling back to defaults"
                );
                None
            }
        },
        Err(err) if err.kind() == ErrorKind::NotFound => {
            info!(
                path = %path.display(),
                "config file not found; using built-in defaults"
            );
            None
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                error = %err,
                "failed to read config; falling back to defaults"
            );
            None
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
