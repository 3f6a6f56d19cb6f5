use std::{path::PathBuf, str::FromStr, time::Duration};

use crate::{
    error::{PlannerError, Result},
    services::{
        gemini_client::{DEFAULT_BASE_URL, DEFAULT_MODEL},
        GeminiClient, RetryPolicy,
    },
};

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const MODEL_VAR: &str = "GEMINI_MODEL";
pub const BASE_URL_VAR: &str = "GEMINI_BASE_URL";
pub const TIMEOUT_VAR: &str = "TRIP_PLANNER_TIMEOUT_SECS";
pub const MAX_RETRIES_VAR: &str = "TRIP_PLANNER_MAX_RETRIES";
pub const STORE_DIR_VAR: &str = "TRIP_PLANNER_STORE_DIR";
pub const TEMPERATURE_VAR: &str = "GEMINI_TEMPERATURE";
pub const JSON_RESPONSE_VAR: &str = "GEMINI_JSON_RESPONSE";

const DEFAULT_STORE_DIR: &str = ".trip-plans";

/// Runtime settings for the generator client and the file store.
#[derive(Clone, Debug, PartialEq)]
pub struct PlannerConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    /// `None` keeps the HTTP transport's default
    pub timeout: Option<Duration>,
    pub max_retries: usize,
    pub store_dir: PathBuf,
    /// `None` keeps the model's default
    pub temperature: Option<f32>,
    /// Request `application/json` from the model instead of free text
    pub json_response: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
            max_retries: 0,
            store_dir: PathBuf::from(DEFAULT_STORE_DIR),
            temperature: None,
            json_response: false,
        }
    }
}

impl PlannerConfig {
    /// Read settings from the process environment.
    ///
    /// Call `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        Ok(Self {
            api_key: get(API_KEY_VAR),
            model: get(MODEL_VAR).unwrap_or(defaults.model),
            base_url: get(BASE_URL_VAR).unwrap_or(defaults.base_url),
            timeout: get(TIMEOUT_VAR)
                .map(|raw| parse_var::<u64>(TIMEOUT_VAR, &raw))
                .transpose()?
                .map(Duration::from_secs),
            max_retries: get(MAX_RETRIES_VAR)
                .map(|raw| parse_var(MAX_RETRIES_VAR, &raw))
                .transpose()?
                .unwrap_or(defaults.max_retries),
            store_dir: get(STORE_DIR_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.store_dir),
            temperature: get(TEMPERATURE_VAR)
                .map(|raw| parse_var(TEMPERATURE_VAR, &raw))
                .transpose()?,
            json_response: get(JSON_RESPONSE_VAR)
                .map(|raw| parse_var(JSON_RESPONSE_VAR, &raw.to_ascii_lowercase()))
                .transpose()?
                .unwrap_or(defaults.json_response),
        })
    }

    pub fn gemini_client(&self) -> Result<GeminiClient> {
        let api_key = self.api_key.clone().ok_or_else(|| {
            PlannerError::Config(format!(
                "{API_KEY_VAR} must be set (or passed with --api-key) to generate plans"
            ))
        })?;

        Ok(GeminiClient::new(api_key)
            .with_base_url(&self.base_url)
            .with_model(&self.model)
            .with_timeout(self.timeout)
            .with_retry_policy(RetryPolicy::default().with_max_retries(self.max_retries))
            .with_temperature(self.temperature)
            .with_json_response(self.json_response))
    }
}

fn parse_var<T: FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| PlannerError::Config(format!("{name} has an invalid value `{raw}`")))
}
