//! SSO configuration loading.
//!
//! Settings live in a flat JSON object keyed by the `ckan.simplesso.*` names.
//! They are read once at startup into an immutable [`SsoConfig`]; changing
//! them requires a restart.

use anyhow::Context;
use http::HeaderName;
use serde_json::Value;
use std::{
    collections::BTreeMap,
    env, fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

pub const HEADER_PARAMETER_KEY: &str = "ckan.simplesso.header_parameter";
pub const HEADER_USERNAME_KEY: &str = "ckan.simplesso.header_username";
pub const HEADER_EMAIL_KEY: &str = "ckan.simplesso.header_email";
pub const EMAIL_DOMAIN_KEY: &str = "ckan.simplesso.email_domain";
pub const REJECT_DUPLICATE_EMAIL_KEY: &str = "ckan.simplesso.reject_duplicate_email";
pub const TEMPLATE_DIRECTORY_KEY: &str = "ckan.simplesso.template_directory";

pub const DEFAULT_HEADER_PARAMETER: &str = "partyID";
pub const DEFAULT_HEADER_USERNAME: &str = "username";
pub const DEFAULT_HEADER_EMAIL: &str = "email";
pub const DEFAULT_TEMPLATE_DIRECTORY: &str = "templates";

/// Raw settings as read from the config file, after env expansion.
pub type Settings = BTreeMap<String, String>;

/// Immutable SSO configuration shared by the resolver and the router.
#[derive(Debug, Clone)]
pub struct SsoConfig {
    /// Header carrying the subject id. Its presence triggers identification.
    pub header_parameter: HeaderName,
    /// Header carrying the display name for newly provisioned accounts.
    pub header_username: HeaderName,
    /// Header carrying the email claim.
    pub header_email: HeaderName,
    /// When set, email claims outside this domain are rejected.
    pub email_domain: Option<String>,
    /// Refuse to provision a new subject whose email is already taken.
    /// Off by default: the collision is only logged.
    pub reject_duplicate_email: bool,
    /// Directory of template assets served by the router.
    pub template_directory: PathBuf,
}

impl Default for SsoConfig {
    fn default() -> Self {
        Self {
            header_parameter: HeaderName::from_static("partyid"),
            header_username: HeaderName::from_static(DEFAULT_HEADER_USERNAME),
            header_email: HeaderName::from_static(DEFAULT_HEADER_EMAIL),
            email_domain: None,
            reject_duplicate_email: false,
            template_directory: PathBuf::from(DEFAULT_TEMPLATE_DIRECTORY),
        }
    }
}

impl SsoConfig {
    /// Build the configuration from raw settings, applying defaults for
    /// missing keys.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let header = |key: &str, default: &str| -> anyhow::Result<HeaderName> {
            let raw = settings.get(key).map(String::as_str).unwrap_or(default);
            HeaderName::from_bytes(raw.trim().as_bytes())
                .with_context(|| format!("`{}` is not a valid header name: {:?}", key, raw))
        };

        let email_domain = settings
            .get(EMAIL_DOMAIN_KEY)
            .map(|d| d.trim().trim_start_matches('@').to_lowercase())
            .filter(|d| !d.is_empty());

        let reject_duplicate_email = match settings.get(REJECT_DUPLICATE_EMAIL_KEY) {
            Some(raw) => parse_bool(raw).ok_or_else(|| {
                anyhow::anyhow!(
                    "`{}` must be a boolean, got {:?}",
                    REJECT_DUPLICATE_EMAIL_KEY,
                    raw
                )
            })?,
            None => false,
        };

        let template_directory = settings
            .get(TEMPLATE_DIRECTORY_KEY)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMPLATE_DIRECTORY));

        Ok(Self {
            header_parameter: header(HEADER_PARAMETER_KEY, DEFAULT_HEADER_PARAMETER)?,
            header_username: header(HEADER_USERNAME_KEY, DEFAULT_HEADER_USERNAME)?,
            header_email: header(HEADER_EMAIL_KEY, DEFAULT_HEADER_EMAIL)?,
            email_domain,
            reject_duplicate_email,
            template_directory,
        })
    }

    /// Locate and load the configuration, falling back to defaults when no
    /// config file exists.
    pub fn load() -> anyhow::Result<Self> {
        match resolve_config_path()? {
            Some(path) => {
                info!("Loading SSO configuration from {}", path.display());
                let settings = load_settings(&path)?;
                Self::from_settings(&settings)
            }
            None => {
                info!("No SSO configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Resolve the config file path.
///
/// `SIMPLESSO_CONFIG` wins and must point at an existing file. Otherwise
/// `./simplesso.json` is used if present.
pub fn resolve_config_path() -> anyhow::Result<Option<PathBuf>> {
    if let Ok(p) = env::var("SIMPLESSO_CONFIG") {
        let path = PathBuf::from(p);
        if !path.exists() {
            return Err(anyhow::anyhow!(
                "SIMPLESSO_CONFIG points at {}, which does not exist",
                path.display()
            ));
        }
        return Ok(Some(path));
    }

    let candidate = PathBuf::from("simplesso.json");
    if candidate.exists() {
        return Ok(Some(candidate));
    }

    Ok(None)
}

/// Read a settings file. Values may be strings or booleans; `null` values
/// are treated as unset.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let values: BTreeMap<String, Value> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    let mut settings = Settings::new();
    for (key, value) in values {
        let value = match value {
            Value::String(s) => expand_env_vars(&s),
            Value::Bool(b) => b.to_string(),
            Value::Null => continue,
            other => {
                return Err(anyhow::anyhow!(
                    "setting `{}` must be a string or boolean, got {}",
                    key,
                    other
                ));
            }
        };
        debug!(key = %key, "Loaded setting");
        settings.insert(key, value);
    }

    Ok(settings)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn expand_env_vars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next(); // consume '{'
            let mut name = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                name.push(c);
            }
            if let Ok(val) = env::var(&name) {
                out.push_str(&val);
            } else {
                out.push_str("${");
                out.push_str(&name);
                out.push('}');
            }
        } else {
            out.push(ch);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = SsoConfig::from_settings(&Settings::new()).unwrap();
        assert_eq!(config.header_parameter.as_str(), "partyid");
        assert_eq!(config.header_username.as_str(), "username");
        assert_eq!(config.header_email.as_str(), "email");
        assert!(config.email_domain.is_none());
        assert!(!config.reject_duplicate_email);
        assert_eq!(config.template_directory, PathBuf::from("templates"));
    }

    #[test]
    fn test_default_impl_matches_empty_settings() {
        let from_settings = SsoConfig::from_settings(&Settings::new()).unwrap();
        let default = SsoConfig::default();
        assert_eq!(from_settings.header_parameter, default.header_parameter);
        assert_eq!(from_settings.header_username, default.header_username);
        assert_eq!(from_settings.header_email, default.header_email);
    }

    #[test]
    fn test_custom_headers_and_domain() {
        let mut settings = Settings::new();
        settings.insert(HEADER_PARAMETER_KEY.to_string(), "X-Remote-User".to_string());
        settings.insert(HEADER_EMAIL_KEY.to_string(), "X-Remote-Email".to_string());
        settings.insert(EMAIL_DOMAIN_KEY.to_string(), "@Example.org".to_string());
        settings.insert(REJECT_DUPLICATE_EMAIL_KEY.to_string(), "true".to_string());

        let config = SsoConfig::from_settings(&settings).unwrap();
        assert_eq!(config.header_parameter.as_str(), "x-remote-user");
        assert_eq!(config.header_email.as_str(), "x-remote-email");
        assert_eq!(config.email_domain.as_deref(), Some("example.org"));
        assert!(config.reject_duplicate_email);
    }

    #[test]
    fn test_blank_email_domain_is_unset() {
        let mut settings = Settings::new();
        settings.insert(EMAIL_DOMAIN_KEY.to_string(), "  ".to_string());
        let config = SsoConfig::from_settings(&settings).unwrap();
        assert!(config.email_domain.is_none());
    }

    #[test]
    fn test_invalid_header_name_rejected() {
        let mut settings = Settings::new();
        settings.insert(HEADER_USERNAME_KEY.to_string(), "bad header".to_string());
        assert!(SsoConfig::from_settings(&settings).is_err());
    }

    #[test]
    fn test_invalid_bool_rejected() {
        let mut settings = Settings::new();
        settings.insert(REJECT_DUPLICATE_EMAIL_KEY.to_string(), "maybe".to_string());
        assert!(SsoConfig::from_settings(&settings).is_err());
    }

    #[test]
    fn test_load_settings_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "ckan.simplesso.header_parameter": "partyID",
                "ckan.simplesso.email_domain": null,
                "ckan.simplesso.reject_duplicate_email": true
            }}"#
        )
        .unwrap();

        let settings = load_settings(file.path()).unwrap();
        assert_eq!(
            settings.get(HEADER_PARAMETER_KEY).map(String::as_str),
            Some("partyID")
        );
        assert!(!settings.contains_key(EMAIL_DOMAIN_KEY));
        assert_eq!(
            settings.get(REJECT_DUPLICATE_EMAIL_KEY).map(String::as_str),
            Some("true")
        );
    }

    #[test]
    fn test_load_settings_rejects_numbers() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"ckan.simplesso.header_email": 42}}"#).unwrap();
        assert!(load_settings(file.path()).is_err());
    }

    #[test]
    fn test_expand_env_vars_keeps_unknown() {
        let out = expand_env_vars("${SIMPLESSO_TEST_SURELY_UNSET_VAR}-x");
        assert_eq!(out, "${SIMPLESSO_TEST_SURELY_UNSET_VAR}-x");
    }

    #[test]
    fn test_expand_env_vars_known() {
        let path = env::var("PATH").unwrap_or_default();
        assert_eq!(expand_env_vars("${PATH}"), path);
        assert_eq!(expand_env_vars("plain"), "plain");
    }
}
