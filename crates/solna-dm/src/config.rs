#![forbid(unsafe_code)]

//! Client configuration.
//!
//! Settings come from explicit construction or from `CYBS_DM_*`
//! environment variables, optionally seeded from a `.env` file.
//! `CYBS_DM_P12_PATH` and `CYBS_DM_P12_PASSWORD` name a PKCS#12 container
//! when the generic credential variables are unset.

use solna_core::Error;
use solna_keys::CredentialStore;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;
use zeroize::Zeroizing;

pub const PRODUCTION_ENDPOINT: &str = "https://ics2ws.ic3.com/commerce/1.x/transactionProcessor";
pub const SANDBOX_ENDPOINT: &str = "https://ics2wstest.ic3.com/commerce/1.x/transactionProcessor";

/// Default request deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const ENV_MERCHANT_ID: &str = "CYBS_DM_MERCHANT_ID";
pub const ENV_CREDENTIAL_PATH: &str = "CYBS_DM_CREDENTIAL_PATH";
pub const ENV_CREDENTIAL_PASSWORD: &str = "CYBS_DM_CREDENTIAL_PASSWORD";
pub const ENV_P12_PATH: &str = "CYBS_DM_P12_PATH";
pub const ENV_P12_PASSWORD: &str = "CYBS_DM_P12_PASSWORD";
pub const ENV_ENVIRONMENT: &str = "CYBS_DM_ENV";
pub const ENV_BASE_URL: &str = "CYBS_DM_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "CYBS_DM_TIMEOUT_SECS";

/// Target environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Sandbox,
    Production,
}

impl Environment {
    /// `production` selects production; any other value selects the sandbox.
    pub fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("production") {
            Self::Production
        } else {
            Self::Sandbox
        }
    }

    pub fn default_endpoint(self) -> &'static str {
        match self {
            Self::Production => PRODUCTION_ENDPOINT,
            Self::Sandbox => SANDBOX_ENDPOINT,
        }
    }
}

/// Settings for a [`DecisionClient`](crate::DecisionClient).
///
/// `Debug` redacts the credential password.
#[derive(Clone)]
pub struct Config {
    pub merchant_id: String,
    /// PEM bundle holding the private key and certificate chain.
    pub credential_path: PathBuf,
    pub credential_password: Option<Zeroizing<String>>,
    pub environment: Environment,
    /// Overrides the environment's endpoint when set.
    pub endpoint: Option<Url>,
    pub timeout: Duration,
}

impl Config {
    pub fn new(merchant_id: impl Into<String>, credential_path: impl AsRef<Path>) -> Self {
        Self {
            merchant_id: merchant_id.into(),
            credential_path: expand_home(credential_path.as_ref()),
            credential_password: None,
            environment: Environment::default(),
            endpoint: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_credential_path(mut self, path: impl AsRef<Path>) -> Self {
        self.credential_path = expand_home(path.as_ref());
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.credential_password = Some(Zeroizing::new(password.into()));
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `CYBS_DM_MERCHANT_ID` (required)
    /// - `CYBS_DM_CREDENTIAL_PATH` (required)
    /// - `CYBS_DM_CREDENTIAL_PASSWORD`
    /// - `CYBS_DM_ENV` (`production` or `sandbox`, default: sandbox)
    /// - `CYBS_DM_BASE_URL` (endpoint override)
    /// - `CYBS_DM_TIMEOUT_SECS` (default: 30)
    ///
    /// Missing required values are reported by [`Config::validate`];
    /// this only fails on values that cannot be parsed.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load `.env` (without overriding variables already set), then read
    /// the environment.
    pub fn from_dotenv() -> Result<Self, Error> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(Error::Config(format!(".env: {e}"))),
        }
        Self::from_env()
    }

    /// Like [`Config::from_dotenv`] with an explicit file, which must exist.
    pub fn from_dotenv_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        dotenvy::from_path(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        Self::from_env()
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let value = |name: &str| get(name).filter(|v| !v.trim().is_empty());

        let endpoint = value(ENV_BASE_URL)
            .map(|raw| {
                Url::parse(raw.trim())
                    .map_err(|e| Error::Config(format!("invalid {ENV_BASE_URL}: {e}")))
            })
            .transpose()?;
        let timeout = value(ENV_TIMEOUT_SECS)
            .map(|raw| {
                raw.trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|&secs| secs > 0)
                    .map(Duration::from_secs)
                    .ok_or_else(|| {
                        Error::Config(format!("invalid {ENV_TIMEOUT_SECS}: \"{raw}\""))
                    })
            })
            .transpose()?
            .unwrap_or(DEFAULT_TIMEOUT);

        Ok(Self {
            merchant_id: value(ENV_MERCHANT_ID).unwrap_or_default(),
            credential_path: value(ENV_CREDENTIAL_PATH)
                .or_else(|| value(ENV_P12_PATH))
                .map(|p| expand_home(Path::new(&p)))
                .unwrap_or_default(),
            credential_password: get(ENV_CREDENTIAL_PASSWORD)
                .or_else(|| get(ENV_P12_PASSWORD))
                .map(Zeroizing::new),
            environment: value(ENV_ENVIRONMENT)
                .map(|e| Environment::from_name(&e))
                .unwrap_or_default(),
            endpoint,
            timeout,
        })
    }

    /// Check that the required settings are present.
    pub fn validate(&self) -> Result<(), Error> {
        if self.merchant_id.trim().is_empty() {
            return Err(Error::Config(format!(
                "merchant id is required (set {ENV_MERCHANT_ID})"
            )));
        }
        if self.credential_path.as_os_str().is_empty() {
            return Err(Error::Config(format!(
                "credential path is required (set {ENV_CREDENTIAL_PATH})"
            )));
        }
        if self.timeout.is_zero() {
            return Err(Error::Config("timeout must be positive".into()));
        }
        Ok(())
    }

    /// The credential store for `credential_path`, PEM bundle or PKCS#12.
    pub fn credential_store(&self) -> Result<Box<dyn CredentialStore>, Error> {
        solna_keys::open(
            &self.credential_path,
            self.credential_password.as_deref().map(String::as_str),
        )
    }

    /// The SOAP endpoint: the override when set, else the environment's.
    pub fn endpoint(&self) -> Result<Url, Error> {
        match &self.endpoint {
            Some(url) => Ok(url.clone()),
            None => Url::parse(self.environment.default_endpoint())
                .map_err(|e| Error::Config(format!("invalid endpoint: {e}"))),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("merchant_id", &self.merchant_id)
            .field("credential_path", &self.credential_path)
            .field(
                "credential_password",
                &self.credential_password.as_ref().map(|_| "[REDACTED]"),
            )
            .field("environment", &self.environment)
            .field("endpoint", &self.endpoint.as_ref().map(Url::as_str))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Expand a leading `~/` to the home directory.
fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), std::env::var_os("HOME")) {
        (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_from_lookup_full() {
        let config = Config::from_lookup(lookup(&[
            (ENV_MERCHANT_ID, "acme"),
            (ENV_CREDENTIAL_PATH, "/etc/solna/acme.pem"),
            (ENV_CREDENTIAL_PASSWORD, "secret123"),
            (ENV_ENVIRONMENT, "production"),
            (ENV_TIMEOUT_SECS, "5"),
        ]))
        .unwrap();
        assert_eq!(config.merchant_id, "acme");
        assert_eq!(config.credential_path, PathBuf::from("/etc/solna/acme.pem"));
        assert_eq!(config.credential_password.as_deref().map(String::as_str), Some("secret123"));
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.endpoint().unwrap().as_str(), PRODUCTION_ENDPOINT);
        config.validate().unwrap();
    }

    #[test]
    fn test_p12_variables() {
        let config = Config::from_lookup(lookup(&[
            (ENV_MERCHANT_ID, "acme"),
            (ENV_P12_PATH, "/etc/solna/acme.p12"),
            (ENV_P12_PASSWORD, "secret123"),
        ]))
        .unwrap();
        assert_eq!(config.credential_path, PathBuf::from("/etc/solna/acme.p12"));
        assert_eq!(config.credential_password.as_deref().map(String::as_str), Some("secret123"));
        config.validate().unwrap();

        let config = Config::from_lookup(lookup(&[
            (ENV_CREDENTIAL_PATH, "/etc/solna/acme.pem"),
            (ENV_CREDENTIAL_PASSWORD, "pem-password"),
            (ENV_P12_PATH, "/etc/solna/acme.p12"),
            (ENV_P12_PASSWORD, "p12-password"),
        ]))
        .unwrap();
        assert_eq!(config.credential_path, PathBuf::from("/etc/solna/acme.pem"));
        assert_eq!(config.credential_password.as_deref().map(String::as_str), Some("pem-password"));
    }

    #[test]
    fn test_credential_store_reads_p12() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../test-data/keys/rsa-2048.p12");
        let config = Config::new("acme", path).with_password("secret123");
        let credential = config.credential_store().unwrap().load().unwrap();
        assert!(credential.rsa_private_key().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.environment, Environment::Sandbox);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.endpoint().unwrap().as_str(), SANDBOX_ENDPOINT);
    }

    #[test]
    fn test_unknown_environment_is_sandbox() {
        assert_eq!(Environment::from_name("staging"), Environment::Sandbox);
        assert_eq!(Environment::from_name("PRODUCTION"), Environment::Production);
    }

    #[test]
    fn test_base_url_overrides_environment() {
        let config = Config::from_lookup(lookup(&[
            (ENV_ENVIRONMENT, "production"),
            (ENV_BASE_URL, "http://127.0.0.1:9000/soap"),
        ]))
        .unwrap();
        assert_eq!(config.endpoint().unwrap().as_str(), "http://127.0.0.1:9000/soap");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = Config::from_lookup(lookup(&[(ENV_BASE_URL, "not a url")])).unwrap_err();
        assert!(err.to_string().contains(ENV_BASE_URL));

        let err = Config::from_lookup(lookup(&[(ENV_TIMEOUT_SECS, "soon")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        assert!(Config::from_lookup(lookup(&[(ENV_TIMEOUT_SECS, "0")])).is_err());
    }

    #[test]
    fn test_validate_names_missing_setting() {
        let err = Config::from_lookup(lookup(&[])).unwrap().validate().unwrap_err();
        assert!(err.to_string().contains(ENV_MERCHANT_ID));

        let err = Config::from_lookup(lookup(&[(ENV_MERCHANT_ID, "acme")]))
            .unwrap()
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains(ENV_CREDENTIAL_PATH));
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = Config::new("acme", "/tmp/acme.pem").with_password("hunter2");
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_expand_home() {
        if let Some(home) = std::env::var_os("HOME") {
            assert_eq!(
                expand_home(Path::new("~/keys/acme.pem")),
                PathBuf::from(home).join("keys/acme.pem")
            );
        }
        assert_eq!(expand_home(Path::new("/abs/acme.pem")), PathBuf::from("/abs/acme.pem"));
        assert_eq!(expand_home(Path::new("~user/acme.pem")), PathBuf::from("~user/acme.pem"));
    }
}
