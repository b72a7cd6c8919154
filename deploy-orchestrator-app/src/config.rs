//! TOML configuration file
//!
//! ```toml
//! [history]
//! max_records = 500
//!
//! [propagation]
//! timeout_secs = 5
//! resolvers = [{ name = "Cloudflare", url = "https://cloudflare-dns.com/dns-query" }]
//!
//! [dns]
//! default_account = "main"
//!
//! [dns.accounts.main]
//! account_id = "0123456789abcdef0123456789abcdef"
//! api_token = "..."
//!
//! [targets.cf-pages]
//! account_id = "0123456789abcdef0123456789abcdef"
//! api_token = "..."
//!
//! [sites.landing]
//! domain = "example.com"
//! artifact_dir = "./dist"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use deploy_orchestrator_core::error::{CoreError, CoreResult};
use deploy_orchestrator_core::services::DEFAULT_MAX_RECORDS;
use deploy_orchestrator_core::types::{
    CredentialSet, DeployCredentials, DeploymentTarget, DnsCredentials,
};
use deploy_orchestrator_toolbox::{DohResolver, PropagationChecker, DEFAULT_TIMEOUT_SECS};

/// Directory name under the platform config and data directories.
pub const APP_DIR_NAME: &str = "deploy-orchestrator";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub history: HistoryConfig,
    pub propagation: PropagationConfig,
    pub dns: DnsConfig,
    /// Credential tables keyed by target slug.
    pub targets: BTreeMap<String, toml::Table>,
    pub sites: BTreeMap<String, SiteConfig>,
    /// Overrides the platform data directory.
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub max_records: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_records: DEFAULT_MAX_RECORDS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PropagationConfig {
    pub timeout_secs: u64,
    /// Empty means Cloudflare, Google and Quad9.
    pub resolvers: Vec<DohResolver>,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            resolvers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DnsConfig {
    pub default_account: Option<String>,
    pub accounts: BTreeMap<String, DnsCredentials>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub domain: Option<String>,
    pub brand_name: Option<String>,
    pub html_filename: Option<String>,
    /// Directory holding the pre-rendered site.
    pub artifact_dir: Option<PathBuf>,
}

impl OrchestratorConfig {
    /// `<config dir>/deploy-orchestrator/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from `path`, or from [`Self::default_path`] when `None`.
    ///
    /// A missing file yields the defaults; an unreadable or malformed one is an error.
    pub fn load(path: Option<&Path>) -> CoreResult<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            log::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| {
            CoreError::Configuration(format!("Failed to read {}: {e}", path.display()))
        })?;
        let mut config = Self::from_toml_str(&content)?;

        // Relative artifact directories are taken from the config file's directory
        if let Some(base) = path.parent() {
            for site in config.sites.values_mut() {
                if let Some(dir) = site.artifact_dir.as_mut() {
                    if dir.is_relative() {
                        *dir = base.join(&*dir);
                    }
                }
            }
        }
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> CoreResult<Self> {
        toml::from_str(content)
            .map_err(|e| CoreError::Configuration(format!("Invalid config file: {e}")))
    }

    /// Deploy credentials per target plus the DNS accounts.
    pub fn credentials(&self) -> CoreResult<CredentialSet> {
        let mut set = CredentialSet::new();

        for (slug, table) in &self.targets {
            let target: DeploymentTarget = slug.parse()?;
            let mut table = table.clone();
            table.insert(
                "target".to_string(),
                toml::Value::String(target.slug().to_string()),
            );
            let credentials: DeployCredentials = toml::Value::Table(table)
                .try_into()
                .map_err(|e| {
                    CoreError::Configuration(format!("Invalid credentials for {target}: {e}"))
                })?;
            set = set.with_deploy(credentials);
        }

        for (id, account) in &self.dns.accounts {
            set = set.with_dns_account(id.clone(), account.clone());
        }
        if let Some(id) = &self.dns.default_account {
            if !self.dns.accounts.contains_key(id) {
                return Err(CoreError::Configuration(format!(
                    "Default DNS account '{id}' is not defined"
                )));
            }
            set = set.with_default_dns_account(id.clone());
        }
        Ok(set)
    }

    pub fn propagation_checker(&self) -> PropagationChecker {
        let mut checker = PropagationChecker::new()
            .with_timeout(Duration::from_secs(self.propagation.timeout_secs.max(1)));
        if !self.propagation.resolvers.is_empty() {
            checker = checker.with_resolvers(self.propagation.resolvers.clone());
        }
        checker
    }

    /// Where history and DNS snapshots are kept.
    pub fn data_dir(&self) -> CoreResult<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or_else(|| {
                CoreError::Configuration("Cannot determine the data directory".to_string())
            })
    }
}
