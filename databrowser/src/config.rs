//! Configuration-related functionality for the data browser.

use std::path::Path;

use eyre::{Result, WrapErr};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::query::DEFAULT_NAMESPACE;
use crate::{loader, Error, Query};

/// Data browser configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The URL namespace under which queries are served.
    pub namespace: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

impl Config {
    /// Convenience method for constructing a configuration with a specific
    /// namespace.
    pub fn with_namespace<N: AsRef<str>>(mut self, namespace: N) -> Self {
        self.namespace = namespace.as_ref().trim_matches('/').to_string();
        self
    }

    /// Load configuration from the given JSON or YAML file. If the file does
    /// not exist, the default configuration is returned.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(
                "No such configuration file, using default configuration: {}",
                path.display()
            );
            return Ok(Self::default());
        }
        let config: Self = loader::load_from_file(path)
            .wrap_err_with(|| Error::FailedToLoadConfig(path.to_path_buf()))?;
        debug!("Loaded configuration from {}", path.display());
        let namespace = config.namespace.clone();
        Ok(config.with_namespace(namespace))
    }

    /// The canonical URL of the given query under this configuration's
    /// namespace.
    pub fn url_for(&self, query: &Query) -> String {
        query.url_in(&self.namespace)
    }

    /// Parse a query from a URL under this configuration's namespace.
    pub fn parse_url<U: AsRef<str>>(&self, url: U) -> Result<Query, Error> {
        Query::from_url(url, &self.namespace)
    }
}
