//! Server configuration read from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use cns_structure::domain::policy::{FollowNextLink, NextNodePolicy, SkipVisited};

use crate::error::AppError;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_LOAD_TIMEOUT_MS: u64 = 5000;

/// Which next-node policy forward navigation uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NextPolicyKind {
    /// Follow the static `next` link.
    #[default]
    FollowNext,
    /// Skip nodes the learner has already visited.
    SkipVisited,
}

impl NextPolicyKind {
    fn parse(value: &str) -> Result<Self, AppError> {
        match value {
            "follow-next" => Ok(Self::FollowNext),
            "skip-visited" => Ok(Self::SkipVisited),
            other => Err(AppError::Config(format!(
                "CNS_NEXT_POLICY must be follow-next or skip-visited, got {other:?}"
            ))),
        }
    }

    /// Builds the policy.
    #[must_use]
    pub fn policy(self) -> Arc<dyn NextNodePolicy> {
        match self {
            Self::FollowNext => Arc::new(FollowNextLink),
            Self::SkipVisited => Arc::new(SkipVisited),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Interface to bind (`HOST`).
    pub host: String,
    /// Port to bind (`PORT`).
    pub port: u16,
    /// Directory of structure definitions (`CNS_STRUCTURE_DIR`). Without
    /// it every process is served as a single node.
    pub structure_dir: Option<PathBuf>,
    /// Upper bound for the structure loader call of a start
    /// (`CNS_LOAD_TIMEOUT_MS`).
    pub load_timeout: Duration,
    /// Forward navigation policy (`CNS_NEXT_POLICY`).
    pub next_policy: NextPolicyKind,
    /// OTLP collector endpoint (`OTEL_EXPORTER_OTLP_ENDPOINT`).
    pub otlp_endpoint: Option<String>,
}

impl AppConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`.
    ///
    /// Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set to an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let host = var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_owned());
        let port = match var("PORT") {
            Some(value) => value
                .parse()
                .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?,
            None => DEFAULT_PORT,
        };
        let load_timeout_ms = match var("CNS_LOAD_TIMEOUT_MS") {
            Some(value) => value.parse().map_err(|e| {
                AppError::Config(format!("CNS_LOAD_TIMEOUT_MS must be milliseconds: {e}"))
            })?,
            None => DEFAULT_LOAD_TIMEOUT_MS,
        };
        if load_timeout_ms == 0 {
            return Err(AppError::Config(
                "CNS_LOAD_TIMEOUT_MS must be greater than zero".to_owned(),
            ));
        }
        let next_policy = var("CNS_NEXT_POLICY")
            .map(|value| NextPolicyKind::parse(&value))
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            host,
            port,
            structure_dir: var("CNS_STRUCTURE_DIR").map(PathBuf::from),
            load_timeout: Duration::from_millis(load_timeout_ms),
            next_policy,
            otlp_endpoint: var("OTEL_EXPORTER_OTLP_ENDPOINT"),
        })
    }

    /// The address to listen on.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `host` and `port` do not form a valid
    /// socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }
}
