use std::env;
use std::time::Duration;

use confidential_types::ProofMode;

use crate::errors::{ProverError, Result};

pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8899";
pub const DEFAULT_ZK_PROGRAM_ID: &str = "ZkE1Gama1Proof11111111111111111111111111111";
pub const DEFAULT_STATUS_TTL: Duration = Duration::from_secs(60);

pub const ENV_PROOF_MODE: &str = "CT_PROOF_MODE";
pub const ENV_RPC_URL: &str = "CT_RPC_URL";
pub const ENV_ZK_PROGRAM_ID: &str = "CT_ZK_PROGRAM_ID";
pub const ENV_FEATURE_GATE_ID: &str = "CT_FEATURE_GATE_ID";
pub const ENV_STATUS_TTL_SECS: &str = "CT_STATUS_TTL_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProverConfig {
    pub mode: ProofMode,
    pub rpc_url: String,
    /// Program that verifies proofs on the ledger
    pub zk_program_id: String,
    /// Feature account gating that program. When empty the gate is reported
    /// as disabled without a network probe.
    pub feature_gate_id: String,
    pub status_ttl: Duration,
}

impl Default for ProverConfig {
    fn default() -> Self {
        Self {
            mode: ProofMode::default(),
            rpc_url: DEFAULT_RPC_URL.to_string(),
            zk_program_id: DEFAULT_ZK_PROGRAM_ID.to_string(),
            feature_gate_id: String::new(),
            status_ttl: DEFAULT_STATUS_TTL,
        }
    }
}

impl ProverConfig {
    /// Defaults overridden by any `CT_*` variable present in the environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(mode) = lookup(ENV_PROOF_MODE) {
            config.mode = mode
                .parse()
                .map_err(|e| ProverError::Config(format!("{}: {}", ENV_PROOF_MODE, e)))?;
        }
        if let Some(url) = lookup(ENV_RPC_URL) {
            config.rpc_url = url;
        }
        if let Some(program_id) = lookup(ENV_ZK_PROGRAM_ID) {
            config.zk_program_id = program_id;
        }
        if let Some(feature_gate_id) = lookup(ENV_FEATURE_GATE_ID) {
            config.feature_gate_id = feature_gate_id;
        }
        if let Some(ttl) = lookup(ENV_STATUS_TTL_SECS) {
            let secs: u64 = ttl.trim().parse().map_err(|_| {
                ProverError::Config(format!(
                    "{} must be a number of seconds, got {}",
                    ENV_STATUS_TTL_SECS, ttl
                ))
            })?;
            config.status_ttl = Duration::from_secs(secs);
        }

        Ok(config)
    }

    pub fn with_mode(mut self, mode: ProofMode) -> Self {
        self.mode = mode;
        self
    }
}
