use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime};
use thiserror::Error;

/// Which verifier a transfer proof is routed to.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProofMode {
    /// Verify in-process; never probe the ledger.
    LocalOnly,
    /// Require the ledger-native verifier.
    ZkProgramOnly,
    /// Prefer the ledger-native verifier, verify locally when it is off.
    ZkProgramWithFallback,
    #[default]
    AutoDetect,
}

impl ProofMode {
    pub const ALL: [ProofMode; 4] = [
        ProofMode::LocalOnly,
        ProofMode::ZkProgramOnly,
        ProofMode::ZkProgramWithFallback,
        ProofMode::AutoDetect,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProofMode::LocalOnly => "LOCAL_ONLY",
            ProofMode::ZkProgramOnly => "ZK_PROGRAM_ONLY",
            ProofMode::ZkProgramWithFallback => "ZK_PROGRAM_WITH_FALLBACK",
            ProofMode::AutoDetect => "AUTO_DETECT",
        }
    }

    /// Whether resolving this mode needs the feature-gate status.
    pub fn needs_status(&self) -> bool {
        !matches!(self, ProofMode::LocalOnly)
    }
}

impl fmt::Display for ProofMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown proof mode: {0}")]
pub struct ParseProofModeError(pub String);

impl FromStr for ProofMode {
    type Err = ParseProofModeError;

    /// Accepts `LOCAL_ONLY`, `local-only`, `local_only` and so on.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        ProofMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or_else(|| ParseProofModeError(s.to_string()))
    }
}

/// Last observed state of the ledger feature gate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProofModeStatus {
    pub enabled: bool,
    pub last_checked: SystemTime,
    pub message: String,
}

impl ProofModeStatus {
    pub fn new(enabled: bool, message: impl Into<String>) -> Self {
        Self {
            enabled,
            last_checked: SystemTime::now(),
            message: message.into(),
        }
    }

    /// A status whose age cannot be determined (clock moved backwards) is
    /// treated as expired.
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        match self.last_checked.elapsed() {
            Ok(age) => age < ttl,
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_modes() {
        assert_eq!("LOCAL_ONLY".parse::<ProofMode>().unwrap(), ProofMode::LocalOnly);
        assert_eq!("zk-program-only".parse::<ProofMode>().unwrap(), ProofMode::ZkProgramOnly);
        assert_eq!(
            " zk_program_with_fallback ".parse::<ProofMode>().unwrap(),
            ProofMode::ZkProgramWithFallback
        );
        assert_eq!("auto-detect".parse::<ProofMode>().unwrap(), ProofMode::AutoDetect);
        assert!("remote".parse::<ProofMode>().is_err());
    }

    #[test]
    fn test_display_round_trip() {
        for mode in ProofMode::ALL {
            assert_eq!(mode.to_string().parse::<ProofMode>().unwrap(), mode);
        }
        assert_eq!(ProofMode::default(), ProofMode::AutoDetect);
        assert!(!ProofMode::LocalOnly.needs_status());
    }

    #[test]
    fn test_status_freshness() {
        let status = ProofModeStatus::new(true, "active");
        assert!(status.is_fresh(Duration::from_secs(60)));
        assert!(!status.is_fresh(Duration::ZERO));

        let stale = ProofModeStatus {
            last_checked: SystemTime::now() - Duration::from_secs(120),
            ..status
        };
        assert!(!stale.is_fresh(Duration::from_secs(60)));
    }

    #[test]
    fn test_status_serde() {
        let status = ProofModeStatus::new(false, "feature gate inactive");
        let bytes = bincode::serialize(&status).unwrap();
        let decoded: ProofModeStatus = bincode::deserialize(&bytes).unwrap();
        assert_eq!(decoded, status);
    }
}
