//! Proof-mode resolution and the process-wide feature-gate status cache.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use confidential_types::{ProofMode, ProofModeStatus};
use lazy_static::lazy_static;
use tracing::{debug, info, warn};

use crate::network::FeatureGateClient;

lazy_static! {
    static ref STATUS_CACHE: Arc<StatusCache> = Arc::new(StatusCache::new());
}

/// The cache shared by every orchestrator that does not bring its own.
pub fn global_status_cache() -> Arc<StatusCache> {
    Arc::clone(&STATUS_CACHE)
}

/// Forget the cached feature-gate status so the next resolution probes again.
pub fn clear_status_cache() {
    STATUS_CACHE.clear();
}

/// Last-writer-wins cache of the feature-gate status, keyed by the gate it
/// was read from. A lookup for any other gate id is a miss.
#[derive(Debug, Default)]
pub struct StatusCache {
    inner: Mutex<Option<(String, ProofModeStatus)>>,
}

impl StatusCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<(String, ProofModeStatus)>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The status cached for `feature_id`, if it is younger than `ttl`.
    pub fn get(&self, feature_id: &str, ttl: Duration) -> Option<ProofModeStatus> {
        self.lock()
            .as_ref()
            .filter(|(cached_id, status)| cached_id == feature_id && status.is_fresh(ttl))
            .map(|(_, status)| status.clone())
    }

    pub fn store(&self, feature_id: &str, status: ProofModeStatus) {
        *self.lock() = Some((feature_id.to_string(), status));
    }

    pub fn clear(&self) {
        *self.lock() = None;
    }

    /// Returns the cached status or probes the gate. A failed probe is
    /// logged and recorded as disabled.
    pub async fn get_or_refresh(
        &self,
        client: &dyn FeatureGateClient,
        feature_id: &str,
        ttl: Duration,
    ) -> ProofModeStatus {
        if let Some(status) = self.get(feature_id, ttl) {
            debug!(enabled = status.enabled, "using cached feature gate status");
            return status;
        }

        let status = if feature_id.is_empty() {
            ProofModeStatus::new(false, "no feature gate configured")
        } else {
            match client.is_feature_active(feature_id).await {
                Ok(true) => ProofModeStatus::new(true, "ledger proof verifier enabled"),
                Ok(false) => ProofModeStatus::new(false, "ledger proof verifier not activated"),
                Err(err) => {
                    warn!(%err, "feature gate probe failed, treating as disabled");
                    ProofModeStatus::new(false, err.to_string())
                }
            }
        };

        self.store(feature_id, status.clone());
        status
    }
}

/// Where a transfer proof ends up being checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifierPath {
    /// In-process verification
    Local,
    /// Submitted to the ledger-native program
    ZkProgram,
    /// The mode demands the ledger program but it is not available.
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub path: VerifierPath,
    pub used_fallback: bool,
    pub requires_zk_program: bool,
}

impl Resolution {
    fn local() -> Self {
        Self {
            path: VerifierPath::Local,
            used_fallback: false,
            requires_zk_program: false,
        }
    }
}

/// Maps a mode and the gate state to a verifier path. `gate_enabled` is
/// ignored for [`ProofMode::LocalOnly`].
pub fn resolve(mode: ProofMode, gate_enabled: bool) -> Resolution {
    let resolution = match (mode, gate_enabled) {
        (ProofMode::LocalOnly, _) => Resolution::local(),
        (_, true) => Resolution {
            path: VerifierPath::ZkProgram,
            ..Resolution::local()
        },
        (ProofMode::ZkProgramOnly, false) => Resolution {
            path: VerifierPath::Unavailable,
            used_fallback: false,
            requires_zk_program: true,
        },
        (ProofMode::ZkProgramWithFallback, false) => Resolution {
            used_fallback: true,
            ..Resolution::local()
        },
        (ProofMode::AutoDetect, false) => Resolution::local(),
    };

    info!(%mode, gate_enabled, path = ?resolution.path, "resolved proof mode");
    resolution
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ProverError, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingGate {
        active: bool,
        calls: AtomicUsize,
    }

    impl CountingGate {
        fn new(active: bool) -> Self {
            Self {
                active,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FeatureGateClient for CountingGate {
        async fn is_feature_active(&self, _feature_id: &str) -> Result<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.active)
        }
    }

    struct FailingGate;

    #[async_trait]
    impl FeatureGateClient for FailingGate {
        async fn is_feature_active(&self, _feature_id: &str) -> Result<bool> {
            Err(ProverError::NetworkUnavailable("connection refused".to_string()))
        }
    }

    const TTL: Duration = Duration::from_secs(60);

    #[test]
    fn test_resolution_table() {
        use ProofMode::*;
        use VerifierPath::*;

        let cases = [
            (LocalOnly, true, Local, false, false),
            (LocalOnly, false, Local, false, false),
            (ZkProgramOnly, true, ZkProgram, false, false),
            (ZkProgramOnly, false, Unavailable, false, true),
            (ZkProgramWithFallback, true, ZkProgram, false, false),
            (ZkProgramWithFallback, false, Local, true, false),
            (AutoDetect, true, ZkProgram, false, false),
            (AutoDetect, false, Local, false, false),
        ];

        for (mode, enabled, path, used_fallback, requires_zk_program) in cases {
            assert_eq!(
                resolve(mode, enabled),
                Resolution {
                    path,
                    used_fallback,
                    requires_zk_program
                },
                "mode {} with gate enabled = {}",
                mode,
                enabled
            );
        }
    }

    #[tokio::test]
    async fn test_cache_hit_within_ttl() {
        let cache = StatusCache::new();
        let gate = CountingGate::new(true);

        let first = cache.get_or_refresh(&gate, "gate", TTL).await;
        let second = cache.get_or_refresh(&gate, "gate", TTL).await;

        assert!(first.enabled);
        assert_eq!(first, second);
        assert_eq!(gate.calls(), 1);
    }

    #[tokio::test]
    async fn test_cache_refresh_after_ttl() {
        let cache = StatusCache::new();
        let gate = CountingGate::new(false);

        cache.get_or_refresh(&gate, "gate", Duration::ZERO).await;
        cache.get_or_refresh(&gate, "gate", Duration::ZERO).await;

        assert_eq!(gate.calls(), 2);
    }

    #[tokio::test]
    async fn test_clear_forces_probe() {
        let cache = StatusCache::new();
        let gate = CountingGate::new(true);

        cache.get_or_refresh(&gate, "gate", TTL).await;
        cache.clear();
        assert!(cache.get("gate", TTL).is_none());
        cache.get_or_refresh(&gate, "gate", TTL).await;

        assert_eq!(gate.calls(), 2);
    }

    #[tokio::test]
    async fn test_network_failure_is_disabled() {
        let cache = StatusCache::new();
        let status = cache.get_or_refresh(&FailingGate, "gate", TTL).await;

        assert!(!status.enabled);
        assert!(status.message.contains("connection refused"));
        assert_eq!(cache.get("gate", TTL), Some(status));
    }

    #[test]
    fn test_empty_feature_id_skips_probe() {
        let cache = StatusCache::new();
        let gate = CountingGate::new(true);

        let status = tokio_test::block_on(cache.get_or_refresh(&gate, "", TTL));

        assert!(!status.enabled);
        assert_eq!(gate.calls(), 0);
    }

    #[test]
    fn test_global_cache_clear() {
        global_status_cache().store("seeded-gate", ProofModeStatus::new(true, "seeded"));
        clear_status_cache();
        assert!(global_status_cache().get("seeded-gate", TTL).is_none());
    }

    #[tokio::test]
    async fn test_cache_keyed_by_feature_id() {
        let cache = StatusCache::new();
        let active = CountingGate::new(true);
        let inactive = CountingGate::new(false);

        let first = cache.get_or_refresh(&active, "gate-a", TTL).await;
        assert!(first.enabled);
        assert!(cache.get("gate-b", TTL).is_none());

        // a fresh entry for gate-a must not answer for gate-b
        let second = cache.get_or_refresh(&inactive, "gate-b", TTL).await;
        assert!(!second.enabled);
        assert_eq!(inactive.calls(), 1);

        assert!(cache.get("gate-a", TTL).is_none());
        assert_eq!(cache.get("gate-b", TTL), Some(second));
    }
}
