pub mod config;
pub mod errors;
pub mod network;
pub mod proof_mode;

use std::sync::Arc;

use confidential_crypto::{TransferContext, TransferInput, TransferProof};
use confidential_types::{
    CiphertextData, CommitmentData, ProofData, ProofModeStatus, PublicInputs,
    VerifyProofInstruction,
};
use rand::rngs::OsRng;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub use config::ProverConfig;
pub use errors::{ProverError, Result};
pub use network::{FeatureGateClient, RpcFeatureGateClient};
pub use proof_mode::{
    clear_status_cache, global_status_cache, resolve, Resolution, StatusCache, VerifierPath,
};

/// Outcome of checking a transfer proof. Never an error: malformed or
/// forged input is reported through `valid` and `error`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerificationResult {
    pub valid: bool,
    pub error: Option<String>,
    pub used_fallback: bool,
}

impl VerificationResult {
    fn valid(used_fallback: bool) -> Self {
        Self {
            valid: true,
            error: None,
            used_fallback,
        }
    }

    fn invalid(error: impl Into<String>, used_fallback: bool) -> Self {
        Self {
            valid: false,
            error: Some(error.into()),
            used_fallback,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransferOutcome {
    pub proof_bytes: Vec<u8>,
    pub proof: TransferProof,
    /// Present when the ledger-native verifier is enabled and the mode allows it.
    pub instruction: Option<VerifyProofInstruction>,
    pub requires_zk_program: bool,
    pub used_fallback: bool,
    /// `None` in [`ProofMode::LocalOnly`](confidential_types::ProofMode::LocalOnly),
    /// which never probes the gate.
    pub status: Option<ProofModeStatus>,
}

/// Public values of a transfer in the shape the ledger program consumes.
pub fn public_inputs(context: &TransferContext, proof: &TransferProof) -> PublicInputs {
    let source = context.source_ciphertext.to_bytes();
    let destination = proof.destination_ciphertext.to_bytes();
    PublicInputs {
        source_pubkey: context.source_pubkey.to_bytes(),
        destination_pubkey: context.destination_pubkey.to_bytes(),
        source_ciphertext: CiphertextData::from(source),
        destination_ciphertext: CiphertextData::from(destination),
        new_source_commitment: CommitmentData::new(proof.new_source_commitment.to_bytes()),
    }
}

/// Builds transfer proofs and routes them to the local or ledger-native
/// verifier according to the configured [`ProofMode`](confidential_types::ProofMode).
pub struct ProofOrchestrator {
    config: ProverConfig,
    gate: Arc<dyn FeatureGateClient>,
    cache: Arc<StatusCache>,
}

impl ProofOrchestrator {
    /// Orchestrator probing `config.rpc_url` and sharing the global status cache.
    pub fn new(config: ProverConfig) -> Self {
        let gate = Arc::new(RpcFeatureGateClient::new(config.rpc_url.clone()));
        Self::with_client(config, gate)
    }

    pub fn with_client(config: ProverConfig, gate: Arc<dyn FeatureGateClient>) -> Self {
        Self {
            config,
            gate,
            cache: global_status_cache(),
        }
    }

    pub fn with_cache(mut self, cache: Arc<StatusCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn config(&self) -> &ProverConfig {
        &self.config
    }

    /// Current feature-gate status, from cache when fresh. `LocalOnly`
    /// returns `None` without touching the network.
    pub async fn status(&self) -> Option<ProofModeStatus> {
        if !self.config.mode.needs_status() {
            return None;
        }
        let status = self
            .cache
            .get_or_refresh(
                self.gate.as_ref(),
                &self.config.feature_gate_id,
                self.config.status_ttl,
            )
            .await;
        Some(status)
    }

    async fn resolution(&self) -> (Resolution, Option<ProofModeStatus>) {
        let status = self.status().await;
        let enabled = status.as_ref().map(|s| s.enabled).unwrap_or(false);
        (resolve(self.config.mode, enabled), status)
    }

    pub async fn prove_transfer(&self, input: &TransferInput) -> Result<TransferOutcome> {
        let proof = TransferProof::new_with_rng(input, &mut OsRng)?;
        self.finish_transfer(input, proof).await
    }

    pub async fn prove_transfer_with_rng<R: RngCore + CryptoRng>(
        &self,
        input: &TransferInput,
        rng: &mut R,
    ) -> Result<TransferOutcome> {
        let proof = TransferProof::new_with_rng(input, rng)?;
        self.finish_transfer(input, proof).await
    }

    async fn finish_transfer(
        &self,
        input: &TransferInput,
        proof: TransferProof,
    ) -> Result<TransferOutcome> {
        let proof_bytes = proof.to_bytes();
        let (resolution, status) = self.resolution().await;

        let instruction = match resolution.path {
            VerifierPath::ZkProgram => {
                let proof_data =
                    ProofData::new(proof_bytes.clone(), public_inputs(&input.context(), &proof));
                Some(VerifyProofInstruction::new(
                    self.config.zk_program_id.clone(),
                    proof_data,
                ))
            }
            VerifierPath::Local | VerifierPath::Unavailable => None,
        };

        info!(
            mode = %self.config.mode,
            instruction = instruction.is_some(),
            requires_zk_program = resolution.requires_zk_program,
            "transfer proof ready"
        );

        Ok(TransferOutcome {
            proof_bytes,
            proof,
            instruction,
            requires_zk_program: resolution.requires_zk_program,
            used_fallback: resolution.used_fallback,
            status,
        })
    }

    /// Checks serialized transfer proof bytes against `context`.
    ///
    /// When the ledger verifier is enabled the proof is still checked locally
    /// before submission. `ZkProgramOnly` with the gate off cannot verify.
    pub async fn verify_transfer(
        &self,
        proof_bytes: &[u8],
        context: &TransferContext,
    ) -> VerificationResult {
        let (resolution, _) = self.resolution().await;

        if resolution.path == VerifierPath::Unavailable {
            return VerificationResult::invalid("ledger proof verifier is not enabled", false);
        }
        verify_local(proof_bytes, context, resolution.used_fallback)
    }
}

/// In-process verification. Parsing and verification failures are reported
/// in the result.
pub fn verify_local(
    proof_bytes: &[u8],
    context: &TransferContext,
    used_fallback: bool,
) -> VerificationResult {
    let proof = match TransferProof::from_bytes(proof_bytes) {
        Ok(proof) => proof,
        Err(err) => {
            debug!(%err, "rejecting unparsable transfer proof");
            return VerificationResult::invalid(err.to_string(), used_fallback);
        }
    };

    match proof.check(context) {
        Ok(()) => VerificationResult::valid(used_fallback),
        Err(err) => {
            debug!(%err, "transfer proof rejected");
            VerificationResult::invalid(err.to_string(), used_fallback)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use confidential_crypto::{transfer::encrypt_balance, ElGamalKeypair};
    use confidential_types::ProofMode;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticGate {
        active: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl FeatureGateClient for StaticGate {
        async fn is_feature_active(&self, _feature_id: &str) -> Result<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.active)
        }
    }

    struct DownGate;

    #[async_trait]
    impl FeatureGateClient for DownGate {
        async fn is_feature_active(&self, _feature_id: &str) -> Result<bool> {
            Err(ProverError::NetworkUnavailable("timed out".to_string()))
        }
    }

    fn orchestrator(mode: ProofMode, gate: Arc<dyn FeatureGateClient>) -> ProofOrchestrator {
        let config = ProverConfig {
            feature_gate_id: "Gate1111111111111111111111111111111111111111".to_string(),
            ..ProverConfig::default()
        }
        .with_mode(mode);
        ProofOrchestrator::with_client(config, gate).with_cache(Arc::new(StatusCache::new()))
    }

    fn gate(active: bool) -> Arc<StaticGate> {
        Arc::new(StaticGate {
            active,
            calls: AtomicUsize::new(0),
        })
    }

    fn transfer_input(balance: u64, amount: u64) -> TransferInput {
        let mut rng = ChaCha20Rng::from_seed([5u8; 32]);
        let source_keypair = ElGamalKeypair::new_with_rng(&mut rng);
        let destination = ElGamalKeypair::new_with_rng(&mut rng);
        let (source_ciphertext, _) =
            encrypt_balance(&source_keypair.public, balance, &mut rng).unwrap();
        TransferInput {
            source_keypair,
            source_ciphertext,
            balance,
            amount,
            destination_pubkey: destination.public,
        }
    }

    #[tokio::test]
    async fn test_local_only_never_probes() {
        let gate = gate(true);
        let orchestrator = orchestrator(ProofMode::LocalOnly, gate.clone());
        let input = transfer_input(1000, 250);

        let outcome = orchestrator.prove_transfer(&input).await.unwrap();

        assert!(outcome.instruction.is_none());
        assert!(!outcome.requires_zk_program);
        assert!(!outcome.used_fallback);
        assert!(outcome.status.is_none());
        assert_eq!(gate.calls.load(Ordering::SeqCst), 0);

        let result = orchestrator
            .verify_transfer(&outcome.proof_bytes, &input.context())
            .await;
        assert_eq!(result, VerificationResult::valid(false));
        assert_eq!(gate.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_enabled_gate_produces_instruction() {
        let orchestrator = orchestrator(ProofMode::AutoDetect, gate(true));
        let input = transfer_input(1000, 250);

        let outcome = orchestrator.prove_transfer(&input).await.unwrap();
        let instruction = outcome.instruction.expect("instruction when gate is enabled");

        assert_eq!(instruction.program_id, orchestrator.config().zk_program_id);
        assert_eq!(instruction.proof_data.proof, outcome.proof_bytes);
        assert_eq!(
            instruction.proof_data.public_inputs,
            public_inputs(&input.context(), &outcome.proof)
        );
        assert!(outcome.status.map(|s| s.enabled).unwrap_or(false));
    }

    #[tokio::test]
    async fn test_zk_program_only_disabled() {
        let orchestrator = orchestrator(ProofMode::ZkProgramOnly, gate(false));
        let input = transfer_input(1000, 250);

        let outcome = orchestrator.prove_transfer(&input).await.unwrap();
        assert!(outcome.instruction.is_none());
        assert!(outcome.requires_zk_program);
        assert_eq!(outcome.proof_bytes.len(), 1824);

        let result = orchestrator
            .verify_transfer(&outcome.proof_bytes, &input.context())
            .await;
        assert!(!result.valid);
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn test_fallback_when_disabled() {
        let orchestrator = orchestrator(ProofMode::ZkProgramWithFallback, gate(false));
        let input = transfer_input(1000, 250);

        let outcome = orchestrator.prove_transfer(&input).await.unwrap();
        assert!(outcome.instruction.is_none());
        assert!(outcome.used_fallback);

        let result = orchestrator
            .verify_transfer(&outcome.proof_bytes, &input.context())
            .await;
        assert_eq!(result, VerificationResult::valid(true));
    }

    #[tokio::test]
    async fn test_network_failure_treated_as_disabled() {
        let orchestrator = orchestrator(ProofMode::AutoDetect, Arc::new(DownGate));
        let input = transfer_input(500, 500);

        let outcome = orchestrator.prove_transfer(&input).await.unwrap();

        assert!(outcome.instruction.is_none());
        assert!(!outcome.requires_zk_program);
        let status = outcome.status.unwrap();
        assert!(!status.enabled);
        assert!(status.message.contains("timed out"));
    }

    #[tokio::test]
    async fn test_status_cached_between_calls() {
        let gate = gate(true);
        let orchestrator = orchestrator(ProofMode::AutoDetect, gate.clone());
        let input = transfer_input(100, 1);

        let outcome = orchestrator.prove_transfer(&input).await.unwrap();
        orchestrator
            .verify_transfer(&outcome.proof_bytes, &input.context())
            .await;

        assert_eq!(gate.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_verify_never_errors_on_garbage() {
        let orchestrator = orchestrator(ProofMode::LocalOnly, gate(false));
        let input = transfer_input(100, 1);
        let context = input.context();

        for bytes in [vec![], vec![0u8; 1824], vec![0xffu8; 1824], vec![1u8; 10]] {
            let result = orchestrator.verify_transfer(&bytes, &context).await;
            assert!(!result.valid);
            assert!(result.error.is_some());
        }
    }

    #[tokio::test]
    async fn test_tampered_proof_rejected() {
        let orchestrator = orchestrator(ProofMode::LocalOnly, gate(false));
        let input = transfer_input(100, 40);
        let mut rng = ChaCha20Rng::from_seed([8u8; 32]);

        let outcome = orchestrator
            .prove_transfer_with_rng(&input, &mut rng)
            .await
            .unwrap();
        let mut bytes = outcome.proof_bytes;
        // first scalar of the equality proof
        bytes[128 + 64] ^= 0x01;

        let result = orchestrator.verify_transfer(&bytes, &input.context()).await;
        assert!(!result.valid);
    }

    #[tokio::test]
    async fn test_insufficient_funds_fails_fast() {
        let orchestrator = orchestrator(ProofMode::LocalOnly, gate(false));
        let input = transfer_input(10, 11);

        let result = orchestrator.prove_transfer(&input).await;
        assert!(matches!(
            result,
            Err(ProverError::Crypto(confidential_crypto::CryptoError::InsufficientFunds))
        ));
    }
}
