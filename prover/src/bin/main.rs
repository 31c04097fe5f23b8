use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use confidential_crypto::{
    transfer::encrypt_balance,
    utils::{from_hex, to_hex},
    ElGamalKeypair, TransferContext, TransferInput,
};
use confidential_prover::{ProofOrchestrator, ProverConfig};
use confidential_types::ProofMode;
use rand::rngs::OsRng;
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "prove", about = "Confidential transfer proof generation and verification")]
struct Cli {
    /// Proof mode (LOCAL_ONLY, ZK_PROGRAM_ONLY, ZK_PROGRAM_WITH_FALLBACK, AUTO_DETECT)
    #[arg(long, global = true)]
    mode: Option<ProofMode>,

    /// JSON-RPC endpoint used to probe the feature gate
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    #[arg(long, global = true)]
    zk_program_id: Option<String>,

    #[arg(long, global = true)]
    feature_gate_id: Option<String>,

    /// Seconds a feature gate status stays cached
    #[arg(long, global = true)]
    status_ttl_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build and verify a transfer between two fresh accounts
    Transfer {
        #[arg(long, default_value_t = 1_000)]
        balance: u64,

        #[arg(long, default_value_t = 250)]
        amount: u64,

        /// Print the serialized proof and context as hex
        #[arg(long)]
        print_proof: bool,
    },
    /// Verify a hex-encoded proof against a hex-encoded transfer context
    Verify {
        #[arg(long)]
        proof: String,

        #[arg(long)]
        context: String,
    },
    /// Report the feature gate status for the configured mode
    Status,
}

impl Cli {
    /// Flags take precedence over `CT_*` environment variables.
    fn config(&self) -> Result<ProverConfig> {
        let mut config = ProverConfig::from_env().context("reading CT_* environment")?;
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(url) = &self.rpc_url {
            config.rpc_url = url.clone();
        }
        if let Some(program_id) = &self.zk_program_id {
            config.zk_program_id = program_id.clone();
        }
        if let Some(feature_gate_id) = &self.feature_gate_id {
            config.feature_gate_id = feature_gate_id.clone();
        }
        if let Some(secs) = self.status_ttl_secs {
            config.status_ttl = Duration::from_secs(secs);
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let orchestrator = ProofOrchestrator::new(cli.config()?);

    match cli.command {
        Command::Transfer {
            balance,
            amount,
            print_proof,
        } => run_transfer(&orchestrator, balance, amount, print_proof).await,
        Command::Verify { proof, context } => {
            run_verify(&orchestrator, &proof, &context).await
        }
        Command::Status => {
            let status = orchestrator.status().await;
            let report = json!({
                "mode": orchestrator.config().mode,
                "enabled": status.as_ref().map(|s| s.enabled),
                "message": status.as_ref().map(|s| s.message.clone()),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}

async fn run_transfer(
    orchestrator: &ProofOrchestrator,
    balance: u64,
    amount: u64,
    print_proof: bool,
) -> Result<()> {
    let source = ElGamalKeypair::new_rand();
    let destination = ElGamalKeypair::new_rand();
    let (source_ciphertext, _) = encrypt_balance(&source.public, balance, &mut OsRng)?;

    let input = TransferInput {
        source_keypair: source,
        source_ciphertext,
        balance,
        amount,
        destination_pubkey: destination.public,
    };

    let outcome = orchestrator
        .prove_transfer(&input)
        .await
        .context("generating transfer proof")?;
    let verification = orchestrator
        .verify_transfer(&outcome.proof_bytes, &input.context())
        .await;

    let mut report = json!({
        "mode": orchestrator.config().mode,
        "proof_size": outcome.proof_bytes.len(),
        "instruction": outcome.instruction.as_ref().map(|ix| ix.program_id.clone()),
        "requires_zk_program": outcome.requires_zk_program,
        "used_fallback": outcome.used_fallback,
        "verification": verification,
    });
    if print_proof {
        report["proof"] = json!(to_hex(&outcome.proof_bytes));
        report["context"] = json!(to_hex(&input.context().to_bytes()));
    }
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

async fn run_verify(orchestrator: &ProofOrchestrator, proof: &str, context: &str) -> Result<()> {
    let proof_bytes = from_hex(proof).context("decoding proof hex")?;
    let context_bytes = from_hex(context).context("decoding context hex")?;
    let context = TransferContext::from_bytes(&context_bytes).context("parsing transfer context")?;

    let verification = orchestrator.verify_transfer(&proof_bytes, &context).await;
    let report = json!({
        "mode": orchestrator.config().mode,
        "proof_size": proof_bytes.len(),
        "verification": verification,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
