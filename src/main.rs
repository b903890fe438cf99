use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bitcoin::consensus::encode::serialize_hex;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ln_commit_tx::config::{parse_public_key, ChannelStateFile};
use ln_commit_tx::{
    build_commitment_from_basepoints, build_htlc_transactions, derive_public_key,
    derive_revocation_public_key, HtlcTxKind, Secp256k1,
};

// ============================================================================
// CLI DEFINITION
// ============================================================================

/// Main CLI structure
#[derive(Parser)]
#[command(name = "ln-commit-tx")]
#[command(version)]
#[command(about = "Build BOLT #3 commitment and HTLC transactions", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// CLI Subcommands
#[derive(Subcommand)]
enum Commands {
    /// Build the unsigned commitment transaction described by a channel state file
    Commitment {
        #[arg(short = 's', long, help = "Channel state JSON file")]
        state: PathBuf,
        #[arg(long, help = "Also print the unsigned HTLC transactions")]
        htlc_txs: bool,
    },
    /// Derive a per-commitment public key from a basepoint
    DeriveKey {
        #[arg(short = 'b', long, help = "Basepoint (hex)")]
        basepoint: String,
        #[arg(short = 'p', long, help = "Per-commitment point (hex)")]
        per_commitment_point: String,
        #[arg(long, help = "Derive a revocation key instead")]
        revocation: bool,
    },
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_commitment(path: &Path, htlc_txs: bool) -> Result<()> {
    let secp = Secp256k1::new();

    let state = ChannelStateFile::from_path(path)
        .and_then(|file| file.to_channel_state())
        .with_context(|| format!("loading {}", path.display()))?;

    let (keys, commitment) = build_commitment_from_basepoints(
        &state.params,
        &state.per_commitment_point,
        &state.holder,
        &state.counterparty,
        state.feerate_per_kw,
        state.to_self_msat,
        state.to_other_msat,
        &state.htlcs,
        state.counterparty_htlcs.as_deref(),
        state.commitment_number,
        state.perspective,
        &secp,
    )
    .context("building commitment transaction")?;

    println!("txid: {}", commitment.tx.compute_txid());
    println!("tx: {}", serialize_hex(&commitment.tx));
    println!("base fee: {} sat", commitment.base_fee_sat);
    println!("actual fee: {} sat", commitment.actual_fee_sat);
    for (index, entry) in commitment.htlc_map.as_slice().iter().enumerate() {
        let value = commitment.tx.output[index].value.to_sat();
        match entry {
            Some(htlc) => println!("output {}: {} sat, htlc {}", index, value, htlc.id),
            None => println!("output {}: {} sat", index, value),
        }
    }

    if htlc_txs {
        for htlc_tx in build_htlc_transactions(&commitment, &keys)? {
            let kind = match htlc_tx.kind {
                HtlcTxKind::Timeout => "timeout",
                HtlcTxKind::Success => "success",
            };
            println!(
                "htlc {} {} (output {}): {}",
                htlc_tx.htlc.id,
                kind,
                htlc_tx.commitment_output_index,
                serialize_hex(&htlc_tx.tx)
            );
        }
    }

    Ok(())
}

fn run_derive_key(basepoint: &str, per_commitment_point: &str, revocation: bool) -> Result<()> {
    let secp = Secp256k1::new();
    let basepoint = parse_public_key("basepoint", basepoint)?;
    let per_commitment_point = parse_public_key("per_commitment_point", per_commitment_point)?;

    let key = if revocation {
        derive_revocation_public_key(&basepoint, &per_commitment_point, &secp)?
    } else {
        derive_public_key(&basepoint, &per_commitment_point, &secp)?
    };
    println!("{}", key);

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Commitment { state, htlc_txs } => run_commitment(state, *htlc_txs),
        Commands::DeriveKey {
            basepoint,
            per_commitment_point,
            revocation,
        } => run_derive_key(basepoint, per_commitment_point, *revocation),
    }
}
