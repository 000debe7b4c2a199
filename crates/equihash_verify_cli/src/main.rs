//! Thin CLI front-end for `equihash_verify`.
//!
//! Reads a hex-encoded header, an optional hex-encoded 32-byte nonce, and a hex-encoded solution,
//! verifies the solution against a named parameter preset (or a JSON `--params-file`), and prints
//! a colored VALID/INVALID verdict. Not part of the verifier's public contract -- a convenience
//! consumer only.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use colored::Colorize;
use equihash_verify::{verify_with_params_outcome, Outcome, Params};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Preset {
    Zcash,
    BitcoinGold,
}

impl Preset {
    fn params(self) -> Params {
        match self {
            Preset::Zcash => Params::zcash(),
            Preset::BitcoinGold => Params::bitcoin_gold(),
        }
    }
}

/// Ad-hoc parameter set loaded from `--params-file`, as `{"n":144,"k":5,"person":"BgoldPoW"}`.
#[derive(Deserialize)]
struct ParamsFile {
    n: u32,
    k: u32,
    person: String,
}

impl ParamsFile {
    fn into_params(self) -> Result<Params, String> {
        let person_bytes = self.person.as_bytes();
        if person_bytes.len() != 8 {
            return Err(format!(
                "person must be exactly 8 bytes, got {} ({:?})",
                person_bytes.len(),
                self.person
            ));
        }
        let mut person = [0u8; 8];
        person.copy_from_slice(person_bytes);
        Params::new(self.n, self.k, person).map_err(|e| e.to_string())
    }
}

/// Verify an Equihash proof-of-work solution against a block-header prefix.
#[derive(Parser)]
#[command(name = "equihash-verify", version, about)]
struct Cli {
    /// Hex-encoded header prefix (>= 108 bytes; >= 140 if it embeds the nonce).
    #[arg(long)]
    header: String,

    /// Hex-encoded 32-byte nonce. If omitted, extracted from header[108..140] and reversed.
    #[arg(long)]
    nonce: Option<String>,

    /// Hex-encoded compact (minimal) solution.
    #[arg(long)]
    solution: String,

    /// Named parameter preset.
    #[arg(long, value_enum, default_value_t = Preset::Zcash, conflicts_with = "params_file")]
    preset: Preset,

    /// Path to a JSON file of the form `{"n":144,"k":5,"person":"BgoldPoW"}`.
    #[arg(long)]
    params_file: Option<PathBuf>,
}

fn parse_nonce(s: &str) -> Result<[u8; 32], String> {
    let bytes = hex::decode(s).map_err(|e| format!("invalid nonce hex: {e}"))?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| format!("nonce must be exactly 32 bytes, got {len}"))
}

fn run(cli: Cli) -> Result<Outcome, String> {
    let params = match cli.params_file {
        Some(path) => {
            let contents =
                fs::read_to_string(&path).map_err(|e| format!("reading {path:?}: {e}"))?;
            let file: ParamsFile =
                serde_json::from_str(&contents).map_err(|e| format!("parsing {path:?}: {e}"))?;
            file.into_params()?
        }
        None => cli.preset.params(),
    };

    let header = hex::decode(&cli.header).map_err(|e| format!("invalid header hex: {e}"))?;
    let solution = hex::decode(&cli.solution).map_err(|e| format!("invalid solution hex: {e}"))?;
    let nonce = cli.nonce.as_deref().map(parse_nonce).transpose()?;

    Ok(verify_with_params_outcome(&params, &header, nonce, &solution))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(Outcome::Valid) => {
            println!("{}", "VALID".green().bold());
            ExitCode::SUCCESS
        }
        Ok(Outcome::Invalid { reason }) => {
            println!("{} {}", "INVALID:".red().bold(), reason);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
