//! Command-line front end.
//!
//! Every command writes JSON (or a plain table for `matrix`) to the given
//! writer so output can be piped or captured in tests.

use anyhow::{Context, Result};
use cambrium_core::chain::{ChainDataProvider, StaticChainProvider};
use cambrium_core::formation::blend;
use cambrium_core::history::MutationLog;
use cambrium_core::{Engine, FormationKind, GenesisConfig, RoleMatrix, Seed, Taxonomy};
use cambrium_data::BlockDescriptor;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Generation config (TOML); defaults apply when omitted
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Trait taxonomy (TOML); the built-in taxonomy applies when omitted
    #[arg(short, long, global = true)]
    pub taxonomy: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Args, Debug, Clone)]
pub struct SeedArgs {
    /// Block nonce, decimal or 0x-prefixed hex
    #[arg(short, long, value_parser = parse_nonce, conflicts_with = "hash")]
    pub nonce: Option<u32>,

    /// Block hash (hex); folded into a 32-bit seed
    #[arg(long)]
    pub hash: Option<String>,
}

impl SeedArgs {
    pub fn seed(&self) -> Result<Option<Seed>> {
        match (&self.nonce, &self.hash) {
            (Some(nonce), _) => Ok(Some(Seed::from_nonce(*nonce))),
            (None, Some(hash)) => Ok(Some(Seed::from_hash(hash)?)),
            (None, None) => Ok(None),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a population and print it as JSON
    Spawn {
        #[command(flatten)]
        seed: SeedArgs,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Replay confirmation counts and print the mutations that fire
    Evolve {
        #[command(flatten)]
        seed: SeedArgs,

        /// Confirmation counts to poll, in order
        #[arg(long, value_delimiter = ',', required = true)]
        confirmations: Vec<u64>,

        /// Append fired mutations to this JSON-lines log
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Print the role containment and influence table
    Matrix,
    /// Compute a formation, optionally blended towards another
    Formation {
        #[command(flatten)]
        seed: SeedArgs,

        #[arg(long, default_value = "grid")]
        kind: FormationKind,

        #[arg(long, default_value_t = 16)]
        count: usize,

        /// Second formation to blend towards
        #[arg(long)]
        blend_to: Option<FormationKind>,

        /// Blend factor in [0, 1]
        #[arg(long, default_value_t = 0.5)]
        t: f32,
    },
    /// Check a mutation log against a recorded digest
    Verify {
        #[arg(short, long)]
        log: PathBuf,

        /// Expected SHA-256 hex digest; prints the current digest if omitted
        #[arg(short, long)]
        digest: Option<String>,
    },
}

/// Accepts `3405691582` or `0xCAFEBABE`.
pub fn parse_nonce(raw: &str) -> std::result::Result<u32, String> {
    let raw = raw.trim();
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => raw.parse::<u32>(),
    };
    parsed.map_err(|e| format!("invalid nonce {raw:?}: {e}"))
}

fn load_config(path: Option<&PathBuf>) -> Result<GenesisConfig> {
    match path {
        Some(path) => GenesisConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(GenesisConfig::default()),
    }
}

fn load_taxonomy(path: Option<&PathBuf>) -> Result<Taxonomy> {
    match path {
        Some(path) => Taxonomy::load(path)
            .with_context(|| format!("loading taxonomy {}", path.display())),
        None => Ok(Taxonomy::default()),
    }
}

fn build_engine(
    config: Option<&PathBuf>,
    taxonomy: Option<&PathBuf>,
    seed: &SeedArgs,
) -> Result<Engine> {
    let config = load_config(config)?;
    let taxonomy = load_taxonomy(taxonomy)?;
    tracing::info!(
        fingerprint = %config.fingerprint(),
        categories = taxonomy.categories.len(),
        "Configuration loaded"
    );
    Ok(Engine::new(config, taxonomy.categories, seed.seed()?)?)
}

pub async fn run<W: Write>(cli: Cli, out: &mut W) -> Result<()> {
    let config_path = cli.config.as_ref();
    let taxonomy_path = cli.taxonomy.as_ref();

    match cli.command {
        Command::Spawn { seed, pretty } => {
            let mut engine = build_engine(config_path, taxonomy_path, &seed)?;
            let population = engine.spawn_population()?;
            if pretty {
                serde_json::to_writer_pretty(&mut *out, &population)?;
            } else {
                serde_json::to_writer(&mut *out, &population)?;
            }
            writeln!(out)?;
        }
        Command::Evolve {
            seed,
            confirmations,
            log,
        } => {
            let mut engine = build_engine(config_path, taxonomy_path, &seed)?;
            let block = BlockDescriptor::new(
                0,
                seed.hash.clone().unwrap_or_default(),
                engine.seed().value(),
                0,
            );
            let mut provider = StaticChainProvider::new([block]);
            let mut population = engine.spawn_population()?;

            let mut fired = Vec::new();
            for count in confirmations {
                provider.set_confirmations(0, count)?;
                let observed = provider.confirmations(0).await?;
                fired.extend(engine.advance(&mut population, observed)?);
            }

            if let Some(path) = log {
                MutationLog::new(&path).append(&fired)?;
                tracing::info!(path = %path.display(), count = fired.len(), "Mutations logged");
            }
            serde_json::to_writer(&mut *out, &fired)?;
            writeln!(out)?;
        }
        Command::Matrix => {
            writeln!(out, "{:<10} {:<10} {:<8} influence", "outer", "inner", "contain")?;
            for entry in RoleMatrix::build().entries() {
                writeln!(
                    out,
                    "{:<10} {:<10} {:<8} {:.2}",
                    entry.outer.to_string(),
                    entry.inner.to_string(),
                    entry.can_contain,
                    entry.influence
                )?;
            }
        }
        Command::Formation {
            seed,
            kind,
            count,
            blend_to,
            t,
        } => {
            let mut engine = build_engine(config_path, taxonomy_path, &seed)?;
            let pattern = engine.formation(kind, count);
            let positions = match blend_to {
                Some(other) => {
                    let target = engine.formation(other, count);
                    blend(&pattern, &target, t)?
                }
                None => pattern.positions().to_vec(),
            };
            let report = json!({
                "pattern": pattern.id(),
                "blend_to": blend_to.map(|k| k.to_string()),
                "positions": positions,
            });
            serde_json::to_writer(&mut *out, &report)?;
            writeln!(out)?;
        }
        Command::Verify { log, digest } => {
            let log = MutationLog::new(log);
            let current = log.digest()?;
            tracing::debug!(path = %log.path().display(), digest = %current, "Digest computed");
            match digest {
                Some(expected) => {
                    let ok = log.verify(&expected)?;
                    writeln!(out, "{}", json!({ "digest": current, "verified": ok }))?;
                    anyhow::ensure!(ok, "Mutation log does not match digest {}", expected);
                }
                None => writeln!(out, "{}", json!({ "digest": current }))?,
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nonce_formats() {
        assert_eq!(parse_nonce("0xCAFEBABE"), Ok(0xCAFE_BABE));
        assert_eq!(parse_nonce("0Xcafebabe"), Ok(0xCAFE_BABE));
        assert_eq!(parse_nonce("42"), Ok(42));
        assert!(parse_nonce("0x1_0000_0000").is_err());
        assert!(parse_nonce("-1").is_err());
    }

    #[test]
    fn test_args_parsing_spawn() {
        let cli = Cli::parse_from(["cambrium", "spawn", "--nonce", "0xCAFEBABE", "--pretty"]);
        match cli.command {
            Command::Spawn { seed, pretty } => {
                assert_eq!(seed.nonce, Some(0xCAFE_BABE));
                assert!(pretty);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_args_parsing_evolve_list() {
        let cli = Cli::parse_from([
            "cambrium",
            "evolve",
            "-n",
            "7",
            "--confirmations",
            "10000,50000,100000",
        ]);
        match cli.command {
            Command::Evolve { confirmations, .. } => {
                assert_eq!(confirmations, vec![10_000, 50_000, 100_000]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_nonce_and_hash_conflict() {
        let result = Cli::try_parse_from(["cambrium", "spawn", "--nonce", "1", "--hash", "ff"]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_spawn_without_seed_fails() {
        let cli = Cli::parse_from(["cambrium", "spawn"]);
        let mut out = Vec::new();
        let err = run(cli, &mut out).await.unwrap_err();
        assert!(err.to_string().contains("Seed unavailable"));
    }

    #[tokio::test]
    async fn test_matrix_lists_every_pair() {
        let cli = Cli::parse_from(["cambrium", "matrix"]);
        let mut out = Vec::new();
        run(cli, &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 26);
    }

    #[tokio::test]
    async fn test_formation_blend_output() {
        let cli = Cli::parse_from([
            "cambrium", "formation", "--nonce", "1", "--kind", "ring", "--count", "6",
            "--blend-to", "grid", "--t", "0.25",
        ]);
        let mut out = Vec::new();
        run(cli, &mut out).await.unwrap();
        let report: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(report["pattern"], "ring:6:1");
        assert_eq!(report["blend_to"], "grid");
        assert_eq!(report["positions"].as_array().unwrap().len(), 6);
    }
}
