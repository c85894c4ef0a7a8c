//! Rate Oracle CLI
//!
//! Command-line helpers for feeders: salts, vote hashes, prevote and vote
//! messages, stateless message validation and configuration files.

use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use console::{style, Term};

use rate_oracle::core::config::OracleConfig;
use rate_oracle::oracle::tuples::parse_exchange_rate_tuples;
use rate_oracle::oracle::vote_hash::AggregateVoteHash;
use rate_oracle::protocol::messages::OracleMsg;
use rate_oracle::utils::crypto::random_salt;
use rate_oracle::utils::validation::validate_salt;

/// Rate Oracle CLI - commit-reveal exchange rate voting
#[derive(Parser)]
#[command(name = "rate-oracle")]
#[command(author = "Rate Oracle Team")]
#[command(version = rate_oracle::VERSION)]
#[command(about = "Command-line interface for the rate oracle", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to a JSON configuration file
    #[arg(short, long, env = "RATE_ORACLE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a random vote salt
    Salt,

    /// Compute an aggregate vote hash
    Hash {
        #[command(flatten)]
        vote: VoteArgs,
    },

    /// Build a prevote message
    Prevote {
        #[command(flatten)]
        vote: VoteArgs,
    },

    /// Build a vote message revealing a prevote
    Vote {
        #[command(flatten)]
        vote: VoteArgs,
    },

    /// Validate a JSON message without any state
    Validate {
        /// Message file, `-` for stdin
        #[arg(default_value = "-")]
        file: String,
    },

    /// Print or write the configuration
    Config {
        /// Use the testnet preset instead of the loaded configuration
        #[arg(long)]
        testnet: bool,

        /// Write to this path instead of printing
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct VoteArgs {
    /// Exchange rates, e.g. "1.02BTC,3000.5ETH"
    #[arg(short, long)]
    rates: String,

    /// Feeder account address
    #[arg(short, long)]
    feeder: String,

    /// Validator operator address
    #[arg(long)]
    validator: String,

    /// Salt; generated when omitted
    #[arg(short, long)]
    salt: Option<String>,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let term = Term::stdout();

    if let Err(e) = run_command(&cli, &term) {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}

fn run_command(cli: &Cli, term: &Term) -> anyhow::Result<()> {
    let config = load_config(cli)?;
    match &cli.command {
        Commands::Salt => cmd_salt(term),
        Commands::Hash { vote } => cmd_hash(&config, vote, term),
        Commands::Prevote { vote } => cmd_prevote(&config, vote, term),
        Commands::Vote { vote } => cmd_vote(&config, vote, term),
        Commands::Validate { file } => cmd_validate(&config, file, cli.verbose, term),
        Commands::Config { testnet, output } => cmd_config(&config, *testnet, output.as_ref(), term),
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<OracleConfig> {
    let config = match &cli.config {
        Some(path) => OracleConfig::load(path)?.with_env_overrides(),
        None => OracleConfig::from_env(),
    };
    config.validate().context("invalid configuration")?;
    Ok(config)
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMMAND HANDLERS
// ═══════════════════════════════════════════════════════════════════════════════

fn cmd_salt(term: &Term) -> anyhow::Result<()> {
    term.write_line(&random_salt())?;
    Ok(())
}

/// Checks every input of a vote and returns the salt, the hash and the salt's origin
fn commit(config: &OracleConfig, vote: &VoteArgs) -> anyhow::Result<(String, AggregateVoteHash, bool)> {
    let (salt, generated) = match &vote.salt {
        Some(salt) => (salt.clone(), false),
        None => (random_salt(), true),
    };
    validate_salt(&salt)?;
    parse_exchange_rate_tuples(&vote.rates).context("invalid exchange rates")?;
    config
        .codec
        .parse_account(&vote.feeder)
        .context("invalid feeder address")?;
    config
        .codec
        .parse_validator(&vote.validator)
        .context("invalid validator address")?;

    let hash = AggregateVoteHash::compute(&salt, &vote.rates, &vote.feeder, &vote.validator);
    Ok((salt, hash, generated))
}

fn cmd_hash(config: &OracleConfig, vote: &VoteArgs, term: &Term) -> anyhow::Result<()> {
    let (salt, hash, generated) = commit(config, vote)?;
    if generated {
        eprintln!("{} salt: {}", style("ℹ").blue(), style(&salt).yellow());
    }
    term.write_line(&hash.to_hex())?;
    Ok(())
}

fn cmd_prevote(config: &OracleConfig, vote: &VoteArgs, term: &Term) -> anyhow::Result<()> {
    let (salt, hash, _) = commit(config, vote)?;
    let msg = OracleMsg::prevote(&hash, &vote.feeder, &vote.validator);
    msg.validate_basic(&config.codec)?;

    eprintln!(
        "{} keep this salt for the reveal: {}",
        style("→").cyan(),
        style(&salt).yellow()
    );
    term.write_line(&serde_json::to_string_pretty(&msg)?)?;
    Ok(())
}

fn cmd_vote(config: &OracleConfig, vote: &VoteArgs, term: &Term) -> anyhow::Result<()> {
    let salt = vote
        .salt
        .as_ref()
        .context("a vote reveals an earlier prevote, pass its --salt")?;
    let msg = OracleMsg::vote(salt.as_str(), &vote.rates, &vote.feeder, &vote.validator);
    msg.validate_basic(&config.codec)?;

    term.write_line(&serde_json::to_string_pretty(&msg)?)?;
    Ok(())
}

fn cmd_validate(config: &OracleConfig, file: &str, verbose: bool, term: &Term) -> anyhow::Result<()> {
    let content = if file == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(file).with_context(|| format!("failed to read {}", file))?
    };

    let msg: OracleMsg = serde_json::from_str(&content).context("not an oracle message")?;
    msg.validate_basic(&config.codec)?;

    term.write_line(&format!(
        "{} valid {} message",
        style("✓").green(),
        style(msg.msg_type()).cyan()
    ))?;
    if verbose {
        for signer in msg.signers(&config.codec)? {
            term.write_line(&format!("  Signer: {}", config.codec.encode_account(&signer)?))?;
        }
        term.write_line(&format!("  Sign bytes: {}", String::from_utf8(msg.sign_bytes()?)?))?;
    }
    Ok(())
}

fn cmd_config(
    config: &OracleConfig,
    testnet: bool,
    output: Option<&PathBuf>,
    term: &Term,
) -> anyhow::Result<()> {
    let config = if testnet {
        OracleConfig::testnet()
    } else {
        config.clone()
    };

    match output {
        Some(path) => {
            config.save(path)?;
            term.write_line(&format!(
                "{} configuration written to {}",
                style("✓").green(),
                path.display()
            ))?;
        }
        None => term.write_line(&serde_json::to_string_pretty(&config)?)?,
    }
    Ok(())
}
