//! txkit CLI Application
//!
//! A command-line interface for multisig and logic-signature payments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use txkit::cli::{self, AppState, CliResult};
use txkit::config::Config;
use txkit::flows::CompileMode;

#[derive(Parser)]
#[command(name = "txkit")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "Multisig and logic-signature payments against a ledger node", long_about = None)]
struct Cli {
    /// Configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Node base URL, overriding the configuration
    #[arg(long, global = true)]
    node_url: Option<String>,

    /// Node API token, overriding the configuration
    #[arg(long, global = true)]
    api_token: Option<String>,

    /// Directory for the multisig transaction files
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use this absolute fee instead of the node's per-byte suggestion
    #[arg(long, global = true)]
    flat_fee: Option<u64>,

    /// Rounds to wait for confirmation
    #[arg(long, global = true)]
    wait_rounds: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "txkit.json")]
        out: PathBuf,
    },

    /// Key management
    Keys {
        #[command(subcommand)]
        action: KeyCommands,
    },

    /// Offline single-key payments
    Single {
        #[command(subcommand)]
        action: SingleCommands,
    },

    /// Multisig account operations
    Multisig {
        #[command(subcommand)]
        action: MultisigCommands,
    },

    /// Logic escrow operations
    Escrow {
        #[command(subcommand)]
        action: EscrowCommands,
    },

    /// Show node status
    Status,

    /// Wait for a submitted transaction to confirm
    Wait {
        /// Transaction ID
        txid: String,
    },
}

#[derive(Subcommand)]
enum KeyCommands {
    /// Generate a new key
    New {
        /// Where to write the key file
        #[arg(short, long)]
        out: PathBuf,

        /// Optional label
        #[arg(short, long)]
        label: Option<String>,
    },

    /// Show a key's address and public key
    Show {
        /// Key file
        key: PathBuf,
    },
}

#[derive(Subcommand)]
enum SingleCommands {
    /// Build a payment and save it for offline signing
    SaveUnsigned {
        /// Sender's address
        #[arg(long)]
        from: String,

        /// Recipient's address
        #[arg(long)]
        to: String,

        /// Amount to send
        #[arg(short, long)]
        amount: u64,

        /// Optional note
        #[arg(short, long)]
        note: Option<String>,
    },

    /// Sign the saved transaction (no node needed)
    Sign {
        /// Sender's key file
        #[arg(short, long)]
        key: PathBuf,
    },

    /// Submit the signed transaction and wait for confirmation
    Send,
}

#[derive(Subcommand)]
enum MultisigCommands {
    /// Show the address of a multisig account
    Address {
        /// Signatures required
        #[arg(short, long)]
        threshold: u8,

        /// Member public keys (hex), in account order
        #[arg(short, long = "member", required = true)]
        members: Vec<String>,
    },

    /// Build a payment from the account and save it for signing
    SaveUnsigned {
        /// Signatures required
        #[arg(short, long)]
        threshold: u8,

        /// Member public keys (hex), in account order
        #[arg(short, long = "member", required = true)]
        members: Vec<String>,

        /// Recipient's address
        #[arg(long)]
        to: String,

        /// Amount to send
        #[arg(short, long)]
        amount: u64,

        /// Optional note
        #[arg(short, long)]
        note: Option<String>,
    },

    /// Add a signature to the saved transaction
    Sign {
        /// Member key file
        #[arg(short, long)]
        key: PathBuf,
    },

    /// Submit the signed transaction and wait for confirmation
    Send,
}

#[derive(Subcommand)]
enum EscrowCommands {
    /// Compile a script and show its escrow address
    Compile {
        /// Script source file
        source: PathBuf,

        /// Compile on the node instead of locally
        #[arg(long)]
        remote: bool,

        /// Write the compiled program here
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Print the disassembly
        #[arg(long)]
        disassemble: bool,
    },

    /// Print the escrow address of a script
    Address {
        /// Script source file
        source: PathBuf,

        /// Compile on the node instead of locally
        #[arg(long)]
        remote: bool,
    },

    /// Pay from the escrow account
    Pay {
        /// Script source file
        source: PathBuf,

        /// Compile on the node instead of locally
        #[arg(long)]
        remote: bool,

        /// Program argument: int:N, str:TEXT or hex:BYTES
        #[arg(long = "arg")]
        args: Vec<String>,

        /// Delegate the program with this key instead of paying from the escrow
        #[arg(long)]
        delegate_key: Option<PathBuf>,

        /// Recipient's address
        #[arg(long)]
        to: String,

        /// Amount to send
        #[arg(short, long)]
        amount: u64,

        /// Optional note
        #[arg(short, long)]
        note: Option<String>,

        /// Close the account, sending its remainder here
        #[arg(long)]
        close_to: Option<String>,
    },
}

fn compile_mode(remote: bool) -> CompileMode {
    if remote {
        CompileMode::Remote
    } else {
        CompileMode::Local
    }
}

/// Load the configuration file and apply command-line overrides
fn load_config(cli: &Cli) -> CliResult<Config> {
    let mut config = Config::load_or_default(cli.config.as_deref())?;

    if let Some(url) = &cli.node_url {
        config.client.node_url = url.clone();
    }
    if let Some(token) = &cli.api_token {
        config.client.api_token = Some(token.clone());
    }
    if let Some(dir) = &cli.data_dir {
        config.flow.data_dir = dir.clone();
    }
    if let Some(fee) = cli.flat_fee {
        config.flow.flat_fee = Some(fee);
    }
    if let Some(rounds) = cli.wait_rounds {
        config.flow.wait_rounds = rounds;
    }

    config.validate()?;
    Ok(config)
}

/// Cancel `token` on Ctrl-C
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, cancelling");
            token.cancel();
        }
    });
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Commands that need neither a node nor the configuration file
    match &cli.command {
        Commands::Init { out } => {
            Config::default().save(out)?;
            println!("✅ Default configuration written to {}", out.display());
            return Ok(());
        }
        Commands::Keys { action } => {
            return match action {
                KeyCommands::New { out, label } => cli::cmd_keys_new(label.as_deref(), out),
                KeyCommands::Show { key } => cli::cmd_keys_show(key),
            };
        }
        Commands::Multisig {
            action: MultisigCommands::Address { threshold, members },
        } => {
            let account = cli::parse_account(*threshold, members)?;
            return cli::cmd_multisig_address(&account);
        }
        Commands::Single {
            action: SingleCommands::Sign { key },
        } => {
            let config = load_config(&cli)?;
            return cli::cmd_single_sign(&config, key);
        }
        _ => {}
    }

    let config = load_config(&cli)?;
    let state = AppState::new(config)?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let cancel = CancellationToken::new();
        cancel_on_ctrl_c(cancel.clone());

        match cli.command {
            Commands::Init { .. } | Commands::Keys { .. } => unreachable!(),

            Commands::Single { action } => match action {
                SingleCommands::SaveUnsigned {
                    from,
                    to,
                    amount,
                    note,
                } => {
                    cli::cmd_single_save_unsigned(&state, &from, &to, amount, note.as_deref())
                        .await
                }
                SingleCommands::Sign { .. } => unreachable!(),
                SingleCommands::Send => cli::cmd_single_send(&state, cancel).await,
            },

            Commands::Multisig { action } => match action {
                MultisigCommands::Address { .. } => unreachable!(),
                MultisigCommands::SaveUnsigned {
                    threshold,
                    members,
                    to,
                    amount,
                    note,
                } => {
                    let account = cli::parse_account(threshold, &members)?;
                    cli::cmd_multisig_save_unsigned(&state, &account, &to, amount, note.as_deref())
                        .await
                }
                MultisigCommands::Sign { key } => cli::cmd_multisig_sign(&state, &key),
                MultisigCommands::Send => cli::cmd_multisig_send(&state, cancel).await,
            },

            Commands::Escrow { action } => match action {
                EscrowCommands::Compile {
                    source,
                    remote,
                    out,
                    disassemble,
                } => {
                    cli::cmd_escrow_compile(
                        &state,
                        &source,
                        compile_mode(remote),
                        out.as_deref(),
                        disassemble,
                    )
                    .await
                }
                EscrowCommands::Address { source, remote } => {
                    cli::cmd_escrow_address(&state, &source, compile_mode(remote)).await
                }
                EscrowCommands::Pay {
                    source,
                    remote,
                    args,
                    delegate_key,
                    to,
                    amount,
                    note,
                    close_to,
                } => {
                    cli::cmd_escrow_pay(
                        &state,
                        &source,
                        compile_mode(remote),
                        &args,
                        delegate_key.as_deref(),
                        &to,
                        amount,
                        note.as_deref(),
                        close_to.as_deref(),
                        cancel,
                    )
                    .await
                }
            },

            Commands::Status => cli::cmd_status(&state).await,

            Commands::Wait { txid } => cli::cmd_wait(&state, &txid, cancel).await,
        }
    })
}
