//! CLI commands for txkit
//!
//! Implements all command handlers for the CLI interface.

use crate::config::Config;
use crate::core::Address;
use crate::crypto::PubKey;
use crate::flows::{
    self, compile_source, escrow_pay, CompileMode, Confirmation, EscrowPayment, MultisigFlow,
    SingleFlow,
};
use crate::logic::{arg_str, arg_u64, disassemble, LogicSig};
use crate::multisig::{MultisigAccount, MULTISIG_VERSION};
use crate::node::{HttpNode, NodeClient};
use crate::storage::{TxFiles, SIGNED_TXN_FILE};
use crate::wallet::{load_key, Wallet};
use base64::{engine::general_purpose::STANDARD, Engine};
use std::fs;
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Application state for commands that talk to a node
pub struct AppState {
    pub config: Config,
    pub node: HttpNode,
}

impl AppState {
    /// Validate configuration and build the node client
    pub fn new(config: Config) -> CliResult<Self> {
        config.validate()?;
        let node = HttpNode::new(&config.client)?;
        Ok(Self { config, node })
    }
}

// ===== Argument parsing =====

/// Build a multisig account from hex member keys
pub fn parse_account(threshold: u8, members: &[String]) -> CliResult<MultisigAccount> {
    let members = members
        .iter()
        .map(|m| PubKey::from_hex(m))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(MultisigAccount::new(MULTISIG_VERSION, threshold, members)?)
}

/// Parse a program argument: `int:<u64>`, `str:<text>` or `hex:<bytes>`
pub fn parse_arg(arg: &str) -> CliResult<Vec<u8>> {
    match arg.split_once(':') {
        Some(("int", value)) => Ok(arg_u64(value.trim().parse()?)),
        Some(("str", value)) => Ok(arg_str(value)),
        Some(("hex", value)) => Ok(hex::decode(value.trim())?),
        _ => Err(format!("argument must be int:N, str:TEXT or hex:BYTES, got {:?}", arg).into()),
    }
}

/// Print a confirmation and the committed transaction's note
fn print_confirmation(confirmation: &Confirmation) {
    println!("✅ Transaction {} confirmed!", confirmation.txid);
    println!("   🧱 Round: {}", confirmation.confirmed_round);
    if let Some(stx) = &confirmation.info.txn {
        println!("   📤 {} -> {}: {}", stx.txn.sender, stx.txn.receiver, stx.txn.amount);
    }
    if let Some(note) = confirmation.note() {
        println!("   📝 Note: {}", String::from_utf8_lossy(note));
    }
}

// ===== Keys =====

/// Generate a key and write it to `out`
pub fn cmd_keys_new(label: Option<&str>, out: &Path) -> CliResult<()> {
    if out.exists() {
        return Err(format!("{} already exists", out.display()).into());
    }

    let wallet = match label {
        Some(l) => Wallet::with_label(l),
        None => Wallet::new(),
    };
    wallet.save(out)?;

    println!("🔑 New key created!");
    println!("   📍 Address: {}", wallet.address());
    println!("   🔓 Public key: {}", wallet.public_key());
    println!("   💾 Saved to {}", out.display());
    println!("\n⚠️  Keep the key file secret.");
    Ok(())
}

/// Show the public parts of a key file
pub fn cmd_keys_show(key: &Path) -> CliResult<()> {
    let wallet = Wallet::load(key)?;
    let info = wallet.export_public_info();

    println!("🔑 Key {}", key.display());
    if let Some(label) = &info.label {
        println!("   🏷️  Label: {}", label);
    }
    println!("   📍 Address: {}", info.address);
    println!("   🔓 Public key: {}", info.public_key);
    Ok(())
}

// ===== Multisig =====

/// Print a multisig account's address
pub fn cmd_multisig_address(account: &MultisigAccount) -> CliResult<()> {
    println!("🔐 Multisig account ({})", account.description());
    for (i, member) in account.members.iter().enumerate() {
        println!("   {} {}", if i + 1 == account.member_count() { "└─" } else { "├─" }, member);
    }
    println!("   📍 Address: {}", account.address());
    Ok(())
}

/// Build and save an unsigned payment from a multisig account
pub async fn cmd_multisig_save_unsigned(
    state: &AppState,
    account: &MultisigAccount,
    to: &str,
    amount: u64,
    note: Option<&str>,
) -> CliResult<()> {
    let receiver: Address = to.parse()?;
    let flow = MultisigFlow::new(&state.node, &state.config.flow)?;
    let txn = flow
        .save_unsigned(account, receiver, amount, note.map(|n| n.as_bytes().to_vec()))
        .await?;

    println!("📝 Unsigned transaction saved");
    println!("   ├─ ID: {}", txn.id()?);
    println!("   ├─ From: {}", txn.sender);
    println!("   ├─ To: {}", txn.receiver);
    println!("   ├─ Amount: {}", txn.amount);
    println!("   ├─ Fee: {}", txn.fee);
    println!("   └─ Valid rounds: {}..={}", txn.first_valid, txn.last_valid);
    println!("\n📁 Files in {}", flow.files().data_dir().display());
    Ok(())
}

/// Add one signature to the saved transaction
pub fn cmd_multisig_sign(state: &AppState, key: &Path) -> CliResult<()> {
    let key = load_key(key)?;
    let flow = MultisigFlow::new(&state.node, &state.config.flow)?;
    let account = flow.files().load_account()?;
    let (txid, count) = flow.sign(&key)?;

    println!("✍️  Signed transaction {}", txid);
    println!(
        "   Signatures: {}/{} required",
        count,
        account.threshold()
    );
    if count >= account.threshold() as usize {
        println!("   ✅ Threshold reached, ready to send");
    }
    Ok(())
}

/// Submit the signed transaction and wait for confirmation
pub async fn cmd_multisig_send(state: &AppState, cancel: CancellationToken) -> CliResult<()> {
    let flow = MultisigFlow::new(&state.node, &state.config.flow)?;
    let confirmation = flow.send(cancel).await?;
    print_confirmation(&confirmation);
    Ok(())
}

// ===== Single key =====

/// Build and save an unsigned payment from `from`
pub async fn cmd_single_save_unsigned(
    state: &AppState,
    from: &str,
    to: &str,
    amount: u64,
    note: Option<&str>,
) -> CliResult<()> {
    let flow = SingleFlow::new(&state.node, &state.config.flow)?;
    let txn = flow
        .save_unsigned(
            from.parse()?,
            to.parse()?,
            amount,
            note.map(|n| n.as_bytes().to_vec()),
        )
        .await?;

    println!("📝 Unsigned transaction saved");
    println!("   ├─ ID: {}", txn.id()?);
    println!("   ├─ From: {}", txn.sender);
    println!("   ├─ To: {}", txn.receiver);
    println!("   ├─ Amount: {}", txn.amount);
    println!("   └─ Fee: {}", txn.fee);
    println!("\n📁 Files in {}", flow.files().data_dir().display());
    Ok(())
}

/// Sign the saved transaction with the sender's key; needs no node
pub fn cmd_single_sign(config: &Config, key: &Path) -> CliResult<()> {
    let key = load_key(key)?;
    let files = TxFiles::new(&config.flow.data_dir)?;
    let stx = flows::sign_saved(&files, &key)?;

    println!("✍️  Signed transaction {}", stx.id()?);
    println!("   💾 Saved to {}", files.path(SIGNED_TXN_FILE).display());
    Ok(())
}

/// Submit the signed transaction and wait for confirmation
pub async fn cmd_single_send(state: &AppState, cancel: CancellationToken) -> CliResult<()> {
    let flow = SingleFlow::new(&state.node, &state.config.flow)?;
    let confirmation = flow.send(cancel).await?;
    print_confirmation(&confirmation);
    Ok(())
}

// ===== Escrow =====

/// Compile a script and show its escrow address
pub async fn cmd_escrow_compile(
    state: &AppState,
    source: &Path,
    mode: CompileMode,
    out: Option<&Path>,
    show_disassembly: bool,
) -> CliResult<()> {
    let text = fs::read_to_string(source)?;
    let compiled = compile_source(&state.node, &text, mode).await?;

    println!("📜 Compiled {}", source.display());
    println!("   ├─ Program: {}", STANDARD.encode(&compiled.program));
    println!("   ├─ Size: {} bytes", compiled.program.len());
    println!("   └─ Escrow address: {}", compiled.hash);

    if let Some(out) = out {
        crate::storage::write_atomic(out, &compiled.program)?;
        println!("\n💾 Program written to {}", out.display());
    }

    if show_disassembly {
        println!("\n{}", disassemble(&compiled.program)?);
    }
    Ok(())
}

/// Print only the escrow address, for use in scripts
pub async fn cmd_escrow_address(
    state: &AppState,
    source: &Path,
    mode: CompileMode,
) -> CliResult<()> {
    let text = fs::read_to_string(source)?;
    let compiled = compile_source(&state.node, &text, mode).await?;
    println!("{}", compiled.hash);
    Ok(())
}

/// Pay out of an escrow (or delegated) account
#[allow(clippy::too_many_arguments)]
pub async fn cmd_escrow_pay(
    state: &AppState,
    source: &Path,
    mode: CompileMode,
    args: &[String],
    delegate_key: Option<&Path>,
    to: &str,
    amount: u64,
    note: Option<&str>,
    close_to: Option<&str>,
    cancel: CancellationToken,
) -> CliResult<()> {
    let text = fs::read_to_string(source)?;
    let compiled = compile_source(&state.node, &text, mode).await?;

    let args = args
        .iter()
        .map(|a| parse_arg(a))
        .collect::<CliResult<Vec<_>>>()?;
    let mut lsig = LogicSig::new(compiled.program, args)?;
    if let Some(path) = delegate_key {
        lsig = lsig.delegate_single(&load_key(path)?)?;
    }

    let mut payment = EscrowPayment::new(to.parse()?, amount);
    payment.note = note.map(|n| n.as_bytes().to_vec());
    if let Some(close_to) = close_to {
        payment.close_remainder_to = Some(close_to.parse()?);
    }

    println!("🔐 Paying from {}", lsig.authorizer()?);
    let confirmation = escrow_pay(&state.node, &state.config.flow, &lsig, &payment, cancel).await?;
    print_confirmation(&confirmation);
    Ok(())
}

// ===== Node =====

/// Show node status and suggested params
pub async fn cmd_status(state: &AppState) -> CliResult<()> {
    let status = state.node.status().await?;
    let params = state.node.suggested_params().await?;

    println!("📊 Node {}", state.node.base_url());
    println!("   ├─ Last round: {}", status.last_round);
    println!("   ├─ Genesis: {}", params.genesis_id);
    println!("   ├─ Fee per byte: {}", params.fee);
    println!("   └─ Minimum fee: {}", params.min_fee);
    Ok(())
}

/// Wait for an already-submitted transaction
pub async fn cmd_wait(state: &AppState, txid: &str, cancel: CancellationToken) -> CliResult<()> {
    println!("⏳ Waiting for {}...", txid);
    let confirmation = flows::wait_for(&state.node, &state.config.flow, txid, cancel).await?;
    print_confirmation(&confirmation);
    println!("   🔁 Polls: {}", confirmation.polls);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;

    #[test]
    fn test_parse_arg() {
        assert_eq!(parse_arg("int:123").unwrap(), arg_u64(123));
        assert_eq!(parse_arg("str:my string").unwrap(), b"my string".to_vec());
        assert_eq!(parse_arg("hex:00ff").unwrap(), vec![0x00, 0xff]);
        assert!(parse_arg("int:abc").is_err());
        assert!(parse_arg("123").is_err());
    }

    #[test]
    fn test_parse_account() {
        let keys: Vec<KeyPair> = (0..3).map(|_| KeyPair::generate()).collect();
        let members: Vec<String> = keys.iter().map(|k| k.public_key().to_hex()).collect();

        let account = parse_account(2, &members).unwrap();
        assert_eq!(account.description(), "2-of-3");
        assert_eq!(account.member_index(&keys[1].public_key()), Some(1));

        assert!(parse_account(4, &members).is_err());
        assert!(parse_account(1, &["zz".to_string()]).is_err());
    }

    #[test]
    fn test_single_sign_without_node() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("sender.json");
        cmd_keys_new(None, &key_path).unwrap();
        let key = load_key(&key_path).unwrap();

        let mut config = Config::default();
        config.flow.data_dir = dir.path().join("data");
        let files = TxFiles::new(&config.flow.data_dir).unwrap();

        let params = crate::core::SuggestedParams {
            fee: 0,
            min_fee: 1000,
            flat_fee: false,
            first_valid: 1,
            last_valid: 100,
            genesis_id: "testnet-v1".to_string(),
            genesis_hash: [0u8; 32],
        };
        let txn = crate::core::TransactionBuilder::payment(params)
            .sender(key.address())
            .receiver(Address::new([2u8; 32]))
            .amount(3)
            .build()
            .unwrap();
        files.save_unsigned(&txn).unwrap();

        cmd_single_sign(&config, &key_path).unwrap();
        let stx = files.load_signed().unwrap();
        assert_eq!(stx.txn, txn);
        assert!(stx.verify_single().is_ok());
    }

    #[test]
    fn test_keys_new_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alice.json");

        cmd_keys_new(Some("alice"), &path).unwrap();
        assert!(cmd_keys_new(None, &path).is_err());
        assert!(cmd_keys_show(&path).is_ok());
    }
}
