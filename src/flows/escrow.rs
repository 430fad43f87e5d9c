//! Logic escrow payment flow
//!
//! Compile the script, derive the escrow address, then pay out of it with a
//! transaction authorized by the program and its arguments.

use crate::config::FlowConfig;
use crate::core::{Address, TransactionBuilder};
use crate::error::Result;
use crate::flows::{submit_and_wait, suggested_params, Confirmation};
use crate::logic::{assemble, CompiledProgram, LogicSig};
use crate::node::NodeClient;
use log::info;
use tokio_util::sync::CancellationToken;

/// Where to compile script source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompileMode {
    /// Built-in assembler
    #[default]
    Local,
    /// The node's compile endpoint
    Remote,
}

/// Compile script source locally or on the node
pub async fn compile_source<N: NodeClient + ?Sized>(
    node: &N,
    source: &str,
    mode: CompileMode,
) -> Result<CompiledProgram> {
    let compiled = match mode {
        CompileMode::Local => assemble(source)?,
        CompileMode::Remote => node.compile(source).await?,
    };
    info!(
        "📜 Compiled {} bytes ({:?}), escrow address {}",
        compiled.program.len(),
        mode,
        compiled.hash
    );
    Ok(compiled)
}

/// Payment details for an escrow payout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscrowPayment {
    pub receiver: Address,
    pub amount: u64,
    pub note: Option<Vec<u8>>,
    /// Close the escrow and send its remaining balance here
    pub close_remainder_to: Option<Address>,
}

impl EscrowPayment {
    pub fn new(receiver: Address, amount: u64) -> Self {
        Self {
            receiver,
            amount,
            note: None,
            close_remainder_to: None,
        }
    }
}

/// Pay from the account a logic signature controls
///
/// For a plain escrow that is the program's address; for a delegated logic
/// signature it is the delegating account.
pub async fn escrow_pay<N: NodeClient + ?Sized>(
    node: &N,
    config: &FlowConfig,
    lsig: &LogicSig,
    payment: &EscrowPayment,
    cancel: CancellationToken,
) -> Result<Confirmation> {
    config.validate()?;
    lsig.verify()?;

    let sender = lsig.authorizer()?;
    let params = suggested_params(node, config).await?;

    let mut builder = TransactionBuilder::payment(params)
        .sender(sender)
        .receiver(payment.receiver)
        .amount(payment.amount);
    if let Some(note) = &payment.note {
        builder = builder.note(note.clone());
    }
    if let Some(close_to) = payment.close_remainder_to {
        builder = builder.close_remainder_to(close_to);
    }
    let txn = builder.build()?;

    let stx = lsig.authorize(&txn)?;
    info!(
        "🔐 Paying {} from {} to {} with logic signature",
        payment.amount, sender, payment.receiver
    );
    submit_and_wait(node, config, &stx, cancel).await
}
