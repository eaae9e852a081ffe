//! State machine driving one bridged action from quote to finalized
//! transaction.
//!
//! ```text
//! Idle -> Building -> [Quoting -> Building] -> Ready -> Signing -> Bridging
//!      -> Confirming -> Success | Error
//! ```
//!
//! Every failure moves the machine to `Error` with its cause. Calling
//! [`BridgeOrchestrator::run`] again from `Error` retries from `Building`,
//! reusing the cached quote if it is still valid. A transaction that was
//! submitted but never reached a final outcome is polled again instead of
//! being rebuilt, so a retry cannot bridge twice. [`BridgeOrchestrator::reset`]
//! returns to `Idle` and drops the cached quote, transaction skeleton and
//! in-flight signature.

use std::fmt;
use std::time::{Duration, Instant};

use alloy::{
    primitives::{Address, U256},
    sol_types::SolCall,
};
use sha2::{Digest, Sha256};
use solana_sdk::{
    instruction::Instruction, pubkey::Pubkey, signature::Signature, transaction::Transaction,
};
use thiserror::Error;
use twin_bridge_quote::{Quote, Quoter};
use twin_bridge_relayer_lib::utils::{poll_until, PollError};
use twin_bridge_solidity_types::twin::ITwin;
use uuid::Uuid;

use crate::{
    chain::{SourceChain, TxOutcome},
    config::{ActionConfig, OrchestratorConfig, ProgramIds},
    instruction::{self, BridgeCall, BridgeSolParams, CALL_TYPE_CALL},
    signer::WalletSigner,
};

/// Errors that end an attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrchestratorError {
    /// The wallet has no public key.
    #[error("no wallet connected")]
    NoWalletConnected,

    /// The player account the action needs does not exist yet.
    #[error("action `{action}` requires one-time setup for {owner}")]
    SetupRequired {
        /// Action name.
        action: String,
        /// Wallet whose player account is missing.
        owner: Pubkey,
    },

    /// The wallet cannot cover the bridged amount and fees.
    #[error("insufficient balance: {required} lamports required, {available} available")]
    InsufficientBalance {
        /// Lamports needed.
        required: u64,
        /// Lamports held.
        available: u64,
    },

    /// No usable quote for the action price.
    #[error("quote failed: {reason}")]
    QuoteFailed {
        /// Why quoting failed.
        reason: String,
        /// Whether quoting again may succeed.
        retryable: bool,
    },

    /// The quoted input exceeds `u64` lamports.
    #[error("quoted input {0} does not fit in lamports")]
    AmountOverflow(U256),

    /// The instruction or transaction could not be assembled.
    #[error("failed to build transaction: {0}")]
    Build(String),

    /// The wallet refused or failed to sign.
    #[error("signing failed: {0}")]
    SigningFailed(String),

    /// The RPC node rejected the transaction.
    #[error("submission rejected: {0}")]
    SubmissionRejected(String),

    /// The transaction landed with an error.
    #[error("transaction {signature} failed: {reason}")]
    TransactionFailed {
        /// The failed transaction.
        signature: Signature,
        /// Error reported by the chain.
        reason: String,
    },

    /// Finality was not observed in time. The transaction may still land.
    #[error("transaction {signature} not finalized within {timeout:?}")]
    ConfirmationTimeout {
        /// The pending transaction.
        signature: Signature,
        /// The configured confirmation timeout.
        timeout: Duration,
    },

    /// A source chain read failed.
    #[error("source chain error: {0}")]
    SourceChain(String),

    /// A result arrived for an attempt that was reset or superseded.
    #[error("result belongs to a previous attempt")]
    StaleAttempt,
}

/// State of a bridged action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeTransactionState {
    /// No attempt running.
    Idle,
    /// Checking preconditions.
    Building,
    /// Waiting for a quote.
    Quoting,
    /// Instruction assembled, not yet signed.
    Ready,
    /// Waiting for the wallet signature.
    Signing,
    /// Submitting to the source chain.
    Bridging,
    /// Waiting for finality.
    Confirming,
    /// The transaction finalized.
    Success {
        /// The finalized transaction.
        signature: Signature,
    },
    /// The attempt failed.
    Error {
        /// Why it failed.
        error: OrchestratorError,
    },
}

/// [`BridgeTransactionState`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum StateKind {
    Idle,
    Building,
    Quoting,
    Ready,
    Signing,
    Bridging,
    Confirming,
    Success,
    Error,
}

impl BridgeTransactionState {
    /// The state without its payload.
    #[must_use]
    pub const fn kind(&self) -> StateKind {
        match self {
            Self::Idle => StateKind::Idle,
            Self::Building => StateKind::Building,
            Self::Quoting => StateKind::Quoting,
            Self::Ready => StateKind::Ready,
            Self::Signing => StateKind::Signing,
            Self::Bridging => StateKind::Bridging,
            Self::Confirming => StateKind::Confirming,
            Self::Success { .. } => StateKind::Success,
            Self::Error { .. } => StateKind::Error,
        }
    }

    /// Whether the state ends an attempt.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Success { .. } | Self::Error { .. })
    }
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Identifies the attempt a quote was requested for.
///
/// Results carrying a ticket from another instance, or from before the last
/// [`BridgeOrchestrator::reset`], are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptTicket {
    instance: Uuid,
    generation: u64,
}

#[derive(Debug, Clone)]
struct CachedQuote {
    quote: Quote,
    fetched_at: Instant,
}

/// The assembled, unsigned source-chain transaction of an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionSkeleton {
    /// The `bridge_sol` instruction.
    pub instruction: Instruction,
    /// Account the bridge program writes the outgoing message to.
    pub outgoing_message: Pubkey,
    /// Lamports bridged to Base.
    pub amount: u64,
    /// Bridged amount plus the bridge fee.
    pub required_lamports: u64,
}

/// Drives one bridged action. Each instance owns its state and quote cache.
pub struct BridgeOrchestrator<S, Q, W> {
    id: Uuid,
    generation: u64,
    attempt: u64,
    action: ActionConfig,
    config: OrchestratorConfig,
    programs: ProgramIds,
    chain: S,
    quoter: Q,
    wallet: Option<W>,
    state: BridgeTransactionState,
    transitions: Vec<StateKind>,
    cached_quote: Option<CachedQuote>,
    skeleton: Option<TransactionSkeleton>,
    /// Submitted transaction without a final outcome yet.
    in_flight: Option<Signature>,
}

impl<S, Q, W> BridgeOrchestrator<S, Q, W>
where
    S: SourceChain,
    Q: Quoter,
    W: WalletSigner,
{
    /// Create a new [`BridgeOrchestrator`] instance in `Idle`.
    pub fn new(
        action: ActionConfig,
        config: OrchestratorConfig,
        programs: ProgramIds,
        chain: S,
        quoter: Q,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            generation: 0,
            attempt: 0,
            action,
            config,
            programs,
            chain,
            quoter,
            wallet: None,
            state: BridgeTransactionState::Idle,
            transitions: vec![StateKind::Idle],
            cached_quote: None,
            skeleton: None,
            in_flight: None,
        }
    }

    /// Binds the source-chain account that signs and pays.
    #[must_use]
    pub fn with_wallet(mut self, wallet: W) -> Self {
        self.wallet = Some(wallet);
        self
    }

    /// Unbinds the source-chain account.
    pub fn disconnect_wallet(&mut self) -> Option<W> {
        self.wallet.take()
    }

    /// Identity of this instance.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &BridgeTransactionState {
        &self.state
    }

    /// States visited since creation or the last reset, in order.
    #[must_use]
    pub fn transitions(&self) -> &[StateKind] {
        &self.transitions
    }

    /// The cached quote, if any.
    #[must_use]
    pub fn cached_quote(&self) -> Option<&Quote> {
        self.cached_quote.as_ref().map(|c| &c.quote)
    }

    /// Signature of a submitted transaction whose outcome is still unknown.
    /// The next [`Self::run`] polls it instead of submitting a new one.
    #[must_use]
    pub const fn in_flight(&self) -> Option<&Signature> {
        self.in_flight.as_ref()
    }

    /// The transaction built by the last attempt, if any.
    #[must_use]
    pub const fn skeleton(&self) -> Option<&TransactionSkeleton> {
        self.skeleton.as_ref()
    }

    /// The action this instance drives.
    #[must_use]
    pub const fn action(&self) -> &ActionConfig {
        &self.action
    }

    /// Ticket for a quote requested now.
    #[must_use]
    pub const fn ticket(&self) -> AttemptTicket {
        AttemptTicket {
            instance: self.id,
            generation: self.generation,
        }
    }

    /// Caches `quote` if `ticket` belongs to the current attempt of this
    /// instance.
    ///
    /// # Errors
    /// [`OrchestratorError::StaleAttempt`] if the ticket is stale. The quote is
    /// dropped.
    pub fn apply_quote(
        &mut self,
        ticket: AttemptTicket,
        quote: Quote,
    ) -> Result<(), OrchestratorError> {
        if ticket != self.ticket() {
            tracing::debug!(
                instance = %self.id,
                ticket_instance = %ticket.instance,
                ticket_generation = ticket.generation,
                generation = self.generation,
                "discarding stale quote"
            );
            return Err(OrchestratorError::StaleAttempt);
        }

        self.cached_quote = Some(CachedQuote {
            quote,
            fetched_at: Instant::now(),
        });
        Ok(())
    }

    /// Returns to `Idle`, dropping the cached quote and transaction skeleton.
    /// Results of requests made before the reset are discarded.
    ///
    /// An in-flight transaction is forgotten, and may still finalize.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.cached_quote = None;
        self.skeleton = None;
        if let Some(signature) = self.in_flight.take() {
            tracing::warn!(%signature, "reset with a transaction still in flight");
        }
        self.state = BridgeTransactionState::Idle;
        self.transitions = vec![StateKind::Idle];
        tracing::info!(
            instance = %self.id,
            action = %self.action.name,
            generation = self.generation,
            "orchestrator reset"
        );
    }

    /// Runs an attempt from `Idle`, or retries from `Error`.
    ///
    /// Returns the state the attempt ended in. Calling this in any other
    /// state is a no-op.
    #[tracing::instrument(skip_all, fields(instance = %self.id, action = %self.action.name))]
    pub async fn run(&mut self) -> &BridgeTransactionState {
        match self.state.kind() {
            StateKind::Idle => {}
            StateKind::Error => {
                tracing::info!(
                    cached_quote = self.cached_quote.is_some(),
                    in_flight = ?self.in_flight,
                    "retrying"
                );
            }
            kind => {
                tracing::warn!(state = %kind, "run ignored");
                return &self.state;
            }
        }

        self.attempt += 1;
        if let Err(error) = self.drive().await {
            tracing::error!(%error, "bridged action failed");
            self.transition(BridgeTransactionState::Error { error });
        }
        &self.state
    }

    async fn drive(&mut self) -> Result<(), OrchestratorError> {
        self.transition(BridgeTransactionState::Building);

        if let Some(signature) = self.in_flight {
            tracing::info!(%signature, "polling the in-flight transaction again");
            return self.confirm(signature).await;
        }

        let owner = self
            .wallet
            .as_ref()
            .ok_or(OrchestratorError::NoWalletConnected)?
            .pubkey();

        if self.action.requires_setup {
            let player = instruction::player_pda(&self.programs.game_program, &owner);
            let exists = self
                .chain
                .account_exists(&player)
                .await
                .map_err(source_chain)?;
            if !exists {
                return Err(OrchestratorError::SetupRequired {
                    action: self.action.name.clone(),
                    owner,
                });
            }
        }

        let quote = if self.action.is_free() {
            None
        } else if let Some(cached) = self.valid_cached_quote() {
            tracing::info!(input = %cached.input_amount, "reusing cached quote");
            Some(cached.clone())
        } else {
            self.transition(BridgeTransactionState::Quoting);
            let ticket = self.ticket();
            let quote = self.quoter.quote(self.action.price, None).await;
            if !quote.is_usable() {
                return Err(quote_failed(&quote));
            }
            self.apply_quote(ticket, quote.clone())?;
            self.transition(BridgeTransactionState::Building);
            Some(quote)
        };

        let skeleton = self.build_skeleton(owner, quote.as_ref())?;
        self.skeleton = Some(skeleton.clone());
        self.transition(BridgeTransactionState::Ready);

        let available = self.chain.balance(&owner).await.map_err(source_chain)?;
        if available < skeleton.required_lamports {
            return Err(OrchestratorError::InsufficientBalance {
                required: skeleton.required_lamports,
                available,
            });
        }

        self.transition(BridgeTransactionState::Signing);
        let blockhash = self
            .chain
            .latest_blockhash()
            .await
            .map_err(source_chain)?;
        let mut tx = Transaction::new_with_payer(&[skeleton.instruction], Some(&owner));
        self.wallet
            .as_ref()
            .ok_or(OrchestratorError::NoWalletConnected)?
            .sign_transaction(&mut tx, blockhash)
            .map_err(|e| OrchestratorError::SigningFailed(format!("{e:#}")))?;

        let signature = self
            .chain
            .submit(&tx)
            .await
            .map_err(|e| OrchestratorError::SubmissionRejected(format!("{e:#}")))?;
        // The outgoing message now exists on chain; neither can be reused.
        self.cached_quote = None;
        self.skeleton = None;
        self.in_flight = Some(signature);
        tracing::info!(%signature, outgoing_message = %skeleton.outgoing_message, "submitted");
        self.transition(BridgeTransactionState::Bridging);

        self.confirm(signature).await
    }

    /// Polls `signature` until it reaches a final outcome or the confirmation
    /// timeout. Only a final outcome clears the in-flight signature.
    async fn confirm(&mut self, signature: Signature) -> Result<(), OrchestratorError> {
        self.transition(BridgeTransactionState::Confirming);
        let timeout = Duration::from_millis(self.config.confirmation_timeout_ms);
        let interval = Duration::from_millis(self.config.poll_interval_ms);
        let chain = &self.chain;
        let outcome = poll_until(timeout, interval, || chain.confirmation(&signature))
            .await
            .map_err(|e| match e {
                PollError::Timeout(timeout) => OrchestratorError::ConfirmationTimeout {
                    signature,
                    timeout,
                },
                PollError::Probe(e) => source_chain(e),
            })?;

        self.in_flight = None;
        match outcome {
            TxOutcome::Finalized => {
                self.transition(BridgeTransactionState::Success { signature });
                Ok(())
            }
            TxOutcome::Failed(reason) => {
                Err(OrchestratorError::TransactionFailed { signature, reason })
            }
        }
    }

    fn valid_cached_quote(&self) -> Option<&Quote> {
        let cached = self.cached_quote.as_ref()?;
        let ttl = Duration::from_millis(self.config.quote_ttl_ms);

        if cached.fetched_at.elapsed() >= ttl {
            tracing::debug!("cached quote expired");
            return None;
        }
        if cached.quote.target_price != self.action.price || !cached.quote.is_usable() {
            return None;
        }
        Some(&cached.quote)
    }

    fn build_skeleton(
        &self,
        owner: Pubkey,
        quote: Option<&Quote>,
    ) -> Result<TransactionSkeleton, OrchestratorError> {
        let (input, swap_target, swap_data) = quote.map_or_else(
            || (U256::ZERO, Address::ZERO, Vec::new()),
            |q| (q.input_amount, q.swap_target, q.swap_data.to_vec()),
        );
        let amount =
            u64::try_from(input).map_err(|_| OrchestratorError::AmountOverflow(input))?;
        let required_lamports = amount
            .checked_add(self.config.bridge_fee_lamports)
            .ok_or(OrchestratorError::AmountOverflow(input))?;

        let execute = ITwin::executeCall {
            actionId: self.action.action_id,
            actionData: self.action.action_data.clone(),
            swapTarget: swap_target,
            swapData: swap_data.into(),
        };

        let salt = self.salt();
        let instruction = instruction::bridge_sol(&BridgeSolParams {
            bridge_program: self.programs.bridge_program,
            gas_fee_receiver: self.programs.gas_fee_receiver,
            payer: owner,
            salt,
            to: self.config.twin_address,
            remote_token: self.config.remote_sol_token,
            amount,
            gas_limit: self.config.destination_gas_limit,
            call: Some(BridgeCall {
                ty: CALL_TYPE_CALL,
                to: self.config.twin_address.into_array(),
                value: 0,
                data: execute.abi_encode(),
            }),
        })
        .map_err(|e| OrchestratorError::Build(e.to_string()))?;

        Ok(TransactionSkeleton {
            instruction,
            outgoing_message: instruction::outgoing_message_pda(
                &self.programs.bridge_program,
                &salt,
            ),
            amount,
            required_lamports,
        })
    }

    /// Outgoing message seed, unique per instance, generation and attempt.
    fn salt(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.id.as_bytes());
        hasher.update(self.generation.to_le_bytes());
        hasher.update(self.attempt.to_le_bytes());
        hasher.finalize().into()
    }

    fn transition(&mut self, next: BridgeTransactionState) {
        tracing::info!(
            instance = %self.id,
            from = %self.state.kind(),
            to = %next.kind(),
            "state transition"
        );
        self.transitions.push(next.kind());
        self.state = next;
    }
}

fn source_chain(e: anyhow::Error) -> OrchestratorError {
    OrchestratorError::SourceChain(format!("{e:#}"))
}

fn quote_failed(quote: &Quote) -> OrchestratorError {
    quote.error.as_ref().map_or_else(
        || OrchestratorError::QuoteFailed {
            reason: "quote has no input or output amount".to_string(),
            retryable: true,
        },
        |e| OrchestratorError::QuoteFailed {
            reason: e.to_string(),
            retryable: e.is_retryable(),
        },
    )
}
