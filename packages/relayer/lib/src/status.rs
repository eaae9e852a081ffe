//! Delivery status of a message on Base.
//!
//! Three independent reads keyed by the outer hash:
//! `BridgeValidator.validMessages`, `Bridge.successes` and `Bridge.failures`.
//! Nothing is cached; every call is a fresh view of the chain.

use std::fmt;

use alloy::{
    primitives::{Address, B256},
    providers::RootProvider,
};
use async_trait::async_trait;
use thiserror::Error;
use twin_bridge_solidity_types::bridge::{
    Bridge::{self, BridgeInstance},
    BridgeValidator::{self, BridgeValidatorInstance},
};

/// The contract read that produced a status failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCall {
    /// `BridgeValidator.validMessages`
    ValidMessages,
    /// `Bridge.successes`
    Successes,
    /// `Bridge.failures`
    Failures,
}

impl fmt::Display for StatusCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidMessages => f.write_str("BridgeValidator.validMessages"),
            Self::Successes => f.write_str("Bridge.successes"),
            Self::Failures => f.write_str("Bridge.failures"),
        }
    }
}

/// Errors that can occur while checking message status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatusError {
    /// One of the reads failed; no partial status is returned.
    #[error("status lookup failed on `{call}`: {reason}")]
    StatusLookupFailed {
        /// The read that failed.
        call: StatusCall,
        /// Rendered error.
        reason: String,
    },
}

/// Raw status flags of a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct BridgeStatus {
    /// Attested by the validator set.
    pub validated: bool,
    /// Executed successfully.
    pub succeeded: bool,
    /// Last execution failed.
    pub failed: bool,
}

/// Where a message is in its delivery lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryPhase {
    /// Not attested yet. Must not be relayed.
    NotValidated,
    /// Attested, never executed.
    Pending,
    /// Attested, last execution failed. Can be retried.
    Failed,
    /// Executed successfully.
    Succeeded,
}

impl BridgeStatus {
    /// Classifies the flags. A message that failed and later succeeded on
    /// retry is reported as succeeded.
    #[must_use]
    pub const fn phase(&self) -> DeliveryPhase {
        if !self.validated {
            DeliveryPhase::NotValidated
        } else if self.succeeded {
            DeliveryPhase::Succeeded
        } else if self.failed {
            DeliveryPhase::Failed
        } else {
            DeliveryPhase::Pending
        }
    }

    /// Whether a relay of the message may be attempted.
    #[must_use]
    pub const fn is_relayable(&self) -> bool {
        self.validated && !self.succeeded
    }
}

/// Source of the three status flags.
#[async_trait]
pub trait StatusBackend: Send + Sync {
    /// `BridgeValidator.validMessages(outer_hash)`.
    async fn is_validated(&self, outer_hash: B256) -> anyhow::Result<bool>;
    /// `Bridge.successes(outer_hash)`.
    async fn is_succeeded(&self, outer_hash: B256) -> anyhow::Result<bool>;
    /// `Bridge.failures(outer_hash)`.
    async fn is_failed(&self, outer_hash: B256) -> anyhow::Result<bool>;
}

/// [`StatusBackend`] reading the Base contracts over JSON-RPC.
#[derive(Debug, Clone)]
pub struct EvmStatusBackend {
    validator: BridgeValidatorInstance<RootProvider>,
    bridge: BridgeInstance<RootProvider>,
}

impl EvmStatusBackend {
    /// Create a new [`EvmStatusBackend`] instance.
    #[must_use]
    pub fn new(provider: RootProvider, bridge: Address, validator: Address) -> Self {
        Self {
            validator: BridgeValidator::new(validator, provider.clone()),
            bridge: Bridge::new(bridge, provider),
        }
    }

    /// Address of the `Bridge` contract.
    #[must_use]
    pub const fn bridge_address(&self) -> &Address {
        self.bridge.address()
    }

    /// Address of the `BridgeValidator` contract.
    #[must_use]
    pub const fn validator_address(&self) -> &Address {
        self.validator.address()
    }
}

#[async_trait]
impl StatusBackend for EvmStatusBackend {
    async fn is_validated(&self, outer_hash: B256) -> anyhow::Result<bool> {
        Ok(self.validator.validMessages(outer_hash).call().await?)
    }

    async fn is_succeeded(&self, outer_hash: B256) -> anyhow::Result<bool> {
        Ok(self.bridge.successes(outer_hash).call().await?)
    }

    async fn is_failed(&self, outer_hash: B256) -> anyhow::Result<bool> {
        Ok(self.bridge.failures(outer_hash).call().await?)
    }
}

/// Aggregates the three status reads.
#[derive(Debug, Clone)]
pub struct BridgeStatusChecker<B> {
    backend: B,
}

impl<B: StatusBackend> BridgeStatusChecker<B> {
    /// Create a new [`BridgeStatusChecker`] instance.
    pub const fn new(backend: B) -> Self {
        Self { backend }
    }

    /// The backend the reads go through.
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Reads the status of the message keyed by `outer_hash`.
    ///
    /// # Errors
    /// Fails with [`StatusError::StatusLookupFailed`] if any of the three reads
    /// fails. No partial status is returned.
    #[tracing::instrument(skip_all, fields(%outer_hash))]
    pub async fn status(&self, outer_hash: B256) -> Result<BridgeStatus, StatusError> {
        let lookup = |call: StatusCall| {
            move |e: anyhow::Error| StatusError::StatusLookupFailed {
                call,
                reason: format!("{e:#}"),
            }
        };

        let (validated, succeeded, failed) = futures::try_join!(
            async {
                self.backend
                    .is_validated(outer_hash)
                    .await
                    .map_err(lookup(StatusCall::ValidMessages))
            },
            async {
                self.backend
                    .is_succeeded(outer_hash)
                    .await
                    .map_err(lookup(StatusCall::Successes))
            },
            async {
                self.backend
                    .is_failed(outer_hash)
                    .await
                    .map_err(lookup(StatusCall::Failures))
            },
        )?;

        if succeeded && failed {
            tracing::warn!("message is flagged both succeeded and failed, treating as succeeded");
        }

        let status = BridgeStatus {
            validated,
            succeeded,
            failed,
        };
        tracing::debug!(?status, phase = ?status.phase(), "fetched bridge status");

        Ok(status)
    }
}


#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::test_utils::MockStatusBackend;
    use super::*;
    use alloy::{primitives::Bytes, rpc::client::RpcClient, transports::mock::Asserter};
    use rstest::rstest;

    const HASH: B256 = B256::repeat_byte(0xab);

    #[tokio::test]
    async fn aggregates_flags() {
        let mut backend = MockStatusBackend::default();
        backend.validated.insert(HASH);
        backend.failed.insert(HASH);
        let checker = BridgeStatusChecker::new(backend);

        let status = checker.status(HASH).await.unwrap();
        assert_eq!(
            status,
            BridgeStatus {
                validated: true,
                succeeded: false,
                failed: true,
            }
        );
        assert_eq!(status.phase(), DeliveryPhase::Failed);
        assert!(status.is_relayable());
    }

    #[tokio::test]
    async fn unknown_hash_is_not_validated() {
        let checker = BridgeStatusChecker::new(MockStatusBackend::default());

        let status = checker.status(HASH).await.unwrap();
        assert_eq!(status, BridgeStatus::default());
        assert_eq!(status.phase(), DeliveryPhase::NotValidated);
        assert!(!status.is_relayable());
    }

    #[tokio::test]
    async fn reads_fresh_state_every_time() {
        let checker = BridgeStatusChecker::new(MockStatusBackend::default());

        checker.status(HASH).await.unwrap();
        checker.status(HASH).await.unwrap();
        assert_eq!(checker.backend.reads.load(Ordering::SeqCst), 6);
    }

    #[rstest]
    #[case(StatusCall::ValidMessages)]
    #[case(StatusCall::Successes)]
    #[case(StatusCall::Failures)]
    #[tokio::test]
    async fn any_failed_read_fails_the_lookup(#[case] broken: StatusCall) {
        let backend = MockStatusBackend {
            broken: Some(broken),
            ..Default::default()
        };
        let checker = BridgeStatusChecker::new(backend);

        let err = checker.status(HASH).await.unwrap_err();
        assert_eq!(
            err,
            StatusError::StatusLookupFailed {
                call: broken,
                reason: "node unavailable".to_string(),
            }
        );
    }

    fn mocked_backend() -> (EvmStatusBackend, Asserter) {
        let asserter = Asserter::new();
        let provider = RootProvider::new(RpcClient::mocked(asserter.clone()));
        let backend = EvmStatusBackend::new(
            provider,
            Address::repeat_byte(0x11),
            Address::repeat_byte(0x22),
        );
        (backend, asserter)
    }

    #[tokio::test]
    async fn evm_backend_decodes_contract_reads() {
        let (backend, asserter) = mocked_backend();
        assert_eq!(*backend.bridge_address(), Address::repeat_byte(0x11));
        assert_eq!(*backend.validator_address(), Address::repeat_byte(0x22));

        let word = Bytes::from(B256::with_last_byte(1).to_vec());
        for _ in 0..3 {
            asserter.push_success(&word);
        }

        let status = BridgeStatusChecker::new(backend).status(HASH).await.unwrap();
        assert_eq!(
            status,
            BridgeStatus {
                validated: true,
                succeeded: true,
                failed: true,
            }
        );
    }

    #[tokio::test]
    async fn evm_backend_reports_rpc_errors() {
        let (backend, asserter) = mocked_backend();
        for _ in 0..3 {
            asserter.push_failure_msg("header not found");
        }

        let err = BridgeStatusChecker::new(backend).status(HASH).await.unwrap_err();
        let StatusError::StatusLookupFailed { reason, .. } = err;
        assert!(reason.contains("header not found"), "{reason}");
    }

    #[rstest]
    #[case::not_validated(false, false, false, DeliveryPhase::NotValidated, false)]
    #[case::pending(true, false, false, DeliveryPhase::Pending, true)]
    #[case::failed(true, false, true, DeliveryPhase::Failed, true)]
    #[case::succeeded(true, true, false, DeliveryPhase::Succeeded, false)]
    #[case::retried(true, true, true, DeliveryPhase::Succeeded, false)]
    fn classifies_phase(
        #[case] validated: bool,
        #[case] succeeded: bool,
        #[case] failed: bool,
        #[case] phase: DeliveryPhase,
        #[case] relayable: bool,
    ) {
        let status = BridgeStatus {
            validated,
            succeeded,
            failed,
        };
        assert_eq!(status.phase(), phase);
        assert_eq!(status.is_relayable(), relayable);
    }
}
