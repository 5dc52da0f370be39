use crate::domain::ports::{GatewayResponse, PaymentGateway, PaymentOutcome, PaymentSdk};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// Provider error code reported by scripted SDK failures.
pub const SANDBOX_ERROR_CODE: i32 = -1;

/// Scripted behavior for one order driven through the sandbox provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptedOutcome {
    /// Gateway approves and the SDK completes the payment.
    Success,
    /// Gateway approves, the user abandons the session.
    Cancel,
    /// Gateway approves, the provider reports an error.
    Error,
    /// Gateway answers with a non-success return code.
    Declined,
    /// Gateway cannot be reached at all.
    Unreachable,
}

/// In-process stand-in for the payment gateway and the on-device SDK.
///
/// One scripted outcome is consumed per order: the gateway leg pops the
/// script and keeps the outcome for the SDK leg, issuing sequential
/// tokens. `Clone` shares the underlying state, so the same provider can
/// be handed to the coordinator as both ports while the caller keeps a
/// handle for inspection.
#[derive(Clone)]
pub struct SandboxProvider {
    state: Arc<SandboxState>,
}

struct SandboxState {
    script: Mutex<VecDeque<ScriptedOutcome>>,
    /// Outcome reserved by an approved gateway call, waiting for the
    /// SDK leg of the same order.
    pending: Mutex<Option<(ScriptedOutcome, u64)>>,
    next_session: AtomicU64,
    created_orders: AtomicU64,
    created_amounts: Mutex<Vec<String>>,
    paid_tokens: Mutex<Vec<String>>,
}

impl SandboxProvider {
    pub fn new(script: impl IntoIterator<Item = ScriptedOutcome>) -> Self {
        Self {
            state: Arc::new(SandboxState {
                script: Mutex::new(script.into_iter().collect()),
                pending: Mutex::new(None),
                next_session: AtomicU64::new(1),
                created_orders: AtomicU64::new(0),
                created_amounts: Mutex::new(Vec::new()),
                paid_tokens: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Number of create-order calls the gateway leg has seen.
    pub fn created_orders(&self) -> u64 {
        self.state.created_orders.load(Ordering::Relaxed)
    }

    /// Wire amounts received by the gateway leg, in call order.
    pub async fn created_amounts(&self) -> Vec<String> {
        self.state.created_amounts.lock().await.clone()
    }

    /// Tokens the SDK leg was asked to pay, in call order.
    pub async fn paid_tokens(&self) -> Vec<String> {
        self.state.paid_tokens.lock().await.clone()
    }
}

#[async_trait]
impl PaymentGateway for SandboxProvider {
    async fn create_order(&self, wire_amount: &str) -> Result<GatewayResponse> {
        self.state.created_orders.fetch_add(1, Ordering::Relaxed);
        self.state
            .created_amounts
            .lock()
            .await
            .push(wire_amount.to_string());

        // The real gateway only accepts a plain decimal string.
        if wire_amount.parse::<Decimal>().is_err() {
            return Err(PaymentError::GatewayUnavailable(format!(
                "malformed amount '{wire_amount}'"
            )));
        }

        let outcome = self
            .state
            .script
            .lock()
            .await
            .pop_front()
            .ok_or_else(|| PaymentError::GatewayUnavailable("sandbox script exhausted".into()))?;

        match outcome {
            ScriptedOutcome::Unreachable => Err(PaymentError::GatewayUnavailable(
                "sandbox gateway unreachable".into(),
            )),
            ScriptedOutcome::Declined => Ok(GatewayResponse::declined("0")),
            pending => {
                let session = self.state.next_session.fetch_add(1, Ordering::Relaxed);
                *self.state.pending.lock().await = Some((pending, session));
                Ok(GatewayResponse::approved(format!("zp-tok-{session}")))
            }
        }
    }
}

#[async_trait]
impl PaymentSdk for SandboxProvider {
    async fn pay_order(&self, trans_token: &str, _callback_url: &str) -> Result<PaymentOutcome> {
        self.state
            .paid_tokens
            .lock()
            .await
            .push(trans_token.to_string());

        let (outcome, session) = self
            .state
            .pending
            .lock()
            .await
            .take()
            .ok_or_else(|| PaymentError::ValidationError("no pending payment session".into()))?;

        let provider_order_id = format!("ord-{session}");
        Ok(match outcome {
            ScriptedOutcome::Success => PaymentOutcome::Succeeded {
                provider_order_id,
                provider_trans_id: format!("trans-{session}"),
            },
            ScriptedOutcome::Cancel => PaymentOutcome::Canceled { provider_order_id },
            ScriptedOutcome::Error => PaymentOutcome::Error {
                code: SANDBOX_ERROR_CODE,
                provider_order_id,
            },
            // Declined and Unreachable never reach the SDK leg.
            ScriptedOutcome::Declined | ScriptedOutcome::Unreachable => {
                return Err(PaymentError::ValidationError(
                    "no pending payment session".into(),
                ));
            }
        })
    }
}
