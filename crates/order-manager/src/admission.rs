//! Admission Control
//!
//! Decides whether a strategy's signal becomes an order. Every decision runs
//! with the kill switch held shared and the affected symbol locked, so the
//! check and the position update are one atomic step. All fallible steps come
//! before the first mutation: a rejection leaves no trace in the store.
//!
//! Lock order is always kill switch, then symbols (lexical), then strategy.

use crate::error::{Rejection, Result};
use crate::journal::{InMemoryJournal, Journal, JournalEntry, JournalEvent};
use crate::lifecycle::OrderLifecycle;
use crate::risk::{RiskSnapshot, RiskValidator};
use crate::validator::SignalValidator;
use chrono::Utc;
use log::{info, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tollgate_core::{KillSwitchState, Order, OrderId, OrderStatus, Position, Signal};
use tollgate_risk_manager::{AdmissionGate, RiskLimits, RiskStateStore};
use uuid::Uuid;

/// Admission controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionConfig {
    pub limits: RiskLimits,
    /// Upper bound on any lock wait before failing closed
    pub lock_timeout_ms: u64,
    /// How far ahead of server time a signal may be stamped
    pub max_clock_skew_ms: i64,
    /// Entries kept by the in-memory journal
    pub journal_capacity: usize,
    /// Cancel every open order when the kill switch is first activated
    pub cancel_open_orders_on_kill_switch: bool,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            limits: RiskLimits::default(),
            lock_timeout_ms: 250,
            max_clock_skew_ms: 5_000,
            journal_capacity: 10_000,
            cancel_open_orders_on_kill_switch: false,
        }
    }
}

impl AdmissionConfig {
    /// Builder: Set risk limits
    pub fn with_limits(mut self, limits: RiskLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Builder: Set lock timeout
    pub fn with_lock_timeout_ms(mut self, ms: u64) -> Self {
        self.lock_timeout_ms = ms;
        self
    }

    /// Builder: Cancel open orders on kill switch activation
    pub fn with_cancel_on_kill_switch(mut self, enabled: bool) -> Self {
        self.cancel_open_orders_on_kill_switch = enabled;
        self
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

/// Accept / reject / cancel / replace against the risk state
pub struct AdmissionController {
    store: Arc<RiskStateStore>,
    lifecycle: OrderLifecycle,
    validator: SignalValidator,
    limits: RiskLimits,
    journal: Arc<dyn Journal>,
    cancel_on_kill_switch: bool,
}

impl AdmissionController {
    pub fn new(config: AdmissionConfig) -> Self {
        let journal = Arc::new(InMemoryJournal::new(config.journal_capacity));
        Self::with_journal(config, journal)
    }

    pub fn with_journal(config: AdmissionConfig, journal: Arc<dyn Journal>) -> Self {
        let store = Arc::new(RiskStateStore::new(config.lock_timeout()));
        Self::with_store(config, store, journal)
    }

    /// Build on a caller-owned store
    ///
    /// The store's own lock timeout applies; `config.lock_timeout_ms` is not
    /// consulted. The controller never hands the store back out.
    pub fn with_store(
        config: AdmissionConfig,
        store: Arc<RiskStateStore>,
        journal: Arc<dyn Journal>,
    ) -> Self {
        Self {
            store,
            lifecycle: OrderLifecycle::new(),
            validator: SignalValidator::new(chrono::Duration::milliseconds(
                config.max_clock_skew_ms,
            )),
            limits: config.limits,
            journal,
            cancel_on_kill_switch: config.cancel_open_orders_on_kill_switch,
        }
    }

    pub fn journal(&self) -> &Arc<dyn Journal> {
        &self.journal
    }

    // ========================================================================
    // Submit
    // ========================================================================

    /// Admit a signal, returning the new order's id
    pub async fn submit(&self, signal: Signal) -> Result<OrderId> {
        let correlation_id = Uuid::new_v4().to_string();
        self.journal.record(
            JournalEntry::new(JournalEvent::SignalReceived, &correlation_id)
                .with_route(&signal.strategy_id, &signal.symbol)
                .with_detail(format!("{} {}", signal.side, signal.target_quantity)),
        );

        let result = self.admit(&signal, &correlation_id).await;
        if let Err(rejection) = &result {
            self.record_rejection(&signal, &correlation_id, rejection);
        }
        result.map(|order| order.id)
    }

    async fn admit(&self, signal: &Signal, correlation_id: &str) -> Result<Order> {
        let gate = self.store.admission_gate().await?;
        Self::ensure_open(&gate)?;
        self.validator.validate(signal, Utc::now())?;

        let mut position = self.store.lock_symbol(&signal.symbol).await?;
        let mut exposure = self.store.lock_strategy(&signal.strategy_id).await?;

        let price = booking_price(signal, &position);
        let notional = notional(signal, price);
        let snapshot = RiskSnapshot {
            base_quantity: position.quantity,
            base_exposure: *exposure,
            notional,
        };
        RiskValidator::check(signal, &snapshot, &self.limits)
            .map_err(Rejection::RiskLimitExceeded)?;

        // Commit: nothing below can fail
        let order = self
            .lifecycle
            .admit(Order::new_with_time(signal.clone(), price, notional, Utc::now()));
        position.apply_delta(order.position_delta(), price);
        *exposure += notional;

        info!(
            "[ADMISSION] Accepted {} {} {} {} -> order {} (position {})",
            signal.strategy_id,
            signal.side,
            signal.target_quantity,
            signal.symbol,
            order.id,
            position.quantity
        );
        self.journal.record(
            JournalEntry::new(JournalEvent::OrderAccepted, correlation_id)
                .with_order(order.id)
                .with_route(&signal.strategy_id, &signal.symbol)
                .with_detail(format!("position {}", position.quantity)),
        );

        drop(gate);
        Ok(order)
    }

    // ========================================================================
    // Cancel
    // ========================================================================

    /// Cancel an open order, reversing its position delta
    ///
    /// Allowed while the kill switch is active. An order owned by another
    /// strategy is reported as not found.
    pub async fn cancel(&self, strategy_id: &str, order_id: &OrderId) -> Result<Order> {
        let correlation_id = Uuid::new_v4().to_string();
        let result = self
            .try_cancel(strategy_id, order_id, &correlation_id, "")
            .await;
        if let Err(rejection) = &result {
            info!(
                "[ADMISSION] Cancel of {} by {} rejected: {}",
                order_id, strategy_id, rejection
            );
        }
        result
    }

    async fn try_cancel(
        &self,
        strategy_id: &str,
        order_id: &OrderId,
        correlation_id: &str,
        detail: &str,
    ) -> Result<Order> {
        let order = self.owned_order(strategy_id, order_id)?;

        let mut position = self.store.lock_symbol(order.symbol()).await?;
        let mut exposure = self.store.lock_strategy(strategy_id).await?;

        // Status is re-checked under the lock; this is the only fallible mutation
        let cancelled = self.lifecycle.transition(order_id, OrderStatus::Cancelled)?;
        self.restore_cost_basis(&mut position);
        *exposure -= cancelled.notional;

        info!(
            "[ADMISSION] Cancelled order {} ({} {}), position {} now {}",
            order_id,
            cancelled.signal.side,
            cancelled.signal.target_quantity,
            cancelled.symbol(),
            position.quantity
        );
        self.journal.record(
            JournalEntry::new(JournalEvent::OrderCancelled, correlation_id)
                .with_order(*order_id)
                .with_route(strategy_id, cancelled.symbol())
                .with_detail(detail),
        );

        Ok(cancelled)
    }

    /// Cancel every open order (administrative)
    ///
    /// Each order is cancelled under its own symbol and strategy locks, as
    /// `cancel` would. Orders finished concurrently are skipped; an order
    /// whose locks time out stays open and is logged. Returns what was
    /// cancelled.
    pub async fn cancel_all(&self, reason: &str, initiated_by: &str) -> Vec<Order> {
        let correlation_id = Uuid::new_v4().to_string();
        let detail = format!("cancel all: {} by {}", reason, initiated_by);
        let open = self.lifecycle.open_orders();
        warn!(
            "[ADMISSION] Cancelling {} open orders ({} by {})",
            open.len(),
            reason,
            initiated_by
        );

        let mut cancelled = Vec::with_capacity(open.len());
        for order in open {
            match self
                .try_cancel(order.strategy_id(), &order.id, &correlation_id, &detail)
                .await
            {
                Ok(order) => cancelled.push(order),
                Err(Rejection::InvalidTransition { .. }) => {}
                Err(rejection) => warn!(
                    "[ADMISSION] Order {} left open by cancel all: {}",
                    order.id, rejection
                ),
            }
        }

        info!(
            "[ADMISSION] Cancel all finished: {} cancelled",
            cancelled.len()
        );
        cancelled
    }

    // ========================================================================
    // Replace
    // ========================================================================

    /// Cancel an order and admit its successor as one atomic step
    ///
    /// Limits are checked against the state with the original delta already
    /// reversed. On rejection the original order is left untouched.
    pub async fn replace(&self, order_id: &OrderId, new_signal: Signal) -> Result<Order> {
        let correlation_id = Uuid::new_v4().to_string();
        self.journal.record(
            JournalEntry::new(JournalEvent::SignalReceived, &correlation_id)
                .with_order(*order_id)
                .with_route(&new_signal.strategy_id, &new_signal.symbol)
                .with_detail(format!(
                    "replace: {} {}",
                    new_signal.side, new_signal.target_quantity
                )),
        );

        let result = self.try_replace(order_id, &new_signal, &correlation_id).await;
        if let Err(rejection) = &result {
            self.record_rejection(&new_signal, &correlation_id, rejection);
        }
        result
    }

    async fn try_replace(
        &self,
        order_id: &OrderId,
        signal: &Signal,
        correlation_id: &str,
    ) -> Result<Order> {
        let gate = self.store.admission_gate().await?;
        Self::ensure_open(&gate)?;
        self.validator.validate(signal, Utc::now())?;
        let original = self.owned_order(&signal.strategy_id, order_id)?;

        let (mut old_position, mut new_position) = self
            .store
            .lock_pair(original.symbol(), &signal.symbol)
            .await?;
        let mut exposure = self.store.lock_strategy(&signal.strategy_id).await?;

        // Re-read under the lock: a cancel may have won the race
        let original = self.owned_order(&signal.strategy_id, order_id)?;
        if !original.status.can_transition_to(OrderStatus::Replaced) {
            return Err(Rejection::InvalidTransition {
                order_id: *order_id,
                from: original.status,
                to: OrderStatus::Replaced,
            });
        }

        let reversal = -original.position_delta();
        let (base_quantity, target) = match new_position.as_deref() {
            Some(target) => (target.quantity, target),
            None => (old_position.quantity + reversal, &*old_position),
        };
        let price = booking_price(signal, target);
        let notional = notional(signal, price);
        let base_exposure = *exposure - original.notional;
        let snapshot = RiskSnapshot {
            base_quantity,
            base_exposure,
            notional,
        };
        RiskValidator::check(signal, &snapshot, &self.limits)
            .map_err(Rejection::RiskLimitExceeded)?;

        // Commit: only the first transition can fail, and it mutates nothing on failure
        self.lifecycle.transition(order_id, OrderStatus::Replaced)?;
        let mut successor = Order::new_with_time(signal.clone(), price, notional, Utc::now());
        successor.replaces = Some(*order_id);
        let successor = self.lifecycle.admit(successor);
        self.lifecycle.link_replacement(order_id, successor.id);

        // The successor is already standing, so a same-symbol rebuild books it
        self.restore_cost_basis(&mut old_position);
        if let Some(target) = new_position.as_deref_mut() {
            target.apply_delta(successor.position_delta(), price);
        }
        *exposure = base_exposure + notional;

        info!(
            "[ADMISSION] Replaced order {} with {} ({} {} {})",
            order_id, successor.id, signal.side, signal.target_quantity, signal.symbol
        );
        self.journal.record(
            JournalEntry::new(JournalEvent::OrderReplaced, correlation_id)
                .with_order(*order_id)
                .with_order(successor.id)
                .with_route(&signal.strategy_id, &signal.symbol),
        );

        drop(gate);
        Ok(successor)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub async fn position(&self, symbol: &str) -> Result<Position> {
        Ok(self.store.position(symbol).await?)
    }

    pub async fn all_positions(&self) -> Result<Vec<Position>> {
        Ok(self.store.all_positions().await?)
    }

    /// Mark a symbol to a new price, refreshing unrealized P&L
    pub async fn mark_price(&self, symbol: &str, price: Decimal) -> Result<Position> {
        Ok(self.store.mark_price(symbol, price).await?)
    }

    pub fn order(&self, order_id: &OrderId) -> Option<Order> {
        self.lifecycle.get(order_id)
    }

    pub fn open_orders(&self) -> Vec<Order> {
        self.lifecycle.open_orders()
    }

    pub fn orders_for_strategy(&self, strategy_id: &str) -> Vec<Order> {
        self.lifecycle.orders_for_strategy(strategy_id)
    }

    pub async fn strategy_exposure(&self, strategy_id: &str) -> Result<Decimal> {
        Ok(self.store.strategy_exposure(strategy_id).await?)
    }

    // ========================================================================
    // Kill switch
    // ========================================================================

    pub async fn kill_switch(&self) -> Result<KillSwitchState> {
        Ok(self.store.kill_switch().await?)
    }

    /// Reject every admission from now on until cleared
    ///
    /// Only the activation that takes effect is journaled. With
    /// `cancel_open_orders_on_kill_switch` set, it also cancels every open order.
    pub async fn activate_kill_switch(&self, reason: &str, initiated_by: &str) -> KillSwitchState {
        let (state, activated) = self.store.activate_kill_switch(reason, initiated_by).await;
        if !activated {
            return state;
        }

        self.journal.record(
            JournalEntry::new(JournalEvent::KillSwitchActivated, Uuid::new_v4().to_string())
                .with_detail(format!("{} by {}", reason, initiated_by)),
        );
        if self.cancel_on_kill_switch {
            self.cancel_all(reason, initiated_by).await;
        }
        state
    }

    /// Administrative only; not reachable over RPC
    pub async fn clear_kill_switch(&self, cleared_by: &str) -> KillSwitchState {
        let previous = self.store.clear_kill_switch(cleared_by).await;
        self.journal.record(
            JournalEntry::new(JournalEvent::KillSwitchCleared, Uuid::new_v4().to_string())
                .with_detail(format!("cleared by {}", cleared_by)),
        );
        previous
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn ensure_open(gate: &AdmissionGate<'_>) -> Result<()> {
        if gate.is_active() {
            return Err(Rejection::KillSwitchActive {
                reason: gate.reason.clone().unwrap_or_default(),
            });
        }
        Ok(())
    }

    /// Rebuild a symbol's position from the orders still standing on it
    ///
    /// Caller holds the symbol lock. Withdrawing an order restores the cost
    /// basis and realized P&L it would have had without that order.
    fn restore_cost_basis(&self, position: &mut Position) {
        let standing = self.lifecycle.standing_on(&position.symbol);
        position.rebuild(
            standing
                .iter()
                .map(|order| (order.position_delta(), order.applied_price)),
        );
    }

    fn owned_order(&self, strategy_id: &str, order_id: &OrderId) -> Result<Order> {
        self.lifecycle
            .get(order_id)
            .filter(|order| order.strategy_id() == strategy_id)
            .ok_or_else(|| Rejection::OrderNotFound(order_id.to_string()))
    }

    fn record_rejection(&self, signal: &Signal, correlation_id: &str, rejection: &Rejection) {
        if rejection.is_retryable() {
            warn!(
                "[ADMISSION] {} {} {} {} not decided: {}",
                signal.strategy_id, signal.side, signal.target_quantity, signal.symbol, rejection
            );
        } else {
            info!(
                "[ADMISSION] Rejected {} {} {} {}: {}",
                signal.strategy_id, signal.side, signal.target_quantity, signal.symbol, rejection
            );
        }
        self.journal.record(
            JournalEntry::new(JournalEvent::SignalRejected, correlation_id)
                .with_route(&signal.strategy_id, &signal.symbol)
                .with_detail(rejection.to_string()),
        );
    }
}

/// Price a signal books at: its own reference price, else the symbol's mark
fn booking_price(signal: &Signal, position: &Position) -> Option<Decimal> {
    signal.reference_price.or(position.mark_price)
}

/// Exposure charged for a signal; unpriced signals count one unit per share
fn notional(signal: &Signal, price: Option<Decimal>) -> Decimal {
    signal.target_quantity * price.unwrap_or(Decimal::ONE)
}
