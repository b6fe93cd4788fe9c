//! Risk & State Store
//!
//! Single source of truth for positions, strategy exposure and the kill
//! switch. Positions live in an arena of per-symbol records; each record has
//! its own mutex so different symbols never contend while a check-then-apply
//! on one symbol is serialized end to end.

use crate::error::{Result, StoreError};
use chrono::Utc;
use dashmap::DashMap;
use log::{debug, error, info, warn};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock, RwLockReadGuard};
use tollgate_core::{KillSwitchState, Position};

/// Exclusive hold on one symbol's position
pub type SymbolGuard = OwnedMutexGuard<Position>;

/// Exclusive hold on one strategy's gross notional
pub type StrategyGuard = OwnedMutexGuard<Decimal>;

/// Shared hold on the kill switch, kept for the length of an admission
pub type AdmissionGate<'a> = RwLockReadGuard<'a, KillSwitchState>;

pub struct RiskStateStore {
    /// Position per symbol
    positions: DashMap<String, Arc<Mutex<Position>>>,
    /// Gross notional per strategy
    exposure: DashMap<String, Arc<Mutex<Decimal>>>,
    kill_switch: RwLock<KillSwitchState>,
    /// Upper bound on every lock wait
    lock_timeout: Duration,
}

impl RiskStateStore {
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            positions: DashMap::new(),
            exposure: DashMap::new(),
            kill_switch: RwLock::new(KillSwitchState::inactive()),
            lock_timeout,
        }
    }

    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    fn unavailable(&self, resource: String) -> StoreError {
        warn!(
            "[RISK] {} not acquired within {}ms, failing closed",
            resource,
            self.lock_timeout.as_millis()
        );
        StoreError::Unavailable {
            resource,
            waited_ms: self.lock_timeout.as_millis() as u64,
        }
    }

    /// Record for a symbol, created flat on first use
    fn record(&self, symbol: &str) -> Arc<Mutex<Position>> {
        self.positions
            .entry(symbol.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Position::flat(symbol))))
            .value()
            .clone()
    }

    // ========================================================================
    // Positions
    // ========================================================================

    /// Take the exclusive lock on a symbol's position
    ///
    /// Hold the guard across the whole check-then-apply so no other caller
    /// can decide against the same pre-update position.
    pub async fn lock_symbol(&self, symbol: &str) -> Result<SymbolGuard> {
        let record = self.record(symbol);
        tokio::time::timeout(self.lock_timeout, record.lock_owned())
            .await
            .map_err(|_| self.unavailable(format!("position {}", symbol)))
    }

    /// Lock two symbols in lexical order, returning the guards in argument order
    ///
    /// The second guard is `None` when both names are the same symbol.
    pub async fn lock_pair(
        &self,
        first: &str,
        second: &str,
    ) -> Result<(SymbolGuard, Option<SymbolGuard>)> {
        if first == second {
            return Ok((self.lock_symbol(first).await?, None));
        }
        if first < second {
            let a = self.lock_symbol(first).await?;
            let b = self.lock_symbol(second).await?;
            Ok((a, Some(b)))
        } else {
            let b = self.lock_symbol(second).await?;
            let a = self.lock_symbol(first).await?;
            Ok((a, Some(b)))
        }
    }

    /// Current position for a symbol (flat if it never traded)
    pub async fn position(&self, symbol: &str) -> Result<Position> {
        let record = match self.positions.get(symbol) {
            Some(entry) => entry.value().clone(),
            None => return Ok(Position::flat(symbol)),
        };
        let guard = tokio::time::timeout(self.lock_timeout, record.lock())
            .await
            .map_err(|_| self.unavailable(format!("position {}", symbol)))?;
        Ok(guard.clone())
    }

    /// All positions, sorted by symbol
    pub async fn all_positions(&self) -> Result<Vec<Position>> {
        let mut records: Vec<(String, Arc<Mutex<Position>>)> = self
            .positions
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        records.sort_by(|a, b| a.0.cmp(&b.0));

        let mut positions = Vec::with_capacity(records.len());
        for (symbol, record) in records {
            let guard = tokio::time::timeout(self.lock_timeout, record.lock())
                .await
                .map_err(|_| self.unavailable(format!("position {}", symbol)))?;
            positions.push(guard.clone());
        }
        Ok(positions)
    }

    /// Mark a symbol to a new price, refreshing unrealized P&L
    pub async fn mark_price(&self, symbol: &str, price: Decimal) -> Result<Position> {
        let mut guard = self.lock_symbol(symbol).await?;
        guard.mark(price);
        debug!("[RISK] {} marked at {}", symbol, price);
        Ok(guard.clone())
    }

    // ========================================================================
    // Strategy exposure
    // ========================================================================

    fn exposure_record(&self, strategy_id: &str) -> Arc<Mutex<Decimal>> {
        self.exposure
            .entry(strategy_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Decimal::ZERO)))
            .value()
            .clone()
    }

    /// Take the exclusive lock on a strategy's gross notional
    ///
    /// Always taken after the symbol locks, never before, so the two lock
    /// families cannot deadlock.
    pub async fn lock_strategy(&self, strategy_id: &str) -> Result<StrategyGuard> {
        let record = self.exposure_record(strategy_id);
        tokio::time::timeout(self.lock_timeout, record.lock_owned())
            .await
            .map_err(|_| self.unavailable(format!("exposure {}", strategy_id)))
    }

    /// Gross notional currently charged to a strategy
    pub async fn strategy_exposure(&self, strategy_id: &str) -> Result<Decimal> {
        let record = match self.exposure.get(strategy_id) {
            Some(entry) => entry.value().clone(),
            None => return Ok(Decimal::ZERO),
        };
        let guard = tokio::time::timeout(self.lock_timeout, record.lock())
            .await
            .map_err(|_| self.unavailable(format!("exposure {}", strategy_id)))?;
        Ok(*guard)
    }

    // ========================================================================
    // Kill switch
    // ========================================================================

    /// Shared hold on the kill switch for the length of one admission
    ///
    /// Activation needs the exclusive side, so it waits for admissions in
    /// flight and every admission started after it returns sees it active.
    pub async fn admission_gate(&self) -> Result<AdmissionGate<'_>> {
        tokio::time::timeout(self.lock_timeout, self.kill_switch.read())
            .await
            .map_err(|_| self.unavailable("kill switch".to_string()))
    }

    /// Current kill switch state
    pub async fn kill_switch(&self) -> Result<KillSwitchState> {
        Ok(self.admission_gate().await?.clone())
    }

    /// Block all future admissions
    ///
    /// Returns the resulting state and whether this call activated it. Repeat
    /// activations keep the original attribution and report `false`.
    pub async fn activate_kill_switch(
        &self,
        reason: &str,
        initiated_by: &str,
    ) -> (KillSwitchState, bool) {
        let mut state = self.kill_switch.write().await;
        if state.active {
            info!(
                "[KILL SWITCH] Already active ({}), ignoring request from {}",
                state.reason.as_deref().unwrap_or("no reason"),
                initiated_by
            );
            return (state.clone(), false);
        }

        *state = KillSwitchState::activated(reason, initiated_by, Utc::now());
        error!(
            "[KILL SWITCH] Activated by {}: {}",
            initiated_by, reason
        );
        (state.clone(), true)
    }

    /// Re-enable admissions (administrative only), returning the prior state
    pub async fn clear_kill_switch(&self, cleared_by: &str) -> KillSwitchState {
        let mut state = self.kill_switch.write().await;
        let previous = std::mem::take(&mut *state);
        if previous.active {
            info!("[KILL SWITCH] Cleared by {}", cleared_by);
        }
        previous
    }
}

impl Default for RiskStateStore {
    fn default() -> Self {
        Self::new(Duration::from_millis(250))
    }
}
