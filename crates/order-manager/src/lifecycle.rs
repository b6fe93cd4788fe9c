//! Order Lifecycle
//!
//! Owns every order the gateway ever admitted, keyed by id. Status changes go
//! through [`OrderLifecycle::transition`], which refuses anything that is not
//! an edge of the state machine.

use crate::error::{Rejection, Result};
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};
use tollgate_core::{Order, OrderId, OrderStatus};

pub struct OrderLifecycle {
    orders: DashMap<OrderId, Order>,
    next_sequence: AtomicU64,
}

impl OrderLifecycle {
    pub fn new() -> Self {
        Self {
            orders: DashMap::new(),
            next_sequence: AtomicU64::new(1),
        }
    }

    /// Record a pending order as accepted, returning the stored copy
    ///
    /// The id is re-minted if it is already taken, so an id is never reused.
    pub fn admit(&self, mut order: Order) -> Order {
        debug_assert!(order.status.can_transition_to(OrderStatus::Accepted));
        order.status = OrderStatus::Accepted;
        order.sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        loop {
            match self.orders.entry(order.id) {
                Entry::Vacant(slot) => {
                    slot.insert(order.clone());
                    return order;
                }
                Entry::Occupied(_) => order.id = OrderId::new(),
            }
        }
    }

    /// Move an order to `to`, returning the updated copy
    pub fn transition(&self, order_id: &OrderId, to: OrderStatus) -> Result<Order> {
        let mut order = self
            .orders
            .get_mut(order_id)
            .ok_or_else(|| Rejection::OrderNotFound(order_id.to_string()))?;

        if !order.status.can_transition_to(to) {
            return Err(Rejection::InvalidTransition {
                order_id: *order_id,
                from: order.status,
                to,
            });
        }

        debug!("[ORDER] {} {} -> {}", order_id, order.status, to);
        order.status = to;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    /// Point a replaced order at its successor
    pub fn link_replacement(&self, replaced: &OrderId, replacement: OrderId) {
        if let Some(mut order) = self.orders.get_mut(replaced) {
            order.replaced_by = Some(replacement);
        }
    }

    pub fn get(&self, order_id: &OrderId) -> Option<Order> {
        self.orders.get(order_id).map(|o| o.clone())
    }

    /// Orders that may still be cancelled or replaced, oldest first
    pub fn open_orders(&self) -> Vec<Order> {
        self.collect(|o| o.is_active())
    }

    /// Accepted orders booked on a symbol, in acceptance order
    ///
    /// Only stable while the caller holds that symbol's lock.
    pub fn standing_on(&self, symbol: &str) -> Vec<Order> {
        self.collect(|o| o.status == OrderStatus::Accepted && o.symbol() == symbol)
    }

    /// All orders of one strategy, oldest first
    pub fn orders_for_strategy(&self, strategy_id: &str) -> Vec<Order> {
        self.collect(|o| o.strategy_id() == strategy_id)
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    fn collect(&self, keep: impl Fn(&Order) -> bool) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        orders.sort_by_key(|o| o.sequence);
        orders
    }
}

impl Default for OrderLifecycle {
    fn default() -> Self {
        Self::new()
    }
}
