use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Net holding and P&L for one symbol
///
/// Quantity is signed: positive = long, negative = short, zero = flat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    /// Current position quantity (positive=long, negative=short)
    pub quantity: Decimal,
    /// Average entry price of the open quantity
    pub avg_price: Decimal,
    /// P&L of the open quantity at `mark_price`
    pub unrealized_pnl: Decimal,
    /// P&L booked by reductions
    pub realized_pnl: Decimal,
    /// Last mark, if any
    #[serde(default)]
    pub mark_price: Option<Decimal>,
    pub updated_at: DateTime<Utc>,
}

impl Position {
    /// A position that has never traded
    pub fn flat(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            quantity: Decimal::ZERO,
            avg_price: Decimal::ZERO,
            unrealized_pnl: Decimal::ZERO,
            realized_pnl: Decimal::ZERO,
            mark_price: None,
            updated_at: Utc::now(),
        }
    }

    /// Apply a signed quantity change, returning the P&L it realized
    ///
    /// Average price rules:
    /// - opening from flat: avg = price
    /// - adding to the existing side: weighted average
    /// - reducing without flipping: avg unchanged, P&L realized
    /// - flipping sides: avg = price of the new side
    /// - going flat: avg = 0
    /// - no price: quantity only
    pub fn apply_delta(&mut self, delta: Decimal, price: Option<Decimal>) -> Decimal {
        if delta.is_zero() {
            return Decimal::ZERO;
        }

        let old_qty = self.quantity;
        let new_qty = old_qty + delta;
        let mut realized = Decimal::ZERO;

        if let Some(price) = price {
            let reducing = (old_qty > Decimal::ZERO && delta < Decimal::ZERO)
                || (old_qty < Decimal::ZERO && delta > Decimal::ZERO);

            if reducing {
                let close_qty = delta.abs().min(old_qty.abs());
                realized = if old_qty > Decimal::ZERO {
                    close_qty * (price - self.avg_price)
                } else {
                    close_qty * (self.avg_price - price)
                };
            }

            if new_qty.is_zero() {
                self.avg_price = Decimal::ZERO;
            } else if old_qty.is_zero() {
                self.avg_price = price;
            } else if (old_qty > Decimal::ZERO) != (new_qty > Decimal::ZERO) {
                // Flipped sides; the new side's cost basis is this price
                self.avg_price = price;
            } else if !reducing {
                self.avg_price =
                    (old_qty.abs() * self.avg_price + delta.abs() * price) / new_qty.abs();
            }
        } else if new_qty.is_zero() {
            self.avg_price = Decimal::ZERO;
        }

        self.quantity = new_qty;
        self.realized_pnl += realized;
        self.refresh_unrealized();
        self.updated_at = Utc::now();

        realized
    }

    /// Recompute quantity, cost basis and realized P&L from standing bookings
    ///
    /// `bookings` are `(delta, price)` pairs in acceptance order. The mark is
    /// kept. Withdrawing a booking is not a trade, so it realizes nothing.
    pub fn rebuild(&mut self, bookings: impl IntoIterator<Item = (Decimal, Option<Decimal>)>) {
        self.quantity = Decimal::ZERO;
        self.avg_price = Decimal::ZERO;
        self.realized_pnl = Decimal::ZERO;
        for (delta, price) in bookings {
            self.apply_delta(delta, price);
        }
        self.refresh_unrealized();
        self.updated_at = Utc::now();
    }

    /// Update mark price and recalculate unrealized P&L
    pub fn mark(&mut self, price: Decimal) {
        self.mark_price = Some(price);
        self.refresh_unrealized();
        self.updated_at = Utc::now();
    }

    fn refresh_unrealized(&mut self) {
        self.unrealized_pnl = match self.mark_price {
            Some(mark) if !self.quantity.is_zero() => self.quantity * (mark - self.avg_price),
            _ => Decimal::ZERO,
        };
    }

    /// Total P&L (realized + unrealized)
    pub fn total_pnl(&self) -> Decimal {
        self.realized_pnl + self.unrealized_pnl
    }

    pub fn is_flat(&self) -> bool {
        self.quantity.is_zero()
    }
}
