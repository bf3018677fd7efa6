//! Order requests and fill results.
//!
//! [`OrderRequest`] is what a collaborator submits. [`FillResult`] reports what the
//! matching engine did with it: rested it, filled it, or both. One [`Fill`] is produced
//! per execution against a resting order, each with its own trade log entry.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CurrencyId, OrderId, OwnerId, Pair, Side, TradeLogId};

/// A limit order as submitted. `price` is quote per base unit; `amount` is in base units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub owner: OwnerId,
    pub side: Side,
    pub base: CurrencyId,
    pub quote: CurrencyId,
    pub price: Decimal,
    pub amount: Decimal,
}

impl OrderRequest {
    pub fn pair(&self) -> Pair {
        Pair::new(self.base, self.quote)
    }
}

/// One execution against a resting order, at the resting order's price.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub resting_order_id: OrderId,
    pub counterparty: OwnerId,
    pub price: Decimal,
    pub quantity: Decimal,
    /// Resting order reached zero and is now CLOSED.
    pub resting_fully_filled: bool,
    pub trade_log_id: TradeLogId,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum FillResult {
    /// Nothing crossed; the whole order rests on the book.
    Listed { order_id: OrderId },
    /// Fully executed; no resting order was created.
    Filled { fills: Vec<Fill> },
    /// Executed in part; the remainder rests as `listed`.
    PartiallyFilled { fills: Vec<Fill>, listed: OrderId },
}

impl FillResult {
    pub fn fills(&self) -> &[Fill] {
        match self {
            FillResult::Listed { .. } => &[],
            FillResult::Filled { fills } | FillResult::PartiallyFilled { fills, .. } => fills,
        }
    }

    /// Id of the resting order created for the unfilled remainder, if any.
    pub fn listed(&self) -> Option<OrderId> {
        match self {
            FillResult::Listed { order_id } => Some(*order_id),
            FillResult::PartiallyFilled { listed, .. } => Some(*listed),
            FillResult::Filled { .. } => None,
        }
    }

    /// Total base quantity executed.
    pub fn filled_quantity(&self) -> Decimal {
        self.fills().iter().map(|f| f.quantity).sum()
    }
}
