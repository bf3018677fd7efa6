//! Per-pair order book: open orders indexed by side and price, price-time priority.
//!
//! The book holds ids only; amounts and status live in the ledger state. Each price
//! level is keyed by [`OrderId`], and ids are allocated monotonically, so iterating a
//! level yields the oldest order first. Best bid is the highest price, best ask the lowest.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{Order, OrderId, OwnerId, Pair, Side};

/// Orders at one price, oldest first.
type Level = BTreeMap<OrderId, OwnerId>;
/// Price -> level.
type Levels = BTreeMap<Decimal, Level>;

/// A resting order selected as the counterparty of an incoming order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    pub order_id: OrderId,
    pub owner: OwnerId,
    pub price: Decimal,
}

/// Aggregated view of one price level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelSummary {
    pub price: Decimal,
    pub orders: usize,
}

#[derive(Clone, Debug, Default)]
pub struct OrderBook {
    bids: Levels,
    asks: Levels,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an open order at its price level. Re-inserting an id is a no-op.
    pub fn insert(&mut self, order: &Order) {
        self.side_mut(order.side)
            .entry(order.price)
            .or_default()
            .insert(order.id, order.owner);
    }

    /// Removes an order from its level. Returns true if it was on the book.
    pub fn remove(&mut self, side: Side, price: Decimal, order_id: OrderId) -> bool {
        let levels = self.side_mut(side);
        let Some(level) = levels.get_mut(&price) else {
            return false;
        };
        let removed = level.remove(&order_id).is_some();
        if level.is_empty() {
            levels.remove(&price);
        }
        removed
    }

    /// Best resting counter-order for an incoming order on `incoming` side with the
    /// given limit. A buy crosses asks priced at or below the limit (lowest first); a
    /// sell crosses bids at or above it (highest first). Within a level the oldest order
    /// wins. Orders for which `eligible` is false are skipped (self-match, frozen owners).
    pub fn best_counter(
        &self,
        incoming: Side,
        limit: Decimal,
        mut eligible: impl FnMut(OrderId, OwnerId) -> bool,
    ) -> Option<Candidate> {
        let mut pick = |price: &Decimal, level: &Level| {
            level
                .iter()
                .find(|(id, owner)| eligible(**id, **owner))
                .map(|(id, owner)| Candidate {
                    order_id: *id,
                    owner: *owner,
                    price: *price,
                })
        };
        match incoming {
            Side::Buy => self
                .asks
                .range(..=limit)
                .find_map(|(price, level)| pick(price, level)),
            Side::Sell => self
                .bids
                .range(limit..)
                .rev()
                .find_map(|(price, level)| pick(price, level)),
        }
    }

    /// Best bid price (None if empty).
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.keys().next_back().copied()
    }

    /// Best ask price (None if empty).
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.keys().next().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Number of resting orders on both sides.
    pub fn len(&self) -> usize {
        self.bids.values().chain(self.asks.values()).map(Level::len).sum()
    }

    /// Ids on one side in priority order (best price first, then oldest).
    pub fn priority_order(&self, side: Side) -> Vec<OrderId> {
        match side {
            Side::Buy => self
                .bids
                .values()
                .rev()
                .flat_map(|level| level.keys().copied())
                .collect(),
            Side::Sell => self
                .asks
                .values()
                .flat_map(|level| level.keys().copied())
                .collect(),
        }
    }

    /// Price levels on one side, best first.
    pub fn depth(&self, side: Side) -> Vec<LevelSummary> {
        let summary = |(price, level): (&Decimal, &Level)| LevelSummary {
            price: *price,
            orders: level.len(),
        };
        match side {
            Side::Buy => self.bids.iter().rev().map(summary).collect(),
            Side::Sell => self.asks.iter().map(summary).collect(),
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut Levels {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }
}

/// Builds books for every pair from a set of orders; terminal orders are ignored.
pub fn build_books<'a>(
    orders: impl IntoIterator<Item = &'a Order>,
) -> std::collections::HashMap<Pair, OrderBook> {
    let mut books: std::collections::HashMap<Pair, OrderBook> = std::collections::HashMap::new();
    for order in orders.into_iter().filter(|o| o.is_open()) {
        books.entry(order.pair).or_default().insert(order);
    }
    books
}
