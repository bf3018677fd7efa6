//! Price-time priority matching with ledger settlement.
//!
//! [`submit`] runs one limit order against its pair's book inside the caller's store
//! transaction: funds check, fills at resting prices, balance settlement, trade log
//! appends, and listing of any remainder. A failure at any step aborts the whole
//! transaction.
//!
//! Funds of a resting order are held by the book: listing debits the quote notional
//! (BUY) or base amount (SELL) up front, and a fill or cancel releases exactly the
//! portion it consumes. Execution notionals are exact products, never rounded.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::amount::{notional, validate_amount};
use crate::catalog;
use crate::error::LedgerError;
use crate::execution::{Fill, FillResult, OrderRequest};
use crate::store::{LedgerState, Txn};
use crate::types::{Order, OrderId, OrderStatus, OwnerId, Page, Pair, Side};

/// Selection for [`list_orders`]. `None` fields match everything.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderFilter {
    pub owner: Option<OwnerId>,
    pub pair: Option<Pair>,
    pub side: Option<Side>,
    pub status: Option<OrderStatus>,
}

pub fn submit(txn: &mut Txn<'_>, req: &OrderRequest, at: DateTime<Utc>) -> Result<FillResult, LedgerError> {
    let price = validate_amount(req.price)?;
    let amount = validate_amount(req.amount)?;
    if req.base == req.quote {
        return Err(LedgerError::IdenticalPair);
    }
    catalog::active(txn, req.base)?;
    catalog::active(txn, req.quote)?;
    let pair = req.pair();

    let base_acc = txn.get_or_create_account(req.owner, req.base);
    let quote_acc = txn.get_or_create_account(req.owner, req.quote);
    for id in [base_acc, quote_acc] {
        if txn.account(id).is_some_and(|a| a.disabled) {
            return Err(LedgerError::AccountDisabled(id));
        }
    }

    let (funding, required) = match req.side {
        Side::Buy => (quote_acc, notional(price, amount)?),
        Side::Sell => (base_acc, amount),
    };
    let available = txn.account(funding).map_or(Decimal::ZERO, |a| a.balance);
    if available < required {
        return Err(LedgerError::InsufficientFunds { required, available });
    }

    let mut remaining = amount;
    let mut fills = Vec::new();
    while remaining > Decimal::ZERO {
        let state: &LedgerState = &**txn;
        let candidate = state.book(pair).and_then(|book| {
            book.best_counter(req.side, price, |_, owner| {
                owner != req.owner && !frozen(state, owner, pair)
            })
        });
        let Some(candidate) = candidate else {
            break;
        };
        let resting = txn
            .order(candidate.order_id)
            .cloned()
            .ok_or(LedgerError::OrderNotFound(candidate.order_id))?;
        let quantity = remaining.min(resting.amount);
        let value = notional(candidate.price, quantity)?;

        match req.side {
            Side::Buy => {
                // Seller's base is already held by the book.
                txn.debit(quote_acc, value)?;
                txn.credit(base_acc, quantity)?;
                let seller_quote = txn.get_or_create_account(resting.owner, pair.quote);
                txn.credit(seller_quote, value)?;
            }
            Side::Sell => {
                // Buyer's quote is already held by the book.
                txn.debit(base_acc, quantity)?;
                txn.credit(quote_acc, value)?;
                let buyer_base = txn.get_or_create_account(resting.owner, pair.base);
                txn.credit(buyer_base, quantity)?;
            }
        }

        let resting_fully_filled = txn.fill_order(resting.id, quantity, at)?;
        let trade_log_id = txn.append_trade(pair, candidate.price, at);
        fills.push(Fill {
            resting_order_id: resting.id,
            counterparty: resting.owner,
            price: candidate.price,
            quantity,
            resting_fully_filled,
            trade_log_id,
        });
        remaining -= quantity;
    }

    if remaining.is_zero() {
        return Ok(FillResult::Filled { fills });
    }
    let (escrow_acc, escrow) = match req.side {
        Side::Buy => (quote_acc, notional(price, remaining)?),
        Side::Sell => (base_acc, remaining),
    };
    txn.debit(escrow_acc, escrow)?;
    let listed = txn.insert_order(req.owner, req.side, pair, price, remaining, at);
    if fills.is_empty() {
        Ok(FillResult::Listed { order_id: listed })
    } else {
        Ok(FillResult::PartiallyFilled { fills, listed })
    }
}

/// Cancels an open order and refunds what the book still holds for it.
pub fn cancel(
    txn: &mut Txn<'_>,
    owner: OwnerId,
    order_id: OrderId,
    at: DateTime<Utc>,
) -> Result<Order, LedgerError> {
    let order = txn
        .order(order_id)
        .cloned()
        .ok_or(LedgerError::OrderNotFound(order_id))?;
    if order.owner != owner {
        return Err(LedgerError::NotOrderOwner(order_id));
    }
    let (currency, held) = order.held();
    let canceled = txn.cancel_order(order_id, at)?;
    let account = txn.get_or_create_account(owner, currency);
    txn.credit(account, held)?;
    Ok(canceled)
}

/// Orders matching `filter`. With a side, best price first then oldest; otherwise by id.
pub fn list_orders(state: &LedgerState, filter: &OrderFilter, page: usize, limit: usize) -> Page<Order> {
    let mut all: Vec<Order> = state
        .orders()
        .filter(|o| filter.owner.map_or(true, |owner| o.owner == owner))
        .filter(|o| filter.pair.map_or(true, |pair| o.pair == pair))
        .filter(|o| filter.side.map_or(true, |side| o.side == side))
        .filter(|o| filter.status.map_or(true, |status| o.status == status))
        .cloned()
        .collect();
    match filter.side {
        Some(Side::Buy) => all.sort_by(|a, b| b.price.cmp(&a.price).then(a.id.cmp(&b.id))),
        Some(Side::Sell) => all.sort_by(|a, b| a.price.cmp(&b.price).then(a.id.cmp(&b.id))),
        None => {}
    }
    Page::paginate(all, page, limit)
}

/// An owner with a disabled account on either leg of the pair cannot trade it.
fn frozen(state: &LedgerState, owner: OwnerId, pair: Pair) -> bool {
    [pair.base, pair.quote]
        .into_iter()
        .any(|c| state.account_for(owner, c).is_some_and(|a| a.disabled))
}
