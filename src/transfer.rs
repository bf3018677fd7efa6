//! Transfer service: peer-to-peer movement of one currency, recorded as a transaction.
//!
//! A missing receiver account is opened on the fly inside the same store transaction,
//! so a failed transfer also discards the new account. [`swap`] pairs two opposite
//! transfers into one direct exchange between two owners.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::amount::validate_amount;
use crate::catalog;
use crate::error::{AccountRole, LedgerError};
use crate::store::{LedgerState, Txn};
use crate::types::{
    AccountNumber, CurrencyId, CurrencyLookup, OwnerId, Page, Pair, TradeLogId, Transaction,
    TransactionId,
};

/// Decimal places kept on the implied price of a swap.
pub const SWAP_PRICE_DP: u32 = 8;

/// Both legs of a direct exchange and the implied price it logged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Swap {
    /// Base currency, sender to receiver.
    pub base_leg: Transaction,
    /// Quote currency, receiver to sender.
    pub quote_leg: Transaction,
    /// `quote_amount / base_amount`.
    pub price: Decimal,
    pub trade_log_id: TradeLogId,
}

pub fn transfer(
    txn: &mut Txn<'_>,
    sender: OwnerId,
    receiver: OwnerId,
    currency: CurrencyId,
    amount: Decimal,
    at: DateTime<Utc>,
) -> Result<Transaction, LedgerError> {
    let amount = validate_amount(amount)?;
    catalog::active(txn, currency)?;
    let from = txn
        .account_for(sender, currency)
        .map(|a| a.id)
        .ok_or(LedgerError::AccountMissing(AccountRole::Sender))?;
    let to = txn.get_or_create_account(receiver, currency);
    if from == to {
        return Err(LedgerError::SameAccount);
    }
    if txn.account(to).is_some_and(|a| a.disabled) {
        return Err(LedgerError::AccountDisabled(to));
    }
    txn.debit(from, amount)?;
    txn.credit(to, amount)?;
    Ok(txn.append_transaction(from, to, amount, at))
}

/// Transfer addressed by account number (`XCN-42`): the ticker picks the currency and
/// the number picks the receiving owner.
pub fn transfer_to_account_number(
    txn: &mut Txn<'_>,
    sender: OwnerId,
    receiver: &AccountNumber,
    amount: Decimal,
    at: DateTime<Utc>,
) -> Result<Transaction, LedgerError> {
    let currency = catalog::find(txn, &CurrencyLookup::Ticker(receiver.ticker.clone()))?;
    transfer(txn, sender, receiver.owner, currency.id, amount, at)
}

/// Direct exchange outside the book: `sender` gives `base_amount` of the base currency
/// and `receiver` gives `quote_amount` of the quote currency, both or neither. Each leg
/// follows the transfer rules, so the receiver must already hold a quote account
/// (`AccountMissing(Sender)` on the quote leg otherwise). The implied price goes to the
/// trade log like any execution.
pub fn swap(
    txn: &mut Txn<'_>,
    pair: Pair,
    sender: OwnerId,
    receiver: OwnerId,
    base_amount: Decimal,
    quote_amount: Decimal,
    at: DateTime<Utc>,
) -> Result<Swap, LedgerError> {
    let base_amount = validate_amount(base_amount)?;
    let quote_amount = validate_amount(quote_amount)?;
    if pair.base == pair.quote {
        return Err(LedgerError::IdenticalPair);
    }
    let base_leg = transfer(txn, sender, receiver, pair.base, base_amount, at)?;
    let quote_leg = transfer(txn, receiver, sender, pair.quote, quote_amount, at)?;
    let price = quote_amount
        .checked_div(base_amount)
        .ok_or(LedgerError::InvalidAmount(base_amount))?
        .round_dp(SWAP_PRICE_DP);
    let trade_log_id = txn.append_trade(pair, price, at);
    Ok(Swap {
        base_leg,
        quote_leg,
        price,
        trade_log_id,
    })
}

/// Transactions touching any of the owner's accounts, oldest first unless `recent_first`.
pub fn history(
    state: &LedgerState,
    owner: OwnerId,
    recent_first: bool,
    page: usize,
    limit: usize,
) -> Page<Transaction> {
    let owns = |id| state.account(id).is_some_and(|a| a.owner == owner);
    let mut all: Vec<Transaction> = state
        .transactions()
        .iter()
        .filter(|t| owns(t.sender_account_id) || owns(t.receiver_account_id))
        .cloned()
        .collect();
    if recent_first {
        all.reverse();
    }
    Page::paginate(all, page, limit)
}

pub fn find(state: &LedgerState, id: TransactionId) -> Result<Transaction, LedgerError> {
    state
        .transaction(id)
        .cloned()
        .ok_or(LedgerError::TransactionNotFound(id))
}
