//! Account manager: lazy account creation, freezing, balance and ownership queries.

use rust_decimal::Decimal;

use crate::catalog;
use crate::error::LedgerError;
use crate::store::{LedgerState, Txn};
use crate::types::{Account, AccountId, AccountNumber, CurrencyId, CurrencyLookup, OwnerId};

/// Idempotent: returns the owner's existing account or opens one with balance 0.
pub fn get_or_create(
    txn: &mut Txn<'_>,
    owner: OwnerId,
    currency: CurrencyId,
) -> Result<Account, LedgerError> {
    catalog::find(txn, &CurrencyLookup::Id(currency))?;
    let id = txn.get_or_create_account(owner, currency);
    txn.account(id).cloned().ok_or(LedgerError::AccountNotFound(id))
}

pub fn set_disabled(txn: &mut Txn<'_>, account: AccountId, disabled: bool) -> Result<(), LedgerError> {
    txn.set_account_disabled(account, disabled)
}

/// True iff `account` is the genesis account of its currency.
pub fn is_central(state: &LedgerState, account: AccountId) -> Result<bool, LedgerError> {
    let account = state
        .account(account)
        .ok_or(LedgerError::AccountNotFound(account))?;
    let currency = catalog::find(state, &CurrencyLookup::Id(account.currency_id))?;
    Ok(currency.genesis_account_id == account.id)
}

/// Balance of `owner` in the looked-up currency; zero if the owner has no account yet.
pub fn view_balance(
    state: &LedgerState,
    owner: OwnerId,
    currency: &CurrencyLookup,
) -> Result<Decimal, LedgerError> {
    let currency = catalog::find(state, currency)?;
    Ok(state.balance(owner, currency.id))
}

/// Resolves `XCN-42` to owner 42's XCN account.
pub fn resolve(state: &LedgerState, number: &AccountNumber) -> Result<Account, LedgerError> {
    let currency = catalog::find(state, &CurrencyLookup::Ticker(number.ticker.clone()))?;
    state
        .account_for(number.owner, currency.id)
        .cloned()
        .ok_or_else(|| LedgerError::InvalidAccountNumber(number.to_string()))
}

/// Account number of an existing account.
pub fn account_number(state: &LedgerState, account: AccountId) -> Result<AccountNumber, LedgerError> {
    let account = state
        .account(account)
        .ok_or(LedgerError::AccountNotFound(account))?;
    let currency = catalog::find(state, &CurrencyLookup::Id(account.currency_id))?;
    Ok(AccountNumber {
        ticker: currency.ticker,
        owner: account.owner,
    })
}

/// Every account the owner holds, by account id.
pub fn list(state: &LedgerState, owner: OwnerId) -> Vec<Account> {
    state.accounts_of(owner).cloned().collect()
}
