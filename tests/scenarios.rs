//! End-to-end ledger and trading scenarios through the `Exchange` facade.

use ledger_exchange::{
    AccountRole, CurrencyId, CurrencyLookup, Exchange, FillResult, LedgerError, NewCurrency,
    OrderRequest, OrderStatus, OwnerId, Pair, SeriesOrder, Side,
};
use rust_decimal::Decimal;
use std::str::FromStr;

fn init_log() {
    let _ = env_logger::try_init();
}

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn create(ex: &Exchange, owner: u64, name: &str, ticker: &str, supply: &str) -> CurrencyId {
    ex.create_currency(&NewCurrency {
        owner: OwnerId(owner),
        name: name.into(),
        ticker: ticker.into(),
        initial_supply: d(supply),
    })
    .unwrap()
    .id
}

fn order(owner: u64, side: Side, pair: Pair, price: &str, amount: &str) -> OrderRequest {
    OrderRequest {
        owner: OwnerId(owner),
        side,
        base: pair.base,
        quote: pair.quote,
        price: d(price),
        amount: d(amount),
    }
}

fn balance(ex: &Exchange, owner: u64, currency: CurrencyId) -> Decimal {
    ex.view_balance(OwnerId(owner), &CurrencyLookup::Id(currency)).unwrap()
}

/// XCN/USD market: owner 1 holds 1,000 XCN, owner 2 holds 1,000 USD, owners 3 and 4
/// hold 1,000 of each.
fn xcn_usd() -> (Exchange, Pair) {
    let ex = Exchange::new();
    let xcn = create(&ex, 100, "Xcoin", "XCN", "1000000");
    let usd = create(&ex, 200, "Dollar", "USD", "1000000");
    for (owner, currencies) in [(1, vec![xcn]), (2, vec![usd]), (3, vec![xcn, usd]), (4, vec![xcn, usd])] {
        for c in currencies {
            let issuer = if c == xcn { 100 } else { 200 };
            ex.transfer(OwnerId(issuer), OwnerId(owner), c, d("1000")).unwrap();
        }
    }
    (ex, Pair::new(xcn, usd))
}

fn assert_conserved(ex: &Exchange, pair: Pair) {
    for c in [pair.base, pair.quote] {
        let report = ex.supply_report(c).unwrap();
        assert!(report.balanced, "supply not conserved: {report:?}");
    }
}

#[test]
fn xcn_usd_full_fill_scenario() {
    init_log();
    let (ex, pair) = xcn_usd();
    let listed = ex.submit(&order(1, Side::Sell, pair, "2.00", "100")).unwrap();
    let resting_id = listed.listed().unwrap();

    let result = ex.submit(&order(2, Side::Buy, pair, "2.00", "100")).unwrap();
    let FillResult::Filled { fills } = result else {
        panic!("expected a full fill");
    };
    assert_eq!(fills.len(), 1);
    assert_eq!(fills[0].counterparty, OwnerId(1));
    assert_eq!(fills[0].resting_order_id, resting_id);
    assert_eq!(fills[0].price, d("2.00"));
    assert!(fills[0].resting_fully_filled);

    assert_eq!(balance(&ex, 1, pair.quote), d("200.00"));
    assert_eq!(balance(&ex, 1, pair.base), d("900"));
    assert_eq!(balance(&ex, 2, pair.base), d("100"));
    assert_eq!(balance(&ex, 2, pair.quote), d("800.00"));
    assert_eq!(ex.order(resting_id).unwrap().status, OrderStatus::Closed);

    let series = ex.series(pair, None, SeriesOrder::Asc).unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].price, d("2.00"));
    assert_eq!(ex.last_price(pair).unwrap(), Some(d("2")));
    assert_conserved(&ex, pair);
}

#[test]
fn round_trip_create_and_transfer() {
    init_log();
    let ex = Exchange::new();
    let c = create(&ex, 1, "Round", "RND", "1000");
    assert_eq!(balance(&ex, 1, c), d("1000"));
    ex.transfer(OwnerId(1), OwnerId(2), c, d("300")).unwrap();
    assert_eq!(balance(&ex, 1, c), d("700"));
    assert_eq!(balance(&ex, 2, c), d("300"));
    let report = ex.supply_report(c).unwrap();
    assert_eq!(report.circulating, d("1000"));
    assert!(report.balanced);
}

#[test]
fn price_time_priority_fills_earlier_order_first() {
    init_log();
    let (ex, pair) = xcn_usd();
    let first = ex.submit(&order(3, Side::Sell, pair, "5", "10")).unwrap().listed().unwrap();
    let second = ex.submit(&order(4, Side::Sell, pair, "5", "10")).unwrap().listed().unwrap();
    let result = ex.submit(&order(2, Side::Buy, pair, "5", "10")).unwrap();
    assert_eq!(result.fills()[0].resting_order_id, first);
    assert_eq!(ex.order(first).unwrap().status, OrderStatus::Closed);
    assert_eq!(ex.order(second).unwrap().status, OrderStatus::Open);
}

#[test]
fn better_price_beats_earlier_time() {
    init_log();
    let (ex, pair) = xcn_usd();
    ex.submit(&order(3, Side::Sell, pair, "6", "10")).unwrap();
    let cheaper = ex.submit(&order(4, Side::Sell, pair, "5", "10")).unwrap().listed().unwrap();
    let result = ex.submit(&order(2, Side::Buy, pair, "6", "10")).unwrap();
    assert_eq!(result.fills()[0].resting_order_id, cheaper);
    assert_eq!(result.fills()[0].price, d("5"));
    // Paid 50 at the resting price, not 60 at the limit.
    assert_eq!(balance(&ex, 2, pair.quote), d("950"));
}

#[test]
fn partial_fill_arithmetic() {
    init_log();
    let (ex, pair) = xcn_usd();
    let resting = ex.submit(&order(1, Side::Sell, pair, "3", "100")).unwrap().listed().unwrap();
    let result = ex.submit(&order(2, Side::Buy, pair, "3", "30")).unwrap();
    assert!(matches!(result, FillResult::Filled { .. }));
    assert_eq!(result.fills().len(), 1);
    let rest = ex.order(resting).unwrap();
    assert_eq!(rest.amount, d("70"));
    assert_eq!(rest.status, OrderStatus::Open);
    assert_eq!(ex.series(pair, None, SeriesOrder::Asc).unwrap().len(), 1);
    assert_eq!(ex.last_price(pair).unwrap(), Some(d("3")));
    assert_conserved(&ex, pair);
}

#[test]
fn self_match_is_never_executed() {
    init_log();
    let (ex, pair) = xcn_usd();
    ex.submit(&order(3, Side::Sell, pair, "2", "10")).unwrap();
    let result = ex.submit(&order(3, Side::Buy, pair, "2", "10")).unwrap();
    assert!(matches!(result, FillResult::Listed { .. }));
    assert!(ex.series(pair, None, SeriesOrder::Asc).unwrap().is_empty());
    assert_eq!(ex.best_bid(pair).unwrap(), Some(d("2")));
    assert_eq!(ex.best_ask(pair).unwrap(), Some(d("2")));
    assert_conserved(&ex, pair);
}

#[test]
fn decimal_precision_boundary() {
    init_log();
    let (ex, pair) = xcn_usd();
    assert_eq!(
        ex.submit(&order(1, Side::Sell, pair, "2", "1.00005")),
        Err(LedgerError::TooManyDecimalPlaces(d("1.00005")))
    );
    assert!(ex.submit(&order(1, Side::Sell, pair, "2", "1.0000")).is_ok());
    assert!(matches!(
        ex.transfer(OwnerId(1), OwnerId(2), pair.base, d("0.00001")),
        Err(LedgerError::TooManyDecimalPlaces(_))
    ));
}

#[test]
fn cancel_never_refunds_twice() {
    init_log();
    let (ex, pair) = xcn_usd();
    let id = ex.submit(&order(2, Side::Buy, pair, "1.5", "100")).unwrap().listed().unwrap();
    assert_eq!(balance(&ex, 2, pair.quote), d("850"));
    ex.cancel(OwnerId(2), id).unwrap();
    assert_eq!(balance(&ex, 2, pair.quote), d("1000"));
    assert_eq!(
        ex.cancel(OwnerId(2), id),
        Err(LedgerError::OrderNotOpen { id, status: OrderStatus::Canceled })
    );
    assert_eq!(balance(&ex, 2, pair.quote), d("1000"));
    assert!(ex.best_bid(pair).unwrap().is_none());
}

#[test]
fn cancel_after_partial_fill_refunds_only_remainder() {
    init_log();
    let (ex, pair) = xcn_usd();
    let id = ex.submit(&order(2, Side::Buy, pair, "4", "100")).unwrap().listed().unwrap();
    ex.submit(&order(1, Side::Sell, pair, "4", "25")).unwrap();
    let canceled = ex.cancel(OwnerId(2), id).unwrap();
    assert_eq!(canceled.amount, d("75"));
    assert_eq!(balance(&ex, 2, pair.quote), d("900"));
    assert_eq!(balance(&ex, 2, pair.base), d("25"));
    assert!(matches!(
        ex.cancel(OwnerId(1), id),
        Err(LedgerError::NotOrderOwner(_))
    ));
    assert_conserved(&ex, pair);
}

#[test]
fn closed_order_cannot_be_canceled() {
    init_log();
    let (ex, pair) = xcn_usd();
    let id = ex.submit(&order(1, Side::Sell, pair, "2", "10")).unwrap().listed().unwrap();
    ex.submit(&order(2, Side::Buy, pair, "2", "10")).unwrap();
    assert_eq!(
        ex.cancel(OwnerId(1), id),
        Err(LedgerError::OrderNotOpen { id, status: OrderStatus::Closed })
    );
}

#[test]
fn failed_submit_leaves_no_partial_state() {
    init_log();
    let (ex, pair) = xcn_usd();
    let before = ex.snapshot().unwrap();
    // Owner 5 has nothing: accounts would be created, then the funds check fails.
    assert!(matches!(
        ex.submit(&order(5, Side::Buy, pair, "1", "1")),
        Err(LedgerError::InsufficientFunds { .. })
    ));
    assert_eq!(ex.snapshot().unwrap(), before);
}

#[test]
fn frozen_account_cannot_trade_or_receive() {
    init_log();
    let (ex, pair) = xcn_usd();
    let account = ex.resolve_account_number("XCN-3").unwrap();
    ex.set_account_disabled(account.id, true).unwrap();
    assert_eq!(
        ex.submit(&order(3, Side::Sell, pair, "2", "1")),
        Err(LedgerError::AccountDisabled(account.id))
    );
    assert_eq!(
        ex.transfer(OwnerId(1), OwnerId(3), pair.base, d("1")),
        Err(LedgerError::AccountDisabled(account.id))
    );
    assert_eq!(
        ex.transfer(OwnerId(9), OwnerId(3), pair.base, d("1")),
        Err(LedgerError::AccountMissing(AccountRole::Sender))
    );
}

#[test]
fn disabled_currency_blocks_trading_but_not_cancel() {
    init_log();
    let (ex, pair) = xcn_usd();
    let id = ex.submit(&order(1, Side::Sell, pair, "2", "10")).unwrap().listed().unwrap();
    ex.set_currency_disabled(pair.base, true).unwrap();
    assert_eq!(
        ex.submit(&order(2, Side::Buy, pair, "2", "10")),
        Err(LedgerError::CurrencyDisabled(pair.base))
    );
    ex.cancel(OwnerId(1), id).unwrap();
    assert_eq!(balance(&ex, 1, pair.base), d("1000"));
}

#[test]
fn order_listing_pages_and_filters() {
    init_log();
    let (ex, pair) = xcn_usd();
    for price in ["1", "3", "2"] {
        ex.submit(&order(2, Side::Buy, pair, price, "1")).unwrap();
    }
    let filter = ledger_exchange::OrderFilter {
        owner: Some(OwnerId(2)),
        pair: Some(pair),
        side: Some(Side::Buy),
        status: Some(OrderStatus::Open),
    };
    let page = ex.list_orders(&filter, 1, 2).unwrap();
    assert_eq!(page.total_items, 3);
    assert_eq!(page.total_pages, 2);
    let prices: Vec<Decimal> = page.items.iter().map(|o| o.price).collect();
    assert_eq!(prices, vec![d("3"), d("2")]);
    let quote = ex.quote(pair).unwrap();
    assert_eq!(quote.bid, Some(d("3")));
    assert_eq!(quote.ask, None);
    assert_eq!(quote.last, None);
}
