//! Property-based tests for ledger accounting
//!
//! These tests use proptest to verify conservation and rejection
//! invariants across randomized fill sequences.

#[cfg(test)]
mod tests {
    use super::super::ledger::AccountLedger;
    use crate::core::MarketError;
    use proptest::prelude::*;

    /// Property: with zero fees, a buy followed by a full sell at the
    /// same price restores cash exactly and leaves no position behind.
    #[test]
    fn prop_zero_fee_round_trip_conserves_cash() {
        proptest!(|(quantity in 1u64..1_000, price in 1i64..10_000)| {
            let deposit = 100_000_000;
            let mut ledger = AccountLedger::new(deposit, 0);
            ledger.apply_buy("SYM", quantity, price).unwrap();
            ledger.apply_sell("SYM", quantity, price).unwrap();
            prop_assert_eq!(ledger.cash(), deposit);
            prop_assert!(ledger.holding("SYM").is_none());
        });
    }

    /// Property: the sell-side fee never exceeds the notional and cash
    /// after a round trip never exceeds the starting deposit.
    #[test]
    fn prop_fee_is_bounded_by_notional() {
        proptest!(|(
            quantity in 1u64..1_000,
            price in 1i64..10_000,
            fee_bps in 0u32..10_000,
        )| {
            let deposit = 100_000_000;
            let mut ledger = AccountLedger::new(deposit, fee_bps);
            ledger.apply_buy("SYM", quantity, price).unwrap();
            ledger.apply_sell("SYM", quantity, price).unwrap();
            let notional = price * quantity as i64;
            prop_assert!(ledger.cash() <= deposit);
            prop_assert!(ledger.cash() >= deposit - notional);
        });
    }

    /// Property: a rejected operation leaves the ledger untouched.
    #[test]
    fn prop_rejection_preserves_state() {
        proptest!(|(quantity in 1u64..1_000, price in 1i64..10_000)| {
            let deposit = price * quantity as i64 - 1;
            let mut ledger = AccountLedger::new(deposit, 0);

            let err = ledger.apply_buy("SYM", quantity, price).unwrap_err();
            let short_cash = matches!(err, MarketError::InsufficientFunds { .. });
            prop_assert!(short_cash, "unexpected buy rejection: {err}");
            prop_assert_eq!(ledger.cash(), deposit);

            let err = ledger.apply_sell("SYM", quantity, price).unwrap_err();
            let short_position = matches!(err, MarketError::InsufficientHoldings { .. });
            prop_assert!(short_position, "unexpected sell rejection: {err}");
            prop_assert_eq!(ledger.cash(), deposit);
        });
    }

    /// Property: average cost always sits between the lowest and highest
    /// fill price of the position.
    #[test]
    fn prop_average_cost_within_fill_range() {
        proptest!(|(fills in proptest::collection::vec((1u64..100, 1i64..10_000), 1..20))| {
            let mut ledger = AccountLedger::new(i64::MAX / 2, 0);
            let mut lo = i64::MAX;
            let mut hi = i64::MIN;
            for &(quantity, price) in &fills {
                ledger.apply_buy("SYM", quantity, price).unwrap();
                lo = lo.min(price);
                hi = hi.max(price);
            }
            let holding = ledger.holding("SYM").unwrap();
            prop_assert!(holding.average_cost >= lo);
            prop_assert!(holding.average_cost <= hi);
        });
    }
}
