//! Property tests for the cart: totals and quantity clamping.

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use std::sync::Arc;
use zoo_checkout::cart::{CartStore, MAX_QTY_PER_ITEM};
use zoo_checkout::types::{ItemCode, Rupees};
use zoo_checkout::TariffCatalog;

#[derive(Clone, Debug)]
enum Op {
    Increment(usize),
    Decrement(usize),
    Set(usize, i64),
    Clear,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0usize..16).prop_map(Op::Increment),
        3 => (0usize..16).prop_map(Op::Decrement),
        3 => (0usize..16, any::<i64>()).prop_map(|(i, q)| Op::Set(i, q)),
        3 => (0usize..16, -5i64..20).prop_map(|(i, q)| Op::Set(i, q)),
        1 => Just(Op::Clear),
    ]
}

/// Every tariff code plus one unknown code
fn codes(catalog: &TariffCatalog) -> Vec<ItemCode> {
    let mut codes: Vec<ItemCode> = catalog.entries().iter().map(|e| e.code.clone()).collect();
    codes.push(ItemCode::from("not_on_tariff"));
    codes
}

fn apply(cart: &mut CartStore, codes: &[ItemCode], op: &Op) {
    // Unknown codes are rejected and leave the cart untouched
    let _ = match op {
        Op::Increment(i) => cart.increment(&codes[i % codes.len()]).map(|_| ()),
        Op::Decrement(i) => cart.decrement(&codes[i % codes.len()]).map(|_| ()),
        Op::Set(i, q) => cart.set_quantity(&codes[i % codes.len()], *q).map(|_| ()),
        Op::Clear => {
            cart.clear();
            Ok(())
        },
    };
}

proptest! {
    // Grand total equals the sum of quantity x price and no zero lines survive
    #[test]
    fn grand_total_matches_line_totals(ops in prop::collection::vec(op(), 0..60)) {
        let catalog = Arc::new(TariffCatalog::standard());
        let codes = codes(&catalog);
        let mut cart = CartStore::new(Arc::clone(&catalog));

        for op in &ops {
            apply(&mut cart, &codes, op);

            let expected: Rupees = cart
                .lines()
                .iter()
                .map(|line| catalog.price(&line.code).unwrap().times(line.quantity))
                .sum();
            let rendered: Rupees = cart.lines().iter().map(|line| line.line_total()).sum();

            prop_assert_eq!(cart.grand_total(), expected);
            prop_assert_eq!(cart.grand_total(), rendered);
            prop_assert!(cart.lines().iter().all(|line| line.quantity > 0));
            prop_assert_eq!(cart.is_empty(), cart.grand_total().is_zero());
        }
    }

    // Quantities never leave [0, MAX_QTY_PER_ITEM]
    #[test]
    fn quantity_is_always_clamped(requested in any::<i64>(), index in 0usize..15) {
        let catalog = TariffCatalog::standard();
        let code = catalog.entries()[index].code.clone();
        let mut cart = CartStore::new(Arc::new(catalog));

        let change = cart.set_quantity(&code, requested).unwrap();
        let expected = requested.clamp(0, i64::from(MAX_QTY_PER_ITEM));

        prop_assert_eq!(i64::from(change.quantity), expected);
        prop_assert_eq!(i64::from(cart.quantity(&code)), expected);
        prop_assert_eq!(change.clamped.is_some(), requested != expected);
        prop_assert!(cart.lines().iter().all(|line| line.quantity <= MAX_QTY_PER_ITEM));
    }
}
