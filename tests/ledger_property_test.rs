mod common;

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use uuid::Uuid;

use storeops_api::entities::order::{DiscountKind, PaymentMethod};
use storeops_api::services::ledger::StockLedger;
use storeops_api::services::orders::{apply_discount, split_payment, Discount};
use storeops_api::services::refunds::prorate_amount;
use storeops_api::services::transfers::{reconcile_items, TransferItemInput};

use common::TestApp;

fn variant_pool() -> Vec<Uuid> {
    (0..4u128).map(Uuid::from_u128).collect()
}

fn items_strategy() -> impl Strategy<Value = Vec<TransferItemInput>> {
    prop::collection::vec((0usize..4, 1i64..100), 0..4).prop_map(|raw| {
        let pool = variant_pool();
        let mut seen = Vec::new();
        let mut items = Vec::new();
        for (idx, quantity) in raw {
            let variant_id = pool[idx];
            if !seen.contains(&variant_id) {
                seen.push(variant_id);
                items.push(TransferItemInput {
                    variant_id,
                    quantity,
                });
            }
        }
        items
    })
}

fn warehouse_strategy() -> impl Strategy<Value = Uuid> {
    (100u128..104).prop_map(Uuid::from_u128)
}

proptest! {
    // Conservation: reconciling any edit of any transfer nets to zero per
    // variant, so the total stock across warehouses never changes.
    #[test]
    fn reconciliation_conserves_stock_per_variant(
        old_items in items_strategy(),
        new_items in items_strategy(),
        old_src in warehouse_strategy(),
        old_dst in warehouse_strategy(),
        new_src in warehouse_strategy(),
        new_dst in warehouse_strategy(),
    ) {
        let moves = reconcile_items(old_src, old_dst, new_src, new_dst, &old_items, &new_items);
        let mut per_variant: HashMap<Uuid, i64> = HashMap::new();
        for m in &moves {
            *per_variant.entry(m.variant_id).or_default() += m.delta;
        }
        for (variant_id, net) in per_variant {
            prop_assert_eq!(net, 0, "variant {} leaked stock", variant_id);
        }
    }

    // Reconciliation equals undo-all/redo-all observed as net deltas per
    // (variant, warehouse) cell.
    #[test]
    fn reconciliation_matches_undo_redo(
        old_items in items_strategy(),
        new_items in items_strategy(),
        old_src in warehouse_strategy(),
        old_dst in warehouse_strategy(),
        new_src in warehouse_strategy(),
        new_dst in warehouse_strategy(),
    ) {
        let moves = reconcile_items(old_src, old_dst, new_src, new_dst, &old_items, &new_items);
        let mut got: HashMap<(Uuid, Uuid), i64> = HashMap::new();
        for m in &moves {
            *got.entry((m.variant_id, m.warehouse_id)).or_default() += m.delta;
        }
        got.retain(|_, d| *d != 0);

        let mut want: HashMap<(Uuid, Uuid), i64> = HashMap::new();
        for old in &old_items {
            *want.entry((old.variant_id, old_src)).or_default() += old.quantity;
            *want.entry((old.variant_id, old_dst)).or_default() -= old.quantity;
        }
        for new in &new_items {
            *want.entry((new.variant_id, new_src)).or_default() -= new.quantity;
            *want.entry((new.variant_id, new_dst)).or_default() += new.quantity;
        }
        want.retain(|_, d| *d != 0);

        prop_assert_eq!(got, want);
    }

    #[test]
    fn discounts_stay_within_bounds(
        amount in 0i64..1_000_000,
        value in 0i64..1_000_000,
        percentage in 0i64..100,
    ) {
        let amount = Decimal::from(amount);
        let fixed = apply_discount(amount, Some(&Discount { kind: DiscountKind::Fixed, value: Decimal::from(value) }));
        prop_assert!(fixed >= Decimal::ZERO && fixed <= amount);

        let pct = apply_discount(amount, Some(&Discount { kind: DiscountKind::Percentage, value: Decimal::from(percentage) }));
        prop_assert!(pct >= Decimal::ZERO && pct <= amount);
    }

    #[test]
    fn payment_splits_sum_to_total_or_zero(
        total in 0i64..1_000_000,
        cash in 0i64..1_000_000,
        card in 0i64..1_000_000,
    ) {
        let total = Decimal::from(total);
        for method in [PaymentMethod::Cash, PaymentMethod::Card, PaymentMethod::Mixed] {
            let (c, k) = split_payment(total, method, Some(Decimal::from(cash)), Some(Decimal::from(card)));
            prop_assert!(c + k == total || (c.is_zero() && k.is_zero()));
        }
    }

    #[test]
    fn refund_amounts_scale_linearly_in_quantity(
        price in 1i64..10_000,
        quantity in 1i64..100,
        subtotal in 1i64..1_000_000,
        total in 0i64..1_000_000,
    ) {
        let price = Decimal::from(price);
        let total = Decimal::from(total);
        let subtotal = Decimal::from(subtotal);
        let unit = prorate_amount(price, 1, total, subtotal);
        let many = prorate_amount(price, quantity, total, subtotal);
        prop_assert_eq!(many, unit * Decimal::from(quantity));
    }
}

/// Aggregate consistency after an arbitrary mix of ledger writes: the variant
/// totals equal the sum of their entries and the product total equals the sum
/// of its variants.
#[tokio::test]
async fn aggregates_track_entry_sums_across_mixed_deltas() {
    let app = TestApp::new().await;
    let product = app.seed_product("Coffee", "COF").await;
    let v1 = app
        .seed_variant(product.id, "Beans", "6001", dec!(10), None)
        .await;
    let v2 = app
        .seed_variant(product.id, "Ground", "6002", dec!(12), None)
        .await;
    let w1 = app.seed_warehouse("W1").await;
    let w2 = app.seed_warehouse("W2").await;

    let ops: &[(Uuid, Uuid, i64)] = &[
        (v1.id, w1.id, 10),
        (v1.id, w2.id, 4),
        (v2.id, w1.id, 7),
        (v1.id, w1.id, -3),
        (v2.id, w2.id, 9),
        (v2.id, w1.id, -7),
        (v1.id, w2.id, 1),
    ];
    for (variant_id, warehouse_id, delta) in ops {
        StockLedger::apply_delta(app.db.as_ref(), *variant_id, *warehouse_id, *delta)
            .await
            .unwrap();
    }

    let mut variant_sums: HashMap<Uuid, i64> = HashMap::new();
    for variant_id in [v1.id, v2.id] {
        let entries = StockLedger::find_entries_for_variant(app.db.as_ref(), variant_id)
            .await
            .unwrap();
        let sum: i64 = entries.iter().map(|e| e.warehouse_quantity).sum();
        variant_sums.insert(variant_id, sum);
        assert_eq!(app.variant_total(variant_id).await, sum);
    }
    assert_eq!(
        app.product_total(product.id).await,
        variant_sums.values().sum::<i64>()
    );
}

/// Negative quantities are allowed through the ledger; the entry goes below
/// zero instead of erroring.
#[tokio::test]
async fn ledger_permits_negative_quantities() {
    let app = TestApp::new().await;
    let product = app.seed_product("Coffee", "COF").await;
    let variant = app
        .seed_variant(product.id, "Beans", "6003", dec!(10), None)
        .await;
    let warehouse = app.seed_warehouse("W1").await;

    let entry = StockLedger::apply_delta(app.db.as_ref(), variant.id, warehouse.id, -5)
        .await
        .unwrap();
    assert_eq!(entry.warehouse_quantity, -5);
    assert_eq!(app.variant_total(variant.id).await, -5);
}
