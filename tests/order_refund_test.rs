mod common;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;
use sea_orm::ModelTrait;
use storeops_api::entities::order::{DiscountKind, PaymentMethod};
use storeops_api::entities::shift;
use storeops_api::errors::ServiceError;
use storeops_api::services::orders::{CreateOrderInput, Discount, OrderItemInput};
use storeops_api::services::refunds::{CreateRefundInput, RefundItemInput};

use common::TestApp;

#[tokio::test]
async fn cash_order_decrements_stock_and_credits_register() {
    let app = TestApp::new().await;
    let product = app.seed_product("Coffee", "COF").await;
    let variant = app
        .seed_variant(product.id, "Beans", "4001", dec!(100), None)
        .await;
    let warehouse = app.seed_warehouse("Main").await;
    let entry = app.seed_stock(variant.id, warehouse.id, 10).await;
    let pos = app.seed_point_of_sale(warehouse.id, dec!(0)).await;
    let shift = app.open_shift(pos.id).await;

    let created = app
        .services
        .orders
        .create(CreateOrderInput {
            shift_id: shift.id,
            payment_method: PaymentMethod::Cash,
            items: vec![OrderItemInput {
                stock_entry_id: entry.id,
                quantity: 1,
                custom_discount: None,
            }],
            bulk_discount: None,
            cash_amount: None,
            card_amount: None,
        })
        .await
        .unwrap();

    assert_eq!(created.order.name, "Order #1");
    assert_eq!(created.order.total_amount, dec!(100));
    assert_eq!(created.order.total_cash_amount, dec!(100));
    assert_eq!(created.order.total_card_amount, dec!(0));
    assert_eq!(app.stock_quantity(entry.id).await, 9);
    assert_eq!(app.register_balance(pos.id).await, dec!(100));

    // The order joins back to the shift it was sold under.
    let shift_of_order = created
        .order
        .find_related(shift::Entity)
        .one(app.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(shift_of_order.id, shift.id);
}

#[tokio::test]
async fn full_refund_restores_stock_and_debits_register() {
    let app = TestApp::new().await;
    let product = app.seed_product("Coffee", "COF").await;
    let variant = app
        .seed_variant(product.id, "Beans", "4002", dec!(100), None)
        .await;
    let warehouse = app.seed_warehouse("Main").await;
    let entry = app.seed_stock(variant.id, warehouse.id, 10).await;
    let pos = app.seed_point_of_sale(warehouse.id, dec!(0)).await;
    let shift = app.open_shift(pos.id).await;

    let order = app
        .services
        .orders
        .create(CreateOrderInput {
            shift_id: shift.id,
            payment_method: PaymentMethod::Cash,
            items: vec![OrderItemInput {
                stock_entry_id: entry.id,
                quantity: 1,
                custom_discount: None,
            }],
            bulk_discount: None,
            cash_amount: None,
            card_amount: None,
        })
        .await
        .unwrap();

    let refund = app
        .services
        .refunds
        .create(CreateRefundInput {
            order_id: order.order.id,
            shift_id: shift.id,
            items: vec![RefundItemInput {
                order_item_id: order.items[0].id,
                quantity: 1,
            }],
        })
        .await
        .unwrap();

    assert_eq!(refund.refund.name, "Refund #1");
    assert_eq!(refund.refund.total_amount, dec!(100));
    assert_eq!(refund.items[0].amount, dec!(100));
    // Order/refund symmetry: stock is back where it started and the register
    // nets to zero (CREDIT 100 then DEBIT -100).
    assert_eq!(app.stock_quantity(entry.id).await, 10);
    assert_eq!(app.register_balance(pos.id).await, dec!(0));
}

#[tokio::test]
async fn refund_prorates_bulk_discount_share() {
    let app = TestApp::new().await;
    let product = app.seed_product("Coffee", "COF").await;
    let v1 = app
        .seed_variant(product.id, "Beans", "4003", dec!(100), None)
        .await;
    let v2 = app
        .seed_variant(product.id, "Ground", "4004", dec!(100), None)
        .await;
    let warehouse = app.seed_warehouse("Main").await;
    let e1 = app.seed_stock(v1.id, warehouse.id, 10).await;
    let e2 = app.seed_stock(v2.id, warehouse.id, 10).await;
    let pos = app.seed_point_of_sale(warehouse.id, dec!(0)).await;
    let shift = app.open_shift(pos.id).await;

    // Subtotal 200, 10% bulk discount, total 180.
    let order = app
        .services
        .orders
        .create(CreateOrderInput {
            shift_id: shift.id,
            payment_method: PaymentMethod::Card,
            items: vec![
                OrderItemInput {
                    stock_entry_id: e1.id,
                    quantity: 1,
                    custom_discount: None,
                },
                OrderItemInput {
                    stock_entry_id: e2.id,
                    quantity: 1,
                    custom_discount: None,
                },
            ],
            bulk_discount: Some(Discount {
                kind: DiscountKind::Percentage,
                value: dec!(10),
            }),
            cash_amount: None,
            card_amount: None,
        })
        .await
        .unwrap();
    assert_eq!(order.order.total_amount, dec!(180));

    let item_1 = order
        .items
        .iter()
        .find(|i| i.stock_entry_id == e1.id)
        .unwrap();
    let refund = app
        .services
        .refunds
        .create(CreateRefundInput {
            order_id: order.order.id,
            shift_id: shift.id,
            items: vec![RefundItemInput {
                order_item_id: item_1.id,
                quantity: 1,
            }],
        })
        .await
        .unwrap();

    // The 100 line carries its share of the bulk discount: 100 * 180/200.
    assert_eq!(refund.refund.total_amount, dec!(90));
    assert_eq!(app.stock_quantity(e1.id).await, 10);
    assert_eq!(app.stock_quantity(e2.id).await, 9);
}

#[tokio::test]
async fn sale_price_and_custom_discount_flow_into_totals() {
    let app = TestApp::new().await;
    let product = app.seed_product("Coffee", "COF").await;
    let variant = app
        .seed_variant(product.id, "Beans", "4005", dec!(100), Some(dec!(80)))
        .await;
    let warehouse = app.seed_warehouse("Main").await;
    let entry = app.seed_stock(variant.id, warehouse.id, 10).await;
    let pos = app.seed_point_of_sale(warehouse.id, dec!(0)).await;
    let shift = app.open_shift(pos.id).await;

    let order = app
        .services
        .orders
        .create(CreateOrderInput {
            shift_id: shift.id,
            payment_method: PaymentMethod::Cash,
            items: vec![OrderItemInput {
                stock_entry_id: entry.id,
                quantity: 2,
                custom_discount: Some(Discount {
                    kind: DiscountKind::Fixed,
                    value: dec!(5),
                }),
            }],
            bulk_discount: None,
            cash_amount: None,
            card_amount: None,
        })
        .await
        .unwrap();

    // Base 80 (sale price), minus 5 custom discount, times 2.
    assert_eq!(order.order.total_amount, dec!(150));
    assert_eq!(order.items[0].unit_price, dec!(100));
    assert_eq!(order.items[0].discounted_price, dec!(75));
}

#[tokio::test]
async fn mixed_payment_mismatch_records_zero_splits() {
    let app = TestApp::new().await;
    let product = app.seed_product("Coffee", "COF").await;
    let variant = app
        .seed_variant(product.id, "Beans", "4006", dec!(100), None)
        .await;
    let warehouse = app.seed_warehouse("Main").await;
    let entry = app.seed_stock(variant.id, warehouse.id, 10).await;
    let pos = app.seed_point_of_sale(warehouse.id, dec!(0)).await;
    let shift = app.open_shift(pos.id).await;

    let order = app
        .services
        .orders
        .create(CreateOrderInput {
            shift_id: shift.id,
            payment_method: PaymentMethod::Mixed,
            items: vec![OrderItemInput {
                stock_entry_id: entry.id,
                quantity: 1,
                custom_discount: None,
            }],
            bulk_discount: None,
            cash_amount: Some(dec!(60)),
            card_amount: Some(dec!(50)),
        })
        .await
        .unwrap();

    assert_eq!(order.order.total_amount, dec!(100));
    assert_eq!(order.order.total_cash_amount, dec!(0));
    assert_eq!(order.order.total_card_amount, dec!(0));
}

#[tokio::test]
async fn closed_shift_rejects_orders_and_refunds() {
    let app = TestApp::new().await;
    let product = app.seed_product("Coffee", "COF").await;
    let variant = app
        .seed_variant(product.id, "Beans", "4007", dec!(100), None)
        .await;
    let warehouse = app.seed_warehouse("Main").await;
    let entry = app.seed_stock(variant.id, warehouse.id, 10).await;
    let pos = app.seed_point_of_sale(warehouse.id, dec!(0)).await;
    let shift = app.open_shift(pos.id).await;
    app.services.registers.close_shift(shift.id).await.unwrap();

    let result = app
        .services
        .orders
        .create(CreateOrderInput {
            shift_id: shift.id,
            payment_method: PaymentMethod::Cash,
            items: vec![OrderItemInput {
                stock_entry_id: entry.id,
                quantity: 1,
                custom_discount: None,
            }],
            bulk_discount: None,
            cash_amount: None,
            card_amount: None,
        })
        .await;
    assert_matches!(result, Err(ServiceError::Conflict(_)));
    assert_eq!(app.stock_quantity(entry.id).await, 10);

    let refund_result = app
        .services
        .refunds
        .create(CreateRefundInput {
            order_id: uuid::Uuid::new_v4(),
            shift_id: shift.id,
            items: vec![RefundItemInput {
                order_item_id: uuid::Uuid::new_v4(),
                quantity: 1,
            }],
        })
        .await;
    assert_matches!(refund_result, Err(ServiceError::Conflict(_)));
}

#[tokio::test]
async fn withdrawal_is_capped_by_register_balance() {
    let app = TestApp::new().await;
    let warehouse = app.seed_warehouse("Main").await;
    let pos = app.seed_point_of_sale(warehouse.id, dec!(50)).await;
    let shift = app.open_shift(pos.id).await;

    assert_matches!(
        app.services.registers.withdraw(shift.id, dec!(80)).await,
        Err(ServiceError::BadRequest(_))
    );
    assert_eq!(app.register_balance(pos.id).await, dec!(50));

    app.services
        .registers
        .withdraw(shift.id, dec!(30))
        .await
        .unwrap();
    assert_eq!(app.register_balance(pos.id).await, dec!(20));
}

#[tokio::test]
async fn second_open_shift_on_same_register_is_rejected() {
    let app = TestApp::new().await;
    let warehouse = app.seed_warehouse("Main").await;
    let pos = app.seed_point_of_sale(warehouse.id, dec!(0)).await;
    app.open_shift(pos.id).await;

    assert_matches!(
        app.services.registers.open_shift(pos.id).await,
        Err(ServiceError::Conflict(_))
    );
}
