pub mod product;
pub mod product_variant;
pub mod warehouse;
pub mod stock_entry;

pub mod inventory_adjustment;
pub mod inventory_adjustment_line;
pub mod inventory_adjustment_reason;

pub mod inventory_transfer;
pub mod inventory_transfer_item;
pub mod inventory_transfer_reason;

pub mod order;
pub mod order_item;
pub mod refund;
pub mod refund_item;

pub mod point_of_sale;
pub mod register_transaction;
pub mod shift;
