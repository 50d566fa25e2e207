pub mod adjustments;
pub mod import;
pub mod ledger;
pub mod orders;
pub mod refunds;
pub mod registers;
pub mod transfers;
