pub mod core;
pub mod directory;
pub mod ledger;
pub mod reports;
