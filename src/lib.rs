pub mod calc;
pub mod db;
pub mod directory;
pub mod error;
pub mod ipc;
pub mod ledger;

pub use error::LedgerError;
