mod account;
mod dashboard;
mod entry;
mod ledger;
mod product;
mod report;

pub use account::*;
pub use dashboard::*;
pub use entry::*;
pub use ledger::*;
pub use product::*;
pub use report::*;
