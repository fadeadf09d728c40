pub mod analytics;
pub mod chart;
pub mod holdings;
pub mod ledger;
pub mod quote;
pub mod settings;
pub mod transaction;
