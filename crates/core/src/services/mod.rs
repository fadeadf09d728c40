pub mod analytics_service;
pub mod cost_basis_service;
pub mod ledger_service;
pub mod quote_resolver;
pub mod quote_service;
pub mod valuation_service;
