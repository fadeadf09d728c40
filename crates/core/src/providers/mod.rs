pub mod registry;
pub mod traits;

// Quote source implementations
pub mod giavang;
pub mod sjc;
pub mod static_provider;
