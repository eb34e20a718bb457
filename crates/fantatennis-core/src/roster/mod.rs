pub mod pricing;
pub mod selection;
pub mod session;
