pub mod filter;
pub mod handlers;
pub mod memory;
pub mod postgres;
pub mod remote;
pub mod store;
pub mod validation;
