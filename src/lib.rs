pub mod demo;
pub mod error;
pub mod fanout;
pub mod handlers;
pub mod identity;
pub mod listing;
pub mod pricing;
pub mod store;
