//! HTTP surface: routes, handlers, auth middleware and error mapping

pub mod account;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod search;
pub mod session;
pub mod tariff;

pub use routes::build_router;
