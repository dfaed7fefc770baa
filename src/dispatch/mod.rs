//! Routing validated deliveries to robot handlers.

pub mod dispatcher;
pub mod registry;

pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use registry::{HandlerFuture, HandlerTable, HandlerTableBuilder};
