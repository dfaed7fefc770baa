//! GitHub Robot - a framework for bots driven by GitHub webhooks.
//!
//! Deliveries arrive at an axum endpoint ([`server`]), are authenticated and
//! decoded ([`webhooks`]), and are routed to at most one registered handler
//! per event kind ([`dispatch`]). Handlers run concurrently on background
//! tasks and act on GitHub through the typed REST facade in [`github`].

pub mod config;
pub mod dispatch;
pub mod github;
pub mod server;
pub mod types;
pub mod webhooks;

#[cfg(test)]
mod test_utils;
