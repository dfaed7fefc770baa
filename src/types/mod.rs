//! Core identifier types shared by the webhook and API layers.

pub mod ids;

pub use ids::{CommentId, DeliveryId, InvalidAddress, IssuePrAddress, RepoId};
