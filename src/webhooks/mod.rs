//! Webhook intake for GitHub events.
//!
//! This module provides:
//! - Request validation (method, headers, content type, HMAC-SHA256 signature)
//! - Typed event models and the tag-driven payload parser
//! - [`IssuePrInfo`], a uniform view over pull request activity

pub mod events;
pub mod info;
pub mod parser;
pub mod signature;
pub mod validator;

pub use events::{EventKind, GitHubEvent};
pub use info::{IssuePrInfo, LabelSet};
pub use parser::{ParseError, parse_event, parse_webhook};
pub use signature::{Signature, verify_signature};
pub use validator::{EventEnvelope, SecretSource, ValidationError, WebhookValidator};
