//! Third-party HTTP integrations: Supabase agent directory, n8n webhook,
//! Facebook OAuth.

pub mod facebook;
pub mod supabase;
pub mod webhook;

pub use facebook::FacebookOAuth;
pub use supabase::{Agent, AgentDirectory};
pub use webhook::WebhookForwarder;
