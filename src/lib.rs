//! WABA Onboard: lead intake, activation links and WhatsApp Business linking.

pub mod api;
pub mod channels;
pub mod config;
pub mod error;
pub mod integrations;
pub mod onboarding;
