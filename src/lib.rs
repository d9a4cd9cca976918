//! AgriFund Client Core
//!
//! Headless client for the AgriFund agricultural funding platform: staged
//! form wizards for funding requests and farmland registration, the typed
//! REST client they drive, and the session context both share. The embedding
//! UI owns rendering and routing; this crate owns drafts, step gating, image
//! staging, and submission.

pub mod api_client;
pub mod config;
pub mod error;
pub mod farmland_wizard;
pub mod investment_wizard;
pub mod models;
pub mod notify;
pub mod session;
pub mod uploads;
pub mod wizard;
