//! Wealth Advisor Pipeline
//!
//! A personal investment-advisory computation pipeline:
//! - Derives a target asset allocation from the user's risk tier
//! - Solves the SIP annuity equation for a monetary goal
//! - Estimates historical returns (CAGR) per asset class, degrading
//!   gracefully when market data is unavailable
//! - Generates a natural-language explanation via a text-completion
//!   collaborator
//! - Assembles and renders a printable report
//!
//! FLOW:
//! PROFILE → ALLOCATE → EXPLAIN → [SIP] → [RETURNS] → [REPORT]

pub mod allocation;
pub mod api;
pub mod config;
pub mod error;
pub mod markets;
pub mod models;
pub mod narrative;
pub mod pipeline;
pub mod report;
pub mod sip;

pub use error::{AdvisorError, Result};

// Re-export common types
pub use config::AdvisorConfig;
pub use models::*;
pub use pipeline::{AdvisorySession, PipelineOrchestrator, PipelineState};
