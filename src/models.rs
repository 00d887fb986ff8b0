//! Core data models for the advisory pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::AdvisorError;
use crate::Result;

//
// ================= Enums =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    Equity,
    Debt,
    Gold,
}

impl AssetClass {
    /// Fixed iteration order for allocation lines and the returns table.
    pub const ALL: [AssetClass; 3] = [AssetClass::Equity, AssetClass::Debt, AssetClass::Gold];
}

//
// ================= User Profile =================
//

/// Immutable profile captured once per session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub age: u8,
    pub monthly_income: f64,
    pub risk: RiskTier,
    pub goal: String,
}

impl UserProfile {
    pub const MIN_AGE: u8 = 18;
    pub const MAX_AGE: u8 = 70;

    pub fn new(age: u8, monthly_income: f64, risk: RiskTier, goal: impl Into<String>) -> Result<Self> {
        if !(Self::MIN_AGE..=Self::MAX_AGE).contains(&age) {
            return Err(AdvisorError::InvalidArgument(format!(
                "age must be between {} and {}, got {}",
                Self::MIN_AGE,
                Self::MAX_AGE,
                age
            )));
        }
        if !monthly_income.is_finite() || monthly_income < 0.0 {
            return Err(AdvisorError::InvalidArgument(format!(
                "monthly income must be a non-negative amount, got {}",
                monthly_income
            )));
        }
        Ok(Self {
            age,
            monthly_income,
            risk,
            goal: goal.into(),
        })
    }
}

//
// ================= Allocation =================
//

/// Asset-class percentages, always summing to exactly 100.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Allocation {
    pub equity: u8,
    pub debt: u8,
    pub gold: u8,
}

impl Allocation {
    pub fn new(equity: u8, debt: u8, gold: u8) -> Result<Self> {
        let sum = equity as u16 + debt as u16 + gold as u16;
        if sum != 100 {
            return Err(AdvisorError::InvalidArgument(format!(
                "allocation percentages must sum to 100, got {}",
                sum
            )));
        }
        Ok(Self { equity, debt, gold })
    }

    pub fn percent(&self, class: AssetClass) -> u8 {
        match class {
            AssetClass::Equity => self.equity,
            AssetClass::Debt => self.debt,
            AssetClass::Gold => self.gold,
        }
    }

    /// Percentages in fixed class order.
    pub fn entries(&self) -> [(AssetClass, u8); 3] {
        [
            (AssetClass::Equity, self.equity),
            (AssetClass::Debt, self.debt),
            (AssetClass::Gold, self.gold),
        ]
    }
}

//
// ================= Goal / SIP =================
//

/// Monetary goal to be reached with fixed monthly contributions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GoalPlan {
    pub target_amount: f64,
    pub years: u32,
    pub expected_return_pct: f64,
}

impl GoalPlan {
    pub fn new(target_amount: f64, years: u32, expected_return_pct: f64) -> Result<Self> {
        if !target_amount.is_finite() || target_amount <= 0.0 {
            return Err(AdvisorError::InvalidArgument(format!(
                "goal amount must be positive, got {}",
                target_amount
            )));
        }
        if years == 0 {
            return Err(AdvisorError::InvalidArgument(
                "horizon must be at least one year".to_string(),
            ));
        }
        if !expected_return_pct.is_finite() || expected_return_pct > 100.0 {
            return Err(AdvisorError::InvalidArgument(format!(
                "expected annual return must be at most 100%, got {}",
                expected_return_pct
            )));
        }
        Ok(Self {
            target_amount,
            years,
            expected_return_pct,
        })
    }
}

/// Required monthly contribution for a GoalPlan, rounded to 2 decimals.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SipResult {
    pub target_amount: f64,
    pub years: u32,
    pub monthly_contribution: f64,
}

//
// ================= Return Estimates =================
//

/// Why a ticker's CAGR could not be computed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum UnavailableReason {
    /// The fetched series was empty.
    NoData,
    /// The series carried no valid closing-price field.
    MissingField,
    /// Zero or negative start price; CAGR is undefined.
    InvalidPrice,
    /// The provider itself failed for this ticker.
    FetchFailed(String),
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnavailableReason::NoData => write!(f, "no data"),
            UnavailableReason::MissingField => write!(f, "missing closing-price field"),
            UnavailableReason::InvalidPrice => write!(f, "invalid start price"),
            UnavailableReason::FetchFailed(detail) => write!(f, "fetch failed: {}", detail),
        }
    }
}

/// Per-ticker outcome of the return estimator. Raw price series never
/// cross this boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ReturnEstimate {
    Available { cagr_pct: f64 },
    Unavailable { reason: UnavailableReason },
}

/// CAGR table keyed by asset class, in fixed class order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnsTable {
    pub entries: [(AssetClass, ReturnEstimate); 3],
}

impl ReturnsTable {
    pub fn get(&self, class: AssetClass) -> &ReturnEstimate {
        // Entries follow AssetClass::ALL order.
        let index = match class {
            AssetClass::Equity => 0,
            AssetClass::Debt => 1,
            AssetClass::Gold => 2,
        };
        &self.entries[index].1
    }
}

//
// ================= Narrative =================
//

/// Advisor-generated explanation or answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Narrative {
    pub text: String,
    pub generated_at: DateTime<Utc>,
}

impl Narrative {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            generated_at: Utc::now(),
        }
    }
}

//
// ================= Advisory Report =================
//

/// Terminal artifact of a pipeline run; immutable once assembled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisoryReport {
    pub report_id: Uuid,
    pub profile: UserProfile,
    pub allocation: Allocation,
    pub narrative: String,
    pub sip: Option<SipResult>,
    pub created_at: DateTime<Utc>,
}

//
// ================= Helpers =================
//

/// Round a currency or percentage value to 2 decimal places,
/// half away from zero. Used for both SIP and CAGR figures so
/// displayed numbers are deterministic.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskTier::Low => "Low",
            RiskTier::Medium => "Medium",
            RiskTier::High => "High",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AssetClass::Equity => "Equity",
            AssetClass::Debt => "Debt",
            AssetClass::Gold => "Gold",
        };
        write!(f, "{}", s)
    }
}
