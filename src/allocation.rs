//! Risk-to-allocation policy
//!
//! Pure lookup from risk tier to asset-class percentages.
//! Deterministic, no side effects.

use crate::models::{Allocation, RiskTier};

/// Fixed policy table:
///
/// | risk   | Equity | Debt | Gold |
/// |--------|--------|------|------|
/// | Low    | 30     | 60   | 10   |
/// | Medium | 50     | 40   | 10   |
/// | High   | 70     | 20   | 10   |
///
/// The input domain is the closed `RiskTier` enum, so there is no
/// out-of-domain branch to reject.
pub fn allocate(risk: RiskTier) -> Allocation {
    let (equity, debt, gold) = match risk {
        RiskTier::Low => (30, 60, 10),
        RiskTier::Medium => (50, 40, 10),
        RiskTier::High => (70, 20, 10),
    };

    // The table above sums to 100 for every tier.
    Allocation::new(equity, debt, gold).expect("policy table sums to 100")
}
