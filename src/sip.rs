//! Systematic-investment-plan (SIP) annuity solver
//!
//! Inverts the future-value-of-annuity formula to find the fixed
//! monthly contribution that grows to a goal amount over a horizon.

use crate::error::AdvisorError;
use crate::models::{round2, GoalPlan, SipResult};
use crate::Result;

/// Solve for the required monthly contribution.
///
/// monthly_rate = annual_return_pct / 100 / 12
/// months       = years * 12
/// contribution = goal * monthly_rate / ((1 + monthly_rate)^months - 1)
///
/// The contribution is rounded half-away-from-zero to 2 decimals.
/// Fails with `DegenerateRate` when the monthly rate is zero or
/// negative — the denominator degenerates and the formula would
/// otherwise produce Inf/NaN or a negative-growth nonsense figure.
pub fn solve(goal_amount: f64, years: u32, annual_return_pct: f64) -> Result<SipResult> {
    let plan = GoalPlan::new(goal_amount, years, annual_return_pct)?;
    solve_plan(&plan)
}

/// Solve for an already validated plan.
pub fn solve_plan(plan: &GoalPlan) -> Result<SipResult> {
    let monthly_rate = plan.expected_return_pct / 100.0 / 12.0;
    if monthly_rate <= 0.0 {
        return Err(AdvisorError::DegenerateRate(format!(
            "expected annual return of {}% yields a non-positive monthly rate",
            plan.expected_return_pct
        )));
    }

    let months = (plan.years * 12) as i32;
    let growth = (1.0 + monthly_rate).powi(months) - 1.0;
    let contribution = plan.target_amount * monthly_rate / growth;

    Ok(SipResult {
        target_amount: plan.target_amount,
        years: plan.years,
        monthly_contribution: round2(contribution),
    })
}
