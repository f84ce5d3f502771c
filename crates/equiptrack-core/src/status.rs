//! Expiry status computation.

use crate::models::{DisplayColor, Status};
use crate::policy::MaterialPolicy;
use chrono::{Months, NaiveDate};

/// Result of evaluating one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub status: Status,
    pub color: DisplayColor,
    /// First issue date plus the material's renewal interval.
    pub expires_on: NaiveDate,
}

/// Derives a record's status from its material and issue dates.
#[derive(Debug, Clone, Default)]
pub struct StatusEvaluator {
    policy: MaterialPolicy,
}

impl StatusEvaluator {
    pub fn new(policy: MaterialPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &MaterialPolicy {
        &self.policy
    }

    /// Evaluate a record's status.
    ///
    /// A last issue date strictly before the expiration yields `NotGood`; on
    /// or after it yields `Good`. This mirrors the established behavior of
    /// the tracker even though the naming suggests the opposite reading.
    pub fn evaluate(
        &self,
        material: &str,
        first_issue_date: NaiveDate,
        last_issue_date: NaiveDate,
    ) -> Evaluation {
        let months = self.policy.interval_months(material);
        let expires_on = add_months(first_issue_date, months);

        let status = if last_issue_date < expires_on {
            Status::NotGood
        } else {
            Status::Good
        };

        Evaluation {
            status,
            color: status.color(),
            expires_on,
        }
    }
}

/// Calendar month addition, clamping the day to the target month's length.
/// Saturates at the largest representable date.
pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn hard_hat_before_expiration_is_not_good() {
        let eval = StatusEvaluator::default().evaluate("Hard Hat", d(2024, 1, 15), d(2024, 6, 1));
        assert_eq!(eval.expires_on, d(2024, 7, 15));
        assert_eq!(eval.status, Status::NotGood);
        assert_eq!(eval.color, DisplayColor::Red);
    }

    #[test]
    fn hard_hat_after_expiration_is_good() {
        let eval = StatusEvaluator::default().evaluate("Hard Hat", d(2024, 1, 15), d(2024, 8, 1));
        assert_eq!(eval.status, Status::Good);
        assert_eq!(eval.color, DisplayColor::Green);
    }

    #[test]
    fn expiration_day_itself_is_good() {
        let eval = StatusEvaluator::default().evaluate("Hard Hat", d(2024, 1, 15), d(2024, 7, 15));
        assert_eq!(eval.status, Status::Good);
    }

    #[test]
    fn unknown_material_uses_six_months() {
        let eval = StatusEvaluator::default().evaluate("Gloves", d(2024, 3, 10), d(2024, 3, 10));
        assert_eq!(eval.expires_on, d(2024, 9, 10));
    }

    #[test]
    fn month_end_is_clamped() {
        assert_eq!(add_months(d(2024, 7, 31), 7), d(2025, 2, 28));
        assert_eq!(add_months(d(2023, 8, 31), 6), d(2024, 2, 29));
        assert_eq!(add_months(d(2024, 1, 31), 1), d(2024, 2, 29));
    }

    #[test]
    fn injected_policy_overrides_defaults() {
        let evaluator = StatusEvaluator::new(MaterialPolicy::new([("Hard Hat", 1)]));
        let eval = evaluator.evaluate("Hard Hat", d(2024, 1, 15), d(2024, 3, 1));
        assert_eq!(eval.expires_on, d(2024, 2, 15));
        assert_eq!(eval.status, Status::Good);
        // Materials missing from the injected table fall back to the default.
        assert_eq!(evaluator.evaluate("Vest", d(2024, 1, 15), d(2024, 1, 15)).expires_on, d(2024, 7, 15));
    }

    #[test]
    fn evaluation_is_deterministic() {
        let evaluator = StatusEvaluator::default();
        for material in evaluator.policy().material_names() {
            let a = evaluator.evaluate(material, d(2022, 5, 20), d(2023, 1, 2));
            let b = evaluator.evaluate(material, d(2022, 5, 20), d(2023, 1, 2));
            assert_eq!(a, b);
        }
    }

    #[test]
    fn saturates_near_max_date() {
        assert_eq!(add_months(NaiveDate::MAX, 1), NaiveDate::MAX);
    }
}
