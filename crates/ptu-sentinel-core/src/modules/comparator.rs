//! Capacity comparison. Pure: same inputs, same output.

use ptu_sentinel_types::CoverageStatus;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparison {
    pub status: CoverageStatus,
    /// `100 * deployed / reserved`; `None` when nothing is reserved
    pub utilization_percent: Option<f64>,
}

pub fn compare(deployed: u64, reserved: u64) -> Comparison {
    if reserved == 0 {
        return Comparison { status: CoverageStatus::NoReservations, utilization_percent: None };
    }

    let utilization = 100.0 * deployed as f64 / reserved as f64;
    let status = match deployed.cmp(&reserved) {
        std::cmp::Ordering::Equal => CoverageStatus::FullyCovered,
        std::cmp::Ordering::Less => CoverageStatus::UnderUtilized { surplus: reserved - deployed },
        std::cmp::Ordering::Greater => {
            CoverageStatus::OverAllocated { deficit: deployed - reserved }
        },
    };
    Comparison { status, utilization_percent: Some(utilization) }
}

/// Utilization with one decimal place, e.g. `"75.0%"`.
pub fn format_utilization(percent: f64) -> String {
    format!("{:.1}%", percent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_reservations_has_no_utilization() {
        for deployed in [0, 1, 1000] {
            let c = compare(deployed, 0);
            assert_eq!(c.status, CoverageStatus::NoReservations);
            assert_eq!(c.utilization_percent, None);
        }
    }

    #[test]
    fn test_equal_is_fully_covered() {
        let c = compare(200, 200);
        assert_eq!(c.status, CoverageStatus::FullyCovered);
        assert_eq!(c.status.surplus(), 0);
        assert_eq!(c.utilization_percent.map(format_utilization).as_deref(), Some("100.0%"));
    }

    #[test]
    fn test_under_utilized() {
        let c = compare(100, 200);
        assert_eq!(c.status, CoverageStatus::UnderUtilized { surplus: 100 });
        assert_eq!(c.utilization_percent.map(format_utilization).as_deref(), Some("50.0%"));
    }

    #[test]
    fn test_over_allocated() {
        let c = compare(250, 200);
        assert_eq!(c.status, CoverageStatus::OverAllocated { deficit: 50 });
        assert_eq!(c.utilization_percent.map(format_utilization).as_deref(), Some("125.0%"));
    }

    #[test]
    fn test_zero_deployed_with_reservations() {
        let c = compare(0, 10);
        assert_eq!(c.status, CoverageStatus::UnderUtilized { surplus: 10 });
        assert_eq!(c.utilization_percent.map(format_utilization).as_deref(), Some("0.0%"));
    }

    #[test]
    fn test_one_decimal_rounding() {
        assert_eq!(format_utilization(100.0 * 1.0 / 3.0), "33.3%");
        assert_eq!(format_utilization(100.0 * 2.0 / 3.0), "66.7%");
    }

    #[test]
    fn test_compare_is_idempotent() {
        assert_eq!(compare(150, 200), compare(150, 200));
        assert_eq!(compare(7, 0), compare(7, 0));
    }
}
