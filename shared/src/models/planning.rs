//! Demand, consumption and reconciliation models

/// Difference between a physical count and the recorded stock.
///
/// Positive when more was counted than the system holds.
pub fn reconciliation_variance(actual_quantity: i32, system_quantity: i32) -> i64 {
    i64::from(actual_quantity) - i64::from(system_quantity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variance_sign() {
        assert_eq!(reconciliation_variance(12, 10), 2);
        assert_eq!(reconciliation_variance(7, 10), -3);
        assert_eq!(reconciliation_variance(10, 10), 0);
    }

    #[test]
    fn test_variance_does_not_overflow() {
        assert_eq!(
            reconciliation_variance(0, i32::MAX),
            -(i32::MAX as i64)
        );
    }
}
