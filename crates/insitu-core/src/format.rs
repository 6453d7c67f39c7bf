//! Human-scaled display strings for stock amounts.
//!
//! Prefixes switch at 900 of the smaller unit rather than 1000, so a value
//! never reads as `999.99` just before rolling over.

const MEGA_THRESHOLD: f64 = 900_000.0;
const KILO_THRESHOLD: f64 = 900.0;
const BASE_THRESHOLD: f64 = 0.9;
const MILLI_THRESHOLD: f64 = 0.0009;

/// Format an amount with a metric prefix: `1234.0, "g"` -> `"1.23 kg"`.
///
/// Non-zero amounts below a thousandth of a milli-unit read `"negligible"`.
pub fn format_amount(amount: f64, unit: &str) -> String {
    if amount == 0.0 {
        format!("0.00 {unit}")
    } else if amount >= MEGA_THRESHOLD {
        format!("{:.2} M{unit}", amount / 1_000_000.0)
    } else if amount >= KILO_THRESHOLD {
        format!("{:.2} k{unit}", amount / 1_000.0)
    } else if amount >= BASE_THRESHOLD {
        format!("{amount:.2} {unit}")
    } else if amount >= MILLI_THRESHOLD {
        format!("{:.2} m{unit}", amount * 1_000.0)
    } else {
        "negligible".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero() {
        assert_eq!(format_amount(0.0, "g"), "0.00 g");
    }

    #[test]
    fn mega() {
        assert_eq!(format_amount(1_234_567.0, "g"), "1.23 Mg");
    }

    #[test]
    fn kilo() {
        assert_eq!(format_amount(1234.0, "g"), "1.23 kg");
    }

    #[test]
    fn base() {
        assert_eq!(format_amount(1.23, "g"), "1.23 g");
        assert_eq!(format_amount(512.0, "J"), "512.00 J");
    }

    #[test]
    fn milli() {
        assert_eq!(format_amount(0.00123, "g"), "1.23 mg");
    }

    #[test]
    fn negligible() {
        assert_eq!(format_amount(0.0001, "g"), "negligible");
    }

    #[test]
    fn thresholds_switch_at_nine_hundred() {
        assert_eq!(format_amount(900.0, "g"), "0.90 kg");
        assert_eq!(format_amount(899.0, "g"), "899.00 g");
        assert_eq!(format_amount(900_000.0, "g"), "0.90 Mg");
        assert_eq!(format_amount(0.9, "g"), "0.90 g");
        assert_eq!(format_amount(0.0009, "g"), "0.90 mg");
    }

    #[test]
    fn formatting_is_idempotent() {
        let a = format_amount(4321.5, "J");
        let b = format_amount(4321.5, "J");
        assert_eq!(a, b);
    }
}
