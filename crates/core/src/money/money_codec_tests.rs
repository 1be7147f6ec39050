//! Tests for the fixed-point money and quantity codec.

#[cfg(test)]
mod tests {
    use crate::money::{
        currency_minor_digits, from_minor_units, from_nano_units, to_minor_units, to_nano_units,
    };
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    // ==================== Currency scale ====================

    #[test]
    fn test_zero_decimal_currencies() {
        assert_eq!(currency_minor_digits("KRW"), 0);
        assert_eq!(currency_minor_digits("JPY"), 0);
    }

    #[test]
    fn test_unknown_currency_defaults_to_two_decimals() {
        assert_eq!(currency_minor_digits("CHF"), 2);
        assert_eq!(currency_minor_digits("XYZ"), 2);
    }

    // ==================== to_minor_units ====================

    #[test]
    fn test_usd_amount_is_scaled_to_cents() {
        assert_eq!(to_minor_units(dec!(10.5), "USD"), 1050);
    }

    #[test]
    fn test_krw_amount_is_not_scaled() {
        assert_eq!(to_minor_units(dec!(1000), "KRW"), 1000);
        assert_eq!(to_minor_units(dec!(1000000), "KRW"), 1_000_000);
    }

    #[test]
    fn test_rounding_is_half_away_from_zero() {
        assert_eq!(to_minor_units(dec!(0.005), "USD"), 1);
        assert_eq!(to_minor_units(dec!(-0.005), "USD"), -1);
        assert_eq!(to_minor_units(dec!(0.0049), "USD"), 0);
        assert_eq!(to_minor_units(dec!(1000.5), "KRW"), 1001);
        assert_eq!(to_minor_units(dec!(-1000.5), "KRW"), -1001);
        assert_eq!(to_minor_units(dec!(1000.49), "JPY"), 1000);
    }

    #[test]
    fn test_negative_amounts_keep_sign() {
        assert_eq!(to_minor_units(dec!(-12.34), "EUR"), -1234);
    }

    // ==================== Nano units ====================

    #[test]
    fn test_quantity_is_scaled_to_nano_units() {
        assert_eq!(to_nano_units(dec!(1)), 1_000_000_000);
        assert_eq!(to_nano_units(dec!(0.5)), 500_000_000);
        assert_eq!(to_nano_units(dec!(12.123456789)), 12_123_456_789);
    }

    #[test]
    fn test_quantity_beyond_nine_digits_is_rounded() {
        assert_eq!(to_nano_units(dec!(1.0000000004)), 1_000_000_000);
        assert_eq!(to_nano_units(dec!(1.0000000005)), 1_000_000_001);
        assert_eq!(to_nano_units(dec!(-1.0000000005)), -1_000_000_001);
    }

    #[test]
    fn test_largest_decimal_fits_in_nano_units() {
        let nano = to_nano_units(Decimal::MAX);
        assert_eq!(nano, Decimal::MAX.mantissa() * 1_000_000_000);
    }

    #[test]
    fn test_nano_units_out_of_decimal_range_fail_to_decode() {
        assert!(from_nano_units(i128::MAX).is_err());
        assert!(from_minor_units(i128::MIN, "USD").is_err());
    }

    // ==================== Round trips ====================

    #[test]
    fn test_minor_units_round_trip_within_currency_precision() {
        let cases = [
            (dec!(10.5), "USD", dec!(10.5)),
            (dec!(0.01), "EUR", dec!(0.01)),
            (dec!(1234.567), "USD", dec!(1234.57)),
            (dec!(1000), "KRW", dec!(1000)),
            (dec!(999.4), "JPY", dec!(999)),
        ];

        for (amount, currency, expected) in cases {
            let minor = to_minor_units(amount, currency);
            let back = from_minor_units(minor, currency).unwrap();
            assert_eq!(back, expected, "{} {}", amount, currency);
        }
    }

    #[test]
    fn test_conversion_is_idempotent() {
        let amounts = [dec!(10.5), dec!(-3.335), dec!(0.004), dec!(1000000), dec!(42.42)];
        for currency in ["USD", "KRW", "JPY", "GBP"] {
            for amount in amounts {
                let first = to_minor_units(amount, currency);
                let decoded = from_minor_units(first, currency).unwrap();
                let second = to_minor_units(decoded, currency);
                assert_eq!(first, second, "{} {}", amount, currency);
            }
        }
    }

    #[test]
    fn test_nano_units_round_trip() {
        let quantity = dec!(3.141592653);
        let nano = to_nano_units(quantity);
        assert_eq!(from_nano_units(nano).unwrap(), quantity);
        assert_eq!(to_nano_units(from_nano_units(nano).unwrap()), nano);
    }
}
