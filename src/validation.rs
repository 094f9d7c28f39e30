use validator::ValidationError;

/// Validates that an amount is positive (greater than 0)
pub fn validate_positive_amount(amount: &rust_decimal::Decimal) -> Result<(), ValidationError> {
    if *amount <= rust_decimal::Decimal::ZERO {
        let mut error = ValidationError::new("invalid_amount");
        error.message = Some("Amount must be greater than 0".into());
        return Err(error);
    }
    Ok(())
}

/// Option-aware variant for partial updates; an absent amount is valid
pub fn validate_optional_positive_amount(
    amount: &Option<rust_decimal::Decimal>,
) -> Result<(), ValidationError> {
    match amount {
        Some(amount) => validate_positive_amount(amount),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn test_positive_amount_is_accepted() {
        assert!(validate_positive_amount(&Decimal::from_str("0.01").unwrap()).is_ok());
        assert!(validate_positive_amount(&Decimal::from_str("42.50").unwrap()).is_ok());
    }

    #[test]
    fn test_optional_amount_validates_only_when_present() {
        assert!(validate_optional_positive_amount(&None).is_ok());
        assert!(
            validate_optional_positive_amount(&Some(Decimal::from_str("42.50").unwrap())).is_ok()
        );
        assert!(validate_optional_positive_amount(&Some(Decimal::ZERO)).is_err());
        assert!(
            validate_optional_positive_amount(&Some(Decimal::from_str("-5").unwrap())).is_err()
        );
    }

    #[test]
    fn test_zero_and_negative_amounts_are_rejected() {
        assert!(validate_positive_amount(&Decimal::ZERO).is_err());
        assert!(validate_positive_amount(&Decimal::from_str("-5").unwrap()).is_err());
    }
}
