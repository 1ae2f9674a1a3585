//! Field validations for the ERP backend
//!
//! These complement the `validator` derives on backend input structs with the
//! checks that need domain knowledge: money precision, stock quantities and
//! account names.

use rust_decimal::Decimal;

// ============================================================================
// Money and Quantity Validations
// ============================================================================

/// Validate a money amount against a `NUMERIC(max_digits, decimal_places)` column.
///
/// Amounts must be non-negative, carry at most `decimal_places` fractional
/// digits and fit in `max_digits` total digits.
pub fn validate_money(
    amount: Decimal,
    max_digits: u32,
    decimal_places: u32,
) -> Result<(), &'static str> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err("Amount cannot be negative");
    }
    if amount.normalize().scale() > decimal_places {
        return Err("Amount has too many decimal places");
    }
    let whole_digits = amount.trunc().abs().to_string().trim_start_matches('0').len() as u32;
    if whole_digits > max_digits.saturating_sub(decimal_places) {
        return Err("Amount has too many digits");
    }
    Ok(())
}

/// Validate a unit price (`NUMERIC(10, 2)`)
pub fn validate_price(amount: Decimal) -> Result<(), &'static str> {
    validate_money(amount, 10, 2)
}

/// Validate an order or invoice total (`NUMERIC(12, 2)`)
pub fn validate_total(amount: Decimal) -> Result<(), &'static str> {
    validate_money(amount, 12, 2)
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err("Invalid email format");
    };
    if local.is_empty() || !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.')
    {
        return Err("Invalid email format");
    }
    Ok(())
}

/// Validate a login name: 1-150 characters of letters, digits and `@.+-_`
pub fn validate_username(username: &str) -> Result<(), &'static str> {
    if username.is_empty() {
        return Err("Username is required");
    }
    if username.chars().count() > 150 {
        return Err("Username must be at most 150 characters");
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err("Username may contain only letters, digits and @/./+/-/_");
    }
    Ok(())
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}

/// Validate a phone number: digits with optional `+`, spaces, dashes and parentheses
pub fn validate_phone(phone: &str, max_len: usize) -> Result<(), &'static str> {
    if phone.is_empty() {
        return Ok(());
    }
    if phone.len() > max_len {
        return Err("Phone number is too long");
    }
    if !phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')'))
    {
        return Err("Invalid phone number format");
    }
    if !phone.chars().any(|c| c.is_ascii_digit()) {
        return Err("Invalid phone number format");
    }
    Ok(())
}

/// Validate a purchase order number: 1-50 characters without whitespace
pub fn validate_order_number(order_number: &str) -> Result<(), &'static str> {
    if order_number.is_empty() {
        return Err("Order number is required");
    }
    if order_number.len() > 50 {
        return Err("Order number must be at most 50 characters");
    }
    if order_number.chars().any(char::is_whitespace) {
        return Err("Order number cannot contain whitespace");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    // ========================================================================
    // Money and Quantity Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_price_valid() {
        assert!(validate_price(dec("0")).is_ok());
        assert!(validate_price(dec("5.00")).is_ok());
        assert!(validate_price(dec("12.5")).is_ok());
        assert!(validate_price(dec("99999999.99")).is_ok());
    }

    #[test]
    fn test_validate_price_trailing_zeros_allowed() {
        assert!(validate_price(dec("5.000")).is_ok());
    }

    #[test]
    fn test_validate_price_invalid() {
        assert!(validate_price(dec("-0.01")).is_err());
        assert!(validate_price(dec("1.005")).is_err());
        assert!(validate_price(dec("100000000.00")).is_err());
    }

    #[test]
    fn test_validate_total_wider_than_price() {
        assert!(validate_total(dec("100000000.00")).is_ok());
        assert!(validate_total(dec("10000000000.00")).is_err());
    }

    // ========================================================================
    // General Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_email_valid() {
        assert!(validate_email("buyer@example.com").is_ok());
        assert!(validate_email("first.last@vendor.co.in").is_ok());
    }

    #[test]
    fn test_validate_email_invalid() {
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("no@domain").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("a@.com").is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("admin").is_ok());
        assert!(validate_username("store.manager+1@hq").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"a".repeat(151)).is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("password123").is_ok());
        assert!(validate_password("12345678").is_ok());
        assert!(validate_password("short").is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("", 20).is_ok());
        assert!(validate_phone("+91 98765-43210", 20).is_ok());
        assert!(validate_phone("(022) 2345 6789", 20).is_ok());
        assert!(validate_phone("call me", 20).is_err());
        assert!(validate_phone("---", 20).is_err());
        assert!(validate_phone("+91 98765 43210 1234", 15).is_err());
    }

    #[test]
    fn test_validate_order_number() {
        assert!(validate_order_number("PO-2024-0001").is_ok());
        assert!(validate_order_number("").is_err());
        assert!(validate_order_number("PO 1").is_err());
        assert!(validate_order_number(&"X".repeat(51)).is_err());
    }
}
