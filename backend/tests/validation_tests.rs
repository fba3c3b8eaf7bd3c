//! Account and product input validation tests
//!
//! Covers registration input rules, SKU hygiene, and role handling.

use proptest::prelude::*;
use shared::{validate_email, validate_password, validate_product_name, validate_sku, Role};

// ============================================================================
// Property Test Strategies
// ============================================================================

/// Generate plausible email addresses
fn email_strategy() -> impl Strategy<Value = String> {
    "[a-z]{3,10}@[a-z]{3,8}\\.(com|org|net|co)"
}

/// Generate valid passwords (8+ chars)
fn password_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9!@#$%]{8,20}"
}

/// Generate passwords that are too short
fn short_password_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9]{0,7}"
}

/// Generate warehouse-style SKUs
fn sku_strategy() -> impl Strategy<Value = String> {
    "[A-Z]{2,4}-[0-9]{3,5}"
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn email_needs_at_sign_and_dot() {
        assert!(validate_email("worker@warehouse.example").is_ok());
        assert!(validate_email("worker").is_err());
        assert!(validate_email("worker@warehouse").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn password_minimum_is_eight() {
        assert!(validate_password("12345678").is_ok());
        assert!(validate_password("1234567").is_err());
        assert_eq!(
            validate_password("short").unwrap_err(),
            "Password must be at least 8 characters"
        );
    }

    #[test]
    fn product_name_cannot_be_blank() {
        assert!(validate_product_name("Steel Bolts M8").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name("  \t ").is_err());
    }

    #[test]
    fn sku_rejects_surrounding_whitespace() {
        assert!(validate_sku("WH-001").is_ok());
        assert!(validate_sku(" WH-001").is_err());
        assert!(validate_sku("WH-001 ").is_err());
        assert!(validate_sku("").is_err());
    }

    #[test]
    fn new_accounts_default_to_user_role() {
        assert_eq!(Role::default(), Role::User);
        assert!(!Role::default().is_admin());
        assert!(Role::Admin.is_admin());
    }

    #[test]
    fn role_parses_database_values() {
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Every generated email passes validation
        #[test]
        fn prop_generated_emails_validate(email in email_strategy()) {
            prop_assert!(validate_email(&email).is_ok());
        }

        /// Passwords of eight or more characters always pass
        #[test]
        fn prop_long_passwords_validate(password in password_strategy()) {
            prop_assert!(validate_password(&password).is_ok());
        }

        /// Passwords under eight characters never pass
        #[test]
        fn prop_short_passwords_rejected(password in short_password_strategy()) {
            prop_assert!(validate_password(&password).is_err());
        }

        /// Warehouse SKUs validate and survive trimming unchanged
        #[test]
        fn prop_skus_validate(sku in sku_strategy()) {
            prop_assert!(validate_sku(&sku).is_ok());
            prop_assert_eq!(sku.trim(), sku.as_str());
        }

        /// Padding a SKU with whitespace always fails validation
        #[test]
        fn prop_padded_skus_rejected(sku in sku_strategy()) {
            let leading = format!(" {}", sku);
            let trailing = format!("{} ", sku);
            prop_assert!(validate_sku(&leading).is_err());
            prop_assert!(validate_sku(&trailing).is_err());
        }

        /// Role string round trip is lossless
        #[test]
        fn prop_role_round_trip(role in prop_oneof![Just(Role::User), Just(Role::Admin)]) {
            let parsed: Role = role.as_str().parse().unwrap();
            prop_assert_eq!(parsed, role);
        }
    }
}
