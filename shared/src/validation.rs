//! Validation utilities for account and product input

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.contains('@') && email.contains('.') && email.len() >= 5 {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}

/// Validate a product name is present
pub fn validate_product_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Product name is required");
    }
    Ok(())
}

/// Validate a SKU is present and has no surrounding whitespace
pub fn validate_sku(sku: &str) -> Result<(), &'static str> {
    if sku.trim().is_empty() {
        return Err("SKU is required");
    }
    if sku != sku.trim() {
        return Err("SKU cannot start or end with whitespace");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plausible_emails() {
        assert!(validate_email("worker@example.com").is_ok());
        assert!(validate_email("a@b.co").is_ok());
    }

    #[test]
    fn rejects_malformed_emails() {
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("a@b").is_err());
        assert!(validate_email("@.").is_err());
    }

    #[test]
    fn password_needs_eight_characters() {
        assert!(validate_password("password123").is_ok());
        assert!(validate_password("123").is_err());
        assert!(validate_password("1234567").is_err());
        assert!(validate_password("12345678").is_ok());
    }

    #[test]
    fn product_name_must_be_present() {
        assert!(validate_product_name("Steel Bolts").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name("   ").is_err());
    }

    #[test]
    fn sku_must_be_present_and_trimmed() {
        assert!(validate_sku("WH-001").is_ok());
        assert!(validate_sku("").is_err());
        assert!(validate_sku(" WH-001").is_err());
        assert!(validate_sku("WH-001 ").is_err());
    }
}
