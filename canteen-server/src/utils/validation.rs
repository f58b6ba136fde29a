//! Input validation helpers
//!
//! Small, composable checks used by the services before anything touches
//! the database. Each returns `Result<(), String>` with a human-readable
//! message; callers wrap into the error type of their layer.

use chrono::{DateTime, Duration, Utc};

/// Maximum length for names (menu items, canteens)
pub const MAX_NAME_LEN: usize = 200;

/// Maximum length for free-text fields (descriptions, order notes)
pub const MAX_NOTE_LEN: usize = 500;

/// Largest quantity accepted in a single cart line or stock write
pub const MAX_QUANTITY: i64 = 9999;

/// Validate a required text field (non-empty after trim, within max length)
pub fn validate_required_text(value: &str, field_name: &str, max_len: usize) -> Result<(), String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{} cannot be empty", field_name));
    }
    if trimmed.len() > max_len {
        return Err(format!(
            "{} is too long (max {} characters)",
            field_name, max_len
        ));
    }
    Ok(())
}

/// Validate an optional text field (within max length when present)
pub fn validate_optional_text(
    value: Option<&str>,
    field_name: &str,
    max_len: usize,
) -> Result<(), String> {
    if let Some(v) = value
        && v.trim().len() > max_len
    {
        return Err(format!(
            "{} is too long (max {} characters)",
            field_name, max_len
        ));
    }
    Ok(())
}

/// Validate a positive quantity within the accepted range
pub fn validate_quantity(quantity: i64, field_name: &str) -> Result<(), String> {
    if quantity <= 0 {
        return Err(format!("{} must be positive", field_name));
    }
    if quantity > MAX_QUANTITY {
        return Err(format!("{} exceeds the maximum of {}", field_name, MAX_QUANTITY));
    }
    Ok(())
}

/// Validate a price in minor units (non-negative, sane upper bound)
pub fn validate_price_cents(price_cents: i64) -> Result<(), String> {
    if price_cents < 0 {
        return Err("price cannot be negative".to_string());
    }
    // 100_000.00 in minor units
    if price_cents > 10_000_000 {
        return Err("price exceeds the accepted maximum".to_string());
    }
    Ok(())
}

/// Validate a requested pickup time against the ordering window:
/// at least `min_lead_minutes` from now, at most `max_horizon_hours` ahead.
pub fn validate_pickup_time(
    pickup_at: DateTime<Utc>,
    now: DateTime<Utc>,
    min_lead_minutes: i64,
    max_horizon_hours: i64,
) -> Result<(), String> {
    if pickup_at < now + Duration::minutes(min_lead_minutes) {
        return Err(format!(
            "pickup time must be at least {} minutes from now",
            min_lead_minutes
        ));
    }
    if pickup_at > now + Duration::hours(max_horizon_hours) {
        return Err(format!(
            "pickup time cannot be more than {} hours ahead",
            max_horizon_hours
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_text_rejects_blank_and_oversized() {
        assert!(validate_required_text("Veg Thali", "name", MAX_NAME_LEN).is_ok());
        assert!(validate_required_text("   ", "name", MAX_NAME_LEN).is_err());
        assert!(validate_required_text(&"x".repeat(201), "name", MAX_NAME_LEN).is_err());
    }

    #[test]
    fn quantity_bounds() {
        assert!(validate_quantity(1, "quantity").is_ok());
        assert!(validate_quantity(MAX_QUANTITY, "quantity").is_ok());
        assert!(validate_quantity(0, "quantity").is_err());
        assert!(validate_quantity(-3, "quantity").is_err());
        assert!(validate_quantity(MAX_QUANTITY + 1, "quantity").is_err());
    }

    #[test]
    fn pickup_window_edges() {
        let now = Utc::now();
        assert!(validate_pickup_time(now + Duration::minutes(20), now, 15, 168).is_ok());
        assert!(validate_pickup_time(now + Duration::minutes(5), now, 15, 168).is_err());
        assert!(validate_pickup_time(now + Duration::hours(200), now, 15, 168).is_err());
    }
}
