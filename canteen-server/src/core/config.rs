use rust_decimal::Decimal;

/// Server configuration.
///
/// # Environment variables
///
/// | Variable | Default | Notes |
/// |----------|---------|-------|
/// | HTTP_PORT | 3000 | HTTP API port |
/// | DATABASE_PATH | ./canteen.db | SQLite file path |
/// | ENVIRONMENT | development | development \| staging \| production |
/// | TAX_RATE | 0.05 | fraction of subtotal, decimal string |
/// | LOW_STOCK_THRESHOLD | 5 | at-or-below quantity that derives an alert |
/// | PICKUP_MIN_LEAD_MINUTES | 15 | earliest pickup relative to now |
/// | PICKUP_MAX_HORIZON_HOURS | 168 | latest pickup relative to now |
/// | LOG_DIR | (unset) | daily-rolling file output when set |
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API port
    pub http_port: u16,
    /// SQLite database file path
    pub database_path: String,
    /// Runtime environment: development | staging | production
    pub environment: String,
    /// Tax rate applied to the order subtotal (e.g. 0.05 = 5%)
    pub tax_rate: Decimal,
    /// Quantity at or below which a low-stock alert is derived (while > 0)
    pub low_stock_threshold: i64,
    /// Minimum lead time between checkout and pickup, in minutes
    pub pickup_min_lead_minutes: i64,
    /// Maximum pickup horizon, in hours
    pub pickup_max_horizon_hours: i64,
    /// Optional log directory (daily-rolling file output)
    pub log_dir: Option<String>,
}

fn default_tax_rate() -> Decimal {
    // 0.05
    Decimal::new(5, 2)
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "./canteen.db".into()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            tax_rate: std::env::var("TAX_RATE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_tax_rate),
            low_stock_threshold: std::env::var("LOW_STOCK_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            pickup_min_lead_minutes: std::env::var("PICKUP_MIN_LEAD_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(15),
            pickup_max_horizon_hours: std::env::var("PICKUP_MAX_HORIZON_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(168),
            log_dir: std::env::var("LOG_DIR").ok(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 3000,
            database_path: "./canteen.db".into(),
            environment: "development".into(),
            tax_rate: default_tax_rate(),
            low_stock_threshold: 5,
            pickup_min_lead_minutes: 15,
            pickup_max_horizon_hours: 168,
            log_dir: None,
        }
    }
}
