use super::{types::Config, ConfigError};

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Batch and page sizes, intervals are positive
/// - Advisory upgrade threshold does not exceed the apply threshold
/// - The scoring table is monotonic and its size penalty cannot flip a resolution tier
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(invalid("server.port cannot be 0"));
    }

    let checker = &config.checker;
    if checker.batch_size == 0 {
        return Err(invalid("checker.batch_size must be greater than 0"));
    }
    if checker.interval_minutes == 0 {
        return Err(invalid("checker.interval_minutes must be greater than 0"));
    }
    if checker.recheck_after_days <= 0 || checker.unavailable_retry_days <= 0 {
        return Err(invalid(
            "checker.recheck_after_days and checker.unavailable_retry_days must be greater than 0",
        ));
    }
    if checker.advisory_upgrade_points > checker.min_upgrade_points {
        return Err(invalid(
            "checker.advisory_upgrade_points cannot exceed checker.min_upgrade_points",
        ));
    }

    let scanner = &config.scanner;
    if scanner.page_size == 0 {
        return Err(invalid("scanner.page_size must be greater than 0"));
    }
    if scanner.interval_hours == 0 {
        return Err(invalid("scanner.interval_hours must be greater than 0"));
    }
    if scanner.progress_every == 0 {
        return Err(invalid("scanner.progress_every must be greater than 0"));
    }

    if config.debrid.batch_size == 0 {
        return Err(invalid("debrid.batch_size must be greater than 0"));
    }
    if config.debrid.timeout_secs == 0 || config.provider.timeout_secs == 0 {
        return Err(invalid("debrid and provider timeouts must be greater than 0"));
    }

    config
        .scoring
        .validate()
        .map_err(|e| invalid(format!("scoring: {}", e)))?;

    Ok(())
}
