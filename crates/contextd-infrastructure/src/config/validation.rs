//! Post-extraction config validation (spec §7: an invalid value is a fatal
//! startup error naming the offending key).
//!
//! Grounded on the teacher's `config/validation.rs`'s `validate_app_config`
//! shape: one function, one early-return per invariant.

use contextd_domain::error::{Error, Result};

use super::ContextdConfig;

pub fn validate(config: &ContextdConfig) -> Result<()> {
    if config.server.port == 0 {
        return Err(Error::config("server.port", "must be nonzero"));
    }
    if !(0.0..=1.0).contains(&config.distiller.threshold) {
        return Err(Error::config("distiller.threshold", "must be in [0, 1]"));
    }
    if config.distiller.window_secs < 0 {
        return Err(Error::config("distiller.window_secs", "must be nonnegative"));
    }
    if config.distiller.schedule_interval_secs <= 0 {
        return Err(Error::config("distiller.schedule_interval_secs", "must be positive"));
    }
    if config.vectorstore.retry_attempts == 0 {
        return Err(Error::config("vectorstore.retry_attempts", "must be at least 1"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate(&ContextdConfig::default()).is_ok());
    }

    #[test]
    fn zero_port_is_rejected() {
        let mut config = ContextdConfig::default();
        config.server.port = 0;
        assert!(matches!(validate(&config), Err(Error::Config { .. })));
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let mut config = ContextdConfig::default();
        config.distiller.threshold = 1.5;
        assert!(matches!(validate(&config), Err(Error::Config { .. })));
    }
}
