use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry policy for assignment attempts.
///
/// Defaults to one attempt per second with no bound on attempts or
/// wall-clock time. Production deployments should set at least one bound so
/// an assignment against a room that never materializes terminates instead
/// of polling forever.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignConfig {
    /// Delay between store attempts.
    pub retry_interval: Duration,
    /// Give up after this many attempts (`None` = unbounded).
    pub max_attempts: Option<u32>,
    /// Give up once the next attempt could not start within this budget
    /// (`None` = unbounded).
    pub max_wait: Option<Duration>,
}

impl Default for AssignConfig {
    fn default() -> Self {
        Self {
            retry_interval: Duration::from_millis(1000),
            max_attempts: None,
            max_wait: None,
        }
    }
}

impl AssignConfig {
    /// Create a new builder for AssignConfig
    pub fn builder() -> AssignConfigBuilder {
        AssignConfigBuilder::new()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.retry_interval.is_zero() {
            return Err("retry_interval must be greater than zero".to_string());
        }
        if self.max_attempts == Some(0) {
            return Err("max_attempts must be greater than 0 when set".to_string());
        }
        if let Some(max_wait) = self.max_wait {
            if max_wait < self.retry_interval {
                return Err("max_wait cannot be smaller than retry_interval".to_string());
            }
        }
        Ok(())
    }
}

/// Builder for AssignConfig
pub struct AssignConfigBuilder {
    config: AssignConfig,
}

impl AssignConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            config: AssignConfig::default(),
        }
    }

    /// Set the delay between attempts
    pub fn retry_interval(mut self, interval: Duration) -> Self {
        self.config.retry_interval = interval;
        self
    }

    /// Bound the number of attempts
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = Some(attempts);
        self
    }

    /// Bound the total wall-clock wait
    pub fn max_wait(mut self, wait: Duration) -> Self {
        self.config.max_wait = Some(wait);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<AssignConfig, String> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AssignConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retry_interval, Duration::from_millis(1000));
        assert_eq!(config.max_attempts, None);
        assert_eq!(config.max_wait, None);
    }

    #[test]
    fn test_validation_errors() {
        let mut config = AssignConfig::default();

        config.retry_interval = Duration::ZERO;
        assert!(config.validate().is_err());
        config.retry_interval = Duration::from_millis(100);

        config.max_attempts = Some(0);
        assert!(config.validate().is_err());
        config.max_attempts = Some(5);

        config.max_wait = Some(Duration::from_millis(50));
        assert!(config.validate().is_err());
        config.max_wait = Some(Duration::from_secs(10));

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = AssignConfig::builder()
            .retry_interval(Duration::from_millis(250))
            .max_attempts(10)
            .max_wait(Duration::from_secs(30))
            .build()
            .unwrap();

        assert_eq!(config.retry_interval, Duration::from_millis(250));
        assert_eq!(config.max_attempts, Some(10));
        assert_eq!(config.max_wait, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_builder_rejects_invalid() {
        let result = AssignConfig::builder()
            .retry_interval(Duration::ZERO)
            .build();
        assert!(result.is_err());
    }
}
