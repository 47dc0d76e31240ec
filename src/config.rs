use crate::error::{Error, Result};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub num_threads: Option<usize>,
    pub stack_size: Option<usize>,
    pub thread_name_prefix: String,
    pub park_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_threads: None,
            stack_size: Some(2 * 1024 * 1024),
            thread_name_prefix: "stratus-worker".to_string(),
            park_timeout: Duration::from_millis(10),
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(n) = self.num_threads {
            if n == 0 {
                return Err(Error::config("num_threads must be > 0"));
            }
            if n > 1024 {
                return Err(Error::config("num_threads too large (max 1024)"));
            }
        }

        if self.park_timeout.is_zero() {
            return Err(Error::config("park_timeout must be non-zero"));
        }

        Ok(())
    }

    pub fn worker_threads(&self) -> usize {
        self.num_threads.unwrap_or_else(num_cpus::get)
    }
}

#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn num_threads(mut self, n: usize) -> Self {
        self.config.num_threads = Some(n);
        self
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    pub fn thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    pub fn park_timeout(mut self, timeout: Duration) -> Self {
        self.config.park_timeout = timeout;
        self
    }

    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
