use serde::{Deserialize, Serialize};
use thiserror::Error;
use warren_bus::{FlatMemory, RouterTiming};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid fabric configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{what} latencies add up to more than u64::MAX ns")]
    LatencyOverflow { what: &'static str },
}

/// What the builder does when a binding request fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildPolicy {
    /// The first failed binding fails the build.
    #[default]
    AbortOnError,
    /// Failed bindings are logged, recorded on the platform and skipped.
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RouterConfig {
    pub pre_dispatch_ns: u64,
    pub post_dispatch_ns: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        let timing = RouterTiming::default();
        Self {
            pre_dispatch_ns: timing.pre_dispatch_ns,
            post_dispatch_ns: timing.post_dispatch_ns,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MemoryConfig {
    pub read_latency_ns: u64,
    pub write_latency_ns: u64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            read_latency_ns: FlatMemory::DEFAULT_READ_LATENCY_NS,
            write_latency_ns: FlatMemory::DEFAULT_WRITE_LATENCY_NS,
        }
    }
}

/// Timing and build behaviour shared by every component of a platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FabricConfig {
    pub router: RouterConfig,
    pub memory: MemoryConfig,
    pub build_policy: BuildPolicy,
}

impl FabricConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self
            .router
            .pre_dispatch_ns
            .checked_add(self.router.post_dispatch_ns)
            .is_none()
        {
            return Err(ConfigError::LatencyOverflow { what: "router" });
        }
        if self
            .memory
            .read_latency_ns
            .checked_add(self.memory.write_latency_ns)
            .is_none()
        {
            return Err(ConfigError::LatencyOverflow { what: "memory" });
        }
        Ok(())
    }

    pub fn router_timing(&self) -> RouterTiming {
        RouterTiming {
            pre_dispatch_ns: self.router.pre_dispatch_ns,
            post_dispatch_ns: self.router.post_dispatch_ns,
        }
    }
}
