use std::fmt;

/// Provider environment the deployment is wired against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayEnvironment {
    Sandbox,
    Production,
}

impl fmt::Display for GatewayEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayEnvironment::Sandbox => f.write_str("sandbox"),
            GatewayEnvironment::Production => f.write_str("production"),
        }
    }
}

/// Fixed provider configuration.
///
/// The defaults are the sandbox constants this deployment ships with:
/// merchant app id, environment, and the deep-link the provider
/// redirects back to once the on-device session ends.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    /// Merchant application id registered with the provider.
    pub app_id: u32,
    pub environment: GatewayEnvironment,
    /// Callback URL handed to every `pay_order` session.
    pub callback_url: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            app_id: 2553,
            environment: GatewayEnvironment::Sandbox,
            callback_url: "demozpdk://app".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_sandbox() {
        let config = GatewayConfig::default();
        assert_eq!(config.environment, GatewayEnvironment::Sandbox);
        assert_eq!(config.app_id, 2553);
        assert_eq!(config.callback_url, "demozpdk://app");
    }
}
