use std::env;

use chrono::Duration;
use commerce_engine::pricing::PricingConfig;
use log::*;
use scg_common::{parse_boolean_flag, Money, Secret};

const DEFAULT_SCG_HOST: &str = "127.0.0.1";
const DEFAULT_SCG_PORT: u16 = 8360;
const DEFAULT_PENDING_ORDER_TIMEOUT: Duration = Duration::hours(48);
const DEFAULT_EXPIRY_CHECK_INTERVAL_SECS: u64 = 600;
const DEFAULT_HMAC_HEADER: &str = "x-payment-signature";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// Verification settings for the payment-provider webhook.
    pub webhook: WebhookConfig,
    /// Shipping/tax tunables handed to the checkout API. Deployments override these per market.
    pub pricing: PricingConfig,
    /// How long a pending order may go unpaid before the expiry worker cancels it and restores its stock.
    pub pending_order_timeout: Duration,
    /// How often the expiry worker wakes up.
    pub expiry_check_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SCG_HOST.to_string(),
            port: DEFAULT_SCG_PORT,
            database_url: String::default(),
            auth: AuthConfig::default(),
            webhook: WebhookConfig::default(),
            pricing: PricingConfig::default(),
            pending_order_timeout: DEFAULT_PENDING_ORDER_TIMEOUT,
            expiry_check_interval_secs: DEFAULT_EXPIRY_CHECK_INTERVAL_SECS,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SCG_HOST").ok().unwrap_or_else(|| DEFAULT_SCG_HOST.into());
        let port = env::var("SCG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for SCG_PORT. {e} Using the default, {DEFAULT_SCG_PORT}, instead."
                    );
                    DEFAULT_SCG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SCG_PORT);
        let database_url = env::var("SCG_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ SCG_DATABASE_URL is not set. Please set it to the URL for the gateway database.");
            String::default()
        });
        let pending_order_timeout = env::var("SCG_PENDING_ORDER_TIMEOUT")
            .map_err(|_| {
                info!(
                    "🪛️ SCG_PENDING_ORDER_TIMEOUT is not set. Using the default value of {} hrs.",
                    DEFAULT_PENDING_ORDER_TIMEOUT.num_hours()
                )
            })
            .and_then(|s| {
                s.parse::<i64>()
                    .map(Duration::hours)
                    .map_err(|e| warn!("🪛️ Invalid configuration value for SCG_PENDING_ORDER_TIMEOUT. {e}"))
            })
            .ok()
            .unwrap_or(DEFAULT_PENDING_ORDER_TIMEOUT);
        let expiry_check_interval_secs = env::var("SCG_EXPIRY_CHECK_INTERVAL")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_EXPIRY_CHECK_INTERVAL_SECS);
        Self {
            host,
            port,
            database_url,
            auth: AuthConfig::from_env_or_default(),
            webhook: WebhookConfig::from_env_or_default(),
            pricing: pricing_from_env(),
            pending_order_timeout,
            expiry_check_interval_secs,
        }
    }
}

/// Pricing tunables, in whole currency units for the money fields (SCG_FREE_SHIPPING_THRESHOLD=5000 means 5000.00).
fn pricing_from_env() -> PricingConfig {
    let defaults = PricingConfig::default();
    let money_var = |name: &str, default: Money| {
        env::var(name)
            .ok()
            .and_then(|s| {
                s.parse::<i64>()
                    .map_err(|e| warn!("🪛️ Ignoring invalid value for {name}: {e}"))
                    .ok()
                    .map(Money::from_major)
            })
            .unwrap_or(default)
    };
    let free_shipping_threshold = money_var("SCG_FREE_SHIPPING_THRESHOLD", defaults.free_shipping_threshold);
    let flat_shipping_fee = money_var("SCG_FLAT_SHIPPING_FEE", defaults.flat_shipping_fee);
    let tax_rate_bp = env::var("SCG_TAX_RATE_BP")
        .ok()
        .and_then(|s| s.parse::<i64>().map_err(|e| warn!("🪛️ Ignoring invalid value for SCG_TAX_RATE_BP: {e}")).ok())
        .unwrap_or(defaults.tax_rate_bp);
    PricingConfig { free_shipping_threshold, flat_shipping_fee, tax_rate_bp }
}

//-------------------------------------------------  AuthConfig  ------------------------------------------------------
/// JWT verification settings. Tokens are *issued* by the external auth service; this server only validates them,
/// using a shared HS256 secret.
#[derive(Clone, Debug, Default)]
pub struct AuthConfig {
    pub jwt_secret: Secret<String>,
}

impl AuthConfig {
    pub fn from_env_or_default() -> Self {
        let jwt_secret = env::var("SCG_JWT_SECRET").ok().unwrap_or_else(|| {
            warn!(
                "🚨️🚨️🚨️ SCG_JWT_SECRET is not set. Every authenticated request will be rejected. Set it to the \
                 shared secret of the auth service before running in production. 🚨️🚨️🚨️"
            );
            String::default()
        });
        Self { jwt_secret: Secret::new(jwt_secret) }
    }
}

//-------------------------------------------------  WebhookConfig  ---------------------------------------------------
#[derive(Clone, Debug)]
pub struct WebhookConfig {
    /// Secret shared with the payment provider, used to verify the HMAC signature over the raw request body.
    pub hmac_secret: Secret<String>,
    /// The header the provider puts its signature in.
    pub hmac_header: String,
    /// If false, the middleware lets unsigned requests through. Only ever disable this in tests.
    pub hmac_checks: bool,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            hmac_secret: Secret::default(),
            hmac_header: DEFAULT_HMAC_HEADER.to_string(),
            hmac_checks: true,
        }
    }
}

impl WebhookConfig {
    pub fn from_env_or_default() -> Self {
        let hmac_secret = env::var("SCG_WEBHOOK_HMAC_SECRET").ok().unwrap_or_else(|| {
            error!(
                "🪛️ SCG_WEBHOOK_HMAC_SECRET is not set. Please set it to the signing secret of your payment \
                 provider."
            );
            String::default()
        });
        let hmac_header = env::var("SCG_WEBHOOK_HMAC_HEADER").ok().unwrap_or_else(|| DEFAULT_HMAC_HEADER.to_string());
        let hmac_checks = parse_boolean_flag(env::var("SCG_WEBHOOK_HMAC_CHECKS").ok(), true);
        if !hmac_checks {
            warn!("🚨️ Webhook HMAC checks are disabled. Anyone can drive your order lifecycle. **DANGER**");
        }
        Self { hmac_secret: Secret::new(hmac_secret), hmac_header, hmac_checks }
    }
}
