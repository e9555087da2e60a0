use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::time::Duration;

use crate::feed::{BadgeType, ContentLimits, RankingTuning, ServiceSettings};
use crate::reputation::ReputationTuning;

/// Configuration for the feed engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Content validation limits
    pub limits: LimitsConfig,
    /// Anti-abuse rate limiting configuration
    pub abuse: AbuseConfig,
    /// Reputation system configuration
    pub reputation: ReputationConfig,
    /// Feed ranking and pagination configuration
    pub ranking: RankingConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8420,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum post/comment content length in characters
    pub max_content_length: usize,
    /// Maximum sub-thread title length in characters
    pub max_title_length: usize,
    /// Maximum sub-thread description length in characters
    pub max_description_length: usize,
    /// Maximum number of tags per post
    pub max_tags: usize,
    /// Maximum length of a single tag in characters
    pub max_tag_length: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_content_length: 10_000,
            max_title_length: 200,
            max_description_length: 1_000,
            max_tags: 10,
            max_tag_length: 40,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbuseConfig {
    /// Maximum effective vote/badge actions per user within the window
    pub max_actions_per_window: u32,
    /// Rolling window length in seconds
    pub window_secs: u64,
}

impl Default for AbuseConfig {
    fn default() -> Self {
        Self {
            max_actions_per_window: 60,
            window_secs: 600,
        }
    }
}

/// Configuration for the reputation weight formula
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReputationConfig {
    /// Engagement score at which the engagement bonus saturates at +1.0
    pub engagement_saturation: f64,
    /// Badge score at which the badge bonus saturates at +1.0
    pub badge_saturation: f64,
    /// EWMA smoothing factor for accuracy observations
    pub accuracy_alpha: f64,
    /// Engagement credited per post or comment authored
    pub post_engagement_delta: f64,
    /// Badge score contribution per award, by badge type
    pub badge_weights: HashMap<BadgeType, f64>,
}

impl Default for ReputationConfig {
    fn default() -> Self {
        Self {
            engagement_saturation: 500.0,
            badge_saturation: 25.0,
            accuracy_alpha: 0.1,
            post_engagement_delta: 1.0,
            badge_weights: crate::feed::default_badge_weights(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Per-comment contribution to the engagement sort value
    pub comment_weight: f64,
    /// Page size when the caller does not pass a limit
    pub default_page_size: usize,
    /// Hard cap on requested page sizes
    pub max_page_size: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            comment_weight: 1.0,
            default_page_size: 50,
            max_page_size: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug)
    pub level: String,
    /// Enable request/response tracing on the HTTP router
    pub log_requests: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_requests: true,
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            limits: LimitsConfig::default(),
            abuse: AbuseConfig::default(),
            reputation: ReputationConfig::default(),
            ranking: RankingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl FeedConfig {
    /// Load configuration from environment variables and validate it
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        // Server configuration
        if let Ok(host) = env::var("TESSERA_HOST") {
            config.server.host = host;
        }

        if let Ok(port) = env::var("TESSERA_PORT") {
            config.server.port = port.parse().context("Invalid TESSERA_PORT value")?;
        }

        // Content limits
        if let Ok(length) = env::var("TESSERA_MAX_CONTENT_LENGTH") {
            config.limits.max_content_length = length
                .parse()
                .context("Invalid TESSERA_MAX_CONTENT_LENGTH value")?;
        }

        if let Ok(length) = env::var("TESSERA_MAX_TITLE_LENGTH") {
            config.limits.max_title_length = length
                .parse()
                .context("Invalid TESSERA_MAX_TITLE_LENGTH value")?;
        }

        if let Ok(length) = env::var("TESSERA_MAX_DESCRIPTION_LENGTH") {
            config.limits.max_description_length = length
                .parse()
                .context("Invalid TESSERA_MAX_DESCRIPTION_LENGTH value")?;
        }

        if let Ok(count) = env::var("TESSERA_MAX_TAGS") {
            config.limits.max_tags = count.parse().context("Invalid TESSERA_MAX_TAGS value")?;
        }

        if let Ok(length) = env::var("TESSERA_MAX_TAG_LENGTH") {
            config.limits.max_tag_length = length
                .parse()
                .context("Invalid TESSERA_MAX_TAG_LENGTH value")?;
        }

        // Anti-abuse configuration
        if let Ok(actions) = env::var("TESSERA_ABUSE_MAX_ACTIONS") {
            config.abuse.max_actions_per_window = actions
                .parse()
                .context("Invalid TESSERA_ABUSE_MAX_ACTIONS value")?;
        }

        if let Ok(secs) = env::var("TESSERA_ABUSE_WINDOW_SECS") {
            config.abuse.window_secs = secs
                .parse()
                .context("Invalid TESSERA_ABUSE_WINDOW_SECS value")?;
        }

        // Reputation configuration
        if let Ok(saturation) = env::var("TESSERA_ENGAGEMENT_SATURATION") {
            config.reputation.engagement_saturation = saturation
                .parse()
                .context("Invalid TESSERA_ENGAGEMENT_SATURATION value")?;
        }

        if let Ok(saturation) = env::var("TESSERA_BADGE_SATURATION") {
            config.reputation.badge_saturation = saturation
                .parse()
                .context("Invalid TESSERA_BADGE_SATURATION value")?;
        }

        if let Ok(alpha) = env::var("TESSERA_ACCURACY_ALPHA") {
            config.reputation.accuracy_alpha = alpha
                .parse()
                .context("Invalid TESSERA_ACCURACY_ALPHA value")?;
        }

        if let Ok(delta) = env::var("TESSERA_POST_ENGAGEMENT_DELTA") {
            config.reputation.post_engagement_delta = delta
                .parse()
                .context("Invalid TESSERA_POST_ENGAGEMENT_DELTA value")?;
        }

        // Per-type badge weight overrides, e.g. TESSERA_BADGE_WEIGHT_FUNNY
        for badge_type in BadgeType::ALL {
            let var = format!("TESSERA_BADGE_WEIGHT_{}", badge_type.as_str().to_uppercase());
            if let Ok(weight) = env::var(&var) {
                let weight: f64 = weight
                    .parse()
                    .with_context(|| format!("Invalid {} value", var))?;
                config.reputation.badge_weights.insert(badge_type, weight);
            }
        }

        // Ranking configuration
        if let Ok(weight) = env::var("TESSERA_COMMENT_WEIGHT") {
            config.ranking.comment_weight = weight
                .parse()
                .context("Invalid TESSERA_COMMENT_WEIGHT value")?;
        }

        if let Ok(size) = env::var("TESSERA_DEFAULT_PAGE_SIZE") {
            config.ranking.default_page_size = size
                .parse()
                .context("Invalid TESSERA_DEFAULT_PAGE_SIZE value")?;
        }

        if let Ok(size) = env::var("TESSERA_MAX_PAGE_SIZE") {
            config.ranking.max_page_size = size
                .parse()
                .context("Invalid TESSERA_MAX_PAGE_SIZE value")?;
        }

        // Logging configuration
        if let Ok(level) = env::var("TESSERA_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Ok(log_requests) = env::var("TESSERA_LOG_REQUESTS") {
            config.logging.log_requests = log_requests
                .parse()
                .context("Invalid TESSERA_LOG_REQUESTS value")?;
        }

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration for consistency
    pub fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            return Err(anyhow::anyhow!("Server host cannot be empty"));
        }

        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port must be non-zero"));
        }

        if self.limits.max_content_length == 0 {
            return Err(anyhow::anyhow!("Content length limit must be non-zero"));
        }

        if self.limits.max_title_length == 0 {
            return Err(anyhow::anyhow!("Title length limit must be non-zero"));
        }

        if self.abuse.max_actions_per_window == 0 {
            return Err(anyhow::anyhow!(
                "Abuse action limit must be non-zero; use a larger window to loosen it"
            ));
        }

        if self.abuse.window_secs == 0 {
            return Err(anyhow::anyhow!("Abuse window must be non-zero"));
        }

        if self.reputation.engagement_saturation <= 0.0 {
            return Err(anyhow::anyhow!("Engagement saturation must be positive"));
        }

        if self.reputation.badge_saturation <= 0.0 {
            return Err(anyhow::anyhow!("Badge saturation must be positive"));
        }

        if self.reputation.accuracy_alpha <= 0.0 || self.reputation.accuracy_alpha > 1.0 {
            return Err(anyhow::anyhow!(
                "Accuracy alpha must be within (0.0, 1.0], got {}",
                self.reputation.accuracy_alpha
            ));
        }

        if self.reputation.post_engagement_delta < 0.0 {
            return Err(anyhow::anyhow!("Post engagement delta cannot be negative"));
        }

        for (badge_type, weight) in &self.reputation.badge_weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(anyhow::anyhow!(
                    "Badge weight for {} must be a non-negative number, got {}",
                    badge_type.as_str(),
                    weight
                ));
            }
        }

        if self.ranking.comment_weight < 0.0 {
            return Err(anyhow::anyhow!("Comment weight cannot be negative"));
        }

        if self.ranking.default_page_size == 0 {
            return Err(anyhow::anyhow!("Default page size must be non-zero"));
        }

        if self.ranking.max_page_size < self.ranking.default_page_size {
            return Err(anyhow::anyhow!(
                "Max page size {} is below the default page size {}",
                self.ranking.max_page_size,
                self.ranking.default_page_size
            ));
        }

        Ok(())
    }

    /// Convert to ServiceSettings for use by FeedService
    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            limits: ContentLimits {
                max_content_length: self.limits.max_content_length,
                max_title_length: self.limits.max_title_length,
                max_description_length: self.limits.max_description_length,
                max_tags: self.limits.max_tags,
                max_tag_length: self.limits.max_tag_length,
            },
            max_actions_per_window: self.abuse.max_actions_per_window,
            action_window: Duration::from_secs(self.abuse.window_secs),
            reputation: ReputationTuning {
                engagement_saturation: self.reputation.engagement_saturation,
                badge_saturation: self.reputation.badge_saturation,
                accuracy_alpha: self.reputation.accuracy_alpha,
                post_engagement_delta: self.reputation.post_engagement_delta,
            },
            ranking: RankingTuning {
                comment_weight: self.ranking.comment_weight,
                default_page_size: self.ranking.default_page_size,
                max_page_size: self.ranking.max_page_size,
            },
            badge_weights: self.reputation.badge_weights.clone(),
        }
    }

    /// Socket address string for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
