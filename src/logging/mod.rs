use serde::Deserialize;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::errors::ConfigError;

/// Overrides the configured filter when set, e.g. `scene_di=trace`.
pub const LOG_FILTER_ENV: &str = "SCENE_DI_LOG";

/// 日志格式配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// 人类可读格式
    #[default]
    Pretty,
    /// JSON 格式
    Json,
    /// 紧凑格式
    Compact,
}

/// 日志配置
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// 日志级别或过滤指令
    pub level: String,
    /// 输出格式
    pub format: LogFormat,
    /// 是否显示目标模块
    pub show_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            show_target: true,
        }
    }
}

impl LoggingConfig {
    /// 创建开发环境配置
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            ..Self::default()
        }
    }

    /// 创建测试环境配置
    pub fn testing() -> Self {
        Self {
            level: "error".to_string(),
            format: LogFormat::Compact,
            show_target: false,
        }
    }
}

/// 初始化日志系统
///
/// A subscriber installed earlier (by the host application or another test)
/// is left in place.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ConfigError> {
    let level = parse_log_level(&config.level)?;
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new(&config.level));

    let installed = match config.format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty().with_target(config.show_target))
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(config.show_target))
            .try_init(),
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_target(config.show_target))
            .try_init(),
    };

    if installed.is_ok() {
        tracing::info!(level = %level, format = ?config.format, "Logging system initialized");
    }
    Ok(())
}

/// Parses a plain level name; filter directives such as `scene_di=debug`
/// are rejected.
pub fn parse_log_level(level: &str) -> Result<Level, ConfigError> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => Err(ConfigError::InvalidValue {
            field: "logging.level".to_string(),
            reason: format!("unknown log level '{}'", other),
        }),
    }
}
