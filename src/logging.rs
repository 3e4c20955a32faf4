//! 日志模块 - 控制台与带大小上限的文件日志

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 是否启用文件日志
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// 日志级别: "error", "warn", "info", "debug", "trace"
    #[serde(default = "default_level")]
    pub level: String,
    /// 日志文件大小上限（MB），超限在下次启动时轮转
    #[serde(default = "default_max_size_mb")]
    pub max_size_mb: u32,
}

fn default_enabled() -> bool {
    true
}

fn default_level() -> String {
    "info".to_string()
}

fn default_max_size_mb() -> u32 {
    5
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            level: default_level(),
            max_size_mb: default_max_size_mb(),
        }
    }
}

impl LogConfig {
    /// 将配置的日志级别转换为 tracing Level
    pub fn tracing_level(&self) -> tracing::Level {
        match self.level.to_lowercase().as_str() {
            "error" => tracing::Level::ERROR,
            "warn" => tracing::Level::WARN,
            "debug" => tracing::Level::DEBUG,
            "trace" => tracing::Level::TRACE,
            _ => tracing::Level::INFO,
        }
    }
}

/// 初始化日志系统
///
/// 控制台始终输出；启用文件日志时同时写入 log_dir 下的
/// reflection.log。返回的 guard 需要持有到进程结束，否则缓冲中的
/// 日志会丢失。
pub fn init(log_dir: &Path, config: &LogConfig) -> Option<WorkerGuard> {
    // HTTP 客户端的调试输出太吵，压到 warn
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(config.tracing_level().into())
        .add_directive("hyper=warn".parse().unwrap())
        .add_directive("reqwest=warn".parse().unwrap())
        .add_directive("opendal=warn".parse().unwrap());

    if !config.enabled {
        let console_layer = tracing_subscriber::fmt::layer().with_target(false);
        let subscriber = tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer);
        let _ = tracing::subscriber::set_global_default(subscriber);
        return None;
    }

    let _ = fs::create_dir_all(log_dir);
    rotate_if_oversized(log_dir, config.max_size_mb);

    let file_appender = tracing_appender::rolling::never(log_dir, "reflection.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(false);

    let console_layer = tracing_subscriber::fmt::layer().with_target(false);

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer);
    let _ = tracing::subscriber::set_global_default(subscriber);

    Some(guard)
}

/// 启动时检查日志文件大小，超限则轮转为 reflection.log.old
fn rotate_if_oversized(log_dir: &Path, max_size_mb: u32) {
    let path = log_dir.join("reflection.log");
    let max_size = (max_size_mb as u64) * 1024 * 1024;

    let Ok(metadata) = fs::metadata(&path) else {
        return;
    };
    if metadata.len() <= max_size {
        return;
    }

    let backup = path.with_extension("log.old");
    let _ = fs::remove_file(&backup);
    let _ = fs::rename(&path, &backup);
}
