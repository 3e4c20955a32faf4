//! 应用配置模块

use crate::core::reconciler::IdentityStrategy;
use crate::logging::LogConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Provider 类型
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    /// 托管式统一文件存储 API
    #[default]
    Unified,
    Webdav,
}

/// Provider 配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(rename = "type")]
    pub typ: ProviderType,
    /// unified: API 基地址
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// webdav: 服务器地址
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
}

/// 备份配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    /// 要备份的本地目录
    pub directories: Vec<PathBuf>,
    /// 云端备份文件夹名
    #[serde(default = "default_folder_name")]
    pub folder_name: String,
    /// 身份匹配策略
    #[serde(default)]
    pub identity: IdentityStrategy,
    pub provider: ProviderConfig,
    #[serde(default)]
    pub log: LogConfig,
}

fn default_folder_name() -> String {
    "reflection-backup".to_string()
}

impl BackupConfig {
    /// 默认配置文件路径（配置目录下的 config.json）
    pub fn default_path() -> PathBuf {
        crate::dirs::config_dir()
            .map(|p| p.join("reflection"))
            .unwrap_or_else(|| PathBuf::from(".reflection"))
            .join("config.json")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        let config: BackupConfig = serde_json::from_str(&content)
            .with_context(|| format!("解析配置文件失败: {}", path.display()))?;

        if config.directories.is_empty() {
            anyhow::bail!("配置中没有任何备份目录");
        }
        Ok(config)
    }
}

/// 凭证：API key 与账户令牌，从环境变量读取（`.env` 由入口加载）
#[derive(Debug, Clone)]
pub struct Credentials {
    pub api_key: String,
    pub account_token: String,
}

impl Credentials {
    /// 缺失时以空值继续，不在本地校验；鉴权失败由服务端在首次请求时报出
    pub fn from_env() -> Self {
        let api_key = std::env::var("API_KEY").unwrap_or_else(|_| {
            warn!("未设置环境变量 API_KEY");
            String::new()
        });
        let account_token = std::env::var("ACCOUNT_TOKEN").unwrap_or_else(|_| {
            warn!("未设置环境变量 ACCOUNT_TOKEN");
            String::new()
        });

        Self {
            api_key,
            account_token,
        }
    }
}
