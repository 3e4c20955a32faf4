pub mod http;
pub mod webdav;

#[cfg(test)]
pub mod mock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub use http::UnifiedApiProvider;
pub use webdav::WebDavProvider;

/// 文件夹标识（由服务端分配，客户端不解释其内容）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FolderId(pub String);

impl FolderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FolderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// 文件标识
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(pub String);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 已关联的云存储账户
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedAccount {
    pub id: String,
    /// 集成的云存储服务名称
    #[serde(default)]
    pub integration: String,
    #[serde(default)]
    pub status: String,
}

/// 远端文件夹节点
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteFolder {
    pub id: FolderId,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<FolderId>,
}

/// 远端文件记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteFileRef {
    pub id: FileId,
    pub name: String,
    pub folder_id: FolderId,
}

/// Provider 错误，保留服务端返回的诊断信息
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// 服务端拒绝请求，body 为原始错误载荷
    #[error("服务端错误 (HTTP {status}): {body}")]
    Api { status: u16, body: String },
    #[error("网络错误: {0}")]
    Transport(String),
    #[error("响应解析失败: {0}")]
    Decode(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// 统一文件存储接口
///
/// 所有远端操作都经由该接口，每个方法对应服务端的一次往返。
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// 列出已关联的云存储账户
    async fn list_linked_accounts(&self) -> ProviderResult<Vec<LinkedAccount>>;

    /// 列出文件夹，可按名称和父文件夹过滤
    async fn list_folders(
        &self,
        name: Option<&str>,
        parent: Option<&FolderId>,
    ) -> ProviderResult<Vec<RemoteFolder>>;

    /// 创建文件夹
    async fn create_folder(
        &self,
        name: &str,
        parent: Option<&FolderId>,
    ) -> ProviderResult<RemoteFolder>;

    /// 列出指定文件夹直接包含的文件（不含子文件夹内容）
    async fn list_files(&self, folder: &FolderId) -> ProviderResult<Vec<RemoteFileRef>>;

    /// 在指定文件夹下创建文件并上传内容
    async fn create_file(
        &self,
        name: &str,
        folder: &FolderId,
        data: Vec<u8>,
    ) -> ProviderResult<RemoteFileRef>;

    /// 存储名称（用于日志）
    fn name(&self) -> &str;
}

/// 根据配置创建 Provider 实例
pub fn connect(
    config: &crate::config::ProviderConfig,
    credentials: &crate::config::Credentials,
) -> anyhow::Result<Arc<dyn FileStorage>> {
    match config.typ {
        crate::config::ProviderType::Unified => {
            let base_url = config
                .base_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("unified 类型需要配置 base_url"))?;
            tracing::info!("初始化统一 API 客户端: {}", base_url);
            Ok(Arc::new(UnifiedApiProvider::new(base_url, credentials)?) as Arc<dyn FileStorage>)
        }
        crate::config::ProviderType::Webdav => {
            let endpoint = config
                .endpoint
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("webdav 类型需要配置 endpoint"))?;
            let username = config.username.as_deref().unwrap_or_default();
            let password = config.password.as_deref().unwrap_or_default();
            tracing::info!("初始化 WebDAV 存储: {}", endpoint);
            Ok(Arc::new(WebDavProvider::new(
                endpoint,
                username,
                password,
                config.root.clone(),
            )?) as Arc<dyn FileStorage>)
        }
    }
}
