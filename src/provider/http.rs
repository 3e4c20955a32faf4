//! 统一文件存储 API 的 REST 客户端
//!
//! 托管式聚合服务：一个 API key 加一个账户令牌即可访问用户关联的
//! 任意云盘。鉴权方式为 Bearer key + 账户令牌请求头，列表接口返回
//! `{ "results": [...] }` 信封（分页游标不在本工具的处理范围内）。

use super::{
    FileStorage, FolderId, LinkedAccount, ProviderError, ProviderResult, RemoteFileRef,
    RemoteFolder,
};
use crate::config::Credentials;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

const ACCOUNT_TOKEN_HEADER: &str = "X-Account-Token";

/// 列表接口的响应信封
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct Paginated<T> {
    #[serde(default)]
    results: Vec<T>,
}

pub struct UnifiedApiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    account_token: String,
    name: String,
}

impl UnifiedApiProvider {
    pub fn new(base_url: &str, credentials: &Credentials) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().build()?;
        let base_url = base_url.trim_end_matches('/').to_string();
        let name = format!("unified:{}", base_url);

        Ok(Self {
            client,
            base_url,
            api_key: credentials.api_key.clone(),
            account_token: credentials.account_token.clone(),
            name,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.bearer_auth(&self.api_key)
            .header(ACCOUNT_TOKEN_HEADER, &self.account_token)
    }

    /// 发送请求并解析 JSON 响应；非 2xx 时保留服务端错误载荷
    async fn send<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> ProviderResult<T> {
        let resp = self
            .authorize(req)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

#[async_trait]
impl FileStorage for UnifiedApiProvider {
    async fn list_linked_accounts(&self) -> ProviderResult<Vec<LinkedAccount>> {
        let page: Paginated<LinkedAccount> =
            self.send(self.client.get(self.url("linked-accounts"))).await?;
        Ok(page.results)
    }

    async fn list_folders(
        &self,
        name: Option<&str>,
        parent: Option<&FolderId>,
    ) -> ProviderResult<Vec<RemoteFolder>> {
        let mut req = self.client.get(self.url("folders"));
        if let Some(name) = name {
            req = req.query(&[("name", name)]);
        }
        if let Some(parent) = parent {
            req = req.query(&[("parent_folder_id", parent.as_str())]);
        }

        let page: Paginated<RemoteFolder> = self.send(req).await?;
        Ok(page.results)
    }

    async fn create_folder(
        &self,
        name: &str,
        parent: Option<&FolderId>,
    ) -> ProviderResult<RemoteFolder> {
        let model = json!({
            "model": {
                "name": name,
                "parent_folder": parent.map(FolderId::as_str),
            }
        });

        self.send(self.client.post(self.url("folders")).json(&model))
            .await
    }

    async fn list_files(&self, folder: &FolderId) -> ProviderResult<Vec<RemoteFileRef>> {
        let req = self
            .client
            .get(self.url("files"))
            .query(&[("folder_id", folder.as_str())]);

        let page: Paginated<RemoteFileRef> = self.send(req).await?;
        Ok(page.results)
    }

    async fn create_file(
        &self,
        name: &str,
        folder: &FolderId,
        data: Vec<u8>,
    ) -> ProviderResult<RemoteFileRef> {
        let model = json!({
            "name": name,
            "folder": folder.as_str(),
            "size": data.len(),
        });

        let form = reqwest::multipart::Form::new()
            .text("model", model.to_string())
            .part("file", reqwest::multipart::Part::bytes(data));

        self.send(self.client.post(self.url("files")).multipart(form))
            .await
    }

    fn name(&self) -> &str {
        &self.name
    }
}
