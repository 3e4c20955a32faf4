//! WebDAV 后端
//!
//! 把统一接口映射到一台普通 WebDAV 服务器：文件夹 id 即远端目录
//! 相对路径（根为空串，目录以 `/` 结尾）。文件记录的 name 可能包含
//! 路径分隔符，落盘前做 URL 编码，列举时再解码还原。

use super::{
    FileStorage, FolderId, LinkedAccount, ProviderError, ProviderResult, RemoteFileRef,
    RemoteFolder,
};
use crate::provider::FileId;
use async_trait::async_trait;
use futures::TryStreamExt;
use opendal::{Metakey, Operator};

pub struct WebDavProvider {
    operator: Operator,
    name: String,
}

impl WebDavProvider {
    pub fn new(
        endpoint: &str,
        username: &str,
        password: &str,
        root: Option<String>,
    ) -> anyhow::Result<Self> {
        use opendal::services::Webdav;

        let mut builder = Webdav::default()
            .endpoint(endpoint)
            .username(username)
            .password(password);

        if let Some(ref r) = root {
            builder = builder.root(r);
        }

        let operator = Operator::new(builder)?.finish();

        let name = format!(
            "webdav://{}{}",
            endpoint.trim_end_matches('/'),
            root.as_deref()
                .map(|r| format!("/{}", r.trim_start_matches('/')))
                .unwrap_or_default()
        );

        Ok(Self { operator, name })
    }

    /// 目录路径最后一段（去掉结尾的 /）
    fn segment(path: &str) -> &str {
        path.trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
    }

    /// 文件记录名编码为单个路径段，斜杠不会再被当成目录分隔符
    fn encode_name(name: &str) -> String {
        urlencoding::encode(name).into_owned()
    }

    fn decode_name(segment: &str) -> String {
        urlencoding::decode(segment)
            .map(|c| c.into_owned())
            .unwrap_or_else(|_| segment.to_string())
    }

    fn map_err(e: opendal::Error) -> ProviderError {
        ProviderError::Transport(e.to_string())
    }
}

#[async_trait]
impl FileStorage for WebDavProvider {
    async fn list_linked_accounts(&self) -> ProviderResult<Vec<LinkedAccount>> {
        // WebDAV 没有账户列表的概念，能列出根目录即视为账户可用
        self.operator.list("").await.map_err(Self::map_err)?;

        Ok(vec![LinkedAccount {
            id: self.name.clone(),
            integration: "webdav".to_string(),
            status: "complete".to_string(),
        }])
    }

    async fn list_folders(
        &self,
        name: Option<&str>,
        parent: Option<&FolderId>,
    ) -> ProviderResult<Vec<RemoteFolder>> {
        let parent_path = parent.map(|p| p.as_str().to_string()).unwrap_or_default();

        let mut lister = self
            .operator
            .lister_with(&parent_path)
            .metakey(Metakey::Mode)
            .await
            .map_err(Self::map_err)?;

        let mut folders = Vec::new();
        while let Some(entry) = lister.try_next().await.map_err(Self::map_err)? {
            let path = entry.path().to_string();
            if path == parent_path || path == "/" {
                continue;
            }
            if !entry.metadata().is_dir() {
                continue;
            }

            let seg = Self::segment(&path);
            if name.is_some_and(|n| n != seg) {
                continue;
            }

            folders.push(RemoteFolder {
                id: FolderId(path.clone()),
                name: seg.to_string(),
                parent_id: if parent_path.is_empty() {
                    None
                } else {
                    Some(FolderId(parent_path.clone()))
                },
            });
        }

        Ok(folders)
    }

    async fn create_folder(
        &self,
        name: &str,
        parent: Option<&FolderId>,
    ) -> ProviderResult<RemoteFolder> {
        let parent_path = parent.map(|p| p.as_str().to_string()).unwrap_or_default();
        let path = format!("{}{}/", parent_path, name);

        self.operator
            .create_dir(&path)
            .await
            .map_err(Self::map_err)?;

        Ok(RemoteFolder {
            id: FolderId(path),
            name: name.to_string(),
            parent_id: parent.cloned(),
        })
    }

    async fn list_files(&self, folder: &FolderId) -> ProviderResult<Vec<RemoteFileRef>> {
        let mut lister = self
            .operator
            .lister_with(folder.as_str())
            .metakey(Metakey::Mode)
            .await
            .map_err(Self::map_err)?;

        let mut files = Vec::new();
        while let Some(entry) = lister.try_next().await.map_err(Self::map_err)? {
            if entry.metadata().is_dir() {
                continue;
            }

            let path = entry.path().to_string();
            files.push(RemoteFileRef {
                id: FileId(path.clone()),
                name: Self::decode_name(Self::segment(&path)),
                folder_id: folder.clone(),
            });
        }

        Ok(files)
    }

    async fn create_file(
        &self,
        name: &str,
        folder: &FolderId,
        data: Vec<u8>,
    ) -> ProviderResult<RemoteFileRef> {
        let path = format!("{}{}", folder.as_str(), Self::encode_name(name));

        self.operator
            .write(&path, data)
            .await
            .map_err(Self::map_err)?;

        Ok(RemoteFileRef {
            id: FileId(path),
            name: name.to_string(),
            folder_id: folder.clone(),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_roundtrip() {
        let name = "/Users/dylan/Documents/报告 2024.txt";
        let encoded = WebDavProvider::encode_name(name);
        assert!(!encoded.contains('/'));
        assert_eq!(WebDavProvider::decode_name(&encoded), name);
    }

    #[test]
    fn test_segment() {
        assert_eq!(WebDavProvider::segment("a/b/c/"), "c");
        assert_eq!(WebDavProvider::segment("backup/"), "backup");
        assert_eq!(WebDavProvider::segment(""), "");
    }
}
