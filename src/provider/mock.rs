//! 测试用内存 Provider
//!
//! 行为确定、可注入单点失败，并记录远端调用情况供断言。
//! 过滤参数的语义：传 `Some` 才过滤，`None` 表示不过滤该维度。

use super::{
    FileId, FileStorage, FolderId, LinkedAccount, ProviderError, ProviderResult, RemoteFileRef,
    RemoteFolder,
};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

#[derive(Default)]
struct MockState {
    accounts: Vec<LinkedAccount>,
    folders: Vec<RemoteFolder>,
    files: Vec<RemoteFileRef>,
    fail_list_files: HashSet<FolderId>,
    fail_list_folders: HashSet<FolderId>,
    fail_create_names: HashSet<String>,
    listed_files_order: Vec<FolderId>,
    folders_created: u32,
    calls: u32,
    next_id: u32,
}

pub struct MockProvider {
    state: Mutex<MockState>,
}

impl MockProvider {
    /// 带一个已关联账户的 Provider
    pub fn new() -> Self {
        let provider = Self::without_accounts();
        provider.state.lock().unwrap().accounts.push(LinkedAccount {
            id: "acct-1".to_string(),
            integration: "mock-drive".to_string(),
            status: "complete".to_string(),
        });
        provider
    }

    pub fn without_accounts() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
        }
    }

    pub fn add_folder(&self, name: &str, parent: Option<&FolderId>) -> FolderId {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = FolderId(format!("folder-{:04}", state.next_id));
        state.folders.push(RemoteFolder {
            id: id.clone(),
            name: name.to_string(),
            parent_id: parent.cloned(),
        });
        id
    }

    /// 直接放置一个已存在的文件夹记录（用于构造重复文件夹等场景）
    pub fn add_folder_with_id(&self, id: &str, name: &str, parent: Option<&FolderId>) -> FolderId {
        let id = FolderId(id.to_string());
        self.state.lock().unwrap().folders.push(RemoteFolder {
            id: id.clone(),
            name: name.to_string(),
            parent_id: parent.cloned(),
        });
        id
    }

    pub fn add_file(&self, name: &str, folder: &FolderId) {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = FileId(format!("file-{:04}", state.next_id));
        state.files.push(RemoteFileRef {
            id,
            name: name.to_string(),
            folder_id: folder.clone(),
        });
    }

    pub fn fail_list_files(&self, folder: &FolderId) {
        self.state
            .lock()
            .unwrap()
            .fail_list_files
            .insert(folder.clone());
    }

    pub fn fail_list_folders(&self, folder: &FolderId) {
        self.state
            .lock()
            .unwrap()
            .fail_list_folders
            .insert(folder.clone());
    }

    pub fn fail_create_file(&self, name: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_create_names
            .insert(name.to_string());
    }

    /// list_files 被调用的文件夹顺序
    pub fn listed_files_order(&self) -> Vec<FolderId> {
        self.state.lock().unwrap().listed_files_order.clone()
    }

    pub fn folders_created(&self) -> u32 {
        self.state.lock().unwrap().folders_created
    }

    /// 所有远端调用的总次数
    pub fn call_count(&self) -> u32 {
        self.state.lock().unwrap().calls
    }

    pub fn file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .state
            .lock()
            .unwrap()
            .files
            .iter()
            .map(|f| f.name.clone())
            .collect();
        names.sort();
        names
    }

    fn rejected(what: &str) -> ProviderError {
        ProviderError::Api {
            status: 500,
            body: format!("{{\"detail\": \"injected failure: {}\"}}", what),
        }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileStorage for MockProvider {
    async fn list_linked_accounts(&self) -> ProviderResult<Vec<LinkedAccount>> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        Ok(state.accounts.clone())
    }

    async fn list_folders(
        &self,
        name: Option<&str>,
        parent: Option<&FolderId>,
    ) -> ProviderResult<Vec<RemoteFolder>> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;

        if let Some(parent) = parent {
            if state.fail_list_folders.contains(parent) {
                return Err(Self::rejected(parent.as_str()));
            }
        }

        Ok(state
            .folders
            .iter()
            .filter(|f| name.is_none_or(|n| f.name == n))
            .filter(|f| parent.is_none_or(|p| f.parent_id.as_ref() == Some(p)))
            .cloned()
            .collect())
    }

    async fn create_folder(
        &self,
        name: &str,
        parent: Option<&FolderId>,
    ) -> ProviderResult<RemoteFolder> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        state.folders_created += 1;
        state.next_id += 1;

        let folder = RemoteFolder {
            id: FolderId(format!("folder-{:04}", state.next_id)),
            name: name.to_string(),
            parent_id: parent.cloned(),
        };
        state.folders.push(folder.clone());
        Ok(folder)
    }

    async fn list_files(&self, folder: &FolderId) -> ProviderResult<Vec<RemoteFileRef>> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        state.listed_files_order.push(folder.clone());

        if state.fail_list_files.contains(folder) {
            return Err(Self::rejected(folder.as_str()));
        }

        Ok(state
            .files
            .iter()
            .filter(|f| &f.folder_id == folder)
            .cloned()
            .collect())
    }

    async fn create_file(
        &self,
        name: &str,
        folder: &FolderId,
        _data: Vec<u8>,
    ) -> ProviderResult<RemoteFileRef> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;

        if state.fail_create_names.contains(name) {
            return Err(Self::rejected(name));
        }

        state.next_id += 1;
        let file = RemoteFileRef {
            id: FileId(format!("file-{:04}", state.next_id)),
            name: name.to_string(),
            folder_id: folder.clone(),
        };
        state.files.push(file.clone());
        Ok(file)
    }

    fn name(&self) -> &str {
        "mock"
    }
}
