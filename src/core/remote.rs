//! 远端文件枚举器
//!
//! 从指定文件夹出发，深度优先收集其子树内的全部文件记录：先收
//! 当前文件夹的文件，再按服务端返回顺序进入各子文件夹。假设服务端
//! 目录结构无环，不做访问去重。

use crate::provider::{FileStorage, FolderId, RemoteFileRef};
use tracing::{debug, warn};

/// 远端枚举结果
///
/// 单个文件夹的列举失败不会中断整体遍历；失败的文件夹 id 记录在
/// `failed_folders` 中，此时 `files` 少于远端真实状态，由调用方决定
/// 是否接受不完整的快照。
#[derive(Debug, Default)]
pub struct RemoteSnapshot {
    pub files: Vec<RemoteFileRef>,
    pub failed_folders: Vec<FolderId>,
}

impl RemoteSnapshot {
    pub fn is_complete(&self) -> bool {
        self.failed_folders.is_empty()
    }
}

/// 远端文件枚举器
pub struct RemoteEnumerator<'a> {
    provider: &'a dyn FileStorage,
}

impl<'a> RemoteEnumerator<'a> {
    pub fn new(provider: &'a dyn FileStorage) -> Self {
        Self { provider }
    }

    /// 收集 `root` 子树内的全部文件记录
    ///
    /// 显式栈代替 async 递归；每个文件夹访问一次，先列文件后列子目录。
    pub async fn snapshot(&self, root: &FolderId) -> RemoteSnapshot {
        let mut snapshot = RemoteSnapshot::default();
        let mut pending = vec![root.clone()];

        while let Some(folder) = pending.pop() {
            match self.provider.list_files(&folder).await {
                Ok(files) => {
                    debug!("文件夹 {} 内有 {} 个文件", folder, files.len());
                    snapshot.files.extend(files);
                }
                Err(e) => {
                    warn!("列举文件夹 {} 的文件失败: {}", folder, e);
                    snapshot.failed_folders.push(folder.clone());
                }
            }

            match self.provider.list_folders(None, Some(&folder)).await {
                Ok(children) => {
                    // 倒序入栈，保证出栈顺序与服务端返回顺序一致
                    for child in children.into_iter().rev() {
                        pending.push(child.id);
                    }
                }
                Err(e) => {
                    warn!("列举文件夹 {} 的子目录失败: {}", folder, e);
                    if snapshot.failed_folders.last() != Some(&folder) {
                        snapshot.failed_folders.push(folder);
                    }
                }
            }
        }

        if !snapshot.is_complete() {
            warn!(
                "远端枚举不完整: {} 个文件夹列举失败，快照共 {} 个文件",
                snapshot.failed_folders.len(),
                snapshot.files.len()
            );
        }

        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::mock::MockProvider;

    /// root 下 a、b，sub1 下 c，sub1/nested 下 d，sub2 下 e
    fn build_tree(provider: &MockProvider) -> (FolderId, FolderId, FolderId, FolderId) {
        let root = provider.add_folder("reflection-backup", None);
        provider.add_file("a.txt", &root);
        provider.add_file("b.txt", &root);

        let sub1 = provider.add_folder("sub1", Some(&root));
        provider.add_file("c.txt", &sub1);

        let nested = provider.add_folder("nested", Some(&sub1));
        provider.add_file("d.txt", &nested);

        let sub2 = provider.add_folder("sub2", Some(&root));
        provider.add_file("e.txt", &sub2);

        (root, sub1, nested, sub2)
    }

    #[tokio::test]
    async fn test_depth_first_completeness() {
        let provider = MockProvider::new();
        let (root, sub1, nested, sub2) = build_tree(&provider);

        let snapshot = RemoteEnumerator::new(&provider).snapshot(&root).await;

        assert!(snapshot.is_complete());
        let names: Vec<&str> = snapshot.files.iter().map(|f| f.name.as_str()).collect();
        // 当前文件夹的文件先于子目录的文件，子目录按服务端顺序进入
        assert_eq!(names, vec!["a.txt", "b.txt", "c.txt", "d.txt", "e.txt"]);

        // 每个文件夹恰好访问一次
        let visited = provider.listed_files_order();
        assert_eq!(visited, vec![root, sub1, nested, sub2]);
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_accumulated_results() {
        let provider = MockProvider::new();
        let (root, sub1, _nested, _sub2) = build_tree(&provider);
        provider.fail_list_files(&sub1);

        let snapshot = RemoteEnumerator::new(&provider).snapshot(&root).await;

        assert_eq!(snapshot.failed_folders, vec![sub1]);
        let names: Vec<&str> = snapshot.files.iter().map(|f| f.name.as_str()).collect();
        // sub1 的文件丢失，但之前收集的结果保留，其余分支照常遍历
        assert_eq!(names, vec!["a.txt", "b.txt", "d.txt", "e.txt"]);
    }

    #[tokio::test]
    async fn test_failed_subfolder_listing_skips_branch_only() {
        let provider = MockProvider::new();
        let (root, sub1, _nested, _sub2) = build_tree(&provider);
        provider.fail_list_folders(&sub1);

        let snapshot = RemoteEnumerator::new(&provider).snapshot(&root).await;

        assert_eq!(snapshot.failed_folders, vec![sub1]);
        let names: Vec<&str> = snapshot.files.iter().map(|f| f.name.as_str()).collect();
        // nested 不可达（d.txt 丢失），sub1 自身与 sub2 的文件仍在
        assert_eq!(names, vec!["a.txt", "b.txt", "c.txt", "e.txt"]);
    }

    #[tokio::test]
    async fn test_empty_folder() {
        let provider = MockProvider::new();
        let root = provider.add_folder("reflection-backup", None);

        let snapshot = RemoteEnumerator::new(&provider).snapshot(&root).await;
        assert!(snapshot.is_complete());
        assert!(snapshot.files.is_empty());
    }
}
