//! 本地文件枚举器

use anyhow::Result;
use std::path::PathBuf;
use tracing::info;
use walkdir::WalkDir;

/// 本地文件引用：文件路径加上它所属的备份根目录
///
/// 路径是否为绝对路径取决于配置；相对身份策略需要 root 来截取相对部分。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFileRef {
    pub path: PathBuf,
    pub root: PathBuf,
}

/// 前置条件错误：配置的备份根目录在本地不存在
#[derive(Debug, thiserror::Error)]
#[error("备份目录不存在: {}", .0.display())]
pub struct RootMissing(pub PathBuf);

/// 本地文件扫描器
pub struct LocalScanner {
    roots: Vec<PathBuf>,
}

impl LocalScanner {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    /// 前置检查：所有配置的根目录必须存在，任何一个缺失都立即失败
    ///
    /// 必须在发起任何远端调用之前执行。
    pub fn verify_roots(&self) -> Result<(), RootMissing> {
        for root in &self.roots {
            if !root.is_dir() {
                return Err(RootMissing(root.clone()));
            }
        }
        Ok(())
    }

    /// 递归枚举所有普通文件
    ///
    /// 顺序为遍历顺序；重叠的根目录不做去重。无法读取的条目跳过。
    pub async fn scan(&self) -> Result<Vec<LocalFileRef>> {
        let roots = self.roots.clone();

        // 目录遍历是阻塞 IO，放到 spawn_blocking 里执行
        let files = tokio::task::spawn_blocking(move || {
            let mut files = Vec::new();
            for root in roots {
                for entry in WalkDir::new(&root)
                    .follow_links(false)
                    .into_iter()
                    .filter_map(|e| e.ok())
                {
                    if entry.file_type().is_file() {
                        files.push(LocalFileRef {
                            path: entry.into_path(),
                            root: root.clone(),
                        });
                    }
                }
            }
            files
        })
        .await?;

        info!("本地扫描完成: {} 个文件", files.len());
        Ok(files)
    }
}
