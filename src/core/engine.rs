//! 备份引擎
//!
//! 串起单次运行的完整流程：校验本地目录 → 校验账户关联 → 确保备份
//! 文件夹 → 两侧枚举 → 对账 → 上传。全程顺序执行，一次只有一个
//! 远端往返。前置与鉴权阶段的失败直接向上传播终止本次运行，之后的
//! 单项失败只计入报告。

use crate::config::BackupConfig;
use crate::core::reconciler::Reconciler;
use crate::core::remote::RemoteEnumerator;
use crate::core::scanner::{LocalFileRef, LocalScanner};
use crate::core::uploader::Uploader;
use crate::provider::{FileStorage, FolderId, LinkedAccount, RemoteFolder};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 运行状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Completed,
    Failed,
}

/// 对账结果：两侧枚举完成后、上传之前的全部信息
#[derive(Debug)]
pub struct BackupPlan {
    pub folder: RemoteFolder,
    pub local_files: Vec<LocalFileRef>,
    pub remote_files: usize,
    /// 列举失败的远端文件夹，非空说明远端快照不完整
    pub failed_folders: Vec<FolderId>,
    pub missing: Vec<LocalFileRef>,
}

/// 单次运行的报告
#[derive(Debug, Clone, Serialize)]
pub struct BackupReport {
    pub started_at: i64,
    pub finished_at: i64,
    pub status: RunStatus,
    pub files_scanned: u32,
    pub remote_files: u32,
    pub files_missing: u32,
    pub files_uploaded: u32,
    pub files_failed: u32,
    pub incomplete_folders: u32,
    pub duration: u64,
    pub errors: Vec<String>,
}

/// 备份引擎
pub struct BackupEngine {
    provider: Arc<dyn FileStorage>,
    config: BackupConfig,
}

impl BackupEngine {
    pub fn new(provider: Arc<dyn FileStorage>, config: BackupConfig) -> Self {
        Self { provider, config }
    }

    /// 校验云端账户已关联；失败对整次运行是致命的
    pub async fn verify_account_link(&self) -> Result<LinkedAccount> {
        let accounts = self
            .provider
            .list_linked_accounts()
            .await
            .context("获取已关联账户失败")?;

        let account = accounts
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("没有已关联的云存储账户"))?;

        debug!("已关联账户: {} ({})", account.id, account.integration);
        Ok(account)
    }

    /// 确保备份文件夹存在；已存在时是幂等空操作
    ///
    /// 远端出现重名文件夹（并发运行竞态的产物）时固定选 id 最小的
    /// 一个，每次运行的落点因此一致。
    pub async fn ensure_backup_folder(&self) -> Result<RemoteFolder> {
        let name = &self.config.folder_name;
        let folders = self
            .provider
            .list_folders(Some(name), None)
            .await
            .context("获取文件夹列表失败")?;

        let mut matches: Vec<RemoteFolder> =
            folders.into_iter().filter(|f| &f.name == name).collect();

        match matches.len() {
            0 => {
                let folder = self
                    .provider
                    .create_folder(name, None)
                    .await
                    .context("创建备份文件夹失败")?;
                debug!("已创建备份文件夹: {}", folder.id);
                Ok(folder)
            }
            1 => {
                debug!("备份文件夹已存在: {}", matches[0].id);
                Ok(matches.remove(0))
            }
            n => {
                warn!("发现 {} 个名为 {} 的文件夹，使用 id 最小的一个", n, name);
                matches.sort_by(|a, b| a.id.cmp(&b.id));
                Ok(matches.remove(0))
            }
        }
    }

    /// 枚举两侧并对账，不执行上传
    pub async fn plan(&self) -> Result<BackupPlan> {
        let scanner = LocalScanner::new(self.config.directories.clone());
        scanner.verify_roots()?;

        info!("准备备份 {} 个目录", self.config.directories.len());
        for dir in &self.config.directories {
            debug!("备份目录: {}", dir.display());
        }

        let local_files = scanner.scan().await?;

        self.verify_account_link().await?;
        let folder = self.ensure_backup_folder().await?;

        let snapshot = RemoteEnumerator::new(self.provider.as_ref())
            .snapshot(&folder.id)
            .await;

        let reconciler = Reconciler::new(self.config.identity);
        let missing = reconciler.missing(&local_files, &snapshot.files);

        info!(
            "对账完成: 本地 {} 个，远端 {} 个，缺失 {} 个",
            local_files.len(),
            snapshot.files.len(),
            missing.len()
        );

        Ok(BackupPlan {
            folder,
            remote_files: snapshot.files.len(),
            failed_folders: snapshot.failed_folders,
            missing,
            local_files,
        })
    }

    /// 执行完整备份
    pub async fn run(&self) -> Result<BackupReport> {
        let started_at = chrono::Utc::now().timestamp();

        let plan = self.plan().await?;

        let uploader = Uploader::new(self.provider.as_ref(), self.config.identity);
        let upload = uploader.upload_all(&plan.folder.id, &plan.missing).await;

        let finished_at = chrono::Utc::now().timestamp();
        let status = if upload.failed > 0 {
            RunStatus::Failed
        } else {
            RunStatus::Completed
        };

        let mut errors = upload.errors;
        for folder in &plan.failed_folders {
            errors.push(format!("远端文件夹列举失败: {}", folder));
        }

        let report = BackupReport {
            started_at,
            finished_at,
            status,
            files_scanned: plan.local_files.len() as u32,
            remote_files: plan.remote_files as u32,
            files_missing: plan.missing.len() as u32,
            files_uploaded: upload.succeeded,
            files_failed: upload.failed,
            incomplete_folders: plan.failed_folders.len() as u32,
            duration: (finished_at - started_at) as u64,
            errors,
        };

        info!(
            "备份完成: 上传 {} 个，失败 {} 个",
            report.files_uploaded, report.files_failed
        );

        Ok(report)
    }

    /// 追加一条运行记录（JSON 行）；写入失败不影响本次运行结果
    pub fn append_history(report: &BackupReport, dir: &Path) {
        let line = match serde_json::to_string(report) {
            Ok(line) => line,
            Err(e) => {
                warn!("序列化运行记录失败: {}", e);
                return;
            }
        };

        let path = dir.join("history.jsonl");
        let result = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .and_then(|mut f| writeln!(f, "{}", line));

        if let Err(e) = result {
            warn!("写入运行历史失败: {:?}: {}", path, e);
        }
    }
}
