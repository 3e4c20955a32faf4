//! 上传器
//!
//! 对缺失文件逐个调用 create_file，一次一个往返。没有重试也没有
//! 批量接口；单个文件失败只记录并继续。

use crate::core::reconciler::IdentityStrategy;
use crate::core::scanner::LocalFileRef;
use crate::provider::{FileStorage, FolderId};
use serde::Serialize;
use tracing::{error, info};

/// 上传统计：attempted = succeeded + failed
#[derive(Debug, Clone, Default, Serialize)]
pub struct UploadReport {
    pub attempted: u32,
    pub succeeded: u32,
    pub failed: u32,
    pub errors: Vec<String>,
}

/// 上传器
pub struct Uploader<'a> {
    provider: &'a dyn FileStorage,
    strategy: IdentityStrategy,
}

impl<'a> Uploader<'a> {
    pub fn new(provider: &'a dyn FileStorage, strategy: IdentityStrategy) -> Self {
        Self { provider, strategy }
    }

    /// 把缺失文件依次上传到目标文件夹
    ///
    /// 远端文件名取身份键，与对账使用同一策略。
    pub async fn upload_all(&self, target: &FolderId, files: &[LocalFileRef]) -> UploadReport {
        let mut report = UploadReport::default();

        for file in files {
            report.attempted += 1;
            let name = self.strategy.key_for(file);

            let data = match tokio::fs::read(&file.path).await {
                Ok(data) => data,
                Err(e) => {
                    error!("读取本地文件失败: {}: {}", file.path.display(), e);
                    report.failed += 1;
                    report.errors.push(format!("{}: {}", file.path.display(), e));
                    continue;
                }
            };

            match self.provider.create_file(&name, target, data).await {
                Ok(_) => {
                    info!("上传完成: {}", name);
                    report.succeeded += 1;
                }
                Err(e) => {
                    error!("上传失败: {}: {}", name, e);
                    report.failed += 1;
                    report.errors.push(format!("{}: {}", name, e));
                }
            }
        }

        report
    }
}
