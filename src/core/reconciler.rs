//! 本地/远端对账
//!
//! 纯集合差：以身份键对比本地文件与远端文件记录，得出远端缺失的
//! 本地文件。无副作用，输入相同则输出相同。

use crate::core::scanner::LocalFileRef;
use crate::provider::RemoteFileRef;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 身份匹配策略：本地文件如何映射到远端文件名
///
/// `absolute` 沿用完整路径字符串作为远端名（原始行为，较粗糙：路径
/// 即身份）；`relative` 使用相对所属根目录的路径，换机器或换根目录
/// 后身份仍然稳定。对账与上传必须使用同一策略，否则幂等性被破坏。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityStrategy {
    #[default]
    Absolute,
    Relative,
}

impl IdentityStrategy {
    /// 计算本地文件的身份键，同时用作上传时的远端文件名
    pub fn key_for(&self, file: &LocalFileRef) -> String {
        let path = match self {
            IdentityStrategy::Absolute => file.path.as_path(),
            IdentityStrategy::Relative => {
                file.path.strip_prefix(&file.root).unwrap_or(&file.path)
            }
        };
        // 路径分隔符统一为 /，两端行为才能跨平台一致
        path.to_string_lossy().replace('\\', "/")
    }
}

/// 对账器
pub struct Reconciler {
    strategy: IdentityStrategy,
}

impl Reconciler {
    pub fn new(strategy: IdentityStrategy) -> Self {
        Self { strategy }
    }

    /// missing = { l ∈ local : key(l) ∉ { r.name } }
    ///
    /// 保持本地枚举顺序；远端已全覆盖时返回空集，重复运行因此不会
    /// 重复上传。
    pub fn missing(
        &self,
        local: &[LocalFileRef],
        remote: &[RemoteFileRef],
    ) -> Vec<LocalFileRef> {
        let remote_names: HashSet<&str> = remote.iter().map(|r| r.name.as_str()).collect();

        local
            .iter()
            .filter(|l| !remote_names.contains(self.strategy.key_for(l).as_str()))
            .cloned()
            .collect()
    }
}
