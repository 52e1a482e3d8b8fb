//! # 分发错误模型
//!
//! 三类失败路径的处理方式不同：
//! - 操作符 id 无效：降级为单文件警告，不进入这里的 `Err` 分支（见 `engine`）；
//! - 钩子脚本文件不存在：视为未配置，静默跳过；
//! - 钩子脚本执行失败 / 宿主导入失败：向上传播，终止本批次。

use std::path::PathBuf;

use super::HookPoint;

/// 钩子脚本执行失败（由 `ScriptRunner` 实现方产生）。
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct HookError {
    pub message: String,
}

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// 宿主导入操作失败（由 `ImportHost` 实现方产生）。
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct HostError {
    pub message: String,
}

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// 分发引擎统一错误类型。
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// 配置的导入操作符 id 为空或格式不是 `<namespace>.<name>`。
    #[error("无效的导入操作符：'{0}'")]
    InvalidOperator(String),

    /// 指定标签的处理器不存在。
    #[error("未找到处理器：'{0}'")]
    UnknownHandler(String),

    /// 钩子脚本抛错，批次终止。
    #[error("钩子脚本 '{script}'（{point}）执行失败：{source}")]
    Hook {
        point: HookPoint,
        script: String,
        #[source]
        source: HookError,
    },

    /// 宿主导入操作失败，批次终止。
    #[error("导入 '{}' 失败：{source}", path.display())]
    Import {
        path: PathBuf,
        #[source]
        source: HostError,
    },
}
