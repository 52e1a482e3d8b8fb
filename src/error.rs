//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 各子系统保留自己的错误枚举（`ClipboardError` / `DispatchError` / `ConfigError`），
//! 会话层与命令行入口统一返回 `Result<T, AppError>`，通过 `#[from]` 自动转换。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息，子系统错误原样透传（`#[error("{0}")]`）。
//! - 实现 `Serialize` 将错误序列化为字符串，便于以 JSON 输出给调用方。

use serde::Serialize;

use crate::clipboard::ClipboardError;
use crate::dispatch::{ConfigError, DispatchError};

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 剪贴板读写失败
    #[error("{0}")]
    Clipboard(#[from] ClipboardError),

    /// 分发批次终止（钩子脚本或宿主导入失败）
    #[error("{0}")]
    Dispatch(#[from] DispatchError),

    /// 处理器配置读写失败
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 资源目录不可用
    #[error("资源目录不可用: {0}")]
    Storage(String),

    /// 应用设置读写失败
    #[error("应用设置错误: {0}")]
    Settings(String),
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
