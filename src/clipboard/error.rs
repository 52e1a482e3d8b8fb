//! # 剪贴板错误模型
//!
//! ## 设计思路
//!
//! 所有剪贴板系统调用都是“检查即报错”，不存在静默默认值。
//! 错误在会话仍处于打开状态时产生，由 `ClipboardSession` 的 `Drop` 负责最后关闭剪贴板。

use super::ClipboardFormat;

/// 剪贴板读取 / 解码统一错误类型。
#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    /// 无法打开、读取或写入剪贴板（被占用、权限不足、会话未打开等）。
    #[error("剪贴板访问失败：{0}")]
    Access(String),

    /// 请求的格式当前不在剪贴板上。
    #[error("剪贴板中没有 '{}' 格式的数据", .0.name())]
    Empty(ClipboardFormat),

    /// 剪贴板上没有任何受支持的图片格式。
    #[error("剪贴板中的图片不是任何受支持的格式（PNG / CF_DIBV5 / CF_DIB）")]
    UnsupportedImageFormat,

    /// 位图压缩方式不是 BI_RGB / BI_BITFIELDS。
    #[error("不支持的位图压缩类型：{0}")]
    UnsupportedCompression(u32),

    /// 剪贴板数据块被截断或字段越界。
    #[error("剪贴板数据格式异常：{0}")]
    Malformed(String),

    /// 保存剪贴板图片时的文件错误。
    #[error("文件错误：{0}")]
    Io(#[from] std::io::Error),
}

impl ClipboardError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }
}
