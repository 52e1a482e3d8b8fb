//! 剪贴板后端抽象：只暴露“原始字节级”操作，格式解码全部放在 `reader` 中完成。

use super::ClipboardError;

/// 系统剪贴板的最小操作集合。
///
/// 除 `open` / `register_format` 外，所有操作都要求剪贴板已被本进程打开，
/// 否则返回 [`ClipboardError::Access`]。调用方不直接使用该 trait，
/// 而是通过 [`ClipboardReader`](super::ClipboardReader) 打开的会话访问。
pub trait ClipboardBackend {
    fn open(&mut self) -> Result<(), ClipboardError>;

    /// 释放剪贴板。会话析构时调用，不允许失败。
    fn close(&mut self);

    fn is_format_available(&mut self, format_id: u32) -> bool;

    /// 注册（或查询已注册的）自定义格式，返回格式编号。
    fn register_format(&mut self, name: &str) -> Result<u32, ClipboardError>;

    /// 复制出指定格式的完整全局内存块。
    fn read_data(&mut self, format_id: u32) -> Result<Vec<u8>, ClipboardError>;

    /// 按系统枚举顺序列出当前所有格式编号。
    fn enumerate_formats(&mut self) -> Result<Vec<u32>, ClipboardError>;

    /// 注册格式的名称；标准格式返回 `None`。
    fn format_name(&mut self, format_id: u32) -> Option<String>;

    fn empty(&mut self) -> Result<(), ClipboardError>;

    fn write_data(&mut self, format_id: u32, data: &[u8]) -> Result<(), ClipboardError>;
}
