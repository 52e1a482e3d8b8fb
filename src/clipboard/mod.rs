//! 剪贴板读取模块
//!
//! # 设计思路
//!
//! 统一管理与系统剪贴板交换数据的能力：
//! - **会话**：`ClipboardReader::open` 返回 RAII 守卫，打开 → 读取 → 关闭是一个不可拆分的临界区
//! - **格式检测**：Unicode 文本、文件列表（`CF_HDROP`）、`CF_DIB` / `CF_DIBV5`、PNG
//! - **解码**：把原始内存块转成文件路径列表或可直接写盘的图片文件
//! - **写入**：文本、PNG、BMP 文件回写剪贴板
//!
//! # 实现思路
//!
//! - 后端只提供字节级操作（`ClipboardBackend`），解析逻辑与平台无关，可在任意平台测试。
//! - Windows 使用 `windows` crate 直接调用 Win32 剪贴板 API；其他平台回退到 `arboard`。
//! - 子模块按职责拆分：位图头处理归 `bitmap`，`DROPFILES` / 文本归 `dropfiles`。

mod backend;
pub mod bitmap;
pub mod dropfiles;
mod error;
mod format;
mod memory;
mod reader;

#[cfg(not(target_os = "windows"))]
mod fallback;
#[cfg(target_os = "windows")]
mod win32;

pub use backend::ClipboardBackend;
pub use error::ClipboardError;
pub use format::{ClipboardFormat, standard_format_name};
pub use memory::MemoryClipboard;
pub use reader::{ClipboardImage, ClipboardReader, ClipboardSession, ImageKind};

#[cfg(not(target_os = "windows"))]
pub use fallback::ArboardClipboard as SystemClipboard;
#[cfg(target_os = "windows")]
pub use win32::Win32Clipboard as SystemClipboard;

/// 以当前平台的系统剪贴板创建读取器。
pub fn system_reader() -> ClipboardReader<SystemClipboard> {
    ClipboardReader::new(SystemClipboard::new())
}
