//! # 拖放导入工具 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │        宿主应用 (实现 ImportHost / ScriptRunner)          │
//! │                                                          │
//! │   拖放 / 文件浏览器 ──┐          ┌── 键盘粘贴             │
//! └───────────────────────┼──────────┼───────────────────────┘
//!                         ↓          ↓
//! ┌───────────────────────┼──────────┼───────────────────────┐
//! │                       │  session (DropSession)           │
//! │                       │          │                       │
//! │                       │   ┌─ clipboard ── ClipboardSession (RAII)
//! │                       │   │   ├─ dropfiles   CF_HDROP / 文本
//! │                       │   │   ├─ bitmap      DIB → BMP, V5 掩码修补
//! │                       │   │   └─ win32 / fallback (arboard)
//! │                       ↓   ↓                              │
//! │  dispatch ── 多数扩展名过滤 → 匹配处理器 → 钩子 + 逐文件导入 │
//! │   ├─ config / registry   *.json ↔ HandlerRegistry        │
//! │   └─ scripts             钩子脚本查找 (walkdir)           │
//! │                                                          │
//! │  error ── AppError    storage ── AssetLayout             │
//! │  settings ── AppSettings (settings.json)                 │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError` |
//! | [`clipboard`] | 剪贴板会话、格式检测、文件列表与图片解码、回写 |
//! | [`dispatch`] | 处理器配置、注册表、钩子脚本、导入分发引擎 |
//! | [`session`] | 持有注册表的投放会话，串联剪贴板与分发 |
//! | [`storage`] | 资源目录布局与自动创建 |
//! | [`settings`] | 应用设置的读取与保存 |

pub mod clipboard;
pub mod dispatch;
pub mod error;
pub mod session;
pub mod settings;
pub mod storage;
