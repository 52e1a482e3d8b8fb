//! 导入分发模块
//!
//! # 设计思路
//!
//! 把"拖入 / 粘贴的一批文件"映射成"宿主应用中的导入操作调用"：
//! - **配置**：`config/*.json` 中每条记录描述 扩展名 + 编辑器区域 → 导入操作符 + 可选钩子脚本
//! - **注册表**：加载后的处理器集合，配置保存 / 重新加载时整体重建
//! - **引擎**：多数扩展名过滤 → 匹配处理器 → 钩子与逐文件导入 → 恢复选择集
//!
//! # 实现思路
//!
//! - 所有处理器共用一个由 `HandlerDefinition` 参数化的执行流程，不按配置生成类型。
//! - 宿主（`ImportHost`）、脚本执行（`ScriptRunner`）、多处理器选择（`HandlerChooser`）
//!   都是显式 trait，由调用方注入，引擎本身可在无宿主环境下测试。
//! - 子模块按职责拆分：`definition` / `config` / `registry` 负责数据，`scripts` / `engine` 负责执行。

mod config;
mod definition;
mod engine;
mod error;
pub mod extension;
mod host;
mod registry;
mod scripts;

pub use config::{ConfigError, ConfigStore};
pub use definition::{
    DEFAULT_CATEGORY, DEFAULT_POLL_AREA, EDITOR_AREAS, HandlerDefinition, HandlerRecord, HookScripts, OperatorContext,
    OperatorId, area_display_name,
};
pub use engine::{
    DispatchEngine, DispatchPlan, DispatchReport, DispatchRequest, DispatchStatus, DropEvent, DropSource, SkippedFile,
};
pub use error::{DispatchError, HookError, HostError};
pub use host::{EntityId, HandlerChooser, ImportCall, ImportHost};
pub use registry::{FILE_HANDLER_ID_PREFIX, HandlerRegistry, OPERATOR_ID_PREFIX, RegisteredHandler};
pub use scripts::{EachContext, HookContext, HookPoint, HookScript, ScriptLibrary, ScriptRunner};
