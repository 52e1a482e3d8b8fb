//! # 钩子脚本
//!
//! ## 设计思路
//!
//! 处理器可以在四个钩子点挂载脚本：批次前后各一次，每个文件前后各一次。
//! 脚本内容对引擎来说是不可信的外部输入，引擎只负责定位脚本并交给 `ScriptRunner`，
//! 上下文以只读引用传入，脚本无法改动分发循环的状态。
//!
//! ## 实现思路
//!
//! - `ScriptLibrary` 先把配置名当作 `scripts/` 下的相对路径；该文件不存在时，
//!   再递归查找同名文件（配置名不带扩展名时也按文件主名匹配）。
//! - 找不到脚本视为未配置，返回 `None`；读取失败记一条警告后同样跳过。
//! - `HookContext::to_bindings` 把上下文转成 JSON 对象，供脚本运行器注入变量。

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;
use walkdir::WalkDir;

use super::engine::DropEvent;
use super::error::HookError;
use super::host::EntityId;

/// 钩子点。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HookPoint {
    BeforeAll,
    AfterAll,
    BeforeEach,
    AfterEach,
}

impl HookPoint {
    pub const ALL: [HookPoint; 4] = [Self::BeforeAll, Self::BeforeEach, Self::AfterEach, Self::AfterAll];

    /// 配置文件中对应的字段名。
    pub fn config_key(self) -> &'static str {
        match self {
            Self::BeforeAll => "pre_script",
            Self::AfterAll => "post_script",
            Self::BeforeEach => "foreach_pre_script",
            Self::AfterEach => "foreach_post_script",
        }
    }

    pub fn is_per_file(self) -> bool {
        matches!(self, Self::BeforeEach | Self::AfterEach)
    }
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_key())
    }
}

/// 单文件钩子额外携带的上下文。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EachContext {
    pub filepath: PathBuf,
    pub index: usize,
    /// 截至当前的累计新选中对象（`AfterEach` 时包含本文件导入的对象）。
    pub selected_objects: Vec<EntityId>,
    pub selected_nodes: Vec<EntityId>,
}

/// 交给钩子脚本的只读上下文。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HookContext {
    pub point: HookPoint,
    pub directory: PathBuf,
    pub files: Vec<String>,
    pub event: DropEvent,
    #[serde(flatten)]
    pub each: Option<EachContext>,
}

impl HookContext {
    /// 转成脚本可用的变量表。
    pub fn to_bindings(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// 已读取的钩子脚本。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookScript {
    pub name: String,
    pub path: PathBuf,
    pub source: String,
}

/// 执行钩子脚本的回调接口。
pub trait ScriptRunner {
    fn run(&mut self, script: &HookScript, context: &HookContext) -> Result<(), HookError>;
}

impl<F> ScriptRunner for F
where
    F: FnMut(&HookScript, &HookContext) -> Result<(), HookError>,
{
    fn run(&mut self, script: &HookScript, context: &HookContext) -> Result<(), HookError> {
        self(script, context)
    }
}

/// `scripts/` 目录下的脚本集合。
#[derive(Debug, Clone)]
pub struct ScriptLibrary {
    dir: PathBuf,
}

impl ScriptLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 查找脚本文件：精确的相对路径优先，否则按文件名排序递归遍历，取第一个匹配。
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        let name = name.trim();
        let exact = self.dir.join(name);
        if !name.is_empty() && exact.is_file() {
            return Some(exact);
        }

        let wanted = Path::new(name).file_name()?.to_string_lossy().into_owned();
        let match_stem = Path::new(&wanted).extension().is_none();

        self.walk().find(|path| {
            let file_name = path.file_name().map(|n| n.to_string_lossy());
            let stem = path.file_stem().map(|s| s.to_string_lossy());
            file_name.is_some_and(|n| n == wanted.as_str())
                || (match_stem && stem.is_some_and(|s| s == wanted.as_str()))
        })
    }

    pub fn load(&self, name: &str) -> Option<HookScript> {
        let Some(path) = self.resolve(name) else {
            debug!("钩子脚本 '{}' 不存在，跳过", name);
            return None;
        };
        match fs::read_to_string(&path) {
            Ok(source) => Some(HookScript {
                name: name.to_string(),
                path,
                source,
            }),
            Err(e) => {
                warn!("⚠️ 读取钩子脚本 {} 失败：{}", path.display(), e);
                None
            }
        }
    }

    /// 所有脚本相对于 `scripts/` 的路径，供脚本选择列表使用。
    pub fn list(&self) -> Vec<PathBuf> {
        self.walk()
            .filter_map(|path| path.strip_prefix(&self.dir).ok().map(Path::to_path_buf))
            .collect()
    }

    fn walk(&self) -> impl Iterator<Item = PathBuf> {
        WalkDir::new(&self.dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
    }
}
