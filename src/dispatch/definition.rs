//! # 处理器定义
//!
//! ## 设计思路
//!
//! 每条配置对应一个 `HandlerDefinition`：文件扩展名 + 编辑器区域 → 导入操作符 + 可选钩子脚本。
//! 所有配置共用同一个泛型处理流程（`DispatchEngine`），由数据驱动，而不是为每条配置生成一个类型。
//!
//! ## 实现思路
//!
//! - 磁盘格式（`HandlerRecord`）沿用 `bl_import_operator` / `bl_file_extensions` 等字段名。
//! - 标签是 JSON 对象的键，分类是配置文件名（不含扩展名），二者不写入记录本身。
//! - 空字符串脚本字段等同于未配置：读取时归一为 `None`，保存时省略。

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::extension::{matches_extensions, split_extensions};
use super::{DispatchError, HookPoint};

pub const DEFAULT_CATEGORY: &str = "default";
pub const DEFAULT_POLL_AREA: &str = "VIEW_3D";

/// 支持的编辑器区域及显示名称。
pub const EDITOR_AREAS: [(&str, &str); 9] = [
    ("VIEW_3D", "3D View"),
    ("IMAGE_EDITOR", "Image Editor"),
    ("NODE_EDITOR", "Node Editor"),
    ("TEXT_EDITOR", "Text Editor"),
    ("CONSOLE", "Console"),
    ("OUTLINER", "Outliner"),
    ("PROPERTIES", "Properties"),
    ("FILE_BROWSER", "File Browser"),
    ("PREFERENCES", "Preferences"),
];

/// 编辑器区域的显示名称；未知区域原样返回。
pub fn area_display_name(area: &str) -> &str {
    EDITOR_AREAS
        .iter()
        .find(|(id, _)| *id == area)
        .map(|(_, name)| *name)
        .unwrap_or(area)
}

static OPERATOR_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\.([A-Za-z_][A-Za-z0-9_]*)$").expect("operator id pattern is valid")
});

/// 导入操作符的调用方式。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperatorContext {
    /// 交互式调用（可能弹出导入选项）。
    #[default]
    #[serde(rename = "INVOKE_DEFAULT")]
    InvokeDefault,
    /// 直接执行。
    #[serde(rename = "EXEC_DEFAULT")]
    ExecDefault,
}

impl OperatorContext {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvokeDefault => "INVOKE_DEFAULT",
            Self::ExecDefault => "EXEC_DEFAULT",
        }
    }
}

/// 解析后的操作符 id：`<namespace>.<name>`。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperatorId {
    namespace: String,
    name: String,
}

impl OperatorId {
    pub fn parse(raw: &str) -> Result<Self, DispatchError> {
        let captures = OPERATOR_ID_PATTERN
            .captures(raw.trim())
            .ok_or_else(|| DispatchError::InvalidOperator(raw.to_string()))?;
        Ok(Self {
            namespace: captures[1].to_string(),
            name: captures[2].to_string(),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for OperatorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

/// 四个钩子点上配置的脚本文件名。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookScripts {
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub pre_script: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub post_script: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub foreach_pre_script: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub foreach_post_script: Option<String>,
}

impl HookScripts {
    pub fn get(&self, point: HookPoint) -> Option<&str> {
        let script = match point {
            HookPoint::BeforeAll => &self.pre_script,
            HookPoint::AfterAll => &self.post_script,
            HookPoint::BeforeEach => &self.foreach_pre_script,
            HookPoint::AfterEach => &self.foreach_post_script,
        };
        script.as_deref().filter(|name| !name.trim().is_empty())
    }

    pub fn set(&mut self, point: HookPoint, script: Option<String>) {
        let slot = match point {
            HookPoint::BeforeAll => &mut self.pre_script,
            HookPoint::AfterAll => &mut self.post_script,
            HookPoint::BeforeEach => &mut self.foreach_pre_script,
            HookPoint::AfterEach => &mut self.foreach_post_script,
        };
        *slot = script;
    }

    /// 去掉空字符串脚本（与保存后再读取的结果一致）。
    pub fn normalized(&self) -> Self {
        let keep = |script: &Option<String>| script.clone().filter(|name| !name.trim().is_empty());
        Self {
            pre_script: keep(&self.pre_script),
            post_script: keep(&self.post_script),
            foreach_pre_script: keep(&self.foreach_pre_script),
            foreach_post_script: keep(&self.foreach_post_script),
        }
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|name| !name.trim().is_empty()))
}

fn default_poll_area() -> String {
    DEFAULT_POLL_AREA.to_string()
}

/// 配置文件中单条记录的磁盘格式。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerRecord {
    pub bl_import_operator: String,
    pub bl_file_extensions: String,
    #[serde(default = "default_poll_area")]
    pub poll_area: String,
    #[serde(default)]
    pub operator_context: OperatorContext,
    #[serde(flatten)]
    pub scripts: HookScripts,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub kwargs: Map<String, Value>,
}

/// 一条完整的处理器配置。
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerDefinition {
    /// 唯一标签（配置对象的键）。
    pub label: String,
    pub import_operator: String,
    /// 分号分隔的扩展名列表。
    pub file_extensions: String,
    pub poll_area: String,
    pub operator_context: OperatorContext,
    pub scripts: HookScripts,
    /// 调用导入操作符时附带的固定参数。
    pub kwargs: Map<String, Value>,
    /// 来源配置文件名（不含扩展名）。
    pub category: String,
}

impl HandlerDefinition {
    pub fn new(
        label: impl Into<String>,
        import_operator: impl Into<String>,
        file_extensions: impl Into<String>,
        poll_area: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            import_operator: import_operator.into(),
            file_extensions: file_extensions.into(),
            poll_area: poll_area.into(),
            operator_context: OperatorContext::default(),
            scripts: HookScripts::default(),
            kwargs: Map::new(),
            category: DEFAULT_CATEGORY.to_string(),
        }
    }

    pub fn with_context(mut self, context: OperatorContext) -> Self {
        self.operator_context = context;
        self
    }

    pub fn with_script(mut self, point: HookPoint, script: impl Into<String>) -> Self {
        self.scripts.set(point, Some(script.into()));
        self
    }

    pub fn with_kwarg(mut self, key: impl Into<String>, value: Value) -> Self {
        self.kwargs.insert(key.into(), value);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn from_record(label: impl Into<String>, category: impl Into<String>, record: HandlerRecord) -> Self {
        Self {
            label: label.into(),
            import_operator: record.bl_import_operator,
            file_extensions: record.bl_file_extensions,
            poll_area: record.poll_area,
            operator_context: record.operator_context,
            scripts: record.scripts,
            kwargs: record.kwargs,
            category: category.into(),
        }
    }

    pub fn to_record(&self) -> HandlerRecord {
        HandlerRecord {
            bl_import_operator: self.import_operator.clone(),
            bl_file_extensions: self.file_extensions.clone(),
            poll_area: self.poll_area.clone(),
            operator_context: self.operator_context,
            scripts: self.scripts.normalized(),
            kwargs: self.kwargs.clone(),
        }
    }

    pub fn operator(&self) -> Result<OperatorId, DispatchError> {
        OperatorId::parse(&self.import_operator)
    }

    pub fn extensions(&self) -> Vec<&str> {
        split_extensions(&self.file_extensions).collect()
    }

    /// 文件名是否匹配本处理器的扩展名列表。
    pub fn accepts(&self, file_name: &str) -> bool {
        matches_extensions(file_name, &self.file_extensions)
    }

    /// 区域轮询：处理器只在配置的编辑器区域内生效。
    pub fn polls(&self, area: &str) -> bool {
        self.poll_area == area
    }
}
