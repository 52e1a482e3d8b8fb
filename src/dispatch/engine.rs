//! # 导入分发引擎
//!
//! ## 设计思路
//!
//! 一次投放（拖放 / 粘贴 / 文件浏览器选择）对应一个 `DispatchRequest`，引擎按固定流程处理：
//!
//! 1. 只保留出现次数最多的扩展名的文件（次数相同取最先出现者）
//! 2. 按编辑器区域 + 扩展名匹配处理器：没有匹配则静默放弃，多个匹配交给 `HandlerChooser`
//! 3. 执行批次前钩子
//! 4. 逐个文件：扩展名复核 → 单文件前钩子 → 调用导入操作符 → 记录新选中 → 单文件后钩子
//! 5. 执行批次后钩子
//! 6. 恢复所有文件累计的选择集，有节点时第一个节点设为活动节点
//!
//! ## 实现思路
//!
//! - 引擎本身无状态，只持有注册表与脚本库；宿主、脚本运行器、选择器都由调用方传入。
//! - 操作符 id 无效或宿主不认识：每个文件记一条警告，以空操作代替导入，批次继续，钩子照常执行。
//! - 钩子脚本报错或宿主导入报错：立即返回 `Err`，批次终止，后续钩子不再执行。

use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};
use serde::Serialize;

use super::definition::OperatorId;
use super::error::DispatchError;
use super::extension::filter_majority;
use super::host::{EntityId, HandlerChooser, ImportCall, ImportHost};
use super::registry::{HandlerRegistry, RegisteredHandler};
use super::scripts::{EachContext, HookContext, HookPoint, ScriptLibrary, ScriptRunner};

/// 文件来源。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropSource {
    #[default]
    DragDrop,
    Clipboard,
    FileBrowser,
}

/// 触发本次分发的事件。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DropEvent {
    pub source: DropSource,
    /// 鼠标位置（区域坐标），粘贴时没有。
    pub cursor: Option<(i32, i32)>,
}

impl DropEvent {
    pub fn new(source: DropSource) -> Self {
        Self { source, cursor: None }
    }

    pub fn at(mut self, x: i32, y: i32) -> Self {
        self.cursor = Some((x, y));
        self
    }
}

/// 一次投放请求。
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchRequest {
    pub directory: PathBuf,
    /// 相对 `directory` 的文件名，保持投放顺序。
    pub files: Vec<String>,
    pub area: String,
    pub event: DropEvent,
}

impl DispatchRequest {
    pub fn new(directory: impl Into<PathBuf>, files: Vec<String>, area: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            files,
            area: area.into(),
            event: DropEvent::default(),
        }
    }

    /// 由完整路径构造：目录取第一个文件的父目录。
    ///
    /// 与第一个文件不在同一目录的文件仍以完整路径保存在 `files` 中，`Path::join` 会保留绝对路径。
    pub fn from_paths<P: AsRef<Path>>(paths: &[P], area: impl Into<String>) -> Self {
        let directory = paths
            .first()
            .and_then(|p| p.as_ref().parent())
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let files = paths
            .iter()
            .map(|p| {
                let path = p.as_ref();
                match (path.parent(), path.file_name()) {
                    (Some(parent), Some(name)) if parent == directory.as_path() => name.to_string_lossy().into_owned(),
                    _ => path.to_string_lossy().into_owned(),
                }
            })
            .collect();

        Self::new(directory, files, area)
    }

    pub fn with_event(mut self, event: DropEvent) -> Self {
        self.event = event;
        self
    }

    fn filtered_files(&self) -> Vec<String> {
        filter_majority(&self.files)
    }
}

/// 分发计划：实际执行前的处理器匹配结果。
#[derive(Debug)]
pub enum DispatchPlan<'a> {
    /// 目录为空或过滤后没有文件。
    Cancelled,
    /// 没有处理器能处理这些文件。
    NoHandler { files: Vec<String> },
    Ready {
        handler: &'a RegisteredHandler,
        files: Vec<String>,
    },
    /// 多个处理器可用，需要显式选择。
    Choice {
        candidates: Vec<&'a RegisteredHandler>,
        files: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    Finished,
    Cancelled,
    NoHandler,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// 一次分发的结果汇总。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub status: DispatchStatus,
    pub handler: Option<String>,
    pub imported: Vec<PathBuf>,
    pub skipped: Vec<SkippedFile>,
    pub selected_objects: Vec<EntityId>,
    pub selected_nodes: Vec<EntityId>,
}

impl DispatchReport {
    fn empty(status: DispatchStatus) -> Self {
        Self {
            status,
            handler: None,
            imported: Vec::new(),
            skipped: Vec::new(),
            selected_objects: Vec::new(),
            selected_nodes: Vec::new(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status == DispatchStatus::Finished
    }
}

pub struct DispatchEngine {
    registry: HandlerRegistry,
    scripts: ScriptLibrary,
}

impl DispatchEngine {
    pub fn new(registry: HandlerRegistry, scripts: ScriptLibrary) -> Self {
        Self { registry, scripts }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut HandlerRegistry {
        &mut self.registry
    }

    pub fn scripts(&self) -> &ScriptLibrary {
        &self.scripts
    }

    pub fn plan(&self, request: &DispatchRequest) -> DispatchPlan<'_> {
        if request.directory.as_os_str().is_empty() {
            debug!("请求没有目录，取消");
            return DispatchPlan::Cancelled;
        }
        let files = request.filtered_files();
        if files.is_empty() {
            debug!("过滤后没有文件，取消");
            return DispatchPlan::Cancelled;
        }

        let mut candidates = self.registry.candidates(&request.area, &files);
        match candidates.len() {
            0 => DispatchPlan::NoHandler { files },
            1 => DispatchPlan::Ready {
                handler: candidates.remove(0),
                files,
            },
            _ => DispatchPlan::Choice { candidates, files },
        }
    }

    /// 完整分发一次投放。
    pub fn dispatch<H, R, C>(
        &self,
        request: &DispatchRequest,
        host: &mut H,
        runner: &mut R,
        chooser: &mut C,
    ) -> Result<DispatchReport, DispatchError>
    where
        H: ImportHost + ?Sized,
        R: ScriptRunner + ?Sized,
        C: HandlerChooser + ?Sized,
    {
        let handler = match self.plan(request) {
            DispatchPlan::Cancelled => return Ok(DispatchReport::empty(DispatchStatus::Cancelled)),
            DispatchPlan::NoHandler { files } => {
                debug!("区域 {} 中没有处理器能导入 {:?}", request.area, files);
                return Ok(DispatchReport::empty(DispatchStatus::NoHandler));
            }
            DispatchPlan::Ready { handler, .. } => handler,
            DispatchPlan::Choice { candidates, .. } => match chooser.choose(&candidates) {
                Some(index) if index < candidates.len() => candidates[index],
                _ => {
                    info!("用户取消了处理器选择");
                    return Ok(DispatchReport::empty(DispatchStatus::Cancelled));
                }
            },
        };
        self.run_handler(handler, request, host, runner)
    }

    /// 按标签直接执行某个处理器（对应文件浏览器选择完成后的执行路径）。
    pub fn run_label<H, R>(
        &self,
        label: &str,
        request: &DispatchRequest,
        host: &mut H,
        runner: &mut R,
    ) -> Result<DispatchReport, DispatchError>
    where
        H: ImportHost + ?Sized,
        R: ScriptRunner + ?Sized,
    {
        let handler = self
            .registry
            .get(label)
            .ok_or_else(|| DispatchError::UnknownHandler(label.to_string()))?;
        self.run_handler(handler, request, host, runner)
    }

    pub fn run_handler<H, R>(
        &self,
        handler: &RegisteredHandler,
        request: &DispatchRequest,
        host: &mut H,
        runner: &mut R,
    ) -> Result<DispatchReport, DispatchError>
    where
        H: ImportHost + ?Sized,
        R: ScriptRunner + ?Sized,
    {
        let result = self.run_batch(handler, request, host, runner);
        if let Err(e) = &result {
            error!("❌ 处理器 '{}' 的批次已终止：{}", handler.label(), e);
        }
        result
    }

    fn run_batch<H, R>(
        &self,
        handler: &RegisteredHandler,
        request: &DispatchRequest,
        host: &mut H,
        runner: &mut R,
    ) -> Result<DispatchReport, DispatchError>
    where
        H: ImportHost + ?Sized,
        R: ScriptRunner + ?Sized,
    {
        let definition = &handler.definition;
        if request.directory.as_os_str().is_empty() {
            return Ok(DispatchReport::empty(DispatchStatus::Cancelled));
        }
        let files = request.filtered_files();
        if files.is_empty() {
            return Ok(DispatchReport::empty(DispatchStatus::Cancelled));
        }

        let operator = self.resolve_operator(handler, host);
        let mut report = DispatchReport::empty(DispatchStatus::Finished);
        report.handler = Some(handler.label().to_string());

        let batch_context = |point: HookPoint, each: Option<EachContext>| HookContext {
            point,
            directory: request.directory.clone(),
            files: files.clone(),
            event: request.event.clone(),
            each,
        };

        self.run_hook(handler, &batch_context(HookPoint::BeforeAll, None), runner)?;

        for (index, name) in files.iter().enumerate() {
            let filepath = request.directory.join(name);
            if !definition.accepts(name) {
                debug!("文件 {} 不匹配 {}，跳过", name, definition.file_extensions);
                report.skipped.push(SkippedFile {
                    path: filepath,
                    reason: format!("扩展名不在 '{}' 中", definition.file_extensions),
                });
                continue;
            }

            let each = |objects: &[EntityId], nodes: &[EntityId]| EachContext {
                filepath: filepath.clone(),
                index,
                selected_objects: objects.to_vec(),
                selected_nodes: nodes.to_vec(),
            };
            let before = batch_context(
                HookPoint::BeforeEach,
                Some(each(&report.selected_objects, &report.selected_nodes)),
            );
            self.run_hook(handler, &before, runner)?;

            match &operator {
                Some(op) => {
                    let call = ImportCall {
                        operator: op.clone(),
                        context: definition.operator_context,
                        filepath: filepath.clone(),
                        kwargs: definition.kwargs.clone(),
                    };
                    host.invoke_import(&call).map_err(|source| DispatchError::Import {
                        path: filepath.clone(),
                        source,
                    })?;
                    merge_selection(&mut report.selected_objects, host.selected_objects());
                    merge_selection(&mut report.selected_nodes, host.selected_nodes());
                    report.imported.push(filepath.clone());
                }
                None => {
                    warn!(
                        "⚠️ 处理器 '{}' 的导入操作符 '{}' 不可用，跳过 {}",
                        handler.label(),
                        definition.import_operator,
                        filepath.display()
                    );
                    report.skipped.push(SkippedFile {
                        path: filepath.clone(),
                        reason: format!("导入操作符 '{}' 不可用", definition.import_operator),
                    });
                }
            }

            let after = batch_context(
                HookPoint::AfterEach,
                Some(each(&report.selected_objects, &report.selected_nodes)),
            );
            self.run_hook(handler, &after, runner)?;
        }

        self.run_hook(handler, &batch_context(HookPoint::AfterAll, None), runner)?;

        host.select(&report.selected_objects, &report.selected_nodes);
        if let Some(first) = report.selected_nodes.first() {
            host.set_active_node(first);
        }

        info!(
            "✅ 处理器 '{}' 完成：导入 {} 个，跳过 {} 个",
            handler.label(),
            report.imported.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    fn resolve_operator<H>(&self, handler: &RegisteredHandler, host: &H) -> Option<OperatorId>
    where
        H: ImportHost + ?Sized,
    {
        match handler.definition.operator() {
            Ok(op) if host.has_operator(&op) => Some(op),
            Ok(op) => {
                warn!("⚠️ 宿主中不存在导入操作符 '{}'（处理器 '{}'）", op, handler.label());
                None
            }
            Err(e) => {
                warn!("⚠️ 处理器 '{}'：{}", handler.label(), e);
                None
            }
        }
    }

    fn run_hook<R>(&self, handler: &RegisteredHandler, context: &HookContext, runner: &mut R) -> Result<(), DispatchError>
    where
        R: ScriptRunner + ?Sized,
    {
        let Some(name) = handler.definition.scripts.get(context.point) else {
            return Ok(());
        };
        let Some(script) = self.scripts.load(name) else {
            return Ok(());
        };
        debug!("▶️ 执行钩子 {}：{}", context.point, script.path.display());
        runner.run(&script, context).map_err(|source| DispatchError::Hook {
            point: context.point,
            script: name.to_string(),
            source,
        })
    }
}

fn merge_selection(aggregate: &mut Vec<EntityId>, current: Vec<EntityId>) {
    for id in current {
        if !aggregate.contains(&id) {
            aggregate.push(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{HandlerDefinition, HookError, HostError};
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[derive(Default)]
    struct RecordingHost {
        calls: Vec<ImportCall>,
        selection: Vec<EntityId>,
        restored: Option<Vec<EntityId>>,
        fail_on: Option<String>,
    }

    impl ImportHost for RecordingHost {
        fn invoke_import(&mut self, call: &ImportCall) -> Result<(), HostError> {
            let stem = call.filepath.file_stem().unwrap().to_string_lossy().into_owned();
            if self.fail_on.as_deref() == Some(stem.as_str()) {
                return Err(HostError::new("broken file"));
            }
            self.calls.push(call.clone());
            self.selection = vec![EntityId::new(stem)];
            Ok(())
        }

        fn selected_objects(&self) -> Vec<EntityId> {
            self.selection.clone()
        }

        fn select(&mut self, objects: &[EntityId], _nodes: &[EntityId]) {
            self.restored = Some(objects.to_vec());
        }
    }

    fn engine(definitions: Vec<HandlerDefinition>, scripts: &Path) -> DispatchEngine {
        DispatchEngine::new(HandlerRegistry::from_definitions(definitions), ScriptLibrary::new(scripts))
    }

    fn no_scripts() -> PathBuf {
        std::env::temp_dir().join("drag_import_engine_no_scripts")
    }

    fn never_choose(_: &[&RegisteredHandler]) -> Option<usize> {
        panic!("chooser should not be consulted")
    }

    fn no_hooks(_: &crate::dispatch::HookScript, _: &HookContext) -> Result<(), HookError> {
        Ok(())
    }

    #[test]
    fn imports_each_file_in_order_and_restores_selection() {
        let engine = engine(
            vec![HandlerDefinition::new("PNG Importer", "image.import_as_planes", ".png", "VIEW_3D")],
            &no_scripts(),
        );
        let request = DispatchRequest::new("/tmp/drop", vec!["x.png".into(), "y.png".into()], "VIEW_3D");
        let mut host = RecordingHost::default();

        let report = engine
            .dispatch(&request, &mut host, &mut no_hooks, &mut never_choose)
            .unwrap();

        let paths: Vec<_> = host.calls.iter().map(|c| c.filepath.clone()).collect();
        assert_eq!(paths, [PathBuf::from("/tmp/drop/x.png"), PathBuf::from("/tmp/drop/y.png")]);
        assert_eq!(report.status, DispatchStatus::Finished);
        assert_eq!(report.selected_objects, [EntityId::new("x"), EntityId::new("y")]);
        assert_eq!(host.restored, Some(vec![EntityId::new("x"), EntityId::new("y")]));
    }

    #[test]
    fn minority_extensions_are_dropped_before_matching() {
        let engine = engine(
            vec![HandlerDefinition::new("OBJ", "wm.obj_import", ".obj;.fbx", "VIEW_3D")],
            &no_scripts(),
        );
        let request = DispatchRequest::new(
            "/tmp/drop",
            vec!["a.fbx".into(), "b.obj".into(), "c.obj".into()],
            "VIEW_3D",
        );
        let mut host = RecordingHost::default();
        engine
            .dispatch(&request, &mut host, &mut no_hooks, &mut never_choose)
            .unwrap();
        assert_eq!(host.calls.len(), 2);
    }

    #[test]
    fn empty_directory_or_files_cancel_silently() {
        let engine = engine(vec![HandlerDefinition::new("OBJ", "wm.obj_import", ".obj", "VIEW_3D")], &no_scripts());
        let mut host = RecordingHost::default();

        for request in [
            DispatchRequest::new("", vec!["a.obj".into()], "VIEW_3D"),
            DispatchRequest::new("/tmp/drop", Vec::new(), "VIEW_3D"),
        ] {
            let report = engine
                .dispatch(&request, &mut host, &mut no_hooks, &mut never_choose)
                .unwrap();
            assert_eq!(report.status, DispatchStatus::Cancelled);
        }
        assert!(host.calls.is_empty());
        assert!(host.restored.is_none());
    }

    #[test]
    fn multiple_candidates_go_through_chooser() {
        let engine = engine(
            vec![
                HandlerDefinition::new("Plane", "image.import_as_planes", ".png", "VIEW_3D"),
                HandlerDefinition::new("Reference", "object.empty_image_add", ".png", "VIEW_3D"),
            ],
            &no_scripts(),
        );
        let request = DispatchRequest::new("/tmp/drop", vec!["a.png".into()], "VIEW_3D");
        let mut host = RecordingHost::default();

        let mut offered = Vec::new();
        let mut chooser = |candidates: &[&RegisteredHandler]| -> Option<usize> {
            offered = candidates.iter().map(|c| c.label().to_string()).collect();
            Some(1)
        };
        let report = engine.dispatch(&request, &mut host, &mut no_hooks, &mut chooser).unwrap();

        assert_eq!(offered, ["Plane", "Reference"]);
        assert_eq!(report.handler.as_deref(), Some("Reference"));
        assert_eq!(host.calls[0].operator.to_string(), "object.empty_image_add");

        let mut cancel = |_: &[&RegisteredHandler]| -> Option<usize> { None };
        let report = engine.dispatch(&request, &mut host, &mut no_hooks, &mut cancel).unwrap();
        assert_eq!(report.status, DispatchStatus::Cancelled);
        assert_eq!(host.calls.len(), 1);
    }

    #[test]
    fn invalid_operator_skips_files_but_runs_hooks() {
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
        let scripts = std::env::temp_dir().join(format!("drag_import_engine_hooks_{nanos}"));
        fs::create_dir_all(&scripts).unwrap();
        fs::write(scripts.join("each.py"), "").unwrap();

        let engine = engine(
            vec![HandlerDefinition::new("Broken", "", ".obj", "VIEW_3D").with_script(HookPoint::AfterEach, "each.py")],
            &scripts,
        );
        let request = DispatchRequest::new("/tmp/drop", vec!["a.obj".into(), "b.obj".into()], "VIEW_3D");
        let mut host = RecordingHost::default();
        let mut seen = Vec::new();
        let mut runner = |_: &crate::dispatch::HookScript, ctx: &HookContext| -> Result<(), HookError> {
            seen.push(ctx.each.as_ref().map(|e| e.index));
            Ok(())
        };

        let report = engine
            .dispatch(&request, &mut host, &mut runner, &mut never_choose)
            .unwrap();

        assert!(host.calls.is_empty());
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(seen, [Some(0), Some(1)]);
        fs::remove_dir_all(&scripts).ok();
    }

    #[test]
    fn host_failure_aborts_batch() {
        let engine = engine(vec![HandlerDefinition::new("OBJ", "wm.obj_import", ".obj", "VIEW_3D")], &no_scripts());
        let request = DispatchRequest::new(
            "/tmp/drop",
            vec!["a.obj".into(), "b.obj".into(), "c.obj".into()],
            "VIEW_3D",
        );
        let mut host = RecordingHost {
            fail_on: Some("b".into()),
            ..Default::default()
        };

        let err = engine
            .dispatch(&request, &mut host, &mut no_hooks, &mut never_choose)
            .unwrap_err();
        assert!(matches!(err, DispatchError::Import { ref path, .. } if path.ends_with("b.obj")));
        assert_eq!(host.calls.len(), 1);
        assert!(host.restored.is_none());
    }

    #[test]
    fn run_label_rejects_unknown_handler() {
        let engine = engine(Vec::new(), &no_scripts());
        let request = DispatchRequest::new("/tmp/drop", vec!["a.obj".into()], "VIEW_3D");
        let err = engine
            .run_label("missing", &request, &mut RecordingHost::default(), &mut no_hooks)
            .unwrap_err();
        assert!(matches!(err, DispatchError::UnknownHandler(label) if label == "missing"));
    }

    #[test]
    fn request_from_paths_splits_directory() {
        let request = DispatchRequest::from_paths(
            &[PathBuf::from("/assets/a.obj"), PathBuf::from("/assets/b.obj"), PathBuf::from("/other/c.obj")],
            "VIEW_3D",
        );
        assert_eq!(request.directory, PathBuf::from("/assets"));
        assert_eq!(request.files, ["a.obj", "b.obj", "/other/c.obj"]);
        assert_eq!(request.directory.join(&request.files[2]), PathBuf::from("/other/c.obj"));
    }
}
