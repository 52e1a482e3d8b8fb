// 分发流程集成测试：磁盘配置 + 钩子脚本 + 模拟宿主
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use drag_import::dispatch::{
    ConfigStore, DispatchEngine, DispatchError, DispatchRequest, DispatchStatus, EntityId, HandlerDefinition,
    HandlerRegistry, HookContext, HookError, HookPoint, HookScript, HostError, ImportCall, ImportHost,
    OperatorContext, RegisteredHandler, ScriptLibrary,
};
use serde_json::json;

struct TempAsset {
    root: PathBuf,
}

impl TempAsset {
    fn new(name: &str) -> Self {
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
        let root = std::env::temp_dir().join(format!("drag_import_it_{name}_{nanos}"));
        fs::create_dir_all(root.join("config")).unwrap();
        fs::create_dir_all(root.join("scripts")).unwrap();
        Self { root }
    }

    fn script(&self, name: &str) {
        fs::write(self.root.join("scripts").join(name), format!("# {name}")).unwrap();
    }

    fn engine(&self) -> DispatchEngine {
        let mut registry = HandlerRegistry::new();
        registry.reload(&ConfigStore::new(self.root.join("config"))).unwrap();
        DispatchEngine::new(registry, ScriptLibrary::new(self.root.join("scripts")))
    }

    fn config(&self, file: &str, value: serde_json::Value) {
        fs::write(self.root.join("config").join(file), value.to_string()).unwrap();
    }
}

impl Drop for TempAsset {
    fn drop(&mut self) {
        fs::remove_dir_all(&self.root).ok();
    }
}

/// 记录调用顺序的宿主：每次导入后选中以文件名命名的对象。
#[derive(Default)]
struct MockHost {
    log: Vec<String>,
    selection: Vec<EntityId>,
    nodes: Vec<EntityId>,
    node_mode: bool,
    known_operators: Option<Vec<String>>,
    active_node: Option<EntityId>,
}

impl ImportHost for MockHost {
    fn has_operator(&self, operator: &drag_import::dispatch::OperatorId) -> bool {
        self.known_operators
            .as_ref()
            .is_none_or(|known| known.iter().any(|k| *k == operator.to_string()))
    }

    fn invoke_import(&mut self, call: &ImportCall) -> Result<(), HostError> {
        let stem = call.filepath.file_stem().unwrap().to_string_lossy().into_owned();
        self.log.push(format!("import {} {}", call.operator, stem));
        if self.node_mode {
            self.nodes = vec![EntityId::new(format!("{stem}_node"))];
        } else {
            self.selection = vec![EntityId::new(stem)];
        }
        Ok(())
    }

    fn selected_objects(&self) -> Vec<EntityId> {
        self.selection.clone()
    }

    fn selected_nodes(&self) -> Vec<EntityId> {
        self.nodes.clone()
    }

    fn select(&mut self, objects: &[EntityId], nodes: &[EntityId]) {
        self.log.push(format!("select {} objects {} nodes", objects.len(), nodes.len()));
    }

    fn set_active_node(&mut self, node: &EntityId) {
        self.active_node = Some(node.clone());
    }
}

fn first_handler(_: &[&RegisteredHandler]) -> Option<usize> {
    Some(0)
}

fn request(dir: &Path, files: &[&str], area: &str) -> DispatchRequest {
    DispatchRequest::new(dir, files.iter().map(|f| f.to_string()).collect(), area)
}

#[test]
fn png_importer_is_called_once_per_file_in_order() {
    let asset = TempAsset::new("png");
    asset.config(
        "default.json",
        json!({ "PNG Importer": { "bl_import_operator": "image.import_as_planes", "bl_file_extensions": ".png", "poll_area": "VIEW_3D" } }),
    );
    let engine = asset.engine();
    let mut host = MockHost::default();
    let mut runner = |_: &HookScript, _: &HookContext| -> Result<(), HookError> { Ok(()) };

    let report = engine
        .dispatch(
            &request(Path::new("/drop"), &["x.png", "y.png"], "VIEW_3D"),
            &mut host,
            &mut runner,
            &mut first_handler,
        )
        .unwrap();

    assert_eq!(
        host.log,
        [
            "import image.import_as_planes x",
            "import image.import_as_planes y",
            "select 2 objects 0 nodes"
        ]
    );
    assert_eq!(report.imported, [PathBuf::from("/drop/x.png"), PathBuf::from("/drop/y.png")]);
}

#[test]
fn hooks_run_in_documented_order_with_context() {
    let asset = TempAsset::new("hooks");
    for name in ["pre.py", "post.py", "each_pre.py", "each_post.py"] {
        asset.script(name);
    }
    asset.config(
        "mesh.json",
        json!({ "OBJ": {
            "bl_import_operator": "wm.obj_import",
            "bl_file_extensions": ".obj",
            "operator_context": "EXEC_DEFAULT",
            "pre_script": "pre.py",
            "post_script": "post",
            "foreach_pre_script": "each_pre.py",
            "foreach_post_script": "each_post.py",
            "kwargs": { "forward_axis": "Y" }
        } }),
    );
    let engine = asset.engine();
    let handler = engine.registry().get("OBJ").unwrap();
    assert_eq!(handler.definition.operator_context, OperatorContext::ExecDefault);
    assert_eq!(handler.definition.category, "mesh");

    let mut host = MockHost::default();
    let mut events = Vec::new();
    let mut runner = |script: &HookScript, ctx: &HookContext| -> Result<(), HookError> {
        let each = ctx
            .each
            .as_ref()
            .map(|e| format!(" #{} sel={}", e.index, e.selected_objects.len()))
            .unwrap_or_default();
        events.push(format!("{}{}", script.path.file_name().unwrap().to_string_lossy(), each));
        assert_eq!(ctx.files, ["a.obj", "b.obj"]);
        Ok(())
    };

    let report = engine
        .dispatch(
            &request(Path::new("/drop"), &["a.obj", "b.obj"], "VIEW_3D"),
            &mut host,
            &mut runner,
            &mut first_handler,
        )
        .unwrap();

    assert_eq!(
        events,
        [
            "pre.py",
            "each_pre.py #0 sel=0",
            "each_post.py #0 sel=1",
            "each_pre.py #1 sel=1",
            "each_post.py #1 sel=2",
            "post.py"
        ]
    );
    assert_eq!(report.selected_objects, [EntityId::new("a"), EntityId::new("b")]);
}

#[test]
fn nothing_matching_runs_no_hooks_and_no_operator() {
    let asset = TempAsset::new("nomatch");
    asset.script("pre.py");
    asset.config(
        "default.json",
        json!({ "FBX": { "bl_import_operator": "import_scene.fbx", "bl_file_extensions": ".fbx", "pre_script": "pre.py" } }),
    );
    let engine = asset.engine();
    let mut host = MockHost::default();
    let mut calls = 0;
    let mut runner = |_: &HookScript, _: &HookContext| -> Result<(), HookError> {
        calls += 1;
        Ok(())
    };

    for (files, area) in [(&["a.obj"][..], "VIEW_3D"), (&["a.fbx"][..], "NODE_EDITOR"), (&[][..], "VIEW_3D")] {
        let report = engine
            .dispatch(&request(Path::new("/drop"), files, area), &mut host, &mut runner, &mut first_handler)
            .unwrap();
        assert_ne!(report.status, DispatchStatus::Finished);
    }
    assert_eq!(calls, 0);
    assert!(host.log.is_empty());
}

#[test]
fn unknown_operator_warns_and_batch_continues() {
    let asset = TempAsset::new("unknownop");
    asset.config(
        "default.json",
        json!({
            "Empty": { "bl_import_operator": "", "bl_file_extensions": ".stl" },
            "Missing": { "bl_import_operator": "wm.not_installed", "bl_file_extensions": ".ply" }
        }),
    );
    let engine = asset.engine();
    let mut host = MockHost {
        known_operators: Some(vec!["wm.obj_import".into()]),
        ..Default::default()
    };
    let mut runner = |_: &HookScript, _: &HookContext| -> Result<(), HookError> { Ok(()) };

    for (files, label) in [(["a.stl", "b.stl"], "Empty"), (["a.ply", "b.ply"], "Missing")] {
        let report = engine
            .dispatch(&request(Path::new("/drop"), &files, "VIEW_3D"), &mut host, &mut runner, &mut first_handler)
            .unwrap();
        assert_eq!(report.status, DispatchStatus::Finished);
        assert_eq!(report.handler.as_deref(), Some(label));
        assert_eq!(report.skipped.len(), 2);
        assert!(report.imported.is_empty());
    }
    assert!(host.log.iter().all(|entry| entry.starts_with("select")));
}

#[test]
fn missing_script_is_ignored_but_failing_script_aborts() {
    let asset = TempAsset::new("scriptfail");
    asset.script("explode.py");
    asset.config(
        "default.json",
        json!({
            "OBJ": { "bl_import_operator": "wm.obj_import", "bl_file_extensions": ".obj", "pre_script": "not_there.py" },
            "STL": { "bl_import_operator": "wm.stl_import", "bl_file_extensions": ".stl", "foreach_post_script": "explode.py" }
        }),
    );
    let engine = asset.engine();
    let mut host = MockHost::default();
    let mut runner = |script: &HookScript, _: &HookContext| -> Result<(), HookError> {
        Err(HookError::new(format!("{} raised", script.name)))
    };

    let report = engine
        .dispatch(&request(Path::new("/drop"), &["a.obj"], "VIEW_3D"), &mut host, &mut runner, &mut first_handler)
        .unwrap();
    assert_eq!(report.imported.len(), 1);

    let err = engine
        .dispatch(
            &request(Path::new("/drop"), &["a.stl", "b.stl"], "VIEW_3D"),
            &mut host,
            &mut runner,
            &mut first_handler,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Hook { point: HookPoint::AfterEach, ref script, .. } if script == "explode.py"
    ));
    // 第一个文件导入后钩子失败，第二个文件不再导入
    assert_eq!(host.log.iter().filter(|e| e.contains("wm.stl_import")).count(), 1);
}

#[test]
fn node_imports_activate_first_node() {
    let asset = TempAsset::new("nodes");
    asset.config(
        "default.json",
        json!({ "Textures": { "bl_import_operator": "node.add_file", "bl_file_extensions": ".png", "poll_area": "NODE_EDITOR" } }),
    );
    let engine = asset.engine();
    let mut host = MockHost {
        node_mode: true,
        ..Default::default()
    };
    let mut runner = |_: &HookScript, _: &HookContext| -> Result<(), HookError> { Ok(()) };

    let report = engine
        .dispatch(
            &request(Path::new("/tex"), &["albedo.png", "normal.png"], "NODE_EDITOR"),
            &mut host,
            &mut runner,
            &mut first_handler,
        )
        .unwrap();
    assert_eq!(report.selected_nodes.len(), 2);
    assert_eq!(host.active_node, Some(EntityId::new("albedo_node")));
}

#[test]
fn registry_save_and_reload_is_lossless() {
    let asset = TempAsset::new("roundtrip");
    let store = ConfigStore::new(asset.root.join("config"));
    let registry = HandlerRegistry::from_definitions([
        HandlerDefinition::new("OBJ", "wm.obj_import", ".obj", "VIEW_3D")
            .with_script(HookPoint::AfterEach, "drop2floor.py")
            .with_script(HookPoint::BeforeAll, "")
            .with_kwarg("global_scale", json!(0.01)),
        HandlerDefinition::new("HDRI", "world.hdri_add", ".hdr;.exr", "VIEW_3D")
            .with_context(OperatorContext::ExecDefault)
            .with_category("lighting"),
    ]);
    registry.save(&store).unwrap();

    let mut reloaded = HandlerRegistry::new();
    assert_eq!(reloaded.reload(&store).unwrap(), 2);
    let obj = &reloaded.get("OBJ").unwrap().definition;
    assert_eq!(obj.scripts.pre_script, None);
    assert_eq!(obj.scripts.foreach_post_script.as_deref(), Some("drop2floor.py"));
    assert_eq!(obj.kwargs["global_scale"], json!(0.01));
    assert_eq!(
        reloaded.get("HDRI").unwrap().definition,
        registry.get("HDRI").unwrap().definition
    );
}
