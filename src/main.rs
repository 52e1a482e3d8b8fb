//! # 拖放导入工具 — 命令行入口
//!
//! 本文件只负责参数解析、日志初始化与预览宿主。
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。
//!
//! ```text
//! drag-import [--asset-dir DIR] [--area AREA] [--list] [FILES...]
//! ```
//!
//! 不带文件时从系统剪贴板粘贴。

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use drag_import::clipboard;
use drag_import::dispatch::{
    DropEvent, DropSource, EntityId, HookContext, HookError, HookScript, HostError, ImportCall, ImportHost,
    RegisteredHandler, area_display_name,
};
use drag_import::error::AppError;
use drag_import::session::DropSession;
use drag_import::storage::AssetLayout;

#[derive(Debug, Default)]
struct CliArgs {
    asset_dir: Option<PathBuf>,
    area: Option<String>,
    list: bool,
    files: Vec<PathBuf>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Option<CliArgs>, String> {
    let mut parsed = CliArgs::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--list" => parsed.list = true,
            "--asset-dir" => {
                let dir = args.next().ok_or("--asset-dir 需要一个目录参数")?;
                parsed.asset_dir = Some(PathBuf::from(dir));
            }
            "--area" => {
                parsed.area = Some(args.next().ok_or("--area 需要一个编辑器区域参数")?);
            }
            flag if flag.starts_with("--") => return Err(format!("未知参数: {flag}")),
            _ => parsed.files.push(PathBuf::from(arg)),
        }
    }
    Ok(Some(parsed))
}

const USAGE: &str = "用法: drag-import [--asset-dir DIR] [--area AREA] [--list] [FILES...]";

/// 预览宿主：不调用任何真实应用，只记录导入调用，并以文件名模拟导入产生的对象。
#[derive(Default)]
struct PreviewHost {
    area: String,
    objects: Vec<EntityId>,
    nodes: Vec<EntityId>,
}

impl ImportHost for PreviewHost {
    fn invoke_import(&mut self, call: &ImportCall) -> Result<(), HostError> {
        log::info!(
            "📥 {}('{}', filepath='{}', kwargs={})",
            call.operator,
            call.context.as_str(),
            call.filepath.display(),
            serde_json::Value::Object(call.kwargs.clone())
        );
        let name = call
            .filepath
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .ok_or_else(|| HostError::new(format!("无效的文件路径: {}", call.filepath.display())))?;

        if self.area == "NODE_EDITOR" {
            self.nodes = vec![EntityId::new(name)];
        } else {
            self.objects = vec![EntityId::new(name)];
        }
        Ok(())
    }

    fn selected_objects(&self) -> Vec<EntityId> {
        self.objects.clone()
    }

    fn selected_nodes(&self) -> Vec<EntityId> {
        self.nodes.clone()
    }

    fn select(&mut self, objects: &[EntityId], nodes: &[EntityId]) {
        log::info!("🔘 恢复选择：对象 {:?}，节点 {:?}", objects, nodes);
        self.objects = objects.to_vec();
        self.nodes = nodes.to_vec();
    }

    fn set_active_node(&mut self, node: &EntityId) {
        log::info!("⭐ 活动节点：{}", node);
    }
}

/// 预览模式下不执行脚本，只打印脚本位置与注入的变量。
fn preview_script(script: &HookScript, context: &HookContext) -> Result<(), HookError> {
    log::info!(
        "📜 [{}] {} {}",
        context.point,
        script.path.display(),
        context.to_bindings()
    );
    Ok(())
}

/// 多个处理器可用时，从标准输入读取选择。
fn choose_from_stdin(candidates: &[&RegisteredHandler]) -> Option<usize> {
    let mut stderr = io::stderr();
    for (index, handler) in candidates.iter().enumerate() {
        let _ = writeln!(
            stderr,
            "  [{}] {} ({})",
            index + 1,
            handler.label(),
            handler.definition.import_operator
        );
    }
    let _ = write!(stderr, "选择处理器 (回车取消): ");
    let _ = stderr.flush();

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).ok()?;
    let choice: usize = line.trim().parse().ok()?;
    choice.checked_sub(1).filter(|index| *index < candidates.len())
}

fn print_catalogue(session: &DropSession) {
    println!("资源目录: {}", session.asset_root().display());
    println!("处理器:");
    for handler in session.engine().registry().iter() {
        let definition = &handler.definition;
        println!(
            "  {:<24} {:<20} {:<14} {} [{}]",
            definition.label,
            definition.file_extensions,
            area_display_name(&definition.poll_area),
            definition.import_operator,
            handler.operator_idname
        );
    }
    println!("脚本:");
    for script in session.engine().scripts().list() {
        println!("  {}", script.display());
    }
}

fn run(args: CliArgs) -> Result<(), AppError> {
    let layout = AssetLayout::resolve(args.asset_dir.as_deref())?;
    let session = DropSession::open(layout)?;

    if args.list {
        print_catalogue(&session);
        return Ok(());
    }

    let area = args.area.unwrap_or_else(|| session.settings().default_area.clone());
    let mut host = PreviewHost {
        area: area.clone(),
        ..Default::default()
    };
    let mut runner = preview_script;
    let mut chooser = choose_from_stdin;

    let report = if args.files.is_empty() {
        let mut reader = clipboard::system_reader();
        session.paste_from_clipboard(&mut reader, &area, &mut host, &mut runner, &mut chooser)?
    } else {
        let files: Vec<PathBuf> = args
            .files
            .iter()
            .map(|path| std::path::absolute(path).unwrap_or_else(|_| path.clone()))
            .collect();
        session.drop_files(
            &files,
            &area,
            DropEvent::new(DropSource::DragDrop),
            &mut host,
            &mut runner,
            &mut chooser,
        )?
    };

    let output = serde_json::to_string_pretty(&report).map_err(|e| AppError::Settings(e.to_string()))?;
    println!("{output}");
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(Some(args)) => args,
        Ok(None) => {
            println!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        Err(message) => {
            eprintln!("{message}\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("❌ {err}");
            ExitCode::FAILURE
        }
    }
}
