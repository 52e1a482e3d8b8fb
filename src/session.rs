//! # 投放会话
//!
//! ## 设计思路
//!
//! `DropSession` 是应用运行期间唯一持有处理器注册表的对象：
//! 启动时从资源目录加载设置与配置，配置保存后整体重建注册表。
//! 文件来源有两种：拖放 / 文件浏览器给出的路径，以及键盘粘贴时从剪贴板读到的路径。
//!
//! ## 实现思路
//!
//! - 剪贴板读取在独立的作用域内完成，会话守卫在分发开始前就已释放。
//! - 剪贴板上有文件列表时直接使用；否则按设置中的优先级读取图片，保存到 `pasted/` 后作为单个文件分发。

use std::path::{Path, PathBuf};

use chrono::Local;
use log::{debug, info};

use crate::clipboard::{ClipboardBackend, ClipboardFormat, ClipboardReader};
use crate::dispatch::{
    ConfigStore, DispatchEngine, DispatchReport, DispatchRequest, DropEvent, DropSource, HandlerChooser,
    HandlerRegistry, ImportHost, ScriptLibrary, ScriptRunner,
};
use crate::error::AppError;
use crate::settings::{AppSettings, load_settings};
use crate::storage::AssetLayout;

pub struct DropSession {
    layout: AssetLayout,
    settings: AppSettings,
    store: ConfigStore,
    engine: DispatchEngine,
}

impl DropSession {
    /// 准备资源目录并加载设置与处理器配置。
    pub fn open(layout: AssetLayout) -> Result<Self, AppError> {
        layout.ensure_dirs()?;
        let settings = load_settings(&layout.settings_file())?;
        let store = ConfigStore::new(layout.config_dir());

        let mut registry = HandlerRegistry::new();
        registry.reload(&store)?;
        let engine = DispatchEngine::new(registry, ScriptLibrary::new(layout.scripts_dir()));

        info!("🚀 投放会话已就绪：{}", layout.root().display());
        Ok(Self {
            layout,
            settings,
            store,
            engine,
        })
    }

    pub fn layout(&self) -> &AssetLayout {
        &self.layout
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn engine(&self) -> &DispatchEngine {
        &self.engine
    }

    pub fn registry_mut(&mut self) -> &mut HandlerRegistry {
        self.engine.registry_mut()
    }

    /// 从配置目录重建注册表，返回处理器数量。
    pub fn reload(&mut self) -> Result<usize, AppError> {
        Ok(self.engine.registry_mut().reload(&self.store)?)
    }

    /// 把当前注册表写回配置目录，再重新加载。
    pub fn save_handlers(&mut self) -> Result<usize, AppError> {
        self.engine.registry().save(&self.store)?;
        self.reload()
    }

    /// 分发一批完整路径。
    pub fn drop_files<H, R, C>(
        &self,
        paths: &[PathBuf],
        area: &str,
        event: DropEvent,
        host: &mut H,
        runner: &mut R,
        chooser: &mut C,
    ) -> Result<DispatchReport, AppError>
    where
        H: ImportHost + ?Sized,
        R: ScriptRunner + ?Sized,
        C: HandlerChooser + ?Sized,
    {
        let request = DispatchRequest::from_paths(paths, area).with_event(event);
        Ok(self.engine.dispatch(&request, host, runner, chooser)?)
    }

    /// 读取剪贴板上的文件列表；没有文件列表时把图片保存到 `pasted/` 并返回其路径。
    ///
    /// 剪贴板上两者都没有时返回空列表。
    pub fn collect_clipboard_paths<B: ClipboardBackend>(
        &self,
        reader: &mut ClipboardReader<B>,
    ) -> Result<Vec<PathBuf>, AppError> {
        let mut session = reader.open()?;

        if session.is_format_available(ClipboardFormat::FileDropList) {
            let paths = session.read_file_paths()?;
            debug!("剪贴板文件列表：{:?}", paths);
            return Ok(paths.into_iter().map(PathBuf::from).collect());
        }

        let priority = &self.settings.image_priority;
        if !priority
            .iter()
            .any(|format| format.is_image() && session.is_format_available(*format))
        {
            debug!("剪贴板中没有文件或图片");
            return Ok(Vec::new());
        }

        let image = session.read_image(priority)?;
        session.close();

        let stem = format!(
            "{}_{}",
            self.settings.paste_file_stem,
            Local::now().format("%Y%m%d%H%M%S%f")
        );
        let path = image.save(&self.layout.pasted_dir(), &stem)?;
        Ok(vec![path])
    }

    /// 键盘粘贴：读取剪贴板后按拖放流程分发。
    pub fn paste_from_clipboard<B, H, R, C>(
        &self,
        reader: &mut ClipboardReader<B>,
        area: &str,
        host: &mut H,
        runner: &mut R,
        chooser: &mut C,
    ) -> Result<DispatchReport, AppError>
    where
        B: ClipboardBackend,
        H: ImportHost + ?Sized,
        R: ScriptRunner + ?Sized,
        C: HandlerChooser + ?Sized,
    {
        let paths = self.collect_clipboard_paths(reader)?;
        self.drop_files(&paths, area, DropEvent::new(DropSource::Clipboard), host, runner, chooser)
    }

    /// 保存设置并释放注册表。
    pub fn shutdown(mut self) -> Result<(), AppError> {
        crate::settings::save_settings(&self.layout.settings_file(), &self.settings)?;
        self.engine.registry_mut().clear();
        info!("👋 投放会话已关闭");
        Ok(())
    }

    pub fn pasted_dir(&self) -> PathBuf {
        self.layout.pasted_dir()
    }

    pub fn asset_root(&self) -> &Path {
        self.layout.root()
    }
}
