//! # 进程内剪贴板
//!
//! 行为与 Win32 剪贴板保持一致（需先打开、独占、格式编号、注册格式从 `0xC000` 开始），
//! 供无系统剪贴板的宿主（无头环境、CI）以及测试使用。

use super::dropfiles::{encode_file_list, encode_unicode_text};
use super::{ClipboardBackend, ClipboardError, ClipboardFormat};

const FIRST_REGISTERED_ID: u32 = 0xC000;

#[derive(Debug, Default)]
pub struct MemoryClipboard {
    is_open: bool,
    deny_open: bool,
    open_count: usize,
    close_count: usize,
    entries: Vec<(u32, Vec<u8>)>,
    registered: Vec<String>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// 模拟剪贴板被其他进程占用。
    pub fn deny_open(mut self) -> Self {
        self.deny_open = true;
        self
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn open_count(&self) -> usize {
        self.open_count
    }

    pub fn close_count(&self) -> usize {
        self.close_count
    }

    /// 直接放入一块数据（无需打开剪贴板，用于预置内容）。
    pub fn put(&mut self, format_id: u32, data: Vec<u8>) {
        match self.entries.iter_mut().find(|(id, _)| *id == format_id) {
            Some(entry) => entry.1 = data,
            None => self.entries.push((format_id, data)),
        }
    }

    pub fn put_format(&mut self, format: ClipboardFormat, data: Vec<u8>) {
        let format_id = match format.standard_id() {
            Some(id) => id,
            None => self.register(format.registered_names()[0]),
        };
        self.put(format_id, data);
    }

    pub fn put_text(&mut self, text: &str) {
        self.put_format(ClipboardFormat::UnicodeText, encode_unicode_text(text));
    }

    pub fn put_file_paths<S: AsRef<str>>(&mut self, paths: &[S]) {
        self.put_format(ClipboardFormat::FileDropList, encode_file_list(paths));
    }

    pub fn data(&self, format_id: u32) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(id, _)| *id == format_id)
            .map(|(_, data)| data.as_slice())
    }

    fn register(&mut self, name: &str) -> u32 {
        let index = match self.registered.iter().position(|n| n.eq_ignore_ascii_case(name)) {
            Some(index) => index,
            None => {
                self.registered.push(name.to_string());
                self.registered.len() - 1
            }
        };
        FIRST_REGISTERED_ID + index as u32
    }

    fn ensure_open(&self) -> Result<(), ClipboardError> {
        if self.is_open {
            Ok(())
        } else {
            Err(ClipboardError::Access("剪贴板未打开".to_string()))
        }
    }
}

impl ClipboardBackend for MemoryClipboard {
    fn open(&mut self) -> Result<(), ClipboardError> {
        if self.deny_open {
            return Err(ClipboardError::Access("剪贴板被其他进程占用".to_string()));
        }
        if self.is_open {
            return Err(ClipboardError::Access("剪贴板已被打开".to_string()));
        }
        self.is_open = true;
        self.open_count += 1;
        Ok(())
    }

    fn close(&mut self) {
        if self.is_open {
            self.is_open = false;
            self.close_count += 1;
        }
    }

    fn is_format_available(&mut self, format_id: u32) -> bool {
        self.data(format_id).is_some()
    }

    fn register_format(&mut self, name: &str) -> Result<u32, ClipboardError> {
        Ok(self.register(name))
    }

    fn read_data(&mut self, format_id: u32) -> Result<Vec<u8>, ClipboardError> {
        self.ensure_open()?;
        self.data(format_id)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| ClipboardError::Access(format!("无法读取格式 {} 的数据", format_id)))
    }

    fn enumerate_formats(&mut self) -> Result<Vec<u32>, ClipboardError> {
        self.ensure_open()?;
        Ok(self.entries.iter().map(|(id, _)| *id).collect())
    }

    fn format_name(&mut self, format_id: u32) -> Option<String> {
        let index = format_id.checked_sub(FIRST_REGISTERED_ID)? as usize;
        self.registered.get(index).cloned()
    }

    fn empty(&mut self) -> Result<(), ClipboardError> {
        self.ensure_open()?;
        self.entries.clear();
        Ok(())
    }

    fn write_data(&mut self, format_id: u32, data: &[u8]) -> Result<(), ClipboardError> {
        self.ensure_open()?;
        self.put(format_id, data.to_vec());
        Ok(())
    }
}
