//! # Windows 原生剪贴板后端
//!
//! ## 实现思路
//!
//! - 读取：`GetClipboardData` → `GlobalLock` → 按 `GlobalSize` 整块复制 → `GlobalUnlock`。
//!   复制完成后不再持有任何系统指针，解码在剪贴板之外进行。
//! - 写入：`GlobalAlloc(GMEM_MOVEABLE)` → 拷贝 → `SetClipboardData`，
//!   失败时释放全局内存（成功后所有权归系统）。
//! - 所有调用失败都映射为 `ClipboardError::Access`，附带原始 HRESULT。

use std::ptr::copy_nonoverlapping;

use windows::Win32::Foundation::{GlobalFree, HANDLE, HGLOBAL};
use windows::Win32::System::DataExchange::{
    CloseClipboard, EmptyClipboard, EnumClipboardFormats, GetClipboardData,
    GetClipboardFormatNameW, IsClipboardFormatAvailable, OpenClipboard, RegisterClipboardFormatW,
    SetClipboardData,
};
use windows::Win32::System::Memory::{GMEM_MOVEABLE, GlobalAlloc, GlobalLock, GlobalSize, GlobalUnlock};
use windows::core::PCWSTR;

use super::{ClipboardBackend, ClipboardError};

/// 基于 Win32 API 的系统剪贴板。
#[derive(Debug, Default)]
pub struct Win32Clipboard {
    is_open: bool,
}

impl Win32Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_open(&self) -> Result<(), ClipboardError> {
        if self.is_open {
            Ok(())
        } else {
            Err(ClipboardError::Access("剪贴板未打开".to_string()))
        }
    }
}

fn access_error(operation: &str, err: &windows::core::Error) -> ClipboardError {
    ClipboardError::Access(format!(
        "{}失败: hr=0x{:08X} detail={}",
        operation,
        err.code().0 as u32,
        err.message()
    ))
}

impl ClipboardBackend for Win32Clipboard {
    fn open(&mut self) -> Result<(), ClipboardError> {
        if self.is_open {
            return Err(ClipboardError::Access("剪贴板已被打开".to_string()));
        }
        unsafe { OpenClipboard(None) }.map_err(|e| access_error("打开剪贴板", &e))?;
        self.is_open = true;
        Ok(())
    }

    fn close(&mut self) {
        if self.is_open {
            if let Err(err) = unsafe { CloseClipboard() } {
                log::warn!("关闭剪贴板失败: {}", err);
            }
            self.is_open = false;
        }
    }

    fn is_format_available(&mut self, format_id: u32) -> bool {
        unsafe { IsClipboardFormatAvailable(format_id) }.is_ok()
    }

    fn register_format(&mut self, name: &str) -> Result<u32, ClipboardError> {
        let wide: Vec<u16> = name.encode_utf16().chain(std::iter::once(0)).collect();
        let format_id = unsafe { RegisterClipboardFormatW(PCWSTR(wide.as_ptr())) };
        if format_id == 0 {
            return Err(ClipboardError::Access(format!("注册格式 '{}' 失败", name)));
        }
        Ok(format_id)
    }

    fn read_data(&mut self, format_id: u32) -> Result<Vec<u8>, ClipboardError> {
        self.ensure_open()?;
        unsafe {
            let handle = GetClipboardData(format_id).map_err(|e| access_error("GetClipboardData", &e))?;
            let hglobal = HGLOBAL(handle.0);

            let ptr = GlobalLock(hglobal) as *const u8;
            if ptr.is_null() {
                return Err(ClipboardError::Access("GlobalLock 返回空指针".to_string()));
            }
            let size = GlobalSize(hglobal);
            let mut data = vec![0u8; size];
            copy_nonoverlapping(ptr, data.as_mut_ptr(), size);
            let _ = GlobalUnlock(hglobal);
            Ok(data)
        }
    }

    fn enumerate_formats(&mut self) -> Result<Vec<u32>, ClipboardError> {
        self.ensure_open()?;
        let mut formats = Vec::new();
        // 传入上一个格式（从 0 开始）才能拿到下一个
        let mut current = 0;
        loop {
            current = unsafe { EnumClipboardFormats(current) };
            if current == 0 {
                break;
            }
            formats.push(current);
        }
        Ok(formats)
    }

    fn format_name(&mut self, format_id: u32) -> Option<String> {
        let mut buf = [0u16; 256];
        let len = unsafe { GetClipboardFormatNameW(format_id, &mut buf) };
        if len <= 0 {
            return None;
        }
        Some(String::from_utf16_lossy(&buf[..len as usize]))
    }

    fn empty(&mut self) -> Result<(), ClipboardError> {
        self.ensure_open()?;
        unsafe { EmptyClipboard() }.map_err(|e| access_error("清空剪贴板", &e))
    }

    fn write_data(&mut self, format_id: u32, data: &[u8]) -> Result<(), ClipboardError> {
        self.ensure_open()?;
        unsafe {
            let hglobal = GlobalAlloc(GMEM_MOVEABLE, data.len()).map_err(|e| access_error("GlobalAlloc", &e))?;

            let ptr = GlobalLock(hglobal) as *mut u8;
            if ptr.is_null() {
                let _ = GlobalFree(Some(hglobal));
                return Err(ClipboardError::Access("GlobalLock 返回空指针".to_string()));
            }
            copy_nonoverlapping(data.as_ptr(), ptr, data.len());
            let _ = GlobalUnlock(hglobal);

            if let Err(e) = SetClipboardData(format_id, Some(HANDLE(hglobal.0))) {
                let _ = GlobalFree(Some(hglobal));
                return Err(access_error("SetClipboardData", &e));
            }
        }
        Ok(())
    }
}
