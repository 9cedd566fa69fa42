use std::sync::{Mutex, PoisonError};

use crate::error::ExportError;

pub trait Clipboard: Send + Sync {
    fn write_text(&self, text: &str) -> Result<(), ExportError>;
}

/// Буфер обмена сессии. Если доступ запрещён, запись завершается ошибкой.
#[derive(Debug, Default)]
pub struct SessionClipboard {
    enabled: bool,
    contents: Mutex<Option<String>>,
}

impl SessionClipboard {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            contents: Mutex::new(None),
        }
    }

    pub fn read_text(&self) -> Option<String> {
        self.contents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Clipboard for SessionClipboard {
    fn write_text(&self, text: &str) -> Result<(), ExportError> {
        if !self.enabled {
            return Err(ExportError::Clipboard("permission denied".to_string()));
        }
        *self.contents.lock().unwrap_or_else(PoisonError::into_inner) = Some(text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read() {
        let clipboard = SessionClipboard::new(true);
        clipboard.write_text("HT-20261016-000001").unwrap();
        assert_eq!(clipboard.read_text().as_deref(), Some("HT-20261016-000001"));
    }

    #[test]
    fn disabled_clipboard_rejects_writes() {
        let clipboard = SessionClipboard::new(false);
        assert!(matches!(
            clipboard.write_text("HT-1"),
            Err(ExportError::Clipboard(_))
        ));
        assert_eq!(clipboard.read_text(), None);
    }
}
