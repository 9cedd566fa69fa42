use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use tracing::info;
use uuid::Uuid;

use crate::error::{ExportError, PopupBlockedError};

/// Документ для печати: фрагмент билета, обёрнутый в страницу со стилями печати.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrintView {
    pub id: Uuid,
    pub title: String,
    pub html: String,
}

impl PrintView {
    pub fn new(title: String, html: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            html,
        }
    }
}

/// Куда уходит документ на печать.
pub trait PrintHost: Send + Sync {
    /// Открывает отдельное окно печати. Возвращает адрес окна.
    fn open(&self, view: PrintView) -> Result<String, PopupBlockedError>;

    /// Печать из текущей страницы, когда отдельное окно недоступно.
    fn print_current_page(&self, view: PrintView) -> Result<String, ExportError>;
}

/// Хранит последние документы печати и отдаёт их по адресу `/print/<id>`.
pub struct SpoolPrintHost {
    capacity: usize,
    popups_allowed: bool,
    views: Mutex<VecDeque<PrintView>>,
}

impl SpoolPrintHost {
    pub fn new(capacity: usize, popups_allowed: bool) -> Self {
        Self {
            capacity: capacity.max(1),
            popups_allowed,
            views: Mutex::new(VecDeque::new()),
        }
    }

    pub fn view(&self, id: Uuid) -> Option<PrintView> {
        let views = self.views.lock().unwrap_or_else(PoisonError::into_inner);
        views.iter().find(|v| v.id == id).cloned()
    }

    fn spool(&self, view: PrintView) -> String {
        let location = format!("/api/print/{}", view.id);
        let mut views = self.views.lock().unwrap_or_else(PoisonError::into_inner);
        if views.len() >= self.capacity {
            views.pop_front();
        }
        views.push_back(view);
        location
    }
}

impl PrintHost for SpoolPrintHost {
    fn open(&self, view: PrintView) -> Result<String, PopupBlockedError> {
        if !self.popups_allowed {
            return Err(PopupBlockedError);
        }
        let location = self.spool(view);
        info!("Print view opened at {}", location);
        Ok(location)
    }

    fn print_current_page(&self, view: PrintView) -> Result<String, ExportError> {
        let location = self.spool(view);
        info!("Printing current page via {}", location);
        Ok(location)
    }
}
