use thiserror::Error;

/// Незаполненные обязательные поля формы. Бронь не создаётся.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("please fill in: {}", .fields.join(", "))]
pub struct ValidationError {
    pub fields: Vec<String>,
}

impl ValidationError {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("ticket container '{0}' not found")]
    ContainerMissing(String),

    #[error("could not build scan code: {0}")]
    Code(String),
}

/// Окно печати не открылось (например, заблокировано).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("print window was blocked")]
pub struct PopupBlockedError;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no ticket has been rendered yet")]
    NotRendered,

    #[error("could not capture ticket: {0}")]
    Rasterize(String),

    #[error("could not encode image: {0}")]
    Encode(String),

    #[error("PDF export is not available")]
    DocumentUnavailable,

    #[error("could not build PDF: {0}")]
    Document(String),

    #[error("no booking id to copy")]
    NoBookingId,

    #[error("clipboard access denied: {0}")]
    Clipboard(String),

    #[error("print failed: {0}")]
    Print(String),

    #[error(transparent)]
    PopupBlocked(#[from] PopupBlockedError),

    #[error("export task failed: {0}")]
    Task(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session store error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("session record is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Общая ошибка сервиса билетов.
#[derive(Debug, Error)]
pub enum TicketError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl From<PopupBlockedError> for TicketError {
    fn from(err: PopupBlockedError) -> Self {
        TicketError::Export(ExportError::PopupBlocked(err))
    }
}
