use serde::Serialize;
use tokio::sync::mpsc;

use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    /// Asks the user to do something first.
    Prompt,
    /// A failed operation.
    Error,
    Info,
}

/// A user-visible, dismissible message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn select_gift_first() -> Self {
        Self {
            kind: NoticeKind::Prompt,
            title: "Select a gift first".to_string(),
            message: "Tap a gift to select it, then tap an event to assign it.".to_string(),
        }
    }

    pub fn from_error(err: &ClientError) -> Self {
        Self {
            kind: NoticeKind::Error,
            title: err.title().to_string(),
            message: err.to_string(),
        }
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Where the screen sends its notices.
pub trait NoticeSink: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Writes notices to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotices;

impl NoticeSink for LogNotices {
    fn notify(&self, notice: Notice) {
        match notice.kind {
            NoticeKind::Error => tracing::warn!(title = %notice.title, "{}", notice.message),
            _ => tracing::info!(title = %notice.title, "{}", notice.message),
        }
    }
}

impl NoticeSink for mpsc::UnboundedSender<Notice> {
    fn notify(&self, notice: Notice) {
        if let Err(e) = self.send(notice) {
            tracing::debug!(title = %e.0.title, "notice dropped, receiver closed");
        }
    }
}
