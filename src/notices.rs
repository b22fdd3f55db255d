use chrono::{DateTime, Local};

use crate::session::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl NoticeLevel {
    pub fn color(&self) -> egui::Color32 {
        match self {
            NoticeLevel::Info => egui::Color32::from_rgb(150, 180, 220),
            NoticeLevel::Success => egui::Color32::from_rgb(100, 200, 120),
            NoticeLevel::Warning => egui::Color32::from_rgb(251, 149, 20),
            NoticeLevel::Error => egui::Color32::from_rgb(255, 100, 100),
        }
    }
}

/// A message shown to the user in the notice panel.
#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub at: DateTime<Local>,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Notice {
            level,
            message: message.into(),
            at: Local::now(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }
}

impl From<SessionError> for Notice {
    fn from(e: SessionError) -> Self {
        Notice::warning(e.to_string())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Notices {
    items: Vec<Notice>,
}

impl Notices {
    pub const MAX_NOTICES: usize = 100;

    pub fn push(&mut self, notice: Notice) {
        self.items.push(notice);
        if self.items.len() > Self::MAX_NOTICES {
            let excess = self.items.len() - Self::MAX_NOTICES;
            self.items.drain(..excess);
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Newest first
    pub fn newest_first(&self) -> impl Iterator<Item = &Notice> {
        self.items.iter().rev()
    }
}
