//! Transient user-facing notices.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

impl fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoticeKind::Success => write!(f, "success"),
            NoticeKind::Error => write!(f, "error"),
            NoticeKind::Info => write!(f, "info"),
        }
    }
}

/// A message that disappears once `expires_at` passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub kind: NoticeKind,
    pub expires_at: Instant,
}

impl Notice {
    pub fn is_visible(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Holds at most one notice; a new notice replaces the previous one along
/// with its expiry.
#[derive(Debug, Default)]
pub struct NoticeBoard {
    current: Option<Notice>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, text: impl Into<String>, kind: NoticeKind, ttl: Duration) {
        self.current = Some(Notice {
            text: text.into(),
            kind,
            expires_at: Instant::now() + ttl,
        });
    }

    /// The visible notice, if any.
    pub fn current(&self) -> Option<&Notice> {
        self.current.as_ref().filter(|n| n.is_visible())
    }

    /// Removes and returns the visible notice.
    pub fn take(&mut self) -> Option<Notice> {
        self.current.take().filter(Notice::is_visible)
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_notice_expires_after_ttl() {
        let mut board = NoticeBoard::new();
        board.show("saved", NoticeKind::Success, Duration::from_millis(3000));
        assert_eq!(board.current().unwrap().text, "saved");

        tokio::time::advance(Duration::from_millis(2999)).await;
        assert!(board.current().is_some());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(board.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_notice_replaces_old_and_its_timer() {
        let mut board = NoticeBoard::new();
        board.show("first", NoticeKind::Info, Duration::from_millis(1000));
        tokio::time::advance(Duration::from_millis(900)).await;

        board.show("second", NoticeKind::Error, Duration::from_millis(1000));
        tokio::time::advance(Duration::from_millis(500)).await;

        let notice = board.current().unwrap();
        assert_eq!(notice.text, "second");
        assert_eq!(notice.kind, NoticeKind::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_take_skips_expired() {
        let mut board = NoticeBoard::new();
        board.show("gone", NoticeKind::Info, Duration::from_millis(10));
        tokio::time::advance(Duration::from_millis(10)).await;
        assert_eq!(board.take(), None);

        board.show("kept", NoticeKind::Info, Duration::from_millis(10));
        assert_eq!(board.take().map(|n| n.text), Some("kept".to_string()));
        assert_eq!(board.take(), None);
    }
}
