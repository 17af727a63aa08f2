//! Transient notices and the loading indicator.
//!
//! Both front-ends report the outcome of every network call the same way: a
//! loading indicator around the call and a single notice that replaces the
//! previous one and hides itself after a few seconds.

use std::time::{Duration, Instant};

/// Default time a notice stays visible.
pub const DEFAULT_NOTICE_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub raised_at: Instant,
}

/// Holds the one notice currently on screen.
#[derive(Debug, Clone)]
pub struct NoticeBoard {
    current: Option<Notice>,
    ttl: Duration,
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::new(DEFAULT_NOTICE_TTL)
    }
}

impl NoticeBoard {
    pub fn new(ttl: Duration) -> Self {
        Self { current: None, ttl }
    }

    /// Replace the current notice.
    pub fn show(&mut self, kind: NoticeKind, message: impl Into<String>) -> &Notice {
        self.current.insert(Notice {
            kind,
            message: message.into(),
            raised_at: Instant::now(),
        })
    }

    /// The notice, if it has not yet expired at `now`.
    pub fn visible_at(&self, now: Instant) -> Option<&Notice> {
        self.current
            .as_ref()
            .filter(|n| now.saturating_duration_since(n.raised_at) < self.ttl)
    }

    pub fn visible(&self) -> Option<&Notice> {
        self.visible_at(Instant::now())
    }

    /// The last notice raised, expired or not.
    pub fn last(&self) -> Option<&Notice> {
        self.current.as_ref()
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }
}

/// Presentation hook for loading state and notices.
pub trait StatusSink {
    fn loading(&mut self, active: bool);
    fn notice(&mut self, notice: &Notice);
}

impl<S: StatusSink + ?Sized> StatusSink for &mut S {
    fn loading(&mut self, active: bool) {
        (**self).loading(active);
    }
    fn notice(&mut self, notice: &Notice) {
        (**self).notice(notice);
    }
}

/// A sink that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl StatusSink for NullSink {
    fn loading(&mut self, _active: bool) {}
    fn notice(&mut self, _notice: &Notice) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_expires_after_ttl() {
        let mut board = NoticeBoard::new(Duration::from_secs(5));
        let raised = board.show(NoticeKind::Success, "saved").raised_at;

        assert!(board.visible_at(raised + Duration::from_secs(4)).is_some());
        assert!(board.visible_at(raised + Duration::from_secs(5)).is_none());
        assert_eq!(board.last().map(|n| n.message.as_str()), Some("saved"));
    }

    #[test]
    fn new_notice_replaces_previous() {
        let mut board = NoticeBoard::default();
        board.show(NoticeKind::Success, "loaded");
        board.show(NoticeKind::Danger, "save failed");
        let notice = board.visible().unwrap();
        assert_eq!(notice.kind, NoticeKind::Danger);
        assert_eq!(notice.message, "save failed");

        board.dismiss();
        assert!(board.visible().is_none());
    }
}
