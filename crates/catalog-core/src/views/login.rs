//! Login form view-model.

use std::sync::Arc;
use std::time::Duration;

use super::notice::{Notice, NoticeBoard, NoticeKind};
use crate::config::NoticesConfig;
use crate::session::{LoginResult, SessionStore};

pub const MSG_FIELDS_REQUIRED: &str = "Please fill in all fields";

pub struct LoginView {
    session: Arc<SessionStore>,
    pub username: String,
    pub password: String,
    loading: bool,
    notices: NoticeBoard,
    success_ttl: Duration,
    failure_ttl: Duration,
}

impl LoginView {
    pub fn new(session: Arc<SessionStore>, notices: &NoticesConfig) -> Self {
        Self {
            session,
            username: String::new(),
            password: String::new(),
            loading: false,
            notices: NoticeBoard::new(),
            success_ttl: notices.login_success(),
            failure_ttl: notices.login_failure(),
        }
    }

    /// Submits the credentials. Returns `None` when a field is blank and no
    /// request was made.
    pub async fn submit(&mut self) -> Option<LoginResult> {
        if self.username.trim().is_empty() || self.password.trim().is_empty() {
            self.notices
                .show(MSG_FIELDS_REQUIRED, NoticeKind::Error, self.failure_ttl);
            return None;
        }

        self.loading = true;
        self.notices.clear();
        let result = self.session.login(&self.username, &self.password).await;
        self.loading = false;

        if result.success {
            self.notices
                .show(&result.message, NoticeKind::Success, self.success_ttl);
        } else {
            self.notices
                .show(&result.message, NoticeKind::Error, self.failure_ttl);
        }
        Some(result)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notices.current()
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notices.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::CredentialGateway;
    use crate::session::storage::MemoryStorage;

    #[tokio::test(start_paused = true)]
    async fn test_blank_fields_are_rejected_locally() {
        let session = Arc::new(SessionStore::new(
            Arc::new(MemoryStorage::new()),
            CredentialGateway::new("http://127.0.0.1:9"),
        ));
        let mut view = LoginView::new(session, &NoticesConfig::default());
        view.username = "ana".to_string();
        view.password = "   ".to_string();

        assert_eq!(view.submit().await, None);
        assert!(!view.is_loading());

        let notice = view.notice().unwrap();
        assert_eq!(notice.text, MSG_FIELDS_REQUIRED);
        assert_eq!(notice.kind, NoticeKind::Error);

        tokio::time::advance(Duration::from_millis(5000)).await;
        assert!(view.notice().is_none());
    }
}
