//! Catalog view-model: product list, create/edit form and load policy.
//!
//! Loads follow a two-step policy. The credentialed list call is tried
//! first; if it fails, the anonymous list call is tried once. The view never
//! clears the list on failure and never merges mutations optimistically:
//! every successful create, update or delete is followed by a full reload.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::form::{FormError, ProductForm};
use super::notice::{Notice, NoticeBoard, NoticeKind};
use crate::api::ProductGateway;
use crate::config::NoticesConfig;
use crate::models::{self, Product, User};
use crate::session::SessionStore;
use crate::session::observable::Subscription;

pub const MSG_LOADED_WITHOUT_AUTH: &str = "Products loaded (without authentication)";
pub const MSG_LOAD_FAILED: &str = "Failed to load products";
pub const MSG_FORM_INVALID: &str = "Please complete all fields correctly";
pub const MSG_CREATED: &str = "Product added";
pub const MSG_CREATE_FAILED: &str = "Failed to add product";
pub const MSG_UPDATED: &str = "Product updated";
pub const MSG_UPDATE_FAILED: &str = "Failed to update product";
pub const MSG_DELETED: &str = "Product deleted";
pub const MSG_DELETE_FAILED: &str = "Failed to delete product";
pub const MSG_LOGGED_OUT: &str = "Session closed";
pub const DELETE_PROMPT: &str = "Are you sure you want to delete this product?";

/// Terminal states of a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The credentialed call succeeded.
    Loaded,
    /// The credentialed call failed and the anonymous one succeeded.
    LoadedWithoutAuth,
    /// Both calls failed; the list kept its previous contents.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadStep {
    Credentialed,
    Anonymous,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Validation failed; nothing was sent.
    Invalid(Vec<FormError>),
    Created,
    Updated,
    /// The gateway call failed; the form stays open.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// No identifier: nothing asked, nothing sent.
    Skipped,
    /// The user declined the confirmation.
    Cancelled,
    Deleted,
    Failed,
}

/// Asks the user to confirm a destructive action.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

pub struct CatalogView {
    session: Arc<SessionStore>,
    products: ProductGateway,
    auth_events: Subscription<bool>,
    user_events: Subscription<Option<User>>,
    is_authenticated: bool,
    current_user: Option<User>,
    items: Vec<Product>,
    filter: String,
    form: ProductForm,
    editing: Option<Product>,
    form_open: bool,
    loading: bool,
    notices: NoticeBoard,
    notice_ttl: Duration,
}

impl CatalogView {
    /// Subscribes to the session. Pending notifications (including the
    /// replayed current state) are handled by [`CatalogView::sync_session`].
    pub fn new(session: Arc<SessionStore>, products: ProductGateway, notices: &NoticesConfig) -> Self {
        let auth_events = session.subscribe_authenticated();
        let user_events = session.subscribe_user();
        Self {
            session,
            products,
            auth_events,
            user_events,
            is_authenticated: false,
            current_user: None,
            items: Vec::new(),
            filter: String::new(),
            form: ProductForm::default(),
            editing: None,
            form_open: false,
            loading: false,
            notices: NoticeBoard::new(),
            notice_ttl: notices.catalog(),
        }
    }

    // ------------------------------------------------------------------
    // Session propagation
    // ------------------------------------------------------------------

    /// Applies pending session notifications and loads once if any of them
    /// reported an authenticated session.
    pub async fn sync_session(&mut self) -> Option<LoadOutcome> {
        if self.absorb_session_events() {
            Some(self.load().await)
        } else {
            None
        }
    }

    /// Waits for the next authentication notification, then behaves like
    /// [`CatalogView::sync_session`]. Returns `None` when the session store
    /// is gone or the notification was a logout.
    pub async fn session_changed(&mut self) -> Option<LoadOutcome> {
        let flag = self.auth_events.next().await?;
        self.is_authenticated = flag;
        let pending = self.absorb_session_events();
        if flag || pending {
            Some(self.load().await)
        } else {
            None
        }
    }

    /// Mirrors pending notifications; true if an authenticated one was seen.
    fn absorb_session_events(&mut self) -> bool {
        for user in self.user_events.drain() {
            self.current_user = user;
        }
        let mut authenticated = false;
        for flag in self.auth_events.drain() {
            self.is_authenticated = flag;
            authenticated |= flag;
        }
        authenticated
    }

    /// Logs out and reports it.
    pub fn logout(&mut self) {
        self.session.logout();
        self.absorb_session_events();
        self.notify(MSG_LOGGED_OUT, NoticeKind::Info);
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Reloads the list: credentialed first, anonymous as a fallback.
    pub async fn load(&mut self) -> LoadOutcome {
        self.loading = true;
        let mut step = LoadStep::Credentialed;

        let outcome = loop {
            match (step, self.products.list(step == LoadStep::Credentialed).await) {
                (LoadStep::Credentialed, Ok(items)) => {
                    debug!(count = items.len(), "products loaded with credential");
                    self.items = items;
                    break LoadOutcome::Loaded;
                }
                (LoadStep::Anonymous, Ok(items)) => {
                    info!(count = items.len(), "products loaded without credential");
                    self.items = items;
                    break LoadOutcome::LoadedWithoutAuth;
                }
                (LoadStep::Credentialed, Err(err)) => {
                    warn!(error = %err, "credentialed load failed, retrying without credential");
                    step = LoadStep::Anonymous;
                }
                (LoadStep::Anonymous, Err(err)) => {
                    error!(error = %err, "anonymous load failed");
                    break LoadOutcome::Failed;
                }
            }
        };

        self.loading = false;
        match outcome {
            LoadOutcome::Loaded => {}
            LoadOutcome::LoadedWithoutAuth => self.notify(MSG_LOADED_WITHOUT_AUTH, NoticeKind::Info),
            LoadOutcome::Failed => self.notify(MSG_LOAD_FAILED, NoticeKind::Error),
        }
        outcome
    }

    // ------------------------------------------------------------------
    // Form
    // ------------------------------------------------------------------

    /// Opens an empty form for a new product.
    pub fn open_create(&mut self) {
        self.editing = None;
        self.form.reset();
        self.form_open = true;
    }

    /// Opens the form pre-filled from `product`.
    pub fn edit(&mut self, product: &Product) {
        self.form = ProductForm::from_product(product);
        self.editing = Some(product.clone());
        self.form_open = true;
    }

    pub fn cancel_edit(&mut self) {
        self.close();
    }

    pub fn close(&mut self) {
        self.form_open = false;
        self.editing = None;
        self.form.reset();
    }

    /// Validates the form, then creates or updates. A product being edited
    /// that was never persisted is created.
    pub async fn submit(&mut self) -> SubmitOutcome {
        let product = match self.form.validate() {
            Ok(product) => product,
            Err(errors) => {
                debug!(?errors, "form rejected");
                self.notify(MSG_FORM_INVALID, NoticeKind::Error);
                return SubmitOutcome::Invalid(errors);
            }
        };

        self.loading = true;
        let target = self.editing.as_ref().and_then(Product::assigned_id);
        let (result, done, failed_msg, done_msg) = match target {
            Some(id) => (
                self.products.update(id, &product).await,
                SubmitOutcome::Updated,
                MSG_UPDATE_FAILED,
                MSG_UPDATED,
            ),
            None => (
                self.products.create(&product).await,
                SubmitOutcome::Created,
                MSG_CREATE_FAILED,
                MSG_CREATED,
            ),
        };

        match result {
            Ok(_) => {
                self.close();
                self.notify(done_msg, NoticeKind::Success);
                self.load().await;
                done
            }
            Err(err) => {
                error!(error = %err, "saving product failed");
                self.notify(failed_msg, NoticeKind::Error);
                self.loading = false;
                SubmitOutcome::Failed
            }
        }
    }

    /// Deletes after confirmation, then reloads. A missing or zero id is a no-op.
    pub async fn delete(&mut self, id: Option<i64>, confirm: &mut impl Confirm) -> DeleteOutcome {
        let Some(id) = models::assigned(id) else {
            return DeleteOutcome::Skipped;
        };
        if !confirm.confirm(DELETE_PROMPT) {
            return DeleteOutcome::Cancelled;
        }

        self.loading = true;
        match self.products.delete(id).await {
            Ok(()) => {
                self.load().await;
                self.notify(MSG_DELETED, NoticeKind::Success);
                DeleteOutcome::Deleted
            }
            Err(err) => {
                error!(id, error = %err, "deleting product failed");
                self.notify(MSG_DELETE_FAILED, NoticeKind::Error);
                self.loading = false;
                DeleteOutcome::Failed
            }
        }
    }

    // ------------------------------------------------------------------
    // Derived views (recomputed on every call)
    // ------------------------------------------------------------------

    /// Products whose name contains the trimmed filter, ignoring case. A
    /// blank filter borrows the full list.
    pub fn filtered(&self) -> Cow<'_, [Product]> {
        let term = self.filter.trim().to_lowercase();
        if term.is_empty() {
            return Cow::Borrowed(&self.items);
        }
        Cow::Owned(
            self.items
                .iter()
                .filter(|p| p.name.to_lowercase().contains(&term))
                .cloned()
                .collect(),
        )
    }

    pub fn total_count(&self) -> usize {
        self.items.len()
    }

    pub fn total_stock(&self) -> i64 {
        self.items.iter().map(|p| p.stock).sum()
    }

    pub fn total_value(&self) -> f64 {
        self.items.iter().map(Product::value).sum()
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn items(&self) -> &[Product] {
        &self.items
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.filter = filter.into();
    }

    pub fn form(&self) -> &ProductForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut ProductForm {
        &mut self.form
    }

    pub fn editing(&self) -> Option<&Product> {
        self.editing.as_ref()
    }

    pub fn is_form_open(&self) -> bool {
        self.form_open
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notices.current()
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notices.take()
    }

    fn notify(&mut self, text: &str, kind: NoticeKind) {
        self.notices.show(text, kind, self.notice_ttl);
    }
}
