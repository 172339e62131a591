//! View-models driven by the CLI (or any other front end).

pub mod catalog;
pub mod form;
pub mod login;
pub mod notice;

pub use catalog::{CatalogView, Confirm, DeleteOutcome, LoadOutcome, SubmitOutcome};
pub use form::{FormError, ProductForm};
pub use login::LoginView;
pub use notice::{Notice, NoticeBoard, NoticeKind};
