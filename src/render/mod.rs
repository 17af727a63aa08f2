//! Terminal presentation for the editor, the log list, and the monitor.

pub mod dashboard;
pub mod form;
pub mod logs;
pub mod text;

pub use dashboard::{CLEAR_SCREEN, render_dashboard};
pub use form::render_form;
pub use logs::{LogFormat, render_logs};
