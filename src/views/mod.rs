pub mod app;
pub mod scanner;

pub use app::{render_app, update_app, AppView};
