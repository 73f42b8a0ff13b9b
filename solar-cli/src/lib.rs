pub mod app;
pub mod input;
pub mod logging;
pub mod render;
pub mod settings;
pub mod utils;

pub use app::{Outcome, Terminal, build_registry, build_session};
pub use render::{PlainRenderer, Renderer};
pub use settings::{Cli, Settings};
