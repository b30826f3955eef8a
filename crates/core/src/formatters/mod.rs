pub mod html;
pub mod text;

pub use html::render_post;
pub use text::{TextConfig, TextFormatter, convert_to_text};
