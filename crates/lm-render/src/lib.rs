pub mod display;
pub mod renderer;
pub mod speech;

pub use display::TerminalDisplay;
pub use renderer::MessageRenderer;
pub use speech::{CommandSpeech, LogSpeech};
