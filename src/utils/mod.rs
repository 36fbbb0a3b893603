pub mod directory;
pub mod progress;
pub mod prompt;
