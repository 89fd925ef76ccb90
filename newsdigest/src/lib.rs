// Library interface for newsdigest modules
// This allows tests and other binaries to import modules

pub mod digest;
pub mod llm;
pub mod news;
pub mod prompts;
pub mod server;
