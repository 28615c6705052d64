pub mod bridge;
pub mod error;
pub mod local;
pub mod parse;
pub mod prompt;
pub mod remote;
pub mod sandbox;

pub use bridge::{AnalysisBridge, AnalyzerBackend};
pub use error::AnalysisError;
pub use remote::{CompletionClient, CompletionConfig, GroqClient, RemoteAnalyzer};
pub use sandbox::{SandboxContext, SandboxReply};
