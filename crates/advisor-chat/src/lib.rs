//! Conversational layer for the weather advisor.
//!
//! Provides the message model, the chat-completion service with tool
//! calling, prompt building, location extraction, session storage, and the
//! bounded conversation loop that ties them together.

pub mod completion;
pub mod conversation;
pub mod error;
pub mod location;
pub mod orchestrator;
pub mod prompt;
pub mod session;
pub mod types;

pub use completion::{CompletionClient, CompletionError, CompletionService, MockCompletionService};
pub use conversation::{ConversationLoop, TurnOutcome, TurnRequest, TurnStatus, ITERATION_LIMIT_MESSAGE};
pub use error::ChatError;
pub use location::{LocationExtractor, PatternLocationExtractor};
pub use orchestrator::{ChatOrchestrator, ChatReply, SeededSession};
pub use session::{InMemorySessionStore, SessionStore};
pub use types::{ChatMessage, ConversationSession, ModelResponse, ToolInvocation, WEATHER_TOOL};
