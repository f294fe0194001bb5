//! Relevance matching and response composition for the medical chat responder.
//!
//! Flow per request: [`ChatPipeline::answer`] takes a store snapshot, ranks entries with
//! [`find_relevant_entries`], renders them with [`build_context`], and hands the result
//! to the [`ResponseComposer`].

mod composer;
mod context;
mod ingest;
mod matcher;
mod model_router;
mod openai_compatible;
mod pipeline;

pub use composer::{
    ComposeRequest, ComposedResponse, GenerationSettings, GenerativeStrategy, ResponseComposer,
    ResponseStrategy, RuleBasedStrategy, DISCLAIMER,
};
pub use context::{build_context, NO_MATCHES_NOTICE};
pub use ingest::{ingest_entries, parse_ingest_payload};
pub use matcher::{
    find_relevant_entries, keyword_tokens, quick_ratio, searchable_text, MatchCandidate,
    DEFAULT_MATCH_LIMIT,
};
pub use model_router::{CapabilityError, LanguageModel, LlmMode, MockLanguageModel, ModelRouter};
pub use openai_compatible::OpenAiChatModel;
pub use pipeline::{ChatPipeline, ChatRequest};
