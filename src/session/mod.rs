//! Single-document question answering: segmentation, retrieval, and answering.

pub mod passages;
mod prompts;
mod service;
pub mod types;

pub use service::{SessionApi, SessionService};
pub use types::{
    AnswerWindow, AskOutcome, ChatTurn, DocumentSummary, HealthSnapshot, LoadOutcome,
    PagePassage, PassageError, SessionError, SessionSnapshot,
};
