//! Page-anchored segmentation under an embedding token budget.
//!
//! The retrieval unit is the page: every passage remembers the zero-based
//! page it was read from, so a search hit always resolves to a place in the
//! document. Pages that fit the token budget pass through whole; longer
//! pages are split semantically and each piece keeps its page index.
//!
//! The budget derives from the embedding model's context window unless
//! `PASSAGE_TOKEN_BUDGET` fixes it. Token counting uses `tiktoken-rs`,
//! falling back to `cl100k_base` for model names it does not recognize;
//! if even that tokenizer cannot be loaded, Ollama models downgrade to
//! counting whitespace-separated words while OpenAI models fail the load.

use crate::config::ModelProvider;
use anyhow::Error as TokenizerError;
use semchunk_rs::Chunker;
use std::sync::Arc;
use tiktoken_rs::{
    CoreBPE, cl100k_base, get_bpe_from_model, model::get_context_size, o200k_base, p50k_base,
    p50k_edit, r50k_base,
};

use super::types::{PagePassage, PassageError};

type TokenCounter = Arc<dyn Fn(&str) -> usize + Send + Sync>;

const MIN_AUTOMATIC_BUDGET: usize = 256;
const MAX_AUTOMATIC_BUDGET: usize = 1024;

/// Pick the token budget for one passage.
///
/// An explicit override wins, floored at one token. Otherwise the budget is
/// a quarter of the model's context window, clamped into `[256, 1024]`.
pub fn determine_token_budget(
    override_budget: Option<usize>,
    provider: ModelProvider,
    model: &str,
) -> usize {
    match override_budget {
        Some(explicit) => explicit.max(1),
        None => (context_window(provider, model) / 4)
            .clamp(MIN_AUTOMATIC_BUDGET, MAX_AUTOMATIC_BUDGET),
    }
}

// Context windows for the embedding models people actually run; anything
// unrecognized is assumed to take 4096 tokens.
fn context_window(provider: ModelProvider, model: &str) -> usize {
    match provider {
        ModelProvider::OpenAI => {
            if model.starts_with("text-embedding-3") || model.starts_with("text-embedding-ada-002")
            {
                8192
            } else {
                get_context_size(model)
            }
        }
        ModelProvider::Ollama => {
            let name = model.to_ascii_lowercase();
            if name == "nomic-embed-text" || name.starts_with("mxbai-embed-large") {
                8192
            } else if name.contains("all-minilm") {
                512
            } else if name.contains("e5-large") {
                4096
            } else {
                tracing::trace!(model, "Assuming a 4096 token context window");
                4096
            }
        }
    }
}

/// Segment extracted pages into passages that respect `token_budget`.
///
/// Index `i` of `pages` is zero-based page `i`, and that index is carried on
/// every passage produced from it. Whitespace-only pages are dropped. Output
/// order follows (page, position within page).
pub fn split_pages(
    pages: &[String],
    token_budget: usize,
    provider: ModelProvider,
    model: &str,
) -> Result<Vec<PagePassage>, PassageError> {
    if token_budget == 0 {
        return Err(PassageError::InvalidBudget);
    }

    let counter = token_counter_for(provider, model)?;
    Ok(split_pages_with_counter(pages, token_budget, counter))
}

fn split_pages_with_counter(
    pages: &[String],
    token_budget: usize,
    counter: TokenCounter,
) -> Vec<PagePassage> {
    let mut passages = Vec::new();

    for (page, text) in pages.iter().enumerate() {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }

        if counter.as_ref()(trimmed) <= token_budget {
            passages.push(PagePassage {
                page,
                text: trimmed.to_string(),
            });
            continue;
        }

        let counter_for_chunker = counter.clone();
        let chunker = Chunker::new(
            token_budget,
            Box::new(move |segment: &str| counter_for_chunker.as_ref()(segment)),
        );
        for piece in chunker.chunk(trimmed) {
            passages.push(PagePassage { page, text: piece });
        }
    }

    passages
}

// OpenAI models must have a real tokenizer; for Ollama models a missing
// tokenizer downgrades to whitespace counting so indexing still proceeds.
fn token_counter_for(
    provider: ModelProvider,
    model: &str,
) -> Result<TokenCounter, PassageError> {
    match (provider, tiktoken_counter(model)) {
        (_, Ok(counter)) => Ok(counter),
        (ModelProvider::OpenAI, Err(error)) => Err(error),
        (ModelProvider::Ollama, Err(error)) => {
            tracing::warn!(
                model,
                error = %error,
                "No tokenizer for Ollama model; counting whitespace tokens"
            );
            Ok(whitespace_counter())
        }
    }
}

fn tiktoken_counter(model: &str) -> Result<TokenCounter, PassageError> {
    let target = match model.trim() {
        "" => "cl100k_base",
        trimmed => trimmed,
    };
    let encoding = lookup_encoding(target).map_err(|source| PassageError::Tokenizer {
        model: target.to_string(),
        source,
    })?;

    let encoding = Arc::new(encoding);
    Ok(Arc::new(move |segment: &str| {
        encoding.encode_ordinary(segment).len()
    }))
}

fn lookup_encoding(model: &str) -> Result<CoreBPE, TokenizerError> {
    if let Ok(encoding) = get_bpe_from_model(model) {
        return Ok(encoding);
    }
    match model {
        "cl100k_base" => cl100k_base(),
        "o200k_base" => o200k_base(),
        "p50k_base" => p50k_base(),
        "p50k_edit" => p50k_edit(),
        "r50k_base" | "gpt2" => r50k_base(),
        _ => {
            tracing::debug!(model, "Unknown model; counting with cl100k_base");
            cl100k_base()
        }
    }
}

fn whitespace_counter() -> TokenCounter {
    Arc::new(|segment: &str| match segment.split_whitespace().count() {
        0 if !segment.is_empty() => 1,
        count => count,
    })
}
