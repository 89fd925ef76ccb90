use anyhow::{Context, Result};
use tracing::info;

use crate::llm::{ChatProvider, ChatRequest};
use crate::prompts::{build_prompt, TaskKind};

/// Summarize each article in order and concatenate the summaries with a
/// blank-line separator. Articles are processed strictly sequentially; a
/// provider failure aborts the digest since there is no fallback text.
pub async fn summarize_articles(
    provider: &dyn ChatProvider,
    articles: &[String],
) -> Result<String> {
    let mut digest = String::new();

    for (i, article) in articles.iter().enumerate() {
        let prompt = build_prompt(&TaskKind::SummarizeArticle, article);
        let response = provider
            .complete(ChatRequest::from(prompt))
            .await
            .with_context(|| format!("failed to summarize article {} of {}", i + 1, articles.len()))?;

        digest.push_str(&response.content);
        digest.push_str("\n\n");
    }

    info!("digest built from {} articles", articles.len());
    Ok(digest)
}
