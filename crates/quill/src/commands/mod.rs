//! CLI command implementations.

pub(crate) mod build;
pub(crate) mod render;

use std::sync::Arc;

use quill_cards::GithubResolver;
use quill_config::Config;
use quill_renderer::metadata::MetadataConfig;
use quill_renderer::{Pipeline, PipelineConfig};

pub(crate) use build::BuildArgs;
pub(crate) use render::RenderArgs;

/// Build the pipeline described by `config`.
///
/// Cards are resolved through GitHub only when enabled; otherwise every
/// card renders as a plain link.
pub(crate) fn pipeline_from_config(config: &Config) -> Pipeline {
    let pipeline = Pipeline::new(PipelineConfig {
        metadata: MetadataConfig {
            words_per_minute: config.markdown.words_per_minute,
            excerpt_budget: config.markdown.excerpt_budget,
        },
        components: config.component_registry(),
        line_numbers_exempt: config.markdown.line_numbers_exempt.clone(),
        card_timeout: config.cards.timeout(),
    });

    if !config.cards.enabled {
        tracing::info!("Card resolution disabled");
        return pipeline;
    }

    let mut resolver = GithubResolver::new(&config.cards.api_url)
        .with_timeout(config.cards.timeout());
    if let Some(token) = config.cards.token() {
        resolver = resolver.with_token(token);
    }
    pipeline.with_card_resolver(Arc::new(resolver))
}
