//! Whole-document pipeline.
//!
//! One [`Pipeline`] is built per site and shared across threads. Every
//! per-document accumulator (warnings, anchor registry) lives inside a
//! single [`Pipeline::render`] call, so documents never see each other.

use std::sync::Arc;
use std::time::Duration;

use rayon::prelude::*;
use serde::Serialize;

use crate::code::{CodeDecorator, decorate_code_blocks, default_decorators};
use crate::components::{
    CardResolver, CardSettings, ComponentRegistry, DEFAULT_CARD_TIMEOUT, render_components,
};
use crate::directive::{normalize, parse_directives};
use crate::error::{DocumentError, PipelineError};
use crate::lower::lower;
use crate::markdown::{FrontMatter, parse_markdown};
use crate::metadata::{DocumentMetadata, MetadataConfig, extract_metadata};
use crate::postprocess::{
    DelimitedTypesetter, MathTypesetter, OutlineEntry, collect_outline, inject_anchors,
    lazy_load_images, render_math,
};
use crate::sections::group_sections;

/// Site-wide pipeline settings.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub metadata: MetadataConfig,
    /// Directive name to component table.
    pub components: ComponentRegistry,
    /// Languages rendered without line numbers.
    pub line_numbers_exempt: Vec<String>,
    /// Upper bound on each card lookup.
    pub card_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            metadata: MetadataConfig::default(),
            components: ComponentRegistry::default(),
            line_numbers_exempt: Vec::new(),
            card_timeout: DEFAULT_CARD_TIMEOUT,
        }
    }
}

/// Output for one document.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedDocument {
    pub id: String,
    pub html: String,
    pub front_matter: FrontMatter,
    pub metadata: DocumentMetadata,
    pub outline: Vec<OutlineEntry>,
    /// Degradations, in the order they were found.
    pub warnings: Vec<String>,
}

/// Markdown-to-HTML pipeline.
///
/// # Example
///
/// ```
/// use quill_renderer::{Pipeline, PipelineConfig};
///
/// let pipeline = Pipeline::new(PipelineConfig::default());
/// let doc = pipeline.render("intro", "# Hello\n\nWorld").unwrap();
///
/// assert!(doc.html.contains(r#"<h1 id="hello">"#));
/// assert_eq!(doc.metadata.word_count, 2);
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    decorators: Vec<Box<dyn CodeDecorator>>,
    cards: Option<CardSettings>,
    typesetter: Box<dyn MathTypesetter>,
}

impl Pipeline {
    /// Create a pipeline with the built-in decorators, no card resolver and
    /// client-side math.
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        let decorators = default_decorators(&config.line_numbers_exempt);
        Self {
            config,
            decorators,
            cards: None,
            typesetter: Box::new(DelimitedTypesetter),
        }
    }

    /// Resolve `::github` cards through `resolver`.
    ///
    /// Without a resolver every card renders as a plain link.
    #[must_use]
    pub fn with_card_resolver(mut self, resolver: Arc<dyn CardResolver>) -> Self {
        self.cards = Some(CardSettings::new(resolver).with_timeout(self.config.card_timeout));
        self
    }

    #[must_use]
    pub fn with_typesetter(mut self, typesetter: impl MathTypesetter + 'static) -> Self {
        self.typesetter = Box::new(typesetter);
        self
    }

    /// Replace the code-block decorator set.
    #[must_use]
    pub fn with_decorators(mut self, decorators: Vec<Box<dyn CodeDecorator>>) -> Self {
        self.decorators = decorators;
        self
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Render raw bytes.
    ///
    /// # Errors
    ///
    /// Fails if the bytes contain a NUL, are not UTF-8, or the document
    /// cannot be transformed.
    pub fn render_bytes(&self, id: &str, bytes: &[u8]) -> Result<RenderedDocument, DocumentError> {
        if let Some(offset) = bytes.iter().position(|&b| b == 0) {
            return Err(DocumentError::new(id, PipelineError::Binary { offset }));
        }
        let source = std::str::from_utf8(bytes).map_err(|e| DocumentError::new(id, e.into()))?;
        self.render(id, source)
    }

    /// Render one markdown document.
    ///
    /// # Errors
    ///
    /// Fails on invalid front matter or a tree no stage can handle.
    /// Recoverable problems are reported in
    /// [`RenderedDocument::warnings`] instead.
    pub fn render(&self, id: &str, source: &str) -> Result<RenderedDocument, DocumentError> {
        self.run(id, source).map_err(|e| DocumentError::new(id, e))
    }

    fn run(&self, id: &str, source: &str) -> Result<RenderedDocument, PipelineError> {
        let mut warnings = Vec::new();

        let parsed = parse_markdown(source)?;
        let document = normalize(parsed.document);
        let document = parse_directives(document, &mut warnings);
        let metadata = extract_metadata(&document, &self.config.metadata);
        let document = group_sections(document);

        let fragment = lower(document)?;
        let fragment = render_components(
            fragment,
            &self.config.components,
            self.cards.as_ref(),
            &mut warnings,
        );
        let fragment = inject_anchors(fragment);
        let fragment = lazy_load_images(fragment);
        let fragment = render_math(fragment, self.typesetter.as_ref(), &mut warnings);
        let outline = collect_outline(&fragment);
        let fragment = decorate_code_blocks(fragment, &self.decorators);

        tracing::debug!(
            document = %id,
            words = metadata.word_count,
            warnings = warnings.len(),
            "Rendered document"
        );

        Ok(RenderedDocument {
            id: id.to_owned(),
            html: fragment.to_html(),
            front_matter: parsed.front_matter,
            metadata,
            outline,
            warnings,
        })
    }

    /// Render independent documents in parallel.
    ///
    /// Returns one result per input, in input order. A failing document
    /// does not affect the others.
    pub fn render_all(
        &self,
        documents: &[(String, Vec<u8>)],
    ) -> Vec<Result<RenderedDocument, DocumentError>> {
        documents
            .par_iter()
            .map(|(id, bytes)| self.render_bytes(id, bytes))
            .collect()
    }
}
