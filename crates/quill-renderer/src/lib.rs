//! Markdown-to-HTML document pipeline.
//!
//! A document moves through these stages:
//!
//! 1. [`markdown`]: front matter split and `CommonMark` + GFM parsing into a
//!    [`Document`] tree.
//! 2. [`directive`]: GitHub alert blockquotes are normalized into container
//!    directives, then `:::name`, `::name` and `:name[...]` markers are parsed.
//! 3. [`metadata`]: word count, reading time and excerpt.
//! 4. [`sections`]: headings and their content are grouped into sections.
//! 5. [`lower`]: the tree becomes an HTML [`Fragment`].
//! 6. [`components`]: directives render as admonitions or GitHub cards.
//! 7. [`postprocess`]: heading anchors, lazy images, math, outline.
//! 8. [`code`]: code blocks render as decorated figures.
//!
//! [`Pipeline`] runs all of them and collects per-document warnings.
//! Malformed input degrades in place and never aborts a document; only
//! binary input, invalid front matter and internal tree errors are fatal.
//!
//! # Example
//!
//! ```
//! use quill_renderer::{Pipeline, PipelineConfig};
//!
//! let pipeline = Pipeline::new(PipelineConfig::default());
//! let doc = pipeline
//!     .render("notes", "> [!TIP]\n> Use `cargo doc`.\n")
//!     .unwrap();
//!
//! assert!(doc.html.starts_with(r#"<blockquote class="admonition bdm-tip">"#));
//! ```

pub mod code;
pub mod components;
pub mod directive;
mod error;
mod fence;
pub mod html;
pub mod lower;
pub mod markdown;
pub mod metadata;
mod pipeline;
pub mod postprocess;
pub mod sections;
mod severity;
pub mod tree;

pub use error::{DocumentError, PipelineError};
pub use html::{Element, Fragment, HtmlNode};
pub use markdown::FrontMatter;
pub use metadata::{DocumentMetadata, MetadataConfig};
pub use pipeline::{Pipeline, PipelineConfig, RenderedDocument};
pub use severity::Severity;
pub use tree::{Document, Node, NodeKind};
