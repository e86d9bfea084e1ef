//! Query writer - read-only projections of a query.
//!
//! # Architecture
//!
//! ```text
//! Query + SourceDef
//!        │
//!        ├── render  ──► FragmentStream ──► linearize ──► source text
//!        │
//!        └── summary ──► QuerySummary (per-stage items for editors)
//! ```
//!
//! Nothing is cached: every call derives its output from the current query.

pub mod codegen;
pub mod error;
pub mod render;
pub mod summary;

pub use codegen::{Fragment, FragmentStream};
pub use error::{RenderError, RenderResult};
pub use summary::{
    DataStyle, DataStyles, OrderByCandidate, QuerySummary, StageSummary, SummaryItem,
};

use serde::{Deserialize, Serialize};

use crate::catalog::SourceDef;
use crate::config::WriterSettings;
use crate::filter::literal::quote_identifier;
use crate::query::Query;

/// Where generated text is going to be placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueryTarget {
    /// A top-level query statement in a model file.
    Model,
    /// A named view inside a source definition.
    Source { name: String },
    /// A fenced block in a markdown notebook that imports the model.
    Markdown { model_path: String },
}

/// Renders and summarizes a query against its source.
#[derive(Debug, Clone)]
pub struct QueryWriter<'a> {
    query: &'a Query,
    source: &'a SourceDef,
    settings: WriterSettings,
}

impl<'a> QueryWriter<'a> {
    pub fn new(query: &'a Query, source: &'a SourceDef) -> Self {
        Self {
            query,
            source,
            settings: WriterSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: WriterSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn query_string(&self, target: &QueryTarget) -> RenderResult<String> {
        match target {
            QueryTarget::Model => self.query_string_for_model(),
            QueryTarget::Source { name } => self.query_string_for_source(name),
            QueryTarget::Markdown { model_path } => self.query_string_for_markdown(model_path),
        }
    }

    /// `query: <source> -> {...}`, or `query: <name> is <source> -> {...}`
    /// when the query is named.
    pub fn query_string_for_model(&self) -> RenderResult<String> {
        let mut fs = FragmentStream::new();
        let source = quote_identifier(&self.source.name);
        if self.query.name.is_empty() {
            fs.text(format!("query: {} -> ", source));
        } else {
            fs.text(format!(
                "query: {} is {} -> ",
                quote_identifier(&self.query.name),
                source
            ));
        }
        fs.append(&render::pipeline_to_fragments(self.source, &self.query.pipeline)?);
        Ok(fs.linearize(self.settings.tab_width))
    }

    /// `query: <name> is {...}`, for placing inside the source.
    pub fn query_string_for_source(&self, name: &str) -> RenderResult<String> {
        let mut fs = FragmentStream::new();
        fs.text(format!("query: {} is ", quote_identifier(name)));
        fs.append(&render::pipeline_to_fragments(self.source, &self.query.pipeline)?);
        Ok(fs.linearize(self.settings.tab_width))
    }

    /// The model text in a fenced block importing `model_path`, headed by
    /// the query name when there is one.
    pub fn query_string_for_markdown(&self, model_path: &str) -> RenderResult<String> {
        let model = self.query_string_for_model()?;
        let mut out = String::new();
        if !self.query.name.is_empty() {
            out.push_str(&format!("# {}\n\n", self.query.name));
        }
        out.push_str(&format!(
            "```{}\nimport \"{}\"\n\n{}\n```",
            self.settings.markdown_language, model_path, model
        ));
        Ok(out)
    }

    pub fn query_summary(&self, styles: &DataStyles) -> QuerySummary {
        summary::query_summary(self.source, self.query, styles)
    }
}
