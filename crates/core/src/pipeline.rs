//! Ordered rewrite pipeline over converter output.
//!
//! Each stage is a pure text-to-text transform. Stages run strictly in the
//! order they were added because later stages rely on shapes produced by
//! earlier ones. The default order and its contracts:
//!
//! | stage              | requires                               | guarantees afterwards                         |
//! |--------------------|----------------------------------------|-----------------------------------------------|
//! | `brackets`         | raw converter output                   | `[[...]]` tokens are unescaped                |
//! | `figure-embeds`    | `brackets`                             | no `![[image]]` line with a caption remains   |
//! | `image-links`      | `figure-embeds`                        | image `[[...]]` are `Figure~\ref{fig:..}`     |
//! | `wikilinks`        | `image-links`                          | no `[[...]]` remains                          |
//! | `headings`         | none                                   | sections page-break, stray `\#\#\#\#` fixed   |
//! | `tables`           | marker lines untouched by earlier text | longtables restructured, `Table x` resolved   |
//! | `display-math`     | `tables` (row spacing `\\[` settled)   | `\[..\]` are `equation` environments          |
//! | `list-spacing`     | none                                   | spacing after outermost lists                 |
//! | `href-underscores` | none                                   | `_` escaped in `\href` URLs                   |
//! | `unicode-arrows`   | none                                   | arrows are `\ensuremath` macros               |
//! | `check-references` | every stage that emits refs or labels  | unresolved keys recorded (text unchanged)     |

use std::borrow::Cow;

use crate::error::Diagnostics;
use crate::options::Options;
use crate::passes;

/// Per-run state handed to each stage.
#[derive(Debug, Clone, Default)]
pub struct StageContext {
    /// Options for this run.
    pub options: Options,
    /// Slug of the document being converted, when known.
    pub document_slug: Option<String>,
    /// Warnings raised so far.
    pub diagnostics: Diagnostics,
}

impl StageContext {
    /// Create a context for one run.
    pub fn new(options: Options, document_slug: Option<String>) -> Self {
        Self {
            options,
            document_slug,
            diagnostics: Diagnostics::new(),
        }
    }
}

/// A single rewrite stage.
pub trait TextTransform {
    /// Transform the text, returning an owned or borrowed string.
    fn transform<'a>(&self, input: &'a str, cx: &mut StageContext) -> Cow<'a, str>;
}

impl<F> TextTransform for F
where
    F: for<'a> Fn(&'a str, &mut StageContext) -> Cow<'a, str>,
{
    fn transform<'a>(&self, input: &'a str, cx: &mut StageContext) -> Cow<'a, str> {
        (self)(input, cx)
    }
}

struct Stage {
    name: &'static str,
    transform: Box<dyn TextTransform>,
}

/// Ordered list of named stages.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// The standard post-processing order (see the module docs).
    pub fn standard() -> Self {
        let mut pipeline = Self::new();
        pipeline.add_stage("brackets", passes::brackets::unescape_wikilink_brackets);
        pipeline.add_stage("figure-embeds", passes::figures::rewrite_figure_embeds);
        pipeline.add_stage("image-links", passes::figures::rewrite_image_links);
        pipeline.add_stage("wikilinks", passes::wikilinks::rewrite_wikilinks);
        pipeline.add_stage("headings", passes::headings::rewrite_headings);
        pipeline.add_stage("tables", passes::tables::rewrite_tables);
        pipeline.add_stage("display-math", passes::math::rewrite_display_math);
        pipeline.add_stage("list-spacing", passes::lists::space_after_lists);
        pipeline.add_stage("href-underscores", passes::urls::escape_href_underscores);
        pipeline.add_stage("unicode-arrows", passes::unicode::replace_unicode_arrows);
        pipeline.add_stage("check-references", passes::references::check_references);
        pipeline
    }

    /// Append a stage.
    pub fn add_stage<T: TextTransform + 'static>(&mut self, name: &'static str, transform: T) {
        self.stages.push(Stage {
            name,
            transform: Box::new(transform),
        });
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name).collect()
    }

    /// Run every stage over `input`.
    pub fn run(&self, input: &str, cx: &mut StageContext) -> String {
        let mut current = Cow::Borrowed(input);
        for stage in &self.stages {
            let rewritten = match stage.transform.transform(current.as_ref(), cx) {
                Cow::Owned(text) => Some(text),
                Cow::Borrowed(_) => None,
            };
            if let Some(text) = rewritten {
                log::debug!("stage {} rewrote the document", stage.name);
                current = Cow::Owned(text);
            }
        }
        current.into_owned()
    }
}

/// Output of [`PostProcessor::process`].
#[derive(Debug, Clone)]
pub struct PostProcessOutput {
    /// The rewritten LaTeX.
    pub content: String,
    /// Warnings raised while rewriting.
    pub diagnostics: Diagnostics,
}

/// Runs the standard pipeline with a fixed set of options.
pub struct PostProcessor {
    options: Options,
    document_slug: Option<String>,
    pipeline: Pipeline,
}

impl PostProcessor {
    /// Post-processor with the standard pipeline.
    pub fn new(options: Options) -> Self {
        Self {
            options,
            document_slug: None,
            pipeline: Pipeline::standard(),
        }
    }

    /// Set the slug of the source document, used for same-note links.
    pub fn with_document_slug(mut self, slug: impl Into<String>) -> Self {
        self.document_slug = Some(slug.into());
        self
    }

    /// Rewrite converter output.
    pub fn process(&self, input: &str) -> PostProcessOutput {
        let mut cx = StageContext::new(self.options.clone(), self.document_slug.clone());
        let content = self.pipeline.run(input, &mut cx);
        PostProcessOutput {
            content,
            diagnostics: cx.diagnostics,
        }
    }
}

/// Rewrite converter output with the standard pipeline.
pub fn process_latex(input: &str, options: &Options) -> PostProcessOutput {
    PostProcessor::new(options.clone()).process(input)
}
