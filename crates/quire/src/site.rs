use crate::assets::{CopyReport, copy_static};
use crate::bundler::run_bundler;
use crate::config::Config;
use crate::error::{IoContext, Result};
use crate::loader::Loader;
use crate::parsing::MarkdownRenderer;
use crate::plugins::{OutputKind, PostProcessorRegistry, PostProcessors};
use crate::publisher::{CommandPaginator, OutputFile, Paginator, PublishReport, Publisher};
use crate::search::generate_search_index;
use crate::sitemap::generate_sitemap;
use crate::theme::TemplateEngine;
use crate::types::{BuildMode, Page, RenderedDocument};
use indexmap::IndexSet;
use rayon::prelude::*;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildContext {
    pub resources: IndexSet<String>,
    pub toc: IndexSet<String>,
}

impl BuildContext {
    pub fn absorb(&mut self, rendered: &RenderedDocument) {
        self.resources.extend(rendered.resources.iter().cloned());
        self.toc.extend(rendered.toc.iter().cloned());
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratorReport {
    pub copied: CopyReport,
    pub sitemap: Option<PathBuf>,
    pub search_index: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct BuildResult {
    pub mode: BuildMode,
    pub partial: bool,
    pub pages: Vec<Page>,
    pub toc: Vec<String>,
    pub resources: Vec<String>,
    pub report: PublishReport,
    pub generated: GeneratorReport,
}

pub struct SiteBuilder {
    config: Config,
    mode: BuildMode,
    renderer: MarkdownRenderer,
    post_processors: PostProcessors,
    paginator: Box<dyn Paginator>,
}

impl SiteBuilder {
    pub fn new(config: Config, mode: BuildMode) -> Result<Self> {
        Self::with_registry(config, mode, &PostProcessorRegistry::default())
    }

    pub fn with_registry(
        config: Config,
        mode: BuildMode,
        registry: &PostProcessorRegistry,
    ) -> Result<Self> {
        let post_processors = registry.resolve(&config.post_processors)?;
        let renderer = MarkdownRenderer::new(&config);
        let paginator = Box::new(CommandPaginator::from_config(&config.pdf));

        Ok(Self {
            config,
            mode,
            renderer,
            post_processors,
            paginator,
        })
    }

    pub fn paginator(mut self, paginator: Box<dyn Paginator>) -> Self {
        self.paginator = paginator;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn mode(&self) -> &BuildMode {
        &self.mode
    }

    pub fn build(&self, changed: &[PathBuf]) -> Result<BuildResult> {
        fs::create_dir_all(&self.config.output)
            .io_context("creating output directory", &self.config.output)?;

        let loaded = Loader::new(&self.config, &self.mode).load(changed)?;
        let engine = TemplateEngine::new(&loaded.template, &self.config, self.renderer.resolver())?;

        let print = self.mode.is_document();
        let summary = &loaded.summary;
        let pages: Vec<Page> = loaded
            .documents
            .into_par_iter()
            .map(|document| {
                let rendered = self.renderer.render(&document, summary, print);
                Page { document, rendered }
            })
            .collect();

        let mut context = BuildContext::default();
        for page in &pages {
            context.absorb(&page.rendered);
        }

        let report = match &self.mode {
            BuildMode::Web => self.publish_pages(&engine, &pages)?,
            BuildMode::Document { destination } => {
                let toc: Vec<String> = context.toc.iter().cloned().collect();
                let html = engine.render_print(&pages, &toc)?;
                let html = self.post_processors.apply(html, OutputKind::Print, "print document");
                Publisher::new(&self.config).publish_print(&html, destination, self.paginator.as_ref())?
            }
        };

        let generated = self.generate(&pages, &context, loaded.partial)?;

        log::info!(
            "Built {} page(s) ({} written, {} failed)",
            pages.len(),
            report.written.len(),
            report.failed.len()
        );

        Ok(BuildResult {
            mode: self.mode.clone(),
            partial: loaded.partial,
            pages,
            toc: context.toc.into_iter().collect(),
            resources: context.resources.into_iter().collect(),
            report,
            generated,
        })
    }

    fn publish_pages(&self, engine: &TemplateEngine, pages: &[Page]) -> Result<PublishReport> {
        let files = pages
            .par_iter()
            .map(|page| -> Result<OutputFile> {
                let html = engine.render_page(page)?;
                let label = page.document.filename.as_str();
                Ok(OutputFile {
                    destination: page.document.destination.clone(),
                    html: self.post_processors.apply(html, OutputKind::Page, label),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Publisher::new(&self.config).publish(&files))
    }

    fn generate(
        &self,
        pages: &[Page],
        context: &BuildContext,
        partial: bool,
    ) -> Result<GeneratorReport> {
        let resources: Vec<String> = context.resources.iter().cloned().collect();

        if partial {
            return Ok(GeneratorReport {
                copied: copy_static(&self.config, &resources, false),
                ..GeneratorReport::default()
            });
        }

        run_bundler(&self.config)?;

        let mut report = GeneratorReport {
            copied: copy_static(&self.config, &resources, true),
            ..GeneratorReport::default()
        };

        if self.mode.is_document() {
            return Ok(report);
        }

        let resolver = self.renderer.resolver();

        if self.config.sitemap.enabled {
            match generate_sitemap(&self.config, resolver, pages) {
                Ok(path) => report.sitemap = Some(path),
                Err(error) => log::warn!("Sitemap generation failed: {error}"),
            }
        }

        if self.config.search.enabled {
            match generate_search_index(&self.config, resolver, pages) {
                Ok(path) => report.search_index = Some(path),
                Err(error) => log::warn!("Search index generation failed: {error}"),
            }
        }

        Ok(report)
    }
}
