use crate::config::Config;
use crate::error::{IoContext, QuireError, Result};
use crate::resolver::markdown_to_html;
use crate::types::{BuildMode, Document};
use rayon::prelude::*;
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

const DEFAULT_PAGE_TEMPLATE: &str = include_str!("../themes/default/templates/page.html");
const DEFAULT_PRINT_TEMPLATE: &str = include_str!("../themes/default/templates/print.html");

#[derive(Debug, Clone)]
pub struct LoadedSite {
    pub partial: bool,
    pub documents: Vec<Document>,
    pub summary: String,
    pub template: String,
}

pub struct Loader<'a> {
    config: &'a Config,
    mode: &'a BuildMode,
}

impl<'a> Loader<'a> {
    pub fn new(config: &'a Config, mode: &'a BuildMode) -> Self {
        Self { config, mode }
    }

    pub fn load(&self, changed: &[PathBuf]) -> Result<LoadedSite> {
        let template = self.read_template()?;
        let summary = self.read_summary()?;
        let partial = !changed.is_empty();

        let filenames: Vec<String> = if partial {
            changed
                .iter()
                .filter_map(|path| self.relative_filename(path))
                .collect()
        } else {
            self.discover()?
        };

        let documents: Vec<Document> = filenames
            .par_iter()
            .filter_map(|filename| self.read_document(filename))
            .collect();

        log::debug!(
            "Loaded {} document(s) in {} mode",
            documents.len(),
            if partial { "partial" } else { "full" }
        );

        Ok(LoadedSite {
            partial,
            documents,
            summary,
            template,
        })
    }

    fn read_template(&self) -> Result<String> {
        let (configured, builtin) = match self.mode {
            BuildMode::Web => (
                self.config.template.filename.as_deref(),
                DEFAULT_PAGE_TEMPLATE,
            ),
            BuildMode::Document { .. } => {
                (self.config.pdf.template.as_deref(), DEFAULT_PRINT_TEMPLATE)
            }
        };

        match configured {
            Some(path) if !path.is_file() => Err(QuireError::TemplateNotFound {
                path: path.to_path_buf(),
            }),
            Some(path) => fs::read_to_string(path).io_context("reading template", path),
            None => Ok(builtin.to_string()),
        }
    }

    fn read_summary(&self) -> Result<String> {
        let path = self.config.summary_path();
        if !path.is_file() {
            return Err(QuireError::SummaryNotFound { path });
        }
        fs::read_to_string(&path).io_context("reading navigation outline", &path)
    }

    fn discover(&self) -> Result<Vec<String>> {
        let input = &self.config.input;
        let output = self.config.output_within_input();
        let mut filenames = Vec::new();

        let walker = WalkDir::new(input)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                let relative = entry.path().strip_prefix(input).unwrap_or(entry.path());
                !is_ignored(self.config, relative, output.as_deref())
            });

        for entry in walker {
            let entry = entry.map_err(|error| QuireError::WalkDir {
                path: input.clone(),
                message: error.to_string(),
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let relative =
                entry
                    .path()
                    .strip_prefix(input)
                    .map_err(|_| QuireError::InvalidPath {
                        path: entry.path().to_path_buf(),
                    })?;

            if !is_markdown(relative) || self.is_summary(relative) {
                continue;
            }

            filenames.push(to_slash(relative));
        }

        Ok(filenames)
    }

    fn relative_filename(&self, path: &Path) -> Option<String> {
        let relative = if path.is_absolute() {
            match path.strip_prefix(&self.config.input) {
                Ok(relative) => relative,
                Err(_) => {
                    log::warn!("Skipping {}: not inside the input directory", path.display());
                    return None;
                }
            }
        } else {
            path
        };

        if relative
            .components()
            .any(|component| matches!(component, Component::ParentDir))
        {
            log::warn!("Skipping {}: not inside the input directory", path.display());
            return None;
        }

        Some(to_slash(relative))
    }

    fn is_summary(&self, relative: &Path) -> bool {
        to_slash(relative) == to_slash(Path::new(&self.config.structure.summary))
    }

    fn read_document(&self, filename: &str) -> Option<Document> {
        let source = self.config.input.join(filename);
        match fs::read_to_string(&source) {
            Ok(contents) => Some(Document {
                filename: filename.to_string(),
                destination: self.destination_for(filename),
                source,
                contents,
            }),
            Err(error) => {
                log::warn!("Skipping {}: {}", source.display(), error);
                None
            }
        }
    }

    pub fn destination_for(&self, filename: &str) -> PathBuf {
        let html = markdown_to_html(filename);
        let readme_html = markdown_to_html(&self.config.structure.readme);

        let relative = match html.rsplit_once('/') {
            Some((directory, file)) if file == readme_html => format!("{directory}/index.html"),
            None if html == readme_html => "index.html".to_string(),
            _ => html.clone(),
        };

        self.config.output.join(relative)
    }
}

pub fn is_ignored(config: &Config, relative: &Path, output: Option<&Path>) -> bool {
    if output.is_some_and(|output| relative.starts_with(output)) {
        return true;
    }

    relative.components().any(|component| match component {
        Component::Normal(name) => {
            let name = name.to_string_lossy();
            name.starts_with('.')
                || config
                    .exclude
                    .iter()
                    .any(|excluded| excluded.as_str() == name.as_ref())
        }
        _ => false,
    })
}

pub fn is_markdown(path: &Path) -> bool {
    path.extension()
        .map(|extension| extension == "md")
        .unwrap_or(false)
}

pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name.to_string_lossy().to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
