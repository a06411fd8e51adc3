use crate::error::{IoContext, QuireError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "quire.toml";
pub const BOOK_FILE_NAME: &str = "book.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub url: String,
    pub input: PathBuf,
    pub output: PathBuf,
    pub exclude: Vec<String>,
    pub minify: bool,
    pub post_processors: Vec<String>,
    pub structure: StructureConfig,
    pub markdown: MarkdownConfig,
    pub sitemap: SitemapConfig,
    pub search: SearchConfig,
    pub template: TemplateConfig,
    pub pdf: PdfConfig,
    pub bundler: BundlerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: default_url(),
            input: PathBuf::from("."),
            output: PathBuf::from("_book"),
            exclude: vec!["node_modules".to_string()],
            minify: false,
            post_processors: Vec::new(),
            structure: StructureConfig::default(),
            markdown: MarkdownConfig::default(),
            sitemap: SitemapConfig::default(),
            search: SearchConfig::default(),
            template: TemplateConfig::default(),
            pdf: PdfConfig::default(),
            bundler: BundlerConfig::default(),
        }
    }
}

fn default_url() -> String {
    "http://localhost".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureConfig {
    pub readme: String,
    pub summary: String,
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            readme: "README.md".to_string(),
            summary: "SUMMARY.md".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownConfig {
    pub breaks: bool,
    pub task_lists: bool,
    pub syntax_theme: String,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            breaks: false,
            task_lists: true,
            syntax_theme: "InspiredGitHub".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SitemapConfig {
    pub enabled: bool,
    pub priority: f32,
    pub changefreq: String,
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            priority: 0.5,
            changefreq: "weekly".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub enabled: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    pub title: String,
    pub language: String,
    pub filename: Option<PathBuf>,
    pub scripts: Vec<String>,
    pub styles: Vec<String>,
    pub resources: Vec<String>,
    pub assets_dir: Option<PathBuf>,
    pub metadata: HashMap<String, Value>,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        let mut metadata = HashMap::new();
        metadata.insert("description".to_string(), Value::String(String::new()));
        metadata.insert("author".to_string(), Value::String(String::new()));
        metadata.insert(
            "generator".to_string(),
            Value::String(format!("quire {}", env!("CARGO_PKG_VERSION"))),
        );

        Self {
            title: "quire".to_string(),
            language: "en".to_string(),
            filename: None,
            scripts: Vec::new(),
            styles: Vec::new(),
            resources: Vec::new(),
            assets_dir: None,
            metadata,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    pub template: Option<PathBuf>,
    pub command: String,
    pub args: Vec<String>,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            template: None,
            command: "chromium".to_string(),
            args: vec![
                "--headless".to_string(),
                "--no-sandbox".to_string(),
                "--disable-gpu".to_string(),
                "--print-to-pdf={output}".to_string(),
                "{input}".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BundlerConfig {
    pub command: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct BookJson {
    title: Option<String>,
    root: Option<PathBuf>,
    description: Option<String>,
    #[serde(default)]
    structure: BookStructure,
}

#[derive(Debug, Default, Deserialize)]
struct BookStructure {
    readme: Option<String>,
    summary: Option<String>,
}

impl Config {
    pub fn load(input_dir: &Path, config_path: Option<&Path>) -> Result<Self> {
        let toml_path = match config_path {
            Some(path) if !path.exists() => {
                return Err(QuireError::ConfigNotFound {
                    path: path.to_path_buf(),
                });
            }
            Some(path) => Some(path.to_path_buf()),
            None => {
                let candidate = input_dir.join(CONFIG_FILE_NAME);
                candidate.exists().then_some(candidate)
            }
        };

        let mut config = if let Some(path) = toml_path {
            log::debug!("Loading configuration from {}", path.display());
            Self::from_toml_file(&path)?
        } else {
            let book_path = input_dir.join(BOOK_FILE_NAME);
            let mut config = Self::default();
            if book_path.exists() {
                log::debug!("Loading GitBook settings from {}", book_path.display());
                config.apply_book_json(&book_path)?;
            } else {
                config.template.title = input_dir
                    .canonicalize()
                    .ok()
                    .and_then(|path| path.file_name().map(|name| name.to_string_lossy().to_string()))
                    .unwrap_or_else(|| config.template.title.clone());
            }
            config
        };

        config.anchor_paths(input_dir);
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).io_context("reading config", path)?;
        toml::from_str(&content).map_err(|error| QuireError::TomlParse {
            path: path.to_path_buf(),
            message: error.to_string(),
        })
    }

    fn apply_book_json(&mut self, path: &Path) -> Result<()> {
        let content = fs::read_to_string(path).io_context("reading book settings", path)?;
        let book: BookJson =
            serde_json::from_str(&content).map_err(|error| QuireError::JsonParse {
                path: path.to_path_buf(),
                message: error.to_string(),
            })?;

        if let Some(title) = book.title {
            self.template.title = title;
        }
        if let Some(root) = book.root {
            self.input = root;
        }
        if let Some(description) = book.description {
            self.template
                .metadata
                .insert("description".to_string(), Value::String(description));
        }
        if let Some(readme) = book.structure.readme {
            self.structure.readme = readme;
        }
        if let Some(summary) = book.structure.summary {
            self.structure.summary = summary;
        }

        Ok(())
    }

    fn anchor_paths(&mut self, input_dir: &Path) {
        let anchor = |path: &Path| -> PathBuf {
            if path.is_absolute() {
                path.to_path_buf()
            } else if path == Path::new(".") {
                input_dir.to_path_buf()
            } else {
                input_dir.join(path)
            }
        };

        let base = self.input.clone();
        self.input = anchor(&base);
        self.output = anchor(&self.output.clone());
        self.template.filename = self.template.filename.as_deref().map(anchor);
        self.template.assets_dir = self.template.assets_dir.as_deref().map(anchor);
        self.pdf.template = self.pdf.template.as_deref().map(anchor);
    }

    pub fn summary_path(&self) -> PathBuf {
        self.input.join(&self.structure.summary)
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.template
            .assets_dir
            .clone()
            .unwrap_or_else(|| self.input.join("assets"))
    }

    pub fn output_within_input(&self) -> Option<PathBuf> {
        self.output
            .strip_prefix(&self.input)
            .ok()
            .filter(|relative| !relative.as_os_str().is_empty())
            .map(Path::to_path_buf)
    }
}
