use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildMode {
    Web,
    Document { destination: PathBuf },
}

impl BuildMode {
    pub fn is_document(&self) -> bool {
        matches!(self, BuildMode::Document { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub filename: String,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub contents: String,
}

impl Document {
    pub fn directory(&self) -> &str {
        self.filename
            .rsplit_once('/')
            .map(|(directory, _)| directory)
            .unwrap_or("")
    }

    pub fn depth(&self) -> usize {
        crate::resolver::depth_of(Path::new(&self.filename))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frontmatter {
    #[serde(flatten)]
    pub raw: HashMap<String, Value>,
}

impl Frontmatter {
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.raw.get(key).and_then(|v| v.as_str().map(String::from))
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedDocument {
    pub menu_html: String,
    pub metadata: Frontmatter,
    pub title: Option<String>,
    pub body_html: String,
    pub resources: IndexSet<String>,
    pub toc: IndexSet<String>,
}

#[derive(Debug, Clone)]
pub struct Page {
    pub document: Document,
    pub rendered: RenderedDocument,
}
