use crate::config::Config;
use crate::error::{IoContext, QuireError, Result};
use crate::resolver::Resolver;
use crate::types::Page;
use serde_json::{Map, Value};
use std::fs;
use std::path::PathBuf;

pub const SEARCH_FILE_NAME: &str = "search.json";

pub fn search_entries(resolver: &Resolver, pages: &[Page]) -> Vec<Value> {
    pages
        .iter()
        .map(|page| {
            let mut entry: Map<String, Value> = page
                .rendered
                .metadata
                .raw
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();

            entry.insert(
                "href".to_string(),
                Value::String(resolver.resolve(&page.document.filename, 0)),
            );
            if let Some(title) = &page.rendered.title {
                entry.insert("title".to_string(), Value::String(title.clone()));
            }

            Value::Object(entry)
        })
        .collect()
}

pub fn generate_search_index(
    config: &Config,
    resolver: &Resolver,
    pages: &[Page],
) -> Result<PathBuf> {
    let entries = search_entries(resolver, pages);
    let destination = config.output.join(SEARCH_FILE_NAME);
    let json = serde_json::to_string(&entries).map_err(|error| QuireError::Serialize {
        path: destination.clone(),
        message: error.to_string(),
    })?;

    fs::create_dir_all(&config.output).io_context("creating directory", &config.output)?;
    fs::write(&destination, json).io_context("writing", &destination)?;
    log::info!("Wrote {SEARCH_FILE_NAME}");

    Ok(destination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Document, Frontmatter, RenderedDocument};
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn page(filename: &str, title: Option<&str>, metadata: &[(&str, &str)]) -> Page {
        Page {
            document: Document {
                filename: filename.to_string(),
                source: PathBuf::from(filename),
                destination: PathBuf::from(filename),
                contents: String::new(),
            },
            rendered: RenderedDocument {
                title: title.map(String::from),
                metadata: Frontmatter {
                    raw: metadata
                        .iter()
                        .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
                        .collect::<HashMap<_, _>>(),
                },
                ..RenderedDocument::default()
            },
        }
    }

    #[test]
    fn test_entries_carry_href_title_and_metadata() {
        let resolver = Resolver::new("README.md", "https://docs.example.com");
        let entries = search_entries(
            &resolver,
            &[
                page("README.md", Some("Home"), &[("author", "jo")]),
                page("guide/intro.md", None, &[]),
            ],
        );

        assert_eq!(entries[0]["href"], "");
        assert_eq!(entries[0]["title"], "Home");
        assert_eq!(entries[0]["author"], "jo");
        assert_eq!(entries[1]["href"], "guide/intro.html");
        assert!(entries[1].get("title").is_none());
    }

    #[test]
    fn test_generated_title_wins_over_metadata_title() {
        let resolver = Resolver::new("README.md", "https://docs.example.com");
        let entries = search_entries(
            &resolver,
            &[page("a.md", Some("Heading"), &[("title", "Front")])],
        );
        assert_eq!(entries[0]["title"], "Heading");
    }

    #[test]
    fn test_generate_search_index_writes_json_array() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.output = dir.path().to_path_buf();
        let resolver = Resolver::new("README.md", &config.url);

        let path =
            generate_search_index(&config, &resolver, &[page("a.md", Some("A"), &[])]).unwrap();
        let parsed: Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();

        assert!(parsed.is_array());
        assert_eq!(parsed[0]["href"], "a.html");
    }
}
