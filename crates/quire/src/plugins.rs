use crate::error::{QuireError, Result};
use crate::resolver::is_external;
use indexmap::IndexMap;
use std::sync::Arc;

pub const EXTERNAL_LINKS: &str = "external-links";
pub const LAZY_IMAGES: &str = "lazy-images";

const ANCHOR_OPEN: &str = "<a href=\"";
const IMAGE_OPEN: &str = "<img ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Page,
    Print,
}

pub trait PagePostProcessor: Send + Sync {
    fn name(&self) -> &str;

    fn handles(&self, kind: OutputKind) -> bool {
        kind == OutputKind::Page
    }

    fn process(&self, html: &str) -> Result<String>;
}

pub struct ExternalLinks;

impl PagePostProcessor for ExternalLinks {
    fn name(&self) -> &str {
        EXTERNAL_LINKS
    }

    fn process(&self, html: &str) -> Result<String> {
        let mut output = String::with_capacity(html.len());
        let mut rest = html;

        while let Some(start) = rest.find(ANCHOR_OPEN) {
            let value_start = start + ANCHOR_OPEN.len();
            output.push_str(&rest[..value_start]);
            rest = &rest[value_start..];

            let Some(value_end) = rest.find('"') else {
                break;
            };
            let href = &rest[..value_end];
            output.push_str(&rest[..=value_end]);
            rest = &rest[value_end + 1..];

            if is_external(href) {
                output.push_str(" target=\"_blank\" rel=\"noopener noreferrer\"");
            }
        }

        output.push_str(rest);
        Ok(output)
    }
}

pub struct LazyImages;

impl PagePostProcessor for LazyImages {
    fn name(&self) -> &str {
        LAZY_IMAGES
    }

    fn process(&self, html: &str) -> Result<String> {
        let mut output = String::with_capacity(html.len());
        let mut rest = html;

        while let Some(start) = rest.find(IMAGE_OPEN) {
            let attributes_start = start + IMAGE_OPEN.len();
            output.push_str(&rest[..attributes_start]);
            rest = &rest[attributes_start..];

            let tag_end = rest.find('>').unwrap_or(rest.len());
            if !rest[..tag_end].contains("loading=") {
                output.push_str("loading=\"lazy\" ");
            }
        }

        output.push_str(rest);
        Ok(output)
    }
}

pub struct PostProcessorRegistry {
    available: IndexMap<String, Arc<dyn PagePostProcessor>>,
}

impl Default for PostProcessorRegistry {
    fn default() -> Self {
        let mut registry = Self {
            available: IndexMap::new(),
        };
        registry.register(Arc::new(ExternalLinks));
        registry.register(Arc::new(LazyImages));
        registry
    }
}

impl PostProcessorRegistry {
    pub fn register(&mut self, processor: Arc<dyn PagePostProcessor>) {
        self.available
            .insert(processor.name().to_string(), processor);
    }

    pub fn names(&self) -> Vec<&str> {
        self.available.keys().map(String::as_str).collect()
    }

    pub fn resolve(&self, names: &[String]) -> Result<PostProcessors> {
        let selected = names
            .iter()
            .map(|name| {
                self.available
                    .get(name)
                    .cloned()
                    .ok_or_else(|| QuireError::UnknownPostProcessor {
                        name: name.clone(),
                        available: self.names().join(", "),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(PostProcessors { selected })
    }
}

#[derive(Clone, Default)]
pub struct PostProcessors {
    selected: Vec<Arc<dyn PagePostProcessor>>,
}

impl PostProcessors {
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// A failing processor is skipped for this page; the others still run.
    pub fn apply(&self, html: String, kind: OutputKind, label: &str) -> String {
        self.selected
            .iter()
            .filter(|processor| processor.handles(kind))
            .fold(html, |html, processor| match processor.process(&html) {
                Ok(processed) => processed,
                Err(error) => {
                    log::warn!("Post-processor {} failed on {label}: {error}", processor.name());
                    html
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Shout;

    impl PagePostProcessor for Shout {
        fn name(&self) -> &str {
            "shout"
        }

        fn handles(&self, _kind: OutputKind) -> bool {
            true
        }

        fn process(&self, html: &str) -> Result<String> {
            Ok(html.to_uppercase())
        }
    }

    struct Broken;

    impl PagePostProcessor for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn process(&self, _html: &str) -> Result<String> {
            Err(QuireError::Collaborator {
                name: "broken".to_string(),
                message: "always fails".to_string(),
            })
        }
    }

    #[test]
    fn test_external_links() {
        let html = r#"<a href="https://example.com">x</a> <a href="guide/">y</a>"#;
        let processed = ExternalLinks.process(html).unwrap();
        assert_eq!(
            processed,
            r#"<a href="https://example.com" target="_blank" rel="noopener noreferrer">x</a> <a href="guide/">y</a>"#
        );
    }

    #[test]
    fn test_lazy_images() {
        let html = r#"<img src="a.png" alt="a" /><img loading="eager" src="b.png" />"#;
        let processed = LazyImages.process(html).unwrap();
        assert_eq!(
            processed,
            r#"<img loading="lazy" src="a.png" alt="a" /><img loading="eager" src="b.png" />"#
        );
    }

    #[test]
    fn test_resolve_unknown_name() {
        let registry = PostProcessorRegistry::default();
        let result = registry.resolve(&["minify-js".to_string()]);
        match result {
            Err(QuireError::UnknownPostProcessor { name, available }) => {
                assert_eq!(name, "minify-js");
                assert_eq!(available, "external-links, lazy-images");
            }
            _ => panic!("expected UnknownPostProcessor"),
        }
    }

    #[test]
    fn test_custom_processor_runs_in_order() {
        let mut registry = PostProcessorRegistry::default();
        registry.register(Arc::new(Shout));
        let processors = registry
            .resolve(&[LAZY_IMAGES.to_string(), "shout".to_string()])
            .unwrap();

        let html = processors.apply("<img src=\"a.png\">".to_string(), OutputKind::Page, "a.html");
        assert_eq!(html, "<IMG LOADING=\"LAZY\" SRC=\"A.PNG\">");

        let print = processors.apply("<img src=\"a.png\">".to_string(), OutputKind::Print, "print");
        assert_eq!(print, "<IMG SRC=\"A.PNG\">");
    }

    #[test]
    fn test_failing_processor_keeps_html() {
        let mut registry = PostProcessorRegistry::default();
        registry.register(Arc::new(Broken));
        let processors = registry
            .resolve(&["broken".to_string(), EXTERNAL_LINKS.to_string()])
            .unwrap();

        let html = processors.apply(
            "<a href=\"//cdn.example.com\">c</a>".to_string(),
            OutputKind::Page,
            "index.html",
        );
        assert!(html.contains("target=\"_blank\""));
    }
}
