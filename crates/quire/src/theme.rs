use crate::config::Config;
use crate::error::Result;
use crate::resolver::Resolver;
use crate::types::Page;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tera::{Context, Tera};

const TEMPLATE_NAME: &str = "page.html";

#[derive(Debug, Clone, Serialize)]
pub struct PrintSection {
    pub title: Option<String>,
    pub anchor: String,
    pub body: String,
}

pub struct TemplateEngine<'a> {
    tera: Tera,
    config: &'a Config,
    resolver: &'a Resolver,
}

impl<'a> TemplateEngine<'a> {
    pub fn new(template: &str, config: &'a Config, resolver: &'a Resolver) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, template)?;
        Ok(Self {
            tera,
            config,
            resolver,
        })
    }

    pub fn render_page(&self, page: &Page) -> Result<String> {
        let depth = page.document.depth();
        let rendered = &page.rendered;
        let base_title = &self.config.template.title;

        let title = match &rendered.title {
            Some(page_title) if page_title != base_title => format!("{page_title} - {base_title}"),
            _ => base_title.clone(),
        };

        let mut context = Context::new();
        context.insert("menu", &rendered.menu_html);
        context.insert("body", &rendered.body_html);
        context.insert("title", &title);
        context.insert("page_title", &rendered.title);
        context.insert("base_title", base_title);
        context.insert("language", &self.config.template.language);
        context.insert("metadata", &self.metadata(&rendered.metadata.raw));
        context.insert("scripts", &self.links(&self.config.template.scripts, depth));
        context.insert("styles", &self.links(&self.config.template.styles, depth));
        context.insert("root", &root_prefix(depth));

        Ok(self.tera.render(TEMPLATE_NAME, &context)?)
    }

    pub fn render_print(&self, pages: &[Page], toc: &[String]) -> Result<String> {
        let sections: Vec<PrintSection> = self
            .order_pages(pages, toc)
            .into_iter()
            .map(|page| PrintSection {
                title: page.rendered.title.clone(),
                anchor: anchor_for(&self.page_key(page)),
                body: page.rendered.body_html.clone(),
            })
            .collect();

        let mut context = Context::new();
        context.insert("title", &self.config.template.title);
        context.insert("language", &self.config.template.language);
        context.insert("metadata", &self.metadata(&HashMap::new()));
        context.insert("styles", &self.links(&self.config.template.styles, 0));
        context.insert("pages", &sections);

        Ok(self.tera.render(TEMPLATE_NAME, &context)?)
    }

    pub fn order_pages<'p>(&self, pages: &'p [Page], toc: &[String]) -> Vec<&'p Page> {
        let keyed: HashMap<String, &Page> = pages
            .iter()
            .map(|page| (self.page_key(page), page))
            .collect();

        let mut ordered: Vec<&Page> = toc.iter().filter_map(|key| keyed.get(key).copied()).collect();

        let mut rest: Vec<&Page> = pages
            .iter()
            .filter(|page| !toc.contains(&self.page_key(page)))
            .collect();
        rest.sort_by(|left, right| left.document.filename.cmp(&right.document.filename));

        ordered.extend(rest);
        ordered
    }

    fn page_key(&self, page: &Page) -> String {
        self.resolver
            .target(&page.document.filename, "")
            .unwrap_or_default()
    }

    fn metadata(&self, page: &HashMap<String, Value>) -> HashMap<String, Value> {
        let mut merged = self.config.template.metadata.clone();
        merged.extend(page.iter().map(|(key, value)| (key.clone(), value.clone())));
        merged
            .entry("description".to_string())
            .or_insert_with(|| Value::String(String::new()));
        merged
    }

    fn links(&self, hrefs: &[String], depth: usize) -> Vec<String> {
        hrefs
            .iter()
            .map(|href| self.resolver.resolve(href, depth))
            .collect()
    }
}

fn root_prefix(depth: usize) -> String {
    if depth == 0 {
        "./".to_string()
    } else {
        "../".repeat(depth)
    }
}

fn anchor_for(key: &str) -> String {
    let trimmed = key.trim_end_matches('/').trim_end_matches(".html");
    if trimmed.is_empty() {
        return "index".to_string();
    }

    trimmed
        .chars()
        .map(|character| {
            if character.is_ascii_alphanumeric() || character == '-' || character == '_' {
                character.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Document, Frontmatter, RenderedDocument};
    use std::path::PathBuf;

    fn page(filename: &str, title: Option<&str>, body: &str) -> Page {
        Page {
            document: Document {
                filename: filename.to_string(),
                source: PathBuf::from("/in").join(filename),
                destination: PathBuf::from("/out").join(filename),
                contents: String::new(),
            },
            rendered: RenderedDocument {
                menu_html: "<ul><li>menu</li></ul>".to_string(),
                title: title.map(String::from),
                body_html: body.to_string(),
                ..RenderedDocument::default()
            },
        }
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.template.title = "Handbook".to_string();
        config.template.styles = vec!["style.css".to_string(), "https://cdn.example.com/x.css".to_string()];
        config
    }

    const TEMPLATE: &str = "{{ title }}|{{ root | safe }}|{% for s in styles %}{{ s | safe }};{% endfor %}|{{ metadata.description }}|{{ metadata.author }}|{{ body | safe }}";

    #[test]
    fn test_render_page_context() {
        let config = config();
        let resolver = Resolver::new("README.md", &config.url);
        let engine = TemplateEngine::new(TEMPLATE, &config, &resolver).unwrap();

        let mut intro = page("guide/intro.md", Some("Intro"), "<p>x</p>");
        intro.rendered.metadata = Frontmatter {
            raw: HashMap::from([("author".to_string(), Value::String("jo".to_string()))]),
        };

        let html = engine.render_page(&intro).unwrap();
        assert_eq!(
            html,
            "Intro - Handbook|../|../style.css;https://cdn.example.com/x.css;||jo|<p>x</p>"
        );
    }

    #[test]
    fn test_untitled_page_uses_base_title() {
        let config = config();
        let resolver = Resolver::new("README.md", &config.url);
        let engine = TemplateEngine::new("{{ title }} {{ root | safe }}", &config, &resolver).unwrap();
        let html = engine.render_page(&page("README.md", None, "")).unwrap();
        assert_eq!(html, "Handbook ./");
    }

    #[test]
    fn test_malformed_template_is_error() {
        let config = config();
        let resolver = Resolver::new("README.md", &config.url);
        assert!(TemplateEngine::new("{% for %}", &config, &resolver).is_err());
    }

    #[test]
    fn test_print_follows_toc_then_path_order() {
        let config = config();
        let resolver = Resolver::new("README.md", &config.url);
        let engine = TemplateEngine::new(
            "{% for page in pages %}[{{ page.anchor }}:{{ page.body | safe }}]{% endfor %}",
            &config,
            &resolver,
        )
        .unwrap();

        let pages = vec![
            page("README.md", Some("Home"), "home"),
            page("appendix.md", None, "appendix"),
            page("guide/intro.md", Some("Intro"), "intro"),
        ];
        let toc = vec!["guide/intro.html".to_string(), String::new()];

        let html = engine.render_print(&pages, &toc).unwrap();
        assert_eq!(html, "[guide-intro:intro][index:home][appendix:appendix]");
    }

    #[test]
    fn test_anchor_for() {
        assert_eq!(anchor_for(""), "index");
        assert_eq!(anchor_for("guide/"), "guide");
        assert_eq!(anchor_for("guide/Intro.html"), "guide-intro");
    }
}
