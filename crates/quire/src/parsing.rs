use crate::config::Config;
use crate::frontmatter::extract;
use crate::resolver::{Resolver, is_external, normalize_relative};
use crate::types::{Document, RenderedDocument};
use indexmap::IndexSet;
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd, html};
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

const FALLBACK_THEME: &str = "InspiredGitHub";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingAction {
    Render,
    Inert,
    Suppress,
}

pub trait RenderHooks {
    fn heading(&mut self, level: HeadingLevel) -> HeadingAction;
    fn link(&mut self, href: &str) -> String;
    fn image(&mut self, src: &str) -> String;
}

pub struct MenuHooks<'a> {
    pub resolver: &'a Resolver,
    pub depth: usize,
    pub toc: Option<&'a mut IndexSet<String>>,
}

impl RenderHooks for MenuHooks<'_> {
    fn heading(&mut self, level: HeadingLevel) -> HeadingAction {
        if level == HeadingLevel::H1 {
            HeadingAction::Suppress
        } else {
            HeadingAction::Inert
        }
    }

    fn link(&mut self, href: &str) -> String {
        if let Some(toc) = self.toc.as_deref_mut()
            && let Some(target) = self.resolver.target(href, "")
        {
            toc.insert(target);
        }
        self.resolver.resolve(href, self.depth)
    }

    fn image(&mut self, src: &str) -> String {
        self.resolver.resolve(src, self.depth)
    }
}

pub struct PageHooks<'a> {
    pub resolver: &'a Resolver,
    pub depth: usize,
    pub directory: &'a str,
    pub resources: &'a mut IndexSet<String>,
    pub toc: Option<&'a mut IndexSet<String>>,
    pub print: bool,
}

impl RenderHooks for PageHooks<'_> {
    fn heading(&mut self, level: HeadingLevel) -> HeadingAction {
        if level == HeadingLevel::H1 {
            HeadingAction::Suppress
        } else {
            HeadingAction::Render
        }
    }

    fn link(&mut self, href: &str) -> String {
        if let Some(toc) = self.toc.as_deref_mut()
            && let Some(target) = self.resolver.target(href, self.directory)
        {
            toc.insert(target);
        }
        self.resolver.resolve(href, self.depth)
    }

    fn image(&mut self, src: &str) -> String {
        if is_external(src) {
            return src.to_string();
        }

        let path = src.split(['#', '?']).next().unwrap_or(src);
        let (resource, display) = if let Some(rooted) = path.strip_prefix('/') {
            (
                normalize_relative("", rooted),
                self.resolver.resolve(src, self.depth),
            )
        } else {
            (
                normalize_relative(self.directory, path),
                self.resolver.resolve(src, 0),
            )
        };

        match resource {
            Some(resource) if !resource.is_empty() => {
                // The print document sits at the output root.
                let display = if self.print { resource.clone() } else { display };
                self.resources.insert(resource);
                display
            }
            _ => {
                log::warn!("Image '{src}' points outside the input directory, not copying it");
                display
            }
        }
    }
}

pub struct MarkdownRenderer {
    resolver: Resolver,
    options: Options,
    breaks: bool,
    syntax_set: SyntaxSet,
    theme: Theme,
}

impl MarkdownRenderer {
    pub fn new(config: &Config) -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        if config.markdown.task_lists {
            options.insert(Options::ENABLE_TASKLISTS);
        }

        Self {
            resolver: Resolver::new(&config.structure.readme, &config.url),
            options,
            breaks: config.markdown.breaks,
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme: load_theme(&config.markdown.syntax_theme),
        }
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Renders the outline and the body of one document. With `print` the
    /// table-of-contents links are recorded and images are addressed from the
    /// output root, where the concatenated print document is written.
    pub fn render(&self, document: &Document, summary: &str, print: bool) -> RenderedDocument {
        let extracted = extract(&document.contents);
        let depth = document.depth();
        let mut toc = IndexSet::new();
        let mut resources = IndexSet::new();

        let menu_html = {
            let mut hooks = MenuHooks {
                resolver: &self.resolver,
                depth,
                toc: print.then_some(&mut toc),
            };
            self.render_markdown(summary, &mut hooks)
        };

        let body_html = {
            let mut hooks = PageHooks {
                resolver: &self.resolver,
                depth,
                directory: document.directory(),
                resources: &mut resources,
                toc: print.then_some(&mut toc),
                print,
            };
            self.render_markdown(&extracted.body, &mut hooks)
        };

        RenderedDocument {
            menu_html,
            metadata: extracted.metadata,
            title: extracted.title,
            body_html,
            resources,
            toc,
        }
    }

    pub fn render_markdown(&self, content: &str, hooks: &mut dyn RenderHooks) -> String {
        let parser = Parser::new_ext(content, self.options);
        let mut events: Vec<Event> = Vec::new();
        let mut suppressing_heading = false;
        let mut inert_heading = false;
        let mut code_block: Option<(Option<String>, String)> = None;

        for event in parser {
            if suppressing_heading {
                if matches!(event, Event::End(TagEnd::Heading(_))) {
                    suppressing_heading = false;
                }
                continue;
            }

            if let Some((language, buffer)) = &mut code_block {
                match event {
                    Event::Text(text) => buffer.push_str(&text),
                    Event::End(TagEnd::CodeBlock) => {
                        let highlighted = self.highlight(buffer, language.as_deref());
                        events.push(Event::Html(highlighted.into()));
                        code_block = None;
                    }
                    _ => {}
                }
                continue;
            }

            match event {
                Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }) => match hooks.heading(level) {
                    HeadingAction::Suppress => suppressing_heading = true,
                    HeadingAction::Inert => {
                        inert_heading = true;
                        events.push(Event::Html("<span class=\"header\">".into()));
                    }
                    HeadingAction::Render => events.push(Event::Start(Tag::Heading {
                        level,
                        id,
                        classes,
                        attrs,
                    })),
                },
                Event::End(TagEnd::Heading(level)) => {
                    if inert_heading {
                        inert_heading = false;
                        events.push(Event::Html("</span>\n".into()));
                    } else {
                        events.push(Event::End(TagEnd::Heading(level)));
                    }
                }
                Event::Start(Tag::Link {
                    link_type,
                    dest_url,
                    title,
                    id,
                }) => {
                    let resolved = hooks.link(&dest_url);
                    events.push(Event::Start(Tag::Link {
                        link_type,
                        dest_url: resolved.into(),
                        title,
                        id,
                    }));
                }
                Event::Start(Tag::Image {
                    link_type,
                    dest_url,
                    title,
                    id,
                }) => {
                    let resolved = hooks.image(&dest_url);
                    events.push(Event::Start(Tag::Image {
                        link_type,
                        dest_url: resolved.into(),
                        title,
                        id,
                    }));
                }
                Event::Start(Tag::CodeBlock(kind)) => {
                    let language = match kind {
                        CodeBlockKind::Fenced(info) => info
                            .split([',', ' '])
                            .next()
                            .filter(|token| !token.is_empty())
                            .map(String::from),
                        CodeBlockKind::Indented => None,
                    };
                    code_block = Some((language, String::new()));
                }
                Event::SoftBreak if self.breaks => events.push(Event::HardBreak),
                other => events.push(other),
            }
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());
        html_output
    }

    fn highlight(&self, code: &str, language: Option<&str>) -> String {
        let Some(language) = language else {
            return format!("<pre><code>{}</code></pre>\n", escape_html(code));
        };

        match self.syntax_set.find_syntax_by_token(language) {
            Some(syntax) => {
                highlighted_html_for_string(code, &self.syntax_set, syntax, &self.theme)
                    .unwrap_or_else(|error| {
                        log::warn!("Highlighting {language} block failed: {error}");
                        plain_code_block(code, language)
                    })
            }
            None => plain_code_block(code, language),
        }
    }
}

fn load_theme(name: &str) -> Theme {
    let mut themes = ThemeSet::load_defaults().themes;
    if let Some(theme) = themes.remove(name) {
        return theme;
    }

    log::warn!("Unknown syntax theme '{name}', using {FALLBACK_THEME}");
    themes.remove(FALLBACK_THEME).unwrap_or_default()
}

fn plain_code_block(code: &str, language: &str) -> String {
    format!(
        "<pre><code class=\"language-{}\">{}</code></pre>\n",
        escape_html(language),
        escape_html(code)
    )
}

pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
