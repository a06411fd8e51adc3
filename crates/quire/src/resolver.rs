use std::path::{Component, Path};

#[derive(Debug, Clone)]
pub struct Resolver {
    readme_html: String,
    base_url: String,
}

impl Resolver {
    pub fn new(readme: &str, base_url: &str) -> Self {
        Self {
            readme_html: markdown_to_html(readme),
            base_url: format!("{}/", base_url.trim_end_matches('/')),
        }
    }

    pub fn resolve(&self, href: &str, depth: usize) -> String {
        if is_external(href) || href.starts_with('#') {
            return href.to_string();
        }

        let (path, fragment) = split_fragment(href);
        let normalized = self.strip(path);

        let prefix = if href.starts_with('.') {
            String::new()
        } else {
            "../".repeat(depth)
        };

        match fragment {
            Some(fragment) => format!("{prefix}{normalized}#{fragment}"),
            None => format!("{prefix}{normalized}"),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, self.resolve(path, 0))
    }

    /// Root-relative, fragment-free form of an internal link written inside a
    /// document living in `origin_dir`. Links starting with `.` are relative to
    /// that directory; everything else is relative to the input root.
    pub fn target(&self, href: &str, origin_dir: &str) -> Option<String> {
        if is_external(href) || href.starts_with('#') {
            return None;
        }

        let (path, _) = split_fragment(href);
        let joined = if path.starts_with('.') {
            normalize_relative(origin_dir, path)?
        } else {
            normalize_relative("", path.trim_start_matches('/'))?
        };

        Some(self.strip(&joined))
    }

    fn strip(&self, name: &str) -> String {
        let name = name.trim_start_matches('/');
        let name = match name.strip_suffix(".md") {
            Some(stem) => format!("{stem}.html"),
            None => name.to_string(),
        };

        let (directory, file) = match name.rsplit_once('/') {
            Some((directory, file)) => (Some(directory), file),
            None => (None, name.as_str()),
        };

        if file == self.readme_html {
            return match directory {
                Some(directory) => format!("{directory}/"),
                None => String::new(),
            };
        }

        name
    }
}

pub fn markdown_to_html(name: &str) -> String {
    match name.strip_suffix(".md") {
        Some(stem) => format!("{stem}.html"),
        None => name.to_string(),
    }
}

pub fn depth_of(filename: &Path) -> usize {
    filename
        .parent()
        .map(|parent| {
            parent
                .components()
                .filter(|component| matches!(component, Component::Normal(_)))
                .count()
        })
        .unwrap_or(0)
}

pub fn is_external(href: &str) -> bool {
    if href.starts_with("//") {
        return true;
    }

    match href.split_once(':') {
        Some((scheme, _)) => {
            let mut characters = scheme.chars();
            scheme.len() > 1
                && characters
                    .next()
                    .map(|first| first.is_ascii_alphabetic())
                    .unwrap_or(false)
                && characters.all(|character| {
                    character.is_ascii_alphanumeric() || matches!(character, '+' | '-' | '.')
                })
        }
        None => false,
    }
}

fn split_fragment(href: &str) -> (&str, Option<&str>) {
    match href.split_once('#') {
        Some((path, fragment)) => (path, Some(fragment)),
        None => (href, None),
    }
}

/// Lexically joins `path` onto `directory` (both `/`-separated, relative to the
/// input root). Returns `None` when the result would climb above the root.
pub fn normalize_relative(directory: &str, path: &str) -> Option<String> {
    let mut segments: Vec<&str> = directory
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }

    let mut joined = segments.join("/");
    if path.ends_with('/') && !joined.is_empty() {
        joined.push('/');
    }
    Some(joined)
}
