use crate::config::Config;
use crate::error::{IoContext, Result};
use crate::resolver::Resolver;
use crate::types::Page;
use std::fs;
use std::path::PathBuf;

pub const SITEMAP_FILE_NAME: &str = "sitemap.xml";

pub fn generate_sitemap(config: &Config, resolver: &Resolver, pages: &[Page]) -> Result<PathBuf> {
    let changefreq = escape_xml(&config.sitemap.changefreq);
    let priority = config.sitemap.priority;

    let mut urls = String::new();
    for page in pages {
        urls.push_str(&format!(
            "  <url>\n    <loc>{}</loc>\n    <changefreq>{}</changefreq>\n    <priority>{}</priority>\n  </url>\n",
            escape_xml(&resolver.url(&page.document.filename)),
            changefreq,
            priority
        ));
    }

    let sitemap = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
{urls}</urlset>
"#
    );

    let destination = config.output.join(SITEMAP_FILE_NAME);
    fs::create_dir_all(&config.output).io_context("creating directory", &config.output)?;
    fs::write(&destination, sitemap).io_context("writing", &destination)?;
    log::info!("Wrote {SITEMAP_FILE_NAME}");

    Ok(destination)
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
