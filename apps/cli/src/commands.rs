use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use quire::config::CONFIG_FILE_NAME;
use quire::{BuildMode, BuildResult, Config, Coordinator, SiteBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Instant;

pub struct BuildOptions {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub pdf: Option<PathBuf>,
    pub watch: bool,
    pub minify: bool,
}

fn escape_toml_string(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for character in input.chars() {
        match character {
            '\\' => output.push_str("\\\\"),
            '"' => output.push_str("\\\""),
            '\n' => output.push_str("\\n"),
            '\r' => output.push_str("\\r"),
            '\t' => output.push_str("\\t"),
            control if control < '\u{0020}' => {
                output.push_str(&format!("\\u{:04X}", control as u32));
            }
            other => output.push(other),
        }
    }
    output
}

fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

pub fn init_book(directory: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let book_dir = absolute(directory.unwrap_or(Path::new(".")))?;

    if book_dir.join(CONFIG_FILE_NAME).exists() {
        return Err(format!("{CONFIG_FILE_NAME} already exists in {}", book_dir.display()).into());
    }

    fs::create_dir_all(&book_dir)?;

    let name = book_dir
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "My Book".to_string());

    let escaped_name = escape_toml_string(&name);
    let config = format!(
        r#"url = "http://localhost"
output = "_book"

[template]
title = "{escaped_name}"
language = "en"
"#
    );
    fs::write(book_dir.join(CONFIG_FILE_NAME), config)?;

    let readme = book_dir.join("README.md");
    if !readme.exists() {
        fs::write(
            &readme,
            format!("# {name}\n\nWelcome! Start writing in markdown.\n"),
        )?;
    }

    let summary = book_dir.join("SUMMARY.md");
    if !summary.exists() {
        fs::write(&summary, "# Summary\n\n* [Introduction](README.md)\n")?;
    }

    log::info!("Initialized book in {}", book_dir.display());

    Ok(())
}

pub fn build_book(options: &BuildOptions) -> Result<(), Box<dyn std::error::Error>> {
    let input_dir = absolute(options.input.as_deref().unwrap_or(Path::new(".")))?;
    let input_dir = input_dir.canonicalize().unwrap_or(input_dir);

    let config_path = options.config.as_deref().map(absolute).transpose()?;
    let mut config = Config::load(&input_dir, config_path.as_deref())?;

    if let Some(output) = &options.output {
        config.output = absolute(output)?;
    }
    if options.minify {
        config.minify = true;
    }

    let mode = match &options.pdf {
        Some(pdf) => BuildMode::Document {
            destination: absolute(pdf)?,
        },
        None => BuildMode::Web,
    };

    let builder = SiteBuilder::new(config, mode)?;

    let start = Instant::now();
    let result = builder.build(&[])?;
    log::info!(
        "Built {} into {} in {:.2?}",
        builder.config().input.display(),
        builder.config().output.display(),
        start.elapsed()
    );

    if options.watch {
        if builder.mode().is_document() {
            log::warn!("Watch mode is not available when producing a PDF");
            return Ok(());
        }
        watch_book(&builder, &result)?;
    }

    Ok(())
}

fn watch_book(builder: &SiteBuilder, initial: &BuildResult) -> Result<(), Box<dyn std::error::Error>> {
    let config = builder.config();
    let (sender, receiver) = channel::<PathBuf>();

    let mut watcher = RecommendedWatcher::new(
        move |result: notify::Result<Event>| match result {
            Ok(event) => {
                if matches!(
                    event.kind,
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                ) {
                    for path in event.paths {
                        if sender.send(path).is_err() {
                            return;
                        }
                    }
                }
            }
            Err(error) => log::warn!("Watch error: {error}"),
        },
        notify::Config::default(),
    )?;
    watcher.watch(&config.input, RecursiveMode::Recursive)?;

    let mut coordinator = Coordinator::new(config);
    let summary = config.summary_path();
    coordinator.remember(
        initial
            .pages
            .iter()
            .map(|page| page.document.source.as_path())
            .chain([summary.as_path()]),
    );

    log::info!(
        "Watching {} for changes. Press Ctrl+C to stop.",
        config.input.display()
    );

    coordinator.run(&receiver, |rebuild| {
        let start = Instant::now();
        let result = builder.build(&rebuild.changed())?;
        log::info!(
            "Rebuilt {} page(s) in {:.2?}",
            result.pages.len(),
            start.elapsed()
        );
        Ok(())
    });

    Ok(())
}
