use crate::bundler::run_external;
use crate::config::{Config, PdfConfig};
use crate::error::{IoContext, Result};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct OutputFile {
    pub destination: PathBuf,
    pub html: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub written: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

pub trait Paginator: Send + Sync {
    fn paginate(&self, input: &Path, output: &Path) -> Result<()>;
}

pub struct CommandPaginator {
    command: String,
    args: Vec<String>,
}

impl CommandPaginator {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    pub fn from_config(pdf: &PdfConfig) -> Self {
        Self::new(pdf.command.clone(), pdf.args.clone())
    }
}

impl Paginator for CommandPaginator {
    fn paginate(&self, input: &Path, output: &Path) -> Result<()> {
        let input = input.to_string_lossy();
        let output_path = output.to_string_lossy();
        let args: Vec<String> = self
            .args
            .iter()
            .map(|arg| {
                arg.replace("{input}", &input)
                    .replace("{output}", &output_path)
            })
            .collect();

        let cwd = output
            .parent()
            .filter(|parent| output.is_absolute() && !parent.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        run_external("paginator", &self.command, &args, cwd)
    }
}

pub struct Publisher<'a> {
    config: &'a Config,
}

impl<'a> Publisher<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    pub fn publish(&self, files: &[OutputFile]) -> PublishReport {
        let results: Vec<(PathBuf, bool)> = files
            .par_iter()
            .map(|file| match self.write(&file.destination, &file.html) {
                Ok(()) => {
                    log::info!("Wrote {}", self.display(&file.destination));
                    (file.destination.clone(), true)
                }
                Err(error) => {
                    log::warn!("{error}");
                    (file.destination.clone(), false)
                }
            })
            .collect();

        let mut report = PublishReport::default();
        for (destination, written) in results {
            if written {
                report.written.push(destination);
            } else {
                report.failed.push(destination);
            }
        }
        report
    }

    pub fn publish_print(
        &self,
        html: &str,
        destination: &Path,
        paginator: &dyn Paginator,
    ) -> Result<PublishReport> {
        let print_path = self.print_path(destination);
        self.write(&print_path, html)?;
        log::info!("Wrote {}", self.display(&print_path));

        if let Some(parent) = destination.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).io_context("creating directory", parent)?;
        }
        paginator.paginate(&print_path, destination)?;
        log::info!("Wrote {}", destination.display());

        Ok(PublishReport {
            written: vec![print_path, destination.to_path_buf()],
            failed: Vec::new(),
        })
    }

    pub fn print_path(&self, destination: &Path) -> PathBuf {
        let stem = destination
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| "book".to_string());
        self.config.output.join(format!("{stem}.print.html"))
    }

    fn write(&self, destination: &Path, html: &str) -> Result<()> {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).io_context("creating directory", parent)?;
        }

        if self.config.minify {
            fs::write(destination, minify(html)).io_context("writing", destination)
        } else {
            fs::write(destination, html).io_context("writing", destination)
        }
    }

    fn display(&self, path: &Path) -> String {
        path.strip_prefix(&self.config.output)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

fn minify(html: &str) -> Vec<u8> {
    let mut cfg = minify_html::Cfg::new();
    cfg.minify_css = true;
    cfg.minify_js = true;
    cfg.keep_closing_tags = true;
    minify_html::minify(html.as_bytes(), &cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.input = dir.path().to_path_buf();
        config.output = dir.path().join("_book");
        config
    }

    #[test]
    fn test_publish_creates_directories() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        let files = vec![
            OutputFile {
                destination: config.output.join("index.html"),
                html: "<p>home</p>".to_string(),
            },
            OutputFile {
                destination: config.output.join("guide/deep/page.html"),
                html: "<p>deep</p>".to_string(),
            },
        ];

        let report = Publisher::new(&config).publish(&files);

        assert_eq!(report.written.len(), 2);
        assert!(report.failed.is_empty());
        assert_eq!(
            fs::read_to_string(config.output.join("guide/deep/page.html")).unwrap(),
            "<p>deep</p>"
        );
    }

    #[test]
    fn test_failed_write_does_not_stop_siblings() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        fs::create_dir_all(&config.output).unwrap();
        fs::write(config.output.join("blocked"), "a file, not a directory").unwrap();

        let files = vec![
            OutputFile {
                destination: config.output.join("blocked/page.html"),
                html: "x".to_string(),
            },
            OutputFile {
                destination: config.output.join("ok.html"),
                html: "y".to_string(),
            },
        ];

        let report = Publisher::new(&config).publish(&files);

        assert_eq!(report.failed, vec![config.output.join("blocked/page.html")]);
        assert_eq!(report.written, vec![config.output.join("ok.html")]);
    }

    #[test]
    fn test_minify() {
        let dir = TempDir::new().unwrap();
        let mut config = config(&dir);
        config.minify = true;
        let html = "<html>\n  <body>\n    <p>   spaced   </p>\n  </body>\n</html>";
        let files = vec![OutputFile {
            destination: config.output.join("index.html"),
            html: html.to_string(),
        }];

        Publisher::new(&config).publish(&files);
        let written = fs::read_to_string(config.output.join("index.html")).unwrap();
        assert!(written.len() < html.len());
        assert!(written.contains("spaced"));
    }

    struct RecordingPaginator {
        calls: Mutex<Vec<(PathBuf, PathBuf)>>,
    }

    impl Paginator for RecordingPaginator {
        fn paginate(&self, input: &Path, output: &Path) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push((input.to_path_buf(), output.to_path_buf()));
            fs::write(output, "%PDF").io_context("writing", output)
        }
    }

    #[test]
    fn test_publish_print_hands_off_to_paginator() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        let destination = dir.path().join("out/book.pdf");
        let paginator = RecordingPaginator {
            calls: Mutex::new(Vec::new()),
        };

        let report = Publisher::new(&config)
            .publish_print("<h1>all</h1>", &destination, &paginator)
            .unwrap();

        let print_path = config.output.join("book.print.html");
        assert_eq!(fs::read_to_string(&print_path).unwrap(), "<h1>all</h1>");
        assert_eq!(
            paginator.calls.lock().unwrap().as_slice(),
            &[(print_path.clone(), destination.clone())]
        );
        assert_eq!(report.written, vec![print_path, destination.clone()]);
        assert!(destination.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_command_paginator_substitutes_paths() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.html");
        let output = dir.path().join("out.pdf");
        fs::write(&input, "print").unwrap();

        let paginator = CommandPaginator::new(
            "sh",
            vec!["-c".to_string(), "cp {input} {output}".to_string()],
        );
        paginator.paginate(&input, &output).unwrap();

        assert_eq!(fs::read_to_string(&output).unwrap(), "print");
    }

    #[cfg(unix)]
    #[test]
    fn test_command_paginator_accepts_bare_file_name() {
        let paginator =
            CommandPaginator::new("sh", vec!["-c".to_string(), "true".to_string()]);
        paginator
            .paginate(Path::new("book.print.html"), Path::new("book.pdf"))
            .unwrap();
    }

    #[test]
    fn test_command_paginator_failure_is_error() {
        let dir = TempDir::new().unwrap();
        let paginator = CommandPaginator::new("quire-no-such-browser", Vec::new());
        let result = paginator.paginate(&dir.path().join("a.html"), &dir.path().join("a.pdf"));
        assert!(result.is_err());
    }
}
