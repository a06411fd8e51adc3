use crate::config::Config;
use crate::error::{IoContext, Result};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyReport {
    pub copied: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

pub fn copy_static(config: &Config, resources: &[String], include_template: bool) -> CopyReport {
    let mut jobs: Vec<(PathBuf, PathBuf)> = resources
        .iter()
        .map(|resource| (config.input.join(resource), config.output.join(resource)))
        .collect();

    if include_template {
        let assets_dir = config.assets_dir();
        jobs.extend(
            config
                .template
                .resources
                .iter()
                .map(|resource| (assets_dir.join(resource), config.output.join(resource))),
        );
    }

    let results: Vec<(PathBuf, bool)> = jobs
        .par_iter()
        .map(|(source, destination)| match copy_file(source, destination) {
            Ok(()) => {
                log::info!(
                    "Copied {}",
                    destination
                        .strip_prefix(&config.output)
                        .unwrap_or(destination)
                        .display()
                );
                (destination.clone(), true)
            }
            Err(error) => {
                log::warn!("{error}");
                (destination.clone(), false)
            }
        })
        .collect();

    let mut report = CopyReport::default();
    for (destination, copied) in results {
        if copied {
            report.copied.push(destination);
        } else {
            report.failed.push(destination);
        }
    }
    report
}

fn copy_file(source: &Path, destination: &Path) -> Result<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).io_context("creating directory", parent)?;
    }
    fs::copy(source, destination).io_context("copying", source)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Config) {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("guide/images")).unwrap();
        fs::create_dir_all(dir.path().join("assets")).unwrap();
        fs::write(dir.path().join("guide/images/flow.png"), "png").unwrap();
        fs::write(dir.path().join("assets/theme.css"), "css").unwrap();

        let mut config = Config::default();
        config.input = dir.path().to_path_buf();
        config.output = dir.path().join("_book");
        config.template.resources = vec!["theme.css".to_string()];
        (dir, config)
    }

    #[test]
    fn test_copies_resources_to_mirrored_paths() {
        let (_dir, config) = setup();
        let report = copy_static(&config, &["guide/images/flow.png".to_string()], true);

        assert!(report.failed.is_empty());
        assert_eq!(
            fs::read_to_string(config.output.join("guide/images/flow.png")).unwrap(),
            "png"
        );
        assert_eq!(fs::read_to_string(config.output.join("theme.css")).unwrap(), "css");
    }

    #[test]
    fn test_template_resources_skipped_when_not_requested() {
        let (_dir, config) = setup();
        let report = copy_static(&config, &[], false);
        assert!(report.copied.is_empty());
        assert!(!config.output.join("theme.css").exists());
    }

    #[test]
    fn test_missing_resource_does_not_stop_others() {
        let (_dir, config) = setup();
        let report = copy_static(
            &config,
            &["missing.png".to_string(), "guide/images/flow.png".to_string()],
            false,
        );

        assert_eq!(report.failed, vec![config.output.join("missing.png")]);
        assert_eq!(report.copied, vec![config.output.join("guide/images/flow.png")]);
    }
}
