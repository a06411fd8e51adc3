use crate::config::Config;
use crate::error::{QuireError, Result};
use std::path::Path;
use std::process::Command;

pub fn run_bundler(config: &Config) -> Result<()> {
    let Some((program, args)) = config.bundler.command.split_first() else {
        return Ok(());
    };

    log::info!("Running bundler: {}", config.bundler.command.join(" "));
    run_external("bundler", program, args, &config.input)
}

pub(crate) fn run_external(label: &str, program: &str, args: &[String], cwd: &Path) -> Result<()> {
    let output = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .output()
        .map_err(|error| QuireError::Collaborator {
            name: label.to_string(),
            message: format!("could not start {program}: {error}"),
        })?;

    if !output.status.success() {
        return Err(QuireError::Collaborator {
            name: label.to_string(),
            message: format!(
                "{program} exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_no_command_is_noop() {
        let config = Config::default();
        assert!(run_bundler(&config).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_bundler_runs_in_input_dir() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.input = dir.path().to_path_buf();
        config.bundler.command = vec![
            "sh".to_string(),
            "-c".to_string(),
            "echo bundled > bundle.js".to_string(),
        ];

        run_bundler(&config).unwrap();
        assert!(dir.path().join("bundle.js").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_bundler_failure_is_error() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.input = dir.path().to_path_buf();
        config.bundler.command = vec!["sh".to_string(), "-c".to_string(), "exit 3".to_string()];

        let result = run_bundler(&config);
        assert!(matches!(result, Err(QuireError::Collaborator { .. })));
    }

    #[test]
    fn test_missing_program_is_error() {
        let dir = TempDir::new().unwrap();
        let result = run_external("bundler", "quire-no-such-program", &[], dir.path());
        assert!(matches!(result, Err(QuireError::Collaborator { .. })));
    }
}
