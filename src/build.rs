//! Site build module
//!
//! The served tree is produced by an external generator. This module only
//! decides whether to run it and hands back the directory to serve.

use crate::config::SiteConfig;
use crate::logger;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

pub const SKIP_BUILD_WARNING: &str = "Build warning: Skipping the initial build.";

/// Something that can populate the destination directory of a site
pub trait SiteBuilder {
    /// Build the site and return the directory to serve
    fn build(&self, site: &SiteConfig) -> io::Result<PathBuf>;
}

/// Runs an external generator command
///
/// `{source}` and `{destination}` in the command are replaced with the
/// configured directories. Arguments are split on whitespace; no shell is
/// involved.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    command: String,
}

impl CommandBuilder {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    fn argv(&self, site: &SiteConfig) -> Vec<String> {
        let source = site.source.to_string_lossy();
        let destination = site.destination.to_string_lossy();
        self.command
            .split_whitespace()
            .map(|arg| {
                arg.replace("{source}", &source)
                    .replace("{destination}", &destination)
            })
            .collect()
    }
}

impl SiteBuilder for CommandBuilder {
    fn build(&self, site: &SiteConfig) -> io::Result<PathBuf> {
        let argv = self.argv(site);
        let Some((program, args)) = argv.split_first() else {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty build command"));
        };

        logger::log_info(&format!(
            "Generating site: {} -> {}",
            site.source.display(),
            site.destination.display()
        ));

        let status = Command::new(program).args(args).status()?;
        if !status.success() {
            return Err(io::Error::other(format!("build command `{}` failed: {status}", self.command)));
        }
        Ok(site.destination.clone())
    }
}

/// Build the site unless told not to, and return the root to serve
///
/// Without a configured command the destination is served as it is.
pub fn prepare_site(site: &SiteConfig) -> io::Result<PathBuf> {
    if site.skip_build {
        logger::log_warning(SKIP_BUILD_WARNING);
        return Ok(site.destination.clone());
    }

    match &site.build_command {
        Some(command) => CommandBuilder::new(command.as_str()).build(site),
        None => {
            warn_if_missing(&site.destination);
            Ok(site.destination.clone())
        }
    }
}

fn warn_if_missing(destination: &Path) {
    if !destination.is_dir() {
        logger::log_warning(&format!(
            "Site directory '{}' does not exist yet; every request will be 404",
            destination.display()
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(command: Option<&str>, skip_build: bool) -> SiteConfig {
        SiteConfig {
            source: PathBuf::from("src dir"),
            destination: PathBuf::from("/tmp/out"),
            build_command: command.map(String::from),
            skip_build,
        }
    }

    #[test]
    fn test_argv_substitutes_placeholders() {
        let builder = CommandBuilder::new("jekyll build -s {source} -d {destination}");
        assert_eq!(
            builder.argv(&site(None, false)),
            vec!["jekyll", "build", "-s", "src dir", "-d", "/tmp/out"]
        );
    }

    #[test]
    fn test_skip_build_serves_destination() {
        let cfg = site(Some("false"), true);
        assert_eq!(prepare_site(&cfg).expect("skipped"), PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_no_command_serves_destination() {
        let cfg = site(None, false);
        assert_eq!(prepare_site(&cfg).expect("nothing to run"), PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_empty_command_is_rejected() {
        let err = CommandBuilder::new("   ").build(&site(None, false)).expect_err("empty");
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[cfg(unix)]
    #[test]
    fn test_command_populates_destination() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let mut cfg = site(Some("mkdir -p {destination}"), false);
        cfg.destination = dir.path().join("_site");

        let root = prepare_site(&cfg).expect("build succeeds");
        assert_eq!(root, cfg.destination);
        assert!(root.is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_command_is_an_error() {
        assert!(prepare_site(&site(Some("false"), false)).is_err());
    }
}
