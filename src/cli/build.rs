//! `htmlforge PATH --build FOLDER` / `--serve` driver.
//!
//! Works out where the output goes and whether replacing it needs asking,
//! runs the pipeline once, then hands over to the dev server when serving.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tempfile::TempDir;

use super::{Cli, prompt, serve};
use crate::config::ForgeConfig;
use crate::pipeline::{BuildError, BuildReport, BuildRequest, run_build};
use crate::utils::path::expand_path;
use crate::utils::plural::plural_count;
use crate::{debug, log};

/// Prefix of the scratch folder a `--serve` run builds into.
const SCRATCH_PREFIX: &str = "htmlforge_";

/// Where the build output lives.
enum Output {
    Folder(PathBuf),
    /// Removed when dropped, or by the Ctrl+C handler.
    Scratch(TempDir),
}

impl Output {
    fn path(&self) -> &Path {
        match self {
            Self::Folder(path) => path,
            Self::Scratch(dir) => dir.path(),
        }
    }
}

/// What the command line asks for, before any file is touched.
struct Plan {
    origin: PathBuf,
    output: Output,
    serve: bool,
    overwrite: bool,
}

fn plan(cli: &Cli) -> Result<Plan, BuildError> {
    let origin = expand_path(&cli.path);
    if !origin.is_dir() {
        return Err(BuildError::FolderNotFound(origin));
    }

    let output = match (cli.build_folder(), cli.is_serve()) {
        (Some(None), _) => return Err(BuildError::MissingOption("FOLDER")),
        (None, false) => return Err(BuildError::MissingOption("OPTIONS")),
        (Some(Some(folder)), _) => Output::Folder(expand_path(folder)),
        (None, true) => {
            let dir = tempfile::Builder::new()
                .prefix(SCRATCH_PREFIX)
                .tempdir()
                .map_err(|e| BuildError::io("create", std::env::temp_dir(), e))?;
            Output::Scratch(dir)
        }
    };

    // a scratch folder is ours to replace, a named one only with --y
    let overwrite = (cli.yes || cli.is_serve()) && (cli.build.is_none() || cli.yes);

    Ok(Plan {
        origin,
        output,
        serve: cli.is_serve(),
        overwrite,
    })
}

/// Build once, then serve and watch if asked to.
pub fn run(cli: &Cli, config: &ForgeConfig) -> Result<()> {
    let plan = plan(cli)?;
    if let Output::Scratch(dir) = &plan.output {
        crate::core::register_scratch_dir(dir.path());
        debug!("build"; "scratch output {}", dir.path().display());
    }

    let request = BuildRequest::new(
        &plan.origin,
        plan.output.path(),
        config.build_options(plan.overwrite),
    )?;
    log!("build"; "{} -> {}", request.origin.display(), request.target.display());

    let report = run_build(&request, prompt::confirm_overwrite, true)?;
    log_report(&report);

    if plan.serve {
        serve::serve(&request, config)?;
    }

    // the scratch guard lives until the server returns
    drop(plan);
    Ok(())
}

fn log_report(report: &BuildReport) {
    debug!(
        "build";
        "copied {}, expanded {}, processed {}",
        plural_count(report.copied, "file"),
        plural_count(report.includes, "include"),
        plural_count(report.assets, "asset reference")
    );
    log!(
        "build";
        "{}, {}, {} cleaned up in {} ms",
        plural_count(report.documents, "document"),
        plural_count(report.bundles, "bundle"),
        plural_count(report.deleted + report.removed_dirs, "entry"),
        report.elapsed.as_millis()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::fs;

    fn cli(args: &[&str]) -> Cli {
        let argv = std::iter::once("htmlforge").chain(args.iter().copied());
        Cli::parse_from_args(argv.map(OsString::from))
    }

    fn site() -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("site")).unwrap();
        temp
    }

    fn arg(path: &Path) -> &str {
        path.to_str().unwrap()
    }

    #[test]
    fn test_missing_folder() {
        let temp = site();
        let missing = temp.path().join("nope");
        let err = plan(&cli(&[arg(&missing), "--build", "out"])).err().unwrap();
        assert!(matches!(err, BuildError::FolderNotFound(_)));
    }

    #[test]
    fn test_missing_options() {
        let temp = site();
        let origin = temp.path().join("site");

        let err = plan(&cli(&[arg(&origin)])).err().unwrap();
        assert!(matches!(err, BuildError::MissingOption("OPTIONS")));

        let err = plan(&cli(&[arg(&origin), "--build"])).err().unwrap();
        assert!(matches!(err, BuildError::MissingOption("FOLDER")));
    }

    #[test]
    fn test_build_asks_unless_yes() {
        let temp = site();
        let origin = temp.path().join("site");
        let out = temp.path().join("dist");

        let plan_a = plan(&cli(&[arg(&origin), "--build", arg(&out)])).unwrap();
        assert!(!plan_a.overwrite);
        assert!(!plan_a.serve);
        assert_eq!(plan_a.output.path(), out);

        let plan_b = plan(&cli(&[arg(&origin), "--build", arg(&out), "--y"])).unwrap();
        assert!(plan_b.overwrite);
    }

    #[test]
    fn test_serve_without_build_uses_scratch() {
        let temp = site();
        let origin = temp.path().join("site");

        let plan = plan(&cli(&[arg(&origin), "--serve"])).unwrap();
        assert!(plan.serve);
        assert!(plan.overwrite);
        let scratch = plan.output.path().to_path_buf();
        assert!(scratch.is_dir());
        assert!(
            scratch
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(SCRATCH_PREFIX))
        );

        drop(plan);
        assert!(!scratch.exists());
    }

    #[test]
    fn test_serve_with_build_still_asks() {
        let temp = site();
        let origin = temp.path().join("site");
        let out = temp.path().join("dist");

        let plan = plan(&cli(&[arg(&origin), "--serve", "--build", arg(&out)])).unwrap();
        assert!(plan.serve);
        assert!(!plan.overwrite);
        assert!(matches!(plan.output, Output::Folder(_)));
    }
}
