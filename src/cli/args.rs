//! Command-line interface definitions.
//!
//! Feature toggles are short tokens such as `+JP` or `-CP`. Clap would read
//! `-CP` as a cluster of short flags, so toggles are taken out of argv
//! before clap sees it (see [`Cli::parse_env`]).

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{ColorChoice, Parser};

/// Static site build pipeline: includes, asset minification, bundles.
#[derive(Parser, Debug, Clone)]
#[command(
    version,
    about,
    long_about = None,
    arg_required_else_help = true,
    after_help = TOGGLE_HELP
)]
pub struct Cli {
    /// Source folder
    #[arg(value_name = "PATH", value_hint = clap::ValueHint::DirPath)]
    pub path: PathBuf,

    /// Build into FOLDER and exit (with --serve: build there and serve it)
    #[arg(long, value_name = "FOLDER", num_args = 0..=1, value_hint = clap::ValueHint::DirPath)]
    pub build: Option<Option<PathBuf>>,

    /// Serve the output over HTTP and rebuild when PATH changes
    #[arg(long, visible_alias = "server")]
    pub serve: bool,

    /// Port to listen on (0 picks a free one)
    #[arg(long)]
    pub port: Option<u16>,

    /// Filename of per-folder JS bundles
    #[arg(long, value_name = "NAME")]
    pub concatjsfilename: Option<String>,

    /// Filename of per-folder CSS bundles
    #[arg(long, value_name = "NAME")]
    pub concatcssfilename: Option<String>,

    /// Replace an existing build folder without asking
    #[arg(long = "y")]
    pub yes: bool,

    /// Config file (searched upward from the current directory)
    #[arg(long, default_value = "htmlforge.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Log every file the pipeline touches
    #[arg(short, long)]
    pub verbose: bool,

    /// Control colored output (auto, always, never)
    #[arg(long, default_value = "auto")]
    pub color: ColorChoice,

    /// Toggle tokens pulled out of argv before parsing.
    #[arg(skip)]
    pub toggles: Toggles,
}

const TOGGLE_HELP: &str = "\
Toggles (prefix + to enable, - to disable, letters combine, e.g. +JP -C):
  H  minify HTML            (default on)
  U  minify JS              (default on)
  C  minify CSS             (default on)
  J  concatenate JS         (default off)
  P  concatenate CSS        (default off)
  I  expand <include> tags  (default on)";

impl Cli {
    /// Parse `std::env::args_os`, toggles included.
    pub fn parse_env() -> Self {
        Self::parse_from_args(std::env::args_os())
    }

    /// Parse an argv (program name first), toggles included.
    pub fn parse_from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = OsString>,
    {
        let (rest, toggles) = extract_toggles(args);
        let mut cli = Self::parse_from(rest);
        cli.toggles = toggles;
        cli
    }

    /// `--build FOLDER`, `--build` without a folder yields `Some(None)`.
    pub fn build_folder(&self) -> Option<Option<&PathBuf>> {
        self.build.as_ref().map(Option::as_ref)
    }

    pub const fn is_serve(&self) -> bool {
        self.serve
    }
}

// ============================================================================
// Toggles
// ============================================================================

/// Feature switches set on the command line. `None` keeps the configured value.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Toggles {
    pub minify_html: Option<bool>,
    pub minify_js: Option<bool>,
    pub minify_css: Option<bool>,
    pub concat_js: Option<bool>,
    pub concat_css: Option<bool>,
    pub parse_includes: Option<bool>,
}

impl Toggles {
    /// Apply one token like `+JP`. Returns false if it is not a toggle token.
    fn apply(&mut self, token: &str) -> bool {
        let mut chars = token.chars();
        let on = match chars.next() {
            Some('+') => true,
            Some('-') => false,
            _ => return false,
        };
        let letters = chars.as_str();
        if letters.is_empty() || !letters.chars().all(|c| "HUCJPI".contains(c)) {
            return false;
        }

        for letter in letters.chars() {
            let slot = match letter {
                'H' => &mut self.minify_html,
                'U' => &mut self.minify_js,
                'C' => &mut self.minify_css,
                'J' => &mut self.concat_js,
                'P' => &mut self.concat_css,
                _ => &mut self.parse_includes,
            };
            *slot = Some(on);
        }
        true
    }
}

/// Split argv into clap arguments and toggle tokens.
///
/// The program name (first item) is never treated as a toggle, and nothing
/// after a `--` separator is either.
fn extract_toggles<I>(args: I) -> (Vec<OsString>, Toggles)
where
    I: IntoIterator<Item = OsString>,
{
    let mut toggles = Toggles::default();
    let mut rest = Vec::new();
    let mut passthrough = false;

    for (i, arg) in args.into_iter().enumerate() {
        if i == 0 || passthrough {
            rest.push(arg);
            continue;
        }
        if arg == "--" {
            passthrough = true;
            rest.push(arg);
            continue;
        }
        let is_toggle = arg.to_str().is_some_and(|s| toggles.apply(s));
        if !is_toggle {
            rest.push(arg);
        }
    }

    (rest, toggles)
}
