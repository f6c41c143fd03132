use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use bumpr::cli::{run_release, ReleaseArgs};
use bumpr::domain::VersionPart;
use bumpr::{logging, ui};

#[derive(clap::Parser)]
#[command(
    name = "bumpr",
    version,
    about = "Bump the version, commit, tag, publish and prepare the next development cycle"
)]
struct Args {
    /// Version file (overrides `file` from the configuration)
    file: Option<PathBuf>,

    #[arg(short = 'M', long, conflicts_with_all = ["minor", "patch"], help = "Bump the major version")]
    major: bool,

    #[arg(short = 'm', long, conflicts_with = "patch", help = "Bump the minor version")]
    minor: bool,

    #[arg(short = 'p', long, help = "Bump the patch version")]
    patch: bool,

    #[arg(
        short = 'N',
        long,
        conflicts_with_all = ["major", "minor", "patch"],
        help = "Release the current version numbers, only dropping or setting the suffix"
    )]
    no_increment: bool,

    #[arg(short = 's', long, help = "Set the release suffix (e.g. rc1)")]
    suffix: Option<String>,

    #[arg(short = 'u', long, help = "Drop the development suffix from the release")]
    unsuffix: bool,

    #[arg(long, conflicts_with = "unsuffix", help = "Keep the current suffix on the release")]
    keep_suffix: bool,

    #[arg(long, conflicts_with_all = ["prepare_minor", "prepare_patch"], help = "Prepare the next major version")]
    prepare_major: bool,

    #[arg(long, conflicts_with = "prepare_patch", help = "Prepare the next minor version")]
    prepare_minor: bool,

    #[arg(long, help = "Prepare the next patch version")]
    prepare_patch: bool,

    #[arg(
        long,
        visible_alias = "ps",
        value_name = "SUFFIX",
        help = "Development suffix of the next version (empty to disable)"
    )]
    prepare_suffix: Option<String>,

    #[arg(short = 'c', long, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[arg(short = 'd', long, help = "Preview what would happen without making changes")]
    dry_run: bool,

    #[arg(short = 'v', long, help = "Show debug logs")]
    verbose: bool,

    #[arg(long, help = "Do not commit (implies no tag)")]
    no_commit: bool,

    #[arg(long, help = "Do not tag the release")]
    no_tag: bool,

    #[arg(long, conflicts_with = "no_push", help = "Push commits and tags")]
    push: bool,

    #[arg(long, help = "Do not push")]
    no_push: bool,

    #[arg(long, help = "Do not run the test command")]
    skip_tests: bool,

    #[arg(short = 'b', long, conflicts_with = "prepare_only", help = "Only bump, commit and tag the release")]
    bump_only: bool,

    #[arg(long, help = "Only prepare the next development version")]
    prepare_only: bool,

    #[arg(long, value_name = "NAME", help = "Version control backend: git, hg, bzr or none")]
    vcs: Option<String>,
}

impl Args {
    fn part(&self) -> Option<VersionPart> {
        select_part(self.major, self.minor, self.patch)
    }

    fn prepare_part(&self) -> Option<VersionPart> {
        select_part(self.prepare_major, self.prepare_minor, self.prepare_patch)
    }

    fn into_release_args(self) -> ReleaseArgs {
        ReleaseArgs {
            part: self.part(),
            no_increment: self.no_increment,
            prepare_part: self.prepare_part(),
            unsuffix: flag_pair(self.unsuffix, self.keep_suffix),
            commit: self.no_commit.then_some(false),
            tag: self.no_tag.then_some(false),
            push: flag_pair(self.push, self.no_push),
            config_path: self.config,
            file: self.file,
            root: None,
            suffix: self.suffix,
            prepare_suffix: self.prepare_suffix,
            vcs: self.vcs,
            dry_run: self.dry_run,
            verbose: self.verbose,
            skip_tests: self.skip_tests,
            bump_only: self.bump_only,
            prepare_only: self.prepare_only,
        }
    }
}

fn select_part(major: bool, minor: bool, patch: bool) -> Option<VersionPart> {
    if major {
        Some(VersionPart::Major)
    } else if minor {
        Some(VersionPart::Minor)
    } else if patch {
        Some(VersionPart::Patch)
    } else {
        None
    }
}

/// `--x` / `--no-x` pair to an optional override
fn flag_pair(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_tracing(args.verbose)?;

    let release_args = args.into_release_args();
    let code = match run_release(&release_args) {
        Ok(report) => {
            ui::display_report(&report);
            report.exit_code()
        }
        Err(e) => {
            ui::display_failure(&e);
            e.exit_code()
        }
    };

    std::process::exit(code);
}
