// tests/workflow_test.rs
#![cfg(unix)]

use bumpr::config::{ChangelogConfig, Config};
use bumpr::error::{
    CommandError, EXIT_DIRTY_REPO, EXIT_HOOK_FAILURE, EXIT_PARTIAL_SUCCESS, EXIT_TEST_FAILURE,
    EXIT_VCS_FAILURE,
};
use bumpr::hooks::{ChangelogHook, FnHook, HookPoint, HookRegistry, Mode};
use bumpr::process::CommandRunner;
use bumpr::vcs::{MockVcs, VcsCall};
use bumpr::warning::ReleaseWarning;
use bumpr::workflow::{Context, Phase, ReleaseReport, Workflow};
use bumpr::{BumprError, Result};
use chrono::{Local, TimeZone};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::TempDir;

const SETUP_PY: &str = "from setuptools import setup\n\nversion = \"1.0.0\"\n\nsetup(name=\"pkg\", version=version)\n";

fn project(setup: &str) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("setup.py"), setup).unwrap();
    dir
}

fn config() -> Config {
    Config {
        file: Some(PathBuf::from("setup.py")),
        ..Config::default()
    }
}

fn run_with(
    dir: &Path,
    config: Config,
    vcs: &MockVcs,
    hooks: HookRegistry,
    dry_run: bool,
) -> Result<ReleaseReport> {
    let runner = CommandRunner::new(dry_run, config.timeout_duration());
    let mut ctx = Context::new(config, dir.to_path_buf(), Box::new(vcs.clone()), runner)
        .with_date(Local.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap());
    Workflow::new(hooks).run(&mut ctx)
}

fn run(dir: &Path, config: Config, vcs: &MockVcs) -> Result<ReleaseReport> {
    run_with(dir, config, vcs, HookRegistry::new(), false)
}

fn read(dir: &Path, name: &str) -> String {
    fs::read_to_string(dir.join(name)).unwrap()
}

#[test]
fn test_default_release_commits_and_tags_patch_bump() {
    let dir = project(SETUP_PY);
    let vcs = MockVcs::new();

    let report = run(dir.path(), Config { bump_only: true, ..config() }, &vcs).unwrap();

    assert!(read(dir.path(), "setup.py").contains("version = \"1.0.1\"\n"));
    assert_eq!(vcs.commits(), vec!["Bump version 1.0.1".to_string()]);
    assert_eq!(vcs.tags(), vec!["1.0.1".to_string()]);
    assert_eq!(report.exit_code(), 0);
    assert!(report.skipped.contains(&Phase::Prepare));
}

#[test]
fn test_full_cycle_prepares_next_development_version() {
    let dir = project(SETUP_PY);
    let vcs = MockVcs::new();

    let report = run(dir.path(), config(), &vcs).unwrap();

    assert_eq!(report.released.unwrap().to_string(), "1.0.1");
    assert_eq!(report.next.unwrap().to_string(), "1.0.2dev");
    assert!(read(dir.path(), "setup.py").contains("version = \"1.0.2dev\"\n"));
    assert_eq!(
        vcs.commits(),
        vec![
            "Bump version 1.0.1".to_string(),
            "Prepare version 1.0.2dev for next release".to_string(),
        ]
    );
    assert_eq!(vcs.tags(), vec!["1.0.1".to_string()]);
}

#[test]
fn test_major_bump_with_suffix() {
    let dir = project("__version__ = '1.4.2'\n");
    let vcs = MockVcs::new();
    let mut config = Config {
        bump_only: true,
        ..config()
    };
    config.bump.part = Some(bumpr::domain::VersionPart::Major);
    config.bump.suffix = Some("rc4".to_string());

    let report = run(dir.path(), config, &vcs).unwrap();

    assert_eq!(read(dir.path(), "setup.py"), "__version__ = '2.0.0rc4'\n");
    assert_eq!(report.tag.as_deref(), Some("2.0.0rc4"));
}

#[test]
fn test_dirty_repository_aborts_before_any_change() {
    let dir = project(SETUP_PY);
    let vcs = MockVcs::new().dirty();

    let err = run(dir.path(), config(), &vcs).unwrap_err();

    assert!(matches!(err, BumprError::DirtyRepo));
    assert_eq!(err.exit_code(), EXIT_DIRTY_REPO);
    assert_eq!(vcs.calls(), vec![VcsCall::IsClean]);
    assert_eq!(read(dir.path(), "setup.py"), SETUP_PY);
}

#[test]
fn test_failing_tests_leave_files_untouched() {
    let dir = project(SETUP_PY);
    let vcs = MockVcs::new();
    let config = Config {
        tests: Some("echo running\nexit 1".to_string()),
        ..config()
    };

    let err = run(dir.path(), config, &vcs).unwrap_err();

    assert!(matches!(err, BumprError::TestFailure(_)));
    assert_eq!(err.exit_code(), EXIT_TEST_FAILURE);
    assert_eq!(read(dir.path(), "setup.py"), SETUP_PY);
    assert!(vcs.calls().iter().all(|call| !call.is_mutation()));
}

#[test]
fn test_failing_publish_is_partial_success() {
    let dir = project(SETUP_PY);
    let vcs = MockVcs::new();
    let config = Config {
        publish: Some("exit 1".to_string()),
        ..config()
    };

    let report = run(dir.path(), config, &vcs).unwrap();

    assert!(report.is_partial());
    assert_eq!(report.exit_code(), EXIT_PARTIAL_SUCCESS);
    let failure = report.failure.as_ref().unwrap();
    assert_eq!(failure.phase, Phase::Publish);
    assert!(matches!(failure.error, BumprError::PublishFailure(_)));
    assert_eq!(vcs.tags(), vec!["1.0.1".to_string()]);
    // The next version is still prepared by default.
    assert_eq!(vcs.commits().len(), 2);
    assert!(read(dir.path(), "setup.py").contains("1.0.2dev"));
}

#[test]
fn test_publish_failure_can_skip_prepare() {
    let dir = project(SETUP_PY);
    let vcs = MockVcs::new();
    let config = Config {
        publish: Some("exit 1".to_string()),
        prepare_on_publish_failure: false,
        ..config()
    };

    let report = run(dir.path(), config, &vcs).unwrap();

    assert_eq!(report.exit_code(), EXIT_PARTIAL_SUCCESS);
    assert_eq!(vcs.commits(), vec!["Bump version 1.0.1".to_string()]);
    assert!(report.skipped.contains(&Phase::Prepare));
    assert!(report.skipped.contains(&Phase::CommitPrepare));
    assert!(report.phases.contains(&Phase::Done));
    assert!(read(dir.path(), "setup.py").contains("version = \"1.0.1\""));
    assert!(report
        .warnings
        .iter()
        .any(|w| matches!(w, ReleaseWarning::PhasesSkipped { .. })));
}

#[test]
fn test_unreadable_extra_file_restores_main_file() {
    let readme = b"Install pkg 1.0.0\r\nwith \xff bytes kept\r\n".to_vec();
    let dir = project(SETUP_PY);
    fs::write(dir.path().join("README.txt"), &readme).unwrap();
    let vcs = MockVcs::new();
    let config = Config {
        files: vec![PathBuf::from("README.txt")],
        ..config()
    };

    let err = run(dir.path(), config, &vcs).unwrap_err();

    // README is not valid UTF-8, so the run stops while substituting it.
    assert!(matches!(err, BumprError::File { .. }));
    assert!(vcs.commits().is_empty());
    assert_eq!(read(dir.path(), "setup.py"), SETUP_PY);
    assert_eq!(fs::read(dir.path().join("README.txt")).unwrap(), readme);
}

#[test]
fn test_commit_failure_rolls_back_all_files() {
    let readme = "Install pkg 1.0.0\r\nthen run it\r\n";
    let dir = project(SETUP_PY);
    fs::write(dir.path().join("README.txt"), readme).unwrap();
    let vcs = MockVcs::new().failing_on("commit");
    let config = Config {
        files: vec![PathBuf::from("README.txt")],
        ..config()
    };

    let err = run(dir.path(), config, &vcs).unwrap_err();

    assert_eq!(err.exit_code(), EXIT_VCS_FAILURE);
    assert_eq!(read(dir.path(), "setup.py"), SETUP_PY);
    assert_eq!(read(dir.path(), "README.txt"), readme);
    assert!(vcs.tags().is_empty());
}

#[test]
fn test_hook_failure_before_commit_rolls_back() {
    let dir = project(SETUP_PY);
    let vcs = MockVcs::new();
    let rolled_back = Rc::new(RefCell::new(false));
    let mut hooks = HookRegistry::new();
    hooks.register(
        HookPoint::Before(Phase::CommitTag),
        FnHook::new("gate", |_ctx: &mut Context| {
            Err(BumprError::config("release gate closed"))
        }),
    );
    let flag = Rc::clone(&rolled_back);
    hooks.register(
        HookPoint::Rollback,
        FnHook::new("record", move |_ctx: &mut Context| {
            *flag.borrow_mut() = true;
            Ok(())
        }),
    );

    let err = run_with(dir.path(), config(), &vcs, hooks, false).unwrap_err();

    assert_eq!(err.exit_code(), EXIT_HOOK_FAILURE);
    assert!(*rolled_back.borrow());
    assert_eq!(read(dir.path(), "setup.py"), SETUP_PY);
    assert!(vcs.commits().is_empty());
}

#[test]
fn test_hooks_see_the_bumped_version() {
    let dir = project(SETUP_PY);
    let vcs = MockVcs::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut hooks = HookRegistry::new();
    for point in [
        HookPoint::Before(Phase::Bump),
        HookPoint::After(Phase::Bump),
        HookPoint::After(Phase::Prepare),
    ] {
        let seen = Rc::clone(&seen);
        hooks.register(
            point,
            FnHook::new("spy", move |ctx: &mut Context| {
                seen.borrow_mut()
                    .push(ctx.version().map(|v| v.to_string()).unwrap_or_default());
                Ok(())
            }),
        );
    }

    run_with(dir.path(), config(), &vcs, hooks, false).unwrap();

    assert_eq!(*seen.borrow(), vec!["1.0.0", "1.0.1", "1.0.2dev"]);
}

#[test]
fn test_dry_run_changes_nothing() {
    let dir = project(SETUP_PY);
    let vcs = MockVcs::new();
    let config = Config {
        tests: Some("touch tested".to_string()),
        push: true,
        ..config()
    };

    let report = run_with(dir.path(), config, &vcs, HookRegistry::new(), true).unwrap();

    assert!(report.dry_run);
    assert_eq!(report.released.unwrap().to_string(), "1.0.1");
    assert_eq!(report.next.unwrap().to_string(), "1.0.2dev");
    assert_eq!(read(dir.path(), "setup.py"), SETUP_PY);
    assert!(!dir.path().join("tested").exists());
    assert!(vcs.calls().iter().all(|call| !call.is_mutation()));
}

#[test]
fn test_changelog_is_released_and_reopened() {
    let dir = project(SETUP_PY);
    fs::write(
        dir.path().join("CHANGELOG.rst"),
        "Changelog\n=========\n\nCurrent\n-------\n\n- Fix packaging\n",
    )
    .unwrap();
    let vcs = MockVcs::new();
    let settings = ChangelogConfig {
        file: PathBuf::from("CHANGELOG.rst"),
        separator: "-".to_string(),
        bump: "{version} ({date:%Y-%m-%d})".to_string(),
        prepare: "Current".to_string(),
        empty: "Nothing yet".to_string(),
    };
    let mut hooks = HookRegistry::new();
    hooks.register(
        HookPoint::After(Phase::Bump),
        ChangelogHook::new(settings.clone(), Mode::Bump),
    );
    hooks.register(
        HookPoint::After(Phase::Prepare),
        ChangelogHook::new(settings, Mode::Prepare),
    );

    run_with(dir.path(), config(), &vcs, hooks, false).unwrap();

    assert_eq!(
        read(dir.path(), "CHANGELOG.rst"),
        "Changelog\n=========\n\nCurrent\n-------\n\n- Nothing yet\n\n1.0.1 (2024-03-09)\n------------------\n\n- Fix packaging\n"
    );
    assert!(vcs.calls().contains(&VcsCall::Stage(vec![
        PathBuf::from("setup.py"),
        PathBuf::from("CHANGELOG.rst"),
    ])));
}

#[test]
fn test_timeout_fails_the_phase() {
    let dir = project(SETUP_PY);
    let vcs = MockVcs::new();
    let config = Config {
        tests: Some("sleep 30".to_string()),
        timeout: Some(1),
        ..config()
    };

    let err = run(dir.path(), config, &vcs).unwrap_err();

    assert!(matches!(
        err,
        BumprError::TestFailure(CommandError::Timeout { seconds: 1, .. })
    ));
    assert_eq!(read(dir.path(), "setup.py"), SETUP_PY);
}

#[test]
fn test_missing_version_in_extra_file_warns() {
    let dir = project(SETUP_PY);
    fs::write(dir.path().join("README.txt"), "No version here\n").unwrap();
    let vcs = MockVcs::new();
    let config = Config {
        files: vec![PathBuf::from("README.txt")],
        bump_only: true,
        ..config()
    };

    let report = run(dir.path(), config, &vcs).unwrap();

    assert!(report.warnings.contains(&ReleaseWarning::VersionNotFound {
        path: PathBuf::from("README.txt"),
        version: "1.0.0".to_string(),
    }));
    assert_eq!(read(dir.path(), "README.txt"), "No version here\n");
}

#[test]
fn test_prepare_only_skips_release() {
    let dir = project(SETUP_PY);
    let vcs = MockVcs::new();
    let config = Config {
        prepare_only: true,
        ..config()
    };

    let report = run(dir.path(), config, &vcs).unwrap();

    assert!(report.released.is_none());
    assert_eq!(
        vcs.commits(),
        vec!["Prepare version 1.0.1dev for next release".to_string()]
    );
    assert!(vcs.tags().is_empty());
}

#[test]
fn test_prepare_only_commit_failure_restores_files() {
    let dir = project(SETUP_PY);
    let vcs = MockVcs::new().failing_on("commit");
    let config = Config {
        prepare_only: true,
        ..config()
    };

    let err = run(dir.path(), config, &vcs).unwrap_err();

    assert!(matches!(err, BumprError::Vcs { .. }));
    assert_eq!(err.exit_code(), EXIT_VCS_FAILURE);
    assert_eq!(read(dir.path(), "setup.py"), SETUP_PY);
}

#[test]
fn test_release_without_increment_drops_suffix() {
    let dir = project("version = \"1.0.2dev\"\n");
    let vcs = MockVcs::new();
    let mut config = config();
    config.bump.part = None;

    let report = run(dir.path(), config, &vcs).unwrap();

    assert_eq!(report.released.unwrap().to_string(), "1.0.2");
    assert_eq!(vcs.tags(), vec!["1.0.2".to_string()]);
    assert_eq!(report.next.unwrap().to_string(), "1.0.3dev");
    assert_eq!(read(dir.path(), "setup.py"), "version = \"1.0.3dev\"\n");
}

#[test]
fn test_extra_files_keep_other_versions() {
    let dir = project(SETUP_PY);
    fs::write(
        dir.path().join("README.txt"),
        "pkg 1.0.0 needs libfoo >= 11.0.0\n",
    )
    .unwrap();
    let vcs = MockVcs::new();
    let config = Config {
        files: vec![PathBuf::from("README.txt")],
        bump_only: true,
        ..config()
    };

    run(dir.path(), config, &vcs).unwrap();

    assert_eq!(
        read(dir.path(), "README.txt"),
        "pkg 1.0.1 needs libfoo >= 11.0.0\n"
    );
}

#[test]
fn test_push_failure_is_partial_success() {
    let dir = project(SETUP_PY);
    let vcs = MockVcs::new().failing_on("push");
    let config = Config {
        push: true,
        ..config()
    };

    let report = run(dir.path(), config, &vcs).unwrap();

    assert_eq!(report.failure.as_ref().map(|f| f.phase), Some(Phase::Push));
    assert_eq!(vcs.commits().len(), 2);
    assert!(vcs.calls().contains(&VcsCall::Push));
}

#[test]
fn test_artifacts_are_removed_after_publish() {
    let dir = project(SETUP_PY);
    let vcs = MockVcs::new();
    let config = Config {
        publish: Some("mkdir -p dist\ntouch dist/pkg-1.0.1.tar.gz".to_string()),
        ..config()
    };
    let mut hooks = HookRegistry::new();
    hooks.register(
        HookPoint::Before(Phase::Publish),
        FnHook::new("dist", |ctx: &mut Context| {
            ctx.track_artifact("dist");
            Ok(())
        }),
    );

    run_with(dir.path(), config, &vcs, hooks, false).unwrap();

    assert!(!dir.path().join("dist").exists());
}
