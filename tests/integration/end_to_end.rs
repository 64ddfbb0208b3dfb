//! End-to-end tests exercising the real `git` binary against fixture
//! repositories in temporary directories: install flow, diagnosis
//! transitions, remote consistency and exclude generation.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use gitplugins::collection::Collection;
use gitplugins::config::GitpConfig;
use gitplugins::display::Echo;
use gitplugins::plugin::{Diagnosis, PluginRecord, RETURN_OK};

/// Run git in `cwd`, panicking on failure; fixture setup only.
fn git(args: &[&str], cwd: &Path) {
    let status = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .env("LC_ALL", "C")
        .status()
        .expect("failed to spawn git");
    assert!(status.success(), "git {:?} failed in {}", args, cwd.display());
}

/// Create a local origin repository with one commit, usable as a clone URL.
fn make_origin(base: &Path) -> PathBuf {
    let origin = base.join("origin-demo");
    fs::create_dir(&origin).unwrap();
    git(&["init", "-b", "main"], &origin);
    git(&["config", "user.name", "Fixture"], &origin);
    git(&["config", "user.email", "fixture@example.com"], &origin);
    fs::write(origin.join("version.txt"), "1.0\n").unwrap();
    git(&["add", "version.txt"], &origin);
    git(&["commit", "-m", "initial"], &origin);
    origin
}

fn demo_config(repository: &str) -> GitpConfig {
    let content = format!(
        r#"
[settings]
verbosity = 0

[plugins."demo/plugin"]
path = "/demo"
gitrepository = "{}"
"#,
        repository
    );
    GitpConfig::parse(&content).unwrap()
}

#[test]
fn install_then_diagnose_ok() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("approot");
    fs::create_dir(&root).unwrap();
    let origin = make_origin(tmp.path());

    let config = demo_config(&origin.to_string_lossy());
    let mut plugins = Collection::new(root.clone(), config, true);
    plugins.set_diagnostic().unwrap();
    assert_eq!(
        plugins.plugins()[0].diagnosis,
        Some(Diagnosis::NotExist)
    );

    let code = plugins.install("demo/plugin").unwrap();
    assert_eq!(code, RETURN_OK);
    assert!(root.join("demo/.git").is_dir());
    assert!(root.join("demo/version.txt").exists());

    // a fresh diagnosis now observes a healthy checkout
    plugins.set_diagnostic().unwrap();
    assert_eq!(plugins.plugins()[0].diagnosis, Some(Diagnosis::Ok));
}

#[test]
fn install_all_continues_after_precondition_violation() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("approot");
    fs::create_dir(&root).unwrap();
    let origin = make_origin(tmp.path());

    // first plugin already present (not installable), second absent
    fs::create_dir(root.join("present")).unwrap();
    let content = format!(
        r#"
[plugins."demo/present"]
path = "/present"
gitrepository = "{origin}"

[plugins."demo/plugin"]
path = "/demo"
gitrepository = "{origin}"
"#,
        origin = origin.to_string_lossy()
    );
    let mut plugins = Collection::new(root.clone(), GitpConfig::parse(&content).unwrap(), true);
    plugins.set_diagnostic().unwrap();

    // bulk result reports the failure but the second plugin is installed
    let code = plugins.install_all().unwrap();
    assert_ne!(code, RETURN_OK);
    assert!(root.join("demo/.git").is_dir());
}

#[test]
fn inconsistent_remote_is_diagnosed_with_both_urls() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("approot");
    fs::create_dir(&root).unwrap();
    let origin = make_origin(tmp.path());

    // clone from the real origin, but declare a different repository
    let config = demo_config("https://example.com/other.git");
    let mut plugins = Collection::new(root.clone(), config, true);
    let origin_url = origin.to_string_lossy().to_string();
    let target = root.join("demo").to_string_lossy().to_string();
    git(&["clone", &origin_url, &target], &root);

    plugins.set_diagnostic().unwrap();
    let plugin = &plugins.plugins()[0];
    assert_eq!(plugin.diagnosis, Some(Diagnosis::InconsistentRemote));
    assert!(plugin.diag_detail.contains("https://example.com/other.git"));
    assert!(plugin
        .diag_detail
        .contains(&*origin.to_string_lossy()));

    // status-all classifies the plugin under errors
    let code = plugins.status_all().unwrap();
    assert_ne!(code, RETURN_OK);
}

#[test]
fn trailing_git_suffix_does_not_break_remote_comparison() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("approot");
    fs::create_dir(&root).unwrap();
    let origin = make_origin(tmp.path());

    // declared with a trailing .git the local remote does not carry
    let declared = format!("{}.git", origin.to_string_lossy());
    let config = demo_config(&declared);
    let mut plugins = Collection::new(root.clone(), config, true);
    let origin_url = origin.to_string_lossy().to_string();
    let target = root.join("demo").to_string_lossy().to_string();
    git(&["clone", &origin_url, &target], &root);

    plugins.set_diagnostic().unwrap();
    assert_eq!(plugins.plugins()[0].diagnosis, Some(Diagnosis::Ok));
}

#[test]
fn upgrade_pulls_new_commits() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("approot");
    fs::create_dir(&root).unwrap();
    let origin = make_origin(tmp.path());

    let config = demo_config(&origin.to_string_lossy());
    let mut plugins = Collection::new(root.clone(), config, true);
    plugins.set_diagnostic().unwrap();
    assert_eq!(plugins.install("demo/plugin").unwrap(), RETURN_OK);

    // new commit upstream
    fs::write(origin.join("version.txt"), "2.0\n").unwrap();
    git(&["commit", "-am", "bump"], &origin);

    plugins.set_diagnostic().unwrap();
    assert_eq!(plugins.upgrade("demo/plugin").unwrap(), RETURN_OK);
    assert_eq!(
        fs::read_to_string(root.join("demo/version.txt")).unwrap(),
        "2.0\n"
    );
}

#[test]
fn upgrade_checks_out_declared_revision() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("approot");
    fs::create_dir(&root).unwrap();
    let origin = make_origin(tmp.path());
    git(&["tag", "v1.0"], &origin);
    fs::write(origin.join("version.txt"), "2.0\n").unwrap();
    git(&["commit", "-am", "bump"], &origin);

    let content = format!(
        r#"
[plugins."demo/plugin"]
path = "/demo"
gitrepository = "{}"
gitrevision = "v1.0"
"#,
        origin.to_string_lossy()
    );
    let mut plugins = Collection::new(root.clone(), GitpConfig::parse(&content).unwrap(), true);
    plugins.set_diagnostic().unwrap();
    assert_eq!(plugins.install("demo/plugin").unwrap(), RETURN_OK);

    plugins.set_diagnostic().unwrap();
    plugins.upgrade("demo/plugin").unwrap();
    assert_eq!(
        fs::read_to_string(root.join("demo/version.txt")).unwrap(),
        "1.0\n"
    );
}

#[test]
fn status_tallies_local_modifications() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("approot");
    fs::create_dir(&root).unwrap();
    let origin = make_origin(tmp.path());

    let config = demo_config(&origin.to_string_lossy());
    let mut plugins = Collection::new(root.clone(), config, true);
    plugins.set_diagnostic().unwrap();
    plugins.install("demo/plugin").unwrap();
    plugins.set_diagnostic().unwrap();

    // one modified tracked file, one untracked file
    fs::write(root.join("demo/version.txt"), "dirty\n").unwrap();
    fs::write(root.join("demo/new.txt"), "x\n").unwrap();

    let echo = Echo::new(0, None);
    let (code, tally) = plugins.plugins()[0].status(&echo).unwrap();
    assert_eq!(code, RETURN_OK);
    assert_eq!(tally.get(" M"), Some(&1));
    assert_eq!(tally.get("??"), Some(&1));
}

#[test]
fn gen_exclude_lists_only_ok_plugins() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("approot");
    fs::create_dir(&root).unwrap();
    let origin = make_origin(tmp.path());

    let content = format!(
        r#"
[plugins."demo/plugin"]
path = "/demo"
gitrepository = "{}"

[plugins."demo/absent"]
path = "/absent"
gitrepository = "https://example.com/absent.git"
"#,
        origin.to_string_lossy()
    );
    let mut plugins = Collection::new(root.clone(), GitpConfig::parse(&content).unwrap(), true);
    plugins.set_diagnostic().unwrap();
    plugins.install("demo/plugin").unwrap();
    plugins.set_diagnostic().unwrap();

    let block = plugins.generate_exclude();
    assert!(block.starts_with("## gitplugins BEGIN autogenerated exclude\n"));
    assert!(block.ends_with("## gitplugins END\n"));
    assert!(block.contains(".gitplugins.toml"));
    assert!(block.contains(".gitplugins.log"));
    assert!(block.contains("\n/demo\n"));
    assert!(!block.contains("/absent"));
}

#[test]
fn detail_reports_checkout_information() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("approot");
    fs::create_dir(&root).unwrap();
    let origin = make_origin(tmp.path());

    let config = demo_config(&origin.to_string_lossy());
    let mut plugins = Collection::new(root.clone(), config, true);
    plugins.set_diagnostic().unwrap();
    plugins.install("demo/plugin").unwrap();
    plugins.set_diagnostic().unwrap();

    assert_eq!(plugins.detail("demo/plugin").unwrap(), RETURN_OK);
    assert!(plugins.detail("demo/unknown").is_err());
}

#[test]
fn operation_log_records_install() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("approot");
    fs::create_dir(&root).unwrap();
    let origin = make_origin(tmp.path());

    let content = format!(
        r#"
[settings]
log = true

[plugins."demo/plugin"]
path = "/demo"
gitrepository = "{}"
"#,
        origin.to_string_lossy()
    );
    let mut plugins = Collection::new(root.clone(), GitpConfig::parse(&content).unwrap(), true);
    plugins.set_diagnostic().unwrap();
    plugins.install("demo/plugin").unwrap();

    let log = fs::read_to_string(root.join(".gitplugins.log")).unwrap();
    assert!(log.contains("demo/plugin"));
    assert!(log.contains("  < git clone"));
}

#[test]
fn check_config_reaches_local_repository() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("approot");
    fs::create_dir(&root).unwrap();
    let origin = make_origin(tmp.path());

    // reachable local repository, but the URL shape is not http/scp
    let mut record = PluginRecord::new(
        "demo/plugin",
        gitplugins::config::PluginConfig {
            path: "/demo".to_string(),
            gitrepository: origin.to_string_lossy().to_string(),
            gitbranch: Some("main".to_string()),
            gitrevision: None,
        },
        &root,
    );
    record.set_diagnostic().unwrap();

    let alerts = record.check_config().unwrap();
    assert!(alerts.iter().any(|a| a.starts_with("Invalid URL")));
    assert!(!alerts.iter().any(|a| a.contains("unreachable")));
    assert!(!alerts.iter().any(|a| a.contains("AT MOST")));
}
