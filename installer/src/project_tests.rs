//! Unit tests for project installation.

use super::*;
use camino::Utf8PathBuf;
use rstest::{fixture, rstest};

struct Workspace {
    _temp: tempfile::TempDir,
    cache: Utf8PathBuf,
    project: Utf8PathBuf,
}

const INDEX_JS: &str = "a(\"__CARDINAL_PROJECT_ID__\");b(\"__CARDINAL_PROJECT_ID__\");";

/// A cached release with two scripts, one stylesheet and a nested directory.
#[fixture]
fn workspace() -> Workspace {
    let temp = tempfile::tempdir().expect("temp dir");
    let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8 path");
    let cache = root.join("cache/editor/v0.1.0");
    fs::create_dir_all(cache.join("assets/fonts")).expect("create cache tree");
    fs::write(cache.join("index.html"), "<script src=assets/index.js>").expect("write html");
    fs::write(cache.join("assets/index.js"), INDEX_JS).expect("write index.js");
    fs::write(cache.join("assets/vendor.js"), "no placeholder here").expect("write vendor.js");
    fs::write(cache.join("assets/style.css"), "/* __CARDINAL_PROJECT_ID__ */").expect("write css");
    fs::write(cache.join("assets/fonts/font.woff"), [0_u8, 1, 2]).expect("write font");

    Workspace {
        _temp: temp,
        project: root.join("project/.editor"),
        cache,
    }
}

fn read(path: &Utf8Path) -> String {
    fs::read_to_string(path).expect("read file")
}

#[rstest]
fn installs_copy_with_fresh_identifier(workspace: Workspace) {
    let outcome = ProjectInstaller::default()
        .install(&workspace.cache, "v0.1.0", &workspace.project)
        .expect("install");

    let InstallOutcome::Installed {
        project_id,
        files_rewritten,
        replacements,
    } = outcome
    else {
        panic!("expected a fresh install, got {outcome:?}");
    };
    assert!(project_id.as_str().starts_with(PROJECT_ID_PREFIX));
    assert_eq!(files_rewritten, 1);
    assert_eq!(replacements, 2);

    let script = read(&workspace.project.join("assets/index.js"));
    assert_eq!(script, INDEX_JS.replace(DEFAULT_PLACEHOLDER, project_id.as_str()));
    assert_eq!(read(&workspace.project.join("assets/vendor.js")), "no placeholder here");
    assert_eq!(
        read(&workspace.project.join("assets/style.css")),
        "/* __CARDINAL_PROJECT_ID__ */"
    );
    assert!(workspace.project.join("assets/fonts/font.woff").is_file());
    assert!(has_marker(&workspace.project, "v0.1.0"));
    assert_eq!(
        fs::metadata(workspace.project.join("v0.1.0"))
            .expect("marker metadata")
            .len(),
        0
    );
}

#[rstest]
fn cache_entry_is_never_modified(workspace: Workspace) {
    ProjectInstaller::default()
        .install(&workspace.cache, "v0.1.0", &workspace.project)
        .expect("install");

    assert!(read(&workspace.cache.join("assets/index.js")).contains(DEFAULT_PLACEHOLDER));
    assert!(!workspace.cache.join("v0.1.0").exists());
}

#[rstest]
fn matching_marker_writes_nothing(workspace: Workspace) {
    let installer = ProjectInstaller::default();
    installer
        .install(&workspace.cache, "v0.1.0", &workspace.project)
        .expect("first install");
    let before = read(&workspace.project.join("assets/index.js"));
    fs::write(workspace.project.join("local-edit.txt"), "keep me").expect("write local edit");

    let outcome = installer
        .install(&workspace.cache, "v0.1.0", &workspace.project)
        .expect("second install");

    assert_eq!(outcome, InstallOutcome::AlreadyCurrent);
    assert_eq!(read(&workspace.project.join("assets/index.js")), before);
    assert!(workspace.project.join("local-edit.txt").is_file());
}

#[rstest]
fn version_mismatch_rebuilds_from_scratch(workspace: Workspace) {
    fs::create_dir_all(&workspace.project).expect("create project dir");
    fs::write(workspace.project.join("v0.0.9"), "").expect("write old marker");
    fs::write(workspace.project.join("stale.js"), "old").expect("write stale file");

    let outcome = ProjectInstaller::default()
        .install(&workspace.cache, "v0.1.0", &workspace.project)
        .expect("install");

    assert!(matches!(outcome, InstallOutcome::Installed { .. }));
    assert!(!workspace.project.join("v0.0.9").exists());
    assert!(!workspace.project.join("stale.js").exists());
    assert!(has_marker(&workspace.project, "v0.1.0"));
}

#[rstest]
fn each_install_gets_a_new_identifier(workspace: Workspace) {
    let installer = ProjectInstaller::default();
    let first = installer
        .install(&workspace.cache, "v0.1.0", &workspace.project)
        .expect("first install");
    fs::remove_file(workspace.project.join("v0.1.0")).expect("drop marker");
    let second = installer
        .install(&workspace.cache, "v0.1.0", &workspace.project)
        .expect("second install");

    let (
        InstallOutcome::Installed { project_id: a, .. },
        InstallOutcome::Installed { project_id: b, .. },
    ) = (first, second)
    else {
        panic!("expected two fresh installs");
    };
    assert_ne!(a, b);
}

#[rstest]
fn missing_assets_directory_is_an_error(workspace: Workspace) {
    fs::remove_dir_all(workspace.cache.join("assets")).expect("remove assets");

    let err = ProjectInstaller::default()
        .install(&workspace.cache, "v0.1.0", &workspace.project)
        .expect_err("assets are required");

    assert!(matches!(err, ProjectError::MissingAssets { .. }));
    assert!(!has_marker(&workspace.project, "v0.1.0"));
}

#[rstest]
fn custom_placeholder_and_extension(workspace: Workspace) {
    let placeholder = Placeholder::try_from("__CARDINAL_PROJECT_ID__").expect("placeholder");
    let outcome = ProjectInstaller::new(placeholder)
        .with_script_extension("css")
        .install(&workspace.cache, "v0.1.0", &workspace.project)
        .expect("install");

    assert!(matches!(
        outcome,
        InstallOutcome::Installed {
            files_rewritten: 1,
            replacements: 1,
            ..
        }
    ));
    assert!(read(&workspace.project.join("assets/index.js")).contains(DEFAULT_PLACEHOLDER));
}

#[rstest]
fn non_utf8_scripts_are_rewritten_bytewise(workspace: Workspace) {
    fs::write(workspace.cache.join("assets/legacy.js"), b"var \xE9;").expect("write legacy.js");
    fs::write(
        workspace.cache.join("assets/latin1.js"),
        b"x=\"__CARDINAL_PROJECT_ID__\";\xE9",
    )
    .expect("write latin1.js");

    let outcome = ProjectInstaller::default()
        .install(&workspace.cache, "v0.1.0", &workspace.project)
        .expect("install");

    let InstallOutcome::Installed {
        project_id,
        files_rewritten,
        ..
    } = outcome
    else {
        panic!("expected a fresh install, got {outcome:?}");
    };
    assert_eq!(files_rewritten, 2);
    assert_eq!(
        fs::read(workspace.project.join("assets/legacy.js")).expect("read legacy.js"),
        b"var \xE9;"
    );
    let mut expected = format!("x=\"{project_id}\";").into_bytes();
    expected.push(0xE9);
    assert_eq!(
        fs::read(workspace.project.join("assets/latin1.js")).expect("read latin1.js"),
        expected
    );
}

#[rstest]
#[case::regex_metacharacters("$id.*")]
#[case::single_character("x")]
fn placeholder_is_matched_literally(workspace: Workspace, #[case] token: &str) {
    fs::write(workspace.cache.join("assets/index.js"), format!("a({token});b(xx)"))
        .expect("write index.js");
    let placeholder = Placeholder::try_from(token).expect("placeholder");

    let outcome = ProjectInstaller::new(placeholder)
        .install(&workspace.cache, "v0.1.0", &workspace.project)
        .expect("install");

    let InstallOutcome::Installed { project_id, .. } = outcome else {
        panic!("expected a fresh install, got {outcome:?}");
    };
    let expected = format!("a({token});b(xx)").replace(token, project_id.as_str());
    assert_eq!(read(&workspace.project.join("assets/index.js")), expected);
}

#[test]
fn empty_placeholder_is_rejected() {
    assert_eq!(Placeholder::try_from(""), Err(EmptyPlaceholder));
}

#[cfg(unix)]
#[rstest]
fn directories_are_world_readable(workspace: Workspace) {
    use std::os::unix::fs::PermissionsExt;

    ProjectInstaller::default()
        .install(&workspace.cache, "v0.1.0", &workspace.project)
        .expect("install");

    let mode = fs::metadata(workspace.project.join("assets"))
        .expect("assets metadata")
        .permissions()
        .mode();
    // The process umask may clear bits but never adds them.
    assert_eq!(mode & 0o7000, 0);
    assert_eq!(mode & 0o700, 0o700);
}

#[test]
fn identifiers_never_start_with_a_digit() {
    for _ in 0..32 {
        let id = ProjectId::generate();
        assert!(!id.as_str().starts_with(|c: char| c.is_ascii_digit()));
        assert_eq!(id.as_str().len(), PROJECT_ID_PREFIX.len() + 32);
    }
}
