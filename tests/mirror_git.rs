//! Mirror migration between local repositories.

use git2::{Oid, Repository, RepositoryInitOptions, Signature};
use repo_shuttle::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;
use tempfile::TempDir;

fn signature() -> Signature<'static> {
    Signature::now("Test User", "test@example.com").unwrap()
}

fn commit(repo: &Repository, message: &str) -> Oid {
    let sig = signature();
    let tree_id = repo.index().unwrap().write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let parents: Vec<_> = repo
        .head()
        .ok()
        .and_then(|head| head.peel_to_commit().ok())
        .into_iter()
        .collect();
    let parent_refs: Vec<_> = parents.iter().collect();

    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
        .unwrap()
}

/// A source repository with `main`, `feature`, a lightweight and an
/// annotated tag.
fn create_source(root: &Path) -> Repository {
    let mut opts = RepositoryInitOptions::new();
    opts.initial_head("main");
    let repo = Repository::init_opts(root.join("lab").join("alpha"), &opts).unwrap();

    let first = commit(&repo, "Initial commit");
    let second = commit(&repo, "Second commit");

    {
        let first = repo.find_commit(first).unwrap();
        repo.branch("feature", &first, false).unwrap();

        let second = repo.find_object(second, None).unwrap();
        repo.tag_lightweight("v1.0", &second, false).unwrap();
        repo.tag("v1.1", &second, &signature(), "Release 1.1", false)
            .unwrap();
    }

    repo
}

fn create_destination(root: &Path) -> Repository {
    Repository::init_bare(root.join("hub").join("alpha.git")).unwrap()
}

fn refs(repo: &Repository) -> BTreeMap<String, Oid> {
    repo.references()
        .unwrap()
        .filter_map(|r| r.ok())
        .filter_map(|r| Some((r.name()?.to_string(), r.target()?)))
        .filter(|(name, _)| name.starts_with("refs/heads/") || name.starts_with("refs/tags/"))
        .collect()
}

fn config(root: &Path) -> MirrorConfig {
    let base = root.display().to_string();
    MirrorConfig::new("lab", "hub")
        .workdir(root.join("work"))
        .source_template(UrlTemplate::new(format!("{}/{{org}}/{{repo}}", base)).unwrap())
        .destination_template(UrlTemplate::new(format!("{}/{{org}}/{{repo}}.git", base)).unwrap())
}

fn alpha() -> RepoName {
    RepoName::new("alpha").unwrap()
}

#[test]
fn test_first_run_clones_and_mirrors_all_refs() {
    let tmp = TempDir::new().unwrap();
    let source = create_source(tmp.path());
    let destination = create_destination(tmp.path());

    let migrator = Migrator::new(config(tmp.path()));
    let outcome = migrator.migrate(&alpha()).unwrap();

    assert!(outcome.cloned);
    assert_eq!(outcome.remote, RemoteChange::Created);
    assert_eq!(refs(&destination), refs(&source));
    assert_eq!(refs(&destination).len(), 4);

    let workspace = tmp.path().join("work").join("lab").join("alpha.git");
    let mirror = Repository::open(&workspace).unwrap();
    assert!(mirror.is_bare());
    assert!(mirror.config().unwrap().get_bool("remote.origin.mirror").unwrap());
}

#[test]
fn test_second_run_fetches_and_propagates_deletions() {
    let tmp = TempDir::new().unwrap();
    let source = create_source(tmp.path());
    let destination = create_destination(tmp.path());
    let migrator = Migrator::new(config(tmp.path()));

    migrator.migrate(&alpha()).unwrap();

    source
        .find_branch("feature", git2::BranchType::Local)
        .unwrap()
        .delete()
        .unwrap();
    source.tag_delete("v1.0").unwrap();
    let new_head = commit(&source, "Third commit");

    let outcome = migrator.migrate(&alpha()).unwrap();

    assert!(!outcome.cloned);
    assert_eq!(outcome.remote, RemoteChange::Unchanged);
    assert_eq!(
        outcome.plan.deletions,
        vec!["refs/heads/feature".to_string(), "refs/tags/v1.0".to_string()]
    );

    let mirrored = refs(&destination);
    assert_eq!(mirrored, refs(&source));
    assert_eq!(mirrored["refs/heads/main"], new_head);
    assert!(!mirrored.contains_key("refs/heads/feature"));
}

#[test]
fn test_moved_destination_updates_the_remote() {
    let tmp = TempDir::new().unwrap();
    create_source(tmp.path());
    create_destination(tmp.path());
    let moved = Repository::init_bare(tmp.path().join("moved").join("alpha.git")).unwrap();

    Migrator::new(config(tmp.path())).migrate(&alpha()).unwrap();

    let relocated = config(tmp.path()).destination_template(
        UrlTemplate::new(format!("{}/moved/{{repo}}.git", tmp.path().display())).unwrap(),
    );
    let outcome = Migrator::new(relocated).migrate(&alpha()).unwrap();

    assert_eq!(outcome.remote, RemoteChange::UrlUpdated);
    assert_eq!(refs(&moved).len(), 4);
}

#[test]
fn test_workspace_that_is_not_a_repository_fails() {
    let tmp = TempDir::new().unwrap();
    create_source(tmp.path());
    create_destination(tmp.path());
    let workspace = tmp.path().join("work").join("lab").join("alpha.git");
    std::fs::create_dir_all(&workspace).unwrap();
    std::fs::write(workspace.join("notes.txt"), "not git").unwrap();

    let err = Migrator::new(config(tmp.path()))
        .migrate(&alpha())
        .unwrap_err();

    assert!(matches!(err, ShuttleError::NotARepository(_)));
}

#[test]
fn test_missing_source_fails_and_leaves_no_workspace() {
    let tmp = TempDir::new().unwrap();
    create_destination(tmp.path());

    let err = Migrator::new(config(tmp.path()))
        .migrate(&alpha())
        .unwrap_err();

    assert!(matches!(err, ShuttleError::CloneError { .. }));
    assert!(!tmp.path().join("work").join("lab").join("alpha.git").exists());
}

#[test]
fn test_batch_reports_each_repository() {
    let tmp = TempDir::new().unwrap();
    create_source(tmp.path());
    create_destination(tmp.path());

    let list = RepoList::parse("alpha\n\n  missing  \n../escape\n");
    let batch = Migrator::new(config(tmp.path())).run(&list, |_| {});

    assert_eq!(batch.summary.total, 3);
    assert_eq!(batch.summary.succeeded, 1);
    assert_eq!(batch.summary.failed, 2);
    assert_eq!(batch.results[1].name, "missing");
}

/// A commit on `main` made straight into a bare repository.
fn seed_main(repo: &Repository) -> Oid {
    let sig = signature();
    let tree_id = repo.treebuilder(None).unwrap().write().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    repo.commit(Some("refs/heads/main"), &sig, &sig, "Existing work", &tree, &[])
        .unwrap()
}

#[test]
fn test_mirror_into_empty_destination_finds_no_remote_refs() {
    let tmp = TempDir::new().unwrap();
    let source = create_source(tmp.path());
    let destination = create_destination(tmp.path());
    let source_url = tmp.path().join("lab").join("alpha").display().to_string();
    let destination_url = tmp.path().join("hub").join("alpha.git").display().to_string();

    let git = GitOps::clone_mirror(&source_url, tmp.path().join("mirror.git"), GitAuth::default())
        .unwrap();
    git.ensure_remote("destination", &destination_url).unwrap();

    assert!(git.remote_refs("destination").unwrap().is_empty());

    let plan = git.push_mirror("destination").unwrap();
    assert_eq!(plan.updates.len(), 4);
    assert!(plan.deletions.is_empty());
    assert_eq!(refs(&destination), refs(&source));

    let listed = git.remote_refs("destination").unwrap();
    assert_eq!(listed, refs(&source).into_keys().collect::<Vec<_>>());
    assert!(
        git.local_refs()
            .unwrap()
            .iter()
            .all(|name| !name.starts_with("refs/remotes/"))
    );
}

#[test]
fn test_empty_source_is_skipped_and_destination_kept() {
    let tmp = TempDir::new().unwrap();
    Repository::init_bare(tmp.path().join("lab").join("alpha")).unwrap();
    let destination = create_destination(tmp.path());
    let existing = seed_main(&destination);

    let outcome = Migrator::new(config(tmp.path())).migrate(&alpha()).unwrap();

    assert!(outcome.cloned);
    assert!(outcome.plan.is_empty());
    assert!(matches!(outcome.status(), RepoStatus::Skipped(_)));
    assert_eq!(refs(&destination).get("refs/heads/main"), Some(&existing));
}
