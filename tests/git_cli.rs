// End-to-end sync through the real `git` executable against a local repository.
// Skipped when git is not installed.
#![cfg(unix)]

use markdown_transport::contract::{FetchRequest, GitTransport};
use markdown_transport::git::GitCli;
use markdown_transport::{GitSource, MarkdownTransport, SyncStrategy, TransportConfig};
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(["-c", "user.name=Test", "-c", "user.email=test@example.com"])
        .args(args)
        .status()
        .expect("git runs");
    assert!(status.success(), "git {args:?} failed");
}

fn commit_post(repo: &Path, name: &str, title: &str) {
    fs::write(
        repo.join(name),
        format!("---\ntitle: {title}\npublishDate: \"2020-01-01\"\ndraft: false\n---\n{title} body\n"),
    )
    .unwrap();
    git(repo, &["add", name]);
    git(repo, &["commit", "--quiet", "-m", title]);
}

fn config_for(remote: &Path, checkout: &Path, strategy: SyncStrategy) -> TransportConfig {
    TransportConfig::remote(
        GitSource::new(format!("file://{}", remote.display()))
            .with_strategy(strategy)
            .with_local_path(checkout),
    )
}

fn local_git_config(checkout: &Path, key: &str) -> String {
    let output = Command::new("git")
        .arg("-C")
        .arg(checkout)
        .args(["config", "--local", key])
        .output()
        .expect("git runs");
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

#[tokio::test]
async fn clone_pull_and_none_against_a_local_remote() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }

    let root = tempdir().unwrap();
    let remote = root.path().join("remote");
    let checkout = root.path().join("checkout");
    fs::create_dir_all(&remote).unwrap();
    git(&remote, &["init", "--quiet"]);
    commit_post(&remote, "first.md", "First");

    // Fresh shallow clone.
    let loader = MarkdownTransport::with_transport(
        config_for(&remote, &checkout, SyncStrategy::Clone),
        GitCli::new(),
    );
    let records = loader.load_all().await.expect("clone and load");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].metadata().title, "First");
    assert_eq!(local_git_config(&checkout, "user.name"), "Markdown Transport");
    assert_eq!(
        local_git_config(&checkout, "user.email"),
        "markdown-transport@example.com"
    );

    // New upstream commit arrives through a fast-forward pull.
    commit_post(&remote, "second.md", "Second");
    let loader = MarkdownTransport::with_transport(
        config_for(&remote, &checkout, SyncStrategy::Pull),
        GitCli::new(),
    );
    assert_eq!(loader.load_all().await.expect("pull and load").len(), 2);

    // 'none' leaves the checkout behind the remote.
    commit_post(&remote, "third.md", "Third");
    let loader = MarkdownTransport::with_transport(
        config_for(&remote, &checkout, SyncStrategy::None),
        GitCli::new(),
    );
    assert_eq!(loader.load_all().await.expect("load only").len(), 2);
    assert!(!checkout.join("third.md").exists());
}

#[tokio::test]
async fn cloning_a_missing_remote_fails_and_cleans_up() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }

    let root = tempdir().unwrap();
    let checkout = root.path().join("checkout");
    let loader = MarkdownTransport::with_transport(
        config_for(&root.path().join("no-such-repo"), &checkout, SyncStrategy::Clone),
        GitCli::new(),
    );

    let err = loader.load_all().await.unwrap_err();
    assert!(matches!(err, markdown_transport::Error::Transport(_)), "got {err}");
    assert!(!checkout.exists());
}

#[tokio::test]
async fn option_like_url_is_treated_as_a_repository_name() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }

    let root = tempdir().unwrap();
    let marker = root.path().join("marker");
    let checkout = root.path().join("checkout");
    fs::create_dir_all(&checkout).unwrap();
    let request = FetchRequest::new(
        format!("--upload-pack=touch {}", marker.display()),
        &checkout,
    );

    let cli = GitCli::new();
    assert!(cli.clone_shallow(&request).await.is_err());
    assert!(!marker.exists(), "url must never reach git as an option");

    git(&checkout, &["init", "--quiet"]);
    assert!(cli.pull_fast_forward(&request).await.is_err());
    assert!(!marker.exists(), "url must never reach git as an option");
}
