// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::http::{FakeTransport, Method};
use insight_core::{ErrorKind, Severity};

const BASE: &str = "http://review/a";

fn b64(text: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(text)
}

fn xssi(json: &str) -> String {
    format!(")]}}'\n{}", json)
}

const PATCH: &str = "\
From abc123 Mon Sep 17 00:00:00 2001
Subject: [PATCH] Add helper

---
diff --git a/src/a.c b/src/a.c
index 1111111..2222222 100644
--- a/src/a.c
+++ b/src/a.c
@@ -41,1 +41,2 @@
 int x;
+int y;
";

/// A change 42 at revision 3 (`abc123`) with a message, one edited file,
/// one deleted and one renamed-away file.
fn server() -> FakeTransport {
    let fake = FakeTransport::new();
    fake.on_get(
        format!("{}/changes/?q=commit:abc123&o=CURRENT_REVISION&start=0&n=1000", BASE),
        xssi(r#"[{"project":"platform/build","branch":"main","_number":42,
                  "current_revision":"abc123","revisions":{"abc123":{"_number":3}}}]"#),
    )
    .on_get(
        format!("{}/changes/42/revisions/3/files/", BASE),
        xssi(r#"{"/COMMIT_MSG":{"status":"A"},"src/a.c":{},"old.c":{"status":"D"},"moved.c":{"status":"R"}}"#),
    )
    .on_get(format!("{}/changes/42/revisions/3/files/%2FCOMMIT_MSG/content", BASE), b64("Add helper\n"))
    .on_get(format!("{}/changes/42/revisions/3/files/src%2Fa.c/content", BASE), b64("int x;\nint y;\n"))
    .on_get(format!("{}/changes/42/revisions/3/patch", BASE), b64(PATCH))
    .on_post(format!("{}/changes/42/revisions/3/review", BASE), xssi("{}"));
    fake
}

fn client(fake: &FakeTransport) -> ReviewClient<FakeTransport> {
    ReviewClient::new(fake.clone(), "http://review/", "bot", "secret")
}

#[yare::parameterized(
    plain = { "src/a.c", "src%2Fa.c", "src%2Fa.c" },
    space = { "my file.c", "my+file.c", "my%20file.c" },
    message = { "/COMMIT_MSG", "%2FCOMMIT_MSG", "%2FCOMMIT_MSG" },
    query = { "commit:abc status:open", "commit%3Aabc+status%3Aopen", "commit:abc%20status:open" },
)]
fn escaping(input: &str, query: &str, path: &str) {
    assert_eq!(query_escape(input), query);
    assert_eq!(path_escape(input), path);
}

#[tokio::test]
async fn anonymous_clients_skip_the_auth_prefix() {
    let fake = FakeTransport::new();
    fake.on_get("http://review/changes/7/detail", xssi(r#"{"_number":7,"project":"p"}"#));
    let review = ReviewClient::new(fake.clone(), "http://review", "", "");

    let change = review.detail(7).await.unwrap();
    assert_eq!(change.number, 7);
    assert!(!fake.calls()[0].authed);
}

#[tokio::test]
async fn query_follows_more_changes() {
    let fake = FakeTransport::new();
    let url = |start: usize| {
        format!(
            "http://review/changes/?q=status:open&o=CURRENT_FILES&o=CURRENT_REVISION&o=DETAILED_ACCOUNTS&start={}&n=1000",
            start
        )
    };
    fake.on_get(url(0), xssi(r#"[{"_number":1},{"_number":2,"_more_changes":true}]"#))
        .on_get(url(2), xssi(r#"[{"_number":3}]"#));
    let review = ReviewClient::new(fake.clone(), "http://review", "", "");

    let changes = review.query("status:open", 0).await.unwrap();
    let numbers: Vec<i64> = changes.iter().map(|c| c.number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(fake.calls().len(), 2);
}

#[tokio::test]
async fn query_rejects_missing_prefix() {
    let fake = FakeTransport::new();
    fake.on_get("http://review/changes/?q=x&o=CURRENT_FILES&o=CURRENT_REVISION&o=DETAILED_ACCOUNTS&start=0&n=1000", "[]");
    let err = ReviewClient::new(fake, "http://review", "", "").query("x", 0).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
}

#[test]
fn change_info_round_trips_unknown_keys() {
    let raw = serde_json::json!({
        "id": "platform%2Fbuild~main~I1",
        "project": "platform/build",
        "_number": 42,
        "status": "NEW",
        "labels": {"Code-Review": {"approved": {"_account_id": 7}}},
        "revisions": {"abc": {"_number": 3, "ref": "refs/changes/42/42/3", "files": {"a.c": {"lines_inserted": 2}}}},
    });
    let change: ChangeInfo = serde_json::from_value(raw.clone()).unwrap();
    assert_eq!(serde_json::to_value(&change).unwrap(), raw);
}

#[tokio::test]
async fn diff_uses_current_revision_path() {
    let fake = FakeTransport::new();
    fake.on_get(
        format!("{}/changes/42/revisions/current/files/src%2Fa.c/diff", BASE),
        xssi(r#"{"change_type":"MODIFIED","content":[{"ab":["int x;"]},{"b":["int y;"]}]}"#),
    );
    let diff = client(&fake).diff(42, "src/a.c").await.unwrap();

    assert_eq!(diff.change_type, "MODIFIED");
    assert_eq!(diff.added_lines().collect::<Vec<_>>(), vec!["int y;"]);
}

#[tokio::test]
async fn changeset_collects_files_contents_and_patch() {
    let fake = server();
    let changeset = client(&fake).changeset("abc123").await.unwrap();

    assert_eq!(changeset.change_number, 42);
    assert_eq!(changeset.revision_number, 3);
    assert_eq!(changeset.current_revision, "abc123");
    let paths: Vec<&str> = changeset.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec![COMMIT_MSG, "src/a.c"]);
    assert!(changeset.touches_commit_message());
    assert_eq!(changeset.contents["src/a.c"], b64("int x;\nint y;\n"));
    assert_eq!(changeset.patch, b64(PATCH));
}

#[tokio::test]
async fn fetch_materializes_live_files_only() {
    let fake = server();
    let root = tempfile::tempdir().unwrap();
    let fetched = client(&fake).fetch(root.path(), "abc123").await.unwrap();

    assert_eq!(fetched.path, root.path().join("42").join("abc123"));
    assert_eq!(fetched.project, "platform/build");
    let stored: Vec<&str> = fetched.files.iter().map(|f| f.stored.as_str()).collect();
    assert_eq!(stored, vec![MESSAGE_FILE, "src/a.c.base64"]);

    let message = std::fs::read_to_string(fetched.path.join(MESSAGE_FILE)).unwrap();
    assert_eq!(message, b64("Add helper\n"));
    assert!(fetched.path.join("src/a.c.base64").is_file());
    assert!(!fetched.path.join("old.c.base64").exists());
    assert!(!fetched.path.join("moved.c.base64").exists());
}

#[tokio::test]
async fn fetch_without_message_writes_no_message_file() {
    let fake = server();
    fake.on_get(format!("{}/changes/42/revisions/3/files/", BASE), xssi(r#"{"src/a.c":{"status":"M"}}"#));
    let root = tempfile::tempdir().unwrap();
    let fetched = client(&fake).fetch(root.path(), "abc123").await.unwrap();

    assert!(!fetched.path.join(MESSAGE_FILE).exists());
    assert_eq!(fetched.files.len(), 1);
}

#[yare::parameterized(
    parent = { "../../escaped.c" },
    nested_parent = { "src/../../escaped.c" },
    current = { "./a.c" },
)]
#[test_macro(tokio::test)]
async fn fetch_rejects_escaping_names_before_writing(name: &str) {
    let fake = server();
    fake.on_get(
        format!("{}/changes/42/revisions/3/files/", BASE),
        xssi(&format!(r#"{{"{}":{{"status":"M"}}}}"#, name)),
    );
    let root = tempfile::tempdir().unwrap();

    let err = client(&fake).fetch(&root.path().join("work"), "abc123").await.unwrap_err();

    assert!(matches!(err, ReviewError::UnsafePath { .. }), "{:?}", err);
    assert_eq!(err.kind(), ErrorKind::Decode);
    assert!(!root.path().join("escaped.c.base64").exists());
    assert!(!root.path().join("work").exists());
    assert!(fake.calls().iter().all(|c| !c.url.ends_with("/content")));
}

#[tokio::test]
async fn failed_download_removes_the_revision_directory() {
    let fake = server();
    fake.fail(Method::Get, format!("{}/changes/42/revisions/3/files/src%2Fa.c/content", BASE), 500);
    let root = tempfile::tempdir().unwrap();

    let err = client(&fake).fetch(root.path(), "abc123").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Http);
    assert!(!root.path().join("42").join("abc123").exists());
}

#[test]
fn scratch_dir_is_removed_unless_released() {
    let root = tempfile::tempdir().unwrap();
    let kept = root.path().join("kept");
    let dropped = root.path().join("dropped");
    std::fs::create_dir_all(dropped.join("src")).unwrap();
    std::fs::create_dir_all(&kept).unwrap();

    ScratchDir::new(&kept).release();
    drop(ScratchDir::new(&dropped));
    drop(ScratchDir::new(&root.path().join("never-created")));

    assert!(kept.is_dir());
    assert!(!dropped.exists());
}

#[tokio::test]
async fn clean_removes_tree_and_tolerates_absence() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("42/abc");
    std::fs::create_dir_all(dir.join("src")).unwrap();
    std::fs::write(dir.join("src/a.c.base64"), "x").unwrap();
    let review = client(&FakeTransport::new());

    review.clean(&dir).unwrap();
    assert!(!dir.exists());
    review.clean(&dir).unwrap();
}

#[tokio::test]
async fn vote_without_findings_approves() {
    let fake = server();
    let vote = client(&fake).vote("abc123", &[]).await.unwrap();

    assert_eq!(vote.value(), "+1");
    let posts = fake.posts();
    assert_eq!(posts.len(), 1);
    assert!(posts[0].authed);
    assert_eq!(
        posts[0].body_json(),
        serde_json::json!({
            "labels": {"Code-Review": "+1"},
            "message": "Voting Code-Review +1 by pipeflow insight",
        })
    );
}

#[tokio::test]
async fn vote_posts_only_in_scope_comments() {
    let fake = server();
    let findings = [
        Finding::new("src/a.c", 42, Severity::Error, "bad"),
        Finding::new("src/a.c", 43, Severity::Error, "oops"),
        Finding::new("src/other.c", 1, Severity::Error, "x"),
    ];
    let vote = client(&fake).vote("abc123", &findings).await.unwrap();

    assert_eq!(vote.value(), "-1");
    assert_eq!(vote.change, 42);
    let body = fake.posts()[0].body_json();
    assert_eq!(body["labels"], serde_json::json!({"Code-Review": "-1"}));
    assert_eq!(body["comments"], serde_json::json!({"src/a.c": [{"line": 42, "message": "bad"}]}));
}

#[tokio::test]
async fn repeated_votes_post_identical_bodies() {
    let fake = server();
    let findings = [
        Finding::new("src/a.c", 42, Severity::Warn, "bad"),
        Finding::new(COMMIT_MSG, 0, Severity::Error, "Subject shorter than 25 characters (found 10)"),
    ];
    let review = client(&fake);
    review.vote("abc123", &findings).await.unwrap();
    review.vote("abc123", &findings).await.unwrap();

    let posts = fake.posts();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].body, posts[1].body);
}

#[tokio::test]
async fn binary_only_patch_approves() {
    let fake = server();
    let patch = "diff --git a/logo.png b/logo.png\nindex 1..2 100644\nBinary files a/logo.png and b/logo.png differ\n";
    fake.on_get(format!("{}/changes/42/revisions/3/patch", BASE), b64(patch));

    let findings = [Finding::new("logo.png", 3, Severity::Error, "x")];
    let vote = client(&fake).vote("abc123", &findings).await.unwrap();
    assert!(vote.input.approves());
}

#[tokio::test]
async fn patch_without_sections_posts_nothing() {
    let fake = server();
    fake.on_get(format!("{}/changes/42/revisions/3/patch", BASE), b64("Subject: empty\n"));

    let err = client(&fake).vote("abc123", &[]).await.unwrap_err();
    assert!(matches!(err, ReviewError::NoDiff));
    assert!(fake.posts().is_empty());
}

#[tokio::test]
async fn unknown_commit_is_not_found() {
    let fake = FakeTransport::new();
    fake.on_get(
        format!("{}/changes/?q=commit:dead&o=CURRENT_REVISION&start=0&n=1000", BASE),
        xssi("[]"),
    );
    let err = client(&fake).vote("dead", &[]).await.unwrap_err();
    assert!(matches!(err, ReviewError::NotFound { .. }));
}

#[tokio::test]
async fn rejected_post_is_fatal() {
    let fake = server();
    fake.fail(Method::Post, format!("{}/changes/42/revisions/3/review", BASE), 403);

    let err = client(&fake).vote("abc123", &[]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Http);
}
