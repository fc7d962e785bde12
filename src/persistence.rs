//! Commit the artifact into the user's repository

use crate::client::ApiClient;
use crate::config::{ProviderConfig, UploadConfig};
use crate::error::{Error, Result, Step};
use crate::types::{Artifact, CommitOutcome, Credential, Identity, Task};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    content: Option<ContentInfo>,
    commit: Option<CommitInfo>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentInfo {
    html_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommitInfo {
    sha: Option<String>,
}

/// Write `task.artifact` into `{identity}/{task.target_resource}`
///
/// One `PUT /repos/{owner}/{repo}/contents/{path}` with `{message, content, branch}`.
/// The file name is `upload.path` with its extension matched to the
/// artifact's MIME type. The parsed body is inspected before the status: a
/// `"message": "Not Found"` reply is the provider saying the repository or
/// branch is unreachable for this user, which is reported as
/// [`Error::ResourceNotFound`] rather than a generic upstream failure.
///
/// No `sha` is sent, so an existing file is never overwritten. The provider
/// answers 422 in that case, reported as [`Error::ContentExists`].
pub async fn persist_artifact(
    client: &ApiClient,
    provider: &ProviderConfig,
    upload: &UploadConfig,
    credential: &Credential,
    identity: &Identity,
    task: &Task,
) -> Result<CommitOutcome> {
    let file_path = content_path(&upload.path, &task.artifact);
    let path = format!(
        "/repos/{}/{}/contents/{}",
        urlencoding::encode(&identity.login),
        urlencoding::encode(&task.target_resource),
        encode_content_path(&file_path),
    );
    let body = json!({
        "message": upload.commit_message,
        "content": task.artifact.data,
        "branch": upload.branch,
    });
    let request = client
        .provider_request(Method::PUT, provider, &path, credential)
        .json(&body);

    let response = client.send(Step::Persist, request).await?;

    // Check the structured error before the status so "Not Found" maps to 404.
    let parsed: Option<ContentsResponse> = serde_json::from_str(&response.body).ok();
    if let Some(ContentsResponse {
        message: Some(message),
        content: None,
        ..
    }) = &parsed
    {
        if message.eq_ignore_ascii_case("not found") {
            return Err(Error::ResourceNotFound {
                resource: format!("{}/{}", identity.login, task.target_resource),
            });
        }
    }

    if response.status == StatusCode::UNPROCESSABLE_ENTITY
        && parsed
            .as_ref()
            .and_then(|p| p.message.as_deref())
            .is_some_and(|message| message.contains("sha"))
    {
        return Err(Error::ContentExists {
            path: format!("{}/{}/{}", identity.login, task.target_resource, file_path),
        });
    }

    let response = response.error_for_status(Step::Persist)?;
    let parsed = parsed.ok_or_else(|| Error::unexpected(Step::Persist, "response is not JSON"))?;
    let content = parsed
        .content
        .ok_or_else(|| Error::unexpected(Step::Persist, "response has no content"))?;

    tracing::debug!(status = response.status.as_u16(), "artifact committed");

    Ok(CommitOutcome {
        owner: identity.login.clone(),
        repo: task.target_resource.clone(),
        path: file_path,
        html_url: content.html_url,
        commit_sha: parsed.commit.and_then(|c| c.sha),
    })
}

/// `configured` with its extension replaced by the one `artifact` calls for
///
/// Unknown MIME types keep the configured name as is.
fn content_path(configured: &str, artifact: &Artifact) -> String {
    let Some(extension) = artifact.extension() else {
        return configured.to_string();
    };
    let (dir, file) = match configured.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, configured),
    };
    let stem = match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file,
    };
    match dir {
        Some(dir) => format!("{dir}/{stem}.{extension}"),
        None => format!("{stem}.{extension}"),
    }
}

/// Percent-encode each segment of a repository path, keeping the separators
fn encode_content_path(path: &str) -> String {
    path.trim_matches('/')
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TaskToken;
    use std::time::Duration;
    use tokio::time::Instant;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn task(repo: &str, artifact: Artifact) -> Task {
        Task {
            token: TaskToken::generate(),
            artifact,
            target_resource: repo.into(),
            created_at: Instant::now(),
        }
    }

    async fn run(mock_server: &MockServer, repo: &str) -> Result<CommitOutcome> {
        run_with(mock_server, repo, Artifact::png("Zm9v")).await
    }

    async fn run_with(
        mock_server: &MockServer,
        repo: &str,
        artifact: Artifact,
    ) -> Result<CommitOutcome> {
        let provider = ProviderConfig {
            api_base_url: mock_server.uri(),
            ..Default::default()
        };
        let client = ApiClient::new("repo-drop-test", Duration::from_secs(5)).unwrap();
        persist_artifact(
            &client,
            &provider,
            &UploadConfig::default(),
            &Credential::new("T"),
            &Identity {
                login: "alice".into(),
            },
            &task(repo, artifact),
        )
        .await
    }

    #[tokio::test]
    async fn puts_content_and_reports_outcome() {
        let mock_server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/repos/alice/r/contents/image.png"))
            .and(header("authorization", "Bearer T"))
            .and(body_json(json!({
                "message": "Upload image via repo-drop",
                "content": "Zm9v",
                "branch": "main"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "content": {
                    "name": "image.png",
                    "html_url": "https://github.com/alice/r/blob/main/image.png"
                },
                "commit": { "sha": "abc123" }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let outcome = run(&mock_server, "r").await.unwrap();
        assert_eq!(outcome.owner, "alice");
        assert_eq!(outcome.repo, "r");
        assert_eq!(outcome.path, "image.png");
        assert_eq!(outcome.commit_sha.as_deref(), Some("abc123"));
        assert_eq!(
            outcome.html_url.as_deref(),
            Some("https://github.com/alice/r/blob/main/image.png")
        );
    }

    #[tokio::test]
    async fn not_found_message_is_a_resource_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "message": "Not Found",
                "documentation_url": "https://docs.github.com/rest/repos/contents"
            })))
            .mount(&mock_server)
            .await;

        match run(&mock_server, "missing").await.unwrap_err() {
            Error::ResourceNotFound { resource } => assert_eq!(resource, "alice/missing"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn not_found_message_wins_even_with_success_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Not Found" })))
            .mount(&mock_server)
            .await;

        assert!(matches!(
            run(&mock_server, "r").await,
            Err(Error::ResourceNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn other_failures_are_upstream_errors() {
        let mock_server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "message": "image.png does not match sha"
            })))
            .mount(&mock_server)
            .await;

        assert!(matches!(
            run(&mock_server, "r").await,
            Err(Error::UpstreamStatus { status: 409, .. })
        ));
    }

    #[tokio::test]
    async fn jpeg_artifact_is_committed_with_jpg_extension() {
        let mock_server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/repos/alice/r/contents/image.jpg"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "content": { "html_url": "https://github.com/alice/r/blob/main/image.jpg" }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let outcome = run_with(&mock_server, "r", Artifact::new("Zm9v", "image/jpeg"))
            .await
            .unwrap();
        assert_eq!(outcome.path, "image.jpg");
    }

    #[tokio::test]
    async fn existing_file_is_reported_as_content_exists() {
        let mock_server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "message": "Invalid request.\n\n\"sha\" wasn't supplied.",
                "documentation_url": "https://docs.github.com/rest/repos/contents"
            })))
            .mount(&mock_server)
            .await;

        match run(&mock_server, "r").await.unwrap_err() {
            Error::ContentExists { path } => assert_eq!(path, "alice/r/image.png"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn content_path_follows_artifact_type() {
        let jpeg = Artifact::new("Zm9v", "image/jpeg");
        assert_eq!(content_path("image.png", &jpeg), "image.jpg");
        assert_eq!(content_path("img/cat.png", &jpeg), "img/cat.jpg");
        assert_eq!(content_path("img/cat", &jpeg), "img/cat.jpg");
        assert_eq!(content_path("image.png", &Artifact::png("Zm9v")), "image.png");
        assert_eq!(
            content_path("image.png", &Artifact::new("Zm9v", "application/octet-stream")),
            "image.png"
        );
    }

    #[test]
    fn content_path_segments_are_encoded() {
        assert_eq!(encode_content_path("/img/my cat.png"), "img/my%20cat.png");
        assert_eq!(encode_content_path("image.png"), "image.png");
    }
}
