//! HTML pages served by the API
//!
//! Pages are small enough to build with `format!`; every interpolated value
//! goes through [`escape`].

use crate::types::Completion;

/// Escape text for inclusion in HTML element content or a quoted attribute
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n<body>\n{}\n</body>\n</html>\n",
        escape(title),
        body
    )
}

/// Landing page with the prompt form and the direct upload form
pub fn index_page() -> String {
    page(
        "repo-drop",
        r#"<h1>repo-drop</h1>
<form method="GET" action="/image">
  <input name="prompt" placeholder="Describe an image" required>
  <input name="repo" placeholder="Repository name" required>
  <button type="submit">Generate and commit</button>
</form>
<form method="GET" action="/upload">
  <input name="repo" placeholder="Repository name" required>
  <button type="submit">Commit the default image</button>
</form>"#,
    )
}

/// Confirmation page with an inline preview of the committed artifact
pub fn success_page(completion: &Completion) -> String {
    let outcome = &completion.outcome;
    let location = format!("{}/{}/{}", outcome.owner, outcome.repo, outcome.path);
    let link = match &outcome.html_url {
        Some(url) => format!(
            "<p><a href=\"{}\">View on GitHub</a></p>",
            escape(url)
        ),
        None => String::new(),
    };
    let commit = match &outcome.commit_sha {
        Some(sha) => format!("<p>Commit <code>{}</code></p>", escape(sha)),
        None => String::new(),
    };

    page(
        "Uploaded",
        &format!(
            "<h1>Uploaded to {}</h1>\n{}{}<img src=\"data:{};base64,{}\" alt=\"uploaded image\">\n<p><a href=\"/\">Start over</a></p>",
            escape(&location),
            commit,
            link,
            escape(&completion.artifact.mime_type),
            escape(&completion.artifact.data),
        ),
    )
}

/// Error page shown for every failed flow
pub fn error_page(status: u16, code: &str, message: &str) -> String {
    page(
        "Something went wrong",
        &format!(
            "<h1>{} {}</h1>\n<p>{}</p>\n<p><a href=\"/\">Start over</a></p>",
            status,
            escape(code),
            escape(message)
        ),
    )
}
