use axum::response::Html;

use crate::auth::AuthUser;

// Minimal server-rendered pages the gate depends on. The real UI lives in the
// frontend; these only exist so gate redirects and denials land somewhere.

// `/api/login` takes JSON, so the form posts through `fetch`. On success the page
// reloads itself and the gate forwards the new session to the callback.
const LOGIN_HTML: &str = r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>Sign in</title></head>
<body>
  <h1>Sign in</h1>
  <form id="login">
    <input name="username" autocomplete="username" required>
    <input name="password" type="password" autocomplete="current-password" required>
    <button type="submit">Sign in</button>
    <p id="error" role="alert"></p>
  </form>
  <script>
    document.getElementById("login").addEventListener("submit", async (event) => {
      event.preventDefault();
      const form = new FormData(event.target);
      const response = await fetch("/api/login", {
        method: "POST",
        headers: { "Content-Type": "application/json" },
        body: JSON.stringify({ username: form.get("username"), password: form.get("password") }),
      });
      if (response.ok) {
        window.location.reload();
      } else {
        const body = await response.json().catch(() => ({}));
        document.getElementById("error").textContent = body.error || "Sign in failed";
      }
    });
  </script>
</body>
</html>"#;

const ACCESS_DENIED_HTML: &str = r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>Access denied</title></head>
<body>
  <h1>Access denied</h1>
  <p>Your role does not have permission to view this page.</p>
  <a href="/">Back to dashboard</a>
</body>
</html>"#;

pub fn access_denied_html() -> Html<&'static str> {
    Html(ACCESS_DENIED_HTML)
}

pub async fn login() -> Html<&'static str> {
    Html(LOGIN_HTML)
}

/// Served directly at `/access-denied`. When the gate denies a page it serves the
/// same body itself, with status 403.
pub async fn access_denied() -> Html<&'static str> {
    access_denied_html()
}

pub async fn home(AuthUser { username, role, .. }: AuthUser) -> Html<String> {
    let username = escape(&username);
    Html(format!(
        "<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\"><title>Dashboard</title></head>\
         <body><h1>Dashboard</h1><p>Signed in as {username} ({role}).</p></body></html>"
    ))
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
