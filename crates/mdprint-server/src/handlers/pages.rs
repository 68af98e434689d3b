//! Browser pages: a file index and a standalone preview with live reload.

use std::fmt::Write;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::Html;
use mdprint_renderer::escape_html;

use crate::error::ServerError;
use crate::handlers::PathQuery;
use crate::handlers::preview::render_preview;
use crate::state::AppState;

/// Client-side renderer for `<pre class="mermaid">` blocks.
const MERMAID_SCRIPT: &str = "https://cdn.jsdelivr.net/npm/mermaid@10/dist/mermaid.min.js";

/// Reloads the page when the viewed file changes, or the index on any change.
const RELOAD_SCRIPT: &str = r"<script>
(function () {
  var current = document.body.dataset.path || null;
  var source = new EventSource('/api/v1/events');
  ['file_created', 'file_modified', 'file_deleted'].forEach(function (type) {
    source.addEventListener(type, function (e) {
      var change = JSON.parse(e.data);
      if (current === null || change.path === current) { window.location.reload(); }
    });
  });
})();
</script>";

fn view_href(path: &str) -> String {
    let query = serde_urlencoded::to_string([("path", path)]).unwrap_or_default();
    format!("/view?{query}")
}

/// Handle GET /.
pub(crate) async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let root = state.session.root().display().to_string();
    let files = state.session.list_files();

    let mut html = String::from("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n");
    let _ = writeln!(html, "<title>{}</title>", escape_html(&root));
    html.push_str("</head>\n<body>\n");
    let _ = writeln!(html, "<h1>{}</h1>", escape_html(&root));
    if files.is_empty() {
        html.push_str("<p>No Markdown files found.</p>\n");
    } else {
        html.push_str("<ul>\n");
        for file in &files {
            let _ = writeln!(
                html,
                "<li><a href=\"{}\">{}</a> <small>{}</small></li>",
                escape_html(&view_href(&file.path)),
                escape_html(&file.title),
                escape_html(&file.path),
            );
        }
        html.push_str("</ul>\n");
    }
    html.push_str(RELOAD_SCRIPT);
    html.push_str("\n</body>\n</html>\n");
    Html(html)
}

/// Handle GET /view?path=.
pub(crate) async fn view(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PathQuery>,
) -> Result<Html<String>, ServerError> {
    let stylesheet = state.session.stylesheet().to_owned();
    let preview = render_preview(state, query.path).await?;

    let mut html = String::from("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n");
    let _ = writeln!(html, "<title>{}</title>", escape_html(&preview.title));
    let _ = writeln!(html, "<style>\n{stylesheet}\n</style>");
    let _ = writeln!(html, "<script src=\"{MERMAID_SCRIPT}\"></script>");
    html.push_str("<script>mermaid.initialize({ startOnLoad: true });</script>\n");
    html.push_str("</head>\n");
    let _ = writeln!(html, "<body data-path=\"{}\">", escape_html(&preview.path));
    html.push_str("<nav><a href=\"/\">Index</a></nav>\n<article>\n");
    html.push_str(&preview.html);
    html.push_str("</article>\n");
    html.push_str(RELOAD_SCRIPT);
    html.push_str("\n</body>\n</html>\n");
    Ok(Html(html))
}
