use super::view::ResolutionState;
use crate::editor::is_web_url;

const STYLE: &str = "body{font-family:system-ui,sans-serif;max-width:32rem;margin:3rem auto;padding:0 1rem;text-align:center}\
a.link{display:block;margin:.75rem 0;padding:.75rem;border-radius:.5rem;background:#2563eb;color:#fff;text-decoration:none}\
.error{color:#b91c1c}";

/// Render the landing page for the given state as a full HTML document.
pub fn render_page(state: &ResolutionState) -> String {
    let (title, body) = match state {
        ResolutionState::Loading => ("Loading".to_string(), "<p>Loading...</p>".to_string()),
        ResolutionState::NotFound(message) => (
            "Error".to_string(),
            format!(
                "<h1>Error</h1><p class=\"error\">{}</p>",
                escape_html(message)
            ),
        ),
        ResolutionState::Resolved(page) => {
            let mut body = format!("<h1>{}</h1>", escape_html(&page.name));
            for link in page.links.iter().filter(|l| is_web_url(&l.url)) {
                body.push_str(&format!(
                    "<a class=\"link\" href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">{}</a>",
                    escape_html(&link.url),
                    escape_html(&link.title)
                ));
            }
            (page.name.clone(), body)
        }
    };

    format!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
<title>{}</title><style>{STYLE}</style></head><body>{body}</body></html>",
        escape_html(&title)
    )
}

pub fn escape_html(input: &str) -> String {
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
