//! HTML rendering for pages, errors and the admin area

use std::collections::BTreeMap;
use std::fmt::Write;

use pulldown_cmark::{html, Options, Parser};

use crate::types::{AggregateStats, ParsedContent, RevisionRef};
use crate::utils::format_local;

/// Recent visits shown on the dashboard
const DASHBOARD_RECENT: usize = 20;

/// Escape text for HTML bodies and double-quoted attributes
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Rewrite Obsidian image embeds into standard markdown images
///
/// `![['notes/img/diagram one.png']]` becomes
/// `![diagram one](/notes/img/diagram%20one.png)`.
pub fn rewrite_embeds(markdown: &str) -> String {
    const OPEN: &str = "![['";
    const CLOSE: &str = "']]";

    let mut out = String::with_capacity(markdown.len());
    let mut rest = markdown;
    while let Some(start) = rest.find(OPEN) {
        let after_open = &rest[start + OPEN.len()..];
        let Some(end) = after_open.find(CLOSE) else {
            break;
        };
        let path = &after_open[..end];
        if path.is_empty() || path.contains('\'') || path.contains('\n') {
            out.push_str(&rest[..start + OPEN.len()]);
            rest = after_open;
            continue;
        }

        out.push_str(&rest[..start]);
        let file_name = path.rsplit('/').next().unwrap_or(path);
        let alt = match file_name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => file_name,
        };
        let encoded: Vec<String> = path
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        let _ = write!(out, "![{}](/{})", alt, encoded.join("/"));

        rest = &after_open[end + CLOSE.len()..];
    }
    out.push_str(rest);
    out
}

/// Render markdown to an HTML fragment
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);

    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

fn version_nav(content: &ParsedContent, page_name: &str) -> String {
    if !content.versions_public() || content.revisions.len() < 2 {
        return String::new();
    }

    let links: Vec<String> = content
        .revisions
        .iter()
        .map(|r| {
            let active = r.number == content.revision;
            format!(
                r#"<a href="/{page}/v{n}" class="{class}">v{n}{latest}</a>"#,
                page = escape_html(page_name),
                n = r.number,
                class = if active { "active" } else { "" },
                latest = if active && content.is_latest { " (latest)" } else { "" },
            )
        })
        .collect();

    format!(r#"<div class="version-nav">{}</div>"#, links.join(" | "))
}

/// Full HTML page for one document revision
pub fn render_page(content: &ParsedContent, page_name: &str, default_theme: &str) -> String {
    let title = content.meta_str("title").unwrap_or(page_name);
    let theme = content.meta_str("theme").unwrap_or(default_theme);
    let description = content
        .meta_str("description")
        .map(|d| format!(r#"<meta name="description" content="{}">"#, escape_html(d)))
        .unwrap_or_default();
    let body = markdown_to_html(&rewrite_embeds(&content.body));

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>{title}</title>
  <link rel="stylesheet" href="/themes/{theme}.css">
  {description}
</head>
<body>
  <main class="content">
    <header class="page-header">
      <h1>{title}</h1>
      {nav}
    </header>
    <article class="markdown-body">
{body}
    </article>
  </main>
</body>
</html>"#,
        title = escape_html(title),
        theme = escape_html(theme),
        description = description,
        nav = version_nav(content, page_name),
        body = body,
    )
}

pub fn render_not_found() -> String {
    r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>404 - Page Not Found</title>
  <link rel="stylesheet" href="/themes/default.css">
</head>
<body>
  <main class="content">
    <h1>404 - Page Not Found</h1>
    <p>The requested page could not be found.</p>
  </main>
</body>
</html>"#
        .to_string()
}

pub fn render_login(show_error: bool) -> String {
    let error = if show_error {
        r#"<div class="error">Invalid password</div>"#
    } else {
        ""
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>Admin Login - MDCMS</title>
  <style>
    body {{ font-family: Arial, sans-serif; max-width: 400px; margin: 100px auto; padding: 20px; }}
    input {{ width: 100%; padding: 10px; margin: 10px 0; box-sizing: border-box; }}
    button {{ width: 100%; padding: 10px; background: #007cba; color: white; border: none; cursor: pointer; }}
    .error {{ color: red; margin: 10px 0; }}
  </style>
</head>
<body>
  <h1>Admin Login</h1>
  {error}
  <form method="post" action="/admin/login">
    <input type="password" name="password" placeholder="Password" required>
    <button type="submit">Login</button>
  </form>
</body>
</html>"#
    )
}

/// Link target for one revision row: the bare page for the latest, `page/vN` otherwise
fn revision_path(page: &str, revision: u32, latest: u32) -> String {
    if revision == latest {
        page.to_string()
    } else {
        format!("{}/v{}", page, revision)
    }
}

fn document_rows(stats: &AggregateStats, documents: &BTreeMap<String, Vec<RevisionRef>>) -> String {
    let mut rows = String::new();
    for (page, revisions) in documents {
        let latest = revisions.last().map(|r| r.number).unwrap_or(1);
        let views = stats.page_view_counts.get(page);
        let total = views.map(|v| v.total).unwrap_or(0);
        let page_html = escape_html(page);

        for (i, r) in revisions.iter().enumerate() {
            let (name_cell, views_cell, indent) = if i == 0 {
                (page_html.clone(), format!("<strong>{}</strong>", total), "")
            } else {
                let marker = if r.number == latest { " (latest)" } else { "" };
                (
                    format!("└─ v{}{}", r.number, marker),
                    views.map(|v| v.version(&r.label())).unwrap_or(0).to_string(),
                    r#" class="version-indent""#,
                )
            };
            let _ = write!(
                rows,
                r#"
        <tr>
          <td{indent}>{name_cell}</td>
          <td>{number}</td>
          <td{indent}>{views_cell}</td>
          <td><button class="copy-btn" data-path="{path}" onclick="copyUrl(this.dataset.path)">Copy URL</button></td>
        </tr>"#,
                number = r.number,
                path = escape_html(&revision_path(page, r.number, latest)),
            );
        }
    }
    rows
}

fn ranked_list<'a, I>(items: I) -> String
where
    I: IntoIterator<Item = (&'a str, usize)>,
{
    let mut out = String::new();
    for (label, count) in items {
        let _ = write!(
            out,
            r#"<li><span>{}</span> <strong>{}</strong></li>"#,
            escape_html(label),
            count
        );
    }
    out
}

fn recent_visit_items(stats: &AggregateStats) -> String {
    let mut out = String::new();
    for visit in stats.recent_visits.iter().take(DASHBOARD_RECENT) {
        let version = visit
            .version
            .as_deref()
            .map(|v| format!(" ({})", escape_html(v)))
            .unwrap_or_default();
        let visitor: String = visit.ip_hash.chars().take(8).collect();
        let _ = write!(
            out,
            r#"
      <div class="visit-item">{} - {}{} - {}...</div>"#,
            format_local(&visit.timestamp),
            escape_html(&visit.page),
            version,
            escape_html(&visitor),
        );
    }
    out
}

/// Admin dashboard: headline counts, documents, audience and recent visits
pub fn render_dashboard(
    stats: &AggregateStats,
    documents: &BTreeMap<String, Vec<RevisionRef>>,
) -> String {
    let popular = ranked_list(stats.popular_pages.iter().map(|p| (p.page.as_str(), p.count)));
    let sources = ranked_list(
        stats
            .traffic_sources
            .iter()
            .map(|s| (s.source.as_str(), s.count)),
    );

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>Admin Dashboard - MDCMS</title>
  <style>
    body {{ font-family: Arial, sans-serif; max-width: 1200px; margin: 0 auto; padding: 20px; }}
    .header {{ display: flex; justify-content: space-between; align-items: center; border-bottom: 1px solid #ccc; }}
    .stats {{ display: grid; grid-template-columns: repeat(4, 1fr); gap: 20px; margin: 20px 0; }}
    .stat-card {{ background: #f5f5f5; padding: 20px; border-radius: 5px; text-align: center; }}
    .stat-number {{ font-size: 2em; font-weight: bold; color: #007cba; }}
    .page-list {{ border-collapse: collapse; width: 100%; }}
    .page-list th, .page-list td {{ border: 1px solid #ddd; padding: 10px; text-align: left; }}
    .version-indent {{ padding-left: 20px; font-size: 0.9em; color: #666; }}
    .recent-visits {{ max-height: 300px; overflow-y: auto; border: 1px solid #ddd; }}
    .visit-item {{ padding: 8px; border-bottom: 1px solid #eee; font-size: 0.9em; }}
  </style>
</head>
<body>
  <div class="header">
    <h1>MDCMS Admin Dashboard</h1>
    <form method="post" action="/admin/logout"><button type="submit" class="logout-btn">Logout</button></form>
  </div>

  <div class="stats">
    <div class="stat-card"><div class="stat-number">{total}</div><div>Total Visits</div></div>
    <div class="stat-card"><div class="stat-number">{today}</div><div>Today</div></div>
    <div class="stat-card"><div class="stat-number">{week}</div><div>This Week</div></div>
    <div class="stat-card"><div class="stat-number">{month}</div><div>This Month</div></div>
  </div>

  <div class="section">
    <h2>Pages</h2>
    <table class="page-list">
      <thead><tr><th>Page</th><th>Version</th><th>Views</th><th>Actions</th></tr></thead>
      <tbody>{rows}
      </tbody>
    </table>
  </div>

  <div class="section">
    <h2>Most Visited</h2>
    <ol>{popular}</ol>
  </div>

  <div class="section">
    <h2>Audience</h2>
    <p>Humans: <strong>{humans}</strong> &middot; Bots: <strong>{bots}</strong></p>
    <h3>Traffic Sources</h3>
    <ol>{sources}</ol>
  </div>

  <div class="section">
    <h2>Recent Visits</h2>
    <div class="recent-visits">{recent}
    </div>
  </div>

  <script>
    function copyUrl(path) {{
      const url = window.location.protocol + '//' + window.location.host + '/' + path;
      navigator.clipboard.writeText(url).then(() => alert('URL copied to clipboard: ' + url));
    }}
  </script>
</body>
</html>"#,
        total = stats.total,
        today = stats.today,
        week = stats.week,
        month = stats.month,
        rows = document_rows(stats, documents),
        popular = popular,
        humans = stats.audience.humans,
        bots = stats.audience.bots,
        sources = sources,
        recent = recent_visit_items(stats),
    )
}
