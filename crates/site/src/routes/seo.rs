//! Sitemap and robots route handlers.
//!
//! The backoffice paths are disallowed for crawlers; only the marketing
//! surface is listed in the sitemap.

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::state::AppState;

/// Pages listed in the sitemap, with change frequency and priority.
const SITEMAP_ENTRIES: &[(&str, &str, &str)] = &[
    ("", "weekly", "1.0"),
    ("/account-deletion", "monthly", "0.5"),
    ("/policy/points-me", "yearly", "0.3"),
    ("/policy/pos-me", "yearly", "0.3"),
];

/// Crawler-disallowed path prefixes (the backoffice surface).
const DISALLOWED_PATHS: &[&str] = &[
    "/backoffice",
    "/api/",
    "/clear-auth",
    "/dashboard",
    "/members",
    "/transactions",
];

/// Serve the sitemap.
///
/// GET /sitemap.xml
#[instrument(skip(state))]
pub async fn sitemap(State(state): State<AppState>) -> impl IntoResponse {
    let base_url = state.config().base_url.trim_end_matches('/');

    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for (path, changefreq, priority) in SITEMAP_ENTRIES {
        xml.push_str(&format!(
            "  <url>\n    <loc>{base_url}{path}</loc>\n    <changefreq>{changefreq}</changefreq>\n    <priority>{priority}</priority>\n  </url>\n"
        ));
    }
    xml.push_str("</urlset>\n");

    ([(CONTENT_TYPE, "application/xml")], xml)
}

/// Serve the robots policy.
///
/// GET /robots.txt
#[instrument(skip(state))]
pub async fn robots(State(state): State<AppState>) -> impl IntoResponse {
    let base_url = state.config().base_url.trim_end_matches('/');

    let mut body = String::from("User-agent: *\nAllow: /\n");
    for path in DISALLOWED_PATHS {
        body.push_str(&format!("Disallow: {path}\n"));
    }
    body.push_str(&format!("\nSitemap: {base_url}/sitemap.xml\n"));

    ([(CONTENT_TYPE, "text/plain")], body)
}
