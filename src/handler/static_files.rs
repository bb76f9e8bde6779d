//! Static file serving module
//!
//! Maps the request path onto the served directory and answers with file
//! content, a redirect, or an HTML index of a directory.

use crate::handler::router::RequestContext;
use crate::http::{self, cache::Validators, mime, range::RangeParseResult};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::fs::Metadata;
use std::io::SeekFrom;
use std::path::{Component, Path, PathBuf};
use std::time::UNIX_EPOCH;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

const INDEX_FILE: &str = "index.html";

/// Characters escaped in directory listing links
const HREF_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Serve the request path from `root`
pub async fn serve(ctx: &RequestContext<'_>, root: &Path) -> Response<Full<Bytes>> {
    let Some(target) = resolve_path(root, ctx.path).await else {
        return http::build_404_response();
    };

    let metadata = match fs::metadata(&target).await {
        Ok(m) => m,
        Err(_) => return http::build_404_response(),
    };

    if !metadata.is_dir() {
        return serve_file(ctx, &target, &metadata).await;
    }

    if !ctx.path.ends_with('/') {
        let location = match ctx.query {
            Some(q) => format!("{}/?{q}", ctx.raw_path),
            None => format!("{}/", ctx.raw_path),
        };
        return http::build_redirect_response(&location);
    }

    let index = target.join(INDEX_FILE);
    if let Ok(index_meta) = fs::metadata(&index).await {
        if index_meta.is_file() {
            return serve_file(ctx, &index, &index_meta).await;
        }
    }

    serve_directory_index(ctx, &target).await
}

/// Resolve a decoded request path to a location inside `root`.
///
/// Parent components and symlinks that lead outside `root` resolve to `None`.
pub async fn resolve_path(root: &Path, request_path: &str) -> Option<PathBuf> {
    let relative = Path::new(request_path.trim_start_matches('/'));
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        logger::log_warning(&format!("Path traversal attempt blocked: {request_path}"));
        return None;
    }

    let root_canonical = match fs::canonicalize(root).await {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Served directory not accessible '{}': {e}",
                root.display()
            ));
            return None;
        }
    };

    // Missing files are the common 404 case, no need to log
    let canonical = fs::canonicalize(root_canonical.join(relative)).await.ok()?;
    if canonical.starts_with(&root_canonical) {
        Some(canonical)
    } else {
        logger::log_warning(&format!(
            "Symlink outside served directory blocked: {request_path} -> {}",
            canonical.display()
        ));
        None
    }
}

/// Serve a regular file with conditional and Range support
async fn serve_file(
    ctx: &RequestContext<'_>,
    path: &Path,
    metadata: &Metadata,
) -> Response<Full<Bytes>> {
    let file_size = metadata.len();
    let validators = Validators::new(file_size, metadata.modified().unwrap_or(UNIX_EPOCH));

    if validators.not_modified(ctx.if_none_match.as_deref(), ctx.if_modified_since.as_deref()) {
        return http::build_304_response(&validators);
    }

    let range = match http::parse_range_header(ctx.range_header.as_deref(), file_size) {
        RangeParseResult::Valid(range) => Some(range),
        RangeParseResult::NotSatisfiable => return http::build_416_response(file_size),
        RangeParseResult::None => None,
    };

    let data = if ctx.is_head {
        Bytes::new()
    } else {
        let (start, length) = range.map_or((0, file_size), |r| (r.start, r.length()));
        match read_span(path, start, length).await {
            Ok(data) => data,
            Err(e) => {
                logger::log_error(&format!("Failed to read file '{}': {e}", path.display()));
                return http::build_text_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &format!("failed to read {}: {e}", ctx.path),
                );
            }
        }
    };

    http::response::build_file_response(
        data,
        mime::content_type_for(path),
        &validators,
        file_size,
        range,
    )
}

/// Read `length` bytes starting at `start`
async fn read_span(path: &Path, start: u64, length: u64) -> std::io::Result<Bytes> {
    let mut file = fs::File::open(path).await?;
    if start > 0 {
        file.seek(SeekFrom::Start(start)).await?;
    }
    let mut data = Vec::with_capacity(usize::try_from(length).unwrap_or(0));
    file.take(length).read_to_end(&mut data).await?;
    Ok(Bytes::from(data))
}

/// Render an HTML index of a directory, entries sorted by name
async fn serve_directory_index(ctx: &RequestContext<'_>, dir: &Path) -> Response<Full<Bytes>> {
    let names = match read_dir_names(dir).await {
        Ok(names) => names,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read directory '{}': {e}",
                dir.display()
            ));
            return http::build_text_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error reading directory",
            );
        }
    };

    http::build_html_response(render_directory_index(&names), ctx.is_head)
}

async fn read_dir_names(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut entries = fs::read_dir(dir).await?;
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        // Names that are not UTF-8 cannot be linked to
        let Ok(mut name) = entry.file_name().into_string() else {
            continue;
        };
        if entry.file_type().await?.is_dir() {
            name.push('/');
        }
        names.push(name);
    }
    names.sort();
    Ok(names)
}

/// Directory index page, one link per entry
pub fn render_directory_index(names: &[String]) -> String {
    let mut html = String::from("<!doctype html>\n<meta name=\"viewport\" content=\"width=device-width\">\n<pre>\n");
    for name in names {
        html.push_str(&format!(
            "<a href=\"{}\">{}</a>\n",
            utf8_percent_encode(name, HREF_ENCODE_SET),
            escape_html(name)
        ));
    }
    html.push_str("</pre>\n");
    html
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&#34;")
        .replace('\'', "&#39;")
}
