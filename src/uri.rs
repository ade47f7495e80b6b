//! URI expansion and name-mangling helpers.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

/// Characters percent-encoded when a document URI or XLink label is turned
/// into a file stem or blank-node name. Alphanumerics plus `-`, `_` and `.`
/// stay as-is.
const MANGLE_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

pub fn is_http_url(uri: &str) -> bool {
    uri.starts_with("http://") || uri.starts_with("https://")
}

/// Expand a possibly-relative reference against the URI of the document it
/// appeared in. Absolute http(s) references pass through; a bare fragment is
/// appended to the base; everything else resolves RFC-3986 style when the
/// base is a URL, or by plain path arithmetic when it is a local path.
pub fn expand_relative(href: &str, base: &str) -> String {
    if is_http_url(href) {
        return href.to_string();
    }
    if href.starts_with('#') {
        return format!("{base}{href}");
    }
    if let Ok(base_url) = Url::parse(base) {
        if let Ok(joined) = base_url.join(href) {
            return joined.to_string();
        }
    }
    if href.starts_with('/') {
        return href.to_string();
    }
    let dir = match base.rfind('/') {
        Some(i) => &base[..=i],
        None => "",
    };
    normalize_path(&format!("{dir}{href}"))
}

/// Collapse `.` and `..` segments in a path reference, leaving any fragment
/// untouched.
fn normalize_path(path: &str) -> String {
    let (path, fragment) = match path.split_once('#') {
        Some((p, f)) => (p, Some(f)),
        None => (path, None),
    };
    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|s| *s != "..") {
                    segments.pop();
                } else if !absolute {
                    segments.push("..");
                }
            }
            _ => segments.push(seg),
        }
    }
    let mut out = String::new();
    if absolute {
        out.push('/');
    }
    out.push_str(&segments.join("/"));
    if let Some(f) = fragment {
        out.push('#');
        out.push_str(f);
    }
    out
}

/// Output-file stem for a document URI: the basename without its extension,
/// percent-encoded so it is safe as a filename.
pub fn file_stem(uri: &str) -> String {
    let basename = uri.rsplit('/').next().unwrap_or(uri);
    let basename = basename.split('#').next().unwrap_or(basename);
    let stem = match basename.rfind('.') {
        Some(i) if i > 0 => &basename[..i],
        _ => basename,
    };
    utf8_percent_encode(stem, MANGLE_SET).to_string()
}

/// Blank-node name for a locator label that resolved to nothing addressable.
/// A trailing `.` is stripped (labels in the wild often end in one), the rest
/// is percent-encoded into turtle-safe characters.
pub fn synthetic_label(label: &str) -> String {
    let label = label.strip_suffix('.').unwrap_or(label);
    utf8_percent_encode(label, MANGLE_SET).to_string()
}
