use super::types::{AbsoluteFsPath, PathSegment};
use once_cell::sync::Lazy;
use regex::Regex;

static TS_DTS_JS_EXTENSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.d\.ts$|\.ts$|\.js$").unwrap());

/// Convert Windows-style separators to POSIX separators.
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Remove a .ts, .d.ts, or .js extension from a file name.
pub fn strip_extension(path: &str) -> String {
    TS_DTS_JS_EXTENSION.replace(path, "").to_string()
}

/// Collapses `.` and `..` segments and duplicate separators.
pub fn clean_path(path: &str) -> String {
    let normalized = normalize_separators(path);
    let is_absolute = normalized.starts_with('/');

    let mut segments: Vec<&str> = Vec::new();
    for segment in normalized.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    let joined = segments.join("/");
    if is_absolute {
        format!("/{}", joined)
    } else {
        joined
    }
}

pub fn dirname(file: &str) -> String {
    let normalized = normalize_separators(file);
    match normalized.rfind('/') {
        Some(0) => "/".to_string(),
        Some(idx) => normalized[..idx].to_string(),
        None => ".".to_string(),
    }
}

pub fn join(base_path: &str, paths: &[&str]) -> String {
    let mut result = normalize_separators(base_path);
    for path in paths {
        if !result.ends_with('/') {
            result.push('/');
        }
        result.push_str(&normalize_separators(path));
    }
    clean_path(&result)
}

/// Resolves a module specifier relative to the directory of `from`.
pub fn resolve_relative(from: &AbsoluteFsPath, specifier: &str) -> AbsoluteFsPath {
    AbsoluteFsPath::new(join(&dirname(from.as_str()), &[specifier]))
}

pub fn basename(file_path: &str, extension: Option<&str>) -> PathSegment {
    let normalized = normalize_separators(file_path);
    let base = normalized.rsplit('/').next().unwrap_or("");
    let base = match extension {
        Some(ext) => base.strip_suffix(ext).unwrap_or(base),
        None => base,
    };
    PathSegment::new(base.to_string())
}

pub fn is_local_relative_path(relative_path: &str) -> bool {
    !relative_path.starts_with('/') && !relative_path.starts_with("..")
}

/// Module specifier for importing `to` from `from`, without the file extension.
pub fn relative_import(from: &AbsoluteFsPath, to: &AbsoluteFsPath) -> String {
    let from_dir = dirname(from.as_str());
    let from_segments: Vec<&str> = from_dir.split('/').filter(|s| !s.is_empty()).collect();
    let to_clean = strip_extension(to.as_str());
    let to_segments: Vec<&str> = to_clean.split('/').filter(|s| !s.is_empty()).collect();

    let common = from_segments
        .iter()
        .zip(to_segments.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = vec![".."; from_segments.len() - common];
    parts.extend(&to_segments[common..]);
    let relative = parts.join("/");

    if is_local_relative_path(&relative) {
        format!("./{}", relative)
    } else {
        relative
    }
}
