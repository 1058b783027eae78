//! Path normalisation and traversal defence for user-supplied object paths.
//!
//! Two independent checks live here:
//! - [`is_malicious`] is the boundary check. Handlers call it on the raw request
//!   value and reject with a validation error before anything touches the store.
//! - [`sanitize`] normalises a path into a safe object key (or `""` for the root)
//!   and returns `""` for anything it refuses. The catalog runs it again on every
//!   path it receives, so no code path reaches the store with an unsafe key even
//!   when the boundary check was skipped.

/// Encoded sequences that must never survive sanitisation. Matched case-insensitively.
const SUSPICIOUS_SEQUENCES: [&str; 5] = ["../", "..\\", "\0", "%00", "%2e%2e"];

/// Normalise `raw` into a safe, relative object path.
///
/// Returns `""` both for the root and for any rejected input; callers that need a
/// non-root path must treat an empty result for a non-empty input as a rejection.
pub fn sanitize(raw: &str) -> String {
    let path = raw.replace('\0', "");

    if path.contains("..") || path.contains('\\') || path.starts_with('/') || is_drive_path(&path)
    {
        return String::new();
    }

    let path = path.trim_start_matches('/');
    let path = collapse_slashes(path);
    let path = strip_parent_refs(&path);
    let path = path.trim();

    if path.is_empty() {
        return String::new();
    }

    if !path.chars().next().is_some_and(|c| c.is_ascii_alphanumeric()) {
        return String::new();
    }

    let lowered = path.to_ascii_lowercase();
    if SUSPICIOUS_SEQUENCES.iter().any(|seq| lowered.contains(seq)) {
        return String::new();
    }

    path.to_string()
}

/// Boundary check for obviously hostile input.
///
/// Flags traversal (`..`), null bytes (raw or `%00`), encoded traversal (`%2e%2e`),
/// absolute Unix paths, Windows drive paths and backslashes.
pub fn is_malicious(raw: &str) -> bool {
    if raw.contains("..") {
        return true;
    }
    if raw.contains('\0') || raw.contains("%00") {
        return true;
    }
    if raw.to_ascii_lowercase().contains("%2e%2e") {
        return true;
    }
    if raw.starts_with('/') || is_drive_path(raw) {
        return true;
    }
    raw.contains('\\')
}

/// Returns the final segment of a slash-separated path.
pub fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Returns everything before the final `/`, or `""` for a root-level path.
pub fn parent_path(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Joins a folder path and a relative name, treating `""` as the root.
pub fn join_path(folder: &str, name: &str) -> String {
    let folder = folder.trim_end_matches('/');
    if folder.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", folder, name)
    }
}

/// `C:\...` style absolute paths.
fn is_drive_path(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && bytes[2] == b'\\'
}

fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut previous_slash = false;
    for c in path.chars() {
        if c == '/' {
            if !previous_slash {
                out.push(c);
            }
            previous_slash = true;
        } else {
            out.push(c);
            previous_slash = false;
        }
    }
    out
}

fn strip_parent_refs(path: &str) -> String {
    let mut out = path.replace("../", "");
    while out.ends_with("..") {
        out.truncate(out.len() - 2);
    }
    out
}
