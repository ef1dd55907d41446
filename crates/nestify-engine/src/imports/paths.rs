//! Module specifier rewriting.

use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

static INTERNAL_MODULE_PREFIX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(?:.*/)?src/modules/[^/]+").ok());

/// `src/modules/users/users.service` -> `./users.service`.
/// Returns `None` when the specifier does not point into a module directory.
pub fn rewrite_internal_module_path(specifier: &str) -> Option<String> {
    let re = INTERNAL_MODULE_PREFIX.as_ref()?;
    if !re.is_match(specifier) {
        return None;
    }
    Some(re.replace(specifier, ".").into_owned())
}

/// Re-express a relative specifier written in `from_dir` so that it resolves
/// to the same file from `to_dir`. Package specifiers are returned as-is.
pub fn rebase_relative_specifier(specifier: &str, from_dir: &Path, to_dir: &Path) -> String {
    if !(specifier.starts_with("./") || specifier.starts_with("../") || specifier == "." || specifier == "..") {
        return specifier.to_string();
    }
    let target = normalize(&from_dir.join(specifier));
    let to = normalize(to_dir);

    let target_parts: Vec<Component> = target.components().collect();
    let to_parts: Vec<Component> = to.components().collect();
    let common = target_parts
        .iter()
        .zip(to_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut segments: Vec<String> = Vec::new();
    for _ in common..to_parts.len() {
        segments.push("..".to_string());
    }
    for part in &target_parts[common..] {
        segments.push(part.as_os_str().to_string_lossy().into_owned());
    }

    if segments.is_empty() {
        return ".".to_string();
    }
    let joined = segments.join("/");
    if joined.starts_with("..") {
        joined
    } else {
        format!("./{joined}")
    }
}

/// Lexically resolve `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
