//! File-name and package-name templates.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{(flavor|version|fileType)\}").expect("placeholder regex is valid")
});

/// Substitute `{flavor}`, `{version}` and `{fileType}` in one pass.
///
/// Substituted values are never scanned again, and any other `{...}` text is
/// left as written.
pub fn render_template(pattern: &str, flavor: &str, version: &str, file_type: &str) -> String {
    PLACEHOLDER
        .replace_all(pattern, |caps: &Captures<'_>| match &caps[1] {
            "flavor" => flavor.to_string(),
            "version" => version.to_string(),
            _ => file_type.to_string(),
        })
        .into_owned()
}

/// Substitute `{flavor}` only; package names take no version or file type
pub fn render_package_name(pattern: &str, flavor: &str) -> String {
    pattern.replace("{flavor}", flavor)
}
