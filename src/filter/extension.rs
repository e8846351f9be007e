//! File extension allow-list.

use std::collections::BTreeSet;
use std::path::Path;

/// Extensions admitted when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    ".zip", ".tar", ".gz", ".7z", ".rar", ".xls", ".xlsx", ".csv", ".txt", ".doc", ".docx",
];

/// A normalized, deduplicated set of allowed extensions.
///
/// Entries are stored lower-case with a leading dot, so `"CSV"`, `"csv"`
/// and `".Csv"` all collapse to `".csv"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionPolicy {
    allowed: BTreeSet<String>,
}

impl ExtensionPolicy {
    /// Build a policy from user-supplied extensions. Blank entries are dropped.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = extensions
            .into_iter()
            .filter_map(|e| normalize(e.as_ref()))
            .collect();
        Self { allowed }
    }

    /// Whether a file name's extension is admitted.
    pub fn allows_file(&self, file_name: &str) -> bool {
        extension_of(file_name).is_some_and(|ext| is_allowed(&ext, &self.allowed))
    }

    /// The normalized allowed set.
    pub fn allowed(&self) -> &BTreeSet<String> {
        &self.allowed
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}

impl Default for ExtensionPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS)
    }
}

impl std::fmt::Display for ExtensionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined: Vec<&str> = self.allowed.iter().map(String::as_str).collect();
        write!(f, "{}", joined.join(" "))
    }
}

/// Case-insensitive membership test. An empty extension is never allowed.
pub fn is_allowed(extension: &str, allowed: &BTreeSet<String>) -> bool {
    let ext = extension.trim().to_lowercase();
    if ext.is_empty() || ext == "." {
        return false;
    }
    allowed.iter().any(|a| a.to_lowercase() == ext)
}

/// Lower-cased final suffix of a file name, including the dot.
///
/// `"Report.TAR.GZ"` yields `".gz"`. Hidden-file names like `".env"` and
/// names ending in a dot have no extension.
pub fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| format!(".{}", e.to_lowercase()))
}

fn normalize(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        return None;
    }
    Some(format!(".{}", trimmed.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_is_allowed_case_insensitive() {
        let allowed = set(&[".csv", ".zip"]);
        for ext in [".csv", ".CSV", ".Csv", ".zip", ".ZIP"] {
            assert_eq!(
                is_allowed(ext, &allowed),
                is_allowed(&ext.to_uppercase(), &allowed),
                "{ext}"
            );
            assert!(is_allowed(ext, &allowed));
        }
    }

    #[test]
    fn test_upper_case_allowed_set() {
        assert!(is_allowed(".csv", &set(&[".CSV"])));
    }

    #[test]
    fn test_empty_extension_never_allowed() {
        assert!(!is_allowed("", &set(&[".csv"])));
        assert!(!is_allowed("", &set(&[""])));
        assert!(!is_allowed(".", &set(&["."])));
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("report.csv").as_deref(), Some(".csv"));
        assert_eq!(extension_of("Report.TAR.GZ").as_deref(), Some(".gz"));
        assert_eq!(extension_of("README"), None);
        assert_eq!(extension_of(".env"), None);
        assert_eq!(extension_of("trailing."), None);
    }

    #[test]
    fn test_policy_normalizes_and_dedups() {
        let policy = ExtensionPolicy::new(["CSV", ".csv", " .Zip ", "", "."]);
        assert_eq!(policy.allowed(), &set(&[".csv", ".zip"]));
        assert!(policy.allows_file("DATA.CSV"));
        assert!(!policy.allows_file("setup.exe"));
    }

    #[test]
    fn test_default_policy() {
        let policy = ExtensionPolicy::default();
        assert_eq!(policy.allowed().len(), DEFAULT_EXTENSIONS.len());
        assert!(policy.allows_file("dump.7z"));
        assert!(policy.allows_file("sheet.XLSX"));
        assert!(!policy.allows_file("movie.mp4"));
    }
}
