//! Exclusion rules for source archives.
//!
//! A rule is either a plain name or a glob:
//!
//! - **Plain name** (no `*`, `?`, `[`, `]`): excludes a file when any of its
//!   path segments equals the name exactly. `node_modules` excludes
//!   `web/node_modules/x.js` but not `node_modules_backup/x.js`.
//! - **Glob**: excludes a file when the pattern matches either its base
//!   name or its full relative path (`/`-separated). `*` also matches `/`,
//!   so `docs/*.md` matches `docs/a/b.md`. `\` is a literal character,
//!   not an escape.
//!
//! Any matching rule excludes the file; rule order never changes the outcome.

use std::ffi::OsStr;
use std::path::{Component, Path};

use globset::{GlobBuilder, GlobMatcher};

/// Patterns excluded when the caller does not provide its own list.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    // Version control
    ".git",
    ".gitmodules",
    ".github",
    // Tool caches and virtual environments
    ".cache",
    ".mypy_cache",
    ".pytest_cache",
    ".venv",
    "venv",
    ".env",
    ".env.local",
    "node_modules",
    ".next",
    ".vercel",
    // Compiled bytecode
    "__pycache__",
    "*.pyc",
    "*.pyo",
    "*.pyd",
    // Editor and OS artifacts
    "*.log",
    "*.tmp",
    "*.swp",
    ".DS_Store",
    // Build output
    "dist",
    "build",
    "coverage",
];

const GLOB_META: &[char] = &['*', '?', '[', ']'];

#[derive(Debug, thiserror::Error)]
pub enum ExcludeError {
    #[error("invalid exclusion pattern {pattern:?}")]
    InvalidPattern {
        pattern: String,
        source: globset::Error,
    },
}

#[derive(Debug, Clone)]
enum Rule {
    Name(String),
    Glob(GlobMatcher),
}

impl Rule {
    fn compile(pattern: &str) -> Result<Self, ExcludeError> {
        if !is_glob(pattern) {
            return Ok(Rule::Name(pattern.to_owned()));
        }
        let glob = GlobBuilder::new(pattern)
            .backslash_escape(false)
            .build()
            .map_err(|e| ExcludeError::InvalidPattern {
                pattern: pattern.to_owned(),
                source: e,
            })?;
        Ok(Rule::Glob(glob.compile_matcher()))
    }

    fn pattern(&self) -> &str {
        match self {
            Rule::Name(name) => name,
            Rule::Glob(matcher) => matcher.glob().glob(),
        }
    }
}

/// An ordered set of exclusion rules.
#[derive(Debug, Clone)]
pub struct ExcludeRules {
    rules: Vec<Rule>,
}

impl Default for ExcludeRules {
    fn default() -> Self {
        Self::defaults()
    }
}

impl ExcludeRules {
    /// Compile a rule set from patterns. Blank patterns are ignored.
    ///
    /// # Errors
    ///
    /// [`ExcludeError::InvalidPattern`] if a glob pattern does not compile
    /// (e.g. an unclosed `[`).
    pub fn new<I, S>(patterns: I) -> Result<Self, ExcludeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rules = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            if pattern.trim().is_empty() {
                continue;
            }
            rules.push(Rule::compile(pattern)?);
        }
        Ok(Self { rules })
    }

    /// The built-in [`DEFAULT_EXCLUDES`].
    pub fn defaults() -> Self {
        let rules = DEFAULT_EXCLUDES
            .iter()
            .filter_map(|pattern| match Rule::compile(pattern) {
                Ok(rule) => Some(rule),
                Err(e) => {
                    tracing::warn!(pattern, error = %e, "skipping built-in exclusion pattern");
                    None
                }
            })
            .collect();
        Self { rules }
    }

    /// A rule set that excludes nothing.
    pub fn none() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Check whether a path relative to the archive root is excluded.
    pub fn is_excluded(&self, relative: &Path) -> bool {
        self.matching_rule(relative).is_some()
    }

    /// The first rule that excludes `relative`, if any.
    pub fn matching_rule(&self, relative: &Path) -> Option<&str> {
        let segments: Vec<&OsStr> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(segment) => Some(segment),
                _ => None,
            })
            .collect();
        let base_name = segments.last()?.to_string_lossy();
        let posix = segments
            .iter()
            .map(|s| s.to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        self.rules
            .iter()
            .find(|rule| match rule {
                Rule::Name(name) => segments.iter().any(|s| *s == OsStr::new(name)),
                Rule::Glob(matcher) => {
                    matcher.is_match(&*base_name) || matcher.is_match(posix.as_str())
                }
            })
            .map(Rule::pattern)
    }

    /// Whether a directory with this name can be skipped entirely.
    ///
    /// Only plain-name rules prune: every file below such a directory
    /// carries the name as a segment. Glob rules are judged per file.
    pub fn prunes_dir(&self, dir_name: &OsStr) -> bool {
        self.rules
            .iter()
            .any(|rule| matches!(rule, Rule::Name(name) if OsStr::new(name) == dir_name))
    }
}

/// Whether a pattern contains glob metacharacters.
pub fn is_glob(pattern: &str) -> bool {
    pattern.contains(GLOB_META)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(patterns: &[&str]) -> ExcludeRules {
        ExcludeRules::new(patterns).unwrap()
    }

    #[test]
    fn glob_detection() {
        assert!(is_glob("*.pyc"));
        assert!(is_glob("file?.txt"));
        assert!(is_glob("[ab].txt"));
        assert!(is_glob("odd]"));
        assert!(!is_glob("node_modules"));
        assert!(!is_glob(".env.local"));
    }

    #[test]
    fn plain_name_matches_any_segment() {
        let r = rules(&["node_modules"]);
        assert!(r.is_excluded(Path::new("node_modules/x.js")));
        assert!(r.is_excluded(Path::new("web/node_modules/pkg/index.js")));
        assert!(r.is_excluded(Path::new("node_modules")));
    }

    #[test]
    fn plain_name_is_not_substring_match() {
        let r = rules(&["build"]);
        assert!(!r.is_excluded(Path::new("builder/main.rs")));
        assert!(!r.is_excluded(Path::new("src/rebuild.rs")));
        assert!(!r.is_excluded(Path::new("build.rs")));
        assert!(r.is_excluded(Path::new("src/build/out.o")));
    }

    #[test]
    fn glob_matches_base_name() {
        let r = rules(&["*.pyc"]);
        assert!(r.is_excluded(Path::new("mod.pyc")));
        assert!(r.is_excluded(Path::new("pkg/sub/mod.pyc")));
        assert!(!r.is_excluded(Path::new("pkg/mod.py")));
    }

    #[test]
    fn glob_matches_full_relative_path() {
        let r = rules(&["docs/*.md"]);
        assert!(r.is_excluded(Path::new("docs/readme.md")));
        // `*` crosses separators
        assert!(r.is_excluded(Path::new("docs/guide/intro.md")));
        assert!(!r.is_excluded(Path::new("src/docs.md")));
    }

    #[test]
    fn glob_is_case_sensitive() {
        let r = rules(&["*.LOG"]);
        assert!(r.is_excluded(Path::new("a.LOG")));
        assert!(!r.is_excluded(Path::new("a.log")));
    }

    #[test]
    fn character_class_and_single_char() {
        let r = rules(&["file[0-9].txt", "?.tmp"]);
        assert!(r.is_excluded(Path::new("file7.txt")));
        assert!(!r.is_excluded(Path::new("fileA.txt")));
        assert!(r.is_excluded(Path::new("x.tmp")));
        assert!(!r.is_excluded(Path::new("xy.tmp")));
    }

    #[test]
    fn matching_rule_reports_first_match() {
        let r = rules(&["*.log", "logs"]);
        assert_eq!(r.matching_rule(Path::new("logs/a.log")), Some("*.log"));
        assert_eq!(r.matching_rule(Path::new("logs/a.txt")), Some("logs"));
        assert_eq!(r.matching_rule(Path::new("src/a.txt")), None);
    }

    #[test]
    fn blank_patterns_ignored() {
        let r = rules(&["", "  ", ".git"]);
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn invalid_glob_is_rejected() {
        let err = ExcludeRules::new(["[unclosed"]).unwrap_err();
        assert!(err.to_string().contains("[unclosed"), "got: {err}");
    }

    #[cfg(unix)]
    #[test]
    fn backslash_is_literal_in_globs() {
        let r = rules(&[r"a\*b"]);
        assert!(r.is_excluded(Path::new(r"a\xb")));
        assert!(r.is_excluded(Path::new(r"a\b")));
        assert!(!r.is_excluded(Path::new("a*b")));
    }

    #[test]
    fn every_default_pattern_compiles() {
        for pattern in DEFAULT_EXCLUDES {
            assert!(Rule::compile(pattern).is_ok(), "{pattern} should compile");
        }
    }

    #[test]
    fn defaults_cover_common_artifacts() {
        let r = ExcludeRules::defaults();
        assert_eq!(r.len(), DEFAULT_EXCLUDES.len());
        for path in [
            ".git/config",
            "node_modules/x.js",
            "app/__pycache__/m.cpython-312.pyc",
            "server.log",
            ".DS_Store",
            "dist/bundle.js",
            ".env",
            ".venv/bin/python",
        ] {
            assert!(r.is_excluded(Path::new(path)), "{path} should be excluded");
        }
        for path in ["a.txt", "src/main.py", "package.json", ".envrc"] {
            assert!(!r.is_excluded(Path::new(path)), "{path} should be kept");
        }
    }

    #[test]
    fn none_excludes_nothing() {
        let r = ExcludeRules::none();
        assert!(r.is_empty());
        assert!(!r.is_excluded(Path::new(".git/config")));
    }

    #[test]
    fn prunes_only_plain_names() {
        let r = rules(&["node_modules", "*.egg-info"]);
        assert!(r.prunes_dir(OsStr::new("node_modules")));
        assert!(!r.prunes_dir(OsStr::new("pkg.egg-info")));
        assert!(!r.prunes_dir(OsStr::new("src")));
    }

    // ── Property-based tests ──

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn segment() -> impl Strategy<Value = String> {
            "[a-z_.]{1,8}".prop_filter("not a relative marker", |s| s != "." && s != "..")
        }

        fn rel_path() -> impl Strategy<Value = Vec<String>> {
            proptest::collection::vec(segment(), 1..5)
        }

        proptest! {
            #[test]
            fn plain_rule_excludes_iff_segment_equal(
                name in segment(),
                parts in rel_path(),
            ) {
                let r = ExcludeRules::new([name.as_str()]).unwrap();
                let path = parts.join("/");
                let expected = parts.iter().any(|p| *p == name);
                prop_assert_eq!(r.is_excluded(Path::new(&path)), expected);
            }

            #[test]
            fn rule_order_does_not_matter(
                parts in rel_path(),
                patterns in proptest::collection::vec(
                    prop_oneof![segment(), segment().prop_map(|s| format!("*{s}"))],
                    0..5,
                ),
            ) {
                let path = parts.join("/");
                let forward = ExcludeRules::new(&patterns).unwrap().is_excluded(Path::new(&path));
                let mut patterns = patterns;
                patterns.reverse();
                let backward = ExcludeRules::new(&patterns).unwrap().is_excluded(Path::new(&path));
                prop_assert_eq!(forward, backward);
            }

            #[test]
            fn suffix_glob_matches_base_name(
                parts in rel_path(),
                ext in "[a-z]{1,4}",
            ) {
                let r = ExcludeRules::new([format!("*.{ext}")]).unwrap();
                let mut parts = parts;
                let last = parts.len() - 1;
                parts[last] = format!("{}.{ext}", parts[last]);
                prop_assert!(r.is_excluded(Path::new(&parts.join("/"))));
            }
        }
    }
}
