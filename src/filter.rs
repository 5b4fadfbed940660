use globset::{Glob, GlobMatcher};
use regex::Regex;
use std::path::Path;

use crate::error::{PluginError, Result};
use crate::options::FilterPattern;

pub const DEFAULT_INCLUDE: &[&str] =
    &[r"\.(vue|svelte|[jt]sx?|mdx?|astro|elm|php|phtml|html)($|\?)"];

pub const DEFAULT_EXCLUDE: &[&str] = &[
    r"\.(css|postcss|sass|scss|less|stylus|styl)($|\?)",
    r"[/\\]node_modules[/\\]",
    r"[/\\]\.git[/\\]",
];

#[derive(Debug, Clone)]
enum Matcher {
    Glob(GlobMatcher),
    Regex(Regex),
}

impl Matcher {
    fn compile(pattern: &FilterPattern, base: &str) -> Result<Self> {
        match pattern {
            FilterPattern::Glob(glob) => Glob::new(&anchor_glob(glob, base))
                .map(|g| Matcher::Glob(g.compile_matcher()))
                .map_err(|e| PluginError::InvalidPattern {
                    pattern: glob.clone(),
                    reason: e.to_string(),
                }),
            FilterPattern::Regex { regex } => Regex::new(regex)
                .map(Matcher::Regex)
                .map_err(|e| PluginError::InvalidPattern {
                    pattern: regex.clone(),
                    reason: e.to_string(),
                }),
        }
    }

    fn is_match(&self, id: &str, normalized: &str) -> bool {
        match self {
            Matcher::Glob(glob) => glob.is_match(normalized),
            Matcher::Regex(re) => re.is_match(id),
        }
    }
}

/// Decides which module ids are candidates for transformation.
///
/// Excludes win over includes; an empty include list accepts everything
/// that is not excluded.
#[derive(Debug, Clone)]
pub struct FileFilter {
    include: Vec<Matcher>,
    exclude: Vec<Matcher>,
}

impl FileFilter {
    /// Relative globs are anchored at the process working directory.
    pub fn new(
        include: Option<&[FilterPattern]>,
        exclude: Option<&[FilterPattern]>,
    ) -> Result<Self> {
        let base = std::env::current_dir().unwrap_or_default();
        Self::with_base(include, exclude, &base)
    }

    pub fn with_base(
        include: Option<&[FilterPattern]>,
        exclude: Option<&[FilterPattern]>,
        base: &Path,
    ) -> Result<Self> {
        let base = base.to_string_lossy().replace('\\', "/");
        Ok(FileFilter {
            include: compile_all(include, DEFAULT_INCLUDE, &base)?,
            exclude: compile_all(exclude, DEFAULT_EXCLUDE, &base)?,
        })
    }

    pub fn matches(&self, id: &str) -> bool {
        let normalized = id.replace('\\', "/");
        if self.exclude.iter().any(|m| m.is_match(id, &normalized)) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|m| m.is_match(id, &normalized))
    }
}

/// Globs match absolute ids, so a relative glob is joined onto `base`.
/// Absolute globs and globs starting with `**` are left as they are.
fn anchor_glob(glob: &str, base: &str) -> String {
    if base.is_empty()
        || glob.starts_with("**")
        || glob.starts_with('/')
        || Path::new(glob).is_absolute()
    {
        return glob.to_string();
    }
    let relative = glob.strip_prefix("./").unwrap_or(glob);
    format!("{}/{}", globset::escape(base.trim_end_matches('/')), relative)
}

fn compile_all(
    patterns: Option<&[FilterPattern]>,
    defaults: &[&str],
    base: &str,
) -> Result<Vec<Matcher>> {
    match patterns {
        Some(patterns) => patterns.iter().map(|p| Matcher::compile(p, base)).collect(),
        None => defaults
            .iter()
            .map(|re| {
                Matcher::compile(
                    &FilterPattern::Regex {
                        regex: re.to_string(),
                    },
                    base,
                )
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_filter() -> FileFilter {
        FileFilter::new(None, None).unwrap()
    }

    #[test]
    fn test_defaults_accept_sources() {
        let filter = default_filter();
        for id in [
            "/app/src/a.ts",
            "/app/src/App.vue",
            "/app/src/App.vue?vue&type=script&lang.ts",
            "/app/src/page.tsx",
            "/app/src/page.jsx",
            "/app/src/main.js",
            "/app/src/Card.svelte",
            "/app/docs/intro.mdx",
            "/app/index.html",
        ] {
            assert!(filter.matches(id), "{} should be included", id);
        }
    }

    #[test]
    fn test_defaults_reject_styles_and_vendor() {
        let filter = default_filter();
        for id in [
            "/app/src/main.css",
            "/app/src/theme.scss",
            "/app/src/App.vue?vue&type=style&index=0&lang.less",
            "/app/node_modules/pkg/index.js",
            "C:\\app\\node_modules\\pkg\\index.js",
            "/app/.git/hooks/pre-commit.js",
            "/app/src/data.json",
        ] {
            assert!(!filter.matches(id), "{} should be excluded", id);
        }
    }

    #[test]
    fn test_glob_include() {
        let include = vec![FilterPattern::Glob("**/components/**/*.rs".into())];
        let filter = FileFilter::new(Some(include.as_slice()), None).unwrap();
        assert!(filter.matches("/app/src/components/button.rs"));
        assert!(filter.matches("C:\\app\\src\\components\\nav\\menu.rs"));
        assert!(!filter.matches("/app/src/pages/home.rs"));
    }

    #[test]
    fn test_relative_glob_anchored_at_base() {
        let include = vec![FilterPattern::Glob("src/**/*.tsx".into())];
        let filter =
            FileFilter::with_base(Some(include.as_slice()), None, Path::new("/app")).unwrap();
        assert!(filter.matches("/app/src/a.tsx"));
        assert!(filter.matches("/app/src/pages/home.tsx"));
        assert!(!filter.matches("/other/src/a.tsx"));
        assert!(!filter.matches("/app/lib/a.tsx"));
    }

    #[test]
    fn test_dot_slash_glob_and_special_base() {
        let include = vec![FilterPattern::Glob("./src/*.ts".into())];
        let filter =
            FileFilter::with_base(Some(include.as_slice()), None, Path::new("/work/[app]/"))
                .unwrap();
        assert!(filter.matches("/work/[app]/src/main.ts"));
        assert!(!filter.matches("/work/a/src/main.ts"));
    }

    #[test]
    fn test_anchor_glob() {
        assert_eq!(anchor_glob("src/*.ts", "/app"), "/app/src/*.ts");
        assert_eq!(anchor_glob("**/*.ts", "/app"), "**/*.ts");
        assert_eq!(anchor_glob("/abs/*.ts", "/app"), "/abs/*.ts");
        assert_eq!(anchor_glob("src/*.ts", ""), "src/*.ts");
    }

    #[test]
    fn test_empty_include_accepts_all_not_excluded() {
        let exclude = vec![FilterPattern::Glob("**/*.spec.ts".into())];
        let filter = FileFilter::new(Some(&[][..]), Some(exclude.as_slice())).unwrap();
        assert!(filter.matches("/app/src/a.json"));
        assert!(!filter.matches("/app/src/a.spec.ts"));
    }

    #[test]
    fn test_exclude_wins() {
        let include = vec![FilterPattern::Regex {
            regex: r"\.ts$".into(),
        }];
        let exclude = vec![FilterPattern::Regex {
            regex: "generated".into(),
        }];
        let filter =
            FileFilter::new(Some(include.as_slice()), Some(exclude.as_slice())).unwrap();
        assert!(filter.matches("/app/src/a.ts"));
        assert!(!filter.matches("/app/src/generated/a.ts"));
    }

    #[test]
    fn test_invalid_pattern() {
        let include = vec![FilterPattern::Regex { regex: "(".into() }];
        let err = FileFilter::new(Some(include.as_slice()), None).unwrap_err();
        assert!(matches!(err, PluginError::InvalidPattern { ref pattern, .. } if pattern == "("));
    }
}
