//! Include resolution.
//!
//! The parser never touches the filesystem itself: `include::` directives are
//! handed to a [`ContentResolver`] supplied by the caller through a
//! [`ParserContext`].

use std::path::{Path, PathBuf};

/// Content returned for an include reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolved {
    /// Resolved location, used as the parent of includes nested inside it.
    pub path: PathBuf,
    /// Content split into lines, without line terminators.
    pub lines: Vec<String>,
}

impl Resolved {
    /// Split `content` into lines.
    pub fn from_content(path: impl Into<PathBuf>, content: &str) -> Self {
        Self {
            path: path.into(),
            lines: content.lines().map(str::to_owned).collect(),
        }
    }
}

/// Resolves include references to content.
///
/// `parent` is the path of the file containing the include (`None` for the
/// root source), so relative references can be resolved against it.
/// Implementations may be called many times per parse; no caching is expected.
///
/// Closures with the same signature implement this trait.
pub trait ContentResolver {
    fn resolve(
        &self,
        parent: Option<&Path>,
        reference: &str,
        encoding: Option<&str>,
    ) -> Option<Resolved>;
}

impl<F> ContentResolver for F
where
    F: Fn(Option<&Path>, &str, Option<&str>) -> Option<Resolved>,
{
    fn resolve(
        &self,
        parent: Option<&Path>,
        reference: &str,
        encoding: Option<&str>,
    ) -> Option<Resolved> {
        self(parent, reference, encoding)
    }
}

/// Resolver that never resolves anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopContentResolver;

impl ContentResolver for NoopContentResolver {
    fn resolve(&self, _: Option<&Path>, _: &str, _: Option<&str>) -> Option<Resolved> {
        None
    }
}

/// Filesystem resolver.
///
/// Relative references resolve against the directory of the including file,
/// or `base_dir` for the root source. Resolved paths must stay inside
/// `base_dir`.
///
/// # Example
///
/// ```
/// use adoc_parser::{ContentResolver, FsContentResolver};
///
/// let resolver = FsContentResolver::new(".");
/// assert!(resolver.resolve(None, "../../etc/passwd", None).is_none());
/// ```
#[derive(Clone, Debug)]
pub struct FsContentResolver {
    base_dir: PathBuf,
}

impl FsContentResolver {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Join `reference` onto the parent directory, rejecting paths escaping
    /// `base_dir`. Returns `None` if the file does not exist.
    fn locate(&self, parent: Option<&Path>, reference: &str) -> Option<PathBuf> {
        let dir = parent
            .and_then(Path::parent)
            .map_or_else(|| self.base_dir.clone(), Path::to_path_buf);
        let resolved = dir.join(reference);

        let canonical = resolved.canonicalize().ok()?;
        let canonical_base = self.base_dir.canonicalize().ok()?;

        if canonical.starts_with(&canonical_base) {
            Some(canonical)
        } else {
            tracing::warn!(reference, "Include escapes base directory, ignoring");
            None
        }
    }
}

impl ContentResolver for FsContentResolver {
    fn resolve(
        &self,
        parent: Option<&Path>,
        reference: &str,
        encoding: Option<&str>,
    ) -> Option<Resolved> {
        let path = self.locate(parent, reference)?;
        if let Some(encoding) = encoding
            && !encoding.eq_ignore_ascii_case("utf-8")
            && !encoding.eq_ignore_ascii_case("utf8")
        {
            tracing::debug!(encoding, path = %path.display(), "Reading include as UTF-8");
        }

        match std::fs::read(&path) {
            Ok(bytes) => {
                let content = String::from_utf8_lossy(&bytes);
                Some(Resolved::from_content(path, &content))
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read include");
                None
            }
        }
    }
}

/// Capabilities available during one [`Parser::parse`](crate::Parser::parse) call.
#[derive(Clone, Copy)]
pub struct ParserContext<'a> {
    resolver: &'a dyn ContentResolver,
}

impl<'a> ParserContext<'a> {
    pub fn new(resolver: &'a dyn ContentResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &'a dyn ContentResolver {
        self.resolver
    }
}

impl Default for ParserContext<'static> {
    fn default() -> Self {
        Self::new(&NoopContentResolver)
    }
}

impl std::fmt::Debug for ParserContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserContext").finish_non_exhaustive()
    }
}
