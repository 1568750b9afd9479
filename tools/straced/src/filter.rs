//! The Filter Engine (spec §4.8): compiles a `-e trace=` expression into a
//! predicate evaluated at entry-hit, before any expensive argument
//! materialization happens.

use crate::registry::{Category, SyscallSchema};

/// A compiled `--trace`/`-e` filter expression.
///
/// `None` fields mean "no restriction of that kind"; an empty filter (no
/// names, no categories) accepts everything, matching the tool's default
/// of tracing every syscall.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    names: Vec<String>,
    categories: Vec<Category>,
}

impl Filter {
    /// The default, unrestricted filter: every syscall is accepted.
    #[must_use]
    pub fn accept_all() -> Self {
        Self::default()
    }

    /// Parse a comma-separated `-e trace=` spec: syscall names and/or
    /// category tags, freely mixed (spec §4.8).
    ///
    /// # Errors
    ///
    /// Returns a usage-error message if a token is neither a known
    /// category tag nor looks like a syscall name the caller can later
    /// resolve — this function doesn't validate names against the
    /// Registry itself (that happens once at the call site, which has
    /// access to it), only rejects empty tokens from malformed input like
    /// `"open,,close"`.
    pub fn parse(spec: &str) -> Result<Self, String> {
        let mut names = Vec::new();
        let mut categories = Vec::new();
        for raw in spec.split(',') {
            let token = raw.trim();
            if token.is_empty() {
                return Err(format!("empty token in trace spec {spec:?}"));
            }
            if let Some(category) = Category::parse(token) {
                categories.push(category);
            } else {
                names.push(token.to_ascii_lowercase());
            }
        }
        Ok(Self { names, categories })
    }

    /// `true` if this filter imposes no restriction at all.
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.names.is_empty() && self.categories.is_empty()
    }

    /// Decide whether `schema` should be traced.
    ///
    /// Evaluated against a known [`SyscallSchema`] — the entry-hit path
    /// always has one by the time it calls this (spec §4.10: unknown
    /// numbers degrade to raw rendering but are never filtered out, since
    /// there is no name or category to filter on).
    #[must_use]
    pub fn accepts(&self, schema: &SyscallSchema) -> bool {
        if self.is_unrestricted() {
            return true;
        }
        self.names.iter().any(|n| n == schema.name) || self.categories.contains(&schema.category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;

    #[test]
    fn unrestricted_filter_accepts_everything() {
        let registry = Registry::build();
        let filter = Filter::accept_all();
        for schema in registry.iter() {
            assert!(filter.accepts(schema));
        }
    }

    #[test]
    fn name_list_accepts_only_named_syscalls() {
        let registry = Registry::build();
        let filter = Filter::parse("open,openat").unwrap();
        assert!(filter.accepts(registry.lookup_by_name("open").unwrap()));
        assert!(filter.accepts(registry.lookup_by_name("openat").unwrap()));
        assert!(!filter.accepts(registry.lookup_by_name("close").unwrap()));
    }

    #[test]
    fn category_accepts_every_syscall_in_that_category() {
        let registry = Registry::build();
        let filter = Filter::parse("network").unwrap();
        assert!(filter.accepts(registry.lookup_by_name("socket").unwrap()));
        assert!(filter.accepts(registry.lookup_by_name("connect").unwrap()));
        assert!(!filter.accepts(registry.lookup_by_name("open").unwrap()));
    }

    #[test]
    fn mixed_names_and_categories() {
        let registry = Registry::build();
        let filter = Filter::parse("open,network").unwrap();
        assert!(filter.accepts(registry.lookup_by_name("open").unwrap()));
        assert!(filter.accepts(registry.lookup_by_name("socket").unwrap()));
        assert!(!filter.accepts(registry.lookup_by_name("close").unwrap()));
    }

    #[test]
    fn empty_token_is_rejected() {
        assert!(Filter::parse("open,,close").is_err());
    }
}
