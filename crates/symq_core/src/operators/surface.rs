use std::collections::HashMap;
use std::sync::LazyLock;

use super::OperatorDescriptor;
use super::builtin;

/// Name of the declarative operator surface request builders target.
pub const QUERY_SURFACE: &str = "query";

/// Name of the concrete operator surface declarative calls resolve to.
pub const SEQUENCE_SURFACE: &str = "sequence";

/// Ordered set of operator descriptors sharing a surface.
///
/// Declaration order is preserved and observable: resolution takes the first
/// matching candidate, not the best one.
#[derive(Debug, Default)]
pub struct SurfaceTable {
    descriptors: Vec<OperatorDescriptor>,
    by_name: HashMap<&'static str, Vec<usize>>,
}

impl SurfaceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, descriptor: OperatorDescriptor) {
        let idx = self.descriptors.len();
        self.by_name.entry(descriptor.name).or_default().push(idx);
        self.descriptors.push(descriptor);
    }

    /// Candidates for a name, in declaration order.
    pub fn candidates<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a OperatorDescriptor> {
        self.by_name
            .get(name)
            .map(|indices| indices.as_slice())
            .unwrap_or_default()
            .iter()
            .map(|&idx| &self.descriptors[idx])
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Registration table mapping surface name to its operator descriptors.
///
/// This replaces runtime reflection over the concrete surface: surfaces are
/// registered once at startup and only read afterwards. A surface may
/// nominate a different implementation-bearing surface via a redirect, which
/// resolution follows one hop.
#[derive(Debug, Default)]
pub struct SurfaceRegistry {
    tables: HashMap<&'static str, SurfaceTable>,
    redirects: HashMap<&'static str, &'static str>,
}

impl SurfaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_surface(&mut self, name: &'static str, table: SurfaceTable) {
        self.tables.insert(name, table);
    }

    /// Nominate `to` as the surface bearing implementations for calls
    /// declared against `from`.
    pub fn register_redirect(&mut self, from: &'static str, to: &'static str) {
        self.redirects.insert(from, to);
    }

    /// Table to search for implementations of calls declared on `surface`,
    /// following a redirect if one is registered.
    pub fn implementation_table(&self, surface: &str) -> Option<&SurfaceTable> {
        let target = self.redirects.get(surface).copied().unwrap_or(surface);
        self.tables.get(target)
    }
}

/// Process-wide registry holding the builtin sequence surface.
///
/// Initialized on first use, read-only afterwards.
pub static BUILTIN_REGISTRY: LazyLock<SurfaceRegistry> = LazyLock::new(|| {
    let mut registry = SurfaceRegistry::new();
    registry.register_surface(SEQUENCE_SURFACE, builtin::sequence_surface());
    registry.register_redirect(QUERY_SURFACE, SEQUENCE_SURFACE);
    registry
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_redirects_query_surface() {
        let table = BUILTIN_REGISTRY.implementation_table(QUERY_SURFACE).unwrap();
        assert!(table.candidates("select").next().is_some());
    }

    #[test]
    fn unknown_surface_has_no_table() {
        assert!(BUILTIN_REGISTRY.implementation_table("widgets").is_none());
    }

    #[test]
    fn candidates_preserve_declaration_order() {
        let table = BUILTIN_REGISTRY
            .implementation_table(SEQUENCE_SURFACE)
            .unwrap();
        let averages: Vec<_> = table.candidates("average").collect();
        assert!(averages.len() > 1);
        // Discovery order is stable across lookups.
        let again: Vec<_> = table.candidates("average").collect();
        for (a, b) in averages.iter().zip(again.iter()) {
            assert_eq!(a.params, b.params);
        }
    }
}
