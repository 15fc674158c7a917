use std::collections::BTreeMap;

/// Tree of the relations to load together with the queried objects.
///
/// Traversal never goes deeper than the tree: a relation not named here is left empty.
///
/// ```rust
/// # use quarry_core::Preload;
/// let preload = Preload::parse("orders.lines, address");
/// assert!(preload.get("orders").is_some_and(|v| v.get("lines").is_some()));
/// assert!(preload.get("lines").is_none());
/// ```
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Preload {
    children: BTreeMap<String, Preload>,
}

impl Preload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a relation without nested relations.
    pub fn with(self, field: impl Into<String>) -> Self {
        self.with_nested(field, Preload::new())
    }

    /// Adds a relation loading in turn the relations of `nested`.
    pub fn with_nested(mut self, field: impl Into<String>, nested: Preload) -> Self {
        self.children.entry(field.into()).or_default().merge(nested);
        self
    }

    /// Comma separated dotted paths, `"orders.lines,address"`.
    pub fn parse(paths: &str) -> Self {
        let mut result = Preload::new();
        for path in paths.split(',').map(str::trim).filter(|v| !v.is_empty()) {
            let mut node = &mut result;
            for field in path.split('.').map(str::trim).filter(|v| !v.is_empty()) {
                node = node.children.entry(field.to_string()).or_default();
            }
        }
        result
    }

    fn merge(&mut self, other: Preload) {
        for (field, nested) in other.children {
            self.children.entry(field).or_default().merge(nested);
        }
    }

    /// Nested tree of `field`, `None` when the relation is not requested.
    pub fn get(&self, field: &str) -> Option<&Preload> {
        self.children.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_merge() {
        let preload = Preload::new()
            .with("orders")
            .with_nested("orders", Preload::new().with("lines"))
            .with("address");
        assert_eq!(preload, Preload::parse("address,orders.lines"));
        assert_eq!(preload.fields().collect::<Vec<_>>(), ["address", "orders"]);
        assert!(Preload::parse(" , ").is_empty());
    }
}
