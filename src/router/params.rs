/// An insertion-ordered association of extracted path parameters.
///
/// Parameters are kept in traversal order, outermost (leftmost in the
/// request path) first. The matcher appends the leaf parameter and
/// prepends parent parameters while unwinding, so the final order always
/// mirrors the pattern.
#[derive(Debug, Default, Clone)]
pub struct Params {
    entries: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Gets the value of a parameter by name, if it was extracted.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Iterates over the parameters in extraction order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    pub(crate) fn push_front(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(0, (name.into(), value.into()));
    }
}
