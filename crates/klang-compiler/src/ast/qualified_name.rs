//! Qualified names (spec §3.4): an optional `::` root prefix plus an
//! ordered list of identifier segments.

use std::fmt;

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct QualifiedName {
    pub root_prefix: bool,
    pub parts: Vec<String>,
}

impl QualifiedName {
    pub fn new(root_prefix: bool, parts: Vec<String>) -> Self {
        Self { root_prefix, parts }
    }

    /// A single unqualified identifier, e.g. a local variable name.
    pub fn simple(name: impl Into<String>) -> Self {
        Self {
            root_prefix: false,
            parts: vec![name.into()],
        }
    }

    pub fn is_simple(&self) -> bool {
        !self.root_prefix && self.parts.len() == 1
    }

    pub fn short_name(&self) -> Option<&str> {
        self.parts.last().map(|s| s.as_str())
    }

    pub fn push_back(&mut self, part: impl Into<String>) {
        self.parts.push(part.into());
    }

    pub fn push_front(&mut self, part: impl Into<String>) {
        self.parts.insert(0, part.into());
    }

    pub fn pop_back(&mut self) -> Option<String> {
        self.parts.pop()
    }

    pub fn pop_front(&mut self) -> Option<String> {
        if self.parts.is_empty() {
            None
        } else {
            Some(self.parts.remove(0))
        }
    }

    /// True if `self` is `other` followed by at least one more segment,
    /// i.e. `other` names an ancestor namespace of `self`.
    pub fn has_prefix(&self, other: &QualifiedName) -> bool {
        other.parts.len() < self.parts.len() && self.parts[..other.parts.len()] == other.parts[..]
    }

    /// Append `suffix`'s segments to a copy of `self`, keeping `self`'s
    /// root-prefix flag.
    pub fn joined(&self, suffix: &QualifiedName) -> QualifiedName {
        let mut parts = self.parts.clone();
        parts.extend(suffix.parts.iter().cloned());
        QualifiedName {
            root_prefix: self.root_prefix,
            parts,
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.root_prefix {
            write!(f, "::")?;
        }
        write!(f, "{}", self.parts.join("::"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_string_includes_root_prefix_when_set() {
        let qn = QualifiedName::new(true, vec!["a".into(), "b".into()]);
        assert_eq!(qn.to_string(), "::a::b");
    }

    #[test]
    fn to_string_without_root_prefix() {
        let qn = QualifiedName::new(false, vec!["a".into(), "b".into()]);
        assert_eq!(qn.to_string(), "a::b");
    }

    #[test]
    fn push_and_pop_front_and_back() {
        let mut qn = QualifiedName::simple("b");
        qn.push_front("a");
        qn.push_back("c");
        assert_eq!(qn.to_string(), "a::b::c");
        assert_eq!(qn.pop_back(), Some("c".to_string()));
        assert_eq!(qn.pop_front(), Some("a".to_string()));
        assert_eq!(qn.to_string(), "b");
    }

    #[test]
    fn prefix_test() {
        let a = QualifiedName::new(false, vec!["a".into()]);
        let ab = QualifiedName::new(false, vec!["a".into(), "b".into()]);
        assert!(ab.has_prefix(&a));
        assert!(!a.has_prefix(&ab));
        assert!(!a.has_prefix(&a));
    }

    #[test]
    fn equality_considers_root_prefix() {
        let a = QualifiedName::new(true, vec!["x".into()]);
        let b = QualifiedName::new(false, vec!["x".into()]);
        assert_ne!(a, b);
    }

    #[test]
    fn simple_name_is_simple() {
        assert!(QualifiedName::simple("x").is_simple());
        assert!(!QualifiedName::new(true, vec!["x".into()]).is_simple());
        assert!(!QualifiedName::new(false, vec!["x".into(), "y".into()]).is_simple());
    }
}
