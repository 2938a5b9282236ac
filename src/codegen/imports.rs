//! Qualified names and import resolution
//!
//! Emission helpers return text together with the qualified names embedded
//! in it, so the import block is assembled from explicit metadata instead of
//! being re-parsed out of rendered output.

use std::collections::BTreeSet;

/// A dotted path whose final segment is a class name, e.g. `app.models.Tag`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QualifiedName(String);

impl QualifiedName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Everything before the final segment; empty for a bare name
    pub fn namespace(&self) -> &str {
        match self.0.rfind('.') {
            Some(idx) => &self.0[..idx],
            None => "",
        }
    }

    /// The final segment
    pub fn class(&self) -> &str {
        match self.0.rfind('.') {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }
}

impl std::fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A chunk of generated text plus the qualified names it used
#[derive(Debug, Clone, Default)]
pub struct CodeFragment {
    pub text: String,
    pub uses: Vec<QualifiedName>,
}

impl CodeFragment {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            uses: Vec::new(),
        }
    }

    pub fn push_str(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub fn use_name(&mut self, name: QualifiedName) {
        self.uses.push(name);
    }

    pub fn append(&mut self, other: CodeFragment) {
        self.text.push_str(&other.text);
        self.uses.extend(other.uses);
    }
}

/// Render the import block for a class living in `base_namespace`
///
/// Names are deduplicated and sorted lexicographically; names in the class's
/// own namespace and bare names are excluded. One import statement per line.
pub fn import_block(base_namespace: &str, uses: &[QualifiedName]) -> String {
    let distinct: BTreeSet<&QualifiedName> = uses.iter().collect();

    distinct
        .into_iter()
        .filter(|name| !name.namespace().is_empty() && name.namespace() != base_namespace)
        .map(|name| format!("from {} import {}", name.namespace(), name.class()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(name: &str) -> QualifiedName {
        QualifiedName::new(name)
    }

    #[test]
    fn test_namespace_and_class() {
        let name = q("app.models.public.Tag");
        assert_eq!(name.namespace(), "app.models.public");
        assert_eq!(name.class(), "Tag");

        let bare = q("Model");
        assert_eq!(bare.namespace(), "");
        assert_eq!(bare.class(), "Model");
    }

    #[test]
    fn test_import_block_sorted_and_deduplicated() {
        let uses = vec![
            q("uuid.UUID"),
            q("decimal.Decimal"),
            q("uuid.UUID"),
            q("datetime.datetime"),
        ];

        let block = import_block("app.models", &uses);

        assert_eq!(
            block,
            "from datetime import datetime\nfrom decimal import Decimal\nfrom uuid import UUID"
        );
    }

    #[test]
    fn test_import_block_excludes_same_namespace() {
        let uses = vec![q("app.models.Tag"), q("other.pkg.Thing")];

        let block = import_block("app.models", &uses);

        assert_eq!(block, "from other.pkg import Thing");
    }

    #[test]
    fn test_import_block_excludes_bare_names() {
        let uses = vec![q("object")];
        assert_eq!(import_block("app.models", &uses), "");
    }
}
