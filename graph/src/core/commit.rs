use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Commit identifier as handed over by the commit source (usually a SHA)
pub type CommitId = String;

/// Ordered parent list; almost every commit has one or two parents
pub type Parents = SmallVec<[CommitId; 2]>;

/// A commit as supplied by the commit source.
///
/// The source guarantees descendant-before-ancestor ordering; the layout
/// engine never sorts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Unique commit ID
    pub id: CommitId,
    /// Parent commit IDs, first parent first
    #[serde(default)]
    pub parents: Parents,
    /// Tip of the currently checked-out branch
    #[serde(default)]
    pub is_current_head: bool,
    /// Known by the source to be reachable from the current head
    #[serde(default)]
    pub is_head_reachable: bool,
}

impl Commit {
    pub fn new<I, S>(id: impl Into<CommitId>, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CommitId>,
    {
        Self {
            id: id.into(),
            parents: parents.into_iter().map(Into::into).collect(),
            is_current_head: false,
            is_head_reachable: false,
        }
    }

    /// A commit without parents
    pub fn root(id: impl Into<CommitId>) -> Self {
        Self::new(id, std::iter::empty::<CommitId>())
    }

    pub fn with_current_head(mut self) -> Self {
        self.is_current_head = true;
        self
    }

    pub fn with_head_reachable(mut self) -> Self {
        self.is_head_reachable = true;
        self
    }

    /// Check if this is a root commit (no parents)
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// Check if this is a merge commit (multiple parents)
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    pub fn first_parent(&self) -> Option<&str> {
        self.parents.first().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_shape() {
        let root = Commit::root("a");
        assert!(root.is_root());
        assert!(!root.is_merge());
        assert_eq!(root.first_parent(), None);

        let merge = Commit::new("m", ["b", "c"]).with_current_head();
        assert!(merge.is_merge());
        assert!(merge.is_current_head);
        assert_eq!(merge.first_parent(), Some("b"));
    }

    #[test]
    fn test_commit_from_json() {
        let commits: Vec<Commit> = serde_json::from_str(
            r#"[{"id": "b", "parents": ["a"], "is_current_head": true}, {"id": "a"}]"#,
        )
        .unwrap();

        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].first_parent(), Some("a"));
        assert!(commits[0].is_current_head);
        assert!(commits[1].is_root());
        assert!(!commits[1].is_head_reachable);
    }
}
