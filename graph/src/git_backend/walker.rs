use crate::core::Commit;
use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use git2::{Oid, Repository, Sort};
use std::collections::HashSet;
use tracing::debug;

/// A commit read from git, with the fields shown next to the graph
#[derive(Debug, Clone)]
pub struct LoggedCommit {
    pub commit: Commit,
    pub summary: String,
    pub author: String,
    pub time: DateTime<Utc>,
}

pub struct GitWalker {
    repo: Repository,
}

impl GitWalker {
    pub fn new(repo_path: Option<&str>) -> Result<Self> {
        let repo = match repo_path {
            Some(path) => Repository::open(path),
            None => Repository::open_from_env(),
        }
        .context("Failed to open repository")?;

        Ok(Self { repo })
    }

    /// Commits reachable from HEAD and every branch, children before parents
    pub fn commits(&self, limit: Option<usize>) -> Result<Vec<LoggedCommit>> {
        let mut revwalk = self.repo.revwalk()?;

        let head = self.head()?;
        if let Some(head) = head {
            revwalk.push(head)?;
        }
        for branch in self.repo.branches(None)? {
            let (branch, _) = branch?;
            if let Some(target) = branch.get().target() {
                revwalk.push(target)?;
            }
        }
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;

        let head_chain = match head {
            Some(head) => self.first_parent_chain(head, limit)?,
            None => HashSet::new(),
        };

        let mut commits = Vec::new();
        for oid in revwalk.take(limit.unwrap_or(usize::MAX)) {
            let oid = oid?;
            let commit = self.repo.find_commit(oid)?;
            let mut logged = self.to_logged(&commit)?;
            logged.commit.is_current_head = Some(oid) == head;
            logged.commit.is_head_reachable = head_chain.contains(&oid);
            commits.push(logged);
        }

        debug!(count = commits.len(), "read commits from repository");
        Ok(commits)
    }

    /// HEAD commit, `None` for an unborn branch
    pub fn head(&self) -> Result<Option<Oid>> {
        match self.repo.head() {
            Ok(head) => Ok(head.target()),
            Err(err) if err.code() == git2::ErrorCode::UnbornBranch => Ok(None),
            Err(err) if err.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(err) => Err(err).context("Failed to resolve HEAD"),
        }
    }

    fn first_parent_chain(&self, head: Oid, limit: Option<usize>) -> Result<HashSet<Oid>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.push(head)?;
        revwalk.simplify_first_parent()?;
        revwalk
            .take(limit.unwrap_or(usize::MAX))
            .map(|oid| oid.context("Failed to walk first parents"))
            .collect()
    }

    fn to_logged(&self, commit: &git2::Commit) -> Result<LoggedCommit> {
        let time = Utc
            .timestamp_opt(commit.time().seconds(), 0)
            .single()
            .context("Invalid commit timestamp")?;

        Ok(LoggedCommit {
            commit: Commit::new(
                commit.id().to_string(),
                commit.parent_ids().map(|oid| oid.to_string()),
            ),
            summary: commit.summary().unwrap_or("").to_string(),
            author: commit.author().name().unwrap_or("Unknown").to_string(),
            time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::NodeKind;
    use crate::layout::layout;
    use git2::Signature;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn create_test_repo() -> Result<(TempDir, Repository)> {
        let dir = TempDir::new()?;
        let repo = Repository::init(dir.path())?;

        let mut config = repo.config()?;
        config.set_str("user.name", "Test User")?;
        config.set_str("user.email", "test@example.com")?;

        Ok((dir, repo))
    }

    fn commit_to_repo(
        repo: &Repository,
        message: &str,
        parents: &[&git2::Commit],
        update_ref: Option<&str>,
    ) -> Result<Oid> {
        let sig = Signature::now("Test User", "test@example.com")?;
        let tree_id = {
            let mut index = repo.index()?;
            index.write_tree()?
        };
        let tree = repo.find_tree(tree_id)?;

        Ok(repo.commit(update_ref, &sig, &sig, message, &tree, parents)?)
    }

    fn walker_for(repo: &Repository) -> Result<GitWalker> {
        GitWalker::new(Some(repo.path().to_str().context("non-utf8 path")?))
    }

    #[test]
    fn test_empty_repository() -> Result<()> {
        let (_dir, repo) = create_test_repo()?;
        let walker = walker_for(&repo)?;

        assert!(walker.head()?.is_none());
        assert!(walker.commits(None)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_linear_history() -> Result<()> {
        let (_dir, repo) = create_test_repo()?;

        let oid1 = commit_to_repo(&repo, "First commit", &[], Some("HEAD"))?;
        let commit1 = repo.find_commit(oid1)?;
        let oid2 = commit_to_repo(&repo, "Second commit", &[&commit1], Some("HEAD"))?;
        let commit2 = repo.find_commit(oid2)?;
        let oid3 = commit_to_repo(&repo, "Third commit", &[&commit2], Some("HEAD"))?;

        let commits = walker_for(&repo)?.commits(None)?;
        let ids: Vec<_> = commits.iter().map(|c| c.commit.id.clone()).collect();
        assert_eq!(ids, vec![oid3.to_string(), oid2.to_string(), oid1.to_string()]);
        assert_eq!(commits[0].summary, "Third commit");
        assert_eq!(commits[0].author, "Test User");
        assert!(commits[0].time <= Utc::now());
        assert!(commits[2].time <= commits[0].time);
        assert!(commits[0].commit.is_current_head);
        assert!(commits.iter().all(|c| c.commit.is_head_reachable));

        let limited = walker_for(&repo)?.commits(Some(2))?;
        assert_eq!(limited.len(), 2);
        Ok(())
    }

    #[test]
    fn test_merge_commit() -> Result<()> {
        let (_dir, repo) = create_test_repo()?;

        let base_oid = commit_to_repo(&repo, "Base commit", &[], Some("HEAD"))?;
        let base = repo.find_commit(base_oid)?;
        let branch1_oid = commit_to_repo(&repo, "Branch 1", &[&base], Some("HEAD"))?;
        let branch1 = repo.find_commit(branch1_oid)?;
        let branch2_oid = commit_to_repo(&repo, "Branch 2", &[&base], None)?;
        let branch2 = repo.find_commit(branch2_oid)?;
        let merge_oid = commit_to_repo(&repo, "Merge", &[&branch1, &branch2], Some("HEAD"))?;

        let logged = walker_for(&repo)?.commits(None)?;
        assert_eq!(logged.len(), 4);
        assert_eq!(logged[0].commit.id, merge_oid.to_string());
        assert_eq!(logged[3].commit.id, base_oid.to_string());

        let branch2_entry = logged
            .iter()
            .find(|c| c.commit.id == branch2_oid.to_string())
            .context("branch 2 missing")?;
        assert!(!branch2_entry.commit.is_head_reachable);

        let commits: Vec<_> = logged.into_iter().map(|c| c.commit).collect();
        let snapshot = layout(&commits);
        assert_eq!(snapshot.markers()[0].kind, NodeKind::Head);
        assert_eq!(snapshot.stats().merges, 1);
        assert_eq!(snapshot.stats().roots, 1);
        assert_eq!(snapshot.links().len(), 2);
        assert_eq!(snapshot.lane_count(), 2);
        Ok(())
    }
}
