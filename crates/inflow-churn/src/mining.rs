//! Git history extraction via git2.
//!
//! Produces the same per-commit, per-file line counts as
//! `git log --numstat`: merge commits contribute nothing of their own,
//! binary files are skipped, and renames show up as a delete plus an add.

use std::path::Path;

use git2::{Delta, DiffOptions, Patch, Repository, Sort};
use inflow_core::InflowError;
use tracing::{debug, info};

/// Lines added and removed for one file in one commit.
///
/// # Examples
///
/// ```
/// use inflow_churn::NumstatEntry;
///
/// let entry = NumstatEntry {
///     commit: "1a2b3c4d".into(),
///     path: "src/lib.rs".into(),
///     added: 10,
///     removed: 3,
/// };
/// assert_eq!(entry.added + entry.removed, 13);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumstatEntry {
    /// Short commit hash.
    pub commit: String,
    /// File path relative to repo root, `/`-separated.
    pub path: String,
    /// Lines added in this commit.
    pub added: u64,
    /// Lines removed in this commit.
    pub removed: u64,
}

/// Options for history mining.
///
/// # Examples
///
/// ```
/// use inflow_churn::MiningOptions;
///
/// let opts = MiningOptions::default();
/// assert!(opts.since_days.is_none());
/// assert!(opts.max_files_per_commit.is_none());
/// assert!(opts.branch.is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MiningOptions {
    /// Only include commits from the last N days (default: all history).
    pub since_days: Option<u64>,
    /// Skip commits touching more files than this (default: no limit).
    pub max_files_per_commit: Option<usize>,
    /// Branch to walk (default: HEAD).
    pub branch: Option<String>,
}

/// Walk history and collect numstat entries for every non-merge commit.
///
/// Entries come back newest commit first.
///
/// # Errors
///
/// Returns [`InflowError::Git`] if the repository cannot be opened or walked.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use inflow_churn::{mine_numstat, MiningOptions};
///
/// let entries = mine_numstat(Path::new("."), &MiningOptions::default()).unwrap();
/// for e in entries.iter().take(5) {
///     println!("{}\t{}\t{}", e.added, e.removed, e.path);
/// }
/// ```
pub fn mine_numstat(
    repo_path: &Path,
    options: &MiningOptions,
) -> Result<Vec<NumstatEntry>, InflowError> {
    let repo = Repository::open(repo_path)
        .map_err(|e| InflowError::Git(format!("failed to open repository: {e}")))?;

    let mut revwalk = repo
        .revwalk()
        .map_err(|e| InflowError::Git(format!("failed to create revwalk: {e}")))?;
    revwalk
        .set_sorting(Sort::TIME)
        .map_err(|e| InflowError::Git(format!("failed to sort revwalk: {e}")))?;

    if let Some(ref branch) = options.branch {
        let reference = repo
            .resolve_reference_from_short_name(branch)
            .map_err(|e| InflowError::Git(format!("failed to resolve branch '{branch}': {e}")))?;
        let oid = reference
            .target()
            .ok_or_else(|| InflowError::Git("branch has no target".into()))?;
        revwalk
            .push(oid)
            .map_err(|e| InflowError::Git(format!("failed to push oid: {e}")))?;
    } else {
        revwalk
            .push_head()
            .map_err(|e| InflowError::Git(format!("failed to push HEAD: {e}")))?;
    }

    let cutoff = options.since_days.map(compute_cutoff);
    let mut entries = Vec::new();
    let mut commits_seen = 0usize;

    for oid_result in revwalk {
        let oid = oid_result.map_err(|e| InflowError::Git(format!("revwalk error: {e}")))?;
        let commit = repo
            .find_commit(oid)
            .map_err(|e| InflowError::Git(format!("failed to find commit: {e}")))?;

        if cutoff.is_some_and(|cutoff| commit.time().seconds() < cutoff) {
            break;
        }
        commits_seen += 1;

        if commit.parent_count() > 1 {
            debug!(commit = %oid, "skipping merge commit");
            continue;
        }

        let hash = oid.to_string();
        let short = &hash[..hash.len().min(8)];
        let changes = commit_numstat(&repo, &commit, short)?;

        if let Some(limit) = options.max_files_per_commit {
            if changes.len() > limit {
                debug!(commit = short, files = changes.len(), "skipping large commit");
                continue;
            }
        }

        entries.extend(changes);
    }

    info!(
        commits = commits_seen,
        entries = entries.len(),
        "mined git history"
    );
    Ok(entries)
}

fn compute_cutoff(since_days: u64) -> i64 {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64;
    now - (since_days as i64 * 86400)
}

fn commit_numstat(
    repo: &Repository,
    commit: &git2::Commit,
    short_hash: &str,
) -> Result<Vec<NumstatEntry>, InflowError> {
    let commit_tree = commit
        .tree()
        .map_err(|e| InflowError::Git(format!("failed to get commit tree: {e}")))?;

    let parent_tree = if commit.parent_count() > 0 {
        let parent = commit
            .parent(0)
            .map_err(|e| InflowError::Git(format!("failed to get parent: {e}")))?;
        Some(
            parent
                .tree()
                .map_err(|e| InflowError::Git(format!("failed to get parent tree: {e}")))?,
        )
    } else {
        None
    };

    let mut diff_opts = DiffOptions::new();
    let diff = repo
        .diff_tree_to_tree(
            parent_tree.as_ref(),
            Some(&commit_tree),
            Some(&mut diff_opts),
        )
        .map_err(|e| InflowError::Git(format!("failed to compute diff: {e}")))?;

    let mut changes = Vec::new();
    for idx in 0..diff.deltas().len() {
        let patch = Patch::from_diff(&diff, idx)
            .map_err(|e| InflowError::Git(format!("failed to build patch: {e}")))?;
        // binary deltas have no patch
        let Some(patch) = patch else {
            continue;
        };
        let delta = patch.delta();
        if delta.flags().is_binary() {
            continue;
        }

        let file = if delta.status() == Delta::Deleted {
            delta.old_file()
        } else {
            delta.new_file()
        };
        let Some(path) = file.path() else {
            continue;
        };
        let path = path.to_string_lossy().replace('\\', "/");

        let (_, added, removed) = patch
            .line_stats()
            .map_err(|e| InflowError::Git(format!("failed to count lines: {e}")))?;

        changes.push(NumstatEntry {
            commit: short_hash.to_string(),
            path,
            added: added as u64,
            removed: removed as u64,
        });
    }

    Ok(changes)
}
