//! Locates the three log files of one test run

use std::path::{Path, PathBuf};

use super::error::{ParseError, ParseResult};
use crate::utils::list_files;

/// The three log streams written during a load test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogKind {
    ClusterHealth,
    NodeStats,
    TransformStats,
}

impl LogKind {
    pub const ALL: [LogKind; 3] =
        [LogKind::ClusterHealth, LogKind::NodeStats, LogKind::TransformStats];

    /// Substring identifying this kind in a log file name
    pub fn marker(&self) -> &'static str {
        match self {
            LogKind::ClusterHealth => "cluster-health",
            LogKind::NodeStats => "node-stats",
            LogKind::TransformStats => "transform-stats",
        }
    }
}

/// Paths of the three logs sharing one prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFileSet {
    pub cluster_health: PathBuf,
    pub node_stats: PathBuf,
    pub transform_stats: PathBuf,
}

impl LogFileSet {
    /// Find files in `logs_dir` whose name starts with `prefix` and contains each
    /// kind's marker
    ///
    /// Names where the prefix ends at a separator (`run1-...`, not `run10-...`)
    /// are preferred; a bare prefix match is used only when there are none.
    /// When several files match one kind, the last by name wins (log names
    /// carry a sortable timestamp).
    pub fn locate(logs_dir: &Path, prefix: &str) -> ParseResult<Self> {
        let files = list_files(logs_dir).map_err(|source| ParseError::LogsDirectory {
            path: logs_dir.to_path_buf(),
            source,
        })?;

        let (delimited, loose): (Vec<_>, Vec<_>) = files
            .into_iter()
            .filter(|f| f.name.starts_with(prefix))
            .partition(|f| Self::prefix_ends_at_separator(&f.name, prefix));
        let candidates = if delimited.is_empty() {
            loose
        } else {
            if !loose.is_empty() {
                tracing::debug!(
                    "Ignoring {} files that only share the text prefix '{}'",
                    loose.len(),
                    prefix
                );
            }
            delimited
        };

        let find = |kind: LogKind| {
            let matches: Vec<_> =
                candidates.iter().filter(|f| f.name.contains(kind.marker())).collect();
            if matches.len() > 1 {
                tracing::warn!(
                    "{} files match prefix '{}' for {}, using {}",
                    matches.len(),
                    prefix,
                    kind.marker(),
                    matches[matches.len() - 1].name
                );
            }
            matches.last().map(|f| f.path.clone())
        };

        match (
            find(LogKind::ClusterHealth),
            find(LogKind::NodeStats),
            find(LogKind::TransformStats),
        ) {
            (Some(cluster_health), Some(node_stats), Some(transform_stats)) => {
                Ok(Self { cluster_health, node_stats, transform_stats })
            },
            _ => {
                let missing = LogKind::ALL
                    .into_iter()
                    .filter(|kind| find(*kind).is_none())
                    .map(|kind| kind.marker())
                    .collect();
                Err(ParseError::MissingLogFiles {
                    prefix: prefix.to_string(),
                    missing,
                    found: candidates.iter().map(|f| f.name.clone()).collect(),
                })
            },
        }
    }

    /// True when `name` continues past `prefix` with a non-alphanumeric character
    fn prefix_ends_at_separator(name: &str, prefix: &str) -> bool {
        name[prefix.len()..].chars().next().is_some_and(|c| !c.is_ascii_alphanumeric())
    }

    pub fn path(&self, kind: LogKind) -> &Path {
        match kind {
            LogKind::ClusterHealth => &self.cluster_health,
            LogKind::NodeStats => &self.node_stats,
            LogKind::TransformStats => &self.transform_stats,
        }
    }
}
