// Line-range merging for file conflicts

use crate::domain::conflict::{AgentChange, MergeConflict};

/// Why an automatic merge was not possible
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeRefusal {
    Overlap,
    InvalidRange { agent: String, line_start: usize, line_end: usize },
}

/// Attempts the first tier of the merge ladder
///
/// Succeeds when a single agent touched the file, or when every change covers
/// a disjoint line range. Returns the merged file content.
pub fn auto_merge(conflict: &MergeConflict) -> Result<String, MergeRefusal> {
    for change in &conflict.agent_changes {
        if change.line_start == 0 || change.line_end < change.line_start {
            return Err(MergeRefusal::InvalidRange {
                agent: change.agent.clone(),
                line_start: change.line_start,
                line_end: change.line_end,
            });
        }
    }

    if !conflict.has_overlap() {
        return Ok(splice(&conflict.base_version, &conflict.agent_changes));
    }

    // A sole author overlapping itself: its latest edit stands
    if conflict.involved_agents().len() == 1 {
        if let Some(latest) = conflict.agent_changes.last() {
            return Ok(splice(&conflict.base_version, std::slice::from_ref(latest)));
        }
    }

    Err(MergeRefusal::Overlap)
}

/// Replaces each change's inclusive 1-based range in `base`
///
/// Changes must be pairwise disjoint. They are applied bottom-up so earlier
/// line numbers stay valid. Ranges past the end of the file append.
pub fn splice(base: &str, changes: &[AgentChange]) -> String {
    let mut lines: Vec<String> = base.lines().map(str::to_string).collect();

    let mut ordered: Vec<&AgentChange> = changes.iter().collect();
    ordered.sort_by(|a, b| b.line_start.cmp(&a.line_start));

    for change in ordered {
        let start = (change.line_start - 1).min(lines.len());
        let end = change.line_end.min(lines.len()).max(start);
        let replacement = change.content.lines().map(str::to_string);
        lines.splice(start..end, replacement);
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn change(agent: &str, content: &str, line_start: usize, line_end: usize) -> AgentChange {
        AgentChange {
            agent: agent.to_string(),
            content: content.to_string(),
            line_start,
            line_end,
        }
    }

    fn conflict(changes: Vec<AgentChange>) -> MergeConflict {
        MergeConflict {
            id: Uuid::new_v4(),
            file: "src/app.ts".to_string(),
            agent_changes: changes,
            base_version: "one\ntwo\nthree\nfour\nfive".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn disjoint_changes_are_spliced() {
        let merged = auto_merge(&conflict(vec![
            change("Zola", "ONE", 1, 1),
            change("Abeni", "FOUR\nFOUR-B", 4, 4),
        ]))
        .unwrap();

        assert_eq!(merged, "ONE\ntwo\nthree\nFOUR\nFOUR-B\nfive");
    }

    #[test]
    fn overlapping_agents_are_refused() {
        let result = auto_merge(&conflict(vec![
            change("Zola", "a", 2, 3),
            change("Kofi", "b", 3, 4),
        ]));

        assert_eq!(result, Err(MergeRefusal::Overlap));
    }

    #[test]
    fn sole_author_latest_edit_wins() {
        let merged = auto_merge(&conflict(vec![
            change("Nexus", "draft", 2, 3),
            change("Nexus", "final", 2, 2),
        ]))
        .unwrap();

        assert_eq!(merged, "one\nfinal\nthree\nfour\nfive");
    }

    #[test]
    fn appending_past_the_end() {
        assert_eq!(splice("a", &[change("Kofi", "b", 5, 5)]), "a\nb");
    }

    #[test]
    fn zero_line_is_invalid() {
        let result = auto_merge(&conflict(vec![change("Kofi", "x", 0, 1)]));
        assert!(matches!(result, Err(MergeRefusal::InvalidRange { .. })));
    }
}
