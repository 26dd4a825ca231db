//! Flattens a placed dependency graph into the ordered line sequence the
//! timeline renders.
//!
//! Pure and stateless: the same `GraphNode` slice (including order) always
//! produces the identical `RenderLine` sequence. Lane and row coordinates
//! are consumed as given; this module only decides line ordering and
//! connector topology.

use std::collections::HashMap;

use crate::models::{ExecutionMode, GraphNode};

use super::line::{ConnectorLine, ConnectorShape, IssueLine, Marker, RenderLine};

/// Flatten `nodes` into issue rows, connector rows, and group separators.
///
/// Empty input yields empty output. Parent ids that do not name a node in
/// the input are ignored both for connectivity and connector geometry.
pub fn compute_layout(nodes: &[GraphNode]) -> Vec<RenderLine> {
    if nodes.is_empty() {
        return Vec::new();
    }

    let index: HashMap<&str, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.issue_id.as_str(), i))
        .collect();

    // Primary parent: first entry of parent_ids that names a known node.
    let primary_parent: Vec<Option<usize>> = nodes
        .iter()
        .map(|n| n.parent_ids.iter().find_map(|p| index.get(p.as_str()).copied()))
        .collect();

    // Children keyed by primary parent, ordered by (row, input index).
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    for (child, parent) in primary_parent.iter().enumerate() {
        if let Some(p) = *parent {
            children[p].push(child);
        }
    }
    for kids in &mut children {
        kids.sort_by_key(|&c| (nodes[c].row, c));
    }

    // The child row closest to the parent's connector anchor.
    let first_child: Vec<Option<usize>> = children
        .iter()
        .map(|kids| kids.first().copied())
        .collect();

    let groups = partition_groups(nodes, &index);

    let mut lines = Vec::new();
    for (group_idx, group) in groups.iter().enumerate() {
        if group_idx > 0 {
            lines.push(RenderLine::Separator);
        }

        for &i in group {
            let node = &nodes[i];

            if !children[i].is_empty() {
                let mut child_lanes: Vec<usize> =
                    children[i].iter().map(|&c| nodes[c].lane).collect();
                child_lanes.sort_unstable();
                child_lanes.dedup();

                let shape = if child_lanes == [node.lane] {
                    ConnectorShape::Straight
                } else {
                    ConnectorShape::Elbow
                };

                lines.push(RenderLine::Connector(ConnectorLine {
                    parent_lane: node.lane,
                    child_lanes,
                    shape,
                }));
            }

            let parent = primary_parent[i];
            lines.push(RenderLine::Issue(IssueLine {
                issue_id: node.issue_id.clone(),
                title: node.title.clone(),
                lane: node.lane,
                marker: Marker::from_status(node.status, node.is_actionable),
                parent_lane: parent.map(|p| nodes[p].lane),
                is_first_child: parent.is_some_and(|p| first_child[p] == Some(i)),
                is_series_child: parent
                    .is_some_and(|p| nodes[p].execution_mode == ExecutionMode::Series),
                kind: node.kind,
                status: node.status,
                agent_status: node.agent_status,
            }));
        }
    }

    lines
}

/// Partition nodes into connected components over the parent edges treated
/// as undirected, ordered by (minimum row, first appearance); members ascend
/// by (row, input index).
fn partition_groups(nodes: &[GraphNode], index: &HashMap<&str, usize>) -> Vec<Vec<usize>> {
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    for (child, node) in nodes.iter().enumerate() {
        for parent_id in &node.parent_ids {
            if let Some(&parent) = index.get(parent_id.as_str()) {
                adjacency[child].push(parent);
                adjacency[parent].push(child);
            }
        }
    }

    let mut component = vec![usize::MAX; nodes.len()];
    let mut groups: Vec<Vec<usize>> = Vec::new();

    for start in 0..nodes.len() {
        if component[start] != usize::MAX {
            continue;
        }
        let id = groups.len();
        let mut members = Vec::new();
        let mut frontier = vec![start];
        component[start] = id;
        while let Some(i) = frontier.pop() {
            members.push(i);
            for &next in &adjacency[i] {
                if component[next] == usize::MAX {
                    component[next] = id;
                    frontier.push(next);
                }
            }
        }
        members.sort_by_key(|&i| (nodes[i].row, i));
        groups.push(members);
    }

    groups.sort_by_key(|members| {
        let &first = members.first().expect("groups are non-empty");
        (nodes[first].row, first)
    });
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AgentStatus, IssueStatus, IssueType};

    fn node(id: &str, lane: usize, row: usize, parents: &[&str]) -> GraphNode {
        GraphNode {
            issue_id: id.to_string(),
            title: format!("Issue {id}"),
            lane,
            row,
            parent_ids: parents.iter().map(|p| p.to_string()).collect(),
            execution_mode: ExecutionMode::Parallel,
            is_actionable: false,
            status: IssueStatus::Open,
            kind: IssueType::Task,
            agent_status: None,
        }
    }

    fn issue_lines(lines: &[RenderLine]) -> Vec<&IssueLine> {
        lines.iter().filter_map(RenderLine::as_issue).collect()
    }

    fn connector_count(lines: &[RenderLine]) -> usize {
        lines
            .iter()
            .filter(|l| matches!(l, RenderLine::Connector(_)))
            .count()
    }

    #[test]
    fn empty_graph_yields_empty_layout() {
        assert!(compute_layout(&[]).is_empty());
    }

    #[test]
    fn single_actionable_orphan() {
        let mut n = node("a", 0, 0, &[]);
        n.is_actionable = true;

        let lines = compute_layout(&[n]);
        assert_eq!(lines.len(), 1);
        let issue = lines[0].as_issue().unwrap();
        assert_eq!(issue.marker, Marker::Actionable);
        assert_eq!(issue.parent_lane, None);
        assert!(!issue.is_first_child);
        assert!(!issue.is_series_child);
    }

    #[test]
    fn two_orphans_get_one_separator_and_no_connectors() {
        let lines = compute_layout(&[node("a", 0, 0, &[]), node("b", 0, 0, &[])]);

        assert_eq!(lines.len(), 3);
        assert!(lines[0].as_issue().is_some());
        assert!(lines[1].is_separator());
        assert!(lines[2].as_issue().is_some());
        assert_eq!(connector_count(&lines), 0);
    }

    #[test]
    fn separators_never_lead_or_trail() {
        let lines = compute_layout(&[
            node("a", 0, 0, &[]),
            node("b", 0, 0, &[]),
            node("c", 0, 0, &[]),
        ]);

        assert!(!lines.first().unwrap().is_separator());
        assert!(!lines.last().unwrap().is_separator());
        let separators = lines.iter().filter(|l| l.is_separator()).count();
        assert_eq!(separators, 2);
    }

    #[test]
    fn parallel_child_parent_is_three_lines() {
        let lines = compute_layout(&[node("child", 0, 0, &["parent"]), node("parent", 0, 1, &[])]);

        assert_eq!(lines.len(), 3);
        let child = lines[0].as_issue().unwrap();
        assert_eq!(child.issue_id, "child");
        assert_eq!(child.parent_lane, Some(0));
        assert!(child.is_first_child);
        assert!(!child.is_series_child);

        match &lines[1] {
            RenderLine::Connector(c) => {
                assert_eq!(c.parent_lane, 0);
                assert_eq!(c.child_lanes, [0]);
                assert_eq!(c.shape, ConnectorShape::Straight);
            }
            other => panic!("expected connector, got {other:?}"),
        }

        assert_eq!(lines[2].as_issue().unwrap().issue_id, "parent");
    }

    #[test]
    fn parallel_siblings_each_carry_a_parent_lane() {
        let lines = compute_layout(&[
            node("a", 0, 0, &["parent"]),
            node("b", 1, 1, &["parent"]),
            node("parent", 0, 2, &[]),
        ]);

        let issues = issue_lines(&lines);
        assert_eq!(issues[0].issue_id, "a");
        assert!(issues[0].is_first_child);
        assert_eq!(issues[0].parent_lane, Some(0));
        assert_eq!(issues[1].issue_id, "b");
        assert!(!issues[1].is_first_child);
        assert_eq!(issues[1].parent_lane, Some(0));

        // One connector row ahead of the parent, spanning both child lanes.
        assert_eq!(connector_count(&lines), 1);
        match &lines[2] {
            RenderLine::Connector(c) => {
                assert_eq!(c.child_lanes, [0, 1]);
                assert_eq!(c.shape, ConnectorShape::Elbow);
            }
            other => panic!("expected connector, got {other:?}"),
        }
    }

    #[test]
    fn series_siblings_share_one_elbow_connector() {
        let mut parent = node("parent", 0, 2, &[]);
        parent.execution_mode = ExecutionMode::Series;

        let lines = compute_layout(&[
            node("a", 1, 0, &["parent"]),
            node("b", 1, 1, &["parent"]),
            parent,
        ]);

        let issues = issue_lines(&lines);
        assert!(issues[0].is_first_child);
        assert!(!issues[1].is_first_child);
        assert!(issues[0].is_series_child);
        assert!(issues[1].is_series_child);

        assert_eq!(connector_count(&lines), 1);
        match &lines[2] {
            RenderLine::Connector(c) => {
                assert_eq!(c.parent_lane, 0);
                assert_eq!(c.child_lanes, [1]);
                assert_eq!(c.shape, ConnectorShape::Elbow);
            }
            other => panic!("expected connector, got {other:?}"),
        }
    }

    #[test]
    fn marker_derivation() {
        let cases = [
            (IssueStatus::Complete, false, Marker::Complete),
            (IssueStatus::Closed, true, Marker::Closed),
            (IssueStatus::Archived, false, Marker::Closed),
            (IssueStatus::Open, true, Marker::Actionable),
            (IssueStatus::Open, false, Marker::Open),
            (IssueStatus::InProgress, true, Marker::Actionable),
            (IssueStatus::InProgress, false, Marker::Open),
        ];
        for (status, actionable, expected) in cases {
            let mut n = node("a", 0, 0, &[]);
            n.status = status;
            n.is_actionable = actionable;
            let lines = compute_layout(&[n]);
            assert_eq!(lines[0].as_issue().unwrap().marker, expected, "{status}");
        }
    }

    #[test]
    fn unknown_parent_ids_are_ignored() {
        let lines = compute_layout(&[node("a", 0, 0, &["ghost"])]);

        assert_eq!(lines.len(), 1);
        let issue = lines[0].as_issue().unwrap();
        assert_eq!(issue.parent_lane, None);
        assert!(!issue.is_first_child);
    }

    #[test]
    fn rows_order_lines_within_a_group() {
        let lines = compute_layout(&[
            node("parent", 0, 2, &[]),
            node("b", 1, 1, &["parent"]),
            node("a", 0, 0, &["parent"]),
        ]);

        let ids: Vec<&str> = issue_lines(&lines)
            .iter()
            .map(|l| l.issue_id.as_str())
            .collect();
        assert_eq!(ids, ["a", "b", "parent"]);
    }

    #[test]
    fn groups_order_by_first_node_row_then_appearance() {
        // Two components plus an orphan; all rows start at 0 per component,
        // so appearance order breaks the tie.
        let lines = compute_layout(&[
            node("x", 0, 0, &["y"]),
            node("y", 0, 1, &[]),
            node("orphan", 0, 0, &[]),
        ]);

        let ids: Vec<&str> = issue_lines(&lines)
            .iter()
            .map(|l| l.issue_id.as_str())
            .collect();
        assert_eq!(ids, ["x", "y", "orphan"]);
        assert_eq!(lines.iter().filter(|l| l.is_separator()).count(), 1);
    }

    #[test]
    fn agent_badge_passes_through() {
        let mut n = node("a", 0, 0, &[]);
        n.agent_status = Some(AgentStatus::Running);
        let lines = compute_layout(&[n]);
        assert_eq!(
            lines[0].as_issue().unwrap().agent_status,
            Some(AgentStatus::Running)
        );
    }

    #[test]
    fn layout_is_deterministic() {
        let mut series_parent = node("p2", 2, 2, &[]);
        series_parent.execution_mode = ExecutionMode::Series;
        let nodes = vec![
            node("a", 0, 0, &["p1"]),
            node("b", 1, 1, &["p1"]),
            node("p1", 0, 2, &[]),
            node("c", 3, 0, &["p2"]),
            node("d", 3, 1, &["p2"]),
            series_parent,
            node("orphan", 0, 0, &[]),
        ];

        let first = compute_layout(&nodes);
        let second = compute_layout(&nodes);
        assert_eq!(first, second);
    }
}
