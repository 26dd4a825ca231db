//! Lane/row/group assignment for the dependency graph.
//!
//! This is the upstream pass the layout engine consumes: it turns raw
//! issues and links into [`GraphNode`]s with fixed coordinates. Rows come
//! from Kahn's topological sort with longest-path depths (leaves at the
//! bottom of their component, final deliverables at the top); lanes fan
//! out per branch, with series runs stacked in a single lane.

use std::collections::{HashMap, VecDeque};

use crate::models::{ExecutionMode, GraphNode, Issue, IssueLink};

/// Compute graph positions for every issue.
///
/// Links whose endpoints are not in `issues` are silently filtered out.
/// Cycle participants are reported on stderr and placed after the acyclic
/// rows of their component.
pub fn place(issues: &[Issue], links: &[IssueLink]) -> Vec<GraphNode> {
    if issues.is_empty() {
        return Vec::new();
    }

    let index: HashMap<&str, usize> = issues
        .iter()
        .enumerate()
        .map(|(i, issue)| (issue.id.as_str(), i))
        .collect();

    // (position, endpoint) pairs so sibling/parent order follows link positions.
    let mut children: Vec<Vec<(i64, usize)>> = vec![Vec::new(); issues.len()];
    let mut parents: Vec<Vec<(i64, usize)>> = vec![Vec::new(); issues.len()];
    for link in links {
        let (Some(&parent), Some(&child)) = (
            index.get(link.parent_id.as_str()),
            index.get(link.child_id.as_str()),
        ) else {
            continue;
        };
        children[parent].push((link.position, child));
        parents[child].push((link.position, parent));
    }
    for kids in &mut children {
        kids.sort_by_key(|&(position, c)| (position, issues[c].id.clone()));
    }
    for pars in &mut parents {
        pars.sort_by_key(|&(position, p)| (position, issues[p].id.clone()));
    }

    let component = assign_components(issues.len(), &children);
    let depth = assign_depths(issues, &children, &parents, &component);
    let row = assign_rows(issues.len(), &component, &depth);
    let lane = assign_lanes(issues, &children, &parents, &component);

    (0..issues.len())
        .map(|i| {
            let issue = &issues[i];
            GraphNode {
                issue_id: issue.id.clone(),
                title: issue.title.clone(),
                lane: lane[i],
                row: row[i],
                parent_ids: parents[i]
                    .iter()
                    .map(|&(_, p)| issues[p].id.clone())
                    .collect(),
                execution_mode: issue.execution_mode,
                is_actionable: is_actionable(i, issues, &children, &parents),
                status: issue.status,
                kind: issue.kind,
                agent_status: issue.agent_status,
            }
        })
        .collect()
}

/// Connected components over the links treated as undirected edges.
fn assign_components(count: usize, children: &[Vec<(i64, usize)>]) -> Vec<usize> {
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); count];
    for (parent, kids) in children.iter().enumerate() {
        for &(_, child) in kids {
            adjacency[parent].push(child);
            adjacency[child].push(parent);
        }
    }

    let mut component = vec![usize::MAX; count];
    let mut next = 0;
    for start in 0..count {
        if component[start] != usize::MAX {
            continue;
        }
        component[start] = next;
        let mut frontier = vec![start];
        while let Some(i) = frontier.pop() {
            for &neighbor in &adjacency[i] {
                if component[neighbor] == usize::MAX {
                    component[neighbor] = next;
                    frontier.push(neighbor);
                }
            }
        }
        next += 1;
    }
    component
}

/// Longest path from the leaves via Kahn's algorithm. A node is processed
/// once all of its children (dependencies) are done; any node left over
/// participates in a cycle and lands in a fallback band above its
/// component's acyclic rows.
fn assign_depths(
    issues: &[Issue],
    children: &[Vec<(i64, usize)>],
    parents: &[Vec<(i64, usize)>],
    component: &[usize],
) -> Vec<usize> {
    let count = issues.len();
    let mut in_degree: Vec<usize> = children.iter().map(Vec::len).collect();
    let mut depth = vec![0usize; count];
    let mut done = vec![false; count];

    let mut queue: VecDeque<usize> = (0..count).filter(|&i| in_degree[i] == 0).collect();
    while let Some(i) = queue.pop_front() {
        done[i] = true;
        depth[i] = children[i]
            .iter()
            .map(|&(_, c)| depth[c] + 1)
            .max()
            .unwrap_or(0);
        for &(_, parent) in &parents[i] {
            in_degree[parent] -= 1;
            if in_degree[parent] == 0 {
                queue.push_back(parent);
            }
        }
    }

    let mut cycle_ids: Vec<&str> = (0..count)
        .filter(|&i| !done[i])
        .map(|i| issues[i].id.as_str())
        .collect();
    if !cycle_ids.is_empty() {
        cycle_ids.sort_unstable();
        eprintln!(
            "Warning: dependency cycle detected among issues: {}",
            cycle_ids.join(", ")
        );

        let component_count = component.iter().copied().max().map_or(0, |c| c + 1);
        let mut fallback = vec![0usize; component_count];
        for i in 0..count {
            if done[i] {
                let c = component[i];
                fallback[c] = fallback[c].max(depth[i] + 1);
            }
        }
        for i in 0..count {
            if !done[i] {
                depth[i] = fallback[component[i]];
            }
        }
    }

    depth
}

/// Rows are the ordinal positions of a component's nodes sorted by
/// (depth, input order): unique within the component, 0 closest to the
/// leaves, strictly increasing toward the final deliverable.
fn assign_rows(count: usize, component: &[usize], depth: &[usize]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..count).collect();
    order.sort_by_key(|&i| (component[i], depth[i], i));

    let mut row = vec![0usize; count];
    let mut current_component = usize::MAX;
    let mut next_row = 0;
    for i in order {
        if component[i] != current_component {
            current_component = component[i];
            next_row = 0;
        }
        row[i] = next_row;
        next_row += 1;
    }
    row
}

/// Lanes per component: each root anchors the walk, the first parallel
/// child continues the parent's lane, later branches take the next free
/// lane, and a series run shares one fresh lane for all of its members.
fn assign_lanes(
    issues: &[Issue],
    children: &[Vec<(i64, usize)>],
    parents: &[Vec<(i64, usize)>],
    component: &[usize],
) -> Vec<usize> {
    let count = issues.len();
    let mut lane: Vec<Option<usize>> = vec![None; count];
    let component_count = component.iter().copied().max().map_or(0, |c| c + 1);
    let mut next_free = vec![0usize; component_count];

    fn descend(
        i: usize,
        issues: &[Issue],
        children: &[Vec<(i64, usize)>],
        lane: &mut [Option<usize>],
        next_free: &mut usize,
    ) {
        let own_lane = lane[i].expect("descend called on an assigned node");
        match issues[i].execution_mode {
            ExecutionMode::Parallel => {
                for (k, &(_, child)) in children[i].iter().enumerate() {
                    if lane[child].is_some() {
                        continue;
                    }
                    lane[child] = Some(if k == 0 {
                        own_lane
                    } else {
                        let l = *next_free;
                        *next_free += 1;
                        l
                    });
                    descend(child, issues, children, lane, next_free);
                }
            }
            ExecutionMode::Series => {
                let mut run_lane = None;
                for &(_, child) in &children[i] {
                    if lane[child].is_some() {
                        continue;
                    }
                    let l = *run_lane.get_or_insert_with(|| {
                        let l = *next_free;
                        *next_free += 1;
                        l
                    });
                    lane[child] = Some(l);
                    descend(child, issues, children, lane, next_free);
                }
            }
        }
    }

    // Roots first, then anything a cycle kept unreachable.
    for i in 0..count {
        if parents[i].is_empty() && lane[i].is_none() {
            let free = &mut next_free[component[i]];
            lane[i] = Some(*free);
            *free += 1;
            descend(i, issues, children, &mut lane, &mut next_free[component[i]]);
        }
    }
    for i in 0..count {
        if lane[i].is_none() {
            let free = &mut next_free[component[i]];
            lane[i] = Some(*free);
            *free += 1;
            descend(i, issues, children, &mut lane, &mut next_free[component[i]]);
        }
    }

    lane.into_iter().map(|l| l.unwrap_or(0)).collect()
}

/// An issue is actionable when it is still workable, every dependency is
/// resolved, and — under a series parent — every earlier sibling in the
/// run is resolved too.
fn is_actionable(
    i: usize,
    issues: &[Issue],
    children: &[Vec<(i64, usize)>],
    parents: &[Vec<(i64, usize)>],
) -> bool {
    if issues[i].status.is_resolved() {
        return false;
    }
    if children[i].iter().any(|&(_, c)| !issues[c].status.is_resolved()) {
        return false;
    }
    for &(_, parent) in &parents[i] {
        if issues[parent].execution_mode != ExecutionMode::Series {
            continue;
        }
        for &(_, sibling) in &children[parent] {
            if sibling == i {
                break;
            }
            if !issues[sibling].status.is_resolved() {
                return false;
            }
        }
    }
    true
}
