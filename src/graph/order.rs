//! Kahn's algorithm over declaration positions.

use std::collections::BTreeSet;

/// Topologically sort nodes `0..n`, where `dependencies[i]` lists the nodes
/// `i` must come after
///
/// The lowest ready position is emitted first. On a cycle, returns the
/// positions that could not be ordered, ascending.
pub(super) fn topological(dependencies: &[Vec<usize>]) -> Result<Vec<usize>, Vec<usize>> {
    let n = dependencies.len();
    let mut remaining: Vec<usize> = dependencies.iter().map(Vec::len).collect();
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (node, deps) in dependencies.iter().enumerate() {
        for &dep in deps {
            dependents[dep].push(node);
        }
    }

    let mut ready: BTreeSet<usize> = (0..n).filter(|&i| remaining[i] == 0).collect();
    let mut order = Vec::with_capacity(n);
    while let Some(node) = ready.pop_first() {
        order.push(node);
        for &dependent in &dependents[node] {
            remaining[dependent] -= 1;
            if remaining[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }

    if order.len() == n {
        Ok(order)
    } else {
        Err((0..n).filter(|&i| remaining[i] > 0).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_graph() {
        assert_eq!(topological(&[]), Ok(vec![]));
    }

    #[test]
    fn test_independent_nodes_keep_position_order() {
        assert_eq!(topological(&[vec![], vec![], vec![]]), Ok(vec![0, 1, 2]));
    }

    #[test]
    fn test_dependency_moves_node_later() {
        // 0 depends on 2
        assert_eq!(topological(&[vec![2], vec![], vec![]]), Ok(vec![1, 2, 0]));
    }

    #[test]
    fn test_cycle_reports_only_blocked_nodes() {
        // 1 <-> 2, 0 free, 3 depends on the cycle
        let result = topological(&[vec![], vec![2], vec![1], vec![1]]);
        assert_eq!(result, Err(vec![1, 2, 3]));
    }
}
