use crate::HashMap;
use crate::ir::{BitAccess, VarAtomBase};
use crate::logic_tree::LogicPath;
use itertools::Itertools;
use std::fmt::Debug;
use std::fmt::Display;
use std::hash::Hash;
use thiserror::Error;

struct TarjanContext {
    index: usize,
    stack: Vec<usize>,
    on_stack: Vec<bool>,
    indices: Vec<Option<usize>>,
    lowlink: Vec<usize>,
    sccs: Vec<Vec<usize>>,
}

fn strong_connect(u: usize, adj: &[Vec<usize>], ctx: &mut TarjanContext) {
    ctx.indices[u] = Some(ctx.index);
    ctx.lowlink[u] = ctx.index;
    ctx.index += 1;
    ctx.stack.push(u);
    ctx.on_stack[u] = true;

    for &v in &adj[u] {
        match ctx.indices[v] {
            None => {
                strong_connect(v, adj, ctx);
                ctx.lowlink[u] = ctx.lowlink[u].min(ctx.lowlink[v]);
            }
            Some(index) if ctx.on_stack[v] => {
                ctx.lowlink[u] = ctx.lowlink[u].min(index);
            }
            Some(_) => {}
        }
    }

    if Some(ctx.lowlink[u]) == ctx.indices[u] {
        let mut scc = Vec::new();
        while let Some(w) = ctx.stack.pop() {
            ctx.on_stack[w] = false;
            scc.push(w);
            if w == u {
                break;
            }
        }
        ctx.sccs.push(scc);
    }
}

fn join<A: Display>(blocks: &[VarAtomBase<A>], sep: &str) -> String {
    blocks.iter().map(|v| v.to_string()).join(sep)
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SchedulerError<A: Display + Debug + Eq + Hash + Clone> {
    #[error("Combinational loop detected: {}", join(.blocks, " -> "))]
    CombinationalLoop { blocks: Vec<VarAtomBase<A>> },
    #[error("Multiple driver detected: {}", join(.blocks, ", "))]
    MultipleDriver { blocks: Vec<VarAtomBase<A>> },
    #[error("Undriven net detected: {net} has no driver")]
    Undriven { net: VarAtomBase<A> },
}

impl<A: Display + Debug + Eq + Hash + Clone> SchedulerError<A> {
    pub fn map_addr<B: Display + Debug + Eq + Hash + Clone, F>(self, f: &F) -> SchedulerError<B>
    where
        F: Fn(&A) -> B,
    {
        let map = |atom: VarAtomBase<A>| VarAtomBase {
            id: f(&atom.id),
            access: atom.access,
        };
        match self {
            SchedulerError::CombinationalLoop { blocks } => SchedulerError::CombinationalLoop {
                blocks: blocks.into_iter().map(map).collect(),
            },
            SchedulerError::MultipleDriver { blocks } => SchedulerError::MultipleDriver {
                blocks: blocks.into_iter().map(map).collect(),
            },
            SchedulerError::Undriven { net } => SchedulerError::Undriven { net: map(net) },
        }
    }
}

/// First bit range of `required` not covered by any of `drivers` (sorted by lsb).
fn first_gap(required: BitAccess, drivers: &[(BitAccess, usize)]) -> Option<BitAccess> {
    let mut cursor = required.lsb;
    for (access, _) in drivers {
        if access.msb < cursor {
            continue;
        }
        if access.lsb > cursor {
            return Some(BitAccess::new(cursor, (access.lsb - 1).min(required.msb)));
        }
        cursor = access.msb + 1;
        if cursor > required.msb {
            return None;
        }
    }
    (cursor <= required.msb).then(|| BitAccess::new(cursor, required.msb))
}

/// Orders logic paths so that every path runs after the paths driving its sources.
///
/// This process performs:
/// 1. Multiple-driver detection over overlapping target ranges.
/// 2. Undriven-bit detection for every `required` range.
/// 3. SCC detection via Tarjan's algorithm; any cycle is a combinational loop.
pub fn sort<A: Clone + Eq + Hash + Debug + Display + Ord>(
    input: Vec<LogicPath<A>>,
    required: &[VarAtomBase<A>],
) -> Result<Vec<LogicPath<A>>, SchedulerError<A>> {
    // 1. Build Atom Map & Multiple Driver Check
    let mut atoms_map: HashMap<A, Vec<(BitAccess, usize)>> = HashMap::default();
    for (i, path) in input.iter().enumerate() {
        atoms_map
            .entry(path.target.id.clone())
            .or_default()
            .push((path.target.access, i));
    }
    for id in atoms_map.keys().cloned().sorted().collect::<Vec<_>>() {
        let Some(entries) = atoms_map.get_mut(&id) else {
            continue;
        };
        entries.sort_by_key(|(access, _)| access.lsb);
        for window in entries.windows(2) {
            if window[0].0.msb >= window[1].0.lsb {
                let blocks = vec![
                    input[window[0].1].target.clone(),
                    input[window[1].1].target.clone(),
                ];
                return Err(SchedulerError::MultipleDriver { blocks });
            }
        }
    }

    // 2. Undriven Check
    for atom in required {
        let drivers = atoms_map.get(&atom.id).map(Vec::as_slice).unwrap_or(&[]);
        if let Some(gap) = first_gap(atom.access, drivers) {
            return Err(SchedulerError::Undriven {
                net: VarAtomBase {
                    id: atom.id.clone(),
                    access: gap,
                },
            });
        }
    }

    // 3. Build Dependency Graph
    let n = input.len();
    let mut adj = vec![Vec::new(); n];
    for (u, path) in input.iter().enumerate() {
        for source in &path.sources {
            if let Some(candidates) = atoms_map.get(&source.id) {
                for (target_access, v) in candidates {
                    if source.access.overlaps(target_access) {
                        adj[*v].push(u); // Dependency: v must be evaluated for u
                    }
                }
            }
        }
    }
    for edges in &mut adj {
        edges.sort_unstable();
        edges.dedup();
    }

    // 4. SCC Extraction (Tarjan)
    let mut ctx = TarjanContext {
        index: 0,
        stack: Vec::new(),
        on_stack: vec![false; n],
        indices: vec![None; n],
        lowlink: vec![0; n],
        sccs: Vec::new(),
    };
    for i in 0..n {
        if ctx.indices[i].is_none() {
            strong_connect(i, &adj, &mut ctx);
        }
    }
    ctx.sccs.reverse();

    let mut order = Vec::with_capacity(n);
    for mut scc in ctx.sccs {
        let is_loop = scc.len() > 1 || adj[scc[0]].contains(&scc[0]);
        if is_loop {
            scc.sort_unstable();
            return Err(SchedulerError::CombinationalLoop {
                blocks: scc
                    .into_iter()
                    .map(|idx| input[idx].target.clone())
                    .collect(),
            });
        }
        order.push(scc[0]);
    }

    let mut slots: Vec<Option<LogicPath<A>>> = input.into_iter().map(Some).collect();
    Ok(order
        .into_iter()
        .filter_map(|idx| slots[idx].take())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HashSet;
    use crate::logic_tree::NodeId;

    fn atom(name: &'static str, lsb: usize, msb: usize) -> VarAtomBase<&'static str> {
        VarAtomBase::new(name, lsb, msb)
    }

    fn path(
        target: VarAtomBase<&'static str>,
        sources: &[VarAtomBase<&'static str>],
    ) -> LogicPath<&'static str> {
        LogicPath {
            target,
            sources: sources.iter().cloned().collect::<HashSet<_>>(),
            expr: NodeId(0),
        }
    }

    #[test]
    fn chain_is_ordered_by_dependency() {
        let input = vec![
            path(atom("y", 0, 7), &[atom("t", 0, 7)]),
            path(atom("t", 0, 7), &[atom("a", 0, 7)]),
        ];
        let sorted = sort(input, &[atom("y", 0, 7)]).unwrap();
        let targets: Vec<_> = sorted.iter().map(|p| p.target.id).collect();
        assert_eq!(targets, ["t", "y"]);
    }

    #[test]
    fn disjoint_slices_are_not_a_loop() {
        // y[1] = y[0] is a dependency between different bits of one net.
        let input = vec![
            path(atom("y", 1, 1), &[atom("y", 0, 0)]),
            path(atom("y", 0, 0), &[atom("a", 0, 0)]),
        ];
        let sorted = sort(input, &[atom("y", 0, 1)]).unwrap();
        assert_eq!(sorted[0].target, atom("y", 0, 0));
    }

    #[test]
    fn overlapping_targets_are_multiple_drivers() {
        let input = vec![
            path(atom("y", 0, 7), &[]),
            path(atom("y", 4, 11), &[]),
        ];
        let err = sort(input, &[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Multiple driver detected: y[7:0], y[11:4]"
        );
    }

    #[test]
    fn cycle_is_reported() {
        let input = vec![
            path(atom("p", 0, 0), &[atom("q", 0, 0)]),
            path(atom("q", 0, 0), &[atom("p", 0, 0)]),
        ];
        let err = sort(input, &[]).unwrap_err();
        assert_eq!(err.to_string(), "Combinational loop detected: p[0] -> q[0]");
    }

    #[test]
    fn self_dependency_is_a_loop() {
        let input = vec![path(atom("c", 0, 3), &[atom("c", 0, 3)])];
        assert!(matches!(
            sort(input, &[]),
            Err(SchedulerError::CombinationalLoop { .. })
        ));
    }

    #[test]
    fn gaps_in_required_ranges_are_reported() {
        let input = vec![path(atom("y", 0, 3), &[]), path(atom("y", 8, 15), &[])];
        let err = sort(input, &[atom("y", 0, 15)]).unwrap_err();
        assert_eq!(
            err,
            SchedulerError::Undriven {
                net: atom("y", 4, 7)
            }
        );
        assert!(first_gap(BitAccess::new(0, 3), &[(BitAccess::new(0, 7), 0)]).is_none());
        assert_eq!(
            first_gap(BitAccess::new(0, 3), &[]),
            Some(BitAccess::new(0, 3))
        );
    }
}
