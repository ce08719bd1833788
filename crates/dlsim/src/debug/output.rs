use std::fmt::Write;

use crate::HashMap;
use crate::ir::{AbsoluteAddr, GlueAddr, Program, SimModule, VarId};
use crate::logic_tree::{LogicPath, SLTNodeArena};

/// One line per path: `target = expression`, with every address rendered by `name`.
fn format_with<A, F>(
    paths: &[LogicPath<A>],
    arena: &SLTNodeArena<A>,
    name: F,
    indent: &str,
) -> String
where
    A: std::hash::Hash + Eq + Clone,
    F: Fn(&A) -> String,
{
    let mut named: SLTNodeArena<String> = SLTNodeArena::new();
    let mut cache = HashMap::default();
    let mut out = String::new();
    for path in paths {
        let path = path.map_addr(arena, &mut named, &mut cache, &name);
        let _ = writeln!(out, "{}{} = {}", indent, path.target, named.display(path.expr));
    }
    out
}

/// Flattened or scheduled paths, with nets named by hierarchical path.
pub(crate) fn format_paths(program: &Program, paths: &[LogicPath<AbsoluteAddr>]) -> String {
    format_with(paths, &program.arena, |addr| program.get_path(addr), "")
}

/// Every lowered module, sorted by name.
pub(crate) fn format_sim_modules(modules: &HashMap<String, SimModule>) -> String {
    let mut names: Vec<_> = modules.keys().collect();
    names.sort();
    let mut out = String::new();
    for name in names {
        let module = &modules[name];
        let var_name = |id: &VarId| module.variables[id.0].name.clone();
        let _ = writeln!(out, "module {}", module.name);
        for var in &module.variables {
            let kind = match var.direction() {
                Some(dir) => dir.to_string(),
                None => "var".to_string(),
            };
            let _ = writeln!(out, "  {} {}: logic<{}>", kind, var.name, var.width);
        }
        out.push_str(&format_with(&module.comb_blocks, &module.arena, var_name, "  "));
        for glue in &module.glue_blocks {
            let _ = writeln!(out, "  inst {}: {}", glue.instance_name, glue.module_name);
            let glue_name = |addr: &GlueAddr| match addr {
                GlueAddr::Parent(id) => var_name(id),
                GlueAddr::Child(id) => {
                    let port = modules
                        .get(&glue.module_name)
                        .and_then(|child| child.variables.get(id.0))
                        .map(|info| info.name.clone())
                        .unwrap_or_else(|| id.to_string());
                    format!("{}.{}", glue.instance_name, port)
                }
            };
            out.push_str(&format_with(&glue.paths, &glue.arena, glue_name, "    "));
        }
    }
    out
}
