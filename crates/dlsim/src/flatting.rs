use std::hash::Hash;

use crate::debug::{CompilationTrace, TraceOptions};
use crate::ir::{
    AbsoluteAddr, BitAccess, GlueAddr, GlueBlock, InstanceId, InstancePath, PortDirection,
    Program, SimModule, VarAtomBase, VarId, VarKind,
};
use crate::logic_tree::{LogicPath, NodeId, SLTNodeArena};
use crate::parser::{ParserError, sort};
use crate::{HashMap, HashSet};

/// Instance tree below the top module, in depth-first pre-order.
struct Hierarchy {
    instance_ids: HashMap<InstancePath, InstanceId>,
    instance_module: HashMap<InstanceId, String>,
    order: Vec<(InstanceId, InstancePath)>,
}

fn expand_hierarchy(
    top: &str,
    modules: &HashMap<String, SimModule>,
) -> Result<Hierarchy, ParserError> {
    let mut hierarchy = Hierarchy {
        instance_ids: HashMap::default(),
        instance_module: HashMap::default(),
        order: Vec::new(),
    };
    let mut stack = Vec::new();
    expand_instance(top, InstancePath::default(), modules, &mut stack, &mut hierarchy)?;
    Ok(hierarchy)
}

fn expand_instance(
    module_name: &str,
    path: InstancePath,
    modules: &HashMap<String, SimModule>,
    stack: &mut Vec<String>,
    hierarchy: &mut Hierarchy,
) -> Result<(), ParserError> {
    if stack.iter().any(|m| m == module_name) {
        let mut chain = stack.clone();
        chain.push(module_name.to_string());
        return Err(ParserError::RecursiveInstantiation {
            chain: chain.join(" -> "),
        });
    }
    let module = modules
        .get(module_name)
        .ok_or_else(|| ParserError::MissingTop(module_name.to_string()))?;

    let instance_id = InstanceId(hierarchy.order.len());
    hierarchy.instance_ids.insert(path.clone(), instance_id);
    hierarchy
        .instance_module
        .insert(instance_id, module_name.to_string());
    hierarchy.order.push((instance_id, path.clone()));

    stack.push(module_name.to_string());
    for glue in &module.glue_blocks {
        expand_instance(
            &glue.module_name,
            path.child(&glue.instance_name),
            modules,
            stack,
            hierarchy,
        )?;
    }
    stack.pop();
    Ok(())
}

fn convert_logic_path<A: Hash + Eq + Clone, B: Hash + Eq + Clone>(
    lp: &LogicPath<A>,
    arena: &SLTNodeArena<A>,
    target_arena: &mut SLTNodeArena<B>,
    cache: &mut HashMap<NodeId, NodeId>,
    f: &impl Fn(&A) -> B,
) -> LogicPath<B> {
    lp.map_addr(arena, target_arena, cache, f)
}

fn convert_glue_block(
    gb: &GlueBlock,
    parent_id: InstanceId,
    child_id: InstanceId,
    target_arena: &mut SLTNodeArena<AbsoluteAddr>,
) -> Vec<LogicPath<AbsoluteAddr>> {
    let cv = &|addr: &GlueAddr| match addr {
        GlueAddr::Parent(v) => AbsoluteAddr {
            instance_id: parent_id,
            var_id: *v,
        },
        GlueAddr::Child(v) => AbsoluteAddr {
            instance_id: child_id,
            var_id: *v,
        },
    };
    let mut cache = HashMap::default();
    gb.paths
        .iter()
        .map(|path| convert_logic_path(path, &gb.arena, target_arena, &mut cache, cv))
        .collect()
}

/// Relocates one instance's assignments and port bindings into the global arena.
fn flatting(
    module: &SimModule,
    path: &InstancePath,
    instance_ids: &HashMap<InstancePath, InstanceId>,
    arena: &mut SLTNodeArena<AbsoluteAddr>,
) -> Vec<LogicPath<AbsoluteAddr>> {
    let instance_id = instance_ids[path];
    let cv = &|id: &VarId| AbsoluteAddr {
        instance_id,
        var_id: *id,
    };

    let mut comb_cache = HashMap::default();
    let mut comb_blocks: Vec<_> = module
        .comb_blocks
        .iter()
        .map(|e| convert_logic_path(e, &module.arena, arena, &mut comb_cache, cv))
        .collect();
    for gb in &module.glue_blocks {
        let child_id = instance_ids[&path.child(&gb.instance_name)];
        comb_blocks.extend(convert_glue_block(gb, instance_id, child_id, arena));
    }
    comb_blocks
}

/// Bit ranges that must have a driver: every output port of every instance,
/// and every range read by some path, except top-level inputs.
fn required_atoms(
    program: &Program,
    paths: &[LogicPath<AbsoluteAddr>],
) -> Vec<VarAtomBase<AbsoluteAddr>> {
    let is_top_input = |addr: &AbsoluteAddr| {
        addr.instance_id == Program::TOP
            && program
                .get_variable_info(addr)
                .is_some_and(|info| info.kind == VarKind::Port(PortDirection::Input))
    };

    let mut required: HashSet<VarAtomBase<AbsoluteAddr>> = HashSet::default();
    for addr in program.all_addrs() {
        if let Some(info) = program.get_variable_info(&addr)
            && info.kind == VarKind::Port(PortDirection::Output)
        {
            required.insert(VarAtomBase {
                id: addr,
                access: BitAccess::full(info.width),
            });
        }
    }
    for path in paths {
        for source in &path.sources {
            if !is_top_input(&source.id) {
                required.insert(source.clone());
            }
        }
    }
    let mut required: Vec<_> = required.into_iter().collect();
    required.sort();
    required
}

pub(crate) fn flatten(
    top: &str,
    modules: &HashMap<String, SimModule>,
    trace_opts: &TraceOptions,
    mut trace: Option<&mut CompilationTrace>,
) -> Result<Program, ParserError> {
    let hierarchy = expand_hierarchy(top, modules)?;

    let mut arena = SLTNodeArena::new();
    let mut comb_blocks = Vec::new();
    for (instance_id, path) in &hierarchy.order {
        let module = &modules[&hierarchy.instance_module[instance_id]];
        comb_blocks.extend(flatting(module, path, &hierarchy.instance_ids, &mut arena));
    }

    let mut program = Program {
        top: top.to_string(),
        eval_comb: Vec::new(),
        arena,
        instance_ids: hierarchy.instance_ids,
        instance_module: hierarchy.instance_module,
        module_variables: modules
            .iter()
            .map(|(name, module)| (name.clone(), module.variables.clone()))
            .collect(),
    };

    if let Some(t) = trace.as_deref_mut()
        && trace_opts.flattened_comb_blocks
    {
        t.flattened_comb_blocks = Some(crate::debug::format_paths(&program, &comb_blocks));
    }

    let required = required_atoms(&program, &comb_blocks);
    log::debug!(
        "flattened {} instances into {} logic paths ({} required ranges)",
        program.instance_ids.len(),
        comb_blocks.len(),
        required.len()
    );

    let scheduled = sort(comb_blocks, &required).map_err(|err| {
        ParserError::Scheduler(err.map_addr(&|addr: &AbsoluteAddr| program.get_path(addr)))
    })?;

    if let Some(t) = trace
        && trace_opts.scheduled_comb_blocks
    {
        t.scheduled_comb_blocks = Some(crate::debug::format_paths(&program, &scheduled));
    }

    program.eval_comb = scheduled;
    Ok(program)
}
