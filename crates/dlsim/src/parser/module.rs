use crate::ir::{
    BitAccess, GlueAddr, GlueBlock, PortDirection, SimModule, VarAtom, VarAtomBase, VarId, VarKind,
    VariableInfo,
};
use crate::logic_tree::{LogicPath, SLTNode, SLTNodeArena};
use crate::parser::expression::{ExprLowerer, select_access};
use crate::parser::{ParserError, registry::ModuleRegistry};
use crate::syntax::{AssignStmt, InstDecl, Item, ModuleDecl, Target};
use crate::{HashMap, HashSet};

/// Lowers one module declaration into a [`SimModule`].
pub struct ModuleParser<'a> {
    module: &'a ModuleDecl,
    registry: &'a ModuleRegistry<'a>,
    variables: Vec<VariableInfo>,
    names: HashMap<String, VarId>,
    comb_blocks: Vec<LogicPath<VarId>>,
    glue_blocks: Vec<GlueBlock>,
    arena: SLTNodeArena<VarId>,
}

fn lookup(
    names: &HashMap<String, VarId>,
    variables: &[VariableInfo],
    name: &str,
) -> Option<(VarId, usize)> {
    names.get(name).map(|id| (*id, variables[id.0].width))
}

impl<'a> ModuleParser<'a> {
    pub fn parse(
        module: &'a ModuleDecl,
        registry: &'a ModuleRegistry<'a>,
    ) -> Result<SimModule, ParserError> {
        let parser = Self {
            module,
            registry,
            variables: Vec::new(),
            names: HashMap::default(),
            comb_blocks: Vec::new(),
            glue_blocks: Vec::new(),
            arena: SLTNodeArena::new(),
        };
        parser.parse_inner()
    }

    fn parse_inner(mut self) -> Result<SimModule, ParserError> {
        let module = self.module;
        for port in &module.ports {
            self.declare(&port.name, port.width, VarKind::Port(port.direction))?;
        }
        for item in &module.items {
            if let Item::Var(var) = item {
                self.declare(&var.name, var.width, VarKind::Var)?;
            }
        }

        let mut instance_names = HashSet::default();
        for item in &module.items {
            match item {
                Item::Var(_) => {}
                Item::Assign(stmt) => self.parse_assign(stmt)?,
                Item::Inst(decl) => {
                    if !instance_names.insert(decl.name.as_str())
                        || self.names.contains_key(&decl.name)
                    {
                        return Err(ParserError::DuplicateName {
                            scope: self.module.name.clone(),
                            name: decl.name.clone(),
                        });
                    }
                    self.parse_inst_declaration(decl)?;
                }
            }
        }

        log::trace!(
            "lowered module {}: {} variables, {} assignments, {} instances",
            self.module.name,
            self.variables.len(),
            self.comb_blocks.len(),
            self.glue_blocks.len()
        );

        Ok(SimModule {
            name: self.module.name.clone(),
            variables: self.variables,
            comb_blocks: self.comb_blocks,
            arena: self.arena,
            glue_blocks: self.glue_blocks,
        })
    }

    fn declare(&mut self, name: &str, width: usize, kind: VarKind) -> Result<VarId, ParserError> {
        if self.names.contains_key(name) {
            return Err(ParserError::DuplicateName {
                scope: self.module.name.clone(),
                name: name.to_string(),
            });
        }
        let id = VarId(self.variables.len());
        self.variables.push(VariableInfo {
            name: name.to_string(),
            width,
            id,
            kind,
        });
        self.names.insert(name.to_string(), id);
        Ok(id)
    }

    /// Resolves an assignable target of this module.
    fn target(&self, target: &Target) -> Result<VarAtom, ParserError> {
        let (id, width) = lookup(&self.names, &self.variables, &target.name).ok_or_else(|| {
            ParserError::UnknownVariable {
                module: self.module.name.clone(),
                name: target.name.clone(),
            }
        })?;
        if self.variables[id.0].kind == VarKind::Port(PortDirection::Input) {
            return Err(ParserError::InvalidAssignTarget {
                module: self.module.name.clone(),
                name: target.name.clone(),
                reason: "input ports are driven from outside the module".to_string(),
            });
        }
        let access = match &target.select {
            None => BitAccess::full(width),
            Some(select) => select_access(&self.module.name, &target.name, select, width)?,
        };
        Ok(VarAtomBase { id, access })
    }

    fn parse_assign(&mut self, stmt: &AssignStmt) -> Result<(), ParserError> {
        let target = self.target(&stmt.target)?;
        let names = &self.names;
        let variables = &self.variables;
        let mut lowerer = ExprLowerer {
            arena: &mut self.arena,
            module: &self.module.name,
            resolve: |name: &str| lookup(names, variables, name),
        };
        let expr = lowerer.lower_to(&stmt.expr, target.access.width())?;
        self.comb_blocks.push(LogicPath::new(target, expr, &self.arena));
        Ok(())
    }

    fn parse_inst_declaration(&mut self, decl: &InstDecl) -> Result<(), ParserError> {
        let child = self
            .registry
            .get(&decl.module)
            .ok_or_else(|| ParserError::UnknownModule {
                name: decl.module.clone(),
                parent: self.module.name.clone(),
            })?;

        let mut arena = SLTNodeArena::new();
        let mut paths = Vec::new();
        let mut connected = HashSet::default();

        for conn in &decl.connections {
            let port = self
                .registry
                .get_port(&child.name, &conn.port)
                .ok_or_else(|| ParserError::UnknownPort {
                    module: child.name.clone(),
                    instance: decl.name.clone(),
                    port: conn.port.clone(),
                })?;
            if !connected.insert(conn.port.as_str()) {
                return Err(ParserError::PortConnection {
                    instance: decl.name.clone(),
                    port: conn.port.clone(),
                    reason: "port is connected more than once".to_string(),
                });
            }

            match port.direction {
                PortDirection::Input => {
                    let names = &self.names;
                    let variables = &self.variables;
                    let mut lowerer = ExprLowerer {
                        arena: &mut arena,
                        module: &self.module.name,
                        resolve: |name: &str| {
                            lookup(names, variables, name)
                                .map(|(id, width)| (GlueAddr::Parent(id), width))
                        },
                    };
                    let expr = lowerer.lower_to(&conn.expr, port.width)?;
                    let target = VarAtomBase {
                        id: GlueAddr::Child(port.id),
                        access: BitAccess::full(port.width),
                    };
                    paths.push(LogicPath::new(target, expr, &arena));
                }
                PortDirection::Output => {
                    let target = conn.expr.as_target().ok_or_else(|| {
                        ParserError::PortConnection {
                            instance: decl.name.clone(),
                            port: conn.port.clone(),
                            reason: "output ports must connect to a variable or a bit select"
                                .to_string(),
                        }
                    })?;
                    let atom = self.target(&target)?;
                    let mut expr = arena.alloc(SLTNode::Input {
                        variable: GlueAddr::Child(port.id),
                        access: BitAccess::full(port.width),
                    });
                    if port.width > atom.access.width() {
                        expr = arena.alloc(SLTNode::Slice {
                            expr,
                            access: BitAccess::full(atom.access.width()),
                        });
                    }
                    let target = VarAtomBase {
                        id: GlueAddr::Parent(atom.id),
                        access: atom.access,
                    };
                    paths.push(LogicPath::new(target, expr, &arena));
                }
            }
        }

        for port in &child.ports {
            if port.direction == PortDirection::Input && !connected.contains(port.name.as_str()) {
                return Err(ParserError::PortConnection {
                    instance: decl.name.clone(),
                    port: port.name.clone(),
                    reason: "input port is not connected".to_string(),
                });
            }
        }

        self.glue_blocks.push(GlueBlock {
            instance_name: decl.name.clone(),
            module_name: child.name.clone(),
            paths,
            arena,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse;

    fn lower(source: &str, name: &str) -> Result<SimModule, ParserError> {
        let file = parse(source).unwrap();
        let registry = ModuleRegistry::new(&file)?;
        let decl = registry.get(name).unwrap();
        ModuleParser::parse(decl, &registry)
    }

    #[test]
    fn ports_come_first_then_vars() {
        let module = lower(
            "module M (a: input logic<4>, y: output logic<4>) { var t: logic<4>; assign t = a; assign y = t; }",
            "M",
        )
        .unwrap();
        let names: Vec<_> = module.variables.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, ["a", "y", "t"]);
        assert_eq!(module.comb_blocks.len(), 2);
        let ports = module
            .variables
            .iter()
            .filter(|v| matches!(v.kind, VarKind::Port(_)))
            .count();
        assert_eq!(ports, 2);
    }

    #[test]
    fn partial_assignment_targets_bits() {
        let module = lower(
            "module M (a: input logic<4>, y: output logic<8>) { assign y[7:4] = a; assign y[3:0] = ~a; }",
            "M",
        )
        .unwrap();
        assert_eq!(module.comb_blocks[0].target.access, BitAccess::new(4, 7));
        assert_eq!(module.comb_blocks[1].target.access, BitAccess::new(0, 3));
    }

    #[test]
    fn input_ports_cannot_be_assigned() {
        let err = lower("module M (a: input logic) { assign a = 1; }", "M").unwrap_err();
        assert!(matches!(err, ParserError::InvalidAssignTarget { .. }));
    }

    #[test]
    fn duplicate_declarations_are_rejected() {
        let err = lower("module M (a: input logic) { var a: logic; }", "M").unwrap_err();
        assert!(matches!(err, ParserError::DuplicateName { .. }));
    }

    #[test]
    fn instance_bindings_become_glue() {
        let source = "
            module Inv (x: input logic<4>, z: output logic<4>) { assign z = ~x; }
            module Top (a: input logic<4>, y: output logic<2>) {
                inst u0: Inv (x: a, z: y);
            }
        ";
        let module = lower(source, "Top").unwrap();
        let glue = &module.glue_blocks[0];
        assert_eq!(glue.instance_name, "u0");
        assert_eq!(glue.module_name, "Inv");
        assert_eq!(glue.paths.len(), 2);
        assert_eq!(glue.paths[0].target.id, GlueAddr::Child(VarId(0)));
        assert_eq!(glue.paths[1].target.id, GlueAddr::Parent(VarId(1)));
        // 4-bit child output truncated to the 2-bit parent net.
        assert_eq!(glue.arena.width(glue.paths[1].expr), 2);
    }

    #[test]
    fn unconnected_input_is_rejected() {
        let source = "
            module Inv (x: input logic, z: output logic) { assign z = ~x; }
            module Top (y: output logic) { inst u0: Inv (z: y); }
        ";
        let err = lower(source, "Top").unwrap_err();
        assert!(matches!(err, ParserError::PortConnection { .. }));
    }

    #[test]
    fn output_port_needs_an_assignable_net() {
        let source = "
            module Inv (x: input logic, z: output logic) { assign z = ~x; }
            module Top (a: input logic, y: output logic) { inst u0: Inv (x: a, z: y & a); }
        ";
        let err = lower(source, "Top").unwrap_err();
        assert!(matches!(err, ParserError::PortConnection { .. }));
    }
}
