use crate::HashMap;
use crate::ir::{PortDirection, VarId};
use crate::parser::ParserError;
use crate::syntax::{ModuleDecl, SourceFile};

/// A child port as seen by an instantiating module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortSignature {
    pub id: VarId,
    pub direction: PortDirection,
    pub width: usize,
}

pub struct ModuleRegistry<'a> {
    // Map from module name to its declaration
    pub modules: HashMap<&'a str, &'a ModuleDecl>,
}

impl<'a> ModuleRegistry<'a> {
    pub fn new(file: &'a SourceFile) -> Result<Self, ParserError> {
        let mut modules = HashMap::default();
        for module in &file.modules {
            if modules.insert(module.name.as_str(), module).is_some() {
                return Err(ParserError::DuplicateName {
                    scope: "netlist".to_string(),
                    name: module.name.clone(),
                });
            }
        }
        Ok(Self { modules })
    }

    pub fn get(&self, name: &str) -> Option<&'a ModuleDecl> {
        self.modules.get(name).copied()
    }

    /// Ports take the first `VarId`s of a module, in declaration order.
    pub fn get_port(&self, module_name: &str, port: &str) -> Option<PortSignature> {
        let module = self.get(module_name)?;
        module
            .ports
            .iter()
            .enumerate()
            .find(|(_, p)| p.name == port)
            .map(|(index, p)| PortSignature {
                id: VarId(index),
                direction: p.direction,
                width: p.width,
            })
    }
}
