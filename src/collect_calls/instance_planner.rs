//! Instance Planner (§4.4): decides, per submodule, how many physical
//! instances of it are required and what each is named.

use std::collections::HashMap;

use crate::collect_calls::name_gen::InstanceNameGenerator;
use crate::collect_calls::summary::UntimedModuleInfo;
use crate::ir::{Module, Statement};

/// One physical instance the Rewriter must declare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedInstance {
    /// The name this instance gets in the rewritten IR. For the first copy
    /// of a submodule this is the front-end's original instance name; for
    /// any further stateless copies it is a fresh name (§4.4).
    pub instance_name: String,
    pub module_name: String,
}

/// The plan for one module: for every original front-end submodule
/// declaration, zero or more [`PlannedInstance`]s, keyed by the front-end's
/// original instance name so the Rewriter can look up "the Nth copy of
/// `ii`".
#[derive(Debug, Clone, Default)]
pub struct ModuleInstancePlan {
    by_source_name: HashMap<String, Vec<PlannedInstance>>,
}

impl ModuleInstancePlan {
    /// The materialized instances for the submodule originally declared as
    /// `source_name`, in allocation order (first element keeps the original
    /// name). Empty if that submodule was not materialized at all.
    pub fn instances_for(&self, source_name: &str) -> &[PlannedInstance] {
        self.by_source_name
            .get(source_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every planned instance across every submodule, in the order the
    /// Rewriter should declare them: submodule declaration order, then
    /// allocation order within a submodule (§4.5 point 1, §5 "instance
    /// declarations precede connections").
    pub fn all_instances_in_order<'a>(
        &'a self,
        declaration_order: &'a [String],
    ) -> impl Iterator<Item = &'a PlannedInstance> + 'a {
        declaration_order
            .iter()
            .flat_map(move |name| self.instances_for(name))
    }
}

/// Returns, in textual order, the `(instance_name, module_name)` of every
/// `InstanceDecl` at the top level of `module`'s body — the front-end's
/// chosen submodule declarations this module directly owns.
pub fn direct_submodule_decls(module: &Module) -> Vec<(String, String)> {
    module
        .body
        .iter()
        .filter_map(|stmt| match stmt {
            Statement::InstanceDecl {
                name, module_name, ..
            } => Some((name.clone(), module_name.clone())),
            _ => None,
        })
        .collect()
}

/// Builds the instance plan for `module`, given the already-computed
/// `UntimedModuleInfo` for this module (whose `methods[..].calls` and
/// `submodules[..]` describe the calls made and the children's statefulness)
/// and the set of names already in use in this module (ports, wires, nodes,
/// instances) so the fresh-name generator never collides with them.
pub fn plan_instances(
    module_info: &UntimedModuleInfo,
    declaration_order: &[(String, String)],
    names_in_use: impl IntoIterator<Item = String>,
) -> ModuleInstancePlan {
    let mut name_gen = InstanceNameGenerator::new(names_in_use);
    let mut plan = ModuleInstancePlan::default();

    for (source_name, child_module_name) in declaration_order {
        let Some(child) = module_info.get_submodule(source_name) else {
            continue;
        };
        let module_name = child_module_name.clone();

        if child.has_state() {
            plan.by_source_name.insert(
                source_name.clone(),
                vec![PlannedInstance {
                    instance_name: source_name.clone(),
                    module_name,
                }],
            );
            continue;
        }

        let k = module_info
            .methods
            .iter()
            .map(|method| max_same_callee_method_count(method, source_name))
            .max()
            .unwrap_or(0);

        if k == 0 {
            continue;
        }

        let mut instances = Vec::with_capacity(k);
        instances.push(PlannedInstance {
            instance_name: source_name.clone(),
            module_name: module_name.clone(),
        });
        for _ in 1..k {
            instances.push(PlannedInstance {
                instance_name: name_gen.fresh(source_name),
                module_name: module_name.clone(),
            });
        }
        plan.by_source_name.insert(source_name.clone(), instances);
    }

    plan
}

fn max_same_callee_method_count(
    method: &crate::collect_calls::summary::MethodInfo,
    source_name: &str,
) -> usize {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for call in method.calls_to(source_name) {
        *counts.entry(call.callee_method.as_str()).or_insert(0) += 1;
    }
    counts.values().copied().max().unwrap_or(0)
}
