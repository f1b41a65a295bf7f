//! CollectCalls (§1, §4, §6): the top-level pass entry point, driving the
//! five sub-passes bottom-up over every module in the circuit and producing
//! a rewritten circuit, a filtered annotation stream, and any soft
//! diagnostics collected along the way (§9).

pub mod instance_planner;
pub mod method_extractor;
pub mod name_gen;
pub mod rewriter;
pub mod state_scanner;
pub mod structural_validator;
pub mod summary;

use std::collections::{HashMap, HashSet};

use crate::annotations::{Annotation, MethodCallAnnotation, MethodIoAnnotation};
use crate::collect_calls::instance_planner::{direct_submodule_decls, plan_instances};
use crate::collect_calls::method_extractor::{extract_methods, find_state_writes_outside_methods};
use crate::collect_calls::rewriter::rewrite_module;
use crate::collect_calls::state_scanner::scan_state;
use crate::collect_calls::structural_validator::{
    check_module, check_no_intra_module_calls, check_no_recursion,
};
use crate::collect_calls::summary::{CallInfo, MethodInfo, UntimedModuleInfo};
use crate::errors::{CollectCallsError, Diagnostic, ErrorCollector};
use crate::ir::{Circuit, Module, Statement};

/// Runs the whole pass over `circuit` (§1). `annotations` is the front-end's
/// combined Method-IO / Method-Call / other annotation stream; `abstracted`
/// is the set of module names the caller wants elaborated abstractly rather
/// than inlined, which this implementation does not support (§6) — any
/// non-empty set fails fast with [`CollectCallsError::UnsupportedAbstraction`].
///
/// Returns the rewritten circuit, the annotation stream with every
/// Method-IO / Method-Call entry removed (all other entries passed through
/// unchanged and in their original relative order, §6/P3), and any soft
/// diagnostics collected along the way — currently just the §9 "state
/// update outside any method region" observation, which is silently ignored
/// structurally but still surfaced here rather than left undetectable.
pub fn collect_calls(
    circuit: &Circuit,
    annotations: &[Annotation],
    abstracted: &HashSet<String>,
) -> Result<(Circuit, Vec<Annotation>, Vec<Diagnostic>), CollectCallsError> {
    if !abstracted.is_empty() {
        return Err(CollectCallsError::UnsupportedAbstraction);
    }

    let method_io_by_module = group_method_io(annotations);
    let method_call_by_module = group_method_calls(annotations);

    let mut cache: HashMap<String, UntimedModuleInfo> = HashMap::new();
    let mut in_progress: HashSet<String> = HashSet::new();
    for module in &circuit.modules {
        build_module_info(
            circuit,
            &module.name,
            &method_io_by_module,
            &method_call_by_module,
            &mut cache,
            &mut in_progress,
        )?;
    }

    for module_info in cache.values() {
        check_module(module_info)?;
    }

    let all_method_calls: Vec<MethodCallAnnotation> = annotations
        .iter()
        .filter_map(|a| a.as_method_call().cloned())
        .collect();
    check_no_intra_module_calls(&all_method_calls)?;

    let type_graph = build_type_graph(circuit, &cache);
    check_no_recursion(&type_graph)?;

    let mut diagnostics = ErrorCollector::new();
    let mut rewritten_modules = Vec::with_capacity(circuit.modules.len());
    for module in &circuit.modules {
        let module_info = cache
            .get(&module.name)
            .expect("a summary was built for every module above");
        let declaration_order = direct_submodule_decls(module);
        let names_in_use = collect_names_in_use(module);
        let plan = plan_instances(module_info, &declaration_order, names_in_use);
        let method_calls = method_call_by_module
            .get(module.name.as_str())
            .cloned()
            .unwrap_or_default();
        let empty_io: Vec<&MethodIoAnnotation> = Vec::new();
        let ios = method_io_by_module
            .get(module.name.as_str())
            .unwrap_or(&empty_io);
        find_state_writes_outside_methods(module, ios, &module_info.local_state, &mut diagnostics);

        rewritten_modules.push(rewrite_module(
            module,
            module_info,
            &declaration_order,
            &plan,
            &method_calls,
        ));
    }

    let rewritten_circuit = Circuit {
        main: circuit.main.clone(),
        modules: rewritten_modules,
    };

    let output_annotations: Vec<Annotation> = annotations
        .iter()
        .filter(|a| !matches!(a, Annotation::MethodIo(_) | Annotation::MethodCall(_)))
        .cloned()
        .collect();

    Ok((rewritten_circuit, output_annotations, diagnostics.into_diagnostics()))
}

fn group_method_io<'a>(
    annotations: &'a [Annotation],
) -> HashMap<&'a str, Vec<&'a MethodIoAnnotation>> {
    let mut map: HashMap<&str, Vec<&MethodIoAnnotation>> = HashMap::new();
    for a in annotations {
        if let Some(io) = a.as_method_io() {
            map.entry(io.module.as_str()).or_default().push(io);
        }
    }
    map
}

fn group_method_calls<'a>(
    annotations: &'a [Annotation],
) -> HashMap<&'a str, Vec<&'a MethodCallAnnotation>> {
    let mut map: HashMap<&str, Vec<&MethodCallAnnotation>> = HashMap::new();
    for a in annotations {
        if let Some(call) = a.as_method_call() {
            map.entry(call.caller_module.as_str()).or_default().push(call);
        }
    }
    map
}

/// Builds the summary for `module_name`, recursing into its direct
/// submodules first (leaf-first, §4 "bottom-up") and memoizing by module
/// type name so a type instantiated more than once is only summarized
/// once. The returned value's own `name` is the module's type name; each
/// entry of its `submodules` is a renamed copy carrying the *instance*
/// name it was declared under in this particular parent, which is what
/// [`structural_validator::check_module`] and the instance planner key
/// their lookups on (§3 "submodules are kept in instance-declaration
/// order").
///
/// `in_progress` guards against a module type that (directly or
/// transitively) instantiates itself: the IR's statement tree is never
/// itself cyclic (§9 "Cyclic references"), but a chain of `InstanceDecl`s
/// can still name a module type that is its own ancestor, which would make
/// a naive recursive descent loop forever. When that happens, the inner
/// call returns an empty stub instead of recursing further; the cycle
/// itself is still caught correctly afterwards by
/// [`structural_validator::check_no_recursion`] over the completed,
/// non-stubbed summaries built by [`build_type_graph`].
fn build_module_info(
    circuit: &Circuit,
    module_name: &str,
    method_io_by_module: &HashMap<&str, Vec<&MethodIoAnnotation>>,
    method_call_by_module: &HashMap<&str, Vec<&MethodCallAnnotation>>,
    cache: &mut HashMap<String, UntimedModuleInfo>,
    in_progress: &mut HashSet<String>,
) -> Result<UntimedModuleInfo, CollectCallsError> {
    if let Some(existing) = cache.get(module_name) {
        return Ok(existing.clone());
    }
    if in_progress.contains(module_name) {
        return Ok(UntimedModuleInfo {
            name: module_name.to_owned(),
            local_state: vec![],
            methods: vec![],
            submodules: vec![],
        });
    }
    in_progress.insert(module_name.to_owned());

    let module = circuit
        .get_module(module_name)
        .expect("a module referenced by an instance declaration exists in the circuit");
    let local_state = scan_state(&module.body);

    let mut submodules = Vec::new();
    for (instance_name, child_type) in direct_submodule_decls(module) {
        let child_info = build_module_info(
            circuit,
            &child_type,
            method_io_by_module,
            method_call_by_module,
            cache,
            in_progress,
        )?;
        submodules.push(UntimedModuleInfo {
            name: instance_name,
            ..child_info
        });
    }

    let empty_io: Vec<&MethodIoAnnotation> = Vec::new();
    let empty_calls: Vec<&MethodCallAnnotation> = Vec::new();
    let ios = method_io_by_module.get(module_name).unwrap_or(&empty_io);
    let calls = method_call_by_module
        .get(module_name)
        .unwrap_or(&empty_calls);
    let methods = extract_methods(module, ios, calls)?;

    let info = UntimedModuleInfo {
        name: module_name.to_owned(),
        local_state,
        methods,
        submodules,
    };
    cache.insert(module_name.to_owned(), info.clone());
    in_progress.remove(module_name);
    Ok(info)
}

/// A type-keyed view of the call graph for recursion detection (§4.3 rule
/// 4): every `CallInfo.calleeParent` produced by the Method Extractor is an
/// *instance* name local to its caller, but the inter-method call graph is
/// really a graph over module *types* (two instances of the same type share
/// the same method bodies and would otherwise need identical cycles
/// detected twice). This builds a translated copy of each module's methods
/// with `calleeParent` resolved from instance name to declared module type.
fn build_type_graph(
    circuit: &Circuit,
    cache: &HashMap<String, UntimedModuleInfo>,
) -> HashMap<String, UntimedModuleInfo> {
    let mut graph = HashMap::new();
    for module in &circuit.modules {
        let info = &cache[&module.name];
        let instance_to_type: HashMap<String, String> = direct_submodule_decls(module)
            .into_iter()
            .collect();

        let translated_methods = info
            .methods
            .iter()
            .map(|m| {
                let calls = m
                    .calls
                    .iter()
                    .map(|c| CallInfo {
                        callee_parent: instance_to_type
                            .get(&c.callee_parent)
                            .cloned()
                            .unwrap_or_else(|| c.callee_parent.clone()),
                        callee_method: c.callee_method.clone(),
                        caller_port_name: c.caller_port_name.clone(),
                    })
                    .collect();
                MethodInfo {
                    name: m.name.clone(),
                    io_port_name: m.io_port_name.clone(),
                    writes: m.writes.clone(),
                    calls,
                }
            })
            .collect();

        graph.insert(
            module.name.clone(),
            UntimedModuleInfo {
                name: module.name.clone(),
                local_state: vec![],
                methods: translated_methods,
                submodules: vec![],
            },
        );
    }
    graph
}

/// Every name already in use at the top level of `module` (ports, wires,
/// nodes, registers, memories, instances), so the fresh-instance-name
/// generator never collides with an existing identifier (§4.4).
fn collect_names_in_use(module: &Module) -> Vec<String> {
    let mut names: Vec<String> = module.ports.iter().map(|p| p.name.clone()).collect();
    collect_names_in_block(&module.body, &mut names);
    names
}

fn collect_names_in_block(body: &[Statement], names: &mut Vec<String>) {
    for stmt in body {
        match stmt {
            Statement::RegisterDecl { name, .. }
            | Statement::MemoryDecl { name, .. }
            | Statement::WireDecl { name, .. }
            | Statement::NodeDecl { name, .. }
            | Statement::InstanceDecl { name, .. } => names.push(name.clone()),
            Statement::Conditional {
                then_block,
                else_block,
                ..
            } => {
                collect_names_in_block(then_block, names);
                collect_names_in_block(else_block, names);
            }
            Statement::Connection { .. } | Statement::Invalidate { .. } => {}
        }
    }
}
