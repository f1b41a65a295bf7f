//! Method Extractor (§4.2): finds method regions in a module body and
//! produces one [`MethodInfo`] per method.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::annotations::{MethodCallAnnotation, MethodIoAnnotation};
use crate::collect_calls::summary::{CallInfo, MethodInfo, StateRef};
use crate::errors::{CollectCallsError, ErrorCollector};
use crate::ir::{Expression, Module, Statement};

/// True if `predicate`/`else_block` together identify a method region per
/// §4.2 "Region identification": the predicate is exactly `ref(P).enabled`
/// for a port `P` in `io_ports`, and the else-block is empty. Shared between
/// [`extract_methods`] (which only recognizes method regions at the top
/// level of a module body) and [`find_state_writes_outside_methods`] (which
/// needs the same recognition to know which top-level conditionals to skip).
fn recognized_method_region<'a>(
    predicate: &Expression,
    else_block: &[Statement],
    io_ports: &HashMap<&'a str, &'a str>,
) -> Option<(&'a str, &'a str)> {
    let (port, method) = io_ports
        .iter()
        .find_map(|(port, method)| predicate.is_field_of(port, "enabled").then_some((*port, *method)))?;
    if !else_block.is_empty() {
        return None;
    }
    Some((port, method))
}

/// `caller_port -> (calleeParent, calleeMethod)`, derived from the
/// Method-Call annotations belonging to one module. A caller-side call port
/// may have more than one annotation attached to it (one per `role`, §3),
/// but they all describe the same callee, so the first one seen wins.
fn build_call_port_targets(
    method_calls: &[&MethodCallAnnotation],
) -> HashMap<String, (String, String)> {
    let mut out = HashMap::new();
    for call in method_calls {
        out.entry(call.caller_port.clone())
            .or_insert_with(|| (call.callee_parent.clone(), call.callee_method.clone()));
    }
    out
}

struct RegionWalk<'a> {
    module_name: &'a str,
    method_name: &'a str,
    io_port_name: &'a str,
    call_port_targets: &'a HashMap<String, (String, String)>,
    local_names: HashSet<String>,
    calls: Vec<CallInfo>,
    seen_call_ports: HashSet<String>,
    writes: BTreeSet<String>,
}

impl<'a> RegionWalk<'a> {
    fn forbidden(&self, kind: &'static str, decl_name: &str) -> CollectCallsError {
        CollectCallsError::InvalidDeclInMethod {
            kind,
            decl_name: decl_name.to_owned(),
            method_name: self.method_name.to_owned(),
            module_name: self.module_name.to_owned(),
        }
    }

    fn record_lvalue(&mut self, lvalue: &Expression) {
        // A write to `ref(C).enabled` for a known call port `C` records a
        // call rather than a write (§4.2 "Call enable writes").
        for (call_port, (callee_parent, callee_method)) in self.call_port_targets {
            if lvalue.is_field_of(call_port, "enabled") {
                if self.seen_call_ports.insert(call_port.clone()) {
                    self.calls.push(CallInfo {
                        callee_parent: callee_parent.clone(),
                        callee_method: callee_method.clone(),
                        caller_port_name: call_port.clone(),
                    });
                }
                return;
            }
        }

        let Some(root) = lvalue.root_name() else {
            return;
        };
        if self.local_names.contains(root) {
            return;
        }
        if root == self.io_port_name {
            return;
        }
        if self.call_port_targets.contains_key(root) {
            return;
        }
        self.writes.insert(root.to_owned());
    }

    fn walk(&mut self, body: &[Statement]) -> Result<(), CollectCallsError> {
        for stmt in body {
            match stmt {
                Statement::WireDecl { name, .. } | Statement::NodeDecl { name, .. } => {
                    self.local_names.insert(name.clone());
                }
                Statement::RegisterDecl { name, .. } => {
                    return Err(self.forbidden("register", name));
                }
                Statement::MemoryDecl { name, .. } => {
                    return Err(self.forbidden("memory", name));
                }
                Statement::InstanceDecl { name, .. } => {
                    return Err(self.forbidden("instance", name));
                }
                Statement::Connection { lvalue, .. } => {
                    self.record_lvalue(lvalue);
                }
                Statement::Invalidate { lvalue, .. } => {
                    self.record_lvalue(lvalue);
                }
                Statement::Conditional {
                    then_block,
                    else_block,
                    ..
                } => {
                    self.walk(then_block)?;
                    self.walk(else_block)?;
                }
            }
        }
        Ok(())
    }
}

/// Finds every method region in `module`'s body and extracts its
/// [`MethodInfo`]. `method_io` and `method_calls` must already be filtered
/// to annotations belonging to `module`.
pub fn extract_methods(
    module: &Module,
    method_io: &[&MethodIoAnnotation],
    method_calls: &[&MethodCallAnnotation],
) -> Result<Vec<MethodInfo>, CollectCallsError> {
    let io_ports: HashMap<&str, &str> = method_io
        .iter()
        .map(|a| (a.port.as_str(), a.method_name.as_str()))
        .collect();
    let call_port_targets = build_call_port_targets(method_calls);

    let mut methods = Vec::new();

    for stmt in &module.body {
        let Statement::Conditional {
            predicate,
            then_block,
            else_block,
            ..
        } = stmt
        else {
            continue;
        };

        // A method region's predicate is exactly `ref(P).enabled` for a
        // port `P` known to the Method-IO map of this module, and its
        // else-block must be empty (§4.2 "Region identification"). Anything
        // else is simply not recognized as a method; other gating is
        // permitted elsewhere.
        let Some((io_port_name, method_name)) =
            recognized_method_region(predicate, else_block, &io_ports)
        else {
            continue;
        };

        let mut walk = RegionWalk {
            module_name: &module.name,
            method_name,
            io_port_name,
            call_port_targets: &call_port_targets,
            local_names: HashSet::new(),
            calls: Vec::new(),
            seen_call_ports: HashSet::new(),
            writes: BTreeSet::new(),
        };
        walk.walk(then_block)?;

        methods.push(MethodInfo {
            name: method_name.to_owned(),
            io_port_name: io_port_name.to_owned(),
            writes: walk.writes,
            calls: walk.calls,
        });
    }

    Ok(methods)
}

/// Scans `module` for connections/invalidates that write one of its own
/// local-state signals (registers or memories) *outside* any recognized
/// method region, and reports each one found into `collector` (§9: "the
/// source contains a TODO about state updates outside any method region;
/// current behavior is to silently ignore such updates ... but may
/// additionally emit a diagnostic"). The write itself is still silently
/// ignored by the rest of the pass (the rewriter only ever touches method
/// regions and instance wiring); this only makes the otherwise-invisible
/// "front-end wrote it outside a method region and it was dropped" case
/// distinguishable from "the front-end never wrote it at all", per §9's
/// instruction to surface this ambiguity rather than guess past it.
///
/// Only the top level of the module body is ever recognized as containing
/// method regions (matching [`extract_methods`]'s own scope), so this walk
/// skips exactly the statements `extract_methods` itself would have
/// consumed and recurses into everything else, including other
/// (non-method) conditional gating.
pub fn find_state_writes_outside_methods(
    module: &Module,
    method_io: &[&MethodIoAnnotation],
    local_state: &[StateRef],
    collector: &mut ErrorCollector,
) {
    let io_ports: HashMap<&str, &str> = method_io
        .iter()
        .map(|a| (a.port.as_str(), a.method_name.as_str()))
        .collect();
    let state_names: HashSet<&str> = local_state.iter().map(|s| s.name.as_str()).collect();

    scan_outside_methods(&module.body, &io_ports, &state_names, &module.name, collector);
}

fn scan_outside_methods(
    body: &[Statement],
    io_ports: &HashMap<&str, &str>,
    state_names: &HashSet<&str>,
    module_name: &str,
    collector: &mut ErrorCollector,
) {
    for stmt in body {
        match stmt {
            Statement::Conditional {
                predicate,
                then_block,
                else_block,
                ..
            } => {
                if recognized_method_region(predicate, else_block, io_ports).is_some() {
                    continue;
                }
                scan_outside_methods(then_block, io_ports, state_names, module_name, collector);
                scan_outside_methods(else_block, io_ports, state_names, module_name, collector);
            }
            Statement::Connection { lvalue, span, .. } | Statement::Invalidate { lvalue, span } => {
                let Some(root) = lvalue.root_name() else {
                    continue;
                };
                if state_names.contains(root) {
                    collector.warn(
                        module_name,
                        *span,
                        format!(
                            "state `{root}` is written outside any method region in module {module_name}; this write is silently ignored"
                        ),
                    );
                }
            }
            Statement::RegisterDecl { .. }
            | Statement::MemoryDecl { .. }
            | Statement::WireDecl { .. }
            | Statement::NodeDecl { .. }
            | Statement::InstanceDecl { .. } => {}
        }
    }
}
