//! Structural Validator (§4.3). Rules 1 and 2 run per-module, after that
//! module's children are fully summarized; rules 3 and 4 run once, at the
//! top-level pass entry, over the union of all annotations / all module
//! summaries (§4.3 "Rules 3 and 4 are applied once at the top-level pass
//! entry").

use std::collections::{HashMap, HashSet};

use crate::annotations::MethodCallAnnotation;
use crate::collect_calls::summary::UntimedModuleInfo;
use crate::errors::CollectCallsError;

/// Rules 1 (known submodule) and 2 (stateful-call determinism), checked
/// against one module's already-built summary and its already-summarized
/// children.
pub fn check_module(module_info: &UntimedModuleInfo) -> Result<(), CollectCallsError> {
    let known_children: HashSet<&str> = module_info
        .submodules
        .iter()
        .map(|s| s.name.as_str())
        .collect();

    for method in &module_info.methods {
        let mut seen_parents: HashSet<&str> = HashSet::new();
        for parent in method.calls.iter().map(|c| c.callee_parent.as_str()) {
            if !seen_parents.insert(parent) {
                continue;
            }
            if !known_children.contains(parent) {
                return Err(CollectCallsError::UnknownCallee {
                    module_name: module_info.name.clone(),
                    callee_parent: parent.to_owned(),
                });
            }
            let Some(child) = module_info.get_submodule(parent) else {
                continue;
            };
            if child.has_state() {
                let callee_methods: Vec<String> =
                    method.calls_to(parent).map(|c| c.callee_method.clone()).collect();
                if callee_methods.len() > 1 {
                    return Err(CollectCallsError::StatefulCallNonDeterminism {
                        module_name: module_info.name.clone(),
                        method_name: method.name.clone(),
                        submodule_name: parent.to_owned(),
                        callee_methods,
                    });
                }
            }
        }
    }
    Ok(())
}

/// Rule 3: a call annotation whose `calleeParent` equals the caller module
/// itself is rejected, regardless of which module is being summarized right
/// now (§4.3 "applied once ... over the union of annotations").
pub fn check_no_intra_module_calls(
    method_calls: &[MethodCallAnnotation],
) -> Result<(), CollectCallsError> {
    for call in method_calls {
        if call.callee_parent == call.caller_module {
            return Err(CollectCallsError::IntraModuleCall {
                module_name: call.caller_module.clone(),
                method_name: call.callee_method.clone(),
            });
        }
    }
    Ok(())
}

/// Rule 4: no method in the program transitively calls itself. The call
/// graph's nodes are `(module, method)` pairs; an edge exists from
/// `(module, method)` to `(calleeParent, calleeMethod)` for every call
/// recorded in that method's summary. Detected via DFS with an explicit
/// recursion stack (§9 "Cyclic references").
pub fn check_no_recursion(
    summaries: &HashMap<String, UntimedModuleInfo>,
) -> Result<(), CollectCallsError> {
    type Node = (String, String);

    let mut graph: HashMap<Node, Vec<Node>> = HashMap::new();
    for module_info in summaries.values() {
        for method in &module_info.methods {
            let node = (module_info.name.clone(), method.name.clone());
            let edges = graph.entry(node).or_default();
            for call in &method.calls {
                edges.push((call.callee_parent.clone(), call.callee_method.clone()));
            }
        }
    }

    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        OnStack,
        Done,
    }

    let mut marks: HashMap<Node, Mark> = HashMap::new();
    let mut stack_path: Vec<Node> = Vec::new();

    fn visit(
        node: &(String, String),
        graph: &HashMap<(String, String), Vec<(String, String)>>,
        marks: &mut HashMap<(String, String), Mark>,
        stack_path: &mut Vec<(String, String)>,
    ) -> Result<(), CollectCallsError> {
        match marks.get(node) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::OnStack) => {
                let start = stack_path.iter().position(|n| n == node).unwrap_or(0);
                let mut cycle: Vec<String> = stack_path[start..]
                    .iter()
                    .map(|(m, meth)| format!("{m}.{meth}"))
                    .collect();
                cycle.push(format!("{}.{}", node.0, node.1));
                return Err(CollectCallsError::RecursiveCall { cycle });
            }
            None => {}
        }

        marks.insert(node.clone(), Mark::OnStack);
        stack_path.push(node.clone());

        if let Some(edges) = graph.get(node) {
            for next in edges {
                visit(next, graph, marks, stack_path)?;
            }
        }

        stack_path.pop();
        marks.insert(node.clone(), Mark::Done);
        Ok(())
    }

    let nodes: Vec<Node> = graph.keys().cloned().collect();
    for node in nodes {
        visit(&node, &graph, &mut marks, &mut stack_path)?;
    }
    Ok(())
}
