//! Rewriter (§4.5): emits a new module body with instance declarations,
//! per-instance default connections, per-call-port default connections, and
//! the call-to-instance wiring, with the original (annotation-stripped)
//! body appended last so its own connections override the defaults under
//! the target IR's last-connect semantics (§4.5, §GLOSSARY).
//!
//! §4.5 point 3 names the return-direction connection
//! (`callerPort.ret ← instance.calleeMethod.ret`) as the wiring this step
//! adds; for the call to actually reach the instance this implementation
//! also emits the forward `enabled`/`arg` connections
//! (`instance.calleeMethod.enabled ← callerPort.enabled`,
//! `instance.calleeMethod.arg ← callerPort.arg`) — otherwise a call port's
//! `enabled`/`arg` writes in the (unchanged) original body would never
//! reach the instance they target. This is recorded as a resolved
//! implementation decision in DESIGN.md, not left as a guess.

use std::collections::HashMap;

use crate::annotations::MethodCallAnnotation;
use crate::collect_calls::instance_planner::ModuleInstancePlan;
use crate::collect_calls::summary::UntimedModuleInfo;
use crate::errors::Span;
use crate::ir::{Expression, Module, Statement};

const ZERO_BIT: Expression = Expression::Literal { width: 1, value: 0 };

/// Every distinct call port of `module`, in first-occurrence order of the
/// (already order-preserving) `method_calls` annotation list. A call port
/// may have more than one annotation (one per `role`, §3); only its first
/// appearance matters here.
fn distinct_call_ports(method_calls: &[&MethodCallAnnotation]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for call in method_calls {
        if seen.insert(call.caller_port.clone()) {
            out.push(call.caller_port.clone());
        }
    }
    out
}

/// Rewrites `module` per §4.5. `declaration_order` is the front-end's
/// original submodule declarations (name, module type), in textual order;
/// `plan` is the Instance Planner's decision for this module; `method_calls`
/// are the Method-Call annotations whose `caller_module` is this module.
pub fn rewrite_module(
    module: &Module,
    module_info: &UntimedModuleInfo,
    declaration_order: &[(String, String)],
    plan: &ModuleInstancePlan,
    method_calls: &[&MethodCallAnnotation],
) -> Module {
    let mut body = Vec::new();

    // 1. Instance declarations, then clock/reset/default wiring for each,
    // before any other connections (§3 invariant, P1, P2).
    for (source_name, _child_module_name) in declaration_order {
        for inst in plan.instances_for(source_name) {
            body.push(Statement::InstanceDecl {
                name: inst.instance_name.clone(),
                module_name: inst.module_name.clone(),
                span: Span::NONE,
            });
            body.push(Statement::connect(
                Expression::field(&inst.instance_name, "clock"),
                Expression::Ref("clock".to_owned()),
            ));
            body.push(Statement::connect(
                Expression::field(&inst.instance_name, "reset"),
                Expression::Ref("reset".to_owned()),
            ));

            let child = module_info
                .get_submodule(source_name)
                .expect("a planned instance always has a submodule summary");
            for method in &child.methods {
                body.push(Statement::connect(
                    Expression::path(&[&inst.instance_name, &method.io_port_name, "enabled"]),
                    ZERO_BIT,
                ));
                body.push(Statement::invalidate(Expression::path(&[
                    &inst.instance_name,
                    &method.io_port_name,
                    "arg",
                ])));
            }
        }
    }

    // 2. Default wiring for every call port of this module.
    for caller_port in distinct_call_ports(method_calls) {
        body.push(Statement::connect(
            Expression::field(&caller_port, "enabled"),
            ZERO_BIT,
        ));
        body.push(Statement::invalidate(Expression::field(
            &caller_port,
            "arg",
        )));
    }

    // 3. Call-to-instance wiring, method by method, call-site by call-site,
    // in the order the Method Extractor recorded them (§4.5 point 3).
    for method in &module_info.methods {
        let mut occurrence: HashMap<(String, String), usize> = HashMap::new();
        for call in &method.calls {
            let instances = plan.instances_for(&call.callee_parent);
            if instances.is_empty() {
                continue;
            }
            let key = (call.callee_parent.clone(), call.callee_method.clone());
            let slot = occurrence.entry(key).or_insert(0);
            let chosen = &instances[*slot % instances.len()];
            *slot += 1;

            let callee_summary = module_info
                .get_submodule(&call.callee_parent)
                .expect("validator guarantees calleeParent is a known submodule");
            let callee_method = callee_summary
                .get_method(&call.callee_method)
                .expect("validator guarantees calleeMethod exists on the callee");
            let method_port = callee_method.io_port_name.as_str();

            body.push(Statement::connect(
                Expression::path(&[&chosen.instance_name, method_port, "enabled"]),
                Expression::field(&call.caller_port_name, "enabled"),
            ));
            body.push(Statement::connect(
                Expression::path(&[&chosen.instance_name, method_port, "arg"]),
                Expression::field(&call.caller_port_name, "arg"),
            ));
            body.push(Statement::connect(
                Expression::field(&call.caller_port_name, "ret"),
                Expression::path(&[&chosen.instance_name, method_port, "ret"]),
            ));
        }
    }

    // 4. The original body, unchanged, except that the front-end's own
    // `InstanceDecl` statements are dropped: step 1 above already re-emits a
    // declaration for every *materialized* instance (and correctly omits one
    // for any submodule the Instance Planner decided not to materialize at
    // all, §4.4), so re-appending the originals here would either duplicate
    // a materialized instance's declaration or resurrect one that should have
    // been dropped. Annotation removal happens at the annotation-list level,
    // not here; the body itself never referenced annotations directly.
    body.extend(
        module
            .body
            .iter()
            .filter(|stmt| !matches!(stmt, Statement::InstanceDecl { .. }))
            .cloned(),
    );

    Module {
        name: module.name.clone(),
        ports: module.ports.clone(),
        body,
    }
}
