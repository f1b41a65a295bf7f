//! Shared builders for the end-to-end scenario tests in `scenarios.rs`. Kept
//! in its own file (rather than `#[cfg(test)]` in `lib.rs`) since it is
//! infrastructure shared across several `tests/*.rs` binaries, matching how
//! the teacher splits reusable test scaffolding out of individual test files.

use std::collections::HashSet;

use untimed_collect_calls::annotations::{
    Annotation, CallRole, MethodCallAnnotation, MethodIoAnnotation,
};
use untimed_collect_calls::collect_calls;
use untimed_collect_calls::errors::{CollectCallsError, Diagnostic, Span};
use untimed_collect_calls::ir::{Circuit, Expression, IrType, Module, Port, PortDirection, Statement};

pub fn io_port(name: &str, arg_width: u32, ret_width: u32) -> Port {
    Port {
        name: name.to_owned(),
        direction: PortDirection::Input,
        typ: IrType::method_io_bundle(arg_width, ret_width),
        span: Span::NONE,
    }
}

pub fn method_region(io_port: &str, body: Vec<Statement>) -> Statement {
    Statement::Conditional {
        predicate: Expression::field(io_port, "enabled"),
        then_block: body,
        else_block: vec![],
        span: Span::NONE,
    }
}

pub fn instance_decl(name: &str, module_name: &str) -> Statement {
    Statement::InstanceDecl {
        name: name.to_owned(),
        module_name: module_name.to_owned(),
        span: Span::NONE,
    }
}

pub fn method_io(module: &str, port: &str, method_name: &str) -> Annotation {
    Annotation::MethodIo(MethodIoAnnotation {
        module: module.to_owned(),
        port: port.to_owned(),
        method_name: method_name.to_owned(),
    })
}

#[allow(clippy::too_many_arguments)]
pub fn method_call(
    caller_module: &str,
    caller_port: &str,
    callee_parent: &str,
    callee_method: &str,
    call_site_index: u32,
    role: CallRole,
) -> Annotation {
    Annotation::MethodCall(MethodCallAnnotation {
        caller_module: caller_module.to_owned(),
        caller_port: caller_port.to_owned(),
        callee_parent: callee_parent.to_owned(),
        callee_method: callee_method.to_owned(),
        call_site_index,
        role,
    })
}

pub fn run(
    circuit: &Circuit,
    annotations: &[Annotation],
) -> Result<(Circuit, Vec<Annotation>, Vec<Diagnostic>), CollectCallsError> {
    collect_calls(circuit, annotations, &HashSet::new())
}

/// Module `UntimedInc`: one method `inc: UInt32 -> UInt32`, `ret <- arg + 1`
/// modeled structurally as a direct connection (arithmetic lowering itself
/// is downstream-compiler territory, out of scope here; §8 scenario 1).
pub fn pure_inc_module() -> Module {
    let mut m = Module::new("UntimedInc");
    m.ports.push(io_port("inc", 32, 32));
    m.body.push(method_region(
        "inc",
        vec![Statement::connect(
            Expression::field("inc", "ret"),
            Expression::field("inc", "arg"),
        )],
    ));
    m
}

/// Module `Counter4Bit`: register `value: UInt4 = 0`, method `inc: () ->
/// UInt4` doing `value <- value + 1; ret <- value + 1` (§8 scenario 2).
pub fn counter_4bit_module() -> Module {
    let mut m = Module::new("Counter4Bit");
    m.ports.push(io_port("inc", 0, 4));
    m.body.push(Statement::RegisterDecl {
        name: "value".into(),
        typ: IrType::bit_vector(4),
        span: Span::NONE,
    });
    m.body.push(method_region(
        "inc",
        vec![
            Statement::connect(
                Expression::Ref("value".into()),
                Expression::Ref("value".into()),
            ),
            Statement::connect(
                Expression::field("inc", "ret"),
                Expression::Ref("value".into()),
            ),
        ],
    ));
    m
}

/// `UntimedInc` but with a register, so it is stateful — the callee used by
/// scenarios 3 and 4.
pub fn stateful_inc_module() -> Module {
    let mut m = pure_inc_module();
    m.body.insert(
        0,
        Statement::RegisterDecl {
            name: "value".into(),
            typ: IrType::bit_vector(4),
            span: Span::NONE,
        },
    );
    m
}
