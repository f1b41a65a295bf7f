//! State Scanner (§4.1): enumerates register and memory declarations
//! anywhere in a module body, depth-first, in textual order. Instance
//! declarations are not state; a stateful submodule is only accounted for
//! transitively, through `hasState` (§3).

use crate::collect_calls::summary::StateRef;
use crate::ir::{IrType, Statement};

pub fn scan_state(body: &[Statement]) -> Vec<StateRef> {
    let mut out = Vec::new();
    scan_block(body, &mut out);
    out
}

fn scan_block(body: &[Statement], out: &mut Vec<StateRef>) {
    for stmt in body {
        match stmt {
            Statement::RegisterDecl { name, typ, .. } => {
                out.push(StateRef {
                    name: name.clone(),
                    typ: typ.clone(),
                });
            }
            Statement::MemoryDecl {
                name,
                element_type,
                depth,
                ..
            } => {
                out.push(StateRef {
                    name: name.clone(),
                    typ: IrType::vector_of(element_type.clone(), *depth),
                });
            }
            Statement::Conditional {
                then_block,
                else_block,
                ..
            } => {
                scan_block(then_block, out);
                scan_block(else_block, out);
            }
            Statement::WireDecl { .. }
            | Statement::NodeDecl { .. }
            | Statement::InstanceDecl { .. }
            | Statement::Connection { .. }
            | Statement::Invalidate { .. } => {}
        }
    }
}
