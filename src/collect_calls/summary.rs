//! Per-module summaries (§3): `UntimedModuleInfo`, `MethodInfo`, `CallInfo`,
//! and the `hasState` predicate. Built bottom-up and never mutated after
//! construction (§3 "Lifecycle"), the same "value type, built once" shape
//! the teacher uses for `FlattenedModule`/`Module` (`flattening.rs`).

use std::collections::BTreeSet;

use crate::ir::IrType;

/// One register or memory declaration found by the State Scanner (§4.1). For
/// a memory, `typ` is the vector-of-element-type the Scanner builds from its
/// depth and element type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateRef {
    pub name: String,
    pub typ: IrType,
}

/// One submodule method invocation recorded inside a method body (§3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallInfo {
    pub callee_parent: String,
    pub callee_method: String,
    pub caller_port_name: String,
}

/// `{ name, ioPortName, writes, calls }` (§3). `writes` is a set (iteration
/// order does not matter and must not be observed); `calls` is the ordered,
/// first-occurrence list of submodule invocations (§4.2 "Output ordering").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInfo {
    pub name: String,
    pub io_port_name: String,
    pub writes: BTreeSet<String>,
    pub calls: Vec<CallInfo>,
}

impl MethodInfo {
    /// Calls to methods of `submodule_name`, grouped in call order, the
    /// input to the stateful-call-determinism check (§4.3 rule 2) and the
    /// stateless duplication count (§4.4).
    pub fn calls_to<'a>(&'a self, submodule_name: &'a str) -> impl Iterator<Item = &'a CallInfo> {
        self.calls
            .iter()
            .filter(move |c| c.callee_parent == submodule_name)
    }
}

/// `{ name, localState, methods, submodules }` (§3). Submodules are kept in
/// instance-declaration order, matching "Across sibling children the order
/// follows the instance-declaration order in the parent body" (§5).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UntimedModuleInfo {
    pub name: String,
    pub local_state: Vec<StateRef>,
    pub methods: Vec<MethodInfo>,
    pub submodules: Vec<UntimedModuleInfo>,
}

impl UntimedModuleInfo {
    /// `hasState`: true iff `localState` is non-empty OR any submodule has
    /// `hasState = true`. Transitive through the whole subtree (§3).
    pub fn has_state(&self) -> bool {
        !self.local_state.is_empty() || self.submodules.iter().any(|s| s.has_state())
    }

    pub fn get_submodule(&self, name: &str) -> Option<&UntimedModuleInfo> {
        self.submodules.iter().find(|s| s.name == name)
    }

    pub fn get_method(&self, name: &str) -> Option<&MethodInfo> {
        self.methods.iter().find(|m| m.name == name)
    }
}
