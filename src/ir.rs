//! The circuit intermediate representation this pass consumes and produces
//! (§3). This is the "front-end collaborator" data model: the front-end DSL
//! that actually elaborates user syntax into this shape is out of scope
//! (§1), so this module only needs to describe the shape itself, as plain
//! immutable value types in the spirit of the teacher's `flattening`
//! module's `Instantiation`/`WireSource`/`ConnectionWrite` trees (§9
//! "Immutability": "Both IR and summaries should be value types").

use std::fmt;

use crate::errors::Span;

/// A bit-vector or bundle type. Bundles are how method IO ports
/// (`enabled`/`guard`/`arg`/`ret`) and submodule instances are typed; plain
/// bit-vectors are everything else. `Vector` is how a memory's element type
/// becomes "a vector-of-T type with length D" (§4.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IrType {
    BitVector { width: u32 },
    Bundle(Vec<(String, IrType)>),
    Vector { element: Box<IrType>, length: u64 },
}

impl IrType {
    pub fn bit_vector(width: u32) -> Self {
        IrType::BitVector { width }
    }
    pub fn vector_of(element: IrType, length: u64) -> Self {
        IrType::Vector {
            element: Box::new(element),
            length,
        }
    }
    /// Builds the standard method IO bundle type described in §3: `enabled`
    /// (1-bit input), `guard` (1-bit output), `arg`, `ret`. `arg`/`ret` may
    /// be zero-width, modeled as a 0-bit vector rather than an `Option`, so
    /// the four IO shapes (no arg/no ret, arg-only, ret-only, arg+ret) of §9
    /// "Polymorphism over method shapes" are a single uniform bundle shape
    /// the Method Extractor and Rewriter don't need to special-case.
    pub fn method_io_bundle(arg_width: u32, ret_width: u32) -> Self {
        IrType::Bundle(vec![
            ("enabled".to_owned(), IrType::bit_vector(1)),
            ("guard".to_owned(), IrType::bit_vector(1)),
            ("arg".to_owned(), IrType::bit_vector(arg_width)),
            ("ret".to_owned(), IrType::bit_vector(ret_width)),
        ])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    pub name: String,
    pub direction: PortDirection,
    pub typ: IrType,
    pub span: Span,
}

/// A reference expression: either a bare name, a sub-field access on another
/// expression, or a bit-vector literal. Mirrors `WireSource::WireRead` /
/// `ConnectionWritePathElement` in the teacher, collapsed into one
/// expression tree since this IR has no separate "path element" type for
/// r-values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    Ref(String),
    SubField(Box<Expression>, String),
    Literal { width: u32, value: u64 },
}

impl Expression {
    pub fn field(base: &str, field: &str) -> Self {
        Expression::SubField(Box::new(Expression::Ref(base.to_owned())), field.to_owned())
    }
    /// Builds a chain of sub-field accesses, e.g. `path(&["ii", "inc",
    /// "enabled"])` is `ii.inc.enabled`.
    pub fn path(parts: &[&str]) -> Self {
        let mut iter = parts.iter();
        let first = iter
            .next()
            .expect("Expression::path needs at least one segment");
        let mut expr = Expression::Ref((*first).to_owned());
        for part in iter {
            expr = Expression::SubField(Box::new(expr), (*part).to_owned());
        }
        expr
    }
    /// The first (root) name segment of this expression, used throughout
    /// §4.2/§4.3 ("the lvalue's first segment"). `None` for a bare literal.
    pub fn root_name(&self) -> Option<&str> {
        match self {
            Expression::Ref(name) => Some(name),
            Expression::SubField(base, _) => base.root_name(),
            Expression::Literal { .. } => None,
        }
    }
    /// True if this expression is exactly `ref(base).field`.
    pub fn is_field_of(&self, base: &str, field: &str) -> bool {
        matches!(self, Expression::SubField(b, f) if f == field && b.root_name() == Some(base))
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Ref(name) => write!(f, "{name}"),
            Expression::SubField(base, field) => write!(f, "{base}.{field}"),
            Expression::Literal { width, value } => write!(f, "{value}'{width}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    RegisterDecl {
        name: String,
        typ: IrType,
        span: Span,
    },
    MemoryDecl {
        name: String,
        element_type: IrType,
        depth: u64,
        span: Span,
    },
    WireDecl {
        name: String,
        typ: IrType,
        span: Span,
    },
    NodeDecl {
        name: String,
        value: Expression,
        span: Span,
    },
    InstanceDecl {
        name: String,
        module_name: String,
        span: Span,
    },
    Connection {
        lvalue: Expression,
        rvalue: Expression,
        span: Span,
    },
    Invalidate {
        lvalue: Expression,
        span: Span,
    },
    Conditional {
        predicate: Expression,
        then_block: Vec<Statement>,
        else_block: Vec<Statement>,
        span: Span,
    },
}

impl Statement {
    pub fn connect(lvalue: Expression, rvalue: Expression) -> Self {
        Statement::Connection {
            lvalue,
            rvalue,
            span: Span::NONE,
        }
    }
    pub fn invalidate(lvalue: Expression) -> Self {
        Statement::Invalidate {
            lvalue,
            span: Span::NONE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub name: String,
    pub ports: Vec<Port>,
    pub body: Vec<Statement>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Module {
            name: name.into(),
            ports: Vec::new(),
            body: Vec::new(),
        }
    }
    pub fn get_port(&self, name: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.name == name)
    }
}

/// A set of modules, one of which (`main`) is the elaboration entry point.
/// The pass treats this as immutable input and constructs a fresh `Circuit`
/// as output (§3 "Lifecycle").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Circuit {
    pub main: String,
    pub modules: Vec<Module>,
}

impl Circuit {
    pub fn get_module(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.name == name)
    }
    pub fn main_module(&self) -> &Module {
        self.get_module(&self.main)
            .expect("circuit invariant: main module must be present")
    }
}
