use crate::source::Span;
use crate::types::{BuiltinFn, Node};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnvError {
    #[error("Unbound variable: '{0}'")]
    UnboundVariable(String, Span), // Symbol name, span where lookup happened
    // Exact wording relied on by hosts embedding the evaluator.
    #[error("{0} must be defined before you can set! it")]
    NotYetDefined(String, Span), // set! target that was never defined
}

impl EnvError {
    pub fn span(&self) -> Span {
        match self {
            EnvError::UnboundVariable(_, span) | EnvError::NotYetDefined(_, span) => *span,
        }
    }
}

/// One frame of the chained symbol-to-value mapping.
///
/// `Rc<RefCell<...>>` allows shared ownership and interior mutability,
/// needed for closures capturing environments and for `set!`. Frames only
/// ever reference ancestors, so no cycles arise.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    outer: Option<Rc<RefCell<Environment>>>,
    bindings: HashMap<String, Node>,
}

impl Environment {
    /// Creates a new, empty top-level environment.
    pub fn new() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Environment {
            outer: None,
            bindings: HashMap::new(),
        }))
    }

    /// Creates the global environment preloaded with the built-in
    /// procedures.
    pub fn new_global_populated() -> Rc<RefCell<Environment>> {
        let env_ptr = Environment::new();
        {
            // Borrow mutably only inside this scope
            let mut env = env_ptr.borrow_mut();
            env.add_builtin("+", crate::primitives::prim_add);
            env.add_builtin("-", crate::primitives::prim_sub);
            env.add_builtin("*", crate::primitives::prim_mul);
            env.add_builtin("/", crate::primitives::prim_div);
            env.add_builtin("==", crate::primitives::prim_equals);
            env.add_builtin("!=", crate::primitives::prim_not_equals);
            env.add_builtin("<", crate::primitives::prim_less_than);
            env.add_builtin("<=", crate::primitives::prim_less_than_or_equals);
            env.add_builtin(">", crate::primitives::prim_greater_than);
            env.add_builtin(">=", crate::primitives::prim_greater_than_or_equals);
        }
        env_ptr
    }

    /// Creates a new environment enclosed within an outer one. Used for
    /// every closure application.
    pub fn new_enclosed(outer_env: Rc<RefCell<Environment>>) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Environment {
            outer: Some(outer_env),
            bindings: HashMap::new(),
        }))
    }

    /// Defines a variable in the *current* environment frame.
    /// Replaces the value if the variable already exists in this frame.
    pub fn define(&mut self, name: String, value_node: Node) {
        self.bindings.insert(name, value_node);
    }

    /// Looks up a variable's value, checking the current frame first and
    /// then walking the outer chain. `lookup_span` is the location where the
    /// variable was referenced, used for error reporting.
    pub fn get(&self, name: &str, lookup_span: Span) -> Result<Node, EnvError> {
        if let Some(value_node) = self.bindings.get(name) {
            Ok(value_node.clone())
        } else {
            match &self.outer {
                Some(outer_env_ptr) => outer_env_ptr.borrow().get(name, lookup_span),
                None => Err(EnvError::UnboundVariable(name.to_string(), lookup_span)),
            }
        }
    }

    /// Sets the value of an *existing* variable: searches outward from the
    /// current frame and updates the first frame where the variable is
    /// found. Unlike `define`, this never creates a binding; a name that is
    /// nowhere defined is an error. `set_span` is the location of the
    /// `set!` expression.
    pub fn set(&mut self, name: &str, value_node: Node, set_span: Span) -> Result<(), EnvError> {
        if let Some(value_mut) = self.bindings.get_mut(name) {
            *value_mut = value_node;
            Ok(())
        } else {
            match &self.outer {
                Some(outer_env_ptr) => {
                    outer_env_ptr.borrow_mut().set(name, value_node, set_span)
                }
                None => Err(EnvError::NotYetDefined(name.to_string(), set_span)),
            }
        }
    }

    /// Helper to register a built-in procedure under its source-level name.
    fn add_builtin(&mut self, name: &str, func: BuiltinFn) {
        let node = Node::new_builtin(func, name, Span::default());
        self.define(name.to_string(), node);
    }

    fn add_identifiers(&self, mut identifiers: HashSet<String>) -> HashSet<String> {
        for identifier in self.bindings.keys() {
            identifiers.insert(identifier.to_string());
        }
        match &self.outer {
            Some(outer_env_ptr) => outer_env_ptr.borrow().add_identifiers(identifiers),
            None => identifiers,
        }
    }

    /// Gets every identifier bound anywhere in the chain (used for REPL
    /// completion).
    pub fn get_identifiers(&self) -> HashSet<String> {
        self.add_identifiers(HashSet::new())
    }
}
