//! Modules and export-checked function resolution

use indexmap::{IndexMap, IndexSet};
use std::fmt;
use std::sync::Arc;

use super::{Captures, FunctionValue};
use crate::ast::FunctionDecl;
use crate::error::{EvalError, UndefinedKind};

/// Fully-qualified module name such as `Demo.Math`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fqn {
    parts: Vec<String>,
}

impl Fqn {
    /// Create a name from its dot-separated parts.
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parts: parts.into_iter().map(Into::into).collect(),
        }
    }

    /// Split a dotted name into parts.
    pub fn parse(name: &str) -> Self {
        Self::new(name.split('.'))
    }

    /// The last component (the module's simple name).
    pub fn simple_name(&self) -> &str {
        self.parts.last().map(String::as_str).unwrap_or("")
    }

    /// All components in order.
    pub fn parts(&self) -> &[String] {
        &self.parts
    }
}

impl fmt::Display for Fqn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.parts.join("."))
    }
}

/// A module: named functions plus the subset visible from outside.
///
/// Every exported name is guaranteed to exist in the function map.
#[derive(Debug)]
pub struct ModuleValue {
    fqn: Fqn,
    exports: IndexSet<String>,
    functions: IndexMap<String, Arc<FunctionValue>>,
}

impl ModuleValue {
    /// Build a module from already constructed functions.
    ///
    /// Fails with a resolution error if an export names a missing function.
    pub fn new<E, F>(fqn: Fqn, exports: E, functions: F) -> Result<Self, EvalError>
    where
        E: IntoIterator<Item = String>,
        F: IntoIterator<Item = FunctionValue>,
    {
        let functions: IndexMap<String, Arc<FunctionValue>> = functions
            .into_iter()
            .map(|func| (func.name.clone(), Arc::new(func)))
            .collect();
        let exports: IndexSet<String> = exports.into_iter().collect();
        check_exports(&fqn, &exports, |name| functions.contains_key(name))?;
        Ok(Self {
            fqn,
            exports,
            functions,
        })
    }

    /// Build a module from declarations, linking each function back to the
    /// module so calls inside it can reach private siblings.
    pub fn declare(
        fqn: Fqn,
        exports: &[String],
        decls: &[FunctionDecl],
        captures: Captures,
    ) -> Result<Arc<Self>, EvalError> {
        let exports: IndexSet<String> = exports.iter().cloned().collect();
        check_exports(&fqn, &exports, |name| decls.iter().any(|d| d.name == name))?;

        let mut seen = IndexSet::new();
        for decl in decls {
            if !seen.insert(decl.name.as_str()) {
                return Err(EvalError::Resolution {
                    message: format!("function {} is declared twice in module {}", decl.name, fqn),
                });
            }
        }

        Ok(Arc::new_cyclic(|this| {
            let functions = decls
                .iter()
                .map(|decl| {
                    let mut func = FunctionValue::new(
                        decl.name.clone(),
                        decl.params.clone(),
                        Arc::clone(&decl.body),
                        Arc::clone(&captures),
                    );
                    func.module = Some(this.clone());
                    (decl.name.clone(), Arc::new(func))
                })
                .collect();
            Self {
                fqn,
                exports,
                functions,
            }
        }))
    }

    /// The module's fully-qualified name.
    pub fn fqn(&self) -> &Fqn {
        &self.fqn
    }

    /// Exported names in declaration order.
    pub fn exports(&self) -> impl Iterator<Item = &str> {
        self.exports.iter().map(String::as_str)
    }

    /// Whether `name` is exported.
    pub fn is_exported(&self, name: &str) -> bool {
        self.exports.contains(name)
    }

    /// Every function, exported or not, in declaration order.
    pub fn functions(&self) -> impl Iterator<Item = &Arc<FunctionValue>> {
        self.functions.values()
    }

    /// Look up an exported function for the host.
    pub fn lookup_export(&self, name: &str) -> Option<&Arc<FunctionValue>> {
        if self.is_exported(name) {
            self.functions.get(name)
        } else {
            None
        }
    }

    /// Resolve `name` from outside the module.
    ///
    /// A missing name and a private name fail with different kinds.
    pub fn resolve(&self, name: &str) -> Result<Arc<FunctionValue>, EvalError> {
        let func = self.resolve_internal(name)?;
        if !self.is_exported(name) {
            return Err(EvalError::UndefinedName {
                name: name.to_string(),
                kind: UndefinedKind::PrivateFunction {
                    module: self.fqn.to_string(),
                },
            });
        }
        Ok(func)
    }

    /// Resolve `name` from code inside the module, ignoring exports.
    pub fn resolve_internal(&self, name: &str) -> Result<Arc<FunctionValue>, EvalError> {
        self.functions
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::UndefinedName {
                name: name.to_string(),
                kind: UndefinedKind::UnknownFunction {
                    module: self.fqn.to_string(),
                },
            })
    }
}

fn check_exports(
    fqn: &Fqn,
    exports: &IndexSet<String>,
    defined: impl Fn(&str) -> bool,
) -> Result<(), EvalError> {
    match exports.iter().find(|name| !defined(name.as_str())) {
        Some(missing) => Err(EvalError::Resolution {
            message: format!(
                "module {} exports {} but does not define it",
                fqn, missing
            ),
        }),
        None => Ok(()),
    }
}
