use crate::types::{MethodRef, ModuleRef};
use std::collections::HashMap;

/// Runtime collaborator that enumerates methods declared on a module
///
/// Implementations must return methods declared directly on the module (not
/// inherited) in a stable order, declaration order when the runtime knows it.
pub trait MethodIntrospector {
    fn declared_methods(&self, module: &ModuleRef, include_singleton: bool) -> Vec<MethodRef>;
}

/// Introspection results captured ahead of time, keyed by qualified name
#[derive(Debug, Clone, Default)]
pub struct MethodTable {
    instance: HashMap<String, Vec<MethodRef>>,
    singleton: HashMap<String, Vec<MethodRef>>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an instance method for `module`
    pub fn add_instance_method(&mut self, module: &ModuleRef, method: MethodRef) {
        self.instance
            .entry(module.qualified_name().to_string())
            .or_default()
            .push(method);
    }

    /// Record a singleton (class-level) method for `module`
    pub fn add_singleton_method(&mut self, module: &ModuleRef, method: MethodRef) {
        self.singleton
            .entry(module.qualified_name().to_string())
            .or_default()
            .push(method);
    }

    /// Builder: add instance method
    #[must_use]
    pub fn with_instance_method(mut self, module: &ModuleRef, method: MethodRef) -> Self {
        self.add_instance_method(module, method);
        self
    }

    /// Builder: add singleton method
    #[must_use]
    pub fn with_singleton_method(mut self, module: &ModuleRef, method: MethodRef) -> Self {
        self.add_singleton_method(module, method);
        self
    }
}

impl MethodIntrospector for MethodTable {
    fn declared_methods(&self, module: &ModuleRef, include_singleton: bool) -> Vec<MethodRef> {
        let name = module.qualified_name();
        let mut methods = self.instance.get(name).cloned().unwrap_or_default();
        if include_singleton {
            if let Some(singleton) = self.singleton.get(name) {
                methods.extend(singleton.iter().cloned());
            }
        }
        methods
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceSpan;

    #[test]
    fn test_singleton_methods_follow_instance_methods() {
        let foo = ModuleRef::class("Foo").unwrap();
        let table = MethodTable::new()
            .with_singleton_method(&foo, MethodRef::new("Foo", "build", SourceSpan::new("a.rb", 2)))
            .with_instance_method(&foo, MethodRef::new("Foo", "run", SourceSpan::new("a.rb", 5)));

        let names: Vec<_> = table
            .declared_methods(&foo, true)
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["run", "build"]);
        assert_eq!(table.declared_methods(&foo, false).len(), 1);
    }

    #[test]
    fn test_unknown_module_has_no_methods() {
        let table = MethodTable::new();
        let bar = ModuleRef::module("Bar").unwrap();
        assert!(table.declared_methods(&bar, true).is_empty());
    }
}
