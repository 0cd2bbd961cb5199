// vim: tw=80
//! Bookkeeping for every wrapped target in a session.

use std::rc::Rc;

use crate::{
    expectation::ExpectationState,
    target::{Hook, TargetId},
    HookTable,
    Method,
    TargetKind,
};

/// A method whose hook is currently installed.
struct Hooked {
    method: String,
    original: Method,
    /// Whatever occupied the override slot before the hook did.
    displaced: Option<Hook>,
}

/// One wrapped target.
pub(crate) struct TargetEntry {
    id: TargetId,
    name: String,
    kind: TargetKind,
    hooks: HookTable,
    hooked: Vec<Hooked>,
    expectations: Vec<Rc<ExpectationState>>,
}

impl TargetEntry {
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn kind(&self) -> TargetKind {
        self.kind
    }

    pub(crate) fn expectations(&self) -> &[Rc<ExpectationState>] {
        &self.expectations
    }

    /// The captured original of `method`, if its hook is installed.
    pub(crate) fn original(&self, method: &str) -> Option<&Method> {
        self.hooked.iter()
            .find(|h| h.method == method)
            .map(|h| &h.original)
    }

    /// Install `hook` for `method` unless one is already installed.
    pub(crate) fn hook(&mut self, method: &str, original: Method, hook: Hook)
    {
        if self.original(method).is_some() {
            return;
        }
        let displaced = self.hooks.install(method, hook);
        tracing::debug!(target_name = %self.name, method, "mockwrap: hook installed");
        self.hooked.push(Hooked{method: method.to_owned(), original, displaced});
    }

    pub(crate) fn push(&mut self, expectation: Rc<ExpectationState>) {
        self.expectations.push(expectation);
    }

    /// Remove `expectation`, and its method's hook if nothing else uses it.
    pub(crate) fn withdraw(&mut self, expectation: &Rc<ExpectationState>) {
        self.expectations.retain(|e| !Rc::ptr_eq(e, expectation));
        let method = expectation.method();
        if self.expectations.iter().any(|e| e.method() == method) {
            return;
        }
        if let Some(i) = self.hooked.iter().position(|h| h.method == method) {
            let hooked = self.hooked.remove(i);
            self.hooks.restore(&hooked.method, hooked.displaced);
            tracing::debug!(target_name = %self.name, method, "mockwrap: hook removed");
        }
    }

    /// Put back whatever every installed hook displaced.
    pub(crate) fn restore(&mut self) {
        while let Some(hooked) = self.hooked.pop() {
            self.hooks.restore(&hooked.method, hooked.displaced);
            tracing::debug!(
                target_name = %self.name,
                method = %hooked.method,
                "mockwrap: original restored"
            );
        }
    }
}

/// Every wrapped target, in the order they were first wrapped.
#[derive(Default)]
pub(crate) struct Registry {
    targets: Vec<TargetEntry>,
}

impl Registry {
    pub(crate) fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub(crate) fn get(&self, id: TargetId) -> Option<&TargetEntry> {
        self.targets.iter().find(|t| t.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: TargetId) -> Option<&mut TargetEntry> {
        self.targets.iter_mut().find(|t| t.id == id)
    }

    /// Look up a target's entry, creating it if this is the first time the
    /// target has been seen.
    pub(crate) fn entry(
        &mut self,
        hooks: &HookTable,
        name: &str,
        kind: TargetKind) -> &mut TargetEntry
    {
        let id = hooks.id();
        let i = match self.targets.iter().position(|t| t.id == id) {
            Some(i) => i,
            None => {
                tracing::debug!(target_name = name, ?kind, "mockwrap: target wrapped");
                self.targets.push(TargetEntry {
                    id,
                    name: name.to_owned(),
                    kind,
                    hooks: hooks.clone(),
                    hooked: Vec::new(),
                    expectations: Vec::new(),
                });
                self.targets.len() - 1
            }
        };
        &mut self.targets[i]
    }

    /// Snapshot of `method`'s expectations on `id`, in registration order.
    pub(crate) fn expectations(&self, id: TargetId, method: &str)
        -> Vec<Rc<ExpectationState>>
    {
        self.get(id)
            .map(|t| t.expectations.iter()
                 .filter(|e| e.method() == method)
                 .cloned()
                 .collect())
            .unwrap_or_default()
    }

    /// Empty the registry, handing back everything that was in it.
    pub(crate) fn take(&mut self) -> Vec<TargetEntry> {
        std::mem::take(&mut self.targets)
    }
}
