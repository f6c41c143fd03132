use crate::error::{BumprError, Result};
use crate::workflow::{Context, Phase};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Where a hook runs in the workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    Before(Phase),
    After(Phase),
    /// Runs when a failed run restores the version files
    Rollback,
}

impl HookPoint {
    /// The phase this point is attached to, if any
    pub fn phase(&self) -> Option<Phase> {
        match self {
            HookPoint::Before(phase) | HookPoint::After(phase) => Some(*phase),
            HookPoint::Rollback => None,
        }
    }
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookPoint::Before(phase) => write!(f, "before_{}", phase),
            HookPoint::After(phase) => write!(f, "after_{}", phase),
            HookPoint::Rollback => f.write_str("on_rollback"),
        }
    }
}

impl FromStr for HookPoint {
    type Err = BumprError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        if normalized == "on_rollback" || normalized == "rollback" {
            return Ok(HookPoint::Rollback);
        }
        if let Some(phase) = normalized.strip_prefix("before_") {
            return Ok(HookPoint::Before(phase.parse()?));
        }
        if let Some(phase) = normalized.strip_prefix("after_") {
            return Ok(HookPoint::After(phase.parse()?));
        }
        Err(BumprError::config(format!(
            "Unknown hook point '{}': expected before_<phase>, after_<phase> or on_rollback",
            s
        )))
    }
}

/// An extension run at a hook point.
///
/// A hook may mutate the [`Context`], e.g. rewrite a file through
/// [`Context::write_file`] so it gets staged and rolled back with the version files.
pub trait Hook {
    /// Name reported in logs and errors
    fn name(&self) -> &str;

    fn run(&self, ctx: &mut Context) -> Result<()>;
}

/// Adapts a closure into a [`Hook`]
pub struct FnHook<F> {
    name: String,
    f: F,
}

impl<F> FnHook<F>
where
    F: Fn(&mut Context) -> Result<()>,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        FnHook {
            name: name.into(),
            f,
        }
    }
}

impl<F> Hook for FnHook<F>
where
    F: Fn(&mut Context) -> Result<()>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, ctx: &mut Context) -> Result<()> {
        (self.f)(ctx)
    }
}

/// Ordered hooks per hook point. Registration order is execution order.
#[derive(Default)]
pub struct HookRegistry {
    hooks: HashMap<HookPoint, Vec<Box<dyn Hook>>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `hook` to the hooks of `point`
    pub fn register(&mut self, point: HookPoint, hook: impl Hook + 'static) {
        self.register_boxed(point, Box::new(hook));
    }

    pub fn register_boxed(&mut self, point: HookPoint, hook: Box<dyn Hook>) {
        debug!(point = %point, hook = hook.name(), "registering hook");
        self.hooks.entry(point).or_default().push(hook);
    }

    /// Hooks registered at `point`, in execution order
    pub fn hooks(&self, point: HookPoint) -> &[Box<dyn Hook>] {
        self.hooks.get(&point).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn names(&self, point: HookPoint) -> Vec<&str> {
        self.hooks(point).iter().map(|h| h.name()).collect()
    }

    /// Total number of registrations
    pub fn len(&self) -> usize {
        self.hooks.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run the hooks of `point` in order.
    ///
    /// Stops at the first failing hook and wraps its error as
    /// [BumprError::Hook]; the remaining hooks of that point do not run.
    pub fn run(&self, point: HookPoint, ctx: &mut Context) -> Result<()> {
        let Some(hooks) = self.hooks.get(&point) else {
            return Ok(());
        };

        for hook in hooks {
            debug!(point = %point, hook = hook.name(), "running hook");
            if let Err(source) = hook.run(ctx) {
                warn!(point = %point, hook = hook.name(), error = %source, "hook failed");
                return Err(BumprError::Hook {
                    point,
                    hook: hook.name().to_string(),
                    source: Box::new(source),
                });
            }
        }

        Ok(())
    }
}
