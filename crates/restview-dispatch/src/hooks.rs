//! Setup/teardown hooks around a dispatch.
//!
//! Hooks let a handler acquire per-request resources (a transaction, a timer)
//! before the pipeline starts and release them after it finishes, whatever the
//! outcome.
//!
//! # Pipeline Position
//!
//! ```text
//! request
//!   → ON-ENTER HOOKS ← (acquire resources, may refuse the request)
//!   → verb resolution → validation → verb method → renderer
//!   → ON-EXIT HOOKS  ← (release resources, always run once entered)
//! output or error
//! ```
//!
//! Enter hooks run in registration order; the first error aborts the dispatch.
//! Exit hooks run in reverse registration order and see the failure, if any.
//!
//! Each exit hook is bound to the enter hooks registered before it. When setup
//! stops partway, only the exit hooks whose enter hooks all succeeded run, so a
//! parent's acquire/release pair still releases when a child's setup refuses.
//! Teardown also runs when the pipeline unwinds from a panic.

use std::fmt;
use std::sync::Arc;

use crate::context::{DispatchContext, Stage};
use crate::error::DispatchError;

/// Type alias for setup hook functions.
pub type EnterFn = Arc<dyn Fn(&mut DispatchContext<'_>) -> Result<(), anyhow::Error> + Send + Sync>;

/// Type alias for teardown hook functions.
pub type ExitFn = Arc<dyn Fn(&mut DispatchContext<'_>, Option<&DispatchError>) + Send + Sync>;

/// Setup/teardown hooks for one handler.
///
/// Cloning is cheap; derived handlers start with their parent's hooks and may
/// add more.
#[derive(Clone, Default)]
pub struct Hooks {
    enter: Vec<EnterFn>,
    // (enter hooks registered before this one, hook)
    exit: Vec<(usize, ExitFn)>,
}

impl Hooks {
    /// Creates a new empty hooks configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if no hooks are registered.
    pub fn is_empty(&self) -> bool {
        self.enter.is_empty() && self.exit.is_empty()
    }

    /// Adds a setup hook.
    ///
    /// Setup hooks get mutable access to the context and can park resources in
    /// `ctx.extensions` for the verb method to use.
    pub fn on_enter<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut DispatchContext<'_>) -> Result<(), anyhow::Error> + Send + Sync + 'static,
    {
        self.enter.push(Arc::new(f));
        self
    }

    /// Adds a teardown hook.
    pub fn on_exit<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut DispatchContext<'_>, Option<&DispatchError>) + Send + Sync + 'static,
    {
        self.exit.push((self.enter.len(), Arc::new(f)));
        self
    }

    /// Appends every hook of `other` after this one's.
    pub fn extend(mut self, other: Hooks) -> Self {
        let offset = self.enter.len();
        self.enter.extend(other.enter);
        self.exit
            .extend(other.exit.into_iter().map(|(after, hook)| (after + offset, hook)));
        self
    }

    /// Runs all setup hooks, stopping at the first error.
    pub fn run_enter(&self, ctx: &mut DispatchContext<'_>) -> Result<(), anyhow::Error> {
        let mut entered = 0;
        self.run_enter_counted(ctx, &mut entered)
    }

    /// Runs all teardown hooks, last registered first.
    pub fn run_exit(&self, ctx: &mut DispatchContext<'_>, failure: Option<&DispatchError>) {
        self.run_exit_after(ctx, self.enter.len(), failure);
    }

    /// Runs the teardown hooks bound to the first `entered` setup hooks, last
    /// registered first.
    pub fn run_exit_after(
        &self,
        ctx: &mut DispatchContext<'_>,
        entered: usize,
        failure: Option<&DispatchError>,
    ) {
        for (_, hook) in self.exit.iter().rev().filter(|(after, _)| *after <= entered) {
            hook(ctx, failure);
        }
    }

    fn run_enter_counted(
        &self,
        ctx: &mut DispatchContext<'_>,
        entered: &mut usize,
    ) -> Result<(), anyhow::Error> {
        for hook in &self.enter {
            hook(ctx)?;
            *entered += 1;
        }
        Ok(())
    }

    /// Takes ownership of `ctx` for one dispatch.
    pub(crate) fn scope<'h, 'r>(&'h self, ctx: DispatchContext<'r>) -> HookScope<'h, 'r> {
        HookScope {
            hooks: self,
            ctx,
            entered: 0,
            closed: false,
        }
    }
}

/// One dispatch's hook lifecycle.
///
/// Owns the context between setup and teardown. If the scope is dropped
/// without [`close`](Self::close), the pipeline is unwinding: the context is
/// marked [`Stage::Failed`] and the bound teardown hooks still run.
pub(crate) struct HookScope<'h, 'r> {
    hooks: &'h Hooks,
    ctx: DispatchContext<'r>,
    entered: usize,
    closed: bool,
}

impl<'r> HookScope<'_, 'r> {
    /// Runs the setup hooks, counting the ones that succeed.
    pub(crate) fn enter(&mut self) -> Result<(), anyhow::Error> {
        let hooks = self.hooks;
        hooks.run_enter_counted(&mut self.ctx, &mut self.entered)
    }

    pub(crate) fn ctx(&mut self) -> &mut DispatchContext<'r> {
        &mut self.ctx
    }

    /// Runs the bound teardown hooks once with the dispatch outcome.
    pub(crate) fn close(mut self, failure: Option<&DispatchError>) {
        self.closed = true;
        self.hooks.run_exit_after(&mut self.ctx, self.entered, failure);
    }
}

impl Drop for HookScope<'_, '_> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let stage = self.ctx.stage();
        self.ctx.advance(Stage::Failed);
        tracing::error!(handler = self.ctx.handler(), %stage, "dispatch panicked");
        let failure =
            DispatchError::Handler(anyhow::anyhow!("dispatch panicked at stage {}", stage));
        self.hooks
            .run_exit_after(&mut self.ctx, self.entered, Some(&failure));
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("enter_count", &self.enter.len())
            .field("exit_count", &self.exit.len())
            .finish()
    }
}
