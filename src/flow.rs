//! Resolved-or-pending continuations for hooks, actions and listeners.
//!
//! Dispatch runs synchronously until some handler returns [`Flow::Pending`].
//! From that point on the rest of the chain is deferred into a single future,
//! so purely synchronous programs never allocate one.

use std::future::Future;

use futures::future::LocalBoxFuture;

use crate::Result;

/// What a hook, action or listener returns.
pub enum Flow {
    Done,
    Pending(LocalBoxFuture<'static, Result<()>>),
}

impl Flow {
    pub fn pending<F>(fut: F) -> Flow
    where
        F: Future<Output = Result<()>> + 'static,
    {
        Flow::Pending(Box::pin(fut))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Flow::Pending(_))
    }
}

impl From<()> for Flow {
    fn from(_: ()) -> Flow {
        Flow::Done
    }
}

/// The outcome of dispatching a command tree.
pub(crate) enum Completion<'a> {
    Done,
    Pending(LocalBoxFuture<'a, Result<()>>),
}

impl<'a> Completion<'a> {
    pub(crate) async fn wait(self) -> Result<()> {
        match self {
            Completion::Done => Ok(()),
            Completion::Pending(fut) => fut.await,
        }
    }
}

/// Lifecycle events hooks can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookEvent {
    /// Runs on the parent before dispatching to a subcommand.
    PreSubcommand,
    /// Runs before the action, for the action command and its ancestors.
    PreAction,
    /// Runs after the action, in reverse order of `PreAction`.
    PostAction,
}
