//! Ambient cache context for the current read-through computation.
//!
//! A fetch routine can declare tags and an expiry from anywhere in its own
//! call graph without threading a parameter through every call. The context
//! is a `tokio::task_local!` installed by [`run_in_context`] for the dynamic
//! extent of one future, so concurrent computations never observe each
//! other's context. Work moved to another task with `tokio::spawn` does not
//! inherit it.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

tokio::task_local! {
    static CONTEXT: RefCell<CacheContext>;
}

/// Tags and lifetime accumulated during one cached computation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheContext {
    pub tags: BTreeSet<String>,
    /// Last writer wins
    pub expire_after: Option<Duration>,
}

impl CacheContext {
    pub fn tags(&self) -> Vec<String> {
        self.tags.iter().cloned().collect()
    }
}

/// Run `fut` with a fresh, empty context installed.
///
/// Returns the future's output together with the context as it stood when
/// the future completed. Nested calls install their own context and do not
/// write into the enclosing one.
///
/// ```
/// use babylon_cache::cache::context::{add_tag, run_in_context, set_expiry};
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() {
/// let (value, ctx) = run_in_context(async {
///     add_tag("profile");
///     set_expiry(Duration::from_secs(300));
///     42
/// })
/// .await;
///
/// assert_eq!(value, 42);
/// assert!(ctx.tags.contains("profile"));
/// assert_eq!(ctx.expire_after, Some(Duration::from_secs(300)));
/// # }
/// ```
pub async fn run_in_context<F>(fut: F) -> (F::Output, CacheContext)
where
    F: Future,
{
    CONTEXT
        .scope(RefCell::new(CacheContext::default()), async move {
            let output = fut.await;
            let context = CONTEXT.with(|ctx| ctx.borrow().clone());
            (output, context)
        })
        .await
}

/// Add a tag to the active context
pub fn add_tag(tag: impl Into<String>) {
    let tag = tag.into();
    let applied = CONTEXT
        .try_with(|ctx| {
            ctx.borrow_mut().tags.insert(tag.clone());
        })
        .is_ok();

    if !applied {
        misuse("add_tag", &tag);
    }
}

/// Add several tags to the active context
pub fn add_tags<I, S>(tags: I)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    for tag in tags {
        add_tag(tag);
    }
}

/// Set the expiry of the active context, replacing any earlier value
pub fn set_expiry(expire_after: Duration) {
    let applied = CONTEXT
        .try_with(|ctx| {
            ctx.borrow_mut().expire_after = Some(expire_after);
        })
        .is_ok();

    if !applied {
        misuse("set_expiry", &format!("{:?}", expire_after));
    }
}

/// Tags of the active context, sorted; empty outside a context
pub fn current_tags() -> Vec<String> {
    CONTEXT
        .try_with(|ctx| ctx.borrow().tags())
        .unwrap_or_default()
}

/// Expiry of the active context, if any
pub fn current_expiry() -> Option<Duration> {
    CONTEXT
        .try_with(|ctx| ctx.borrow().expire_after)
        .ok()
        .flatten()
}

/// Whether a context is installed for the current task
pub fn is_active() -> bool {
    CONTEXT.try_with(|_| ()).is_ok()
}

fn misuse(operation: &str, detail: &str) {
    if cfg!(debug_assertions) {
        warn!(
            "cache context: {}({}) called outside run_in_context; ignored",
            operation, detail
        );
    }
}
