//! Fixture identity
//!
//! A fixture is an async setup function with a stable name. The name is half of
//! the cache key, so it must be non-empty and must not be shared by two different
//! setup functions.

use async_trait::async_trait;
use std::borrow::Cow;
use std::fmt;
use std::future::Future;

/// Named async setup function producing `T` from arguments `A`.
#[async_trait]
pub trait Fixture<A, T>: Send + Sync
where
    A: Send + 'static,
    T: Send + 'static,
{
    fn name(&self) -> &str;

    async fn setup(&self, args: A) -> anyhow::Result<T>;
}

/// Wraps a closure or function as a [`Fixture`] under an explicit name.
pub struct NamedFixture<F> {
    name: Cow<'static, str>,
    func: F,
}

impl<F> NamedFixture<F> {
    pub fn new(name: impl Into<Cow<'static, str>>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> fmt::Debug for NamedFixture<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedFixture").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<A, T, F, Fut> Fixture<A, T> for NamedFixture<F>
where
    A: Send + 'static,
    T: Send + 'static,
    F: Fn(A) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<T>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn setup(&self, args: A) -> anyhow::Result<T> {
        (self.func)(args).await
    }
}

/// Build a [`NamedFixture`] whose name is the path of the given function.
///
/// ```ignore
/// async fn deploy_token(supply: u64) -> anyhow::Result<Address> { ... }
///
/// let deploy = fixture!(deploy_token);
/// let token = cache.load_fixture(&deploy, 1_000).await?;
/// ```
#[macro_export]
macro_rules! fixture {
    ($func:path) => {
        $crate::fixture::NamedFixture::new(stringify!($func), $func)
    };
}
