//! Core middleware trait and types.
//!
//! A [`Middleware`] receives a request and a [`Next`] continuation. Per call
//! it decides to:
//!
//! - delegate unchanged: `next.run(request)`
//! - transform, then delegate: `next.run(modified)`
//! - short-circuit: return a response or error without touching `next`
//!
//! Stages run in declaration order on the way in and in reverse order on the
//! way out. The end of a chain is a [`Handler`] that fully resolves the
//! request. Reaching the end of a chain that has no handler fails with
//! [`AccordError::IncompleteChain`].
//!
//! The trait is generic over the request and response types, so the same
//! machinery drives both the API-level chain (`RequestContext` →
//! `Response`) and the wire-level chain around the network primitive.
//!
//! # Example
//!
//! ```
//! use accord_core::{AccordResult, BoxFuture};
//! use accord_middleware::{Middleware, Next};
//!
//! struct Shout;
//!
//! impl Middleware<String, String> for Shout {
//!     fn name(&self) -> &'static str {
//!         "shout"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         request: String,
//!         next: Next<'a, String, String>,
//!     ) -> BoxFuture<'a, AccordResult<String>> {
//!         Box::pin(async move {
//!             let response = next.run(request.to_uppercase()).await?;
//!             Ok(format!("{response}!"))
//!         })
//!     }
//! }
//! ```

use accord_core::{AccordError, AccordResult, BoxFuture};
use std::future::Future;
use std::marker::PhantomData;

/// A stage in a middleware chain.
///
/// # Invariants
///
/// - `next` is one-shot: `run` consumes it
/// - a stage that does not call `next` short-circuits every later stage
/// - errors from downstream should be propagated, not swallowed
pub trait Middleware<Req, Res>: Send + Sync + 'static {
    /// Returns the name of this stage, used in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Processes `request`, optionally delegating to `next`.
    fn process<'a>(&'a self, request: Req, next: Next<'a, Req, Res>)
        -> BoxFuture<'a, AccordResult<Res>>;
}

/// The final stage of a chain: resolves a request to a response.
///
/// Implemented for any `Fn(Req) -> impl Future<Output = AccordResult<Res>>`.
pub trait Handler<Req, Res>: Send + Sync + 'static {
    /// Resolves `request`.
    fn call<'a>(&'a self, request: Req) -> BoxFuture<'a, AccordResult<Res>>;
}

impl<F, Fut, Req, Res> Handler<Req, Res> for F
where
    F: Fn(Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AccordResult<Res>> + Send + 'static,
{
    fn call<'a>(&'a self, request: Req) -> BoxFuture<'a, AccordResult<Res>> {
        Box::pin(self(request))
    }
}

/// Continuation to the rest of the chain.
///
/// Consumed by [`Next::run`], so it can be invoked at most once.
pub struct Next<'a, Req, Res> {
    inner: NextInner<'a, Req, Res>,
}

enum NextInner<'a, Req, Res> {
    /// More middleware to process.
    Chain {
        middleware: &'a dyn Middleware<Req, Res>,
        next: Box<Next<'a, Req, Res>>,
    },
    /// The terminal handler.
    Handler(&'a dyn Handler<Req, Res>),
    /// The chain has no terminal handler.
    End,
}

impl<'a, Req, Res> Next<'a, Req, Res>
where
    Req: Send + 'static,
    Res: Send + 'static,
{
    /// A continuation that runs `middleware`, then `next`.
    pub fn new(middleware: &'a dyn Middleware<Req, Res>, next: Self) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// A continuation that invokes `handler`.
    pub fn handler(handler: &'a dyn Handler<Req, Res>) -> Self {
        Self {
            inner: NextInner::Handler(handler),
        }
    }

    /// The end of a chain without a handler.
    ///
    /// Running it fails with [`AccordError::IncompleteChain`].
    #[must_use]
    pub fn end() -> Self {
        Self {
            inner: NextInner::End,
        }
    }

    /// Invokes the rest of the chain.
    pub fn run(self, request: Req) -> BoxFuture<'a, AccordResult<Res>> {
        match self.inner {
            NextInner::Chain { middleware, next } => middleware.process(request, *next),
            NextInner::Handler(handler) => handler.call(request),
            NextInner::End => Box::pin(std::future::ready(Err(AccordError::IncompleteChain))),
        }
    }
}

/// A middleware defined by a closure.
///
/// # Example
///
/// ```
/// use accord_core::AccordError;
/// use accord_middleware::{Chain, FnMiddleware};
///
/// let tag: FnMiddleware<_, String, String> = FnMiddleware::new("tag", |request, next| {
///     Box::pin(async move { next.run(format!("{request}tag ")).await })
/// });
///
/// let chain = Chain::builder()
///     .stage(tag)
///     .terminal(|request: String| async move { Ok::<_, AccordError>(request) })
///     .build();
///
/// # tokio_test::block_on(async {
/// assert_eq!(chain.run("x ".to_string()).await.unwrap(), "x tag ");
/// # });
/// ```
pub struct FnMiddleware<F, Req, Res> {
    name: &'static str,
    func: F,
    _types: PhantomData<fn(Req) -> Res>,
}

impl<F, Req, Res> FnMiddleware<F, Req, Res>
where
    F: for<'a> Fn(Req, Next<'a, Req, Res>) -> BoxFuture<'a, AccordResult<Res>>
        + Send
        + Sync
        + 'static,
{
    /// Creates a middleware named `name` that runs `func`.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self {
            name,
            func,
            _types: PhantomData,
        }
    }
}

impl<F, Req, Res> Middleware<Req, Res> for FnMiddleware<F, Req, Res>
where
    F: for<'a> Fn(Req, Next<'a, Req, Res>) -> BoxFuture<'a, AccordResult<Res>>
        + Send
        + Sync
        + 'static,
    Req: 'static,
    Res: 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn process<'a>(
        &'a self,
        request: Req,
        next: Next<'a, Req, Res>,
    ) -> BoxFuture<'a, AccordResult<Res>> {
        (self.func)(request, next)
    }
}

/// A handler that always answers with a clone of `response`.
///
/// Useful as a terminal stage in tests and for stubbed endpoints.
#[derive(Debug, Clone)]
pub struct Respond<Res>(pub Res);

impl<Req, Res> Handler<Req, Res> for Respond<Res>
where
    Req: Send + 'static,
    Res: Clone + Send + Sync + 'static,
{
    fn call<'a>(&'a self, _request: Req) -> BoxFuture<'a, AccordResult<Res>> {
        let response = self.0.clone();
        Box::pin(async move { Ok(response) })
    }
}
