//! Ordered middleware chains.
//!
//! A [`Chain`] is an ordered list of stages plus an optional terminal
//! [`Handler`]. Building a chain is plain list assembly and cannot fail;
//! a chain without a terminal handler fails at call time with
//! [`AccordError::IncompleteChain`](accord_core::AccordError::IncompleteChain)
//! once a request reaches its end.
//!
//! Chains are themselves middleware, so a chain without a terminal can be
//! spliced into another chain (see [`compose`]).
//!
//! # Example
//!
//! ```
//! use accord_core::AccordError;
//! use accord_middleware::{Chain, FnMiddleware};
//!
//! let a: FnMiddleware<_, String, String> =
//!     FnMiddleware::new("a", |req, next| Box::pin(async move { next.run(format!("{req}tokenA ")).await }));
//! let b: FnMiddleware<_, String, String> =
//!     FnMiddleware::new("b", |req, next| Box::pin(async move { next.run(format!("{req}tokenB ")).await }));
//!
//! let chain = Chain::builder()
//!     .stage(a)
//!     .stage(b)
//!     .terminal(|req: String| async move { Ok::<_, AccordError>(req) })
//!     .build();
//!
//! assert_eq!(chain.stage_names(), vec!["a", "b"]);
//! # tokio_test::block_on(async {
//! assert_eq!(chain.run("x ".to_string()).await.unwrap(), "x tokenA tokenB ");
//! # });
//! ```

use crate::middleware::{Handler, Middleware, Next};
use accord_core::{AccordResult, BoxFuture};
use std::fmt;
use std::sync::Arc;

/// A type-erased middleware that can be stored in a chain.
pub type BoxedMiddleware<Req, Res> = Arc<dyn Middleware<Req, Res>>;

/// A type-erased terminal handler.
pub type BoxedHandler<Req, Res> = Arc<dyn Handler<Req, Res>>;

/// An ordered middleware chain with an optional terminal handler.
pub struct Chain<Req, Res> {
    stages: Vec<BoxedMiddleware<Req, Res>>,
    terminal: Option<BoxedHandler<Req, Res>>,
}

impl<Req, Res> Chain<Req, Res>
where
    Req: Send + 'static,
    Res: Send + 'static,
{
    /// Creates a chain builder.
    #[must_use]
    pub fn builder() -> ChainBuilder<Req, Res> {
        ChainBuilder::new()
    }

    /// Runs `request` through every stage and the terminal handler.
    pub fn run(&self, request: Req) -> BoxFuture<'_, AccordResult<Res>> {
        self.link(Next::end()).run(request)
    }

    /// Wraps `tail` with this chain's stages.
    ///
    /// With a terminal handler, `tail` is never reached.
    fn link<'a>(&'a self, tail: Next<'a, Req, Res>) -> Next<'a, Req, Res> {
        let mut next = match &self.terminal {
            Some(handler) => Next::handler(handler.as_ref()),
            None => tail,
        };
        for middleware in self.stages.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }
        next
    }

    /// Returns the names of the stages in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|m| m.name()).collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns `true` if the chain has no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Returns `true` if the chain ends in a handler.
    #[must_use]
    pub fn has_terminal(&self) -> bool {
        self.terminal.is_some()
    }
}

impl<Req, Res> Middleware<Req, Res> for Chain<Req, Res>
where
    Req: Send + 'static,
    Res: Send + 'static,
{
    fn name(&self) -> &'static str {
        "chain"
    }

    fn process<'a>(
        &'a self,
        request: Req,
        next: Next<'a, Req, Res>,
    ) -> BoxFuture<'a, AccordResult<Res>> {
        self.link(next).run(request)
    }
}

impl<Req, Res> Handler<Req, Res> for Chain<Req, Res>
where
    Req: Send + 'static,
    Res: Send + 'static,
{
    fn call<'a>(&'a self, request: Req) -> BoxFuture<'a, AccordResult<Res>> {
        self.run(request)
    }
}

impl<Req, Res> fmt::Debug for Chain<Req, Res>
where
    Req: Send + 'static,
    Res: Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("stages", &self.stage_names())
            .field("terminal", &self.has_terminal())
            .finish()
    }
}

/// Builder for [`Chain`].
#[must_use = "builders do nothing unless built"]
pub struct ChainBuilder<Req, Res> {
    stages: Vec<BoxedMiddleware<Req, Res>>,
    terminal: Option<BoxedHandler<Req, Res>>,
}

impl<Req, Res> ChainBuilder<Req, Res>
where
    Req: Send + 'static,
    Res: Send + 'static,
{
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            terminal: None,
        }
    }

    /// Appends a stage.
    pub fn stage<M: Middleware<Req, Res>>(mut self, middleware: M) -> Self {
        self.stages.push(Arc::new(middleware));
        self
    }

    /// Appends an already shared stage.
    pub fn shared_stage(mut self, middleware: BoxedMiddleware<Req, Res>) -> Self {
        self.stages.push(middleware);
        self
    }

    /// Appends several shared stages in order.
    pub fn stages(mut self, stages: impl IntoIterator<Item = BoxedMiddleware<Req, Res>>) -> Self {
        self.stages.extend(stages);
        self
    }

    /// Sets the terminal handler.
    pub fn terminal<H: Handler<Req, Res>>(mut self, handler: H) -> Self {
        self.terminal = Some(Arc::new(handler));
        self
    }

    /// Sets an already shared terminal handler.
    pub fn shared_terminal(mut self, handler: BoxedHandler<Req, Res>) -> Self {
        self.terminal = Some(handler);
        self
    }

    /// Builds the chain.
    pub fn build(self) -> Chain<Req, Res> {
        Chain {
            stages: self.stages,
            terminal: self.terminal,
        }
    }
}

impl<Req, Res> Default for ChainBuilder<Req, Res>
where
    Req: Send + 'static,
    Res: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Composes two stages into one: `first` runs, then `second`, then
/// whatever follows the composite.
pub fn compose<Req, Res, A, B>(first: A, second: B) -> Chain<Req, Res>
where
    Req: Send + 'static,
    Res: Send + 'static,
    A: Middleware<Req, Res>,
    B: Middleware<Req, Res>,
{
    Chain::builder().stage(first).stage(second).build()
}
