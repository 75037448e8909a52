//! Parapet — resilience layer for API clients.
//!
//! Converts heterogeneous raw failure signals into a canonical error
//! model, protects failing dependencies with named circuit breakers, and
//! drives bounded retry with exponential backoff. The crate performs no
//! I/O of its own; network calls are injected as opaque async operations.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use parapet::prelude::*;
//!
//! # async fn example() -> parapet::error::Result<()> {
//! let registry = Arc::new(BreakerRegistry::new());
//! let interceptor = ErrorInterceptor::new(registry, Arc::new(NoopHooks));
//!
//! let ctx = RequestContext::new("GET", "/api/catalog");
//! let catalog: Vec<String> = interceptor
//!     .run(&ctx, || async {
//!         // Perform the real call here; map transport failures into
//!         // `RawFailure` at the boundary.
//!         Ok(vec!["starter-prompt".to_string()])
//!     })
//!     .await?;
//! # let _ = catalog;
//! # Ok(())
//! # }
//! ```

pub mod breaker;
pub mod classify;
pub mod error;
pub mod interceptor;
pub mod messages;
pub mod prelude;
pub mod retry;
pub mod util;
