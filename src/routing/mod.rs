//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host, path)
//!     → router.rs (route lookup)
//!     → matcher.rs (evaluate match conditions)
//!     → Return: matched function target or no match (404)
//!
//! Route Compilation (at startup):
//!     FunctionConfig[]
//!     → Sort by priority
//!     → Compile matchers
//!     → Freeze as immutable Router
//! ```

pub mod matcher;
pub mod router;

pub use router::Router;
