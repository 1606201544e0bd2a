// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning

// ============================================================================
// Crate Documentation
// ============================================================================

//! # resync
//!
//! A CLI tool that mirrors selected resource modules from a *source*
//! deployment onto a *target* deployment of the same platform.
//!
//! ## Overview
//!
//! For each selected module, resync:
//!
//! 1. Discovers the module's synchronizers (including one per parent
//!    resource for dependent sub-resources, enumerated from the source)
//! 2. Fetches the current resource sets from both deployments
//! 3. Computes the minimal diff (insertions, updations, deletions)
//! 4. Applies the diff against the target with per-item failure isolation,
//!    or renders a preview in dry-run mode
//!
//! Convergence is "source wins": no conflict resolution, no rollback.
//! Partial application is an accepted outcome that is surfaced, not hidden.
//!
//! ## Modules
//!
//! - [`api`]: deployment REST transport and the opaque resource model
//! - [`diff`]: the pure diff engine
//! - [`sync`]: per-kind synchronizers and the generic sync driver
//! - [`apply`]: concurrent, failure-isolating apply executor
//! - [`progress`]: injected progress reporting
//! - [`orchestrator`]: tree building and the per-module run loop
//! - [`cli`]: command-line surface and output rendering
//! - [`error`]: error hierarchy

// ============================================================================
// Modules
// ============================================================================

pub mod api;
pub mod apply;
pub mod cli;
pub mod diff;
pub mod error;
pub mod orchestrator;
pub mod progress;
pub mod sync;

// ============================================================================
// Re-exports
// ============================================================================

pub use api::{ApiClient, Resource, ResourceSet};
pub use apply::{ApplyAction, ApplyExecutor, ApplyFailure, ApplyReport};
pub use cli::{Cli, OutputFormat, OutputFormatter};
pub use diff::{DiffEngine, DiffResult};
pub use error::{ResyncError, Result};
pub use orchestrator::{Orchestrator, RunOutcome, RunReport};
pub use progress::{ConsoleProgress, NullProgress, ProgressReporter};
pub use sync::{SyncContext, SyncNode};
