//! Domain value types for the rdesk agent.
//!
//! This module contains pure business logic with no infrastructure dependencies.
//!
//! # What is "domain" in Clean Architecture? (for beginners)
//!
//! Clean Architecture organises code into concentric layers.  The innermost
//! layer is called the **domain**.  Domain code has **no** imports from OS
//! APIs, network libraries, or async runtimes and can be tested on any
//! platform without external setup.
//!
//! For the agent the domain is small: the size of the captured display and
//! the rule that every pointer coordinate sent to the OS lies inside it.

/// Display geometry and pointer clamping.
///
/// See [`geometry::DisplayGeometry`] for the main type.
pub mod geometry;
