//! # course-rag
//!
//! Question answering over course materials with an LLM that may call
//! retrieval tools for a bounded number of rounds.
//!
//! The crate is split into:
//!
//! - [`agent`]: provider adapters, the orchestration loop, tool registry,
//!   adaptive token budget, prompts and configuration.
//! - [`tools`]: the `search_course_content` and `get_course_outline` tools.
//! - [`retrieval`]: the [`RetrievalService`](retrieval::RetrievalService)
//!   boundary and an in-memory JSON course catalog.
//! - [`cli`]: the `course-rag` command-line interface.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use course_rag::agent::{AgentConfig, Orchestrator, create_provider};
//! use course_rag::retrieval::CourseCatalog;
//! use course_rag::tools::course_registry;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AgentConfig::from_env()?;
//! let catalog = CourseCatalog::load("course-catalog.json".as_ref())?;
//! let registry = course_registry(Arc::new(catalog))?;
//! let orchestrator = Orchestrator::new(Arc::from(create_provider(&config)?), &config);
//!
//! let tools = registry.definitions();
//! let answer = orchestrator
//!     .generate("What does lesson 1 of MCP cover?", None, Some(&tools), Some(&registry))
//!     .await?;
//! let sources = registry.last_sources();
//! # let _ = (answer, sources);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod cli;
pub mod error;
pub mod retrieval;
pub mod tools;

pub use error::{AgentError, CatalogError, CommandError, Error, Result};
