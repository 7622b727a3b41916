//! Database layer.
//!
//! Defines the [`db::Executor`] seam the mapper core talks to, the owned
//! [`db::Row`] it consumes, and [`db::Db`], the SQLite-backed executor.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use microrm::db::db::Db;
//! use microrm::orm::manager::EntityManager;
//!
//! let manager = EntityManager::new(Db::open_in_memory()?);
//! # Ok::<(), microrm::orm::error::OrmError>(())
//! ```

/// Connection management and statement execution.
pub mod db;
