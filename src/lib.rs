//! # Microrm - a metadata-driven micro object-relational mapper
//!
//! Plain structs declare a role for each field (identity, column, to-one or
//! to-many relation). From those declarations the crate compiles SQL
//! statements, runs them through an executor and maps result rows back into
//! populated object graphs.
//!
//! ## Features
//!
//! - **Declarative Entities**: one [`impl_entity!`] call per struct
//! - **Statement Compiler**: CREATE, DROP, INSERT, SELECT, COUNT, UPDATE and DELETE for SQLite and Postgres
//! - **Parameterized Execution**: values are bound, never spliced into executed SQL
//! - **Relation Loading**: to-one stubs, one-to-many children with back-references, many-to-many through join tables
//! - **Command Line Walkthrough**: `microrm init`, `schema`, `demo` and `drop`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use microrm::commands::Cli;
//!
//! fn main() -> anyhow::Result<()> {
//!     Cli::menu()
//! }
//! ```

pub mod commands;
pub mod db;
pub mod libs;
pub mod orm;
