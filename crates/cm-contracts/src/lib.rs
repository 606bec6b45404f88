//! # cm-contracts
//!
//! Contract validation for Construct RS.
//!
//! Contracts validate path and body parameters before the API client issues
//! a request, so a malformed id or an inconsistent payload never leaves the
//! process.

pub mod base;
pub mod employees;
pub mod projects;
pub mod materials;

pub use base::*;
pub use employees::EmployeeStatusContract;
pub use projects::{CreateProjectContract, UpdateProjectContract};
pub use materials::MaterialPatchContract;
