//! Workspace tooling package. Holds the rusty-hook pre-commit configuration;
//! the wayfinding code lives under `crates/`.
