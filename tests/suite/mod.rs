//! Integration test modules

mod access_flow;
mod runtime_flow;
mod workspace_config;
