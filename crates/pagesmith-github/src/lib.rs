//! GitHub-backed [`RepositoryAccess`](pagesmith_core::RepositoryAccess).

mod client;
mod config;

pub use client::GitHubRepositoryAccess;
