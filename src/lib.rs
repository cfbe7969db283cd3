//! scv - relays signed GitHub push webhooks into deploys.
//!
//! A push to a branch with a configured deploy target becomes a durable
//! deploy task; the task queue later hands it to the deploy worker, which
//! calls the external deploy service. Credentials, the repo, and the
//! branch → target map are managed over a small JSON RPC surface.

pub mod config;
pub mod deploy;
pub mod persistence;
pub mod queue;
pub mod rpc;
pub mod server;
pub mod services;
pub mod settings;
pub mod types;
pub mod webhooks;

#[cfg(test)]
pub mod test_utils;
