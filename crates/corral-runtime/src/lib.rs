//! Container lifecycle management for the Corral daemon.
//!
//! [`service::LifecycleService`] is the operation surface the transport
//! binds to. It composes the [`bundle`] builder, a [`invoker::RuntimeInvoker`],
//! and the [`registry`] under one exclusive lock.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod bundle;
pub mod container;
pub mod invoker;
pub mod logs;
pub mod registry;
pub mod service;
