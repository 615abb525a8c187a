// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # critiq-core
//!
//! Multi-tenant review-management backend.
//!
//! # Architecture
//!
//! - **domain** — entities, state machines, gateway traits, error kinds
//! - **application** — review/appeal usecases, async moderation pipeline,
//!   cached paged reads, agent orchestrator
//! - **infrastructure** — PostgreSQL store, Elasticsearch gateway, Redis
//!   cache, request coalescer, snowflake IDs, LLM adapter, configuration
//! - **presentation** — HTTP API and the framed binary RPC transport

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
