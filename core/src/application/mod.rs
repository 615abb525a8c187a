// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod agent_service;
pub mod audit;
pub mod listing_service;
pub mod pipeline;
pub mod review_service;
pub mod session_memory;

pub use agent_service::AgentService;
pub use audit::AiAuditor;
pub use listing_service::{ListTarget, ListingService};
pub use pipeline::ModerationPipeline;
pub use review_service::ReviewService;
pub use session_memory::SessionMemory;
