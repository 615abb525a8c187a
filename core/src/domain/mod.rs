// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod cache;
pub mod error;
pub mod llm;
pub mod moderation;
pub mod principal;
pub mod repository;
pub mod review;
pub mod search;

pub use error::ServiceError;
pub use principal::{Principal, Role};
pub use review::{Appeal, AppealStatus, Reply, Review, ReviewStatus};
