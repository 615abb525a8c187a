// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod postgres_review;

pub use postgres_review::PostgresReviewStore;
