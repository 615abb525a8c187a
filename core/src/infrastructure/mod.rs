// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod cache;
pub mod config;
pub mod db;
pub mod llm;
pub mod moderation;
pub mod repositories;
pub mod search;
pub mod singleflight;
pub mod snowflake;

pub use config::AppConfig;
pub use db::Database;
pub use singleflight::Singleflight;
pub use snowflake::SnowflakeGenerator;
