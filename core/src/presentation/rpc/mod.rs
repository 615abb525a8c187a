// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod framing;
pub mod server;

pub use framing::FrameCodec;
pub use server::serve;
