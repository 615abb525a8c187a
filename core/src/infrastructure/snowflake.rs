// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Time-ordered 64-bit identifier generator.
//!
//! Layout: 41 bits of milliseconds since the configured epoch, 10 bits of
//! machine id, 12 bits of per-millisecond sequence. IDs are strictly
//! increasing per machine; the generator busy-waits into the next
//! millisecond when a single tick exhausts its sequence space.

use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

const MACHINE_BITS: u8 = 10;
const SEQUENCE_BITS: u8 = 12;
const MAX_MACHINE_ID: i64 = (1 << MACHINE_BITS) - 1;
const SEQUENCE_MASK: i64 = (1 << SEQUENCE_BITS) - 1;

#[derive(Debug, Clone, Error)]
pub enum IdError {
    #[error("invalid snowflake configuration: {0}")]
    Config(String),

    /// Wall clock moved backward between calls; refusing to reuse time.
    #[error("clock moved backward by {0} ms")]
    ClockBackward(i64),
}

#[derive(Debug)]
struct GeneratorState {
    last_ms: i64,
    sequence: i64,
}

#[derive(Debug)]
pub struct SnowflakeGenerator {
    epoch_ms: i64,
    machine_id: i64,
    state: Mutex<GeneratorState>,
}

impl SnowflakeGenerator {
    pub fn new(epoch_ms: i64, machine_id: i64) -> Result<Self, IdError> {
        if !(0..=MAX_MACHINE_ID).contains(&machine_id) {
            return Err(IdError::Config(format!(
                "machine id {machine_id} out of range 0..={MAX_MACHINE_ID}"
            )));
        }
        if epoch_ms > now_ms() {
            return Err(IdError::Config(format!(
                "epoch {epoch_ms} lies in the future"
            )));
        }
        Ok(Self {
            epoch_ms,
            machine_id,
            state: Mutex::new(GeneratorState {
                last_ms: -1,
                sequence: 0,
            }),
        })
    }

    pub fn next_id(&self) -> Result<i64, IdError> {
        let mut state = self.state.lock().expect("snowflake state poisoned");

        let mut now = now_ms();
        if now < state.last_ms {
            return Err(IdError::ClockBackward(state.last_ms - now));
        }

        if now == state.last_ms {
            state.sequence = (state.sequence + 1) & SEQUENCE_MASK;
            if state.sequence == 0 {
                // Sequence space exhausted within this tick.
                while now <= state.last_ms {
                    now = now_ms();
                }
            }
        } else {
            state.sequence = 0;
        }
        state.last_ms = now;

        let elapsed = now - self.epoch_ms;
        Ok((elapsed << (MACHINE_BITS + SEQUENCE_BITS))
            | (self.machine_id << SEQUENCE_BITS)
            | state.sequence)
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_future_epoch() {
        let future = now_ms() + 60_000;
        assert!(matches!(
            SnowflakeGenerator::new(future, 1),
            Err(IdError::Config(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_machine_id() {
        assert!(matches!(
            SnowflakeGenerator::new(0, MAX_MACHINE_ID + 1),
            Err(IdError::Config(_))
        ));
        assert!(matches!(
            SnowflakeGenerator::new(0, -1),
            Err(IdError::Config(_))
        ));
    }

    #[test]
    fn ids_strictly_increase() {
        let gen = SnowflakeGenerator::new(1_600_000_000_000, 3).unwrap();
        let mut last = 0;
        for _ in 0..10_000 {
            let id = gen.next_id().unwrap();
            assert!(id > last, "ids must be strictly increasing");
            last = id;
        }
    }

    #[test]
    fn machine_id_is_embedded() {
        let gen = SnowflakeGenerator::new(1_600_000_000_000, 7).unwrap();
        let id = gen.next_id().unwrap();
        assert_eq!((id >> SEQUENCE_BITS) & MAX_MACHINE_ID, 7);
    }
}
