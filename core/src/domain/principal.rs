// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Authenticated principal carried by every request.
//!
//! Token validation happens at the edge; the core consumes the verified
//! claim set as-is. `Reviewer` is the operations-staff role: it audits
//! reviews and appeals.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Merchant,
    Reviewer,
}

impl Role {
    pub fn from_claim(claim: &str) -> Option<Role> {
        match claim {
            "customer" => Some(Role::Customer),
            "merchant" => Some(Role::Merchant),
            "reviewer" => Some(Role::Reviewer),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Merchant => "merchant",
            Role::Reviewer => "reviewer",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: i64,
    pub role: Role,
    /// Present for merchants only.
    pub store_id: Option<i64>,
}

impl Principal {
    /// Merchant store ownership check; non-merchants never own a store.
    pub fn owns_store(&self, store_id: i64) -> bool {
        self.role == Role::Merchant && self.store_id == Some(store_id)
    }
}
