//! Display labels for group and company ids
//!
//! A missing label is never an error: lookups fall back to a synthesized
//! name so that aggregation output is always complete.

use std::collections::HashMap;

use deskpulse_protocol::Labelled;

/// Id to name maps used while aggregating
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Labels {
    groups: HashMap<u64, String>,
    companies: HashMap<u64, String>,
}

impl Labels {
    pub fn new(groups: HashMap<u64, String>, companies: HashMap<u64, String>) -> Self {
        Self { groups, companies }
    }

    /// Build from fetched group and company records
    pub fn from_records<G: Labelled, C: Labelled>(groups: &[G], companies: &[C]) -> Self {
        Self {
            groups: label_map(groups),
            companies: label_map(companies),
        }
    }

    pub fn with_group(mut self, id: u64, name: impl Into<String>) -> Self {
        self.groups.insert(id, name.into());
        self
    }

    pub fn with_company(mut self, id: u64, name: impl Into<String>) -> Self {
        self.companies.insert(id, name.into());
        self
    }

    /// Group name, or `Group {id}` when unknown
    pub fn group_name(&self, id: u64) -> String {
        self.groups
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("Group {}", id))
    }

    /// Company name, or `Company {id}` when unknown
    pub fn company_name(&self, id: u64) -> String {
        self.companies
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("Company {}", id))
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn company_count(&self) -> usize {
        self.companies.len()
    }
}

/// Id to name map of `records`; a repeated id keeps the last name
pub fn label_map<L: Labelled>(records: &[L]) -> HashMap<u64, String> {
    records
        .iter()
        .map(|r| (r.id(), r.name().to_string()))
        .collect()
}
