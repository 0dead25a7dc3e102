//! Group and company records
//!
//! Only used to turn ids into display labels during aggregation.

use serde::{Deserialize, Serialize};

/// Agent group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub id: u64,
    pub name: String,
}

/// Customer company (organisation)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub id: u64,
    pub name: String,
}

/// Anything with an id and a display name
pub trait Labelled {
    fn id(&self) -> u64;
    fn name(&self) -> &str;
}

impl Labelled for GroupRecord {
    fn id(&self) -> u64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Labelled for CompanyRecord {
    fn id(&self) -> u64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}
