use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{Error, Result};

pub mod account;
pub mod bill;
pub mod company_info;
pub mod credit_memo;
pub mod customer;
pub mod estimate;
pub mod invoice;
pub mod payment;

/// Create/last-updated audit timestamps present on every entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetaData {
    #[serde(with = "time::serde::rfc3339")]
    pub create_time: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated_time: OffsetDateTime,
}

/// A reference to another entity, e.g. `CustomerRef` or `VendorRef`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRef {
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Rejects inverted date ranges before any builder state is touched or any
/// request is made. The builder itself accepts whatever clauses it is given.
pub(crate) fn validate_date_range(start: OffsetDateTime, end: OffsetDateTime) -> Result<()> {
    if start > end {
        return Err(Error::Validation(
            "Start date must be before end date".to_string(),
        ));
    }
    Ok(())
}
