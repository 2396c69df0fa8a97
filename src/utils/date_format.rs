use time::Date;
use time::macros::format_description;

/// Serde helpers for QuickBooks' plain `YYYY-MM-DD` date fields
/// (`TxnDate`, `DueDate`, ...), which carry no time or offset component.
pub mod qb_date_option {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    use super::{format_qb_date, parse_qb_date};

    pub fn serialize<S: Serializer>(date: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => serializer.serialize_str(&format_qb_date(*date)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Date>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(s) => parse_qb_date(&s).map(Some).map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}

pub fn format_qb_date(date: Date) -> String {
    let format = format_description!("[year]-[month]-[day]");
    date.format(&format)
        .unwrap_or_else(|_| date.to_string())
}

pub fn parse_qb_date(s: &str) -> Result<Date, String> {
    let format = format_description!("[year]-[month]-[day]");
    Date::parse(s, &format).map_err(|e| format!("Failed to parse date '{s}': {e}"))
}
