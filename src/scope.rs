use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// OAuth scopes accepted by the QuickBooks Online authorization endpoint.
///
/// Scopes are sent space-separated in the `scope` query parameter, in the order
/// the caller supplies them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Scope {
    /// Full access to the accounting API (`com.intuit.quickbooks.accounting`).
    Accounting,
    /// Access to the payments API (`com.intuit.quickbooks.payment`).
    Payment,
    /// Access to payroll data (`com.intuit.quickbooks.payroll`).
    Payroll,
    /// Access to payroll time tracking (`com.intuit.quickbooks.payroll.timetracking`).
    TimeTracking,
    /// Access to payroll benefits (`com.intuit.quickbooks.payroll.benefits`).
    Benefits,

    // OpenID Connect scopes
    OpenId,
    Profile,
    Email,
    Phone,
    Address,
}

impl Scope {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accounting => "com.intuit.quickbooks.accounting",
            Self::Payment => "com.intuit.quickbooks.payment",
            Self::Payroll => "com.intuit.quickbooks.payroll",
            Self::TimeTracking => "com.intuit.quickbooks.payroll.timetracking",
            Self::Benefits => "com.intuit.quickbooks.payroll.benefits",
            Self::OpenId => "openid",
            Self::Profile => "profile",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Address => "address",
        }
    }

    /// Joins scopes with single spaces, preserving input order.
    #[must_use]
    pub fn join(scopes: &[Self]) -> String {
        scopes
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when parsing a scope from a string.
#[derive(Debug, Clone)]
pub struct ParseScopeError(String);

impl fmt::Display for ParseScopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid scope string: {}", self.0)
    }
}

impl std::error::Error for ParseScopeError {}

impl FromStr for Scope {
    type Err = ParseScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "com.intuit.quickbooks.accounting" => Ok(Self::Accounting),
            "com.intuit.quickbooks.payment" => Ok(Self::Payment),
            "com.intuit.quickbooks.payroll" => Ok(Self::Payroll),
            "com.intuit.quickbooks.payroll.timetracking" => Ok(Self::TimeTracking),
            "com.intuit.quickbooks.payroll.benefits" => Ok(Self::Benefits),
            "openid" => Ok(Self::OpenId),
            "profile" => Ok(Self::Profile),
            "email" => Ok(Self::Email),
            "phone" => Ok(Self::Phone),
            "address" => Ok(Self::Address),
            _ => Err(ParseScopeError(s.to_string())),
        }
    }
}

impl From<Scope> for String {
    fn from(scope: Scope) -> Self {
        scope.as_str().to_string()
    }
}

impl TryFrom<String> for Scope {
    type Error = ParseScopeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
