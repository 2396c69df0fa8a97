use std::fmt;

/// A typed representation of the queryable QuickBooks Online resources.
///
/// The variant name doubles as the table name in the resource query language
/// and as the array key inside the `QueryResponse` envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Account,
    Bill,
    CompanyInfo,
    CreditMemo,
    Customer,
    Estimate,
    Invoice,
    Payment,
}

impl Resource {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Account => "Account",
            Self::Bill => "Bill",
            Self::CompanyInfo => "CompanyInfo",
            Self::CreditMemo => "CreditMemo",
            Self::Customer => "Customer",
            Self::Estimate => "Estimate",
            Self::Invoice => "Invoice",
            Self::Payment => "Payment",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
