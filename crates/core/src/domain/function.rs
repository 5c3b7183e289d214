use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resource {
    Payments,
    Contacts,
}

impl Resource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Payments => "Payments",
            Self::Contacts => "Contacts",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentFunction {
    SepaCreditTransfer,
    UsDomesticWire,
    UsForeignWire,
}

impl PaymentFunction {
    pub const ALL: [PaymentFunction; 3] =
        [Self::SepaCreditTransfer, Self::UsDomesticWire, Self::UsForeignWire];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SepaCreditTransfer => "SEPA CT",
            Self::UsDomesticWire => "US Domestic Wire",
            Self::UsForeignWire => "US Foreign Wire",
        }
    }
}

/// Function a policy assignment is bound to, together with its owning resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BusinessFunction {
    Payment(PaymentFunction),
    Contacts,
}

impl BusinessFunction {
    pub fn resource(self) -> Resource {
        match self {
            Self::Payment(_) => Resource::Payments,
            Self::Contacts => Resource::Contacts,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Payment(function) => function.as_str(),
            Self::Contacts => "Contacts",
        }
    }
}

impl fmt::Display for BusinessFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource().as_str(), self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CurrencyCode {
    #[serde(rename = "EUR")]
    Eur,
    #[serde(rename = "USD")]
    Usd,
}

impl CurrencyCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eur => "EUR",
            Self::Usd => "USD",
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bound currency of a payment function. Depends on the function only, never on
/// the legal entity's locale.
pub fn currency_for(function: PaymentFunction) -> CurrencyCode {
    match function {
        PaymentFunction::SepaCreditTransfer => CurrencyCode::Eur,
        PaymentFunction::UsDomesticWire | PaymentFunction::UsForeignWire => CurrencyCode::Usd,
    }
}

#[cfg(test)]
mod tests {
    use super::{currency_for, BusinessFunction, CurrencyCode, PaymentFunction, Resource};

    #[test]
    fn only_sepa_is_priced_in_euro() {
        assert_eq!(currency_for(PaymentFunction::SepaCreditTransfer), CurrencyCode::Eur);
        assert_eq!(currency_for(PaymentFunction::UsDomesticWire), CurrencyCode::Usd);
        assert_eq!(currency_for(PaymentFunction::UsForeignWire), CurrencyCode::Usd);
    }

    #[test]
    fn functions_carry_their_resource_and_wire_name() {
        let sepa = BusinessFunction::Payment(PaymentFunction::SepaCreditTransfer);
        assert_eq!(sepa.resource(), Resource::Payments);
        assert_eq!(sepa.name(), "SEPA CT");
        assert_eq!(sepa.to_string(), "Payments/SEPA CT");

        assert_eq!(BusinessFunction::Contacts.resource(), Resource::Contacts);
        assert_eq!(BusinessFunction::Contacts.name(), "Contacts");
    }

    #[test]
    fn currency_serializes_as_iso_code() {
        let encoded = serde_json::to_string(&CurrencyCode::Eur).expect("serialize currency");
        assert_eq!(encoded, "\"EUR\"");
    }
}
