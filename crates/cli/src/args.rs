// Path: crates/cli/src/args.rs

//! Named-argument construction for the staking entry points.
//!
//! Every required field is checked for presence before any field is decoded,
//! so a request missing several fields always reports the first missing one
//! and never a decode error. Building is pure: the same fields always produce
//! the same [`NamedArgSet`].
//!
//! The source purse is produced by the dispatch pipeline itself, so building
//! is split in two phases: [`prepare`] validates and decodes everything the
//! caller supplied, [`PreparedArgs::finalize`] slots the funded purse in.

use netctl_types::app::{PublicKey, URef};
use netctl_types::args::{CLValue, NamedArgSet};
use netctl_types::error::ValidationError;
use netctl_types::U512;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The staking operations the pipeline can dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    /// Token allowance for a user account.
    Approve,
    /// Delegation from a user account to a validator.
    Delegate,
    /// A validator bid.
    AddBid,
}

impl OperationKind {
    /// The contract entry point invoked by the final deploy.
    pub fn entry_point(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Delegate => "delegate",
            Self::AddBid => "add_bid",
        }
    }

    /// Fields that must be present, in validation order.
    pub fn required_fields(&self) -> &'static [ArgField] {
        match self {
            Self::Approve => &[
                ArgField::Amount,
                ArgField::User,
                ArgField::GasPayment,
                ArgField::GasPrice,
            ],
            Self::Delegate => &[
                ArgField::Delegator,
                ArgField::Validator,
                ArgField::SourcePurse,
                ArgField::Amount,
            ],
            Self::AddBid => &[
                ArgField::PublicKey,
                ArgField::SourcePurse,
                ArgField::Amount,
                ArgField::DelegationRate,
            ],
        }
    }

    /// Contract argument names and the field each is taken from, in the
    /// order they are passed to the entry point.
    fn arg_layout(&self) -> &'static [(&'static str, ArgField)] {
        match self {
            Self::Approve => &[("spender", ArgField::User), ("amount", ArgField::Amount)],
            Self::Delegate => &[
                ("delegator", ArgField::Delegator),
                ("validator", ArgField::Validator),
                ("amount", ArgField::Amount),
                ("source_purse", ArgField::SourcePurse),
            ],
            Self::AddBid => &[
                ("public_key", ArgField::PublicKey),
                ("source_purse", ArgField::SourcePurse),
                ("amount", ArgField::Amount),
                ("delegation_rate", ArgField::DelegationRate),
            ],
        }
    }

    /// Whether the operation spends from a freshly funded purse.
    pub fn needs_purse(&self) -> bool {
        self.required_fields().contains(&ArgField::SourcePurse)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Delegate => "delegate",
            Self::AddBid => "add-bid",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve" => Ok(Self::Approve),
            "delegate" => Ok(Self::Delegate),
            "add-bid" | "add_bid" | "bid" => Ok(Self::AddBid),
            other => Err(format!("unknown staking operation '{}'", other)),
        }
    }
}

/// A request field the builder understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArgField {
    Amount,
    User,
    GasPayment,
    GasPrice,
    Delegator,
    Validator,
    SourcePurse,
    PublicKey,
    DelegationRate,
}

impl ArgField {
    /// The field's key in an [`ArgFields`] map.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Amount => "amount",
            Self::User => "user",
            Self::GasPayment => "gas-payment",
            Self::GasPrice => "gas-price",
            Self::Delegator => "delegator",
            Self::Validator => "validator",
            Self::SourcePurse => "source-purse",
            Self::PublicKey => "public-key",
            Self::DelegationRate => "delegation-rate",
        }
    }

    fn decode(&self, raw: &str) -> Result<CLValue, ValidationError> {
        let raw = raw.trim();
        let invalid = |reason: String| ValidationError::InvalidArgument {
            name: self.key().to_string(),
            reason,
        };
        match self {
            Self::Amount if raw.strip_prefix('-').map_or(false, |d| U512::from_dec_str(d).is_ok()) => {
                Err(ValidationError::InvalidAmount(format!(
                    "amount must not be negative, got {}",
                    raw
                )))
            }
            Self::Amount | Self::GasPayment => U512::from_dec_str(raw)
                .map(CLValue::U512)
                .map_err(|e| invalid(format!("expected a decimal amount: {:?}", e))),
            Self::GasPrice => raw
                .parse::<u64>()
                .map(CLValue::U64)
                .map_err(|e| invalid(e.to_string())),
            Self::DelegationRate => raw
                .parse::<u8>()
                .map(CLValue::U8)
                .map_err(|e| invalid(e.to_string())),
            Self::User | Self::Delegator | Self::Validator | Self::PublicKey => {
                PublicKey::from_hex(raw).map(CLValue::PublicKey).map_err(invalid)
            }
            Self::SourcePurse => raw.parse::<URef>().map(CLValue::URef).map_err(invalid),
        }
    }
}

/// Raw, string-valued request fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgFields(BTreeMap<ArgField, String>);

impl ArgFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: ArgField, value: impl Into<String>) {
        self.0.insert(field, value.into());
    }

    pub fn with(mut self, field: ArgField, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn get(&self, field: ArgField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }
}

/// Arguments validated and decoded, awaiting the pipeline's source purse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedArgs {
    kind: OperationKind,
    values: BTreeMap<ArgField, CLValue>,
}

impl PreparedArgs {
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// The decoded amount.
    pub fn amount(&self) -> Option<U512> {
        self.values
            .get(&ArgField::Amount)
            .and_then(CLValue::as_u512)
            .copied()
    }

    /// The decoded payment amount, when one was given.
    pub fn gas_payment(&self) -> Option<U512> {
        self.values
            .get(&ArgField::GasPayment)
            .and_then(CLValue::as_u512)
            .copied()
    }

    /// The decoded gas price, when one was given.
    pub fn gas_price(&self) -> Option<u64> {
        match self.values.get(&ArgField::GasPrice) {
            Some(CLValue::U64(v)) => Some(*v),
            _ => None,
        }
    }

    /// Produces the final argument set. `purse` is required exactly when the
    /// operation spends from a source purse.
    pub fn finalize(&self, purse: Option<URef>) -> Result<NamedArgSet, ValidationError> {
        let mut values = self.values.clone();
        if self.kind.needs_purse() {
            let purse = purse
                .ok_or_else(|| ValidationError::MissingArgument(ArgField::SourcePurse.key().into()))?;
            values.insert(ArgField::SourcePurse, CLValue::URef(purse));
        }

        let mut args = NamedArgSet::new();
        for (name, field) in self.kind.arg_layout() {
            let value = values
                .remove(field)
                .ok_or_else(|| ValidationError::MissingArgument(field.key().into()))?;
            args.insert(*name, value);
        }
        Ok(args)
    }
}

fn check_present(
    kind: OperationKind,
    fields: &ArgFields,
    skip: Option<ArgField>,
) -> Result<(), ValidationError> {
    for field in kind.required_fields() {
        if Some(*field) == skip {
            continue;
        }
        if fields.get(*field).map_or(true, |v| v.trim().is_empty()) {
            return Err(ValidationError::MissingArgument(field.key().into()));
        }
    }
    Ok(())
}

/// Validates and decodes every field except the source purse.
pub fn prepare(kind: OperationKind, fields: &ArgFields) -> Result<PreparedArgs, ValidationError> {
    check_present(kind, fields, Some(ArgField::SourcePurse))?;

    let mut values = BTreeMap::new();
    for field in kind.required_fields() {
        if *field == ArgField::SourcePurse {
            continue;
        }
        if let Some(raw) = fields.get(*field) {
            values.insert(*field, field.decode(raw)?);
        }
    }
    // Gas settings are optional for operations that do not require them.
    for field in [ArgField::GasPayment, ArgField::GasPrice] {
        if values.contains_key(&field) {
            continue;
        }
        if let Some(raw) = fields.get(field) {
            values.insert(field, field.decode(raw)?);
        }
    }

    let prepared = PreparedArgs { kind, values };
    if kind.needs_purse() && prepared.amount().map_or(true, |a| a.is_zero()) {
        return Err(ValidationError::InvalidAmount(format!(
            "{} requires a strictly positive amount",
            kind
        )));
    }
    Ok(prepared)
}

/// Builds the complete argument set from caller-supplied fields, including
/// the source purse where the operation needs one.
pub fn build_args(kind: OperationKind, fields: &ArgFields) -> Result<NamedArgSet, ValidationError> {
    check_present(kind, fields, None)?;
    let prepared = prepare(kind, fields)?;
    let purse = match fields.get(ArgField::SourcePurse) {
        Some(raw) => match ArgField::SourcePurse.decode(raw)? {
            CLValue::URef(u) => Some(u),
            _ => None,
        },
        None => None,
    };
    prepared.finalize(purse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use netctl_types::codec::to_bytes_canonical;

    fn key(byte: u8) -> String {
        format!("01{}", hex::encode([byte; 32]))
    }

    fn purse() -> String {
        format!("uref-{}-007", "33".repeat(32))
    }

    fn add_bid_fields() -> ArgFields {
        ArgFields::new()
            .with(ArgField::PublicKey, key(1))
            .with(ArgField::SourcePurse, purse())
            .with(ArgField::Amount, "1000000000")
            .with(ArgField::DelegationRate, "10")
    }

    #[test]
    fn add_bid_args_in_entry_point_order() {
        let args = build_args(OperationKind::AddBid, &add_bid_fields()).unwrap();
        assert_eq!(
            args.names(),
            vec!["public_key", "source_purse", "amount", "delegation_rate"]
        );
        assert_eq!(args.get("delegation_rate"), Some(&CLValue::U8(10)));
    }

    #[test]
    fn building_is_deterministic() {
        let a = build_args(OperationKind::AddBid, &add_bid_fields()).unwrap();
        let b = build_args(OperationKind::AddBid, &add_bid_fields()).unwrap();
        assert_eq!(to_bytes_canonical(&a), to_bytes_canonical(&b));
    }

    #[test]
    fn missing_field_reported_before_any_decode() {
        // amount is malformed, but delegation-rate is absent: presence wins.
        let fields = ArgFields::new()
            .with(ArgField::PublicKey, "not-a-key")
            .with(ArgField::SourcePurse, purse())
            .with(ArgField::Amount, "lots");
        assert_eq!(
            build_args(OperationKind::AddBid, &fields).unwrap_err(),
            ValidationError::MissingArgument("delegation-rate".into())
        );
    }

    #[test]
    fn malformed_field_is_invalid_argument() {
        let fields = add_bid_fields().with(ArgField::DelegationRate, "300");
        assert!(matches!(
            build_args(OperationKind::AddBid, &fields).unwrap_err(),
            ValidationError::InvalidArgument { name, .. } if name == "delegation-rate"
        ));
    }

    #[test]
    fn zero_amount_rejected_for_purse_operations() {
        let fields = add_bid_fields().with(ArgField::Amount, "0");
        assert!(matches!(
            build_args(OperationKind::AddBid, &fields).unwrap_err(),
            ValidationError::InvalidAmount(_)
        ));
    }

    #[test]
    fn negative_amount_is_invalid_amount() {
        let fields = add_bid_fields().with(ArgField::Amount, "-5");
        assert!(matches!(
            build_args(OperationKind::AddBid, &fields).unwrap_err(),
            ValidationError::InvalidAmount(m) if m.contains("-5")
        ));
        let fields = ArgFields::new()
            .with(ArgField::Amount, " -10 ")
            .with(ArgField::User, key(4))
            .with(ArgField::GasPayment, "10000")
            .with(ArgField::GasPrice, "1");
        assert!(matches!(
            prepare(OperationKind::Approve, &fields).unwrap_err(),
            ValidationError::InvalidAmount(_)
        ));
        let fields = add_bid_fields().with(ArgField::Amount, "-lots");
        assert!(matches!(
            build_args(OperationKind::AddBid, &fields).unwrap_err(),
            ValidationError::InvalidArgument { name, .. } if name == "amount"
        ));
    }

    #[test]
    fn prepare_defers_the_purse() {
        let fields = ArgFields::new()
            .with(ArgField::Delegator, key(2))
            .with(ArgField::Validator, key(3))
            .with(ArgField::Amount, "5");
        let prepared = prepare(OperationKind::Delegate, &fields).unwrap();
        assert_eq!(prepared.amount(), Some(U512::from(5u64)));
        assert_eq!(
            prepared.finalize(None).unwrap_err(),
            ValidationError::MissingArgument("source-purse".into())
        );

        let purse: URef = purse().parse().unwrap();
        let args = prepared.finalize(Some(purse)).unwrap();
        assert_eq!(
            args.names(),
            vec!["delegator", "validator", "amount", "source_purse"]
        );
        assert_eq!(args.get("source_purse").and_then(CLValue::as_uref), Some(&purse));
    }

    #[test]
    fn approve_requires_gas_settings_and_takes_no_purse() {
        let fields = ArgFields::new()
            .with(ArgField::Amount, "10")
            .with(ArgField::User, key(4))
            .with(ArgField::GasPayment, "10000");
        assert_eq!(
            prepare(OperationKind::Approve, &fields).unwrap_err(),
            ValidationError::MissingArgument("gas-price".into())
        );

        let prepared = prepare(OperationKind::Approve, &fields.with(ArgField::GasPrice, "1")).unwrap();
        assert_eq!(prepared.gas_price(), Some(1));
        assert_eq!(prepared.gas_payment(), Some(U512::from(10_000u64)));
        let args = prepared.finalize(None).unwrap();
        assert_eq!(args.names(), vec!["spender", "amount"]);
    }

    #[test]
    fn kind_names_round_trip() {
        for kind in [OperationKind::Approve, OperationKind::Delegate, OperationKind::AddBid] {
            assert_eq!(kind.as_str().parse::<OperationKind>().unwrap(), kind);
        }
        assert!("unbond".parse::<OperationKind>().is_err());
    }
}
