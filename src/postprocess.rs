//! Optional post-processing applied to the aggregated owner list: owner
//! deduplication and smart-contract exclusion.

use std::collections::HashSet;

/// Removes duplicate addresses, keeping the first occurrence of each.
pub fn dedup_owners(owners: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(owners.len());
    owners
        .into_iter()
        .filter(|owner| seen.insert(owner.clone()))
        .collect()
}

/// Decides whether an address belongs to a smart contract.
pub trait AddressClassifier {
    fn is_contract(&self, address: &str) -> bool;
}

/// Drops every address the classifier flags as a contract, preserving the
/// input order of the rest.
pub fn exclude_contracts<C: AddressClassifier>(owners: Vec<String>, classifier: &C) -> Vec<String> {
    owners
        .into_iter()
        .filter(|owner| !classifier.is_contract(owner))
        .collect()
}

/// Classifier for bech32 address schemes in which contract addresses carry a
/// zeroed leading payload, such as MultiversX: the first eight bytes of a
/// contract address are zero, so the data part of the bech32 string begins
/// with at least twelve `q` characters (`q` encodes 0).
pub struct BechPrefixClassifier {
    hrp: String,
}

const ZERO_PREFIX: &str = "qqqqqqqqqqqq";

impl BechPrefixClassifier {
    pub fn new(hrp: impl Into<String>) -> Self {
        Self { hrp: hrp.into() }
    }

    pub fn multiversx() -> Self {
        Self::new("erd")
    }
}

impl AddressClassifier for BechPrefixClassifier {
    fn is_contract(&self, address: &str) -> bool {
        address
            .strip_prefix(self.hrp.as_str())
            .and_then(|rest| rest.strip_prefix('1'))
            .map(|data| data.starts_with(ZERO_PREFIX))
            .unwrap_or(false)
    }
}
