//! Resolution of external account ids and instrument symbols to internal ids.
//!
//! Precedence is: explicit request mapping, then persisted associations, then
//! auto-creation (when allowed). Matching is exact; identifiers are not
//! trimmed or case-folded.

use log::debug;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::snapshots_input::SnapshotCommitInput;
use crate::accounts::{AccountRepositoryTrait, NewAccount};
use crate::instruments::{InstrumentRepositoryTrait, NewInstrument};
use crate::{Error, Result};

/// Lookup tables produced for a single commit. Never shared across commits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedEntities {
    pub accounts: HashMap<String, i64>,
    pub instruments: HashMap<String, i64>,
}

impl ResolvedEntities {
    pub fn account_id(&self, external_id: &str) -> Option<i64> {
        self.accounts.get(external_id).copied()
    }

    pub fn instrument_id(&self, symbol: &str) -> Option<i64> {
        self.instruments.get(symbol).copied()
    }
}

pub struct EntityResolver {
    account_repository: Arc<dyn AccountRepositoryTrait>,
    instrument_repository: Arc<dyn InstrumentRepositoryTrait>,
}

impl EntityResolver {
    pub fn new(
        account_repository: Arc<dyn AccountRepositoryTrait>,
        instrument_repository: Arc<dyn InstrumentRepositoryTrait>,
    ) -> Self {
        Self {
            account_repository,
            instrument_repository,
        }
    }

    /// Resolves every account and instrument referenced by `input`.
    ///
    /// Creation notices are appended to `warnings`. Identifiers that stay
    /// unresolved are simply absent from the result.
    pub async fn resolve(
        &self,
        user_id: &str,
        input: &SnapshotCommitInput,
        warnings: &mut Vec<String>,
    ) -> Result<ResolvedEntities> {
        let accounts = self.resolve_accounts(user_id, input, warnings).await?;
        let instruments = self.resolve_instruments(input, warnings).await?;
        Ok(ResolvedEntities {
            accounts,
            instruments,
        })
    }

    async fn resolve_accounts(
        &self,
        user_id: &str,
        input: &SnapshotCommitInput,
        warnings: &mut Vec<String>,
    ) -> Result<HashMap<String, i64>> {
        let mut resolved = input.mapping.account_map.clone();

        let referenced = input
            .cash
            .iter()
            .map(|line| line.account_external_id.as_str())
            .chain(
                input
                    .positions
                    .iter()
                    .map(|line| line.account_external_id.as_str()),
            )
            .chain(
                input
                    .transactions
                    .iter()
                    .map(|line| line.account_external_id.as_str()),
            );
        let mut unresolved = unique_unresolved(referenced, &resolved);

        if !unresolved.is_empty() {
            let known = self
                .account_repository
                .find_external_ids(user_id, &unresolved)?;
            for association in known {
                resolved
                    .entry(association.external_id)
                    .or_insert(association.account_id);
            }
            unresolved.retain(|external_id| !resolved.contains_key(external_id));
        }

        if unresolved.is_empty() || !input.options.create_missing_accounts {
            return Ok(resolved);
        }

        let new_accounts: Vec<NewAccount> = unresolved
            .iter()
            .map(|external_id| {
                NewAccount::synthesized(user_id, external_id, input.source.as_str())
            })
            .collect();
        let created = self.account_repository.create_accounts(new_accounts).await?;
        if created.len() != unresolved.len() {
            return Err(Error::Unexpected(format!(
                "Expected {} created accounts, got {}",
                unresolved.len(),
                created.len()
            )));
        }

        for (external_id, account) in unresolved.into_iter().zip(created) {
            if account.is_created() {
                debug!("Created account {} for external id '{}'", account.id, external_id);
                warnings.push(format!("Created new account: {}", external_id));
            }
            resolved.insert(external_id, account.id);
        }

        Ok(resolved)
    }

    async fn resolve_instruments(
        &self,
        input: &SnapshotCommitInput,
        warnings: &mut Vec<String>,
    ) -> Result<HashMap<String, i64>> {
        let mut resolved = input.mapping.instrument_map.clone();

        let referenced = input
            .positions
            .iter()
            .map(|line| line.symbol.as_str())
            .chain(
                input
                    .transactions
                    .iter()
                    .filter_map(|line| line.symbol.as_deref()),
            );
        let mut unresolved = unique_unresolved(referenced, &resolved);

        if !unresolved.is_empty() {
            let known = self.instrument_repository.find_by_symbols(&unresolved)?;
            for instrument in known {
                resolved.entry(instrument.symbol).or_insert(instrument.id);
            }
            unresolved.retain(|symbol| !resolved.contains_key(symbol));
        }

        if unresolved.is_empty() || !input.options.create_missing_instruments {
            return Ok(resolved);
        }

        let new_instruments: Vec<NewInstrument> = unresolved
            .iter()
            .map(|symbol| NewInstrument::synthesized(symbol))
            .collect();
        let created = self
            .instrument_repository
            .create_instruments(new_instruments)
            .await?;
        if created.len() != unresolved.len() {
            return Err(Error::Unexpected(format!(
                "Expected {} created instruments, got {}",
                unresolved.len(),
                created.len()
            )));
        }

        for (symbol, instrument) in unresolved.into_iter().zip(created) {
            if instrument.is_created() {
                debug!("Created instrument {} for symbol '{}'", instrument.id, symbol);
                warnings.push(format!("Created new instrument: {}", symbol));
            }
            resolved.insert(symbol, instrument.id);
        }

        Ok(resolved)
    }
}

/// Distinct identifiers not present in `resolved`, in order of first reference.
fn unique_unresolved<'a>(
    referenced: impl Iterator<Item = &'a str>,
    resolved: &HashMap<String, i64>,
) -> Vec<String> {
    let mut seen = HashSet::new();
    referenced
        .filter(|id| !resolved.contains_key(*id))
        .filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_unresolved_keeps_first_reference_order() {
        let mut resolved = HashMap::new();
        resolved.insert("mapped".to_string(), 7);

        let ids = ["b", "mapped", "a", "b", "c", "a"];
        let result = unique_unresolved(ids.into_iter(), &resolved);

        assert_eq!(result, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_unique_unresolved_is_case_sensitive() {
        let resolved = HashMap::new();
        let ids = ["ACC1", "acc1", " acc1"];
        let result = unique_unresolved(ids.into_iter(), &resolved);
        assert_eq!(result.len(), 3);
    }
}
