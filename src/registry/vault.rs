//! Vault-per-user ledger
//!
//! Each owner gets at most one vault, placed at the address derived from
//! their account id. Coins sent to a vault address before the vault is
//! opened wait in a mailbox and are swept in when it opens.

use crate::config::Limits;
use crate::context::ExecutionContext;
use crate::error::{Error, Result};
use crate::payload::{Mailbox, PayloadStore};
use crate::slot::{
    allocator, derive_address, AccountId, DerivedAddress, Namespace, NamespaceId, SlotKey,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vault {
    pub owner: AccountId,
    pub balance: u64,
    pub created_epoch: u64,
}

/// Coins in transit to a vault address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    pub from: AccountId,
    pub amount: u64,
    pub epoch: u64,
}

pub struct VaultLedger {
    namespace: Namespace,
    vaults: PayloadStore<Vault>,
    in_transit: Mailbox<Deposit>,
    limits: Limits,
}

impl VaultLedger {
    pub fn new(limits: Limits) -> Self {
        Self::with_namespace(NamespaceId::new(), limits)
    }

    pub fn with_namespace(id: NamespaceId, limits: Limits) -> Self {
        Self {
            namespace: Namespace::with_id(id),
            vaults: PayloadStore::new(),
            in_transit: Mailbox::new(),
            limits,
        }
    }

    pub fn namespace_id(&self) -> NamespaceId {
        self.namespace.id()
    }

    /// Where `owner`'s vault lives (or will live)
    pub fn vault_address(&self, owner: &AccountId) -> DerivedAddress {
        derive_address(&self.namespace.id(), &SlotKey::from(owner))
    }

    fn credit(&self, balance: u64, amount: u64) -> Result<u64> {
        balance
            .checked_add(amount)
            .filter(|total| *total <= self.limits.max_vault_balance)
            .ok_or_else(|| {
                Error::LimitExceeded(format!(
                    "Vault balance would exceed {}",
                    self.limits.max_vault_balance
                ))
            })
    }

    /// Open the sender's vault and sweep in anything sent ahead of time
    pub fn open_vault(&mut self, ctx: &ExecutionContext) -> Result<DerivedAddress> {
        let address = self.vault_address(&ctx.sender);
        let early: u64 = self
            .in_transit
            .pending(&address)
            .iter()
            .try_fold(0u64, |sum, deposit| sum.checked_add(deposit.amount))
            .ok_or_else(|| Error::LimitExceeded("Pending deposits overflow".to_string()))?;
        let balance = self.credit(0, early)?;

        let capability = allocator::claim(&mut self.namespace, &ctx.sender)?;
        self.vaults.place(
            capability,
            Vault {
                owner: ctx.sender,
                balance,
                created_epoch: ctx.epoch,
            },
        )?;
        let swept = self.in_transit.collect(&address).len();

        info!(owner = %ctx.sender, address = %address, balance, swept, "Opened vault");
        Ok(address)
    }

    /// Send `amount` to `owner`'s vault, open or not
    pub fn deposit(
        &mut self,
        ctx: &ExecutionContext,
        owner: &AccountId,
        amount: u64,
    ) -> Result<()> {
        if amount == 0 {
            return Err(Error::InvalidArgument("Deposit amount must be positive".to_string()));
        }

        let address = self.vault_address(owner);
        match self.vaults.get(&address).map(|vault| vault.balance) {
            Some(balance) => {
                let updated = self.credit(balance, amount)?;
                if let Some(vault) = self.vaults.get_mut(&address) {
                    vault.balance = updated;
                }
                debug!(owner = %owner, amount, balance = updated, "Deposited into vault");
            }
            None => {
                let pending = self.pending_deposits(owner);
                self.credit(pending, amount)?;
                self.in_transit.deliver(
                    address,
                    Deposit {
                        from: ctx.sender,
                        amount,
                        epoch: ctx.epoch,
                    },
                );
                debug!(owner = %owner, amount, "Deposit held until vault opens");
            }
        }
        Ok(())
    }

    /// Withdraw from the sender's own vault
    pub fn withdraw(&mut self, ctx: &ExecutionContext, amount: u64) -> Result<u64> {
        let address = self.vault_address(&ctx.sender);
        let vault = self
            .vaults
            .get_mut(&address)
            .ok_or_else(|| Error::NotFound(format!("No vault for {}", ctx.sender)))?;

        if vault.owner != ctx.sender {
            return Err(Error::Unauthorized(format!(
                "{} does not own vault {}",
                ctx.sender, address
            )));
        }
        if amount > vault.balance {
            return Err(Error::InsufficientFunds {
                requested: amount,
                available: vault.balance,
            });
        }

        vault.balance -= amount;
        debug!(owner = %ctx.sender, amount, balance = vault.balance, "Withdrew from vault");
        Ok(vault.balance)
    }

    pub fn balance(&self, owner: &AccountId) -> Option<u64> {
        self.vaults
            .get(&self.vault_address(owner))
            .map(|vault| vault.balance)
    }

    pub fn vault(&self, owner: &AccountId) -> Option<&Vault> {
        self.vaults.get(&self.vault_address(owner))
    }

    /// Total sent to `owner`'s address while no vault was open
    pub fn pending_deposits(&self, owner: &AccountId) -> u64 {
        self.in_transit
            .pending(&self.vault_address(owner))
            .iter()
            .fold(0u64, |sum, deposit| sum.saturating_add(deposit.amount))
    }

    /// Destroy the sender's vault and free its slot, returning the balance
    pub fn close_vault(&mut self, ctx: &ExecutionContext) -> Result<u64> {
        let address = self.vault_address(&ctx.sender);
        let vault = self
            .vaults
            .destroy(&address)
            .ok_or_else(|| Error::NotFound(format!("No vault for {}", ctx.sender)))?;

        allocator::release_verified(&mut self.namespace, &ctx.sender, &self.vaults)?;
        info!(owner = %ctx.sender, balance = vault.balance, "Closed vault");
        Ok(vault.balance)
    }

    /// Number of open vaults
    pub fn len(&self) -> usize {
        self.vaults.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vaults.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(name: &str, epoch: u64) -> ExecutionContext {
        ExecutionContext::new(AccountId::from_public_key(name.as_bytes()), epoch)
    }

    #[test]
    fn test_open_deposit_withdraw() -> Result<()> {
        let mut ledger = VaultLedger::new(Limits::default());
        let alice = ctx("alice", 1);
        let bob = ctx("bob", 2);

        let address = ledger.open_vault(&alice)?;
        assert_eq!(address, ledger.vault_address(&alice.sender));

        ledger.deposit(&bob, &alice.sender, 50)?;
        assert_eq!(ledger.balance(&alice.sender), Some(50));

        assert_eq!(ledger.withdraw(&alice, 20)?, 30);
        match ledger.withdraw(&alice, 100) {
            Err(Error::InsufficientFunds { requested, available }) => {
                assert_eq!((requested, available), (100, 30));
            }
            other => panic!("expected InsufficientFunds, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_one_vault_per_owner() -> Result<()> {
        let mut ledger = VaultLedger::new(Limits::default());
        let alice = ctx("alice", 1);

        ledger.open_vault(&alice)?;
        assert!(matches!(
            ledger.open_vault(&alice.at_epoch(2)),
            Err(Error::AlreadyClaimed { .. })
        ));
        assert_eq!(ledger.len(), 1);
        Ok(())
    }

    #[test]
    fn test_deposit_before_open_is_swept() -> Result<()> {
        let mut ledger = VaultLedger::new(Limits::default());
        let alice = ctx("alice", 5);
        let bob = ctx("bob", 1);

        ledger.deposit(&bob, &alice.sender, 10)?;
        ledger.deposit(&bob, &alice.sender, 15)?;
        assert_eq!(ledger.balance(&alice.sender), None);
        assert_eq!(ledger.pending_deposits(&alice.sender), 25);

        ledger.open_vault(&alice)?;
        assert_eq!(ledger.balance(&alice.sender), Some(25));
        assert_eq!(ledger.pending_deposits(&alice.sender), 0);
        assert_eq!(ledger.vault(&alice.sender).map(|v| v.created_epoch), Some(5));
        Ok(())
    }

    #[test]
    fn test_withdraw_without_vault() {
        let mut ledger = VaultLedger::new(Limits::default());
        assert!(matches!(
            ledger.withdraw(&ctx("nobody", 1), 1),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_balance_limit() -> Result<()> {
        let limits = Limits {
            max_vault_balance: 100,
            ..Limits::default()
        };
        let mut ledger = VaultLedger::new(limits);
        let alice = ctx("alice", 1);

        ledger.open_vault(&alice)?;
        ledger.deposit(&alice, &alice.sender, 100)?;
        assert!(matches!(
            ledger.deposit(&alice, &alice.sender, 1),
            Err(Error::LimitExceeded(_))
        ));
        assert_eq!(ledger.balance(&alice.sender), Some(100));

        let bob = ctx("bob", 1);
        ledger.deposit(&alice, &bob.sender, 60)?;
        assert!(ledger.deposit(&alice, &bob.sender, 60).is_err());
        assert!(ledger.deposit(&alice, &bob.sender, 0).is_err());
        Ok(())
    }

    #[test]
    fn test_close_and_reopen_same_address() -> Result<()> {
        let mut ledger = VaultLedger::new(Limits::default());
        let alice = ctx("alice", 1);

        let first = ledger.open_vault(&alice)?;
        ledger.deposit(&alice, &alice.sender, 40)?;
        assert_eq!(ledger.close_vault(&alice)?, 40);
        assert!(ledger.is_empty());
        assert!(matches!(ledger.close_vault(&alice), Err(Error::NotFound(_))));

        let second = ledger.open_vault(&alice.at_epoch(9))?;
        assert_eq!(first, second);
        assert_eq!(ledger.balance(&alice.sender), Some(0));
        Ok(())
    }
}
