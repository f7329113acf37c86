//! Per-user account and messaging registry
//!
//! ```text
//! owners    namespace: AccountId → Account          (one account per sender)
//! usernames namespace: username  → UsernameRecord   (unique usernames)
//! inbox:    Mailbox<Message> at the account address
//! ```

use crate::config::Limits;
use crate::context::ExecutionContext;
use crate::error::{Error, Result};
use crate::payload::{Mailbox, PayloadStore};
use crate::slot::{allocator, derive_address, AccountId, DerivedAddress, Namespace, SlotKey};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub owner: AccountId,
    pub username: String,
    pub display_name: String,
    pub created_epoch: u64,
}

/// Reverse index entry: who holds a username
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsernameRecord {
    pub owner: AccountId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub from: AccountId,
    pub body: String,
    pub epoch: u64,
}

pub struct AccountRegistry {
    owners: Namespace,
    usernames: Namespace,
    accounts: PayloadStore<Account>,
    names: PayloadStore<UsernameRecord>,
    inboxes: Mailbox<Message>,
    limits: Limits,
}

impl AccountRegistry {
    pub fn new(limits: Limits) -> Self {
        Self {
            owners: Namespace::new(),
            usernames: Namespace::new(),
            accounts: PayloadStore::new(),
            names: PayloadStore::new(),
            inboxes: Mailbox::new(),
            limits,
        }
    }

    pub fn account_address(&self, owner: &AccountId) -> DerivedAddress {
        derive_address(&self.owners.id(), &SlotKey::from(owner))
    }

    fn username_address(&self, username: &str) -> DerivedAddress {
        derive_address(&self.usernames.id(), &SlotKey::from(username))
    }

    fn validate_username(&self, username: &str) -> Result<()> {
        if username.is_empty() {
            return Err(Error::InvalidArgument("Username must not be empty".to_string()));
        }
        if username.len() > self.limits.max_username_len {
            return Err(Error::LimitExceeded(format!(
                "Username longer than {} characters",
                self.limits.max_username_len
            )));
        }
        if !username
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(Error::InvalidArgument(format!(
                "Username '{}' must contain only [a-z0-9_]",
                username
            )));
        }
        Ok(())
    }

    fn validate_display_name(&self, display_name: &str) -> Result<()> {
        if display_name.len() > self.limits.max_display_name_len {
            return Err(Error::LimitExceeded(format!(
                "Display name longer than {} bytes",
                self.limits.max_display_name_len
            )));
        }
        Ok(())
    }

    /// Register the sender under `username`
    pub fn register(
        &mut self,
        ctx: &ExecutionContext,
        username: &str,
        display_name: &str,
    ) -> Result<DerivedAddress> {
        self.validate_username(username)?;
        self.validate_display_name(display_name)?;

        // Both checks before either claim, so a refusal changes nothing
        if allocator::exists(&self.owners, &ctx.sender) {
            return Err(Error::AlreadyClaimed {
                namespace: self.owners.id(),
                key: SlotKey::from(&ctx.sender),
            });
        }
        if allocator::exists(&self.usernames, username) {
            return Err(Error::AlreadyClaimed {
                namespace: self.usernames.id(),
                key: SlotKey::from(username),
            });
        }

        let name_capability = allocator::claim(&mut self.usernames, username)?;
        let account_capability = allocator::claim(&mut self.owners, &ctx.sender)?;

        self.names.place(name_capability, UsernameRecord { owner: ctx.sender })?;
        let address = self.accounts.place(
            account_capability,
            Account {
                owner: ctx.sender,
                username: username.to_string(),
                display_name: display_name.to_string(),
                created_epoch: ctx.epoch,
            },
        )?;

        info!(owner = %ctx.sender, username, address = %address, "Registered account");
        Ok(address)
    }

    pub fn account_of(&self, owner: &AccountId) -> Option<&Account> {
        self.accounts.get(&self.account_address(owner))
    }

    /// Account holding `username`
    pub fn lookup(&self, username: &str) -> Option<&Account> {
        let record = self.names.get(&self.username_address(username))?;
        self.account_of(&record.owner)
    }

    fn own_account_address(&self, ctx: &ExecutionContext) -> Result<DerivedAddress> {
        let address = self.account_address(&ctx.sender);
        if self.accounts.contains(&address) {
            Ok(address)
        } else {
            Err(Error::Unauthorized(format!("{} is not registered", ctx.sender)))
        }
    }

    pub fn update_display_name(
        &mut self,
        ctx: &ExecutionContext,
        display_name: &str,
    ) -> Result<()> {
        self.validate_display_name(display_name)?;
        let address = self.own_account_address(ctx)?;
        if let Some(account) = self.accounts.get_mut(&address) {
            account.display_name = display_name.to_string();
        }
        debug!(owner = %ctx.sender, "Updated display name");
        Ok(())
    }

    /// Deliver a message to the inbox of `to_username`
    pub fn send_message(
        &mut self,
        ctx: &ExecutionContext,
        to_username: &str,
        body: &str,
    ) -> Result<()> {
        self.own_account_address(ctx)?;
        if body.len() > self.limits.max_message_bytes {
            return Err(Error::LimitExceeded(format!(
                "Message longer than {} bytes",
                self.limits.max_message_bytes
            )));
        }

        let recipient = self
            .lookup(to_username)
            .map(|account| account.owner)
            .ok_or_else(|| Error::NotFound(format!("No account named '{}'", to_username)))?;
        let inbox = self.account_address(&recipient);

        self.inboxes.deliver(
            inbox,
            Message {
                from: ctx.sender,
                body: body.to_string(),
                epoch: ctx.epoch,
            },
        );
        debug!(from = %ctx.sender, to = to_username, "Sent message");
        Ok(())
    }

    /// Messages waiting for the sender, without draining them
    pub fn peek_messages(&self, ctx: &ExecutionContext) -> Result<&[Message]> {
        let address = self.own_account_address(ctx)?;
        Ok(self.inboxes.pending(&address))
    }

    /// Drain the sender's inbox, oldest first
    pub fn read_messages(&mut self, ctx: &ExecutionContext) -> Result<Vec<Message>> {
        let address = self.own_account_address(ctx)?;
        Ok(self.inboxes.collect(&address))
    }

    /// Remove the sender's account, username and inbox
    pub fn unregister(&mut self, ctx: &ExecutionContext) -> Result<()> {
        let address = self.own_account_address(ctx)?;
        let account = self
            .accounts
            .destroy(&address)
            .ok_or_else(|| Error::NotFound(format!("No account for {}", ctx.sender)))?;
        let name_address = self.username_address(&account.username);
        self.names.destroy(&name_address);
        let dropped = self.inboxes.discard(&address);

        allocator::release_verified(&mut self.owners, &ctx.sender, &self.accounts)?;
        allocator::release_verified(&mut self.usernames, account.username.as_str(), &self.names)?;

        info!(owner = %ctx.sender, username = %account.username, dropped, "Unregistered account");
        Ok(())
    }

    /// Number of registered accounts
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
