//! Typed record access over one invocation's transaction.
//!
//! [`LedgerAccessor`] is the only place that builds composite keys or
//! encodes records, so readers and writers of a record kind can never
//! disagree on its key format.

use beatchain_storage::{CompositeKey, Transaction};
use bytes::Bytes;
use rust_decimal::Decimal;

use crate::{
    error::{EngineError, Result},
    records::{AppDevRecord, BankAccount, Contract, CreatorRecord, CustomerRecord, Product, Record},
    types::{AccountId, AppDevId, CreatorId, CustomerId, ProductId, format_cents},
};

/// Typed get/put helpers for every record kind.
///
/// Reads join the transaction's read-set and writes are buffered until
/// [`commit`](Self::commit). Dropping the accessor discards every buffered
/// write.
pub struct LedgerAccessor {
    txn: Box<dyn Transaction>,
}

impl LedgerAccessor {
    /// Wraps an open transaction.
    pub fn new(txn: Box<dyn Transaction>) -> Self {
        Self { txn }
    }

    /// Commits every buffered write atomically.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Storage`] if the commit is rejected, including
    /// an optimistic-concurrency conflict.
    pub async fn commit(self) -> Result<()> {
        self.txn.commit().await.map_err(EngineError::from)
    }

    pub(crate) async fn get_raw(&mut self, key: &CompositeKey) -> Result<Option<Bytes>> {
        Ok(self.txn.get(&key.encode()).await?)
    }

    pub(crate) fn set_raw(&mut self, key: &CompositeKey, value: Vec<u8>) {
        tracing::debug!(key = %key, "raw value written");
        self.txn.set(key.encode(), value);
    }

    async fn load<R: Record>(&mut self, key: &CompositeKey) -> Result<Option<R>> {
        match self.txn.get(&key.encode()).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn fetch<R: Record>(&mut self, key: &CompositeKey, id: impl ToString) -> Result<R> {
        self.load(key).await?.ok_or_else(|| EngineError::not_found(R::KIND, id))
    }

    fn store<R: Record>(&mut self, record: &R) -> Result<()> {
        let key = record.key();
        let value = serde_json::to_vec(record)?;
        tracing::debug!(key = %key, "record written");
        self.txn.set(key.encode(), value);
        Ok(())
    }

    async fn scan<R: Record>(&mut self, prefix: &CompositeKey) -> Result<Vec<R>> {
        let (start, end) = prefix.prefix_range();
        let entries = self.txn.get_range(start, end).await?;
        entries
            .iter()
            .map(|kv| serde_json::from_slice(&kv.value).map_err(EngineError::from))
            .collect()
    }

    /// Reads a bank account.
    pub async fn get_bank_account(&mut self, id: AccountId) -> Result<BankAccount> {
        self.fetch(&BankAccount::key_for(id), id).await
    }

    /// Writes a bank account.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvariantViolation`] if the balance is negative;
    /// nothing is written in that case.
    pub fn put_bank_account(&mut self, account: &BankAccount) -> Result<()> {
        if account.balance < Decimal::ZERO {
            return Err(EngineError::invariant(format!(
                "bank account {} balance ${} would be negative",
                account.id,
                format_cents(account.balance)
            )));
        }
        self.store(account)
    }

    /// Reads a customer record.
    pub async fn get_customer(&mut self, id: CustomerId) -> Result<CustomerRecord> {
        self.fetch(&CustomerRecord::key_for(id), id).await
    }

    /// Writes a customer record.
    pub fn put_customer(&mut self, customer: &CustomerRecord) -> Result<()> {
        self.store(customer)
    }

    /// Reads an app-dev record.
    pub async fn get_app_dev(&mut self, id: AppDevId) -> Result<AppDevRecord> {
        self.fetch(&AppDevRecord::key_for(id), id).await
    }

    /// Writes an app-dev record.
    pub fn put_app_dev(&mut self, app_dev: &AppDevRecord) -> Result<()> {
        self.store(app_dev)
    }

    /// Reads a creator record.
    pub async fn get_creator(&mut self, id: CreatorId) -> Result<CreatorRecord> {
        self.fetch(&CreatorRecord::key_for(id), id).await
    }

    /// Writes a creator record.
    pub fn put_creator(&mut self, creator: &CreatorRecord) -> Result<()> {
        self.store(creator)
    }

    /// Reads a product.
    pub async fn get_product(&mut self, id: ProductId) -> Result<Product> {
        self.fetch(&Product::key_for(id), id).await
    }

    /// Writes a product.
    pub fn put_product(&mut self, product: &Product) -> Result<()> {
        self.store(product)
    }

    /// Reads the contract for a `(creator, app-dev, product)` triple.
    pub async fn get_contract(
        &mut self,
        creator: CreatorId,
        app_dev: AppDevId,
        product: ProductId,
    ) -> Result<Contract> {
        let key = Contract::key_for(creator, app_dev, product);
        let id = key.components().join("~");
        self.fetch(&key, id).await
    }

    /// Writes a contract.
    pub fn put_contract(&mut self, contract: &Contract) -> Result<()> {
        self.store(contract)
    }

    /// Returns `true` if a contract exists for the triple.
    pub async fn contract_exists(
        &mut self,
        creator: CreatorId,
        app_dev: AppDevId,
        product: ProductId,
    ) -> Result<bool> {
        let key = Contract::key_for(creator, app_dev, product);
        Ok(self.get_raw(&key).await?.is_some())
    }

    /// Every contract of one creator, ordered by `(app-dev, product)` key.
    pub async fn scan_contracts_for_creator(
        &mut self,
        creator: CreatorId,
    ) -> Result<Vec<Contract>> {
        self.scan(&Contract::creator_prefix(creator)).await
    }

    /// Every bank account, ordered by id.
    pub async fn scan_bank_accounts(&mut self) -> Result<Vec<BankAccount>> {
        self.scan(&CompositeKey::new(BankAccount::KIND)).await
    }
}

impl std::fmt::Debug for LedgerAccessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerAccessor").finish_non_exhaustive()
    }
}
