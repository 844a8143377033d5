use super::aggregate;
use crate::domain::contract::{Contract, ContractId};
use crate::domain::job::{Job, JobId};
use crate::domain::ports::{ContractFilter, JobFilter, LedgerStore, LedgerTransaction, UnitOfWork};
use crate::domain::profile::{Profile, ProfileId, Role};
use crate::domain::report::{AggregateQuery, AggregateRows};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options, Transaction, TransactionDB,
    TransactionDBOptions,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;

/// Column Family for storing profiles and their balances.
pub const CF_PROFILES: &str = "profiles";
/// Column Family for storing contracts.
pub const CF_CONTRACTS: &str = "contracts";
/// Column Family for storing jobs.
pub const CF_JOBS: &str = "jobs";

/// A persistent ledger using a RocksDB `TransactionDB`.
///
/// Each entity lives in its own Column Family keyed by big-endian id. Units of
/// work run in pessimistic transactions: rows read for update are locked until
/// commit, and a lock wait longer than the configured timeout surfaces as a
/// transient failure. Units of work run synchronously on the calling task,
/// so the caller's async timeout cannot interrupt a lock wait; the lock
/// timeout is the effective bound.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<TransactionDB>`).
#[derive(Clone)]
pub struct RocksDbLedgerStore {
    db: Arc<TransactionDB>,
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes)
        .map_err(|e| LedgerError::StorageError(format!("Deserialization error: {}", e)))
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

impl RocksDbLedgerStore {
    /// Opens or creates a ledger at `path`, creating missing column families.
    ///
    /// `lock_timeout_ms` bounds how long a transaction waits on a locked row.
    pub fn open<P: AsRef<Path>>(path: P, lock_timeout_ms: u64) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let mut txn_opts = TransactionDBOptions::default();
        txn_opts.set_txn_lock_timeout(lock_timeout_ms as i64);

        let cfs = [CF_PROFILES, CF_CONTRACTS, CF_JOBS]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()));

        let db = TransactionDB::open_cf_descriptors(&opts, &txn_opts, path, cfs)?;

        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            LedgerError::StorageError(format!("{} column family not found", name))
        })
    }

    fn get<T: DeserializeOwned>(&self, cf: &str, id: u32) -> Result<Option<T>> {
        match self.db.get_cf(self.cf(cf)?, id.to_be_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put<T: Serialize>(&self, cf: &str, id: u32, value: &T) -> Result<()> {
        self.db.put_cf(self.cf(cf)?, id.to_be_bytes(), encode(value)?)?;
        Ok(())
    }

    fn scan<T: DeserializeOwned>(&self, cf: &str) -> Result<Vec<T>> {
        let mut values = Vec::new();
        for item in self.db.iterator_cf(self.cf(cf)?, IteratorMode::Start) {
            let (_key, value) = item?;
            values.push(decode(&value)?);
        }
        Ok(values)
    }

    /// One attempt at a unit of work; the transaction never outlives this call.
    fn run_unit(&self, work: &mut UnitOfWork<'_>) -> Result<()> {
        let mut tx = RocksDbTransaction {
            store: self,
            txn: self.db.transaction(),
        };
        match work(&mut tx) {
            Ok(()) => {
                tx.txn.commit()?;
                Ok(())
            }
            Err(e) => {
                tx.txn.rollback()?;
                Err(e)
            }
        }
    }
}

struct RocksDbTransaction<'a> {
    store: &'a RocksDbLedgerStore,
    txn: Transaction<'a, TransactionDB>,
}

impl RocksDbTransaction<'_> {
    fn get<T: DeserializeOwned>(&self, cf: &str, id: u32, lock: bool) -> Result<Option<T>> {
        let cf = self.store.cf(cf)?;
        let bytes = if lock {
            self.txn.get_for_update_cf(cf, id.to_be_bytes(), true)?
        } else {
            self.txn.get_cf(cf, id.to_be_bytes())?
        };
        bytes.map(|b| decode(&b)).transpose()
    }

    fn put<T: Serialize>(&self, cf: &str, id: u32, value: &T) -> Result<()> {
        self.txn
            .put_cf(self.store.cf(cf)?, id.to_be_bytes(), encode(value)?)?;
        Ok(())
    }
}

impl LedgerTransaction for RocksDbTransaction<'_> {
    fn job_for_update(&mut self, id: JobId) -> Result<Option<Job>> {
        self.get(CF_JOBS, id, true)
    }

    fn contract(&mut self, id: ContractId) -> Result<Option<Contract>> {
        self.get(CF_CONTRACTS, id, false)
    }

    fn profile_for_update(&mut self, id: ProfileId) -> Result<Option<Profile>> {
        self.get(CF_PROFILES, id, true)
    }

    fn unpaid_jobs(&mut self, profile: ProfileId, role: Role) -> Result<Vec<Job>> {
        let filter = JobFilter::unpaid_for(profile, role);
        let mut jobs = Vec::new();
        for item in self
            .txn
            .iterator_cf(self.store.cf(CF_JOBS)?, IteratorMode::Start)
        {
            let (_key, value) = item?;
            let job: Job = decode(&value)?;
            if job.paid {
                continue;
            }
            let contract: Option<Contract> = self.get(CF_CONTRACTS, job.contract_id, false)?;
            if contract.is_some_and(|c| filter.matches(&job, &c)) {
                jobs.push(job);
            }
        }
        Ok(jobs)
    }

    fn put_job(&mut self, job: &Job) -> Result<()> {
        self.put(CF_JOBS, job.id, job)
    }

    fn put_profile(&mut self, profile: &Profile) -> Result<()> {
        self.put(CF_PROFILES, profile.id, profile)
    }
}

#[async_trait]
impl LedgerStore for RocksDbLedgerStore {
    async fn execute_in_transaction(&self, work: &mut UnitOfWork<'_>) -> Result<()> {
        self.run_unit(work)
    }

    async fn find_profile(&self, id: ProfileId) -> Result<Option<Profile>> {
        self.get(CF_PROFILES, id)
    }

    async fn find_contract(&self, id: ContractId) -> Result<Option<Contract>> {
        self.get(CF_CONTRACTS, id)
    }

    async fn find_job(&self, id: JobId) -> Result<Option<Job>> {
        self.get(CF_JOBS, id)
    }

    async fn find_jobs(&self, filter: JobFilter) -> Result<Vec<Job>> {
        let mut jobs = Vec::new();
        for job in self.scan::<Job>(CF_JOBS)? {
            let contract: Option<Contract> = self.get(CF_CONTRACTS, job.contract_id)?;
            if contract.is_some_and(|c| filter.matches(&job, &c)) {
                jobs.push(job);
            }
        }
        Ok(jobs)
    }

    async fn find_contracts(&self, filter: ContractFilter) -> Result<Vec<Contract>> {
        Ok(self
            .scan::<Contract>(CF_CONTRACTS)?
            .into_iter()
            .filter(|c| filter.matches(c))
            .collect())
    }

    async fn all_profiles(&self) -> Result<Vec<Profile>> {
        self.scan(CF_PROFILES)
    }

    async fn execute_aggregate(&self, query: AggregateQuery) -> Result<AggregateRows> {
        let snapshot = self.db.snapshot();
        let jobs_cf = self.cf(CF_JOBS)?;
        let contracts_cf = self.cf(CF_CONTRACTS)?;
        let profiles_cf = self.cf(CF_PROFILES)?;

        let jobs = snapshot
            .iterator_cf(jobs_cf, IteratorMode::Start)
            .map(|item| -> Result<Job> {
                let (_key, value) = item?;
                decode::<Job>(&value)
            });

        aggregate::evaluate(
            query,
            jobs,
            |id| {
                snapshot
                    .get_cf(contracts_cf, id.to_be_bytes())?
                    .map(|b| decode(&b))
                    .transpose()
            },
            |id| {
                snapshot
                    .get_cf(profiles_cf, id.to_be_bytes())?
                    .map(|b| decode(&b))
                    .transpose()
            },
        )
    }

    async fn insert_profile(&self, profile: Profile) -> Result<()> {
        self.put(CF_PROFILES, profile.id, &profile)
    }

    async fn insert_contract(&self, contract: Contract) -> Result<()> {
        self.put(CF_CONTRACTS, contract.id, &contract)
    }

    async fn insert_job(&self, job: Job) -> Result<()> {
        self.put(CF_JOBS, job.id, &job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contract::ContractStatus;
    use crate::domain::money::{Amount, Balance};
    use crate::domain::report::DateRange;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    async fn seeded(store: &RocksDbLedgerStore) {
        store
            .insert_profile(Profile {
                id: 1,
                first_name: "Harry".into(),
                last_name: "Potter".into(),
                profession: "Wizard".into(),
                balance: Balance::new(dec!(1150)).unwrap(),
                role: Role::Client,
            })
            .await
            .unwrap();
        store
            .insert_profile(Profile {
                id: 2,
                first_name: "John".into(),
                last_name: "Lenon".into(),
                profession: "Musician".into(),
                balance: Balance::new(dec!(64)).unwrap(),
                role: Role::Contractor,
            })
            .await
            .unwrap();
        store
            .insert_contract(Contract {
                id: 1,
                terms: "bla bla bla".into(),
                status: ContractStatus::InProgress,
                client_id: 1,
                contractor_id: 2,
            })
            .await
            .unwrap();
        store
            .insert_job(Job {
                id: 1,
                description: "work".into(),
                price: Amount::new(dec!(200)).unwrap(),
                paid: false,
                payment_date: None,
                contract_id: 1,
            })
            .await
            .unwrap();
        store
            .insert_job(Job {
                id: 2,
                description: "work".into(),
                price: Amount::new(dec!(121)).unwrap(),
                paid: true,
                payment_date: Some(Utc.with_ymd_and_hms(2020, 8, 15, 19, 11, 26).unwrap()),
                contract_id: 1,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDbLedgerStore::open(dir.path(), 100).expect("Failed to open RocksDB");

        assert!(store.db.cf_handle(CF_PROFILES).is_some());
        assert!(store.db.cf_handle(CF_CONTRACTS).is_some());
        assert!(store.db.cf_handle(CF_JOBS).is_some());
    }

    #[tokio::test]
    async fn test_rocksdb_find_and_filter() {
        let dir = tempdir().unwrap();
        let store = RocksDbLedgerStore::open(dir.path(), 100).unwrap();
        seeded(&store).await;

        assert_eq!(store.find_profile(1).await.unwrap().unwrap().first_name, "Harry");
        assert!(store.find_job(9).await.unwrap().is_none());

        let unpaid = store
            .find_jobs(JobFilter::unpaid_for(1, Role::Client))
            .await
            .unwrap();
        assert_eq!(unpaid.len(), 1);
        assert_eq!(unpaid[0].id, 1);

        let contracts = store
            .find_contracts(ContractFilter {
                party: Some(2),
                exclude_terminated: true,
            })
            .await
            .unwrap();
        assert_eq!(contracts.len(), 1);
    }

    #[tokio::test]
    async fn test_rocksdb_transaction_commit_and_rollback() {
        let dir = tempdir().unwrap();
        let store = RocksDbLedgerStore::open(dir.path(), 100).unwrap();
        seeded(&store).await;

        let failed = store
            .execute_in_transaction(&mut |tx: &mut dyn LedgerTransaction| {
                let mut job = tx.job_for_update(1)?.unwrap();
                job.paid = true;
                job.payment_date = Some(Utc::now());
                tx.put_job(&job)?;
                Err(LedgerError::InvariantViolation("abort".into()))
            })
            .await;
        assert!(failed.is_err());
        assert!(!store.find_job(1).await.unwrap().unwrap().paid);

        store
            .execute_in_transaction(&mut |tx: &mut dyn LedgerTransaction| {
                assert_eq!(tx.unpaid_jobs(1, Role::Client)?.len(), 1);
                let mut job = tx.job_for_update(1)?.unwrap();
                job.paid = true;
                job.payment_date = Some(Utc::now());
                tx.put_job(&job)
            })
            .await
            .unwrap();
        assert!(store.find_job(1).await.unwrap().unwrap().paid);
    }

    #[tokio::test]
    async fn test_rocksdb_aggregate_on_snapshot() {
        let dir = tempdir().unwrap();
        let store = RocksDbLedgerStore::open(dir.path(), 100).unwrap();
        seeded(&store).await;

        let range = DateRange::new(
            Utc.with_ymd_and_hms(2020, 8, 10, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2020, 8, 20, 0, 0, 0).unwrap(),
        )
        .unwrap();
        let rows = store
            .execute_aggregate(AggregateQuery::PaidByProfession { range })
            .await
            .unwrap();
        match rows {
            AggregateRows::Professions(rows) => {
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].profession, "Musician");
                assert_eq!(rows[0].total, dec!(121));
            }
            other => panic!("unexpected rows: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rocksdb_persistence_across_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = RocksDbLedgerStore::open(dir.path(), 100).unwrap();
            seeded(&store).await;
        }
        let store = RocksDbLedgerStore::open(dir.path(), 100).unwrap();
        assert_eq!(store.all_profiles().await.unwrap().len(), 2);
    }
}
