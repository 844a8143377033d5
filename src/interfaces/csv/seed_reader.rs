use crate::domain::contract::Contract;
use crate::domain::job::Job;
use crate::domain::money::Amount;
use crate::domain::profile::Profile;
use crate::error::{LedgerError, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::warn;

pub const PROFILES_FILE: &str = "profiles.csv";
pub const CONTRACTS_FILE: &str = "contracts.csv";
pub const JOBS_FILE: &str = "jobs.csv";

/// Reads ledger records from a CSV source.
///
/// Wraps `csv::Reader`, trimming whitespace and tolerating ragged rows. Rows
/// are deserialized lazily, one `Result` each.
pub struct RecordReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> RecordReader<R> {
    /// Creates a new `RecordReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn records<T: DeserializeOwned>(self) -> impl Iterator<Item = Result<T>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(LedgerError::from))
    }

    /// Jobs, with the `paid` column allowed to be empty.
    pub fn jobs(self) -> impl Iterator<Item = Result<Job>> {
        self.records::<JobRow>()
            .map(|row| row.and_then(Job::try_from))
    }
}

#[derive(Debug, Deserialize)]
struct JobRow {
    id: u32,
    description: String,
    price: Amount,
    paid: Option<bool>,
    payment_date: Option<DateTime<Utc>>,
    contract_id: u32,
}

impl TryFrom<JobRow> for Job {
    type Error = LedgerError;

    fn try_from(row: JobRow) -> Result<Self> {
        let job = Job {
            id: row.id,
            description: row.description,
            price: row.price,
            paid: row.paid.unwrap_or(false),
            payment_date: row.payment_date,
            contract_id: row.contract_id,
        };
        job.check_consistency()?;
        Ok(job)
    }
}

/// Profiles, contracts and jobs to load into a store.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Dataset {
    pub profiles: Vec<Profile>,
    pub contracts: Vec<Contract>,
    pub jobs: Vec<Job>,
}

fn keep_valid<T>(file: &str, rows: impl Iterator<Item = Result<T>>) -> Vec<T> {
    rows.enumerate()
        .filter_map(|(i, row)| match row {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(file, row = i + 1, error = %e, "skipping malformed row");
                None
            }
        })
        .collect()
}

impl Dataset {
    /// Reads `profiles.csv`, `contracts.csv` and `jobs.csv` from `dir`.
    ///
    /// Malformed rows are logged and skipped; a missing file is an error.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let open = |name: &str| File::open(dir.as_ref().join(name)).map(RecordReader::new);

        Ok(Self {
            profiles: keep_valid(PROFILES_FILE, open(PROFILES_FILE)?.records()),
            contracts: keep_valid(CONTRACTS_FILE, open(CONTRACTS_FILE)?.records()),
            jobs: keep_valid(JOBS_FILE, open(JOBS_FILE)?.jobs()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contract::ContractStatus;
    use crate::domain::profile::Role;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reader_profiles() {
        let data = "id, first_name, last_name, profession, balance, role\n\
                    1, Harry, Potter, Wizard, 1150, client\n\
                    2, John, Lenon, Musician, 64.5, contractor";
        let rows: Vec<Result<Profile>> = RecordReader::new(data.as_bytes()).records().collect();

        assert_eq!(rows.len(), 2);
        let harry = rows[0].as_ref().unwrap();
        assert_eq!(harry.full_name(), "Harry Potter");
        assert_eq!(harry.balance.value(), dec!(1150));
        assert_eq!(rows[1].as_ref().unwrap().role, Role::Contractor);
    }

    #[test]
    fn test_reader_contracts() {
        let data = "id, terms, status, client_id, contractor_id\n1, bla bla, in_progress, 1, 5";
        let rows: Vec<Result<Contract>> = RecordReader::new(data.as_bytes()).records().collect();
        let contract = rows[0].as_ref().unwrap();
        assert_eq!(contract.status, ContractStatus::InProgress);
        assert_eq!(contract.contractor_id, 5);
    }

    #[test]
    fn test_reader_jobs_with_empty_paid() {
        let data = "id, description, price, paid, payment_date, contract_id\n\
                    1, work, 200, , , 1\n\
                    2, work, 121, true, 2020-08-15T19:11:26Z, 7";
        let rows: Vec<Result<Job>> = RecordReader::new(data.as_bytes()).jobs().collect();

        let unpaid = rows[0].as_ref().unwrap();
        assert!(!unpaid.paid);
        assert!(unpaid.payment_date.is_none());

        let paid = rows[1].as_ref().unwrap();
        assert!(paid.paid);
        assert_eq!(paid.price.value(), dec!(121));
        assert!(paid.payment_date.is_some());
    }

    #[test]
    fn test_reader_rejects_bad_rows() {
        let data = "id, description, price, paid, payment_date, contract_id\n\
                    1, work, -5, , , 1\n\
                    2, work, 10, true, , 1\n\
                    3, work, abc, , , 1";
        let rows: Vec<Result<Job>> = RecordReader::new(data.as_bytes()).jobs().collect();

        assert!(rows[0].is_err());
        assert!(matches!(rows[1], Err(LedgerError::InvariantViolation(_))));
        assert!(rows[2].is_err());
    }

    #[test]
    fn test_dataset_from_dir_skips_malformed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(PROFILES_FILE),
            "id,first_name,last_name,profession,balance,role\n1,A,B,C,10,client\nx,A,B,C,10,client\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join(CONTRACTS_FILE),
            "id,terms,status,client_id,contractor_id\n1,t,new,1,2\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join(JOBS_FILE),
            "id,description,price,paid,payment_date,contract_id\n",
        )
        .unwrap();

        let dataset = Dataset::from_dir(dir.path()).unwrap();
        assert_eq!(dataset.profiles.len(), 1);
        assert_eq!(dataset.contracts.len(), 1);
        assert!(dataset.jobs.is_empty());
    }

    #[test]
    fn test_dataset_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Dataset::from_dir(dir.path()),
            Err(LedgerError::IoError(_))
        ));
    }
}
