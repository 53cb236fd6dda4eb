use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use super::domain::{
    Alert, AlertId, AuditEntry, AuditEntryId, Cabinet, CabinetId, Drawer, DrawerId, Employee,
    EmployeeId, Envelope, EnvelopeCategory, EnvelopeId, Folder, FolderId, RequestId, Withdrawal,
    WithdrawalId, WithdrawalRequest,
};
use super::error::CustodyError;

/// Keyed rows with a monotonically increasing primary key, mirroring an autoincrement table.
#[derive(Debug, Clone)]
pub struct Table<K, R> {
    rows: BTreeMap<K, R>,
    next_id: u64,
}

impl<K, R> Default for Table<K, R> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<K, R> Table<K, R>
where
    K: Copy + Ord + From<u64>,
{
    /// Allocate the next key and store the row built from it.
    pub fn insert_with(&mut self, build: impl FnOnce(K) -> R) -> K {
        let id = K::from(self.next_id);
        self.next_id += 1;
        self.rows.insert(id, build(id));
        id
    }

    pub fn get(&self, id: K) -> Option<&R> {
        self.rows.get(&id)
    }

    pub fn get_mut(&mut self, id: K) -> Option<&mut R> {
        self.rows.get_mut(&id)
    }

    pub fn values(&self) -> impl Iterator<Item = &R> {
        self.rows.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut R> {
        self.rows.values_mut()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Every table of the custody schema.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub employees: Table<EmployeeId, Employee>,
    pub cabinets: Table<CabinetId, Cabinet>,
    pub drawers: Table<DrawerId, Drawer>,
    pub folders: Table<FolderId, Folder>,
    pub envelopes: Table<EnvelopeId, Envelope>,
    pub requests: Table<RequestId, WithdrawalRequest>,
    pub withdrawals: Table<WithdrawalId, Withdrawal>,
    pub alerts: Table<AlertId, Alert>,
    pub audit_log: Table<AuditEntryId, AuditEntry>,
}

impl Tables {
    pub fn employee(&self, id: EmployeeId) -> Result<&Employee, CustodyError> {
        self.employees
            .get(id)
            .ok_or(CustodyError::not_found("employee", id.0))
    }

    pub fn employee_mut(&mut self, id: EmployeeId) -> Result<&mut Employee, CustodyError> {
        self.employees
            .get_mut(id)
            .ok_or(CustodyError::not_found("employee", id.0))
    }

    pub fn cabinet(&self, id: CabinetId) -> Result<&Cabinet, CustodyError> {
        self.cabinets
            .get(id)
            .ok_or(CustodyError::not_found("cabinet", id.0))
    }

    pub fn drawer(&self, id: DrawerId) -> Result<&Drawer, CustodyError> {
        self.drawers
            .get(id)
            .ok_or(CustodyError::not_found("drawer", id.0))
    }

    pub fn drawer_mut(&mut self, id: DrawerId) -> Result<&mut Drawer, CustodyError> {
        self.drawers
            .get_mut(id)
            .ok_or(CustodyError::not_found("drawer", id.0))
    }

    pub fn folder(&self, id: FolderId) -> Result<&Folder, CustodyError> {
        self.folders
            .get(id)
            .ok_or(CustodyError::not_found("folder", id.0))
    }

    pub fn folder_mut(&mut self, id: FolderId) -> Result<&mut Folder, CustodyError> {
        self.folders
            .get_mut(id)
            .ok_or(CustodyError::not_found("folder", id.0))
    }

    pub fn request(&self, id: RequestId) -> Result<&WithdrawalRequest, CustodyError> {
        self.requests
            .get(id)
            .ok_or(CustodyError::not_found("request", id.0))
    }

    pub fn request_mut(&mut self, id: RequestId) -> Result<&mut WithdrawalRequest, CustodyError> {
        self.requests
            .get_mut(id)
            .ok_or(CustodyError::not_found("request", id.0))
    }

    pub fn withdrawal(&self, id: WithdrawalId) -> Result<&Withdrawal, CustodyError> {
        self.withdrawals
            .get(id)
            .ok_or(CustodyError::not_found("withdrawal", id.0))
    }

    pub fn withdrawal_mut(&mut self, id: WithdrawalId) -> Result<&mut Withdrawal, CustodyError> {
        self.withdrawals
            .get_mut(id)
            .ok_or(CustodyError::not_found("withdrawal", id.0))
    }

    pub fn envelopes_of(&self, folder_id: FolderId) -> impl Iterator<Item = &Envelope> {
        self.envelopes
            .values()
            .filter(move |envelope| envelope.folder_id == folder_id)
    }

    pub fn envelope(&self, folder_id: FolderId, category: EnvelopeCategory) -> Option<&Envelope> {
        self.envelopes_of(folder_id)
            .find(|envelope| envelope.category == category)
    }

    pub fn envelope_mut(
        &mut self,
        folder_id: FolderId,
        category: EnvelopeCategory,
    ) -> Option<&mut Envelope> {
        self.envelopes
            .values_mut()
            .find(|envelope| envelope.folder_id == folder_id && envelope.category == category)
    }
}

/// Storage failures that are not business-rule violations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Transactional access to the custody tables.
///
/// `work` sees a consistent view of every table. When it returns `Ok` all of its writes become
/// visible together; when it returns `Err` none of them do.
pub trait CustodyStore: Send + Sync {
    fn transaction<T, F>(&self, work: F) -> Result<T, CustodyError>
    where
        F: FnOnce(&mut Tables) -> Result<T, CustodyError>;

    /// Read-only access to committed state.
    fn read<T, F>(&self, view: F) -> Result<T, CustodyError>
    where
        F: FnOnce(&Tables) -> Result<T, CustodyError>,
    {
        self.transaction(|tables| view(tables))
    }
}

/// Single-writer embedded store. Transactions run serially against a working copy that replaces
/// the committed tables only on success.
///
/// A transaction that panics never touches the committed tables, so a poisoned lock is recovered
/// and the store stays usable.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tables(tables: Tables) -> Self {
        Self {
            tables: Mutex::new(tables),
        }
    }
}

impl CustodyStore for InMemoryStore {
    fn transaction<T, F>(&self, work: F) -> Result<T, CustodyError>
    where
        F: FnOnce(&mut Tables) -> Result<T, CustodyError>,
    {
        let mut committed = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        let mut working = committed.clone();
        let value = work(&mut working)?;
        *committed = working;
        Ok(value)
    }

    fn read<T, F>(&self, view: F) -> Result<T, CustodyError>
    where
        F: FnOnce(&Tables) -> Result<T, CustodyError>,
    {
        let committed = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        view(&committed)
    }
}
