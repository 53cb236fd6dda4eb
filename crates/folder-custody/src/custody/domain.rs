use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

row_id!(
    /// Primary key of an `employees` row.
    EmployeeId
);
row_id!(CabinetId);
row_id!(DrawerId);
row_id!(FolderId);
row_id!(EnvelopeId);
row_id!(RequestId);
row_id!(WithdrawalId);
row_id!(AlertId);
row_id!(AuditEntryId);
row_id!(
    /// Operator account identifier. Accounts live outside the custody store.
    UserId
);

/// The four document groups every folder carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EnvelopeCategory {
    Personal,
    Security,
    Medicine,
    Training,
}

impl EnvelopeCategory {
    pub const ALL: [EnvelopeCategory; 4] = [
        EnvelopeCategory::Personal,
        EnvelopeCategory::Security,
        EnvelopeCategory::Medicine,
        EnvelopeCategory::Training,
    ];

    const fn bit(self) -> u8 {
        match self {
            EnvelopeCategory::Personal => 0b0001,
            EnvelopeCategory::Security => 0b0010,
            EnvelopeCategory::Medicine => 0b0100,
            EnvelopeCategory::Training => 0b1000,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            EnvelopeCategory::Personal => "Personal",
            EnvelopeCategory::Security => "Security",
            EnvelopeCategory::Medicine => "Medicine",
            EnvelopeCategory::Training => "Training",
        }
    }
}

impl fmt::Display for EnvelopeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Subset of [`EnvelopeCategory`] stored as a bitmask.
///
/// Requests and withdrawals carry one of these instead of a free-form list, so duplicates and
/// unknown categories cannot be represented. Serializes as a list of category names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "Vec<EnvelopeCategory>", from = "Vec<EnvelopeCategory>")]
pub struct CategorySet(u8);

impl CategorySet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn all() -> Self {
        Self(0b1111)
    }

    pub fn insert(&mut self, category: EnvelopeCategory) {
        self.0 |= category.bit();
    }

    pub fn remove(&mut self, category: EnvelopeCategory) {
        self.0 &= !category.bit();
    }

    pub const fn contains(self, category: EnvelopeCategory) -> bool {
        self.0 & category.bit() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub const fn union(self, other: CategorySet) -> CategorySet {
        CategorySet(self.0 | other.0)
    }

    pub const fn intersection(self, other: CategorySet) -> CategorySet {
        CategorySet(self.0 & other.0)
    }

    /// Categories in canonical order (Personal, Security, Medicine, Training).
    pub fn iter(self) -> impl Iterator<Item = EnvelopeCategory> {
        EnvelopeCategory::ALL
            .into_iter()
            .filter(move |category| self.contains(*category))
    }
}

impl FromIterator<EnvelopeCategory> for CategorySet {
    fn from_iter<I: IntoIterator<Item = EnvelopeCategory>>(iter: I) -> Self {
        let mut set = CategorySet::empty();
        for category in iter {
            set.insert(category);
        }
        set
    }
}

impl From<Vec<EnvelopeCategory>> for CategorySet {
    fn from(value: Vec<EnvelopeCategory>) -> Self {
        value.into_iter().collect()
    }
}

impl From<CategorySet> for Vec<EnvelopeCategory> {
    fn from(value: CategorySet) -> Self {
        value.iter().collect()
    }
}

impl fmt::Display for CategorySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = self.iter().map(EnvelopeCategory::label).collect();
        write!(f, "[{}]", labels.join(", "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmployeeStatus {
    Active,
    Dismissed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub badge_id: Option<String>,
    pub department: String,
    pub hire_date: NaiveDate,
    pub dismissal_date: Option<NaiveDate>,
    pub status: EmployeeStatus,
}

impl Employee {
    pub fn is_dismissed(&self) -> bool {
        self.status == EmployeeStatus::Dismissed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cabinet {
    pub id: CabinetId,
    pub name: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drawer {
    pub id: DrawerId,
    pub cabinet_id: CabinetId,
    pub number: String,
    pub capacity: u32,
    pub occupancy: u32,
}

impl Drawer {
    pub fn is_full(&self) -> bool {
        self.occupancy >= self.capacity
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: FolderId,
    pub drawer_id: DrawerId,
    pub employee_id: EmployeeId,
    pub label: String,
    pub created_at: NaiveDate,
    pub order: u32,
    pub active: bool,
    pub archived: bool,
}

impl Folder {
    /// Active and not archived, i.e. the folder occupies a drawer slot.
    pub fn occupies_slot(&self) -> bool {
        self.active && !self.archived
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnvelopeStatus {
    Present,
    Withdrawn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub id: EnvelopeId,
    pub folder_id: FolderId,
    pub category: EnvelopeCategory,
    pub status: EnvelopeStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub const fn label(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    pub id: RequestId,
    pub employee_id: EmployeeId,
    pub user_id: UserId,
    pub folder_id: Option<FolderId>,
    pub reason: String,
    pub status: RequestStatus,
    pub requested_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub categories: CategorySet,
    pub is_dismissal: bool,
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WithdrawalStatus {
    Active,
    Overdue,
    Returned,
}

impl WithdrawalStatus {
    /// Active or Overdue: the envelopes are still out.
    pub const fn is_outstanding(self) -> bool {
        matches!(self, WithdrawalStatus::Active | WithdrawalStatus::Overdue)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub id: WithdrawalId,
    pub folder_id: FolderId,
    pub user_id: UserId,
    pub employee_id: EmployeeId,
    pub categories: CategorySet,
    pub started_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub status: WithdrawalStatus,
    pub elapsed_days: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Approaching,
    Expired,
}

impl AlertKind {
    pub const fn severity(self) -> Severity {
        match self {
            AlertKind::Approaching => Severity::Warning,
            AlertKind::Expired => Severity::Critical,
        }
    }
}

/// Ordered so that `Critical` sorts above `Warning`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub withdrawal_id: WithdrawalId,
    pub kind: AlertKind,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
    pub resolved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditEntryId,
    pub user_id: Option<UserId>,
    pub action: String,
    pub table: String,
    pub record_id: Option<u64>,
    pub details: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Identity and demographic fields supplied when a folder is registered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeIdentity {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub badge_id: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub hire_date: Option<NaiveDate>,
}
