pub mod ats;
pub mod classify;
pub mod compliance;
pub mod config;
pub mod dates;
pub mod dedup;
pub mod error;
pub mod harvest;
pub mod id;
pub mod models;
pub mod page;
pub mod report;
pub mod run;
pub mod salary;
pub mod selector;
pub mod skills;
pub mod traits;
pub mod util;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use ats::{AtsInfo, AtsType, detect_ats};
pub use compliance::{AllowAll, ComplianceGate, GateConfig, PathDenyList};
pub use config::HarvestSettings;
pub use dedup::{DedupPolicy, ListingSet};
pub use error::AppError;
pub use harvest::{
    CancelMode, FieldSelectors, HarvestReport, NativeIdRule, Pagination, SourceConfig,
    SourceDefaults, SourceHarvester, StopReason,
};
pub use id::IdGenerator;
pub use models::{
    CanonicalListing, CompanyJobsResult, HarvestQuery, ListingBuilder, ListingKind, compute_hash,
};
pub use page::{BodyOutcome, PageFetcher, PageOutcome, SoftFailure};
pub use report::{HarvestEvent, HarvestReporter, NullReporter, TracingHarvestReporter};
pub use run::{SourceRun, harvest_all};
pub use salary::{SalaryInfo, SalaryParser, parse_salary};
pub use selector::SelectorCascade;
pub use traits::{CompliancePolicy, Fetcher, Harvester, PolicyDecision};
