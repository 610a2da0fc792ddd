//! Heuristic classifiers turning free text into enumerated listing fields.
//!
//! Every classifier is an ordered [`KeywordTable`]: rules are evaluated
//! top-to-bottom on lower-cased text and the first rule with a matching
//! term wins. No classifier can fail; text without a signal maps to the
//! enum's `Unknown` member.

pub mod engagement;
pub mod geo;
pub mod remote;
pub mod seniority;
pub mod table;

pub use engagement::{EngagementType, classify_engagement, classify_engagement_or};
pub use geo::{GeoRestriction, classify_geo, classify_geo_or};
pub use remote::{RemotePolicy, classify_remote, classify_remote_or};
pub use seniority::{SeniorityLevel, classify_seniority, classify_seniority_or};
pub use table::{KeywordTable, contains_term};
