#[macro_use]
mod macros;
mod builder;
mod cache;
mod client;
mod constants;
mod errors;
mod eval;
mod fetch;
mod hooks;
mod model;
mod modes;
mod user;
mod utils;
mod value;

pub use builder::{ClientBuilder, Options};
pub use cache::ConfigCache;
pub use client::Client;
pub use constants::PKG_VERSION;
pub use errors::{ClientError, ErrorKind};
pub use eval::details::EvaluationDetails;
pub use fetch::service::ClientCacheState;
pub use hooks::Hooks;
pub use model::config::{
    Condition, DependentFlagCondition, PercentageOption, Segment, SegmentCondition, ServedValue,
    Setting, SettingValue, TargetingRule, UserCondition,
};
pub use model::enums::{
    DataGovernance, DependentFlagComparator, SegmentComparator, SettingType, UserComparator,
};
pub use modes::PollingMode;
pub use user::{User, UserValue};
pub use value::{Value, ValuePrimitive};
