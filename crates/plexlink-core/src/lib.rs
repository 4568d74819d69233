pub mod account_filter;
pub mod identity_cache;
pub mod normalizer;
pub mod prefetch;
pub mod resolver;

#[cfg(test)]
mod test_support;

pub use account_filter::{AccountFilter, AccountMatch, AccountNameIndex, PRIMARY_ACCOUNT_ID};
pub use identity_cache::{CacheStats, IdentityCache};
pub use normalizer::{
    cap_episodes_per_show, dedupe_by_id, exclude_now_playing, normalize, HistoryRails, DEFAULT_LIMIT_PER_SHOW,
};
pub use prefetch::{PrefetchScheduler, PrefetchSummary, DEFAULT_PREFETCH_LIMIT};
pub use resolver::Resolver;
