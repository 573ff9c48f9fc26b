//! Rankdash Filters - Query Parameters ⇄ Filter State
//!
//! Translates a request's query string into typed request arguments, expands
//! those into the semantic filter dict consumed by data producers, and maps
//! arguments back into a canonical URL.
//!
//! ```text
//! uri ─► params::decode ─► FilterSet::request_args ─► FilterSet::filter_dict
//!                                   │
//!                                   └─► QueryRewriter::rewrite ─► canonical URL
//! ```

pub mod codec;
pub mod filter;
pub mod filter_set;
pub mod hooks;
pub mod params;
pub mod rewrite;

pub use codec::{quote, quote_plus, unquote, unquote_plus};
pub use filter::{
    Filter, FilterOutput, GroupedSetBuilder, GroupedSetFilter, ParseOptions, ParsedArgs,
    PartitionFilter, PartitionItem, TextFilter, ALL,
};
pub use filter_set::FilterSet;
pub use hooks::{
    FilterContext, GroupExpander, GroupTitle, HookRegistry, ItemGroup, LabelProvider, Preverifier,
    RewriteHook,
};
pub use params::{decode, set_values, split_items};
pub use rewrite::{QueryRewriter, RewriteOptions};
