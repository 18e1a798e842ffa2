//! Cached snapshots of the showcase data pulled from the code-hosting platform
//!
//! The site's pages never talk to the upstream directly. They read from a [`CacheStore`],
//! which owns one [`CacheEntry`] per resource:
//!
//! - **Projects**: the owner's repositories, normalized into [`RepositoryRecord`]s and
//!   split into popular, new and end-of-life sections.
//! - **Releases**: the latest published version of each tracked repository.
//! - **Team**: the creator and the contributors of the team repositories, with their bios.
//!
//! # Implementation Model
//!
//! Each entry keeps the last snapshot its source produced successfully together with the
//! time it was fetched. A read within the TTL is answered from memory. Otherwise the entry
//! refreshes itself, and every concurrent reader joins that single refresh rather than
//! starting its own. When a refresh fails the previous snapshot (or the source's empty
//! default) is served instead, so callers never observe upstream errors.
//!
//! The [`upstream`] client talks to the REST API first and falls back to scraping the
//! public HTML pages. Per-item lookups in a batch (preview images, bios, releases) run
//! concurrently and each resolves to a [`LookupOutcome`], so one failing item only
//! degrades that item.

pub mod cache_entry;
pub mod categorize;
mod lookup_outcome;
pub mod normalize;
mod projects;
mod releases;
mod repo_key;
mod store;
mod team;
pub mod throttler;
pub mod upstream;

pub use cache_entry::{CacheEntry, EntryState, SnapshotSource};
pub use categorize::{RepoCategories, Thresholds};
pub use lookup_outcome::LookupOutcome;
pub use normalize::{RepositoryRecord, Role, TeamMember};
pub use projects::{CatalogOrigin, ProjectCatalog, ProjectsSource};
pub use releases::{ReleaseSource, ReleaseTable, ReleaseTracker};
pub use repo_key::RepoKey;
pub use store::{CacheStore, DEFAULT_CONTRIBUTORS_PATH, ResourcePolicy, StoreSettings};
pub use team::{TeamRoster, TeamSource};
