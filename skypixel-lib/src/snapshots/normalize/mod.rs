//! Conversion of upstream payloads into the records the pages render.
//!
//! Every record has one canonical shape regardless of where it came from: the REST API
//! JSON and the scraped HTML pages both end up as [`RepositoryRecord`] and [`TeamMember`].

mod release;
mod repository;
pub mod scrape;
mod team;

pub use release::ApiRelease;
pub use repository::{ApiRepository, NO_DESCRIPTION, RepositoryRecord, UNKNOWN_LANGUAGE, normalize_repositories, resolve_image_url};
pub use team::{ProfileDetails, Role, TeamMember};
