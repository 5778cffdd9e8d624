//! Data transfer objects (DTOs) for API responses.
//!
//! These structs are serialized to JSON for frontend consumption.
//! - `github`: GitHubUser, RepoSummary, BranchSummary, CommitSummary, TreeListing, Page
//! - `bookmark`: Bookmark, NewBookmark, BookmarkUpdate, TagCount

pub mod bookmark;
pub mod github;

pub use bookmark::*;
pub use github::*;
