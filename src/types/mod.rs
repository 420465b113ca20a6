//! Core domain types for the pull request steward.
//!
//! Identifiers, pull request snapshots and issue-tracker records shared by
//! every other module.

pub mod ids;
pub mod issue;
pub mod pr;

pub use ids::{CommentId, DeliveryId, InvalidRepoId, InvalidSha, IssueId, PrNumber, RepoId, Sha};
pub use issue::{Issue, IssueLink, IssueState, LinkRelation};
pub use pr::{Comment, PrState, PullRequest, Review, ReviewVerdict, approvers, latest_reviews};
