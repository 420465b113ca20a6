//! pr-steward: a command-driven pull request bot.
//!
//! The bot reads slash commands from pull request and commit comments,
//! keeps requirement labels and the PR body checklist in step with the
//! issue tracker, applies path-based labels, and creates backports.
//!
//! Every pass is a pure computation over observed state whose side effects
//! are data ([`effects`]) run by interpreters: GitHub ([`github`]), Jira
//! ([`tracker`]) and local git ([`git`]).

pub mod auth;
pub mod backport;
pub mod census;
pub mod commands;
pub mod config;
pub mod desired;
pub mod effects;
pub mod git;
pub mod github;
pub mod handlers;
pub mod labeler;
pub mod markers;
pub mod reconcile;
pub mod records;
pub mod requirement;
pub mod server;
pub mod tracker;
pub mod types;
pub mod worker;

#[cfg(test)]
mod test_utils;
