//! The pull request pass.
//!
//! Order within a pass:
//!
//! 1. read the pull request, its comments, reviews, census and issues
//! 2. run pending commands
//! 3. for open pull requests: labeler, requirements, gates, body
//! 4. for integrated pull requests: automatic backports
//! 5. record issue dependencies, then apply the difference

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use super::{ReconcileError, Steward, apply_effects};
use crate::backport;
use crate::census::CensusSnapshot;
use crate::commands::{Sanction, pending_pr_commands};
use crate::desired::{BodySections, ChecklistItem, DesiredState, ReviewerEntry, body};
use crate::effects::calls;
use crate::effects::{ForgeInterpreter, TrackerInterpreter, VcsInterpreter};
use crate::handlers::{self, PrContext, bot_bodies, contributor, reviewer};
use crate::labeler::plan_labels;
use crate::markers::{self, JepMarker};
use crate::requirement::approval::{self, APPROVAL_GATE_LABEL};
use crate::requirement::csr::{self, CSR_LABEL};
use crate::requirement::jep::{self, JEP_LABEL};
use crate::requirement::{
    LinkedIssue, Requirement, RequirementKind, RequirementState, any_blocking,
};
use crate::types::{
    Issue, IssueId, PrNumber, PullRequest, RepoId, Review, ReviewVerdict, Sha, approvers,
    latest_reviews,
};

/// Present while a pull request may be integrated.
pub const READY_LABEL: &str = "ready";

const REVIEW_ITEM: &str = "Change must be properly reviewed";

/// What one pull request pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassSummary {
    pub commands: usize,
    pub effects: usize,
}

impl<F, T, V> Steward<F, T, V>
where
    F: ForgeInterpreter,
    T: TrackerInterpreter,
    V: VcsInterpreter,
{
    /// Runs one pass over pull request `number`.
    #[instrument(skip(self, cancel), fields(pr = %number))]
    pub async fn reconcile_pr(
        &self,
        number: PrNumber,
        cancel: &CancellationToken,
    ) -> Result<PassSummary, ReconcileError> {
        let config = &*self.config;
        let pr = calls::get_pr(&self.forge, number).await?;
        let comments = calls::list_comments(&self.forge, number).await?;
        let reviews = calls::list_reviews(&self.forge, number).await?;
        let census = self.census_snapshot().await?;

        let main_issue = self.main_issue(&pr).await?;
        let csr_issue = match (&main_issue, config.enable_csr) {
            (Some(main), true) => {
                let version = config.fix_version(&pr.target_ref);
                csr::find_csr(&self.tracker, main, version).await?
            }
            _ => None,
        };

        let ctx = PrContext {
            config,
            pr: &pr,
            comments: &comments,
            reviews: &reviews,
            census: &census,
            main_issue: main_issue.as_ref(),
            csr: csr_issue.as_ref(),
        };
        let mut desired = DesiredState::from_observed(&pr);

        let sanction = Sanction {
            bot_login: &config.bot_login,
            tool_accounts: &config.tool_accounts,
        };
        let commands = pending_pr_commands(&pr, &comments, sanction);
        for command in &commands {
            if cancel.is_cancelled() {
                return Err(ReconcileError::Cancelled);
            }
            handlers::handle_pr_command(self.services(), &ctx, command, &mut desired).await?;
        }

        let mut jep_issue = None;
        if pr.state.is_open() {
            let plan = plan_labels(
                &self.forge,
                &config.labels,
                &pr,
                &comments,
                desired.pending_comments(),
                &desired.labels,
                &config.bot_login,
            )
            .await?;
            for label in &plan.remove {
                desired.remove_label(label);
            }
            for label in plan.add {
                desired.add_label(label);
            }
            if let Some(text) = plan.comment {
                desired.comment(text);
            }

            let mut requirements = Vec::new();
            requirements.extend(sync_approval(&ctx, &mut desired));
            if config.enable_csr {
                requirements.push(sync_csr(&ctx, &mut desired));
            }
            if config.enable_jep {
                let (requirement, issue) = self.sync_jep(&ctx, &mut desired).await?;
                requirements.push(requirement);
                jep_issue = issue;
            }

            let reviewed = has_reviewer_approval(&pr, &reviews, &census);
            desired.set_label(READY_LABEL, reviewed && !any_blocking(&requirements));
            let sections = body_sections(&ctx, &desired, reviewed, &requirements, plan.evaluated);
            desired.body = body::render(&pr.body, &sections);

            let issues = main_issue
                .iter()
                .chain(csr_issue.iter())
                .chain(jep_issue.iter())
                .map(|i| i.id.clone());
            self.records.record(pr.number, issues);
        } else {
            if let Some(commit) = pr.state.integrated_commit() {
                self.plan_auto_backports(&pr, commit, &mut desired).await?;
            }
            self.records.forget(pr.number);
        }

        let effects = desired.effects(&pr);
        let summary = PassSummary {
            commands: commands.len(),
            effects: effects.len(),
        };
        if effects.is_empty() {
            debug!("nothing owed");
        } else {
            info!(commands = summary.commands, effects = summary.effects, "applying pass");
        }
        apply_effects(&self.forge, &self.tracker, &self.vcs, effects, cancel).await?;
        Ok(summary)
    }

    /// The issue named by the pull request title, if it exists.
    async fn main_issue(&self, pr: &PullRequest) -> Result<Option<Issue>, ReconcileError> {
        let Some(project) = &self.config.issue_project else {
            return Ok(None);
        };
        let Some(id) = IssueId::from_title(&pr.title, project) else {
            return Ok(None);
        };
        Ok(calls::get_issue(&self.tracker, id).await?)
    }

    async fn sync_jep(
        &self,
        ctx: &PrContext<'_>,
        desired: &mut DesiredState,
    ) -> Result<(Requirement, Option<Issue>), ReconcileError> {
        let marker = latest_jep_marker(ctx, desired);
        let issue = match &marker {
            Some(m) if !m.is_unneeded() => {
                calls::get_issue(&self.tracker, IssueId::new(&m.issue)).await?
            }
            _ => None,
        };
        let state = jep::derive(desired.has_label(JEP_LABEL), marker.as_ref(), issue.as_ref());
        match state {
            RequirementState::Requested | RequirementState::Rejected => desired.add_label(JEP_LABEL),
            RequirementState::Approved => {
                desired.remove_label(JEP_LABEL);
                if let Some(issue) = &issue {
                    let text = format!(
                        "{}\n@{} the JEP for this pull request, [{}]({}), has been targeted.",
                        markers::JEP_TARGETED_MARKER,
                        ctx.pr.author,
                        jep::display_name(issue),
                        issue.web_url
                    );
                    post_once(ctx, desired, markers::JEP_TARGETED_MARKER, text);
                }
            }
            RequirementState::NotRequired => desired.remove_label(JEP_LABEL),
            RequirementState::AlreadySatisfied => {}
        }
        let linked = issue.as_ref().map(|i| LinkedIssue {
            name: jep::display_name(i),
            url: i.web_url.clone(),
        });
        Ok((Requirement::new(RequirementKind::Jep, state).with_issue(linked), issue))
    }

    /// Posts one `/backport` self-command per enabled target on the
    /// integrated commit, then drops the target labels.
    async fn plan_auto_backports(
        &self,
        pr: &PullRequest,
        commit: &Sha,
        desired: &mut DesiredState,
    ) -> Result<(), ReconcileError> {
        let targets: Vec<(String, RepoId, String)> = desired
            .labels
            .iter()
            .filter_map(|l| backport::parse_label(l).map(|(repo, branch)| (l.clone(), repo, branch)))
            .collect();
        if targets.is_empty() {
            return Ok(());
        }

        let bot = &self.config.bot_login;
        let existing = calls::list_commit_comments(&self.forge, commit.clone()).await?;
        for (label, repo, branch) in targets {
            let text = backport::self_command(&repo, &branch, &pr.author);
            let command_line = text.lines().next().unwrap_or_default();
            let posted = existing.iter().any(|c| {
                c.author.eq_ignore_ascii_case(bot) && c.body.lines().next() == Some(command_line)
            });
            if !posted {
                info!(commit = %commit.short(), target = %repo, branch = %branch, "scheduling automatic backport");
                desired.commit_comment(commit.clone(), text);
            }
            desired.remove_label(&label);
        }
        Ok(())
    }
}

/// Posts `text` unless a comment carrying `marker` exists or is queued.
fn post_once(ctx: &PrContext<'_>, desired: &mut DesiredState, marker: &str, text: String) {
    if !markers::bot_posted(ctx.comments, &ctx.config.bot_login, marker) && !desired.queued(marker) {
        desired.comment(text);
    }
}

fn latest_jep_marker(ctx: &PrContext<'_>, desired: &DesiredState) -> Option<JepMarker> {
    bot_bodies(ctx.comments, desired.pending_comments(), &ctx.config.bot_login)
        .filter_map(markers::jep_marker)
        .last()
}

/// The main issue as this pass leaves it.
fn effective_issue(main: Option<&Issue>, desired: &DesiredState) -> Option<Issue> {
    let mut issue = main?.clone();
    if let Some(labels) = desired.issue_labels() {
        issue.labels = labels.clone();
    }
    Some(issue)
}

fn sync_approval(ctx: &PrContext<'_>, desired: &mut DesiredState) -> Option<Requirement> {
    let Some(rule) = ctx.config.approval_rule(&ctx.pr.target_ref) else {
        desired.remove_label(APPROVAL_GATE_LABEL);
        return None;
    };
    let triple = rule.labels(&ctx.pr.target_ref);
    let issue = effective_issue(ctx.main_issue, desired);

    let mut state = approval::derive(&desired.labels, &triple, issue.as_ref());
    if state == RequirementState::NotRequired {
        if rule.post_explanation {
            let text = format!(
                "{}\n{}",
                markers::APPROVAL_EXPLANATION_MARKER,
                approval::explanation(rule, ctx.pr, &triple)
            );
            post_once(ctx, desired, markers::APPROVAL_EXPLANATION_MARKER, text);
        }
        state = RequirementState::Requested;
    }

    desired.add_label(triple.requested.clone());
    let verdict = match state {
        RequirementState::Approved => {
            desired.add_label(triple.approved.clone());
            desired.remove_label(&triple.rejected);
            desired.remove_label(APPROVAL_GATE_LABEL);
            Some(true)
        }
        RequirementState::Rejected => {
            desired.add_label(triple.rejected.clone());
            desired.remove_label(&triple.approved);
            desired.remove_label(APPROVAL_GATE_LABEL);
            Some(false)
        }
        _ => {
            desired.add_label(APPROVAL_GATE_LABEL);
            None
        }
    };

    if let Some(issue) = &issue
        && !issue.labels.contains(&triple.requested)
    {
        desired.set_issue_labels(&issue.id, approval::issue_labels_after(issue, &triple, verdict));
    }
    Some(Requirement::new(RequirementKind::Approval, state).with_issue(issue.as_ref().map(LinkedIssue::of)))
}

fn sync_csr(ctx: &PrContext<'_>, desired: &mut DesiredState) -> Requirement {
    let state = csr::derive(desired.has_label(CSR_LABEL), ctx.csr);
    match state {
        RequirementState::Requested | RequirementState::Rejected => desired.add_label(CSR_LABEL),
        RequirementState::Approved => {
            desired.remove_label(CSR_LABEL);
            if let Some(issue) = ctx.csr {
                let text = format!(
                    "{}\n@{} the CSR request [{}]({}) has been approved. The `{}` label has been removed.",
                    markers::CSR_APPROVED_MARKER,
                    ctx.pr.author,
                    issue.id,
                    issue.web_url,
                    CSR_LABEL
                );
                post_once(ctx, desired, markers::CSR_APPROVED_MARKER, text);
            }
        }
        RequirementState::NotRequired | RequirementState::AlreadySatisfied => {}
    }
    Requirement::new(RequirementKind::Csr, state).with_issue(ctx.csr.map(LinkedIssue::of))
}

/// Whether a census Reviewer approves the current head.
fn has_reviewer_approval(pr: &PullRequest, reviews: &[Review], census: &CensusSnapshot) -> bool {
    latest_reviews(reviews).values().any(|r| {
        r.verdict == ReviewVerdict::Approved
            && r.sha.as_ref() == Some(&pr.head_sha)
            && census.is_reviewer(&r.reviewer)
    })
}

fn census_display(census: &CensusSnapshot, username: &str) -> Option<String> {
    let c = census.contributor(username)?;
    Some(format!(
        "{} (`{}` - **{}**)",
        c.full_name.as_deref().unwrap_or(&c.username),
        c.username,
        c.role.title()
    ))
}

fn login_display(census: &CensusSnapshot, login: &str) -> String {
    census
        .contributor_for_login(login)
        .and_then(|c| census_display(census, &c.username))
        .unwrap_or_else(|| format!("`{}` (no known {} user name / role)", login, census.domain()))
}

fn body_sections(
    ctx: &PrContext<'_>,
    desired: &DesiredState,
    reviewed: bool,
    requirements: &[Requirement],
    labeled_commit: Option<Sha>,
) -> BodySections {
    let mut checklist = vec![ChecklistItem {
        text: REVIEW_ITEM.to_string(),
        checked: reviewed,
    }];
    checklist.extend(requirements.iter().filter_map(|r| {
        r.checklist_text().map(|text| ChecklistItem {
            text,
            checked: r.state.is_satisfied(),
        })
    }));

    let bot = &ctx.config.bot_login;
    let pending = desired.pending_comments();
    let mut reviewers: Vec<ReviewerEntry> = approvers(ctx.reviews)
        .iter()
        .map(|login| ReviewerEntry {
            display: login_display(ctx.census, login),
            manual: false,
        })
        .collect();
    reviewers.extend(
        reviewer::credited(ctx.comments, pending, bot)
            .iter()
            .map(|username| ReviewerEntry {
                display: census_display(ctx.census, username)
                    .unwrap_or_else(|| format!("`{}`", username)),
                manual: true,
            }),
    );

    BodySections {
        checklist,
        reviewers,
        contributors: contributor::current(ctx.comments, pending, bot),
        labeled_commit,
    }
}
