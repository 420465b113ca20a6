//! Reply texts for backport outcomes.

use super::engine::{BackportOutcome, BackportPlan};
use crate::handlers::bullet_list;
use crate::types::RepoId;

fn repo_link(web: &str, repo: &RepoId) -> String {
    format!("[{}]({}/{})", repo, web, repo)
}

fn branch_link(web: &str, repo: &RepoId, branch: &str) -> String {
    format!("[{}:{}]({}/{}/tree/{})", repo, branch, web, repo, branch)
}

fn commit_link(web: &str, plan: &BackportPlan) -> String {
    format!(
        "[{}]({}/{}/commit/{})",
        plan.commit.sha.abbreviate(),
        web,
        plan.source,
        plan.commit.sha
    )
}

/// URL opening a pull request from the backport branch in the fork.
pub fn compare_url(web: &str, plan: &BackportPlan) -> String {
    format!(
        "{}/{}/compare/{}...{}:{}:{}?expand=1",
        web, plan.target, plan.target_branch, plan.fork.owner, plan.fork.repo, plan.branch
    )
}

/// A pull request body for the backport, quoted so it can be copied.
pub fn suggested_body(web: &str, plan: &BackportPlan) -> String {
    let commit = &plan.commit;
    let mut lines = vec![
        "Hi all,".to_string(),
        String::new(),
        format!(
            "This pull request contains a backport of commit {} from the {} repository.",
            commit_link(web, plan),
            repo_link(web, &plan.source)
        ),
        String::new(),
        format!(
            "The commit being backported was authored by {} <{}> on {}.",
            commit.author_name,
            commit.author_email,
            commit.authored_at.format("%-d %b %Y")
        ),
        String::new(),
    ];
    lines.extend(commit.message.lines().map(|l| format!("`{}`", l)).filter(|l| l != "``"));
    lines.push(String::new());
    lines.push("Thanks!".to_string());
    lines
        .iter()
        .map(|l| if l.is_empty() { ">".to_string() } else { format!("> {}", l) })
        .collect::<Vec<_>>()
        .join("\n")
}

fn manual_steps(web: &str, plan: &BackportPlan) -> String {
    let sha = &plan.commit.sha;
    format!(
        "```\n\
         # Fetch the up-to-date version of the target branch\n\
         $ git fetch --no-tags {web}/{target}.git {tb}:{tb}\n\n\
         # Check out the target branch and create your own branch to backport\n\
         $ git checkout -b {branch} {tb}\n\n\
         # Fetch the commit you want to backport\n\
         $ git fetch --no-tags {web}/{source}.git {sha}\n\n\
         # Backport the commit\n\
         $ git cherry-pick --no-commit {sha}\n\
         # Resolve conflicts now\n\n\
         # Commit the files you have modified\n\
         $ git add files/with/resolved/conflicts\n\
         $ git commit -m 'Backport {sha}'\n\
         ```",
        web = web,
        target = plan.target,
        tb = plan.target_branch,
        branch = plan.branch,
        source = plan.source,
        sha = sha,
    )
}

/// Renders the reply for a backport outcome.
pub fn render(web: &str, outcome: &BackportOutcome) -> String {
    match outcome {
        BackportOutcome::MissingBranch { branch, valid } => format!(
            "The target branch `{}` does not exist\nList of valid branches:\n{}",
            branch,
            bullet_list(valid)
        ),
        BackportOutcome::AlreadyPresent(plan) => format!(
            "Commit {} is already present on {}. No backport is needed.",
            commit_link(web, plan),
            branch_link(web, &plan.target, &plan.target_branch)
        ),
        BackportOutcome::Clean { plan, commit } => format!(
            "the [backport]({web}/{fork}/commit/{picked}) was successfully created on the branch \
             {fork_branch} in my personal fork of {target}. To create a pull request with this \
             backport targeting {target_branch}, just click the following link:\n\n\
             [:arrow_right: Create pull request]({compare})\n\n\
             The title of the pull request is automatically filled in correctly and below you \
             find a suggestion for the pull request body:\n\n\
             {body}\n\n\
             If you need to update the [source branch]({web}/{fork}/tree/{branch}) of the pull \
             request then run the following commands in a local clone of your personal fork of \
             {target}:\n\n\
             ```\n\
             $ git fetch {web}/{fork}.git {branch}:{branch}\n\
             $ git checkout {branch}\n\
             # make changes\n\
             $ git add paths/to/changed/files\n\
             $ git commit --message 'Describe additional changes made'\n\
             $ git push {web}/{fork}.git {branch}\n\
             ```",
            web = web,
            fork = plan.fork,
            branch = plan.branch,
            picked = commit,
            fork_branch = branch_link(web, &plan.fork, &plan.branch),
            target = repo_link(web, &plan.target),
            target_branch = branch_link(web, &plan.target, &plan.target_branch),
            compare = compare_url(web, plan),
            body = suggested_body(web, plan),
        ),
        BackportOutcome::Conflict { plan, paths } => format!(
            "could **not** automatically backport `{abbrev}` to {target_branch} due to \
             conflicts in the following files:\n\n\
             {paths}\n\n\
             Please fetch the appropriate branch/commit and manually resolve these conflicts \
             by using the following commands in your personal fork of {target}:\n\n\
             {steps}\n\n\
             Once you have resolved the conflicts as explained above continue with creating a \
             pull request towards {target_branch} with the title `Backport {sha}`.\n\n\
             Below you can find a suggestion for the pull request body:\n\n\
             {body}",
            abbrev = plan.commit.sha.abbreviate(),
            sha = plan.commit.sha,
            target = repo_link(web, &plan.target),
            target_branch = branch_link(web, &plan.target, &plan.target_branch),
            paths = bullet_list(paths),
            steps = manual_steps(web, plan),
            body = suggested_body(web, plan),
        ),
    }
}

/// Reply when the written target repository is not a configured fork target.
pub fn invalid_target(written: &str, valid: &[RepoId]) -> String {
    let names: Vec<String> = valid.iter().map(ToString::to_string).collect();
    format!(
        "The target repository `{}` is not a valid target for backports.\n\
         List of valid target repositories:\n{}",
        written,
        bullet_list(&names)
    )
}
