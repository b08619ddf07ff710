//! The requirements analyzer: reduces a list of matched
//! policies to a canonical `{required, one_of, optional}` partition, plus
//! the `keep` elision operator and the base-URI translation combinator
//! used around it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::policy::Policy;
use crate::repository::{Repository, WILDCARD};

/// A canonical partition of candidate repositories into `required`,
/// `one_of` groups, and `optional`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirements {
    /// Repositories every matching policy requires deposit into.
    #[serde(default)]
    pub required: Vec<Repository>,
    /// Groups of repositories where depositing into any one member
    /// satisfies the group.
    #[serde(rename = "oneOf", default)]
    pub one_of: Vec<Vec<Repository>>,
    /// Repositories deposit into which is discretionary.
    #[serde(default)]
    pub optional: Vec<Repository>,
}

/// Analyze a list of matched policies into a canonical [`Requirements`]
/// .
#[must_use]
pub fn analyze(policies: &[Policy]) -> Requirements {
    let mut requirements = categorize(policies);

    // Cut required from oneOf: any oneOf list sharing a repo with required
    // is removed wholesale, demoting its other members to optional.
    let (one_of, optional) = cut_from(requirements.one_of, &requirements.required);
    requirements.one_of = one_of;
    requirements.optional.extend(optional);

    // Cut wildcard, but only once something survives to cut from.
    if !requirements.required.is_empty() || !requirements.one_of.is_empty() {
        let (one_of, optional) = cut_from(requirements.one_of, &[Repository::new(WILDCARD)]);
        requirements.one_of = one_of;
        requirements.optional.extend(optional);
    }

    // Suppress dupes already covered by a surviving oneOf list.
    if !requirements.one_of.is_empty() {
        requirements.optional.retain(|repo| {
            !requirements
                .one_of
                .iter()
                .any(|list| repo_list_contains(list, repo))
        });
    }

    // Suppress dupes already covered by required.
    if !requirements.required.is_empty() {
        requirements
            .optional
            .retain(|repo| !repo_list_contains(&requirements.required, repo));
    }

    // Promote optional to a single oneOf group if nothing else survived.
    if requirements.required.is_empty() && requirements.one_of.is_empty() {
        if !requirements.optional.is_empty() {
            requirements.one_of.push(std::mem::take(&mut requirements.optional));
        }
    }

    // Singleton promotion: one oneOf group of exactly one repo becomes required.
    if requirements.required.is_empty() && requirements.one_of.len() == 1 && requirements.one_of[0].len() == 1 {
        let only = requirements.one_of.remove(0).remove(0);
        requirements.required.push(only);
    }

    normalize(requirements)
}

/// Restrict `self` to only repositories named in `keep` (the `Keep`
/// elision operator): drop anything outside `keep`, demoting `oneOf`
/// members that survive individually to `optional`.
impl Requirements {
    #[must_use]
    pub fn keep(&self, keep: &[Repository]) -> Self {
        let should_keep: HashSet<&str> = keep.iter().map(|r| r.id.as_str()).collect();

        let mut out = Requirements::default();

        out.required = self
            .required
            .iter()
            .filter(|r| should_keep.contains(r.id.as_str()))
            .cloned()
            .collect();

        let mut discarded = false;
        for list in &self.one_of {
            if list.iter().any(|r| !repo_list_contains(keep, r)) {
                discarded = true;
                break;
            }
        }

        if !discarded {
            out.one_of = self.one_of.clone();
        } else {
            for list in &self.one_of {
                if !list.iter().any(|r| !repo_list_contains(keep, r)) {
                    out.one_of.push(list.clone());
                    continue;
                }
                for member in list {
                    if repo_list_contains(keep, member) {
                        out.optional.push(member.clone());
                    }
                }
            }
        }

        out.optional.extend(
            self.optional
                .iter()
                .filter(|r| should_keep.contains(r.id.as_str()))
                .cloned(),
        );

        normalize(out)
    }

    /// Apply `translate` to every repository id in this structure, returning
    /// a new [`Requirements`].
    /// `translate` mirrors `BaseUris::public_with_private`/
    /// `private_with_public`'s `(result, did_replace)` shape; the bool is
    /// ignored here — the translated string is always used regardless of
    /// whether a replacement actually occurred.
    #[must_use]
    pub fn translate_uris(&self, translate: impl Fn(&str) -> (String, bool)) -> Self {
        let translate_repo = |r: &Repository| Repository {
            id: translate(&r.id).0,
            selected: r.selected,
        };

        Requirements {
            required: self.required.iter().map(translate_repo).collect(),
            one_of: self
                .one_of
                .iter()
                .map(|list| list.iter().map(translate_repo).collect())
                .collect(),
            optional: self.optional.iter().map(translate_repo).collect(),
        }
    }
}

/// Sort repos from a set of policies into `required` and `one_of` buckets
/// .
fn categorize(policies: &[Policy]) -> Requirements {
    let mut requirements = Requirements::default();
    for policy in policies {
        match policy.repositories.as_slice() {
            [single] if single.id != WILDCARD => requirements.required.push(single.clone()),
            many if many.len() > 1 => requirements.one_of.push(many.to_vec()),
            _ => {}
        }
    }
    normalize(requirements)
}

fn normalize(mut requirements: Requirements) -> Requirements {
    requirements.required = unique_repos(requirements.required);
    requirements.one_of = unique_repo_lists(requirements.one_of);
    requirements.optional = unique_repos(requirements.optional);
    requirements
}

/// Sort and deduplicate repos by id; where two members share an id and
/// disagree on `selected`, `true` wins.
fn unique_repos(mut repos: Vec<Repository>) -> Vec<Repository> {
    repos.sort_by(|a, b| a.id.cmp(&b.id));
    let mut out: Vec<Repository> = Vec::with_capacity(repos.len());
    for repo in repos {
        if let Some(last) = out.last_mut() {
            if last.id == repo.id {
                last.selected |= repo.selected;
                continue;
            }
        }
        out.push(repo);
    }
    out
}

fn repo_list_key(repos: &[Repository]) -> String {
    let mut ids: Vec<&str> = repos.iter().map(|r| r.id.as_str()).collect();
    ids.sort_unstable();
    ids.join(";")
}

fn unique_repo_lists(lists: Vec<Vec<Repository>>) -> Vec<Vec<Repository>> {
    let mut keyed: Vec<(String, Vec<Repository>)> = lists
        .into_iter()
        .map(|list| (repo_list_key(&list), unique_repos(list)))
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));

    let mut out = Vec::with_capacity(keyed.len());
    let mut last_key: Option<String> = None;
    for (key, list) in keyed {
        if last_key.as_deref() != Some(key.as_str()) {
            out.push(list);
            last_key = Some(key);
        }
    }
    out
}

/// Remove from `lists` any list containing a repository also present in
/// `cutlist`, demoting the other members of that list to the returned
/// `remaining` set.
fn cut_from(lists: Vec<Vec<Repository>>, cutlist: &[Repository]) -> (Vec<Vec<Repository>>, Vec<Repository>) {
    if cutlist.is_empty() {
        return (lists, Vec::new());
    }

    let mut kept = Vec::with_capacity(lists.len());
    let mut remaining = Vec::new();

    for list in lists {
        if list.iter().any(|member| repo_list_contains(cutlist, member)) {
            for member in &list {
                if !repo_list_contains(cutlist, member) {
                    remaining.push(member.clone());
                }
            }
        } else {
            kept.push(list);
        }
    }

    (kept, remaining)
}

fn repo_list_contains(list: &[Repository], repo: &Repository) -> bool {
    list.iter().any(|member| member.id == repo.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo(id: &str) -> Repository {
        Repository::new(id)
    }

    fn policy(ids: &[&str]) -> Policy {
        Policy {
            id: format!("policy-{}", ids.join("-")),
            description: String::new(),
            policy_type: String::new(),
            repositories: ids.iter().map(|id| repo(id)).collect(),
        }
    }

    #[test]
    fn scenario_a_single_required_and_a_oneof_pair() {
        let policies = vec![policy(&["a"]), policy(&["b", "c"])];
        let r = analyze(&policies);
        assert_eq!(r.required, vec![repo("a")]);
        assert_eq!(r.one_of, vec![vec![repo("b"), repo("c")]]);
        assert!(r.optional.is_empty());
    }

    #[test]
    fn scenario_b_wildcard_in_oneof_demotes_to_optional() {
        let policies = vec![policy(&["a"]), policy(&["b", "*"])];
        let r = analyze(&policies);
        assert_eq!(r.required, vec![repo("a")]);
        assert!(r.one_of.is_empty());
        assert_eq!(r.optional, vec![repo("b")]);
    }

    #[test]
    fn scenario_c_single_policy_with_required_plus_wildcard() {
        let policies = vec![policy(&["a", "*"])];
        let r = analyze(&policies);
        assert_eq!(r.required, vec![repo("a")]);
        assert!(r.one_of.is_empty());
        assert!(r.optional.is_empty());
    }

    #[test]
    fn scenario_d_required_cuts_a_oneof_group_sharing_its_member() {
        let policies = vec![policy(&["a"]), policy(&["a", "b"])];
        let r = analyze(&policies);
        assert_eq!(r.required, vec![repo("a")]);
        assert!(r.one_of.is_empty());
        assert_eq!(r.optional, vec![repo("b")]);
    }

    #[test]
    fn scenario_e_two_wildcard_pairs_promote_to_oneof() {
        let policies = vec![policy(&["a", "*"]), policy(&["b", "*"])];
        let r = analyze(&policies);
        assert!(r.required.is_empty());
        assert_eq!(r.one_of, vec![vec![repo("a"), repo("b")]]);
        assert!(r.optional.is_empty());
    }

    #[test]
    fn scenario_f_keep_demotes_oneof_members_to_optional() {
        let requirements = Requirements {
            required: vec![repo("c")],
            one_of: vec![vec![repo("a"), repo("d")], vec![repo("b"), repo("d")]],
            optional: vec![],
        };
        let kept = requirements.keep(&[repo("a"), repo("b")]);
        assert!(kept.required.is_empty());
        assert!(kept.one_of.is_empty());
        assert_eq!(kept.optional, vec![repo("a"), repo("b")]);
    }

    #[test]
    fn single_policy_with_lone_wildcard_contributes_nothing() {
        let policies = vec![policy(&["*"])];
        let r = analyze(&policies);
        assert!(r.required.is_empty());
        assert!(r.one_of.is_empty());
        assert!(r.optional.is_empty());
    }

    #[test]
    fn selected_true_wins_on_dedupe_collision() {
        let mut unselected = repo("a");
        unselected.selected = false;
        let mut selected = repo("a");
        selected.selected = true;
        let merged = unique_repos(vec![unselected, selected]);
        assert_eq!(merged.len(), 1);
        assert!(merged[0].selected);
    }

    #[test]
    fn keep_never_introduces_an_id_outside_the_allowed_set() {
        let policies = vec![policy(&["a"]), policy(&["b", "c"]), policy(&["d", "e"])];
        let requirements = analyze(&policies);
        let allowed = [repo("b"), repo("d")];
        let kept = requirements.keep(&allowed);

        let mut ids: HashSet<&str> = HashSet::new();
        ids.extend(kept.required.iter().map(|r| r.id.as_str()));
        ids.extend(kept.optional.iter().map(|r| r.id.as_str()));
        for list in &kept.one_of {
            ids.extend(list.iter().map(|r| r.id.as_str()));
        }

        let allowed_ids: HashSet<&str> = allowed.iter().map(|r| r.id.as_str()).collect();
        assert!(ids.is_subset(&allowed_ids));
    }

    #[test]
    fn translate_uris_rewrites_every_repository_id() {
        let requirements = Requirements {
            required: vec![repo("/relative/a")],
            one_of: vec![vec![repo("/relative/b")]],
            optional: vec![repo("/relative/c")],
        };
        let translated = requirements.translate_uris(|s| (format!("http://base{s}"), true));
        assert_eq!(translated.required[0].id, "http://base/relative/a");
        assert_eq!(translated.one_of[0][0].id, "http://base/relative/b");
        assert_eq!(translated.optional[0].id, "http://base/relative/c");
    }
}
