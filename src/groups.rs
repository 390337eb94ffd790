use std::collections::{BTreeSet, HashMap};
use std::ffi::CString;

use color_eyre::eyre::Context;
use color_eyre::Result;
use nix::unistd::{getgrouplist, Gid, Group, User};

/// Group memberships of the users running jobs
#[derive(Clone, Debug, Default)]
pub struct UserGroups {
    users: HashMap<String, BTreeSet<String>>,
}

impl UserGroups {
    /// Resolves the groups of each distinct user through the system's user and group
    /// databases (NSS), so that users from LDAP or SSSD are included
    pub fn resolve<'a, I>(users: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut nss = Nss::default();
        let groups = Self::resolve_with(users, |user| nss.groups(user));
        log::debug!(
            "resolved groups of {} users via {} group lookups",
            groups.users.len(),
            nss.names.len()
        );

        groups
    }

    /// Resolves each distinct user once with `lookup`. Unknown users and failed
    /// lookups result in users without groups
    pub fn resolve_with<'a, I, F>(users: I, mut lookup: F) -> Self
    where
        I: IntoIterator<Item = &'a str>,
        F: FnMut(&str) -> Result<Option<BTreeSet<String>>>,
    {
        let mut resolved = HashMap::new();
        let mut seen = BTreeSet::new();

        for user in users {
            if !seen.insert(user) {
                continue;
            }

            match lookup(user) {
                Ok(Some(groups)) => {
                    resolved.insert(user.to_string(), groups);
                }
                Ok(None) => log::debug!("user {:?} not found", user),
                Err(err) => log::warn!("could not resolve groups of user {:?}: {:#}", user, err),
            }
        }

        Self { users: resolved }
    }

    /// Groups of `user`, if the user is known
    pub fn get(&self, user: &str) -> Option<&BTreeSet<String>> {
        self.users.get(user)
    }
}

impl<U, I, G> FromIterator<(U, I)> for UserGroups
where
    U: Into<String>,
    I: IntoIterator<Item = G>,
    G: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (U, I)>>(iter: T) -> Self {
        Self {
            users: iter
                .into_iter()
                .map(|(user, groups)| (user.into(), groups.into_iter().map(Into::into).collect()))
                .collect(),
        }
    }
}

/// Lookups via `getpwnam(3)`, `getgrouplist(3)` and `getgrgid(3)`, caching group names
#[derive(Debug, Default)]
struct Nss {
    names: HashMap<Gid, Option<String>>,
}

impl Nss {
    fn groups(&mut self, user: &str) -> Result<Option<BTreeSet<String>>> {
        let Some(entry) =
            User::from_name(user).wrap_err_with(|| format!("looking up user {:?}", user))?
        else {
            return Ok(None);
        };

        let name = CString::new(user).wrap_err_with(|| format!("invalid user name {:?}", user))?;
        let gids = getgrouplist(&name, entry.gid)
            .wrap_err_with(|| format!("listing groups of user {:?}", user))?;

        let mut groups = BTreeSet::new();
        for gid in gids {
            if let Some(group) = self.name(gid)? {
                groups.insert(group);
            }
        }

        Ok(Some(groups))
    }

    fn name(&mut self, gid: Gid) -> Result<Option<String>> {
        if let Some(name) = self.names.get(&gid) {
            return Ok(name.clone());
        }

        let name = Group::from_gid(gid)
            .wrap_err_with(|| format!("looking up group {}", gid))?
            .map(|group| group.name);

        if name.is_none() {
            log::debug!("group {} has no name", gid);
        }

        self.names.insert(gid, name.clone());
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use color_eyre::eyre::eyre;

    use super::*;

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_resolve_with() {
        let mut lookups = Vec::new();
        let groups = UserGroups::resolve_with(
            ["alice", "bob", "alice", "carol", "dave", "bob"],
            |user| {
                lookups.push(user.to_string());
                match user {
                    "alice" => Ok(Some(set(&["alice", "physics"]))),
                    "bob" => Ok(Some(set(&["biology"]))),
                    "carol" => Err(eyre!("directory unavailable")),
                    _ => Ok(None),
                }
            },
        );

        // Each distinct user is looked up exactly once
        assert_eq!(lookups, vec!["alice", "bob", "carol", "dave"]);

        assert_eq!(groups.get("alice"), Some(&set(&["alice", "physics"])));
        assert_eq!(groups.get("bob"), Some(&set(&["biology"])));
        assert_eq!(groups.get("carol"), None);
        assert_eq!(groups.get("dave"), None);
    }

    #[test]
    fn test_resolve_system_users() {
        let groups = UserGroups::resolve(["root", "slurmgrid-no-such-user"]);

        // root always has a primary group
        assert!(!groups.get("root").unwrap().is_empty());
        assert_eq!(groups.get("slurmgrid-no-such-user"), None);
    }

    #[test]
    fn test_from_iter() {
        let groups = UserGroups::from_iter([("alice", vec!["physics"])]);
        assert_eq!(groups.get("alice"), Some(&set(&["physics"])));
    }
}
