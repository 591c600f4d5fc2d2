//! Box — the per-component deployable descriptor.

use serde::{Deserialize, Serialize};

use gulp_core::{Kvp, State, Status};
use gulp_state::Repo;

/// Compute sizing copied from the assembly onto every box.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoxCompute {
    pub cpushare: String,
    pub memory: String,
    pub swap: String,
    pub hdd: String,
}

/// SSH access copied from the assembly onto every box.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoxSsh {
    pub user: String,
    /// SSH key prefix.
    pub prefix: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoxSpec {
    /// Component id.
    pub id: String,
    /// Owning assembly id.
    pub carton_id: String,
    /// Deployment instance id.
    pub cartons_id: String,
    pub carton_name: String,
    pub name: String,
    pub domain_name: String,
    pub tosca: String,
    pub image_version: String,
    pub provider: String,
    pub public_ip: String,
    pub envs: Kvp,
    pub repo: Option<Repo>,
    pub compute: BoxCompute,
    pub ssh: BoxSsh,
    pub status: Status,
    pub state: State,
}

impl BoxSpec {
    /// True when the box carries a repository the platform can build from.
    pub fn repo_enabled(&self) -> bool {
        self.repo.as_ref().is_some_and(Repo::is_enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_enabled_needs_url_and_known_type() {
        let mut b = BoxSpec::default();
        assert!(!b.repo_enabled());

        b.repo = Some(Repo {
            rtype: "source".into(),
            url: "https://github.com/megamsys/sparkbuilder.git".into(),
            ..Default::default()
        });
        assert!(b.repo_enabled());

        b.repo = Some(Repo {
            rtype: "none".into(),
            url: "https://github.com/megamsys/sparkbuilder.git".into(),
            ..Default::default()
        });
        assert!(!b.repo_enabled());
    }
}
