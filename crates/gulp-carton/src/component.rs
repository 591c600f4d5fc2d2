//! Component resolution and the component → box seed.

use tracing::debug;

use gulp_core::keys;
use gulp_state::{ComponentRecord, Hook, Operation, StateStore};

use crate::boxes::BoxSpec;
use crate::error::{CartonError, CartonResult};

/// Loads a leaf workload definition by id.
pub trait ComponentResolver: Send + Sync {
    fn resolve(&self, id: &str) -> CartonResult<ComponentRecord>;
}

impl ComponentResolver for StateStore {
    fn resolve(&self, id: &str) -> CartonResult<ComponentRecord> {
        self.get_component(id)?
            .ok_or_else(|| CartonError::ComponentNotFound(id.to_string()))
    }
}

/// Seed a box from the component's own definition.
///
/// Carton linkage, compute, SSH and the status snapshot are stamped later
/// by the assembly.
pub fn mk_box(comp: &ComponentRecord) -> CartonResult<BoxSpec> {
    if comp.name.trim().is_empty() {
        return Err(CartonError::InvalidBox {
            id: comp.id.clone(),
            reason: "component has no name".to_string(),
        });
    }

    let repo = match &comp.repo {
        Some(repo) if !repo.is_known_type() => {
            return Err(CartonError::InvalidBox {
                id: comp.id.clone(),
                reason: format!("unknown repository type '{}'", repo.rtype),
            });
        }
        Some(repo) => {
            let mut repo = repo.clone();
            if let Some(hook) = ci_hook(&comp.operations) {
                repo.hook = Some(hook);
            }
            Some(repo)
        }
        None => None,
    };

    debug!(id = %comp.id, name = %comp.name, "box seeded from component");
    Ok(BoxSpec {
        id: comp.id.clone(),
        name: comp.name.clone(),
        domain_name: comp.inputs.matches(keys::DOMAIN),
        tosca: comp.tosca_type.clone(),
        image_version: comp.inputs.matches(keys::IMAGE_VERSION),
        provider: comp.inputs.matches(keys::PROVIDER),
        public_ip: comp.outputs.matches(keys::PUBLIC_IPV4),
        envs: comp.envs.clone(),
        repo,
        status: comp.status.clone(),
        state: comp.state.clone(),
        ..Default::default()
    })
}

/// Build the repository hook from the component's `ci` operation, if any.
fn ci_hook(operations: &[Operation]) -> Option<Hook> {
    let op = operations
        .iter()
        .find(|op| op.operation_type == keys::CI_OPERATION)?;
    Some(Hook {
        enabled: op.properties.matches(keys::CI_ENABLED) == "true",
        token: op.properties.matches(keys::CI_TOKEN),
        user_id: op.properties.matches(keys::CI_USER),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gulp_core::Kvp;
    use gulp_state::Repo;

    fn component() -> ComponentRecord {
        ComponentRecord {
            id: "c1".into(),
            name: "web".into(),
            tosca_type: "tosca.app.java".into(),
            inputs: [
                ("domain", vec!["megambox.com".to_string()]),
                ("provider", vec!["docker".to_string()]),
            ]
            .into_iter()
            .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn resolver_reports_missing_component() {
        let store = StateStore::open_in_memory().unwrap();
        store.put_component(&component()).unwrap();

        assert_eq!(store.resolve("c1").unwrap().name, "web");
        assert!(matches!(
            store.resolve("c9"),
            Err(CartonError::ComponentNotFound(id)) if id == "c9"
        ));
    }

    #[test]
    fn mk_box_copies_component_fields() {
        let b = mk_box(&component()).unwrap();
        assert_eq!(b.id, "c1");
        assert_eq!(b.domain_name, "megambox.com");
        assert_eq!(b.provider, "docker");
        assert_eq!(b.public_ip, "");
        assert!(b.repo.is_none());
    }

    #[test]
    fn mk_box_rejects_blank_name() {
        let mut comp = component();
        comp.name = "  ".into();
        assert!(matches!(mk_box(&comp), Err(CartonError::InvalidBox { .. })));
    }

    #[test]
    fn mk_box_rejects_unknown_repo_type() {
        let mut comp = component();
        comp.repo = Some(Repo {
            rtype: "svn".into(),
            ..Default::default()
        });
        assert!(matches!(mk_box(&comp), Err(CartonError::InvalidBox { .. })));
    }

    #[test]
    fn ci_operation_becomes_hook() {
        let mut comp = component();
        comp.repo = Some(Repo {
            rtype: "source".into(),
            url: "https://github.com/megamsys/sparkbuilder.git".into(),
            ..Default::default()
        });
        comp.operations = vec![Operation {
            operation_type: "ci".into(),
            description: "continous integration".into(),
            properties: Kvp::from_iter([
                ("enabled", vec!["true".to_string()]),
                ("token", vec!["066b697558f048459412410483ca8965".to_string()]),
                ("username", vec!["rajthilakmca".to_string()]),
            ]),
        }];

        let b = mk_box(&comp).unwrap();
        let hook = b.repo.unwrap().hook.unwrap();
        assert!(hook.enabled);
        assert_eq!(hook.user_id, "rajthilakmca");
        assert!(hook.carton_id.is_empty());
    }
}
