mod common;

use common::Constant;
use pretty_assertions::assert_eq;
use rolegate::relation::RolegateRelationError;
use rolegate::{
    AccessType, EntityKind, MonitorState, Registry, RegistryConfig, Right, RoleId,
    RolegateRegistryError, ServiceId, UserId,
};
use std::sync::Arc;

fn registry() -> Registry {
    Registry::new(RegistryConfig {
        verify_mutations: true,
        ..RegistryConfig::default()
    })
}

#[test_log::test]
fn it_scans_memberships_in_both_directions() -> anyhow::Result<()> {
    let registry = registry();
    for name in ["u0", "u1", "u2", "u3"] {
        registry.create_user(name)?;
    }
    for name in ["r0", "r1", "r2", "r3", "r4", "r5", "r6"] {
        registry.create_role(name)?;
    }

    for user in [1, 2, 3] {
        registry.assign_role(UserId(user), RoleId(5))?;
    }
    registry.assign_role(UserId(1), RoleId(6))?;

    assert_eq!(registry.roles_of(UserId(1))?, vec![RoleId(5), RoleId(6)]);
    assert_eq!(
        registry.members_of(RoleId(5))?,
        vec![UserId(1), UserId(2), UserId(3)]
    );
    assert_eq!(registry.members_of(RoleId(6))?, vec![UserId(1)]);
    assert!(registry.is_member_of(UserId(2), RoleId(5))?);
    assert!(!registry.is_member_of(UserId(2), RoleId(6))?);
    Ok(())
}

#[test_log::test]
fn it_rejects_repeated_and_missing_links() -> anyhow::Result<()> {
    let registry = registry();
    let user = registry.create_user("ada")?;
    let role = registry.create_role("admin")?;
    registry.assign_role(user, role)?;

    assert!(matches!(
        registry.assign_role(user, role),
        Err(RolegateRegistryError::Relation(
            RolegateRelationError::AlreadyLinked { a: 0, b: 0 }
        ))
    ));

    registry.unassign_role(user, role)?;
    assert!(matches!(
        registry.unassign_role(user, role),
        Err(RolegateRegistryError::Relation(
            RolegateRelationError::NotLinked { a: 0, b: 0 }
        ))
    ));
    Ok(())
}

#[test_log::test]
fn it_checks_both_endpoints_before_linking() -> anyhow::Result<()> {
    let registry = registry();
    let user = registry.create_user("ada")?;
    let role = registry.create_role("admin")?;

    assert!(matches!(
        registry.assign_role(UserId(8), role),
        Err(RolegateRegistryError::NotFound {
            kind: EntityKind::User,
            id: 8
        })
    ));
    assert!(matches!(
        registry.assign_role(user, RoleId(8)),
        Err(RolegateRegistryError::NotFound {
            kind: EntityKind::Role,
            id: 8
        })
    ));
    assert!(matches!(
        registry.authorize_role(role, ServiceId(0), 1),
        Err(RolegateRegistryError::NotFound {
            kind: EntityKind::Service,
            id: 0
        })
    ));
    assert!(registry.roles_of(user)?.is_empty());
    Ok(())
}

#[test_log::test]
fn it_resolves_names_and_reports_unknown_ones() -> anyhow::Result<()> {
    let registry = registry();
    let user = registry.create_user("ada")?;
    let service = registry.register_service(Arc::new(Constant("answer", 42)))?;

    assert_eq!(registry.user_id("ada")?, user);
    assert_eq!(registry.user_name(user)?, "ada");
    assert_eq!(registry.service_id("answer")?, service);
    assert_eq!(registry.service_name(service)?, "answer");
    assert_eq!(
        registry.users(),
        vec![(UserId(0), "ada".to_string())]
    );

    assert!(matches!(
        registry.role_id("admin"),
        Err(RolegateRegistryError::MissingIdentifier {
            kind: EntityKind::Role,
            ref name
        }) if name == "admin"
    ));
    assert!(matches!(
        registry.user_name(UserId(3)),
        Err(RolegateRegistryError::NotFound {
            kind: EntityKind::User,
            id: 3
        })
    ));
    assert!(matches!(
        registry.create_user("ada"),
        Err(RolegateRegistryError::DuplicateName {
            kind: EntityKind::User,
            ..
        })
    ));
    Ok(())
}

#[test_log::test]
fn it_records_rights_with_their_access_type() -> anyhow::Result<()> {
    let registry = registry();
    let admin = registry.create_role("admin")?;
    let auditor = registry.create_role("auditor")?;
    let read = registry.register_service(Arc::new(Constant("read", 1)))?;
    let write = registry.register_service(Arc::new(Constant("write", 2)))?;

    registry.authorize_role(admin, read, 1)?;
    registry.authorize_role(admin, write, 2)?;
    registry.authorize_role(auditor, read, 1)?;

    assert_eq!(registry.services_of(admin)?, vec![read, write]);
    assert_eq!(registry.authorized_roles(read)?, vec![admin, auditor]);
    assert_eq!(
        registry.right(admin, write)?,
        Some(Right::new(admin, write, AccessType(2)))
    );
    assert_eq!(registry.right(auditor, write)?, None);
    assert_eq!(
        registry
            .role_rights(admin)?
            .into_iter()
            .map(|right| right.access_type)
            .collect::<Vec<_>>(),
        vec![AccessType(1), AccessType(2)]
    );
    assert_eq!(registry.service_rights(read)?.len(), 2);

    assert!(matches!(
        registry.authorize_role(admin, read, 7),
        Err(RolegateRegistryError::Relation(
            RolegateRelationError::AlreadyLinked { .. }
        ))
    ));
    assert_eq!(registry.right(admin, read)?.map(|right| right.access_type), Some(AccessType(1)));

    let revoked = registry.unauthorize_role(admin, write)?;
    assert_eq!(revoked.access_type, AccessType(2));
    assert!(!registry.is_authorized_for(admin, write)?);
    Ok(())
}

#[test_log::test]
fn it_purges_relations_when_entities_are_removed() -> anyhow::Result<()> {
    let registry = registry();
    let ada = registry.create_user("ada")?;
    let grace = registry.create_user("grace")?;
    let admin = registry.create_role("admin")?;
    let staff = registry.create_role("staff")?;
    let service = registry.register_service(Arc::new(Constant("answer", 42)))?;

    registry.assign_role(ada, admin)?;
    registry.assign_role(ada, staff)?;
    registry.assign_role(grace, admin)?;
    registry.authorize_role(admin, service, 1)?;
    registry.authorize_role(staff, service, 1)?;

    registry.remove_role(admin)?;
    assert!(!registry.has_role(admin));
    assert_eq!(registry.roles_of(ada)?, vec![staff]);
    assert!(registry.roles_of(grace)?.is_empty());
    assert_eq!(registry.authorized_roles(service)?, vec![staff]);

    registry.remove_user(ada)?;
    assert!(registry.members_of(staff)?.is_empty());

    registry.remove_service(service)?;
    assert!(registry.services_of(staff)?.is_empty());

    assert_eq!(registry.verify(), Ok(()));
    assert!(matches!(
        registry.remove_user(ada),
        Err(RolegateRegistryError::NotFound { .. })
    ));
    Ok(())
}

#[test_log::test]
fn it_does_not_leak_relations_into_reused_ids() -> anyhow::Result<()> {
    let registry = registry();
    registry.create_user("ada")?;
    let grace = registry.create_user("grace")?;
    let admin = registry.create_role("admin")?;
    registry.assign_role(grace, admin)?;

    registry.remove_user(grace)?;
    let alan = registry.create_user("alan")?;

    assert_eq!(alan, grace);
    assert!(registry.roles_of(alan)?.is_empty());
    assert!(registry.members_of(admin)?.is_empty());
    Ok(())
}

#[test_log::test]
fn it_links_entities_by_name() -> anyhow::Result<()> {
    let registry = registry();
    registry.create_user("ada")?;
    let grace = registry.create_user("grace")?;
    let admin = registry.create_role("admin")?;
    let answer = registry.register_service(Arc::new(Constant("answer", 42)))?;

    assert_eq!(registry.assign_role_by_name("grace", "admin")?, (grace, admin));
    assert!(registry.is_member_of_by_name("grace", "admin")?);
    assert!(!registry.is_member_of_by_name("ada", "admin")?);

    let right = registry.authorize_role_by_name("admin", "answer", 3)?;
    assert_eq!(right, Right::new(admin, answer, AccessType(3)));
    assert!(registry.is_authorized_for_by_name("admin", "answer")?);

    let revoked = registry.unauthorize_role_by_name("admin", "answer")?;
    assert_eq!(revoked.access_type, AccessType(3));
    assert!(!registry.is_authorized_for_by_name("admin", "answer")?);

    assert_eq!(registry.unassign_role_by_name("grace", "admin")?, (grace, admin));
    assert!(!registry.is_member_of(grace, admin)?);
    assert!(matches!(
        registry.unassign_role_by_name("grace", "staff"),
        Err(RolegateRegistryError::MissingIdentifier {
            kind: EntityKind::Role,
            ref name
        }) if name == "staff"
    ));
    assert!(matches!(
        registry.authorize_role_by_name("admin", "clock", 1),
        Err(RolegateRegistryError::MissingIdentifier {
            kind: EntityKind::Service,
            ..
        })
    ));
    assert_eq!(registry.verify(), Ok(()));
    Ok(())
}

#[test_log::test]
fn it_removes_entities_by_name() -> anyhow::Result<()> {
    let registry = registry();
    let ada = registry.create_user("ada")?;
    let admin = registry.create_role("admin")?;
    let answer = registry.register_service(Arc::new(Constant("answer", 42)))?;
    registry.assign_role(ada, admin)?;
    registry.authorize_role(admin, answer, 1)?;

    assert_eq!(registry.remove_service_by_name("answer")?, answer);
    assert!(!registry.has_service(answer));
    assert!(registry.services_of(admin)?.is_empty());

    assert_eq!(registry.remove_role_by_name("admin")?, admin);
    assert!(registry.roles_of(ada)?.is_empty());

    assert_eq!(registry.remove_user_by_name("ada")?, ada);
    assert!(registry.users().is_empty());

    assert!(matches!(
        registry.remove_user_by_name("ada"),
        Err(RolegateRegistryError::MissingIdentifier {
            kind: EntityKind::User,
            ..
        })
    ));
    assert!(matches!(
        registry.remove_role_by_name("admin"),
        Err(RolegateRegistryError::MissingIdentifier {
            kind: EntityKind::Role,
            ..
        })
    ));
    assert!(matches!(
        registry.remove_service_by_name("answer"),
        Err(RolegateRegistryError::MissingIdentifier {
            kind: EntityKind::Service,
            ..
        })
    ));
    Ok(())
}

#[test_log::test]
fn it_never_assigns_a_removed_name_to_its_successor() -> anyhow::Result<()> {
    let registry = registry();
    registry.create_user("ada")?;
    let grace = registry.create_user("grace")?;
    let admin = registry.create_role("admin")?;

    registry.remove_user_by_name("grace")?;
    let mallory = registry.create_user("mallory")?;
    assert_eq!(mallory, grace);

    assert!(matches!(
        registry.assign_role_by_name("grace", "admin"),
        Err(RolegateRegistryError::MissingIdentifier {
            kind: EntityKind::User,
            ref name
        }) if name == "grace"
    ));
    assert!(registry.roles_of(mallory)?.is_empty());
    assert!(registry.members_of(admin)?.is_empty());
    Ok(())
}

#[test_log::test]
fn it_decides_through_any_held_role() -> anyhow::Result<()> {
    let registry = registry();
    let user = registry.create_user("u")?;
    for role in 0..3 {
        registry.create_role(&format!("r{role}"))?;
    }
    for name in ["s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9"] {
        registry.register_service(Arc::new(Constant(name, 0)))?;
    }
    registry.assign_role(user, RoleId(1))?;
    registry.assign_role(user, RoleId(2))?;
    registry.authorize_role(RoleId(2), ServiceId(9), 1)?;

    assert!(registry.decide(user, ServiceId(9))?);
    assert!(!registry.decide(user, ServiceId(8))?);

    let mut monitor = registry.monitor(user, ServiceId(9));
    assert_eq!(monitor.state(), MonitorState::Idle);
    assert!(monitor.decide(&registry.snapshot())?);
    assert_eq!(monitor.state(), MonitorState::Authorized);
    assert_eq!(monitor.granted_by(), Some(RoleId(2)));
    Ok(())
}

#[test_log::test]
fn it_fails_decisions_about_missing_users() -> anyhow::Result<()> {
    let registry = registry();
    let user = registry.create_user("ada")?;
    let service = registry.register_service(Arc::new(Constant("answer", 42)))?;
    registry.remove_user(user)?;

    let error = registry.decide(user, service).unwrap_err();
    assert!(matches!(
        error,
        RolegateRegistryError::NotFound {
            kind: EntityKind::User,
            ..
        }
    ));
    assert!(!error.is_denied());
    Ok(())
}

#[test_log::test]
fn it_hands_out_distinct_monitor_ids() -> anyhow::Result<()> {
    let registry = registry();
    let first = registry.monitor(UserId(0), ServiceId(0));
    let second = registry.monitor(UserId(0), ServiceId(0));
    assert_ne!(first.id(), second.id());
    Ok(())
}

#[test_log::test]
fn it_keeps_relations_mirrored_under_concurrent_mutation() -> anyhow::Result<()> {
    let registry = Arc::new(registry());
    let users = (0..8)
        .map(|index| registry.create_user(&format!("user{index}")))
        .collect::<Result<Vec<_>, _>>()?;
    let roles = (0..8)
        .map(|index| registry.create_role(&format!("role{index}")))
        .collect::<Result<Vec<_>, _>>()?;

    let workers = users
        .iter()
        .copied()
        .map(|user| {
            let registry = registry.clone();
            let roles = roles.clone();
            std::thread::spawn(move || -> Result<(), RolegateRegistryError> {
                for role in &roles {
                    registry.assign_role(user, *role)?;
                }
                for role in roles.iter().step_by(2) {
                    registry.unassign_role(user, *role)?;
                }
                Ok(())
            })
        })
        .collect::<Vec<_>>();

    for worker in workers {
        worker
            .join()
            .map_err(|_| anyhow::anyhow!("worker panicked"))??;
    }

    assert_eq!(registry.verify(), Ok(()));
    for role in roles.iter().skip(1).step_by(2) {
        assert_eq!(registry.members_of(*role)?, users);
    }
    for role in roles.iter().step_by(2) {
        assert!(registry.members_of(*role)?.is_empty());
    }
    Ok(())
}
