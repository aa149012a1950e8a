use futures::executor::block_on;
use rs_backoffice::{
    Actor, Ad, CollectionName, Console, ErrorKind, PermissionSet, PrincipalId, Product, RoleName,
};

fn id(value: &str) -> PrincipalId {
    PrincipalId::try_from(value).unwrap()
}

fn role(name: &str) -> RoleName {
    RoleName::try_from(name).unwrap()
}

fn perms(values: &[&str]) -> PermissionSet {
    PermissionSet::parse(values.iter().copied()).unwrap()
}

fn ad(title: &str) -> Ad {
    Ad {
        title: title.to_string(),
        category: "loader".to_string(),
        price: "900,000".to_string(),
        ..Ad::default()
    }
}

/// Console with an `admin` principal and a `supervisor` role holding
/// `ads` and `trash`, assigned to `u1`.
fn setup() -> Console {
    let console = Console::builder().build();
    console
        .provision_principal(id("admin"), "Admin", role("admin"))
        .unwrap();
    block_on(console.create_role(&id("admin"), role("supervisor"), perms(&["ads", "trash"])))
        .unwrap();
    console
        .provision_principal(id("u1"), "Supervisor", role("supervisor"))
        .unwrap();
    console
}

#[test]
fn supervisor_permissions_are_exact_tags() {
    let console = setup();

    let err = block_on(console.list_principals(&id("u1"))).expect_err("no users tag");
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    let posted = block_on(console.post_ad(&id("u1"), ad("Volvo L120"))).unwrap();
    assert_eq!(block_on(console.list_ads(&id("u1"))).unwrap()[0].id, posted.id);

    let effective = block_on(console.effective_permissions(&id("u1"))).unwrap();
    assert!(effective.contains("ads"));
    assert!(!effective.contains("ADS"));
}

#[test]
fn trashed_entity_can_be_purged_once() {
    let console = setup();
    let ads = CollectionName::ads();
    let posted = block_on(console.post_ad(&id("u1"), ad("CAT 950"))).unwrap();

    block_on(console.trash_ad(&id("u1"), &posted.id)).unwrap();
    block_on(console.purge(&id("u1"), &ads, &posted.id)).unwrap();

    let err = block_on(console.purge(&id("u1"), &ads, &posted.id)).expect_err("already gone");
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(block_on(console.list_trashed(&id("u1"), &ads)).unwrap().is_empty());
}

#[test]
fn purge_never_removes_active_entity() {
    let console = setup();
    let ads = CollectionName::ads();
    let posted = block_on(console.post_ad(&id("u1"), ad("JCB 3CX"))).unwrap();

    let err = block_on(console.purge(&id("admin"), &ads, &posted.id)).expect_err("active");
    assert_eq!(err.kind(), ErrorKind::NotTrashed);
    assert_eq!(block_on(console.list_ads(&id("admin"))).unwrap().len(), 1);
}

#[test]
fn restore_returns_entity_to_its_prior_state() {
    let console = setup();
    let ads = CollectionName::ads();
    let posted = block_on(console.post_ad(&id("u1"), ad("Hitachi ZX200"))).unwrap();

    let trashed = block_on(console.trash_ad(&id("u1"), &posted.id)).unwrap();
    assert!(trashed.is_trashed());
    assert!(block_on(console.list_ads(&id("u1"))).unwrap().is_empty());

    let restored = block_on(console.restore(&id("u1"), &ads, &posted.id)).unwrap();
    assert_eq!(restored, posted);
}

#[test]
fn blocked_principal_is_denied_even_with_all() {
    let console = setup();
    console
        .provision_principal(id("u2"), "Second admin", role("admin"))
        .unwrap();
    block_on(console.post_ad(&id("u2"), ad("Doosan DX140"))).unwrap();

    block_on(console.set_blocked(&id("admin"), &id("u2"), true)).unwrap();

    let err = block_on(console.post_ad(&id("u2"), ad("Doosan DX140"))).expect_err("blocked");
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert!(block_on(console.effective_permissions(&id("u2")))
        .unwrap()
        .is_empty());
}

#[test]
fn all_tag_grants_arbitrary_permissions() {
    let console = setup();
    let engine = console.engine();
    for tag in ["ads", "users", "backup", "some-future-panel"] {
        let decision = block_on(engine.authorize(
            &id("admin"),
            &rs_backoffice::Permission::try_from(tag).unwrap(),
        ))
        .unwrap();
        assert!(decision.is_allow(), "{tag} should be allowed");
    }
}

#[test]
fn wildcard_can_be_disabled() {
    let console = Console::builder().enable_wildcard(false).build();
    console
        .provision_principal(id("admin"), "Admin", role("admin"))
        .unwrap();
    let err = block_on(console.list_roles(&id("admin"))).expect_err("wildcard off");
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

#[test]
fn builtin_roles_are_protected_and_custom_roles_are_not() {
    let console = setup();

    for name in ["admin", "manager", "moderator", "user"] {
        let err =
            block_on(console.delete_role(&id("admin"), &role(name))).expect_err("builtin role");
        assert_eq!(err.kind(), ErrorKind::ProtectedRole);
    }

    block_on(console.create_role(&id("admin"), role("auditor"), perms(&["audit"]))).unwrap();
    block_on(console.delete_role(&id("admin"), &role("auditor"))).unwrap();
    let names: Vec<String> = block_on(console.list_roles(&id("admin")))
        .unwrap()
        .into_iter()
        .map(|role| role.name.to_string())
        .collect();
    assert!(!names.contains(&"auditor".to_string()));
}

#[test]
fn removed_role_leaves_assigned_principals_without_permissions() {
    let console = setup();
    block_on(console.delete_role(&id("admin"), &role("supervisor"))).unwrap();

    let err = block_on(console.post_ad(&id("u1"), ad("Liebherr R920"))).expect_err("dangling");
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

#[test]
fn audit_records_one_entry_per_successful_mutation() {
    let console = setup();
    let start = console.audit().len();

    let posted = block_on(console.post_ad(&id("u1"), ad("Bobcat S70"))).unwrap();
    block_on(console.trash_ad(&id("u1"), &posted.id)).unwrap();
    assert_eq!(console.audit().len(), start + 2);

    block_on(console.trash_ad(&id("u1"), &posted.id)).expect_err("already trashed");
    block_on(console.create_role(&id("u1"), role("other"), PermissionSet::new()))
        .expect_err("no roles tag");
    block_on(console.add_category(&id("admin"), "loader")).expect_err("duplicate category");
    assert_eq!(console.audit().len(), start + 2);

    let entries: Vec<_> = block_on(console.audit_log(&id("admin"))).unwrap().collect();
    assert_eq!(entries.len(), start + 2);
    assert!(entries[0].id > entries[1].id);
    assert_eq!(entries[0].actor, Actor::Principal(id("u1")));
    assert!(entries[0].action.contains("trash"));
}

#[test]
fn product_comments_follow_moderation_flow() {
    let console = setup();
    let product = block_on(console.add_product(
        &id("admin"),
        Product {
            name: "Hydraulic filter".to_string(),
            price: 350_000,
            ..Product::default()
        },
    ))
    .unwrap();

    let comment = block_on(console.submit_comment(&id("u1"), &product.id, 4, "fits PC200")).unwrap();
    block_on(console.approve_comment(&id("admin"), &comment.id)).unwrap();
    let err = block_on(console.approve_comment(&id("admin"), &comment.id)).expect_err("unchanged");
    assert_eq!(err.kind(), ErrorKind::CommentStatusUnchanged);

    let err = block_on(console.submit_comment(&id("u1"), &product.id, 9, "great")).expect_err("rating");
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[cfg(feature = "serde")]
#[test]
fn backup_survives_json_round_trip() {
    use rs_backoffice::Backup;

    let console = setup();
    let posted = block_on(console.post_ad(&id("u1"), ad("Sany SY75"))).unwrap();
    block_on(console.trash_ad(&id("u1"), &posted.id)).unwrap();

    let backup = block_on(console.backup(&id("admin"))).unwrap();
    let json = backup.to_json().unwrap();
    let parsed = Backup::from_json(&json).unwrap();

    assert_eq!(parsed, backup);
    assert_eq!(parsed.trash[0].id, posted.id);
}
