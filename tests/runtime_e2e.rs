use orgpolicy::{
    InMemoryStores, OrgError, OrgPolicyConfig, PolicyError, PolicyManager, PolicyRuntime,
    PolicySources, QueryContext,
};
use std::sync::Arc;
use std::time::Duration;

fn runtime_from_config(json: &str) -> (PolicyRuntime, InMemoryStores) {
    let config = OrgPolicyConfig::from_json_str(json).unwrap();
    let stores = InMemoryStores::demo();
    let manager = PolicyManager::with_config(PolicySources::from(&stores), config.policy).unwrap();
    let runtime = PolicyRuntime::start(manager, config.runtime).unwrap();
    (runtime, stores)
}

#[test]
fn many_submitted_queries_all_complete() {
    let (rt, _stores) = runtime_from_config(r#"{"runtime": {"workers": 4, "queueCapacity": 64}}"#);

    let handles: Vec<_> = (0..32)
        .map(|i| {
            let id = if i % 2 == 0 { "2" } else { "1" };
            (id, rt.submit(QueryContext::background().with_request_id(format!("q{i}")), id).unwrap())
        })
        .collect();

    for (id, handle) in handles {
        let managers = handle.join_timeout(Duration::from_secs(5)).unwrap();
        match id {
            "2" => assert_eq!(managers.len(), 2),
            _ => assert!(managers.is_empty()),
        }
    }
}

#[test]
fn runtime_is_shareable_across_threads() {
    let (rt, _stores) = runtime_from_config("{}");
    let rt = Arc::new(rt);

    let threads: Vec<_> = (0..8)
        .map(|_| {
            let rt = Arc::clone(&rt);
            std::thread::spawn(move || rt.first_managers(QueryContext::background(), "2"))
        })
        .collect();

    for t in threads {
        let managers = t.join().unwrap().unwrap();
        let ids: Vec<&str> = managers.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }
}

#[test]
fn edits_to_shared_stores_are_seen_by_later_queries() {
    let (rt, stores) = runtime_from_config("{}");
    assert_eq!(rt.first_managers(QueryContext::background(), "2").unwrap().len(), 2);

    assert_eq!(stores.employees.remove("3").unwrap(), 1);
    let managers = rt.first_managers(QueryContext::background(), "2").unwrap();
    assert_eq!(managers.len(), 1);
    assert_eq!(managers[0].id, "1");
}

#[test]
fn expired_deadline_is_reported_by_the_source() {
    let (rt, _stores) = runtime_from_config("{}");
    let ctx = QueryContext::background().with_timeout(Duration::ZERO);

    let err = rt.first_managers(ctx, "2").unwrap_err();
    assert!(matches!(
        err,
        OrgError::Policy(PolicyError::Source(orgpolicy::SourceError::DeadlineExceeded))
    ));
    assert!(err.is_retryable());
}

#[test]
fn custom_manager_attribute_flows_from_config() {
    let (rt, stores) = runtime_from_config(r#"{"policy": {"managerAttribute": "reportsTo"}}"#);
    assert_eq!(rt.manager().config().manager_attribute, "reportsTo");

    // The seed only sets managerPosition, which this runtime ignores.
    assert!(rt.first_managers(QueryContext::background(), "2").unwrap().is_empty());

    stores
        .attributes
        .set_property(orgpolicy::OwnerKind::Position, "2", "reportsTo", "1")
        .unwrap();
    assert_eq!(rt.first_managers(QueryContext::background(), "2").unwrap().len(), 2);
}
