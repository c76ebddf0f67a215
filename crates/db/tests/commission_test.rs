//! Commission engine tests.

mod common;

use common::{seed_plan, setup_db};
use mizan_core::commission::{
    Beneficiary, BeneficiaryType, CommissionError, CommissionFilter, CommissionRule,
    CommissionStatus, CreatePlanInput, TriggerContext,
};
use mizan_db::CommissionRepository;
use mizan_shared::{EntityId, PageRequest};

fn store_context(store: EntityId, order: Option<&str>) -> TriggerContext {
    TriggerContext {
        source_order_id: order.map(str::to_string),
        beneficiaries: vec![Beneficiary {
            id: store,
            beneficiary_type: BeneficiaryType::Store,
        }],
    }
}

#[tokio::test]
async fn test_store_approved_creates_one_commission_once() {
    let db = setup_db().await;
    let repo = CommissionRepository::new(db.clone());
    seed_plan(&repo, "store_approved", 1_000).await;
    let store = EntityId::new();

    let first = repo
        .evaluate_trigger("store_approved", &store_context(store, Some("ORD-1")))
        .await
        .unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].amount, 1_000);
    assert_eq!(first[0].status, CommissionStatus::Pending);
    assert_eq!(first[0].beneficiary_id, store);

    let replay = repo
        .evaluate_trigger("store_approved", &store_context(store, Some("ORD-1")))
        .await
        .unwrap();
    assert!(replay.is_empty());

    let all = repo
        .list_commissions(&CommissionFilter::default(), &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(all.meta.total, 1);
}

#[tokio::test]
async fn test_distinct_orders_each_pay() {
    let db = setup_db().await;
    let repo = CommissionRepository::new(db.clone());
    seed_plan(&repo, "order_delivered", 250).await;
    let store = EntityId::new();

    for order in ["ORD-1", "ORD-2"] {
        let created = repo
            .evaluate_trigger("order_delivered", &store_context(store, Some(order)))
            .await
            .unwrap();
        assert_eq!(created.len(), 1);
    }

    // No order id: keyed by event and beneficiary alone.
    assert_eq!(
        repo.evaluate_trigger("order_delivered", &store_context(store, None))
            .await
            .unwrap()
            .len(),
        1
    );
    assert!(
        repo.evaluate_trigger("order_delivered", &store_context(store, None))
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_rule_scoped_to_beneficiary_type() {
    let db = setup_db().await;
    let repo = CommissionRepository::new(db.clone());
    repo.create_plan(CreatePlanInput {
        name: "Driver bonus".to_string(),
        active: true,
        rules: vec![CommissionRule {
            trigger: "order_delivered".to_string(),
            amount: 300,
            beneficiary_type: Some(BeneficiaryType::Driver),
        }],
    })
    .await
    .unwrap();

    let driver = EntityId::new();
    let store = EntityId::new();
    let created = repo
        .evaluate_trigger(
            "order_delivered",
            &TriggerContext {
                source_order_id: Some("ORD-9".to_string()),
                beneficiaries: vec![
                    Beneficiary {
                        id: driver,
                        beneficiary_type: BeneficiaryType::Driver,
                    },
                    Beneficiary {
                        id: store,
                        beneficiary_type: BeneficiaryType::Store,
                    },
                ],
            },
        )
        .await
        .unwrap();

    assert_eq!(created.len(), 1);
    assert_eq!(created[0].beneficiary_id, driver);
    assert_eq!(created[0].beneficiary_type, BeneficiaryType::Driver);
}

#[tokio::test]
async fn test_inactive_plan_pays_nothing() {
    let db = setup_db().await;
    let repo = CommissionRepository::new(db.clone());
    let plan = repo
        .create_plan(CreatePlanInput {
            name: "Paused".to_string(),
            active: true,
            rules: vec![CommissionRule {
                trigger: "store_approved".to_string(),
                amount: 1_000,
                beneficiary_type: None,
            }],
        })
        .await
        .unwrap();
    let paused = repo.set_plan_active(plan.id, false).await.unwrap();
    assert!(!paused.active);

    let created = repo
        .evaluate_trigger("store_approved", &store_context(EntityId::new(), Some("ORD-1")))
        .await
        .unwrap();
    assert!(created.is_empty());
}

#[tokio::test]
async fn test_duplicate_rule_trigger_rejected() {
    let db = setup_db().await;
    let repo = CommissionRepository::new(db.clone());
    let rule = CommissionRule {
        trigger: "store_approved".to_string(),
        amount: 1_000,
        beneficiary_type: None,
    };

    let result = repo
        .create_plan(CreatePlanInput {
            name: "Twice".to_string(),
            active: true,
            rules: vec![rule.clone(), rule],
        })
        .await;
    assert!(matches!(result, Err(CommissionError::DuplicateRuleTrigger(_))));
    assert!(repo.list_plans().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_lifecycle_transitions() {
    let db = setup_db().await;
    let repo = CommissionRepository::new(db.clone());
    seed_plan(&repo, "store_approved", 1_000).await;

    let created = repo
        .evaluate_trigger("store_approved", &store_context(EntityId::new(), Some("ORD-1")))
        .await
        .unwrap();
    let id = created[0].id;

    let approved = repo.approve(id).await.unwrap();
    assert_eq!(approved.status, CommissionStatus::Approved);
    assert!(matches!(
        repo.approve(id).await,
        Err(CommissionError::InvalidTransition { .. })
    ));

    let cancelled = repo.cancel(id).await.unwrap();
    assert_eq!(cancelled.status, CommissionStatus::Cancelled);
    assert!(matches!(
        repo.cancel(id).await,
        Err(CommissionError::InvalidTransition { .. })
    ));

    let filtered = repo
        .list_commissions(
            &CommissionFilter {
                status: Some(CommissionStatus::Cancelled),
                ..CommissionFilter::default()
            },
            &PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(filtered.data.len(), 1);
}

#[tokio::test]
async fn test_unknown_commission_not_found() {
    let db = setup_db().await;
    let repo = CommissionRepository::new(db.clone());
    let id = mizan_shared::CommissionId::new();
    assert!(matches!(
        repo.approve(id).await,
        Err(CommissionError::CommissionNotFound(missing)) if missing == id
    ));
}
