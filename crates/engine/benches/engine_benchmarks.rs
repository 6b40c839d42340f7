use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use serde_json::json;

use recordflow_authz::{
    resolve_app_capability, resolve_field_access, resolve_record_permission, AccessLevel,
    AppCapability, FieldPermissionRule, PermissionRule, Principal, RecordCapability,
    RecordPermissionRule, Target,
};
use recordflow_condition::{evaluate, Comparison, Condition, Operator};
use recordflow_core::{OrgId, Record, RoleId, RuleId, UserId};

fn sample_record() -> Record {
    serde_json::from_value(json!({
        "id": "7b2d7a1e-5c0a-7b4e-9f1a-2f6c3d4e5f60",
        "record_number": "REC-42",
        "status": "In Review",
        "data": {
            "amount": 1250,
            "department": "Finance",
            "region": "EMEA",
            "owner_email": "sam@example.com",
            "priority": "high"
        }
    }))
    .unwrap()
}

fn deep_condition(width: usize) -> Condition {
    // One OR over ANDs, each AND mixing numeric, string, and set comparisons.
    let branches = (0..width)
        .map(|i| {
            Condition::all(vec![
                Condition::leaf("amount", Operator::Gt, json!(i * 100)),
                Condition::leaf("department", Operator::Eq, json!("Finance")),
                Condition::Leaf(Comparison::with_values(
                    "region",
                    Operator::In,
                    vec![json!("EMEA"), json!("APAC")],
                )),
            ])
        })
        .collect();
    Condition::any(branches)
}

fn rule_set(count: usize, principal: &Principal) -> Vec<PermissionRule> {
    (0..count)
        .map(|i| {
            let target = match i % 4 {
                0 => Target::Everyone,
                1 => Target::User(principal.user_id),
                2 => Target::Role(RoleId::new()),
                _ => Target::Organization(OrgId::new()),
            };
            PermissionRule {
                id: RuleId::new(),
                target,
                priority: i as i64,
                capability: AppCapability {
                    can_view: true,
                    can_add: i % 2 == 0,
                    can_edit: i % 3 == 0,
                    ..AppCapability::default()
                },
                is_active: true,
            }
        })
        .collect()
}

fn bench_condition_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("condition_evaluation");
    group.throughput(Throughput::Elements(1));
    let record = sample_record();

    for width in [1usize, 8, 64].iter() {
        let condition = deep_condition(*width);
        group.bench_with_input(BenchmarkId::new("or_of_ands", width), width, |b, _| {
            b.iter(|| black_box(evaluate(Some(&condition), black_box(&record))));
        });
    }

    group.finish();
}

fn bench_capability_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("capability_aggregation");
    group.sample_size(1000);

    let principal = Principal::new(UserId::new())
        .with_role(RoleId::new())
        .with_org(OrgId::new());

    for count in [4usize, 32, 256].iter() {
        let rules = rule_set(*count, &principal);
        group.bench_with_input(BenchmarkId::new("app_union", count), count, |b, _| {
            b.iter(|| black_box(resolve_app_capability(black_box(&principal), &rules)));
        });
    }

    group.finish();
}

fn bench_field_access_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("field_access_resolution");

    let principal = Principal::new(UserId::new()).with_role(RoleId::new());
    let fields = ["salary", "amount", "department", "owner_email"];
    let rules: Vec<FieldPermissionRule> = (0..64)
        .map(|i| FieldPermissionRule {
            id: RuleId::new(),
            field_name: fields[i % fields.len()].to_string(),
            target: if i % 2 == 0 {
                Target::Everyone
            } else {
                Target::Role(RoleId::new())
            },
            access_level: match i % 3 {
                0 => AccessLevel::View,
                1 => AccessLevel::Edit,
                _ => AccessLevel::Hidden,
            },
            priority: (i % 10) as i64,
            is_active: true,
        })
        .collect();

    group.bench_function("first_match_64_rules", |b| {
        b.iter(|| {
            black_box(resolve_field_access(
                black_box("salary"),
                &principal,
                &rules,
            ))
        });
    });

    group.finish();
}

fn bench_record_permission(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_permission");

    let principal = Principal::new(UserId::new());
    let record = sample_record();
    let rules: Vec<RecordPermissionRule> = (0..32)
        .map(|i| RecordPermissionRule {
            id: RuleId::new(),
            condition: Some(Condition::leaf(
                "priority",
                Operator::Eq,
                json!(if i == 31 { "high" } else { "low" }),
            )),
            target: Target::Everyone,
            priority: i as i64,
            capability: RecordCapability::new(true, i % 2 == 0, false),
            is_active: true,
        })
        .collect();

    group.bench_function("conditional_first_match", |b| {
        b.iter(|| {
            black_box(resolve_record_permission(
                black_box(&record),
                &principal,
                &rules,
            ))
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_condition_evaluation,
    bench_capability_aggregation,
    bench_field_access_resolution,
    bench_record_permission
);
criterion_main!(benches);
