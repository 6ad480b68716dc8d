use nexus_events::sql::{self, Predicate};
use nexus_events::{
    CreateExample, Criteria, CriteriaConverter, CriteriaError, Either, ExampleService, ExampleStore, Filter,
    MemoryStore, Operator, Pagination, PaginatedResult, ServiceError, Sort, SortDirection,
};
use serde_json::json;

fn sample() -> Criteria {
    Criteria::new()
        .with_filter(Filter::equal("status", "error"))
        .with_filter(Filter::new("name", Operator::StartsWith, json!("order.")).unwrap())
        .with_filter(Filter::between("retryCount", 1, 4))
        .with_filter(Filter::is_null("endTime"))
        .with_sort(Sort::desc("startTime"))
        .with_sort(Sort::asc("name"))
        .with_pagination(Pagination::from_page(3, 20).unwrap())
}

#[test]
fn conversion_is_repeatable() {
    let criteria = sample();
    let first = CriteriaConverter.convert(&criteria).unwrap();
    let second = CriteriaConverter.convert(&criteria).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.limit, Some(20));
    assert_eq!(first.offset, Some(40));
    assert_eq!(first.order[0].column, "start_time");
    assert_eq!(first.order[0].direction, SortDirection::Descending);
    assert_eq!(first.order[1].direction, SortDirection::Ascending);
    assert_eq!(
        first.conditions[1],
        Predicate::Like {
            column: "name".into(),
            pattern: "order.%".into()
        }
    );
}

#[test]
fn converted_events_query_renders_against_postgres() {
    let query = CriteriaConverter.convert(&sample()).unwrap();
    let q = sql::select(nexus_events::event::events_table(), "public", &query);
    assert!(q.sql.starts_with(r#"SELECT "id", "created_at", "updated_at", "name", "start_time", "end_time", "data", "status"::text AS "status""#));
    assert!(q.sql.ends_with(
        r#"WHERE "status" = $1::"public"."event_status" AND "name" LIKE $2 AND "retry_count" BETWEEN $3::int4 AND $4::int4 AND "end_time" IS NULL ORDER BY "start_time" DESC, "name" ASC LIMIT 20 OFFSET 40"#
    ));
    assert_eq!(q.params, vec![json!("error"), json!("order.%"), json!(1), json!(4)]);
}

#[test]
fn from_page_laws() {
    for page in 1..=6u64 {
        for limit in [1u64, 3, 10, 25] {
            let p = Pagination::from_page(page, limit).unwrap();
            assert_eq!(p.skip(), (page - 1) * limit);
            assert_eq!(p.take(), limit);
            assert_eq!(p.page(), page);
        }
    }
    assert!(Pagination::from_page(0, 10).is_err());
    assert!(Pagination::from_page(1, 0).is_err());
}

#[test]
fn total_pages_is_ceiling() {
    let p = Pagination::new(7, 14).unwrap();
    for (total, pages) in [(0u64, 0u64), (1, 1), (7, 1), (8, 2), (70, 10), (71, 11)] {
        let r = PaginatedResult::<()>::new(Vec::new(), total, &p);
        assert_eq!(r.pagination.total_pages, pages);
        assert_eq!(r.pagination.page, 3);
    }
}

#[test]
fn query_params_need_page_and_limit_together() {
    let c = Criteria::from_query_params(vec![("name", json!("x")), ("page", json!(4))]).unwrap();
    assert_eq!(c.pagination, Pagination::default());
    assert_eq!(c.filters, vec![Filter::equal("name", "x")]);

    let err = Criteria::from_query_params(vec![("page", json!(0)), ("limit", json!(10))]);
    assert!(matches!(err, Err(CriteriaError::InvalidPagination(_))));
}

#[tokio::test]
async fn examples_filter_from_query_params() {
    let service = ExampleService::new(ExampleStore::new(MemoryStore::new()));
    for (name, active) in [("a", true), ("b", false), ("c", true), ("d", true)] {
        service
            .create(CreateExample {
                name: name.into(),
                description: Some(format!("{} example", name)),
                active: Some(active),
            })
            .await
            .right()
            .unwrap();
    }
    let criteria = Criteria::from_query_params(vec![
        ("active", json!("true")),
        ("page", json!(2)),
        ("limit", json!(2)),
    ])
    .unwrap()
    .with_sort(Sort::asc("name"));
    let page = service.find_many_by_criteria(&criteria).await.right().unwrap();
    assert_eq!(page.data.len(), 1);
    assert_eq!(page.data[0].name, "d");
    assert_eq!(page.pagination.total, 3);
    assert_eq!(page.pagination.total_pages, 2);

    let contains = Criteria::new().with_filter(Filter::contains("description", "b ex"));
    let page = service.find_many_by_criteria(&contains).await.right().unwrap();
    assert_eq!(page.data.len(), 1);

    let listed = service.find_active_examples().await;
    assert!(matches!(&listed, Either::Right(p) if p.pagination.total == 3 && p.pagination.total_pages == 1));

    let dup = service
        .create(CreateExample {
            name: "a".into(),
            ..Default::default()
        })
        .await;
    assert!(matches!(dup, Either::Left(ServiceError::AlreadyExists(_))));
}
