mod common;

use docflow::{
    error::{DocumentStoreError, ResourceKind},
    family::{self, Family},
    lookup::{Lookup, ProvisionStatus, Provisioned},
    query::{Filter, Query},
    resource::{CollectionSpec, Throughput},
};

use common::{COLLECTION, DATABASE, Op};

fn by_last_name(last_name: &str) -> Query {
    Query::filtered(Filter::eq("lastName", last_name))
}

#[tokio::test]
async fn ensure_database_is_created_then_found() {
    let endpoint = common::endpoint();
    let provisioner = endpoint.provisioner();

    let first = provisioner.ensure_database(DATABASE).await.unwrap();
    let second = provisioner.ensure_database(DATABASE).await.unwrap();

    assert_eq!(first.status(), ProvisionStatus::Created);
    assert_eq!(second.status(), ProvisionStatus::Found);
    assert_eq!(first.resource().meta.rid, second.resource().meta.rid);
    assert_eq!(provisioner.list_databases().await.unwrap(), vec![DATABASE]);
    assert_eq!(endpoint.backend().calls(Op::CreateDatabase), 1);
}

#[tokio::test]
async fn ensure_collection_keeps_its_first_settings() {
    let endpoint = common::endpoint();
    let provisioner = endpoint.provisioner();
    provisioner.ensure_database(DATABASE).await.unwrap();

    let spec = CollectionSpec::default().with_throughput(Throughput(1000));
    let first = provisioner
        .ensure_collection(DATABASE, COLLECTION, &spec)
        .await
        .unwrap();
    let second = provisioner
        .ensure_collection(DATABASE, COLLECTION, &CollectionSpec::default())
        .await
        .unwrap();

    assert!(first.is_created());
    assert!(matches!(&second, Provisioned::Found(resource) if resource.throughput == Throughput(1000)));
    assert_eq!(provisioner.list_collections(DATABASE).await.unwrap(), vec![COLLECTION]);
}

#[tokio::test]
async fn seeded_andersen_is_the_only_match() {
    let endpoint = common::provisioned_endpoint().await;
    let families = endpoint.typed_collection::<Family>(DATABASE, COLLECTION);

    families.create_if_absent(&family::andersen()).await.unwrap();
    let matches = families
        .query(by_last_name("Andersen"), 100)
        .unwrap()
        .collect_all()
        .await
        .unwrap();

    assert_eq!(matches, vec![family::andersen()]);
}

#[tokio::test]
async fn query_skips_other_families() {
    let endpoint = common::provisioned_endpoint().await;
    let families = endpoint.typed_collection::<Family>(DATABASE, COLLECTION);

    families.create_if_absent(&family::andersen()).await.unwrap();
    families.create_if_absent(&family::wakefield()).await.unwrap();

    let matches = families
        .query(by_last_name("Andersen"), 100)
        .unwrap()
        .collect_all()
        .await
        .unwrap();

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].id, "Andersen.1");
}

#[tokio::test]
async fn create_if_absent_leaves_existing_document_alone() {
    let endpoint = common::provisioned_endpoint().await;
    let families = endpoint.typed_collection::<Family>(DATABASE, COLLECTION);
    families.create_if_absent(&family::andersen()).await.unwrap();

    let mut changed = family::andersen();
    changed.is_registered = false;
    let outcome = families.create_if_absent(&changed).await.unwrap();

    assert_eq!(outcome, Provisioned::Found(family::andersen()));
    assert_eq!(endpoint.backend().calls(Op::CreateDocument), 1);
}

#[tokio::test]
async fn replace_moves_the_child_up_a_grade() {
    let endpoint = common::provisioned_endpoint().await;
    let families = endpoint.typed_collection::<Family>(DATABASE, COLLECTION);
    families.create_if_absent(&family::andersen()).await.unwrap();

    let mut updated = family::andersen();
    updated.children[0].grade = 6;
    let stored = families.replace(&updated).await.unwrap();

    assert_eq!(stored.id, "Andersen.1");
    let Lookup::Found(read) = families.read("Andersen.1").await.unwrap() else {
        panic!("replaced document is gone");
    };
    assert_eq!(read.children[0].grade, 6);
    assert_eq!(read, updated);
}

#[tokio::test]
async fn replace_of_missing_document_is_not_found() {
    let endpoint = common::provisioned_endpoint().await;
    let families = endpoint.typed_collection::<Family>(DATABASE, COLLECTION);

    let err = families.replace(&family::wakefield()).await.unwrap_err();

    assert!(matches!(
        err,
        DocumentStoreError::NotFound { kind: ResourceKind::Document, ref id } if id == "Wakefield.7"
    ));
    assert_eq!(endpoint.backend().calls(Op::CreateDocument), 0);
}

#[tokio::test]
async fn deleted_andersen_no_longer_matches() {
    let endpoint = common::provisioned_endpoint().await;
    let families = endpoint.typed_collection::<Family>(DATABASE, COLLECTION);
    families.create_if_absent(&family::andersen()).await.unwrap();
    families.create_if_absent(&family::wakefield()).await.unwrap();

    families.delete("Andersen.1").await.unwrap();

    let mut cursor = families.query(by_last_name("Andersen"), 100).unwrap();
    let page = cursor.next_page().await.unwrap().unwrap();
    assert!(page.is_empty());
    assert!(!cursor.has_more_results());
    assert!(cursor.next_page().await.unwrap().is_none());

    assert_eq!(families.read("Andersen.1").await.unwrap(), Lookup::Absent);
    assert!(families.delete("Andersen.1").await.unwrap_err().is_not_found());
    assert!(families.read("Wakefield.7").await.unwrap().is_found());
}

#[tokio::test]
async fn deleting_the_database_removes_its_collections() {
    let endpoint = common::provisioned_endpoint().await;
    let provisioner = endpoint.provisioner();

    provisioner.delete_database(DATABASE).await.unwrap();

    assert!(provisioner.list_databases().await.unwrap().is_empty());
    assert!(matches!(
        provisioner.list_collections(DATABASE).await.unwrap_err(),
        DocumentStoreError::NotFound { kind: ResourceKind::Database, .. }
    ));
    assert!(provisioner.delete_database(DATABASE).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn query_sorts_and_filters_on_nested_fields() {
    let endpoint = common::provisioned_endpoint().await;
    let families = endpoint.typed_collection::<Family>(DATABASE, COLLECTION);
    families.create_if_absent(&family::andersen()).await.unwrap();
    families.create_if_absent(&family::wakefield()).await.unwrap();

    let washington = families
        .query(Query::filtered(Filter::eq("address.state", "WA")), 10)
        .unwrap()
        .collect_all()
        .await
        .unwrap();
    assert_eq!(washington, vec![family::andersen()]);

    let query = Query::builder()
        .filter(Filter::starts_with("address.county", ""))
        .sort("address.state", docflow::query::SortDirection::Desc)
        .build();
    let ids: Vec<String> = families
        .query(query, 1)
        .unwrap()
        .collect_all()
        .await
        .unwrap()
        .into_iter()
        .map(|family| family.id)
        .collect();
    assert_eq!(ids, vec!["Andersen.1", "Wakefield.7"]);
}
