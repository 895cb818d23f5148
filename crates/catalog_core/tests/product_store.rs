use catalog_core::db::open_db_in_memory;
use catalog_core::{
    compose_name, values_by_attribute, AttributeValueFilter, AttributeValueStore, Commodity,
    CommodityAttribute, CommodityRepository, OrderingResolver, Product, ProductAttributeValue,
    ProductFindOptions, ProductStore, RepoError, SqliteAttributeValueRepository,
    SqliteCommodityRepository, SqliteOrderingRepository, ValidationError,
};
use rusqlite::Connection;

const COMPANY: i64 = 1;

#[test]
fn create_respects_company_ordering() {
    let mut conn = open_db_in_memory().unwrap();
    let catalog = seed(&conn);
    set_ordering(&conn, COMPANY, &[catalog.size, catalog.color, catalog.variety]);

    let mut store = ProductStore::new(&mut conn);
    let created = store
        .create(
            &Product::new(catalog.apple, COMPANY),
            &[
                ProductAttributeValue::new(catalog.variety, "Honeycrisp"),
                ProductAttributeValue::new(catalog.color, "Red"),
                ProductAttributeValue::new(catalog.size, "Large"),
            ],
        )
        .unwrap();

    assert!(created.id > 0);
    assert!(created.visible);
    assert_eq!(created.name, "Large Red Honeycrisp Apple");
    assert_eq!(store.get(created.id).unwrap(), created);
}

#[test]
fn create_without_ordering_uses_attribute_id_fallback() {
    let mut conn = open_db_in_memory().unwrap();
    let catalog = seed(&conn);

    let mut store = ProductStore::new(&mut conn);
    let created = store
        .create(
            &Product::new(catalog.apple, COMPANY),
            &[
                ProductAttributeValue::new(catalog.size, "Medium"),
                ProductAttributeValue::new(catalog.variety, "Gala"),
                ProductAttributeValue::new(catalog.color, "Red-Yellow"),
            ],
        )
        .unwrap();

    assert_eq!(created.name, "Gala Red-Yellow Medium Apple");
}

#[test]
fn incomplete_ordering_drops_unranked_values() {
    let mut conn = open_db_in_memory().unwrap();
    let catalog = seed(&conn);
    set_ordering(&conn, COMPANY, &[catalog.color]);

    let mut store = ProductStore::new(&mut conn);
    let created = store
        .create(
            &Product::new(catalog.apple, COMPANY),
            &[
                ProductAttributeValue::new(catalog.color, "Red"),
                ProductAttributeValue::new(catalog.size, "Large"),
            ],
        )
        .unwrap();

    assert_eq!(created.name, "Red Apple");
    // The unranked value is still stored.
    assert_eq!(store.attribute_values(created.id).unwrap().len(), 2);
}

#[test]
fn created_name_matches_composer_over_stored_inputs() {
    let mut conn = open_db_in_memory().unwrap();
    let catalog = seed(&conn);
    set_ordering(&conn, COMPANY, &[catalog.variety, catalog.size]);

    let created = {
        let mut store = ProductStore::new(&mut conn);
        store
            .create(
                &Product::new(catalog.apple, COMPANY),
                &[
                    ProductAttributeValue::new(catalog.size, "Small"),
                    ProductAttributeValue::new(catalog.variety, "Fuji"),
                ],
            )
            .unwrap()
    };

    let commodity = SqliteCommodityRepository::new(&conn)
        .get_commodity(catalog.apple)
        .unwrap()
        .unwrap();
    let ordering = SqliteOrderingRepository::new(&conn).resolve(COMPANY).unwrap();
    let stored = SqliteAttributeValueRepository::new(&conn)
        .find(&AttributeValueFilter {
            product_ids: vec![created.id],
            ..AttributeValueFilter::default()
        })
        .unwrap()
        .items;
    let expected = compose_name(&commodity, &ordering, &values_by_attribute(&stored));

    let store = ProductStore::new(&mut conn);
    assert_eq!(store.get(created.id).unwrap().name, expected);
    assert_eq!(expected, "Fuji Small Apple");
}

#[test]
fn create_stamps_values_with_product_and_company() {
    let mut conn = open_db_in_memory().unwrap();
    let catalog = seed(&conn);

    let mut store = ProductStore::new(&mut conn);
    let mut stray = ProductAttributeValue::new(catalog.color, "Red");
    stray.product_id = 77;
    stray.company_id = 88;
    let created = store
        .create(&Product::new(catalog.apple, 3), &[stray])
        .unwrap();

    let rows = store.attribute_values(created.id).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].product_id, created.id);
    assert_eq!(rows[0].company_id, 3);
}

#[test]
fn create_ignores_caller_supplied_name_and_visibility() {
    let mut conn = open_db_in_memory().unwrap();
    let catalog = seed(&conn);

    let mut input = Product::new(catalog.apple, COMPANY);
    input.name = "Custom".to_string();
    input.visible = false;

    let mut store = ProductStore::new(&mut conn);
    let created = store.create(&input, &[]).unwrap();
    assert_eq!(created.name, "Apple");
    assert!(created.visible);
}

#[test]
fn create_validates_product_fields() {
    let mut conn = open_db_in_memory().unwrap();
    let catalog = seed(&conn);
    let mut store = ProductStore::new(&mut conn);

    let err = store.create(&Product::new(0, COMPANY), &[]).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::NonPositiveId {
            field: "product.commodity_id",
            ..
        })
    ));

    let err = store.create(&Product::new(catalog.apple, 0), &[]).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::NonPositiveId {
            field: "product.company_id",
            ..
        })
    ));

    let err = store
        .create(
            &Product::new(catalog.apple, COMPANY),
            &[
                ProductAttributeValue::new(catalog.color, "Red"),
                ProductAttributeValue::new(catalog.color, "Green"),
            ],
        )
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::DuplicateAttribute(_))
    ));
}

#[test]
fn create_with_unknown_commodity_is_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    seed(&conn);
    let mut store = ProductStore::new(&mut conn);

    let err = store.create(&Product::new(404, COMPANY), &[]).unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: "commodity",
            id: 404
        }
    ));
}

#[test]
fn failed_create_rolls_back_product_and_values() {
    let mut conn = open_db_in_memory().unwrap();
    let catalog = seed(&conn);

    {
        let mut store = ProductStore::new(&mut conn);
        let err = store
            .create(
                &Product::new(catalog.apple, COMPANY),
                &[
                    ProductAttributeValue::new(catalog.color, "Red"),
                    ProductAttributeValue::new(404, "Ghost"),
                ],
            )
            .unwrap_err();
        assert!(matches!(
            err,
            RepoError::NotFound {
                entity: "commodity_attribute",
                id: 404
            }
        ));
    }

    assert_eq!(count_rows(&conn, "products"), 0);
    assert_eq!(count_rows(&conn, "product_attribute_values"), 0);
}

#[test]
fn attribute_of_other_commodity_type_is_rejected_and_rolled_back() {
    let mut conn = open_db_in_memory().unwrap();
    let catalog = seed(&conn);
    let grind = SqliteCommodityRepository::new(&conn)
        .create_attribute(&CommodityAttribute::new("Grind", "coffee"))
        .unwrap();

    {
        let mut store = ProductStore::new(&mut conn);
        let err = store
            .create(
                &Product::new(catalog.apple, COMPANY),
                &[ProductAttributeValue::new(grind, "Fine")],
            )
            .unwrap_err();
        assert!(matches!(
            err,
            RepoError::Validation(ValidationError::AttributeNotApplicable { .. })
        ));
    }

    assert_eq!(count_rows(&conn, "products"), 0);
}

#[test]
fn update_without_values_keeps_rows_and_recomputes_name() {
    let mut conn = open_db_in_memory().unwrap();
    let catalog = seed(&conn);

    let created = {
        let mut store = ProductStore::new(&mut conn);
        store
            .create(
                &Product::new(catalog.apple, COMPANY),
                &[
                    ProductAttributeValue::new(catalog.color, "Red"),
                    ProductAttributeValue::new(catalog.size, "Large"),
                ],
            )
            .unwrap()
    };
    assert_eq!(created.name, "Red Large Apple");

    // Ordering changes after the last write; the next update must reflect it.
    set_ordering(&conn, COMPANY, &[catalog.size, catalog.color]);

    let mut store = ProductStore::new(&mut conn);
    let before = store.attribute_values(created.id).unwrap();
    let updated = store.update(&created, &[]).unwrap();

    assert_eq!(updated.name, "Large Red Apple");
    assert_eq!(store.get(created.id).unwrap().name, "Large Red Apple");
    assert_eq!(store.attribute_values(created.id).unwrap(), before);
}

#[test]
fn update_with_values_replaces_the_full_set() {
    let mut conn = open_db_in_memory().unwrap();
    let catalog = seed(&conn);

    let mut store = ProductStore::new(&mut conn);
    let created = store
        .create(
            &Product::new(catalog.apple, COMPANY),
            &[
                ProductAttributeValue::new(catalog.color, "Red"),
                ProductAttributeValue::new(catalog.size, "Large"),
            ],
        )
        .unwrap();
    let old_ids: Vec<i64> = store
        .attribute_values(created.id)
        .unwrap()
        .iter()
        .map(|row| row.id)
        .collect();

    let updated = store
        .update(
            &created,
            &[ProductAttributeValue::new(catalog.variety, "Granny Smith")],
        )
        .unwrap();

    assert_eq!(updated.name, "Granny Smith Apple");
    assert_eq!(store.get(created.id).unwrap().name, "Granny Smith Apple");
    let rows = store.attribute_values(created.id).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].value, "Granny Smith");
    assert!(!old_ids.contains(&rows[0].id));
}

#[test]
fn update_changes_columns_but_never_takes_caller_name() {
    let mut conn = open_db_in_memory().unwrap();
    let catalog = seed(&conn);
    let pear = SqliteCommodityRepository::new(&conn)
        .create_commodity(&Commodity::new("Pear", "fruit"))
        .unwrap();

    let mut store = ProductStore::new(&mut conn);
    let created = store
        .create(
            &Product::new(catalog.apple, COMPANY),
            &[ProductAttributeValue::new(catalog.color, "Green")],
        )
        .unwrap();

    let mut changed = created.clone();
    changed.commodity_id = pear;
    changed.name = "Hand-picked".to_string();
    let updated = store.update(&changed, &[]).unwrap();

    assert_eq!(updated.commodity_id, pear);
    assert_eq!(updated.name, "Green Pear");
    assert_eq!(store.get(created.id).unwrap(), updated);
}

#[test]
fn update_to_commodity_of_other_type_rejects_retained_values() {
    let mut conn = open_db_in_memory().unwrap();
    let catalog = seed(&conn);
    let beef = SqliteCommodityRepository::new(&conn)
        .create_commodity(&Commodity::new("Beef", "meat"))
        .unwrap();

    let mut store = ProductStore::new(&mut conn);
    let created = store
        .create(
            &Product::new(catalog.apple, COMPANY),
            &[ProductAttributeValue::new(catalog.color, "Red")],
        )
        .unwrap();

    let mut changed = created.clone();
    changed.commodity_id = beef;
    let err = store.update(&changed, &[]).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::AttributeNotApplicable { .. })
    ));

    assert_eq!(store.get(created.id).unwrap(), created);
    assert_eq!(store.attribute_values(created.id).unwrap().len(), 1);
}

#[test]
fn update_of_missing_product_is_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let catalog = seed(&conn);
    let mut store = ProductStore::new(&mut conn);

    let mut ghost = Product::new(catalog.apple, COMPANY);
    ghost.id = 404;
    let err = store.update(&ghost, &[]).unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: "product",
            id: 404
        }
    ));
}

#[test]
fn failed_update_keeps_previous_state() {
    let mut conn = open_db_in_memory().unwrap();
    let catalog = seed(&conn);

    let mut store = ProductStore::new(&mut conn);
    let created = store
        .create(
            &Product::new(catalog.apple, COMPANY),
            &[ProductAttributeValue::new(catalog.color, "Red")],
        )
        .unwrap();

    let err = store
        .update(
            &created,
            &[
                ProductAttributeValue::new(catalog.size, "Large"),
                ProductAttributeValue::new(404, "Ghost"),
            ],
        )
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound { .. }));

    assert_eq!(store.get(created.id).unwrap().name, "Red Apple");
    let rows = store.attribute_values(created.id).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].value, "Red");
}

#[test]
fn delete_hides_product_but_retains_rows() {
    let mut conn = open_db_in_memory().unwrap();
    let catalog = seed(&conn);

    let mut store = ProductStore::new(&mut conn);
    let created = store
        .create(
            &Product::new(catalog.apple, COMPANY),
            &[ProductAttributeValue::new(catalog.color, "Red")],
        )
        .unwrap();

    store.delete(created.id).unwrap();

    let visible = store
        .find(&ProductFindOptions {
            ids: vec![created.id],
            ..ProductFindOptions::default()
        })
        .unwrap();
    assert!(visible.is_empty());

    let hidden = store.get(created.id).unwrap();
    assert!(!hidden.visible);
    assert_eq!(hidden.name, "Red Apple");
    assert_eq!(store.attribute_values(created.id).unwrap().len(), 1);

    assert!(matches!(
        store.delete(404).unwrap_err(),
        RepoError::NotFound {
            entity: "product",
            id: 404
        }
    ));
}

#[test]
fn get_of_absent_product_is_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let store = ProductStore::new(&mut conn);
    assert!(matches!(
        store.get(1).unwrap_err(),
        RepoError::NotFound {
            entity: "product",
            id: 1
        }
    ));
}

#[test]
fn find_filters_by_company_ids_and_name_case_insensitively() {
    let mut conn = open_db_in_memory().unwrap();
    let catalog = seed(&conn);

    let mut store = ProductStore::new(&mut conn);
    let red = store
        .create(
            &Product::new(catalog.apple, COMPANY),
            &[ProductAttributeValue::new(catalog.color, "Red")],
        )
        .unwrap();
    let green = store
        .create(
            &Product::new(catalog.apple, COMPANY),
            &[ProductAttributeValue::new(catalog.color, "Green")],
        )
        .unwrap();
    let other_company = store
        .create(
            &Product::new(catalog.apple, 2),
            &[ProductAttributeValue::new(catalog.color, "Red")],
        )
        .unwrap();
    let discounted = store
        .create(
            &Product::new(catalog.apple, 2),
            &[ProductAttributeValue::new(catalog.color, "50%_off")],
        )
        .unwrap();
    let accented = store
        .create(
            &Product::new(catalog.apple, COMPANY),
            &[ProductAttributeValue::new(catalog.color, "Élégant")],
        )
        .unwrap();

    let ids = |products: Vec<Product>| products.into_iter().map(|p| p.id).collect::<Vec<_>>();

    let by_name = store
        .find(&ProductFindOptions {
            name_contains: Some("red APP".to_string()),
            ..ProductFindOptions::default()
        })
        .unwrap();
    assert_eq!(ids(by_name), vec![red.id, other_company.id]);

    let by_company = store
        .find(&ProductFindOptions {
            company_id: Some(COMPANY),
            ..ProductFindOptions::default()
        })
        .unwrap();
    assert_eq!(ids(by_company), vec![red.id, green.id, accented.id]);

    let anded = store
        .find(&ProductFindOptions {
            company_id: Some(2),
            ids: vec![red.id, other_company.id],
            ..ProductFindOptions::default()
        })
        .unwrap();
    assert_eq!(ids(anded), vec![other_company.id]);

    let literal = store
        .find(&ProductFindOptions {
            name_contains: Some("%_".to_string()),
            ..ProductFindOptions::default()
        })
        .unwrap();
    assert_eq!(ids(literal), vec![discounted.id]);

    let paged = store
        .find(&ProductFindOptions {
            limit: Some(2),
            offset: 1,
            ..ProductFindOptions::default()
        })
        .unwrap();
    assert_eq!(ids(paged), vec![green.id, other_company.id]);

    let folded = store
        .find(&ProductFindOptions {
            name_contains: Some("élégant".to_string()),
            ..ProductFindOptions::default()
        })
        .unwrap();
    assert_eq!(ids(folded), vec![accented.id]);

    // Only "Apple" ends each name, so a trailing space matches nothing.
    let padded = store
        .find(&ProductFindOptions {
            name_contains: Some("Apple ".to_string()),
            ..ProductFindOptions::default()
        })
        .unwrap();
    assert!(padded.is_empty());

    let paged_by_name = store
        .find(&ProductFindOptions {
            name_contains: Some("APPLE".to_string()),
            limit: Some(2),
            offset: 3,
            ..ProductFindOptions::default()
        })
        .unwrap();
    assert_eq!(ids(paged_by_name), vec![discounted.id, accented.id]);
}

#[test]
fn refresh_names_applies_new_ordering_to_every_company_product() {
    let mut conn = open_db_in_memory().unwrap();
    let catalog = seed(&conn);

    let (first, second, foreign) = {
        let mut store = ProductStore::new(&mut conn);
        let values = [
            ProductAttributeValue::new(catalog.color, "Red"),
            ProductAttributeValue::new(catalog.size, "Large"),
        ];
        let first = store
            .create(&Product::new(catalog.apple, COMPANY), &values)
            .unwrap();
        let second = store
            .create(&Product::new(catalog.apple, COMPANY), &values)
            .unwrap();
        let foreign = store
            .create(&Product::new(catalog.apple, 2), &values)
            .unwrap();
        store.delete(second.id).unwrap();
        (first, second, foreign)
    };

    set_ordering(&conn, COMPANY, &[catalog.size, catalog.color]);

    let mut store = ProductStore::new(&mut conn);
    assert_eq!(store.refresh_names(COMPANY).unwrap(), 2);
    assert_eq!(store.get(first.id).unwrap().name, "Large Red Apple");
    assert_eq!(store.get(second.id).unwrap().name, "Large Red Apple");
    assert_eq!(store.get(foreign.id).unwrap().name, "Red Large Apple");
}

struct Catalog {
    apple: i64,
    variety: i64,
    color: i64,
    size: i64,
}

/// Seeds attributes so that ids are Variety < Color < Size.
fn seed(conn: &Connection) -> Catalog {
    let repo = SqliteCommodityRepository::new(conn);
    Catalog {
        apple: repo
            .create_commodity(&Commodity::new("Apple", "fruit"))
            .unwrap(),
        variety: repo
            .create_attribute(&CommodityAttribute::new("Variety", "fruit"))
            .unwrap(),
        color: repo
            .create_attribute(&CommodityAttribute::new("Color", "fruit"))
            .unwrap(),
        size: repo
            .create_attribute(&CommodityAttribute::new("Size", "fruit"))
            .unwrap(),
    }
}

fn set_ordering(conn: &Connection, company_id: i64, attribute_ids: &[i64]) {
    SqliteOrderingRepository::new(conn)
        .set_ordering(company_id, attribute_ids)
        .unwrap();
}

fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}
