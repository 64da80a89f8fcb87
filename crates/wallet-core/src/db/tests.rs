//! Database tests

use super::*;
use crate::models::*;
use chrono::NaiveDate;
use std::str::FromStr;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, s)
        .unwrap()
}

fn march() -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 3, 1).unwrap()
}

/// A database with one user owning one account
fn setup() -> (Database, i64, i64) {
    let db = Database::in_memory().unwrap();
    let user = db.create_user("alice", "hash").unwrap();
    let account = db.create_account(user.id, "Card").unwrap();
    (db, user.id, account.id)
}

fn new_op(account_id: i64, category_id: i64, amount: &str, ty: OperationType, ts: NaiveDateTime) -> NewOperation {
    NewOperation {
        account_id,
        category_id,
        amount: dec(amount),
        description: String::new(),
        operation_type: ty,
        created_on: ts,
    }
}

fn operation_count(db: &Database) -> i64 {
    db.conn()
        .unwrap()
        .query_row("SELECT COUNT(*) FROM operations", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn test_in_memory_db() {
    let db = Database::in_memory().unwrap();
    assert!(db.list_users().unwrap().is_empty());
}

#[test]
fn test_foreign_keys_enabled() {
    let db = Database::in_memory().unwrap();
    let enabled: i64 = db
        .conn()
        .unwrap()
        .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);
}

#[test]
fn test_user_registration() {
    let db = Database::in_memory().unwrap();
    let user = db.create_user("alice", "hash").unwrap();
    assert!(user.id > 0);
    assert_eq!(user.login, "alice");

    let found = db.get_user_by_login("alice").unwrap().unwrap();
    assert_eq!(found.id, user.id);
    assert_eq!(found.password_hash, "hash");
    assert!(db.get_user_by_login("bob").unwrap().is_none());
    assert!(db.get_user(user.id).unwrap().is_some());

    let err = db.create_user("alice", "other").unwrap_err();
    assert!(matches!(err, Error::AlreadyExists { entity: "User", .. }));
}

#[test]
fn test_duplicate_account_name_per_user() {
    let (db, user_id, _) = setup();
    let bob = db.create_user("bob", "hash").unwrap();

    let err = db.create_account(user_id, "Card").unwrap_err();
    assert!(matches!(err, Error::AlreadyExists { entity: "Account", .. }));

    // Same name for another user is fine
    let account = db.create_account(bob.id, "Card").unwrap();
    assert_eq!(account.user_id, bob.id);
}

#[test]
fn test_account_crud() {
    let (db, user_id, account_id) = setup();
    db.create_account(user_id, "Cash").unwrap();

    let accounts = db.list_accounts(user_id).unwrap();
    let names: Vec<&str> = accounts.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["Card", "Cash"]);

    db.rename_account(user_id, account_id, "Debit card").unwrap();
    assert_eq!(
        db.get_account(user_id, account_id).unwrap().unwrap().name,
        "Debit card"
    );

    let err = db.rename_account(user_id, account_id, "Cash").unwrap_err();
    assert!(matches!(err, Error::AlreadyExists { .. }));

    db.delete_account(user_id, account_id).unwrap();
    assert!(db.get_account(user_id, account_id).unwrap().is_none());
    assert!(matches!(
        db.delete_account(user_id, account_id),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn test_cross_user_access_is_not_found() {
    let (db, user_id, account_id) = setup();
    let bob = db.create_user("bob", "hash").unwrap();
    let category = db
        .create_category(user_id, "Food", OperationType::Expense)
        .unwrap();
    let op = db
        .add_operation(
            user_id,
            &new_op(account_id, category.id, "10", OperationType::Expense, at(2021, 3, 1, 10, 0, 0)),
        )
        .unwrap();

    assert!(db.get_account(bob.id, account_id).unwrap().is_none());
    assert!(db.get_category(bob.id, category.id).unwrap().is_none());
    assert!(db.get_operation(bob.id, op.id).unwrap().is_none());
    assert!(matches!(
        db.account_balance(bob.id, account_id, march()),
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        db.rename_account(bob.id, account_id, "Mine"),
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        db.update_operation_description(bob.id, op.id, "Mine"),
        Err(Error::NotFound(_))
    ));
    assert!(db
        .list_operations(bob.id, &OperationFilter::default())
        .unwrap()
        .is_empty());
}

#[test]
fn test_category_crud() {
    let (db, user_id, _) = setup();

    let food = db
        .create_category(user_id, "Food", OperationType::Expense)
        .unwrap();
    assert_eq!(food.category_type, OperationType::Expense);

    let err = db
        .create_category(user_id, "Food", OperationType::Income)
        .unwrap_err();
    assert!(matches!(err, Error::AlreadyExists { entity: "Category", .. }));

    db.update_category(user_id, food.id, "Groceries", OperationType::Expense)
        .unwrap();
    let updated = db.require_category(user_id, food.id).unwrap();
    assert_eq!(updated.name, "Groceries");

    db.create_category(user_id, "Salary", OperationType::Income)
        .unwrap();
    assert_eq!(db.list_categories(user_id).unwrap().len(), 2);

    db.delete_category(user_id, food.id).unwrap();
    assert!(db.get_category(user_id, food.id).unwrap().is_none());
}

#[test]
fn test_add_operation_validates_ownership() {
    let (db, user_id, account_id) = setup();
    let bob = db.create_user("bob", "hash").unwrap();
    let bobs_category = db
        .create_category(bob.id, "Fun", OperationType::Expense)
        .unwrap();
    let ts = at(2021, 3, 1, 10, 0, 0);

    let err = db
        .add_operation(user_id, &new_op(account_id, bobs_category.id, "1", OperationType::Expense, ts))
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    let err = db
        .add_operation(bob.id, &new_op(account_id, bobs_category.id, "1", OperationType::Expense, ts))
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    assert_eq!(operation_count(&db), 0);
}

#[test]
fn test_add_operation_rejects_negative_amount() {
    let (db, user_id, account_id) = setup();
    let category = db
        .create_category(user_id, "Food", OperationType::Expense)
        .unwrap();

    let err = db
        .add_operation(
            user_id,
            &new_op(account_id, category.id, "-5", OperationType::Expense, at(2021, 3, 1, 10, 0, 0)),
        )
        .unwrap_err();
    assert!(matches!(err, Error::InvalidData(_)));
}

#[test]
fn test_add_and_get_operation() {
    let (db, user_id, account_id) = setup();
    let category = db
        .create_category(user_id, "Food", OperationType::Expense)
        .unwrap();

    let mut new = new_op(account_id, category.id, "150.50", OperationType::Expense, at(2021, 3, 1, 10, 0, 0));
    new.description = "Lunch".into();
    let created = db.add_operation(user_id, &new).unwrap();

    let fetched = db.require_operation(user_id, created.id).unwrap();
    assert_eq!(fetched, created);
    assert_eq!(fetched.amount, dec("150.50"));
    assert_eq!(fetched.category.name, "Food");
}

#[test]
fn test_list_operations_filters_and_order() {
    let (db, user_id, card) = setup();
    let cash = db.create_account(user_id, "Cash").unwrap().id;
    let food = db
        .create_category(user_id, "Food", OperationType::Expense)
        .unwrap()
        .id;
    let salary = db
        .create_category(user_id, "Salary", OperationType::Income)
        .unwrap()
        .id;

    let feb = db
        .add_operation(user_id, &new_op(card, food, "1", OperationType::Expense, at(2021, 2, 28, 9, 0, 0)))
        .unwrap();
    let mar1 = db
        .add_operation(user_id, &new_op(card, salary, "100", OperationType::Income, at(2021, 3, 1, 9, 0, 0)))
        .unwrap();
    let mar2 = db
        .add_operation(user_id, &new_op(cash, food, "2", OperationType::Expense, at(2021, 3, 1, 9, 0, 0)))
        .unwrap();

    let all = db.list_operations(user_id, &OperationFilter::default()).unwrap();
    let ids: Vec<i64> = all.iter().map(|o| o.id).collect();
    // Same timestamp breaks ties by id, newest first
    assert_eq!(ids, vec![mar2.id, mar1.id, feb.id]);

    let by_account = db
        .list_operations(
            user_id,
            &OperationFilter {
                account_id: Some(card),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(by_account.len(), 2);

    let by_category = db
        .list_operations(
            user_id,
            &OperationFilter {
                category_id: Some(food),
                month: Some(march()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(by_category.len(), 1);
    assert_eq!(by_category[0].id, mar2.id);

    let paged = db
        .list_operations(
            user_id,
            &OperationFilter {
                limit: 1,
                offset: 1,
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(paged.len(), 1);
    assert_eq!(paged[0].id, mar1.id);

    // Zero or negative limits are clamped to one row
    let clamped = db
        .list_operations(
            user_id,
            &OperationFilter {
                limit: 0,
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(clamped.len(), 1);
}

#[test]
fn test_update_description_and_delete_operation() {
    let (db, user_id, account_id) = setup();
    let food = db
        .create_category(user_id, "Food", OperationType::Expense)
        .unwrap();
    let op = db
        .add_operation(user_id, &new_op(account_id, food.id, "3", OperationType::Expense, at(2021, 3, 2, 0, 0, 0)))
        .unwrap();

    db.update_operation_description(user_id, op.id, "Coffee").unwrap();
    let updated = db.require_operation(user_id, op.id).unwrap();
    assert_eq!(updated.description, "Coffee");
    assert_eq!(updated.amount, op.amount);

    db.delete_operation(user_id, op.id).unwrap();
    assert!(db.get_operation(user_id, op.id).unwrap().is_none());
    // Removing an operation leaves its category and account alone
    assert!(db.get_category(user_id, food.id).unwrap().is_some());
    assert!(db.get_account(user_id, account_id).unwrap().is_some());
}

#[test]
fn test_delete_cascades_to_operations() {
    let (db, user_id, account_id) = setup();
    let other = db.create_account(user_id, "Cash").unwrap().id;
    let food = db
        .create_category(user_id, "Food", OperationType::Expense)
        .unwrap()
        .id;
    let gifts = db
        .create_category(user_id, "Gifts", OperationType::Income)
        .unwrap()
        .id;
    let ts = at(2021, 3, 3, 0, 0, 0);

    db.add_operation(user_id, &new_op(account_id, food, "1", OperationType::Expense, ts))
        .unwrap();
    db.add_operation(user_id, &new_op(other, food, "1", OperationType::Expense, ts))
        .unwrap();
    db.add_operation(user_id, &new_op(other, gifts, "1", OperationType::Income, ts))
        .unwrap();
    assert_eq!(operation_count(&db), 3);

    db.delete_account(user_id, account_id).unwrap();
    assert_eq!(operation_count(&db), 2);

    db.delete_category(user_id, food).unwrap();
    assert_eq!(operation_count(&db), 1);
}

#[test]
fn test_empty_month_balance_is_zero() {
    let (db, user_id, account_id) = setup();
    let balance = db.account_balance(user_id, account_id, march()).unwrap();
    assert_eq!(balance, Balance::empty(march()));
}

#[test]
fn test_month_balance_window() {
    let (db, user_id, account_id) = setup();
    let food = db
        .create_category(user_id, "Food", OperationType::Expense)
        .unwrap()
        .id;
    let salary = db
        .create_category(user_id, "Salary", OperationType::Income)
        .unwrap()
        .id;

    let ops = [
        (salary, "1000", OperationType::Income, at(2021, 3, 1, 0, 0, 0)),
        (food, "150.50", OperationType::Expense, at(2021, 3, 15, 12, 0, 0)),
        (food, "49.50", OperationType::Expense, at(2021, 3, 31, 23, 59, 59)),
        // Outside March on both sides
        (food, "999", OperationType::Expense, at(2021, 2, 28, 23, 59, 59)),
        (salary, "999", OperationType::Income, at(2021, 4, 1, 0, 0, 0)),
    ];
    for (category, amount, ty, ts) in ops {
        db.add_operation(user_id, &new_op(account_id, category, amount, ty, ts))
            .unwrap();
    }

    let balance = db.account_balance(user_id, account_id, march()).unwrap();
    assert_eq!(balance.incomes, dec("1000"));
    assert_eq!(balance.expenses, dec("200.00"));
    assert_eq!(balance.rest, dec("800"));

    let history = db.account_balances(user_id, account_id).unwrap();
    let months: Vec<u32> = history.iter().map(|b| chrono::Datelike::month(&b.month)).collect();
    assert_eq!(months, vec![4, 3, 2]);
    assert_eq!(history[1], balance);
}

#[test]
fn test_import_creates_named_category() {
    let (db, user_id, account_id) = setup();

    let report = db
        .import_operations(user_id, account_id, "01.03.2021 10:00:00,-150.50,Food,Lunch")
        .unwrap();

    assert!(report.skipped.is_empty());
    assert_eq!(report.operations.len(), 1);

    let op = &report.operations[0];
    assert_eq!(op.amount, dec("150.50"));
    assert_eq!(op.operation_type, OperationType::Expense);
    assert_eq!(op.created_on, at(2021, 3, 1, 10, 0, 0));
    assert_eq!(op.category.name, "Food");
    assert_eq!(op.category.category_type, OperationType::Expense);

    let categories = db.list_categories(user_id).unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(db.require_operation(user_id, op.id).unwrap(), *op);
}

#[test]
fn test_import_by_category_key() {
    let (db, user_id, account_id) = setup();
    let salary = db
        .create_category(user_id, "Salary", OperationType::Income)
        .unwrap();

    let data = format!("2021-03-01T10:00:00,1000,{},Salary", salary.id);
    let report = db.import_operations(user_id, account_id, &data).unwrap();

    assert_eq!(report.operations.len(), 1);
    assert_eq!(report.operations[0].operation_type, OperationType::Income);
    assert_eq!(report.operations[0].category.id, salary.id);
    assert_eq!(db.list_categories(user_id).unwrap().len(), 1);
}

#[test]
fn test_import_foreign_key_commits_nothing() {
    let (db, user_id, account_id) = setup();
    let bob = db.create_user("bob", "hash").unwrap();
    let bobs = db
        .create_category(bob.id, "Bob's", OperationType::Expense)
        .unwrap();

    let data = format!(
        "01.03.2021 10:00:00,-1,NewCategory,x\n01.03.2021 10:00:00,-1,{},y\n01.03.2021 10:00:00,-1,424242,z",
        bobs.id
    );
    let err = db.import_operations(user_id, account_id, &data).unwrap_err();

    match err {
        Error::UnprocessableOperations {
            user_id: uid,
            account,
            category_keys,
        } => {
            assert_eq!(uid, user_id);
            assert_eq!(account, None);
            assert_eq!(category_keys, vec![bobs.id, 424242]);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(operation_count(&db), 0);
    assert!(db.list_categories(user_id).unwrap().is_empty());
}

#[test]
fn test_import_skips_malformed_rows() {
    let (db, user_id, account_id) = setup();

    let data = "garbage row\n01.03.2021 10:00:00,-20,Food,Dinner";
    let report = db.import_operations(user_id, account_id, data).unwrap();

    assert_eq!(report.operations.len(), 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].row, 1);
    assert_eq!(operation_count(&db), 1);
}

#[test]
fn test_import_reuses_names_and_keeps_input_order() {
    let (db, user_id, account_id) = setup();
    let food = db
        .create_category(user_id, "Food", OperationType::Expense)
        .unwrap();

    let data = "\
01.03.2021 10:00:00,500,Gifts,Birthday
01.03.2021 11:00:00,-10,Food,Lunch
01.03.2021 12:00:00,-5,Gifts,Card
01.03.2021 13:00:00,-7,food,Lowercase is a different name";
    let report = db.import_operations(user_id, account_id, data).unwrap();

    let descriptions: Vec<&str> = report
        .operations
        .iter()
        .map(|o| o.description.as_str())
        .collect();
    assert_eq!(
        descriptions,
        vec!["Birthday", "Lunch", "Card", "Lowercase is a different name"]
    );

    assert_eq!(report.operations[1].category.id, food.id);
    // Gifts was first seen as income, so it is created as an income category
    assert_eq!(report.operations[0].category.category_type, OperationType::Income);
    assert_eq!(report.operations[0].category.id, report.operations[2].category.id);

    let names: Vec<String> = db
        .list_categories(user_id)
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["Food", "Gifts", "food"]);
}

#[test]
fn test_import_empty_input() {
    let (db, user_id, account_id) = setup();
    let report = db.import_operations(user_id, account_id, "").unwrap();
    assert!(report.operations.is_empty());
    assert!(report.skipped.is_empty());
}

#[test]
fn test_import_into_foreign_account() {
    let (db, _, account_id) = setup();
    let bob = db.create_user("bob", "hash").unwrap();

    let err = db
        .import_operations(bob.id, account_id, "01.03.2021 10:00:00,-1,Food,x")
        .unwrap_err();
    match err {
        Error::UnprocessableOperations {
            account,
            category_keys,
            ..
        } => {
            assert_eq!(account, Some(account_id));
            assert!(category_keys.is_empty());
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(db.list_categories(bob.id).unwrap().is_empty());
    assert_eq!(operation_count(&db), 0);
}

#[test]
fn test_import_into_deleted_account() {
    let (db, user_id, account_id) = setup();
    db.delete_account(user_id, account_id).unwrap();

    let err = db
        .import_operations(user_id, account_id, "01.03.2021 10:00:00,-1,Food,x")
        .unwrap_err();
    assert!(matches!(
        err,
        Error::UnprocessableOperations { account: Some(id), .. } if id == account_id
    ));
    assert!(db.list_categories(user_id).unwrap().is_empty());
}

#[test]
fn test_import_many_distinct_category_names() {
    let (db, user_id, account_id) = setup();
    let existing = db
        .create_category(user_id, "category-20000", OperationType::Expense)
        .unwrap();

    let data: String = (0..33_500)
        .map(|i| format!("01.03.2021 10:00:00,-1,category-{},op {}\n", i, i))
        .collect();
    assert!(data.len() < crate::import::MAX_IMPORT_SIZE);

    let report = db.import_operations(user_id, account_id, &data).unwrap();
    assert_eq!(report.operations.len(), 33_500);
    assert!(report.skipped.is_empty());
    assert_eq!(report.operations[20_000].category.id, existing.id);
    assert_eq!(db.list_categories(user_id).unwrap().len(), 33_500);
}

#[test]
fn test_import_skips_overlong_category_name() {
    let (db, user_id, account_id) = setup();
    let data = format!(
        "01.03.2021 10:00:00,-1,{},too long\n01.03.2021 10:00:00,-1,Food,ok",
        "n".repeat(300)
    );

    let report = db.import_operations(user_id, account_id, &data).unwrap();
    assert_eq!(report.operations.len(), 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].row, 1);

    let categories = db.list_categories(user_id).unwrap();
    assert_eq!(categories.len(), 1);
    assert!(categories
        .iter()
        .all(|c| c.name.chars().count() <= MAX_NAME_LEN));
}

#[test]
fn test_overflowing_balance_is_an_error() {
    let (db, user_id, account_id) = setup();
    let data = "\
01.03.2021 10:00:00,79228162514264337593543950335,Salary,a
01.03.2021 11:00:00,79228162514264337593543950335,Salary,b";
    db.import_operations(user_id, account_id, data).unwrap();

    let err = db.account_balance(user_id, account_id, march()).unwrap_err();
    assert!(matches!(err, Error::InvalidData(_)));
    assert!(matches!(
        db.account_balances(user_id, account_id),
        Err(Error::InvalidData(_))
    ));
}

#[test]
fn test_import_rejects_oversized_input() {
    let (db, user_id, account_id) = setup();
    let data = "x".repeat(crate::import::MAX_IMPORT_SIZE + 1);
    let err = db.import_operations(user_id, account_id, &data).unwrap_err();
    assert!(matches!(err, Error::InvalidData(_)));
}
