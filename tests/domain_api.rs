//! Domain CRUD calls through the authenticated pipeline.

use std::sync::Arc;

use mockito::Matcher;

use ledgerline::models::{NewBudget, NewTransaction, TransactionKind, TransactionQuery};
use ledgerline::{ApiClient, Config, MemoryTokenStore, SessionHandle, TokenStore};

fn test_client(base_url: &str) -> (ApiClient, Arc<MemoryTokenStore>) {
    let store = Arc::new(MemoryTokenStore::new());
    store.set("tok-1");
    let config = Config {
        base_url: base_url.to_string(),
        request_timeout_secs: 5,
    };
    let client =
        ApiClient::new(&config, store.clone(), SessionHandle::new()).expect("build client");
    (client, store)
}

#[tokio::test]
async fn fetch_transactions_parses_wrapped_list() {
    let mut server = mockito::Server::new_async().await;
    let (client, _store) = test_client(&server.url());

    server
        .mock("GET", "/transactions")
        .match_header("authorization", "Bearer tok-1")
        .with_status(200)
        .with_body(
            r#"{"transactions":[
                {"_id":"t1","amount":12.5,"type":"expense","category":"Groceries","date":"2025-06-01T00:00:00Z","description":"weekly shop"},
                {"_id":"t2","amount":900.0,"type":"income","category":"Salary","date":"2025-06-02T00:00:00Z"}
            ]}"#,
        )
        .create_async()
        .await;

    let transactions = client.fetch_transactions().await.expect("fetch");
    assert_eq!(transactions.len(), 2);
    assert_eq!(transactions[0].kind, TransactionKind::Expense);
    assert_eq!(transactions[1].description, None);
}

#[tokio::test]
async fn filtered_fetch_sends_wire_params_and_parses_the_page() {
    let mut server = mockito::Server::new_async().await;
    let (client, _store) = test_client(&server.url());

    let mock = server
        .mock("GET", "/transactions")
        .match_header("authorization", "Bearer tok-1")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("category".into(), "Groceries".into()),
            Matcher::UrlEncoded("type".into(), "expense".into()),
            Matcher::UrlEncoded("startDate".into(), "2025-06-01".into()),
            Matcher::UrlEncoded("endDate".into(), "2025-06-30".into()),
            Matcher::UrlEncoded("page".into(), "2".into()),
            Matcher::UrlEncoded("limit".into(), "10".into()),
        ]))
        .with_status(200)
        .with_body(
            r#"{"transactions":[
                {"_id":"t3","amount":4.2,"type":"expense","category":"Groceries","date":"2025-06-14T00:00:00Z"}
            ],"total":13,"currentPage":2,"totalPages":2}"#,
        )
        .create_async()
        .await;

    let query = TransactionQuery {
        category: Some("Groceries".into()),
        kind: Some(TransactionKind::Expense),
        start_date: Some("2025-06-01".parse().expect("date")),
        end_date: Some("2025-06-30".parse().expect("date")),
        page: Some(2),
        limit: Some(10),
    };
    let page = client.fetch_transactions_with(&query).await.expect("fetch");
    assert_eq!(page.transactions.len(), 1);
    assert_eq!(page.total, 13);
    assert_eq!(page.current_page, 2);
    assert_eq!(page.total_pages, 2);
    mock.assert_async().await;
}

#[tokio::test]
async fn fetch_categories_returns_the_distinct_names() {
    let mut server = mockito::Server::new_async().await;
    let (client, _store) = test_client(&server.url());

    server
        .mock("GET", "/transactions/categories")
        .match_header("authorization", "Bearer tok-1")
        .with_status(200)
        .with_body(r#"["Groceries","Salary","Rent"]"#)
        .create_async()
        .await;

    let categories = client.fetch_categories().await.expect("categories");
    assert_eq!(categories, vec!["Groceries", "Salary", "Rent"]);
}

#[tokio::test]
async fn create_transaction_sends_wire_shape() {
    let mut server = mockito::Server::new_async().await;
    let (client, _store) = test_client(&server.url());

    let mock = server
        .mock("POST", "/transactions")
        .match_header("authorization", "Bearer tok-1")
        .match_body(Matcher::Json(serde_json::json!({
            "amount": 12.5,
            "type": "expense",
            "category": "Groceries",
            "date": "2025-06-01T00:00:00Z"
        })))
        .with_status(201)
        .create_async()
        .await;

    let transaction = NewTransaction {
        amount: 12.5,
        kind: TransactionKind::Expense,
        category: "Groceries".into(),
        date: "2025-06-01T00:00:00Z".parse().expect("date"),
        description: None,
    };
    client
        .create_transaction(&transaction)
        .await
        .expect("create");
    mock.assert_async().await;
}

#[tokio::test]
async fn update_and_delete_target_the_record_path() {
    let mut server = mockito::Server::new_async().await;
    let (client, _store) = test_client(&server.url());

    let update = server
        .mock("PUT", "/transactions/t1")
        .with_status(200)
        .create_async()
        .await;
    let delete = server
        .mock("DELETE", "/transactions/t1")
        .match_header("authorization", "Bearer tok-1")
        .with_status(200)
        .create_async()
        .await;

    let transaction = NewTransaction {
        amount: 1.0,
        kind: TransactionKind::Income,
        category: "Misc".into(),
        date: "2025-06-01T00:00:00Z".parse().expect("date"),
        description: Some("edited".into()),
    };
    client
        .update_transaction("t1", &transaction)
        .await
        .expect("update");
    client.delete_transaction("t1").await.expect("delete");

    update.assert_async().await;
    delete.assert_async().await;
}

#[tokio::test]
async fn budget_and_dashboard_round_trip() {
    let mut server = mockito::Server::new_async().await;
    let (client, _store) = test_client(&server.url());

    server
        .mock("GET", "/budget")
        .with_status(200)
        .with_body(r#"[{"_id":"b1","month":"2025-06-01T00:00:00Z","amount":1500.0}]"#)
        .create_async()
        .await;
    let set = server
        .mock("POST", "/budget")
        .match_body(Matcher::Json(serde_json::json!({
            "month": "2025-07-01T00:00:00Z",
            "amount": 1600.0
        })))
        .with_status(201)
        .create_async()
        .await;
    server
        .mock("GET", "/dashboard")
        .with_status(200)
        .with_body(
            r#"{"income":900.0,"expenses":12.5,"categoryData":[{"category":"Groceries","amount":12.5}]}"#,
        )
        .create_async()
        .await;

    let budgets = client.fetch_budgets().await.expect("budgets");
    assert_eq!(budgets.len(), 1);
    assert_eq!(budgets[0].amount, 1500.0);

    client
        .set_budget(&NewBudget {
            month: "2025-07-01T00:00:00Z".parse().expect("date"),
            amount: 1600.0,
        })
        .await
        .expect("set budget");
    set.assert_async().await;

    let dashboard = client.fetch_dashboard().await.expect("dashboard");
    assert_eq!(dashboard.income, 900.0);
    assert_eq!(dashboard.category_data.len(), 1);
    assert_eq!(dashboard.category_data[0].category, "Groceries");
}
