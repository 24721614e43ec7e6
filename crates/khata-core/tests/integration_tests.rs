//! Integration tests for khata-core
//!
//! These exercise the full flow (detection, parsing, normalization, the
//! categorization cascade, persistence) through the statement processor.
//! The AI fallback uses the mock backend; the HTTP transport itself is
//! covered by the mock-server tests in the library.

use khata_core::{
    seed, AIClient, Bank, CategorizedBy, Database, Error, OllamaBackend, PaymentMode,
    StatementProcessor, StatementStatus, TxnType,
};

const HDFC_TEXT: &str = "HDFC BANK Ltd.\n\
    Statement from 01/11/2024 to 30/11/2024\n\
    Date  Narration  Withdrawal  Deposit  Balance\n\
    05/11/2024  SWIGGY ORDER  450.00    5200.00\n\
    07/11/2024  NEFT SALARY CREDIT OCT  0.00  75,000.00  80,200.00\n\
    09/11/2024  DUNZO DAILY 42  310.00    79,890.00\n\
    11/11/2024  QQWWEE 11  99.00    79,791.00\n\
    Page 1 of 1\n";

fn seeded_db() -> Database {
    let db = Database::in_memory().unwrap();
    seed::seed_all(&db).unwrap();
    db
}

#[tokio::test]
async fn test_full_pipeline_with_ai_fallback() {
    let db = seeded_db();
    let ai = AIClient::mock();
    let processor = StatementProcessor::new(&db, Some(&ai));

    let processed = processor
        .process(HDFC_TEXT, "nov.pdf", Some("user-1"))
        .await
        .unwrap();

    assert_eq!(processed.statement.status, StatementStatus::Completed);
    assert_eq!(processed.statement.bank, Some(Bank::Hdfc));
    assert_eq!(processed.inserted, 4);

    let txns = db
        .list_transactions_for_statement(processed.statement.id)
        .unwrap();
    assert_eq!(txns.len(), 4);

    // Single amount column plus balance yields a debit of that magnitude
    let swiggy = &txns[0];
    assert_eq!(swiggy.date, chrono::NaiveDate::from_ymd_opt(2024, 11, 5));
    assert_eq!(swiggy.merchant, "SWIGGY ORDER");
    assert_eq!(swiggy.amount, 450.0);
    assert_eq!(swiggy.txn_type, TxnType::Debit);
    assert_eq!(swiggy.mode, PaymentMode::Other);
    assert_eq!(swiggy.balance_after, Some(5200.0));
    assert_eq!(swiggy.categorized_by, Some(CategorizedBy::Rule));
    assert_eq!(swiggy.category.as_deref(), Some("FOOD"));

    // Income shortcut on the salary credit
    let salary = &txns[1];
    assert_eq!(salary.txn_type, TxnType::Credit);
    assert_eq!(salary.amount, 75000.0);
    assert_eq!(salary.category.as_deref(), Some("INCOME"));
    assert_eq!(salary.category_confidence, Some(0.95));

    // Unknown to the rules, classified by the AI fallback
    let dunzo = &txns[2];
    assert_eq!(dunzo.category.as_deref(), Some("GROCERIES"));
    assert_eq!(dunzo.categorized_by, Some(CategorizedBy::Ai));

    // AI answered OTHER at low confidence: kept, but not learned
    let unknown = &txns[3];
    assert_eq!(unknown.category.as_deref(), Some("OTHER"));
    assert!(db
        .find_mapping("QQWWEE 11", Some("user-1"))
        .unwrap()
        .is_none());

    // The confident AI answer was learned into the mapping store
    let learned = db
        .find_mapping("DUNZO DAILY 42", Some("user-1"))
        .unwrap()
        .unwrap();
    assert_eq!(learned.category, "GROCERIES");
}

#[tokio::test]
async fn test_statement_period_recorded() {
    let db = seeded_db();
    let processor = StatementProcessor::new(&db, None);

    let processed = processor.process(HDFC_TEXT, "nov.pdf", None).await.unwrap();
    assert_eq!(
        processed.statement.period.from,
        chrono::NaiveDate::from_ymd_opt(2024, 11, 1)
    );
    assert_eq!(
        processed.statement.period.to,
        chrono::NaiveDate::from_ymd_opt(2024, 11, 30)
    );
}

#[tokio::test]
async fn test_zero_transactions_is_recorded_as_failed() {
    let db = seeded_db();
    let processor = StatementProcessor::new(&db, None);

    let err = processor
        .process(
            "HDFC BANK Ltd.\nStatement of account\nNo entries.\n",
            "empty.pdf",
            Some("user-1"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::EmptyStatement(_)));
    assert!(err.to_string().contains("No transactions found"));

    // The upload is recorded, visibly failed, with the reason retained
    let statements = db.list_statements(Some("user-1"), 10).unwrap();
    assert_eq!(statements.len(), 1);
    assert_eq!(statements[0].status, StatementStatus::Failed);
    assert!(statements[0]
        .error_message
        .as_deref()
        .unwrap()
        .contains("No transactions found"));
}

#[tokio::test]
async fn test_duplicate_upload_rejected_with_original_date() {
    let db = seeded_db();
    let processor = StatementProcessor::new(&db, None);

    let first = processor
        .process(HDFC_TEXT, "nov.pdf", Some("user-1"))
        .await
        .unwrap();

    let err = processor
        .process(HDFC_TEXT, "nov-copy.pdf", Some("user-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
    assert!(err
        .to_string()
        .contains(&first.statement.uploaded_at.format("%Y-%m-%d").to_string()));

    // No duplicate statement record, no duplicate transactions
    let txns = db
        .list_transactions_for_statement(first.statement.id)
        .unwrap();
    assert_eq!(txns.len(), 4);
    assert_eq!(db.list_statements(Some("user-1"), 10).unwrap().len(), 1);
}

#[tokio::test]
async fn test_ai_server_down_degrades_to_uncategorized() {
    let db = seeded_db();
    // Point at a server that is not running
    let ai = AIClient::Ollama(OllamaBackend::new("http://127.0.0.1:1", "test-model"));
    let processor = StatementProcessor::new(&db, Some(&ai));

    let processed = processor
        .process(HDFC_TEXT, "nov.pdf", Some("user-1"))
        .await
        .unwrap();

    // The statement still completes; only the AI-dependent rows stay
    // uncategorized
    assert_eq!(processed.statement.status, StatementStatus::Completed);
    assert_eq!(processed.inserted, 4);
    assert_eq!(processed.uncategorized, 2);
}

#[tokio::test]
async fn test_learning_avoids_the_ai_on_the_next_statement() {
    let db = seeded_db();
    let ai = AIClient::mock();

    {
        let processor = StatementProcessor::new(&db, Some(&ai));
        processor
            .process(HDFC_TEXT, "nov.pdf", Some("user-1"))
            .await
            .unwrap();
    }

    // Same merchant in a fresh statement, processed without any AI client:
    // the learned mapping answers on the first stage
    let december = "HDFC BANK Ltd.\n\
        Statement from 01/12/2024 to 31/12/2024\n\
        03/12/2024  DUNZO DAILY 42  280.00    79,511.00\n";
    let processor = StatementProcessor::new(&db, None);
    let processed = processor
        .process(december, "dec.pdf", Some("user-1"))
        .await
        .unwrap();

    let txns = db
        .list_transactions_for_statement(processed.statement.id)
        .unwrap();
    assert_eq!(txns[0].category.as_deref(), Some("GROCERIES"));
    assert_eq!(txns[0].categorized_by, Some(CategorizedBy::Rule));
}

#[tokio::test]
async fn test_mapping_priority_across_users() {
    let db = seeded_db();
    db.save_mapping("swiggy", "FOOD", 1.0, None).unwrap();
    db.save_mapping("swiggy", "DINING", 1.0, Some("user-1")).unwrap();

    let found = db.find_mapping("swiggy", Some("user-1")).unwrap().unwrap();
    assert_eq!(found.category, "DINING");

    let found = db.find_mapping("swiggy", Some("user-2")).unwrap().unwrap();
    assert_eq!(found.category, "FOOD");
}
