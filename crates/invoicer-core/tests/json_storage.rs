use std::sync::Arc;
use std::thread;

use invoicer_core::{
    AuditTrail, Client, Invoice, InvoiceStatus, InvoicerError, JsonStorage, LineItem, Storage,
};
use rust_decimal_macros::dec;
use tempfile::{tempdir, TempDir};
use uuid::Uuid;

fn open_store() -> (TempDir, JsonStorage) {
    let dir = tempdir().expect("tempdir should be created");
    let storage = JsonStorage::open(dir.path().join("data")).expect("open should succeed");
    (dir, storage)
}

fn client(name: &str) -> Client {
    Client::new(
        name,
        "1 Main St",
        vec![format!("billing@{}.com", name.to_lowercase())],
        dec!(100.00),
    )
    .expect("client should be valid")
}

#[test]
fn test_invoice_round_trip_is_deep_equal() {
    let (_dir, storage) = open_store();
    let acme = client("Acme");
    let mut invoice = Invoice::for_client(&acme, "2024-01");
    invoice.add_line_item(LineItem::new("Consulting", dec!(10), dec!(150.00)).unwrap()).unwrap();
    invoice.add_line_item(LineItem::new("Widget", dec!(3), dec!(49.99)).unwrap()).unwrap();
    invoice.set_discount_rate(dec!(10)).unwrap();
    invoice.set_tax_rate(dec!(8.25)).unwrap();

    storage.save_invoice(&invoice).unwrap();
    let loaded = storage.get_invoice(invoice.id()).unwrap();
    assert_eq!(loaded, invoice);

    let mut modified = loaded;
    modified.set_tax_rate(dec!(5)).unwrap();
    storage.update_invoice(&modified).unwrap();

    let reloaded = storage.get_invoice(invoice.id()).unwrap();
    assert_eq!(reloaded, modified);
    assert_eq!(reloaded.tax_rate(), dec!(5));
    assert_eq!(storage.get_invoice_by_number("2024-01").unwrap(), modified);
}

#[test]
fn test_client_update_and_delete() {
    let (_dir, storage) = open_store();
    let mut acme = client("Acme");
    let globex = client("Globex");
    storage.save_client(&acme).unwrap();
    storage.save_client(&globex).unwrap();

    acme.update("Acme Corp", "2 Main St", vec!["ap@acme.com".into()], dec!(120))
        .unwrap();
    storage.update_client(&acme).unwrap();
    assert_eq!(storage.get_client(acme.id()).unwrap(), acme);

    storage.delete_client(acme.id()).unwrap();
    let remaining = storage.get_all_clients().unwrap();
    assert_eq!(remaining, vec![globex]);
    assert!(storage.get_client(acme.id()).unwrap_err().is_not_found());
}

#[test]
fn test_unknown_ids_are_not_found_and_change_nothing() {
    let (_dir, storage) = open_store();
    let acme = client("Acme");
    storage.save_client(&acme).unwrap();
    storage
        .save_invoice(&Invoice::for_client(&acme, "2024-01"))
        .unwrap();

    let stranger = client("Stranger");
    let orphan = Invoice::for_client(&stranger, "2024-77");

    assert!(storage.update_client(&stranger).unwrap_err().is_not_found());
    assert!(storage.delete_client(stranger.id()).unwrap_err().is_not_found());
    assert!(storage.update_invoice(&orphan).unwrap_err().is_not_found());
    assert!(storage.delete_invoice(orphan.id()).unwrap_err().is_not_found());
    assert!(storage.get_invoice(Uuid::new_v4()).unwrap_err().is_not_found());
    assert!(storage
        .get_invoice_by_number("1999-01")
        .unwrap_err()
        .is_not_found());

    assert_eq!(storage.get_all_clients().unwrap().len(), 1);
    assert_eq!(storage.get_all_invoices().unwrap().len(), 1);
}

#[test]
fn test_update_checks_id_before_number() {
    let (_dir, storage) = open_store();
    let acme = client("Acme");
    let first = Invoice::for_client(&acme, "2024-01");
    let second = Invoice::for_client(&acme, "2024-02");
    storage.save_invoice(&first).unwrap();
    storage.save_invoice(&second).unwrap();

    let ghost = Invoice::for_client(&acme, "2024-01");
    assert!(storage.update_invoice(&ghost).unwrap_err().is_not_found());

    let mut renumbered = storage.get_invoice(second.id()).unwrap();
    let mut json = serde_json::to_value(&renumbered).unwrap();
    json["number"] = serde_json::json!("2024-01");
    renumbered = serde_json::from_value(json).unwrap();
    assert!(storage.update_invoice(&renumbered).unwrap_err().is_validation());
    assert_eq!(storage.get_invoice(second.id()).unwrap().number(), "2024-02");
}

#[test]
fn test_delete_preserves_order_of_remaining_invoices() {
    let (_dir, storage) = open_store();
    let acme = client("Acme");
    let numbers = ["2024-01", "2024-02", "2024-03", "2024-04"];
    let invoices: Vec<Invoice> = numbers
        .iter()
        .map(|n| Invoice::for_client(&acme, *n))
        .collect();
    for invoice in &invoices {
        storage.save_invoice(invoice).unwrap();
    }

    storage.delete_invoice(invoices[1].id()).unwrap();

    let remaining: Vec<String> = storage
        .get_all_invoices()
        .unwrap()
        .iter()
        .map(|i| i.number().to_string())
        .collect();
    assert_eq!(remaining, ["2024-01", "2024-03", "2024-04"]);
}

#[test]
fn test_invoices_survive_client_deletion_with_name_snapshot() {
    let (_dir, storage) = open_store();
    let acme = client("Acme");
    let other = client("Other");
    storage.save_client(&acme).unwrap();
    storage.save_client(&other).unwrap();
    let invoice = Invoice::for_client(&acme, "2024-01");
    storage.save_invoice(&invoice).unwrap();
    storage
        .save_invoice(&Invoice::for_client(&other, "2024-02"))
        .unwrap();

    storage.delete_client(acme.id()).unwrap();

    let by_client = storage.get_invoices_by_client(acme.id()).unwrap();
    assert_eq!(by_client.len(), 1);
    assert_eq!(by_client[0].client_name(), "Acme");
    assert!(storage.get_client(by_client[0].client_id()).is_err());
}

#[test]
fn test_next_invoice_number_skips_malformed() {
    let (_dir, storage) = open_store();
    let acme = client("Acme");
    for number in ["2024-01", "2024-02", "2024-05", "2024-xx"] {
        storage
            .save_invoice(&Invoice::for_client(&acme, number))
            .unwrap();
    }

    assert_eq!(storage.get_next_invoice_number(2024).unwrap(), 6);
    assert_eq!(storage.get_next_invoice_number(2031).unwrap(), 1);
}

#[test]
fn test_audit_history_matches_transitions_in_order() {
    let (_dir, storage) = open_store();
    let acme = client("Acme");
    let mut invoice = Invoice::for_client(&acme, "2024-01");
    storage.save_invoice(&invoice).unwrap();
    let other = Invoice::for_client(&acme, "2024-02");
    storage.save_invoice(&other).unwrap();
    let trail = AuditTrail::new(&storage);

    let path = [
        InvoiceStatus::Sent,
        InvoiceStatus::Overdue,
        InvoiceStatus::Paid,
        InvoiceStatus::Draft,
    ];
    let mut previous = InvoiceStatus::Draft;
    let mut expected = Vec::new();
    for next in path {
        trail.change_status(&mut invoice, next, None).unwrap();
        expected.push((previous, next));
        previous = next;
    }
    let mut other = other;
    trail
        .change_status(&mut other, InvoiceStatus::Sent, None)
        .unwrap();

    let history = trail.history(invoice.id()).unwrap();
    let pairs: Vec<_> = history
        .iter()
        .map(|e| (e.old_status(), e.new_status()))
        .collect();
    assert_eq!(pairs, expected);
    assert!(history.iter().all(|e| e.invoice_number() == "2024-01"));
}

#[test]
fn test_deleting_invoice_keeps_audit_entries() {
    let (_dir, storage) = open_store();
    let acme = client("Acme");
    let mut invoice = Invoice::for_client(&acme, "2024-01");
    storage.save_invoice(&invoice).unwrap();
    let trail = AuditTrail::new(&storage);
    trail
        .change_status(&mut invoice, InvoiceStatus::Sent, None)
        .unwrap();

    storage.delete_invoice(invoice.id()).unwrap();
    assert_eq!(trail.history(invoice.id()).unwrap().len(), 1);
}

#[test]
fn test_concurrent_saves_lose_nothing() {
    let (dir, storage) = open_store();
    let storage = Arc::new(storage);
    let writers = 16;

    let handles: Vec<_> = (0..writers)
        .map(|n| {
            let storage = Arc::clone(&storage);
            thread::spawn(move || {
                let client = client(&format!("Client{}", n));
                storage.save_client(&client).unwrap();
                client.id()
            })
        })
        .collect();
    let mut ids: Vec<Uuid> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let mut stored: Vec<Uuid> = storage
        .get_all_clients()
        .unwrap()
        .iter()
        .map(|c| c.id())
        .collect();
    ids.sort();
    stored.sort();
    assert_eq!(stored, ids);

    // A second handle on the same directory parses the document cleanly.
    let reopened = JsonStorage::open(dir.path().join("data")).unwrap();
    assert_eq!(reopened.get_all_clients().unwrap().len(), writers);
}

#[test]
fn test_concurrent_readers_and_writers_never_see_torn_documents() {
    let (_dir, storage) = open_store();
    let storage = Arc::new(storage);
    let acme = client("Acme");

    thread::scope(|scope| {
        for n in 0..4 {
            let storage = Arc::clone(&storage);
            let acme = acme.clone();
            scope.spawn(move || {
                for m in 0..10 {
                    let number = format!("20{:02}-{:02}", 30 + n, m + 1);
                    storage
                        .save_invoice(&Invoice::for_client(&acme, number))
                        .unwrap();
                }
            });
        }
        for _ in 0..4 {
            let storage = Arc::clone(&storage);
            scope.spawn(move || {
                for _ in 0..20 {
                    storage.get_all_invoices().unwrap();
                }
            });
        }
    });

    assert_eq!(storage.get_all_invoices().unwrap().len(), 40);
}

#[test]
fn test_malformed_document_surfaces_on_read() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("invoices.json"), "[{\"id\": 1").unwrap();
    let storage = JsonStorage::open(dir.path()).unwrap();

    let err = storage.get_all_invoices().unwrap_err();
    assert!(matches!(err, InvoicerError::Serialization(_)));
    assert!(storage.get_all_clients().unwrap().is_empty());
}

#[test]
fn test_stored_totals_are_rederived_on_read() {
    let (dir, storage) = open_store();
    let mut invoice = Invoice::for_client(&client("Acme"), "2024-01");
    invoice
        .add_line_item(LineItem::new("Hosting", dec!(2), dec!(10)).unwrap())
        .unwrap();
    storage.save_invoice(&invoice).unwrap();

    let path = dir.path().join("data").join("invoices.json");
    let mut documents: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    documents[0]["total"] = serde_json::json!("999");
    documents[0]["line_items"][0]["total"] = serde_json::json!("999");
    std::fs::write(&path, documents.to_string()).unwrap();

    let loaded = storage.get_invoice(invoice.id()).unwrap();
    assert_eq!(loaded.subtotal(), dec!(20));
    assert_eq!(loaded.total(), dec!(20));
    assert_eq!(loaded.line_items()[0].total(), dec!(20));
    assert_eq!(storage.get_all_invoices().unwrap()[0].total(), dec!(20));
}

#[test]
fn test_end_to_end_billing_scenario() {
    let (_dir, storage) = open_store();
    let acme = Client::new("Acme", "", vec!["a@acme.com".into()], dec!(100.00)).unwrap();
    storage.save_client(&acme).unwrap();

    let sequence = storage.get_next_invoice_number(2024).unwrap();
    let number = invoicer_core::generate_invoice_number(2024, sequence);
    assert_eq!(number, "2024-01");
    let mut invoice = Invoice::for_client(&acme, number);

    invoice.add_line_item(LineItem::new("Consulting", dec!(10), dec!(150.00)).unwrap()).unwrap();
    assert_eq!(invoice.subtotal(), dec!(1500.00));
    invoice.set_discount_rate(dec!(10)).unwrap();
    assert_eq!(invoice.discount(), dec!(150.00));
    assert_eq!(invoice.total(), dec!(1350.00));
    invoice.set_tax_rate(dec!(8)).unwrap();
    assert_eq!(invoice.tax(), dec!(108.00));
    assert_eq!(invoice.total(), dec!(1458.00));
    storage.save_invoice(&invoice).unwrap();

    let trail = AuditTrail::new(&storage);
    trail
        .change_status(
            &mut invoice,
            InvoiceStatus::Sent,
            Some("emailed to client".into()),
        )
        .unwrap();
    let history = trail.history(invoice.id()).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].reason(), Some("emailed to client"));

    let err = trail
        .change_status(&mut invoice, InvoiceStatus::Sent, None)
        .unwrap_err();
    assert!(matches!(err, InvoicerError::StatusUnchanged(InvoiceStatus::Sent)));
    assert_eq!(trail.history(invoice.id()).unwrap().len(), 1);

    trail
        .change_status(&mut invoice, InvoiceStatus::Paid, None)
        .unwrap();
    assert_eq!(trail.history(invoice.id()).unwrap().len(), 2);

    let mut stale = storage.get_invoice(invoice.id()).unwrap();
    assert_eq!(stale.status(), InvoiceStatus::Paid);
    let err = trail
        .change_status(&mut stale, InvoiceStatus::Paid, None)
        .unwrap_err();
    assert!(matches!(err, InvoicerError::StatusUnchanged(InvoiceStatus::Paid)));
    assert_eq!(trail.history(invoice.id()).unwrap().len(), 2);
}
