//! Integration tests for the transactional back-office flows.
//!
//! Tests: BackOffice → Transaction → MemoryDatabase
//!
//! Verifies:
//! - Sales write header, items, stock-outs and totals as one unit
//! - Cached counters follow movements and can be reconciled from history
//! - Failed operations leave no rows behind

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use shopbooks_accounting::{
        NewBankAccount, NewBankTransaction, NewExpense, NewLedgerEntry, PaymentMethod,
        TransactionType,
    };
    use shopbooks_core::{DomainError, InvoiceId, ProductId};
    use shopbooks_inventory::{NewStockIn, NewStockOut, OversellPolicy};
    use shopbooks_invoicing::{
        InvoiceItemUpdate, NewInstallment, NewInvoice, NewInvoiceLine, PaymentType,
    };
    use shopbooks_parties::CustomerDetails;
    use shopbooks_products::{CategoryDetails, Product, ProductDetails};

    use crate::error::StoreError;
    use crate::memory::MemoryDatabase;
    use crate::repository::{CatalogRepository, Database};
    use crate::service::BackOffice;

    fn office(policy: OversellPolicy) -> (BackOffice, MemoryDatabase) {
        let db = MemoryDatabase::new();
        (BackOffice::new(Arc::new(db.clone()), policy), db)
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn product(office: &BackOffice, name: &str) -> Product {
        let category = office
            .create_category(CategoryDetails {
                name: "General".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        office
            .create_product(ProductDetails {
                category_id: category.id,
                name: name.to_string(),
                buying_price: dec!(8.00),
                date: None,
            })
            .await
            .unwrap()
    }

    async fn receive(office: &BackOffice, product: ProductId, quantity: i64) {
        office
            .record_stock_in(NewStockIn {
                product_id: product,
                stock_quantity: quantity,
                buying_price_item: dec!(8.00),
                buying_percent: dec!(25),
                selling_price_item: dec!(10.00),
                date: None,
            })
            .await
            .unwrap();
    }

    fn line(product: ProductId, quantity: i64, price: Decimal) -> NewInvoiceLine {
        NewInvoiceLine {
            product_id: product,
            quantity,
            price,
        }
    }

    fn is_not_found(err: &StoreError) -> bool {
        matches!(err.as_domain(), Some(DomainError::NotFound(_)))
    }

    #[tokio::test]
    async fn stock_in_and_out_move_counter_and_history() {
        let (office, _) = office(OversellPolicy::Permit);
        let p = product(&office, "Kettle").await;
        assert_eq!(p.stock, 0);

        receive(&office, p.id, 50).await;
        assert_eq!(office.product(p.id).await.unwrap().stock, 50);

        office
            .record_stock_out(NewStockOut {
                product_id: p.id,
                quantity: 10,
                invoice_id: None,
                date: None,
            })
            .await
            .unwrap();

        assert_eq!(office.product(p.id).await.unwrap().stock, 40);
        let level = office.available_stock(p.id).await.unwrap();
        assert_eq!((level.stocked_in, level.stocked_out, level.available), (50, 10, 40));

        let ins = office.stock_ins(Some(p.id)).await.unwrap();
        assert_eq!(ins.len(), 1);
        assert_eq!(ins[0].total_buying_amount, dec!(500.00));
        assert_eq!(ins[0].total_selling_amount, dec!(500.00));
    }

    #[tokio::test]
    async fn oversell_floors_counter_and_reconcile_repairs_drift() {
        let (office, _) = office(OversellPolicy::Permit);
        let p = product(&office, "Fan").await;
        receive(&office, p.id, 5).await;

        office
            .record_stock_out(NewStockOut {
                product_id: p.id,
                quantity: 8,
                invoice_id: None,
                date: None,
            })
            .await
            .unwrap();

        assert_eq!(office.product(p.id).await.unwrap().stock, 0);
        assert_eq!(office.available_stock(p.id).await.unwrap().available, -3);

        let report = office.reconcile_stock(p.id).await.unwrap();
        assert_eq!(report.oversold_by(), 3);
        assert!(!report.drifted());

        // The floor hid three units, so new stock leaves the counter ahead.
        receive(&office, p.id, 10).await;
        assert_eq!(office.product(p.id).await.unwrap().stock, 10);

        let report = office.reconcile_stock(p.id).await.unwrap();
        assert!(report.drifted());
        assert_eq!((report.cached_before, report.cached_after), (10, 7));
        assert_eq!(office.product(p.id).await.unwrap().stock, 7);
    }

    #[tokio::test]
    async fn reject_policy_blocks_oversell_without_writing() {
        let (office, _) = office(OversellPolicy::Reject);
        let p = product(&office, "Heater").await;
        receive(&office, p.id, 5).await;

        let err = office
            .record_stock_out(NewStockOut {
                product_id: p.id,
                quantity: 8,
                invoice_id: None,
                date: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::InvariantViolation(_))));

        assert_eq!(office.product(p.id).await.unwrap().stock, 5);
        assert!(office.stock_outs(Some(p.id)).await.unwrap().is_empty());

        let err = office
            .create_invoice(NewInvoice {
                lines: vec![line(p.id, 6, dec!(10))],
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::InvariantViolation(_))));
        assert!(office.invoices().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invoice_with_missing_product_persists_nothing() {
        let (office, db) = office(OversellPolicy::Permit);
        let p = product(&office, "Iron").await;
        receive(&office, p.id, 10).await;

        let err = office
            .create_invoice(NewInvoice {
                lines: vec![line(p.id, 2, dec!(10)), line(ProductId::new(), 1, dec!(5))],
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(is_not_found(&err));

        let tables = db.snapshot().await;
        assert!(tables.invoices.is_empty());
        assert!(tables.invoice_items.is_empty());
        assert!(tables.stock_outs.is_empty());
        assert_eq!(tables.last_invoice_number, 0);
        assert_eq!(office.product(p.id).await.unwrap().stock, 10);

        let ok = office
            .create_invoice(NewInvoice {
                lines: vec![line(p.id, 1, dec!(10))],
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(ok.invoice.display_number(), "0000001");
    }

    #[tokio::test]
    async fn invoice_totals_follow_lines_and_payments() {
        let (office, _) = office(OversellPolicy::Permit);
        let a = product(&office, "Plate").await;
        let b = product(&office, "Cup").await;
        receive(&office, a.id, 10).await;
        receive(&office, b.id, 10).await;

        let detail = office
            .create_invoice(NewInvoice {
                lines: vec![line(a.id, 3, dec!(10.00)), line(b.id, 1, dec!(5.00))],
                discount: dec!(2.00),
                shipping: dec!(1.00),
                paid_amount: dec!(20.00),
                ..Default::default()
            })
            .await
            .unwrap();

        let invoice = &detail.invoice;
        assert_eq!(invoice.total_quantity, 4);
        assert_eq!(invoice.sub_total, dec!(35.00));
        assert_eq!(invoice.grand_total, dec!(34.00));
        assert_eq!(invoice.remaining_payment, dec!(14.00));
        assert_eq!(detail.items.len(), 2);
        assert!(detail.installments.is_empty());

        assert_eq!(office.product(a.id).await.unwrap().stock, 7);
        assert_eq!(office.product(b.id).await.unwrap().stock, 9);

        let (_, updated) = office
            .add_installment(
                invoice.id,
                NewInstallment {
                    paid_amount: dec!(4.00),
                    description: None,
                    date: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.remaining_payment, dec!(10.00));
        assert_eq!(office.total_paid(invoice.id).await.unwrap(), dec!(24.00));
    }

    #[tokio::test]
    async fn installment_sale_records_advance_once() {
        let (office, _) = office(OversellPolicy::Permit);
        let p = product(&office, "Sofa").await;
        receive(&office, p.id, 2).await;

        let detail = office
            .create_invoice(NewInvoice {
                payment_type: PaymentType::Installment,
                lines: vec![line(p.id, 1, dec!(300.00))],
                paid_amount: dec!(100.00),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(detail.invoice.paid_amount, Decimal::ZERO);
        assert_eq!(detail.installments.len(), 1);
        assert_eq!(detail.installments[0].paid_amount, dec!(100.00));
        assert_eq!(detail.invoice.remaining_payment, dec!(200.00));
        assert_eq!(detail.total_paid(), dec!(100.00));

        for _ in 0..2 {
            office
                .add_installment(
                    detail.invoice.id,
                    NewInstallment {
                        paid_amount: dec!(100.00),
                        description: Some("monthly".to_string()),
                        date: None,
                    },
                )
                .await
                .unwrap();
        }

        let after = office.invoice(detail.invoice.id).await.unwrap();
        assert_eq!(after.installments.len(), 3);
        assert_eq!(after.invoice.remaining_payment, Decimal::ZERO);
        assert!(after.totals().unwrap().is_fully_paid());
    }

    #[tokio::test]
    async fn deleting_invoice_removes_children_and_restores_stock() {
        let (office, db) = office(OversellPolicy::Permit);
        let p = product(&office, "Lamp").await;
        receive(&office, p.id, 10).await;

        let detail = office
            .create_invoice(NewInvoice {
                payment_type: PaymentType::Installment,
                lines: vec![line(p.id, 4, dec!(25.00))],
                paid_amount: dec!(50.00),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(office.product(p.id).await.unwrap().stock, 6);

        office.delete_invoice(detail.invoice.id).await.unwrap();

        assert!(is_not_found(&office.invoice(detail.invoice.id).await.unwrap_err()));
        let tables = db.snapshot().await;
        assert!(tables.invoice_items.is_empty());
        assert!(tables.installments.is_empty());
        assert!(tables.stock_outs.is_empty());
        assert_eq!(office.product(p.id).await.unwrap().stock, 10);

        assert!(is_not_found(&office.delete_invoice(detail.invoice.id).await.unwrap_err()));
    }

    #[tokio::test]
    async fn item_edits_keep_stock_and_totals_in_step() {
        let (office, _) = office(OversellPolicy::Permit);
        let a = product(&office, "Chair").await;
        let b = product(&office, "Table").await;
        receive(&office, a.id, 10).await;
        receive(&office, b.id, 10).await;

        let detail = office
            .create_invoice(NewInvoice {
                lines: vec![line(a.id, 3, dec!(10.00))],
                ..Default::default()
            })
            .await
            .unwrap();
        let invoice = detail.invoice.id;
        let item = detail.items[0].id;

        let detail = office
            .update_invoice_item(
                invoice,
                item,
                InvoiceItemUpdate {
                    quantity: Some(5),
                    price: Some(dec!(12.00)),
                },
            )
            .await
            .unwrap();
        assert_eq!(detail.invoice.sub_total, dec!(60.00));
        assert_eq!(detail.items[0].total, dec!(60.00));
        assert_eq!(office.product(a.id).await.unwrap().stock, 5);
        let outs = office.stock_outs(Some(a.id)).await.unwrap();
        assert_eq!(outs.len(), 1);
        assert_eq!(outs[0].quantity, 5);

        let err = office.remove_invoice_item(invoice, item).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::Validation(_))));

        let detail = office
            .add_invoice_item(invoice, line(b.id, 2, dec!(50.00)))
            .await
            .unwrap();
        assert_eq!(detail.invoice.sub_total, dec!(160.00));
        assert_eq!(office.product(b.id).await.unwrap().stock, 8);

        let detail = office.remove_invoice_item(invoice, item).await.unwrap();
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.invoice.sub_total, dec!(100.00));
        assert_eq!(detail.invoice.total_quantity, 2);
        assert_eq!(office.product(a.id).await.unwrap().stock, 10);
        assert!(office.stock_outs(Some(a.id)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ledger_balance_is_credit_minus_debit() {
        let (office, _) = office(OversellPolicy::Permit);
        let customer = office
            .create_customer(CustomerDetails {
                name: "Ali Raza".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let entry = |amount: Decimal, detail: &str| NewLedgerEntry {
            amount,
            detail: detail.to_string(),
            date: None,
        };

        office.add_debit(customer.id, entry(dec!(100), "goods")).await.unwrap();
        let (credit, totals) = office
            .add_credit(customer.id, entry(dec!(40), "cash"))
            .await
            .unwrap();
        assert_eq!(credit.credit_amount, dec!(40));
        assert_eq!(credit.debit_amount, Decimal::ZERO);
        assert_eq!((totals.total_debit, totals.total_credit), (dec!(100), dec!(40)));

        office.add_debit(customer.id, entry(dec!(10), "more goods")).await.unwrap();
        assert_eq!(office.customer_balance(customer.id).await.unwrap(), dec!(-70));

        let ledger = office.customer_ledger(customer.id).await.unwrap();
        assert_eq!(ledger.entries.len(), 3);

        let err = office
            .add_debit(customer.id, entry(Decimal::ZERO, "nothing"))
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::InvalidFields(_))));
        assert_eq!(office.customer_ledger(customer.id).await.unwrap().entries.len(), 3);
    }

    #[tokio::test]
    async fn deleting_customer_detaches_invoices() {
        let (office, db) = office(OversellPolicy::Permit);
        let p = product(&office, "Rug").await;
        receive(&office, p.id, 3).await;
        let customer = office
            .create_customer(CustomerDetails {
                name: "Sara".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        office
            .add_debit(
                customer.id,
                NewLedgerEntry {
                    amount: dec!(5),
                    detail: "rug".to_string(),
                    date: None,
                },
            )
            .await
            .unwrap();
        let detail = office
            .create_invoice(NewInvoice {
                customer_id: Some(customer.id),
                lines: vec![line(p.id, 1, dec!(5))],
                ..Default::default()
            })
            .await
            .unwrap();

        office.delete_customer(customer.id).await.unwrap();

        let invoice = office.invoice(detail.invoice.id).await.unwrap().invoice;
        assert_eq!(invoice.customer_id, None);
        assert!(db.snapshot().await.ledger_entries.is_empty());
    }

    #[tokio::test]
    async fn invoiced_product_cannot_be_deleted() {
        let (office, _) = office(OversellPolicy::Permit);
        let sold = product(&office, "Mug").await;
        let unsold = product(&office, "Jug").await;
        receive(&office, sold.id, 3).await;
        receive(&office, unsold.id, 3).await;
        office
            .create_invoice(NewInvoice {
                lines: vec![line(sold.id, 1, dec!(3))],
                ..Default::default()
            })
            .await
            .unwrap();

        let err = office.delete_product(sold.id).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::Conflict(_))));

        office.delete_product(unsold.id).await.unwrap();
        assert!(office.stock_ins(Some(unsold.id)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn bank_account_balance_tracks_transactions() {
        let (office, _) = office(OversellPolicy::Permit);
        let account = office
            .create_bank_account(NewBankAccount {
                name: "Main".to_string(),
                account_number: "PK-001".to_string(),
                opening_balance: dec!(1000),
            })
            .await
            .unwrap();
        assert_eq!(account.current_balance, dec!(1000));

        let tx = |kind, amount| NewBankTransaction {
            transaction_type: kind,
            amount,
            description: None,
            date: None,
        };
        office
            .record_bank_transaction(account.id, tx(TransactionType::Deposit, dec!(250)))
            .await
            .unwrap();
        let (_, balance) = office
            .record_bank_transaction(account.id, tx(TransactionType::Withdrawal, dec!(1500)))
            .await
            .unwrap();
        assert_eq!(balance, dec!(-250));

        let recomputed = office.recompute_account_balance(account.id).await.unwrap();
        assert_eq!(recomputed.current_balance, dec!(-250));
        assert_eq!(office.bank_transactions(account.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn monthly_report_nets_sales_against_expenses() {
        let (office, _) = office(OversellPolicy::Permit);
        let p = product(&office, "Pan").await;
        receive(&office, p.id, 10).await;

        for (date, price) in [(day(2024, 5, 3), dec!(100)), (day(2024, 5, 20), dec!(50)), (day(2024, 6, 1), dec!(999))] {
            office
                .create_invoice(NewInvoice {
                    lines: vec![line(p.id, 1, price)],
                    date: Some(date),
                    ..Default::default()
                })
                .await
                .unwrap();
        }
        office
            .create_expense(NewExpense {
                category_id: None,
                description: "Rent".to_string(),
                amount: dec!(120),
                date: Some(day(2024, 5, 31)),
                payment_method: PaymentMethod::Bank,
            })
            .await
            .unwrap();

        let may = office.monthly_report(2024, 5).await.unwrap();
        assert_eq!(may.invoice_count, 2);
        assert_eq!(may.total_sales, dec!(150));
        assert_eq!(may.total_expenses, dec!(120));
        assert_eq!(may.profit_loss, dec!(30));

        let june_first = office.daily_log(day(2024, 6, 1)).await.unwrap();
        assert_eq!(june_first.invoice_count, 1);
        assert_eq!(june_first.total_sales, dec!(999));

        assert!(office.period_summary(day(2024, 6, 2), day(2024, 6, 1)).await.is_err());
    }

    #[tokio::test]
    async fn oversized_sale_is_rejected_without_writing() {
        let (office, db) = office(OversellPolicy::Permit);
        let p = product(&office, "Toaster").await;
        receive(&office, p.id, 10).await;

        let err = office
            .create_invoice(NewInvoice {
                lines: vec![line(p.id, i64::MAX, dec!(100000000000.00))],
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::InvalidFields(_))));

        // Every field is in range but the line total does not fit.
        let err = office
            .create_invoice(NewInvoice {
                lines: vec![line(p.id, 1, dec!(1)), line(p.id, 1_000_000, dec!(999999999.99))],
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::Validation(_))));

        let tables = db.snapshot().await;
        assert!(tables.invoices.is_empty());
        assert!(tables.invoice_items.is_empty());
        assert!(tables.stock_outs.is_empty());
        assert_eq!(tables.last_invoice_number, 0);
        assert_eq!(office.product(p.id).await.unwrap().stock, 10);
    }

    #[tokio::test]
    async fn oversized_receipts_and_counters_are_rejected() {
        let (office, db) = office(OversellPolicy::Permit);
        let p = product(&office, "Blender").await;

        let err = office
            .record_stock_in(NewStockIn {
                product_id: p.id,
                stock_quantity: i64::MAX,
                buying_price_item: dec!(1.00),
                buying_percent: Decimal::ZERO,
                selling_price_item: dec!(1.00),
                date: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::InvalidFields(_))));
        receive(&office, p.id, 1).await;
        assert_eq!(office.product(p.id).await.unwrap().stock, 1);

        // A counter already at the limit refuses to grow.
        let mut tx = db.begin().await.unwrap();
        tx.set_stock(p.id, i64::MAX).await.unwrap();
        let err = tx.adjust_stock(p.id, 1).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::InvariantViolation(_))));
        drop(tx);
        assert_eq!(office.product(p.id).await.unwrap().stock, 1);
    }

    #[tokio::test]
    async fn manual_stock_out_never_links_to_an_invoice_item() {
        let (office, _) = office(OversellPolicy::Permit);
        let p = product(&office, "Lamp").await;
        receive(&office, p.id, 20).await;

        let sale = office
            .create_invoice(NewInvoice {
                lines: vec![line(p.id, 3, dec!(10)), line(p.id, 2, dec!(10))],
                ..Default::default()
            })
            .await
            .unwrap();
        let item = sale.items[0].id;

        let manual = office
            .record_stock_out(NewStockOut {
                product_id: p.id,
                quantity: 1,
                invoice_id: Some(sale.invoice.id),
                date: None,
            })
            .await
            .unwrap();
        assert_eq!(manual.invoice_item_id, None);

        // The item keeps exactly one linked stock-out through edits.
        office
            .update_invoice_item(
                sale.invoice.id,
                item,
                InvoiceItemUpdate {
                    quantity: Some(5),
                    price: None,
                },
            )
            .await
            .unwrap();
        let linked: Vec<_> = office
            .stock_outs(Some(p.id))
            .await
            .unwrap()
            .into_iter()
            .filter(|s| s.invoice_item_id == Some(item))
            .collect();
        assert_eq!(linked.len(), 1);
        assert_eq!(linked[0].quantity, 5);
        assert_eq!(office.product(p.id).await.unwrap().stock, 20 - 5 - 2 - 1);

        office.remove_invoice_item(sale.invoice.id, item).await.unwrap();
        assert_eq!(office.product(p.id).await.unwrap().stock, 20 - 2 - 1);
        let level = office.available_stock(p.id).await.unwrap();
        assert_eq!(level.stocked_out, 3);

        let err = office
            .record_stock_out(NewStockOut {
                product_id: p.id,
                quantity: 1,
                invoice_id: Some(InvoiceId::new()),
                date: None,
            })
            .await
            .unwrap_err();
        assert!(is_not_found(&err));
    }
}
