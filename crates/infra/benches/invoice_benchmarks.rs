use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tokio::runtime::Runtime;

use shopbooks_infra::{BackOffice, MemoryDatabase};
use shopbooks_inventory::{NewStockIn, OversellPolicy};
use shopbooks_invoicing::{LineAmount, NewInvoice, NewInvoiceLine, recalculate};
use shopbooks_products::{CategoryDetails, Product, ProductDetails};

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("tokio runtime")
}

/// Back office with `count` products, each holding plenty of stock.
async fn stocked_office(count: usize) -> (BackOffice, Vec<Product>) {
    let office = BackOffice::new(Arc::new(MemoryDatabase::new()), OversellPolicy::Permit);
    let category = office
        .create_category(CategoryDetails {
            name: "Bench".to_string(),
            ..Default::default()
        })
        .await
        .expect("category");

    let mut products = Vec::with_capacity(count);
    for i in 0..count {
        let product = office
            .create_product(ProductDetails {
                category_id: category.id,
                name: format!("Product {i}"),
                buying_price: dec!(4.00),
                date: None,
            })
            .await
            .expect("product");
        office
            .record_stock_in(NewStockIn {
                product_id: product.id,
                stock_quantity: 1_000_000,
                buying_price_item: dec!(4.00),
                buying_percent: dec!(10),
                selling_price_item: dec!(6.00),
                date: None,
            })
            .await
            .expect("stock in");
        products.push(product);
    }
    (office, products)
}

fn sale(products: &[Product]) -> NewInvoice {
    NewInvoice {
        lines: products
            .iter()
            .map(|p| NewInvoiceLine {
                product_id: p.id,
                quantity: 2,
                price: dec!(6.00),
            })
            .collect(),
        discount: dec!(1.00),
        shipping: dec!(0.50),
        paid_amount: dec!(5.00),
        ..Default::default()
    }
}

fn bench_totals(c: &mut Criterion) {
    let mut group = c.benchmark_group("invoice_totals");

    for lines in [1usize, 10, 100] {
        let amounts: Vec<LineAmount> = (0..lines)
            .map(|i| LineAmount::new(i as i64 + 1, Decimal::new(1999, 2)))
            .collect();
        let installments = vec![dec!(10.00); 4];
        group.throughput(Throughput::Elements(lines as u64));
        group.bench_with_input(BenchmarkId::from_parameter(lines), &amounts, |b, amounts| {
            b.iter(|| {
                black_box(recalculate(
                    black_box(amounts),
                    dec!(5.00),
                    dec!(2.50),
                    dec!(20.00),
                    &installments,
                )
                .expect("totals"))
            })
        });
    }

    group.finish();
}

fn bench_create_invoice(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("create_invoice");

    for lines in [1usize, 5, 20] {
        let (office, products) = rt.block_on(stocked_office(lines));
        let input = sale(&products);
        group.throughput(Throughput::Elements(lines as u64));
        group.bench_with_input(BenchmarkId::from_parameter(lines), &input, |b, input| {
            b.iter(|| {
                let detail = rt
                    .block_on(office.create_invoice(input.clone()))
                    .expect("invoice");
                black_box(detail)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_totals, bench_create_invoice);
criterion_main!(benches);
