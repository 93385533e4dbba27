//! Dealbook CLI binary

use anyhow::bail;
use clap::Parser;
use dealbook::cli::{
    Book, BookListing, Cli, Commands, DealAction, DealbookApp, ListingAction, TxnAction,
};
use dealbook::directory::InMemoryDirectory;
use dealbook::negotiation::OfferMode;
use dealbook::settlement::{pricing, Financing, PricingMode, TransactionDraft, TransactionStatus};
use dealbook::types::{ActorId, DealId, Listing, ListingId, PropertyKind, TransactionId};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Listing { action } => run_listing(&cli.book, action)?,
        Commands::Deal { action } => run_deal(&cli.book, action).await?,
        Commands::Txn { action } => run_txn(&cli.book, action).await?,

        Commands::Pricing {
            mode,
            base,
            discount,
            fees,
            reservation,
            downpayment,
        } => {
            let tcp = pricing::total_contract_price(mode, base, discount, fees);
            let balance = pricing::balance_due(tcp, reservation, downpayment);
            print_json(&json!({ "tcp": tcp, "balance_amount": balance }))?;
        }

        Commands::Demo => run_demo().await?,
    }

    Ok(())
}

fn run_listing(book_path: &Path, action: ListingAction) -> anyhow::Result<()> {
    let mut book = Book::load(book_path)?;

    match action {
        ListingAction::Add {
            id,
            price,
            kind,
            sellers,
        } => {
            if book.listings.iter().any(|entry| entry.listing.id.0 == id) {
                bail!("listing {id} already exists in {}", book_path.display());
            }
            let entry = BookListing {
                listing: Listing {
                    id: ListingId(id),
                    list_price: price,
                    kind,
                },
                sellers: sellers.into_iter().map(ActorId).collect(),
            };
            book.listings.push(entry.clone());
            book.save(book_path)?;
            print_json(&entry)?;
        }

        ListingAction::List => {
            print_json(&book.listings)?;
        }
    }

    Ok(())
}

async fn run_deal(book_path: &Path, action: DealAction) -> anyhow::Result<()> {
    let book = Book::load(book_path)?;
    let (directory, app) = book.open()?;

    match action {
        DealAction::Submit {
            listing,
            buyer,
            list_price,
            amount,
            notes,
        } => {
            let deal = app
                .submit_offer(
                    &ListingId(listing),
                    &ActorId(buyer),
                    offer_mode(list_price),
                    amount,
                    notes,
                )
                .await?;
            print_json(&deal)?;
        }

        DealAction::Counter {
            deal,
            actor,
            list_price,
            amount,
            notes,
        } => {
            let deal = app
                .counter_offer(
                    &DealId(deal),
                    &ActorId(actor),
                    offer_mode(list_price),
                    amount,
                    notes,
                )
                .await?;
            print_json(&deal)?;
        }

        DealAction::Accept { deal, actor } => {
            let outcome = app.accept(&DealId(deal), &ActorId(actor)).await?;
            print_json(&outcome)?;
        }

        DealAction::Decline { deal, actor, reason } => {
            let deal = app.decline(&DealId(deal), &ActorId(actor), &reason).await?;
            print_json(&deal)?;
        }

        DealAction::Cancel { deal, actor } => {
            let deal = app.cancel(&DealId(deal), &ActorId(actor)).await?;
            print_json(&deal)?;
        }

        DealAction::Show { deal } => {
            let deal = app.deal(&DealId(deal)).await?;
            print_json(&deal)?;
            return Ok(());
        }

        DealAction::List => {
            print_json(&app.negotiation().all_deals())?;
            return Ok(());
        }
    }

    dispatch_notifications(&app);
    Book::capture(&directory, &app).save(book_path)?;
    Ok(())
}

async fn run_txn(book_path: &Path, action: TxnAction) -> anyhow::Result<()> {
    let book = Book::load(book_path)?;
    let (directory, app) = book.open()?;

    match action {
        TxnAction::Save {
            txn,
            base_price,
            discount,
            fees,
            mode,
            reservation,
            downpayment,
            financing,
            payment,
            reference,
            remarks,
            agent,
        } => {
            let draft = TransactionDraft {
                base_price,
                discount_amount: discount,
                fees_amount: fees,
                pricing_mode: mode,
                reservation_amount: reservation,
                downpayment_amount: downpayment,
                financing,
                mode_of_payment: payment,
                reference_no: reference,
                remarks,
                primary_agent_id: agent.map(ActorId),
                expires_at: None,
            };
            let txn = app.save_transaction(&TransactionId(txn), draft).await?;
            print_json(&txn)?;
        }

        TxnAction::Status { txn, status, reason } => {
            let txn = app
                .set_transaction_status(&TransactionId(txn), status, reason.as_deref())
                .await?;
            print_json(&txn)?;
        }

        TxnAction::Show { txn } => {
            let txn = app.transaction(&TransactionId(txn)).await?;
            print_json(&txn)?;
            return Ok(());
        }
    }

    dispatch_notifications(&app);
    Book::capture(&directory, &app).save(book_path)?;
    Ok(())
}

/// Scripted end-to-end flow: negotiate below list price, accept, finalize,
/// and walk the transaction through to a sale.
async fn run_demo() -> anyhow::Result<()> {
    let directory = Arc::new(InMemoryDirectory::new());
    directory.add_listing(
        "lst_ridgeview",
        Some(3_000_000),
        PropertyKind::House,
        &["agent_mia"],
    );
    let app = DealbookApp::new(directory.clone(), directory);

    let buyer = ActorId("buyer_dan".to_string());
    let agent = ActorId("agent_mia".to_string());
    let listing = ListingId("lst_ridgeview".to_string());

    tracing::info!("Buyer opens at 2,500,000 against a 3,000,000 listing");
    let deal = app
        .submit_offer(&listing, &buyer, OfferMode::Preferred, Some(2_500_000), None)
        .await?;

    tracing::info!("Agent counters at 2,800,000");
    app.counter_offer(&deal.id, &agent, OfferMode::Preferred, Some(2_800_000), None)
        .await?;

    tracing::info!("Buyer counters at 2,650,000");
    app.counter_offer(&deal.id, &buyer, OfferMode::Preferred, Some(2_650_000), None)
        .await?;

    tracing::info!("Agent accepts; draft transaction opens");
    let outcome = app.accept(&deal.id, &agent).await?;

    tracing::info!("Paperwork: fees, reservation, downpayment, bank financing");
    app.finalize_transaction(
        &deal.id,
        TransactionDraft {
            fees_amount: Some(50_000),
            reservation_amount: Some(50_000),
            downpayment_amount: Some(200_000),
            pricing_mode: Some(PricingMode::Full),
            financing: Some(Financing::Bank),
            ..Default::default()
        },
    )
    .await?;

    app.set_transaction_status(&outcome.transaction.id, TransactionStatus::Reserved, None)
        .await?;
    let txn = app
        .set_transaction_status(&outcome.transaction.id, TransactionStatus::Sold, None)
        .await?;

    dispatch_notifications(&app);
    print_json(&txn)?;
    Ok(())
}

fn offer_mode(list_price: bool) -> OfferMode {
    if list_price {
        OfferMode::ListPrice
    } else {
        OfferMode::Preferred
    }
}

fn dispatch_notifications(app: &DealbookApp) {
    for notification in app.take_notifications() {
        tracing::info!("notify: {:?}", notification);
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
