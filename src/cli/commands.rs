//! CLI command definitions

use crate::settlement::{Financing, PricingMode, TransactionStatus};
use crate::types::PropertyKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dealbook")]
#[command(about = "Dealbook - deal negotiation and transaction finalization for property brokerage", long_about = None)]
pub struct Cli {
    /// JSON book file holding listings, deals, and transactions
    #[arg(long, default_value = "dealbook.json", global = true)]
    pub book: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage listings known to the book
    Listing {
        #[command(subcommand)]
        action: ListingAction,
    },

    /// Negotiate deals
    Deal {
        #[command(subcommand)]
        action: DealAction,
    },

    /// Manage finalized transactions
    Txn {
        #[command(subcommand)]
        action: TxnAction,
    },

    /// Evaluate contract pricing for a set of figures
    Pricing {
        /// Pricing mode (simple, full)
        #[arg(short, long, value_parser = parse_pricing_mode, default_value = "full")]
        mode: PricingMode,

        /// Base price in minor units
        #[arg(short, long)]
        base: i64,

        /// Discount amount
        #[arg(short, long, default_value = "0")]
        discount: i64,

        /// Itemized fees
        #[arg(short, long, default_value = "0")]
        fees: i64,

        /// Reservation amount already paid
        #[arg(short, long, default_value = "0")]
        reservation: i64,

        /// Downpayment amount already paid
        #[arg(short = 'p', long, default_value = "0")]
        downpayment: i64,
    },

    /// Run a scripted negotiation and finalization end to end
    Demo,
}

#[derive(Subcommand, Debug)]
pub enum ListingAction {
    /// Register a listing with its selling-side actors
    Add {
        /// Listing ID
        id: String,

        /// Published list price in minor units
        #[arg(short, long)]
        price: Option<i64>,

        /// Property kind (land, house, condo, commercial)
        #[arg(short, long, value_parser = parse_property_kind, default_value = "house")]
        kind: PropertyKind,

        /// Selling-side actor, repeatable
        #[arg(short, long = "seller")]
        sellers: Vec<String>,
    },

    /// List all known listings
    List,
}

#[derive(Subcommand, Debug)]
pub enum DealAction {
    /// Submit a buyer's initial offer on a listing
    Submit {
        /// Listing ID
        listing: String,

        /// Buyer actor ID
        #[arg(short, long)]
        buyer: String,

        /// Pin the offer to the listing's published price
        #[arg(long)]
        list_price: bool,

        /// Preferred amount in minor units
        #[arg(short, long)]
        amount: Option<i64>,

        /// Free-text notes
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Counter the live proposal from the other side
    Counter {
        /// Deal ID
        deal: String,

        /// Acting party
        #[arg(short = 'u', long)]
        actor: String,

        /// Pin the counter to the listing's published price
        #[arg(long)]
        list_price: bool,

        /// Preferred amount in minor units
        #[arg(short, long)]
        amount: Option<i64>,

        /// Free-text notes
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Accept the counterpart's live proposal
    Accept {
        /// Deal ID
        deal: String,

        /// Acting party
        #[arg(short = 'u', long)]
        actor: String,
    },

    /// Decline the counterpart's live proposal
    Decline {
        /// Deal ID
        deal: String,

        /// Acting party
        #[arg(short = 'u', long)]
        actor: String,

        /// Reason shown to the counterpart
        #[arg(short, long)]
        reason: String,
    },

    /// Withdraw one's own live proposal
    Cancel {
        /// Deal ID
        deal: String,

        /// Acting party
        #[arg(short = 'u', long)]
        actor: String,
    },

    /// Show a deal
    Show {
        /// Deal ID
        deal: String,
    },

    /// List all deals
    List,
}

#[derive(Subcommand, Debug)]
pub enum TxnAction {
    /// Edit a transaction's field snapshot and recompute totals
    Save {
        /// Transaction ID
        txn: String,

        #[arg(long)]
        base_price: Option<i64>,

        #[arg(long)]
        discount: Option<i64>,

        #[arg(long)]
        fees: Option<i64>,

        /// Pricing mode (simple, full)
        #[arg(long, value_parser = parse_pricing_mode)]
        mode: Option<PricingMode>,

        #[arg(long)]
        reservation: Option<i64>,

        #[arg(long)]
        downpayment: Option<i64>,

        /// Financing method (cash, bank, in_house, other)
        #[arg(long, value_parser = parse_financing)]
        financing: Option<Financing>,

        #[arg(long)]
        payment: Option<String>,

        #[arg(long)]
        reference: Option<String>,

        #[arg(long)]
        remarks: Option<String>,

        /// Primary agent actor ID
        #[arg(long)]
        agent: Option<String>,
    },

    /// Move a transaction to a lifecycle status
    Status {
        /// Transaction ID
        txn: String,

        /// Target status (draft, reserved, booked, sold, cancelled, expired, refunded)
        #[arg(short, long, value_parser = parse_transaction_status)]
        status: TransactionStatus,

        /// Cancellation reason, required when cancelling
        #[arg(short, long)]
        reason: Option<String>,
    },

    /// Show a transaction
    Show {
        /// Transaction ID
        txn: String,
    },
}

pub fn parse_property_kind(value: &str) -> Result<PropertyKind, String> {
    match value.to_ascii_lowercase().as_str() {
        "land" => Ok(PropertyKind::Land),
        "house" => Ok(PropertyKind::House),
        "condo" => Ok(PropertyKind::Condo),
        "commercial" => Ok(PropertyKind::Commercial),
        other => Err(format!("unknown property kind: {other}")),
    }
}

pub fn parse_pricing_mode(value: &str) -> Result<PricingMode, String> {
    match value.to_ascii_lowercase().as_str() {
        "simple" => Ok(PricingMode::Simple),
        "full" => Ok(PricingMode::Full),
        other => Err(format!("unknown pricing mode: {other}")),
    }
}

pub fn parse_financing(value: &str) -> Result<Financing, String> {
    match value.to_ascii_lowercase().as_str() {
        "cash" => Ok(Financing::Cash),
        "bank" => Ok(Financing::Bank),
        "in_house" | "in-house" => Ok(Financing::InHouse),
        "other" => Ok(Financing::Other),
        other => Err(format!("unknown financing method: {other}")),
    }
}

pub fn parse_transaction_status(value: &str) -> Result<TransactionStatus, String> {
    match value.to_ascii_uppercase().as_str() {
        "DRAFT" => Ok(TransactionStatus::Draft),
        "RESERVED" => Ok(TransactionStatus::Reserved),
        "BOOKED" => Ok(TransactionStatus::Booked),
        "SOLD" => Ok(TransactionStatus::Sold),
        "CANCELLED" => Ok(TransactionStatus::Cancelled),
        "EXPIRED" => Ok(TransactionStatus::Expired),
        "REFUNDED" => Ok(TransactionStatus::Refunded),
        other => Err(format!("unknown transaction status: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_property_kind() {
        assert_eq!(parse_property_kind("Land").unwrap(), PropertyKind::Land);
        assert!(parse_property_kind("castle").is_err());
    }

    #[test]
    fn test_parse_transaction_status() {
        assert_eq!(
            parse_transaction_status("reserved").unwrap(),
            TransactionStatus::Reserved
        );
        assert!(parse_transaction_status("pending").is_err());
    }

    #[test]
    fn test_parse_financing() {
        assert_eq!(parse_financing("in-house").unwrap(), Financing::InHouse);
        assert_eq!(parse_financing("CASH").unwrap(), Financing::Cash);
    }

    #[test]
    fn test_cli_parses_submit() {
        let cli = Cli::try_parse_from([
            "dealbook", "deal", "submit", "lst_1", "--buyer", "buyer_1", "--amount", "2500000",
        ])
        .unwrap();

        match cli.command {
            Commands::Deal {
                action: DealAction::Submit { listing, buyer, amount, list_price, .. },
            } => {
                assert_eq!(listing, "lst_1");
                assert_eq!(buyer, "buyer_1");
                assert_eq!(amount, Some(2_500_000));
                assert!(!list_price);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
