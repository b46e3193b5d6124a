//! Deal Lifecycle
//!
//! Walks one deal from lock to archive through `DealService`, showing a
//! step back, a rejected request and a snapshot round trip along the way.
//!
//! Run with: cargo run --example deal_lifecycle
//! Set RUST_LOG=debug to see every boundary event.

use deal_workflow::boundary::{AccessToken, DealService, InMemoryDealStore, StaticAuthorizer};
use deal_workflow::config::WorkflowConfig;
use deal_workflow::core::{ActorId, DealId, DealState, NewDeal};
use deal_workflow::snapshot::DealSnapshot;
use std::error::Error;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("=== Deal Lifecycle Example ===\n");

    let config = WorkflowConfig::from_env()?;
    let token = AccessToken::new("demo-admin-token");
    let authorizer = StaticAuthorizer::new().grant(token.clone(), ActorId::new("admin-ana"));
    let service = DealService::new(Arc::new(InMemoryDealStore::new()), Arc::new(authorizer))
        .with_config(config);

    let deal = service.create_deal(
        &token,
        NewDeal {
            deal_id: DealId::generate(),
            lock_request_id: "lock-2041".into(),
            listing_id: "listing-88".into(),
            mortgage_id: "mortgage-314".into(),
            investor_id: "investor-12".into(),
            purchase_percentage: 35.0,
            deal_value: 142_500.0,
        },
    )?;
    let id = deal.deal_id().clone();
    println!("Created deal {id} in '{}'", deal.current_state());

    service.confirm_lawyer(&id, &token, Some("Counsel engaged".into()))?;
    service.complete_docs(&id, &token, None)?;
    service.receive_funds(&id, &token, None)?;

    // Funds bounced: step back one state and try again.
    service.go_back(&id, &token, DealState::PendingDocs, Some("Wire returned".into()))?;
    service.receive_funds(&id, &token, Some("Second wire received".into()))?;

    // Skipping verification is rejected and changes nothing.
    if let Err(err) = service.complete_deal(&id, &token, None) {
        println!("Rejected: {err}");
        println!("  shown to user as: {}", err.user_message());
    }

    service.verify_funds(&id, &token, None)?;
    let completed = service.complete_deal(&id, &token, None)?;
    if completed.is_ownership_transfer() {
        println!("Ownership transfer triggered for investor {}", completed.deal.investor_id());
    }
    service.archive(&id, &token, None)?;

    println!("\nHistory:");
    for record in service.history(&id)? {
        println!(
            "  {} -> {} by {}{}",
            record.from_state,
            record.to_state,
            record.triggered_by,
            record
                .notes
                .as_deref()
                .map(|n| format!(" ({n})"))
                .unwrap_or_default()
        );
    }

    let snapshot = DealSnapshot::capture(&service.get_deal(&id)?);
    let json = snapshot.to_json()?;
    let restored = DealSnapshot::from_json(&json)?.into_deal();
    println!(
        "\nSnapshot restored: state '{}', {} transitions, {} bytes as JSON",
        restored.current_state(),
        restored.state_history().len(),
        json.len()
    );

    Ok(())
}
