//! Basic session example
//!
//! Usage:
//!   ARCHIVE_USERNAME=siti ARCHIVE_PASSWORD=secret cargo run --example basic_session

use docarchive_rs_client::api::document::DocumentFilter;
use docarchive_rs_client::{ApiClient, ApiClientConfig, FileSessionStore, SessionEvent};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ApiClientConfig::from_env();
    let session_path = std::env::var("ARCHIVE_SESSION_FILE")
        .unwrap_or_else(|_| ".docarchive/session.json".to_string());
    let username = std::env::var("ARCHIVE_USERNAME").unwrap_or_else(|_| "admin".to_string());
    let password = std::env::var("ARCHIVE_PASSWORD").unwrap_or_else(|_| "admin".to_string());

    println!("=== Document Archive Client Example ===");
    println!("Backend: {}", config.base_url);
    println!("Session file: {}", session_path);
    println!();

    let client = ApiClient::new(config, FileSessionStore::new(&session_path))?;

    // Watch for forced logouts the way a UI would
    let mut events = client.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let SessionEvent::Expired {
                reason,
                redirect_to,
            } = event
            {
                println!("! Session expired ({reason}), go to {redirect_to}");
            }
        }
    });

    if client.is_authenticated() {
        println!("✓ Reusing stored session");
    } else {
        client.login(&username, &password).await?;
        println!("✓ Signed in as {}", username);
    }
    println!();

    let profile = client.profile().await?.profile;
    println!("Profile: {} ({}, {})", profile.name, profile.username, profile.role);

    let filter = DocumentFilter {
        limit: Some(10),
        ..Default::default()
    };
    let page = if profile.role.is_admin() {
        client.list_documents(&filter).await?
    } else {
        client.list_my_documents(&filter).await?
    };

    match page.data {
        Some(page) => {
            println!(
                "Documents (page {}/{}):",
                page.pagination.current_page, page.pagination.total_pages
            );
            for document in page.documents {
                println!("  - {} [{}]", document.subject, document.file_url);
            }
        }
        None => println!("No documents: {}", page.message),
    }

    Ok(())
}
