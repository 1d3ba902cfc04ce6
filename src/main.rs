use tracing_subscriber::EnvFilter;

use marketplace::config::ClientConfig;
use marketplace::models::{ClientTab, Role, TicketTab, VendorTab};
use marketplace::state::ClientContext;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = ClientConfig::from_env();
    let bootstrap = config.bootstrap_session()?;

    let ctx = ClientContext::open(config)?;
    tracing::info!(
        api = %ctx.config.api_base_url,
        state_db = %ctx.config.state_db_path,
        "client state opened"
    );

    let session = match bootstrap {
        Some(s) => ctx.sessions.login(&s.user_id, s.role, &s.token)?,
        None => match ctx.sessions.restore()? {
            Some(s) => {
                tracing::info!(user_id = %s.user_id, role = s.role.as_str(), "session restored");
                s
            }
            None => {
                tracing::warn!("no session; set SESSION_USER_ID, SESSION_ROLE and SESSION_TOKEN");
                return Ok(());
            }
        },
    };

    match session.role {
        Role::Vendor => {
            let bookings = ctx.booking_controller(&session);
            bookings.refresh(1).await?;
            let counts = bookings.vendor_tab_counts();
            for tab in VendorTab::ALL {
                tracing::info!(tab = tab.as_str(), count = counts[&tab], "vendor bookings");
            }
        }
        Role::Client => {
            let bookings = ctx.booking_controller(&session);
            bookings.refresh(1).await?;
            let counts = bookings.client_tab_counts();
            for tab in ClientTab::ALL {
                tracing::info!(tab = tab.as_str(), count = counts[&tab], "client bookings");
            }

            let tickets = ctx.ticket_controller(&session);
            tickets.refresh(1).await?;
            let counts = tickets.tab_counts();
            for tab in TicketTab::ALL {
                tracing::info!(tab = tab.as_str(), count = counts[&tab], "tickets");
            }
        }
        Role::Admin => {
            tracing::info!("admin session has no booking list");
        }
    }

    let feed = ctx.notification_feed(&session);
    match feed.refresh(1).await {
        Ok(_) => tracing::info!(unread = feed.unread_count(), "notifications"),
        Err(e) => tracing::warn!(error = %e, "could not load notifications"),
    }

    Ok(())
}
