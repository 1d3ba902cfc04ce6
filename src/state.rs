use std::sync::Arc;

use crate::api::ApiClient;
use crate::cache::EntityCache;
use crate::config::ClientConfig;
use crate::db::{self, Db};
use crate::errors::Result;
use crate::models::{Booking, Session, Ticket};
use crate::services::bookings::BookingController;
use crate::services::notifications::{NotificationFeed, PushTokenRegistrar};
use crate::services::ticket_pass::HttpQrFetcher;
use crate::services::tickets::TicketController;
use crate::services::upload::CloudinaryHost;
use crate::session::SessionStore;

/// Everything a signed-in client needs, built once per process. Booking and
/// ticket caches are shared so every view reads the same records.
pub struct ClientContext {
    pub config: ClientConfig,
    pub db: Db,
    pub sessions: SessionStore,
    pub bookings: Arc<EntityCache<Booking>>,
    pub tickets: Arc<EntityCache<Ticket>>,
}

impl ClientContext {
    pub fn open(config: ClientConfig) -> Result<Self> {
        let db = db::open_shared(&config.state_db_path)?;
        Ok(Self {
            sessions: SessionStore::new(db.clone()),
            db,
            config,
            bookings: Arc::new(EntityCache::new()),
            tickets: Arc::new(EntityCache::new()),
        })
    }

    pub fn api(&self, session: Option<&Session>) -> ApiClient {
        ApiClient::new(self.config.api_base_url.clone(), session)
    }

    pub fn booking_controller(&self, session: &Session) -> BookingController {
        BookingController::new(
            Arc::new(self.api(Some(session))),
            self.bookings.clone(),
            session.role,
            self.config.page_size,
        )
    }

    pub fn ticket_controller(&self, session: &Session) -> TicketController {
        TicketController::new(
            Arc::new(self.api(Some(session))),
            self.tickets.clone(),
            Arc::new(HttpQrFetcher::new()),
            self.config.page_size,
        )
    }

    pub fn notification_feed(&self, session: &Session) -> NotificationFeed {
        NotificationFeed::new(Arc::new(self.api(Some(session))), self.config.page_size)
    }

    pub fn push_registrar(&self, session: &Session) -> PushTokenRegistrar {
        PushTokenRegistrar::new(Arc::new(self.api(Some(session))), self.db.clone())
    }

    pub fn image_host(&self) -> Result<CloudinaryHost> {
        CloudinaryHost::new(&self.config)
    }
}
