pub mod autotrade_service;
pub mod feed_poll_service;
pub mod price_refresh_service;
