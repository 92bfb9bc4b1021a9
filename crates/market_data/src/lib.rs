pub mod extract;
pub mod price_cache;
pub mod remote;
