mod candidate;
mod order;

pub use candidate::AnnouncementCandidate;
pub use order::{Exchange, OrderRequest, OrderType, Product, TransactionType, Validity};
