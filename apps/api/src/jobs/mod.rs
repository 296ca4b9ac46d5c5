// Read-only access to job posts: lookup for the screening pipeline and public listing.

pub mod handlers;
pub mod store;
