// Applicant persistence and the admin endpoints over it.

pub mod handlers;
pub mod store;
