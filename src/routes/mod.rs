pub mod assignments;

pub mod reconcile;

pub mod submissions;

pub use assignments::configure_assignments_routes;
pub use reconcile::configure_reconcile_routes;
pub use submissions::configure_submissions_routes;
