//! BDD coverage for the block volume provisioner.

mod bdd_steps;
mod scenarios;
mod test_helpers;
