//! Billing provider access: the Asaas REST client, a static fixture source
//! for demos and tests, and the `BillingSource` trait both implement.

pub mod asaas;
pub mod fixture;
pub mod params;
pub mod source;

pub use asaas::AsaasClient;
pub use fixture::{FixtureData, FixtureSource};
pub use params::ListParams;
pub use source::{build_source, BillingSource, SharedSource};
