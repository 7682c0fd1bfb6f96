//! Membership registration on top of the backend document store

pub mod auth;
pub mod clock;
pub mod config;
pub mod document_store;
pub mod membership_card;
pub mod provisioning;
pub mod request_desk;
pub mod user_directory;
pub mod user_profile;

pub use auth::SessionManager;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{BackendConfig, BucketIds, CollectionIds};
pub use document_store::{DocumentStore, Stored};
pub use membership_card::{generate_card_number, MembershipCard};
pub use provisioning::{NewRegistration, Provisioner, Registration};
pub use request_desk::{Request, RequestDesk};
pub use user_directory::UserDirectory;
pub use user_profile::{Role, UserProfile};
