pub mod catalog;
pub mod domain;
pub mod enrichment;
pub mod ports;

pub use catalog::{AuthContext, BookField, CatalogError, InvalidBook};
pub use domain::{Book, NewBook, ProviderProfile, Session, SessionUser, Token, User};
pub use ports::{DatabaseService, IdentityProvider, PortError, PortResult};
