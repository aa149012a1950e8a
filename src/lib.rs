//! Role-gated back-office core for a classified-ads marketplace.
//!
//! The crate models the admin side of the marketplace as three cooperating
//! pieces:
//!
//! - role-based authorization over free-form permission tags, where `all`
//!   grants everything and blocked principals are denied everything;
//! - a soft-delete lifecycle for ads and products (active, trashed, then
//!   restored or purged);
//! - an append-only audit log that receives one entry per successful
//!   mutation.
//!
//! [`Console`] ties them together behind explicit principal ids. The stores
//! ([`RoleRegistry`], [`PrincipalRegistry`], [`EntityStore`]) can also be used
//! directly, with the caller responsible for authorization.
//!
//! # Examples
//!
//! ```no_run
//! use futures::executor::block_on;
//! use rs_backoffice::{Ad, Console, PermissionSet, PrincipalId, RoleName};
//!
//! let console = Console::builder().build();
//! let admin = PrincipalId::try_from("admin").unwrap();
//! console
//!     .provision_principal(admin.clone(), "Admin", RoleName::try_from("admin").unwrap())
//!     .unwrap();
//!
//! let supervisor = RoleName::try_from("supervisor").unwrap();
//! let perms = PermissionSet::parse(["ads", "trash"]).unwrap();
//! block_on(console.create_role(&admin, supervisor, perms)).unwrap();
//!
//! let ad = Ad {
//!     title: "Komatsu PC200".into(),
//!     category: "excavator".into(),
//!     price: "2,500,000".into(),
//!     ..Ad::default()
//! };
//! let posted = block_on(console.post_ad(&admin, ad)).unwrap();
//! block_on(console.trash_ad(&admin, &posted.id)).unwrap();
//! # let _ = posted;
//! ```
#![forbid(unsafe_code)]

mod audit;
mod backup;
mod category;
mod clock;
mod comment;
mod console;
mod engine;
mod entity;
mod error;
mod listing;
mod lock;
mod message;
mod permission;
mod principal;
mod report;
mod role;
mod store;
mod types;

#[cfg(feature = "axum")]
pub mod axum;

pub use crate::audit::{Actor, AuditEntry, AuditId, AuditLog, AuditQuery};
pub use crate::backup::Backup;
pub use crate::category::{Categories, DEFAULT_CATEGORIES};
pub use crate::clock::{Clock, SystemClock};
pub use crate::comment::{Comment, CommentBoard, CommentStatus};
pub use crate::console::{BulkOutcome, Console, ConsoleBuilder};
pub use crate::engine::{Decision, Engine, EngineBuilder};
pub use crate::entity::{Entity, EntityStore, Titled};
pub use crate::error::{Error, ErrorKind, Result, StoreError};
pub use crate::listing::{Ad, AdKind, Listing, MachineSpecs, Product};
pub use crate::message::{Inbox, Message};
pub use crate::permission::{
    DefaultPermissionValidator, Permission, PermissionSet, PermissionValidator, tags,
};
pub use crate::principal::{Directory, Principal, PrincipalRegistry};
pub use crate::report::Report;
pub use crate::role::{BuiltinRole, Role, RoleRegistry};
pub use crate::store::{PrincipalStore, RoleStore, Store};
pub use crate::types::{CollectionName, CommentId, EntityId, MessageId, PrincipalId, RoleName};
