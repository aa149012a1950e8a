//! Admin console: the authorization boundary in front of the stores.
//!
//! Every method takes the id of the principal acting, checks the permission
//! tag guarding the operation and only then calls into the core. A denied
//! call returns [`Error::Unauthorized`] without touching any store, so it
//! leaves no audit entry behind.

use std::sync::Arc;

use crate::audit::{Actor, AuditLog, AuditQuery};
use crate::backup::Backup;
use crate::category::{Categories, DEFAULT_CATEGORIES};
use crate::clock::{Clock, SystemClock};
use crate::comment::{Comment, CommentBoard, CommentStatus};
use crate::engine::{Decision, Engine, EngineBuilder};
use crate::entity::{Entity, EntityStore};
use crate::error::{Error, Result};
use crate::listing::{Ad, Listing, Product};
use crate::message::{Inbox, Message};
use crate::permission::{Permission, PermissionSet, tags};
use crate::principal::{Directory, Principal, PrincipalRegistry};
use crate::report::Report;
use crate::role::{Role, RoleRegistry};
use crate::store::PrincipalStore;
use crate::types::{CollectionName, CommentId, EntityId, PrincipalId, RoleName};

/// Result of a bulk action: each id succeeds or fails on its own.
#[derive(Debug, Default)]
pub struct BulkOutcome {
    pub succeeded: Vec<EntityId>,
    pub failed: Vec<(EntityId, Error)>,
}

impl BulkOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Builder for [`Console`].
pub struct ConsoleBuilder {
    clock: Arc<dyn Clock>,
    seed_builtin_roles: bool,
    categories: Vec<String>,
    enable_wildcard: bool,
}

impl Default for ConsoleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleBuilder {
    /// Creates a builder: system clock, built-in roles seeded, stock
    /// categories, `all` wildcard enabled.
    pub fn new() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            seed_builtin_roles: true,
            categories: DEFAULT_CATEGORIES.iter().map(|name| name.to_string()).collect(),
            enable_wildcard: true,
        }
    }

    /// Sets the timestamp source.
    pub fn clock(mut self, clock: impl Clock) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Seeds `admin`, `manager`, `moderator` and `user` with stock permissions.
    ///
    /// When off the registry starts empty; the built-in names stay protected.
    pub fn seed_builtin_roles(mut self, on: bool) -> Self {
        self.seed_builtin_roles = on;
        self
    }

    /// Replaces the initial category list.
    pub fn categories<I, T>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.categories = names.into_iter().map(Into::into).collect();
        self
    }

    /// Enables or disables the `all` wildcard in authorization.
    pub fn enable_wildcard(mut self, on: bool) -> Self {
        self.enable_wildcard = on;
        self
    }

    pub fn build(self) -> Console {
        let audit = AuditLog::with_clock(Arc::clone(&self.clock));
        let roles = if self.seed_builtin_roles {
            RoleRegistry::with_builtin_roles(audit.clone())
        } else {
            RoleRegistry::new(audit.clone())
        };
        let principals = PrincipalRegistry::new(roles, audit.clone());
        let engine = EngineBuilder::new(Directory::new(principals))
            .enable_wildcard(self.enable_wildcard)
            .build();
        Console {
            engine,
            entities: EntityStore::new(audit.clone()),
            categories: Categories::new(audit.clone(), self.categories),
            comments: CommentBoard::new(audit.clone()),
            inbox: Inbox::new(self.clock),
            audit,
        }
    }
}

/// Permission-gated facade over roles, principals, listings and moderation.
#[derive(Debug)]
pub struct Console {
    engine: Engine<Directory>,
    entities: EntityStore<Listing>,
    categories: Categories,
    comments: CommentBoard,
    inbox: Inbox,
    audit: AuditLog,
}

impl Console {
    pub fn builder() -> ConsoleBuilder {
        ConsoleBuilder::new()
    }

    pub fn engine(&self) -> &Engine<Directory> {
        &self.engine
    }

    /// Shared audit sink, for hosts that mirror or export it.
    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    fn roles(&self) -> &RoleRegistry {
        self.engine.store().roles()
    }

    fn principals(&self) -> &PrincipalRegistry {
        self.engine.store().principals()
    }

    async fn require(&self, principal: &PrincipalId, tag: &str) -> Result<Actor> {
        self.require_either(principal, tag, None).await
    }

    async fn require_either(
        &self,
        principal: &PrincipalId,
        tag: &str,
        alternate: Option<&str>,
    ) -> Result<Actor> {
        let required = Permission::from_string(tag.to_string());
        let mut candidates = vec![required.clone()];
        if let Some(alternate) = alternate {
            candidates.push(Permission::from_string(alternate.to_string()));
        }
        match self.engine.authorize_any(principal, &candidates).await? {
            Decision::Allow => Ok(Actor::from(principal)),
            Decision::Deny => {
                tracing::debug!(principal = %principal, permission = %required, "console call denied");
                Err(Error::Unauthorized {
                    principal: principal.clone(),
                    permission: required,
                })
            }
        }
    }

    /// Permissions in effect for `principal`; drives which panels a UI shows.
    pub async fn effective_permissions(&self, principal: &PrincipalId) -> Result<PermissionSet> {
        self.engine.effective_permissions(principal).await
    }

    // --- roles ---

    pub async fn create_role(
        &self,
        who: &PrincipalId,
        name: RoleName,
        permissions: PermissionSet,
    ) -> Result<Role> {
        let actor = self.require(who, tags::ROLES).await?;
        self.roles().create_role(&actor, name, permissions)
    }

    pub async fn delete_role(&self, who: &PrincipalId, name: &RoleName) -> Result<Role> {
        let actor = self.require(who, tags::ROLES).await?;
        self.roles().delete_role(&actor, name)
    }

    pub async fn set_role_permissions(
        &self,
        who: &PrincipalId,
        name: &RoleName,
        permissions: PermissionSet,
    ) -> Result<Role> {
        let actor = self.require(who, tags::ROLES).await?;
        self.roles().set_permissions(&actor, name, permissions)
    }

    pub async fn list_roles(&self, who: &PrincipalId) -> Result<Vec<Role>> {
        self.require(who, tags::ROLES).await?;
        Ok(self.roles().list())
    }

    // --- principals ---

    /// Registers an account issued by the identity provider, attributed to
    /// [`Actor::System`]. Used to bootstrap the first administrator.
    pub fn provision_principal(
        &self,
        id: PrincipalId,
        display_name: &str,
        role: RoleName,
    ) -> Result<Principal> {
        self.principals()
            .create_principal_with_id(&Actor::System, id, display_name, role)
    }

    pub async fn create_principal(
        &self,
        who: &PrincipalId,
        display_name: &str,
        role: RoleName,
    ) -> Result<Principal> {
        let actor = self.require(who, tags::USERS).await?;
        self.principals().create_principal(&actor, display_name, role)
    }

    pub async fn set_principal_role(
        &self,
        who: &PrincipalId,
        target: &PrincipalId,
        role: RoleName,
    ) -> Result<Principal> {
        let actor = self.require(who, tags::USERS).await?;
        self.principals().set_role(&actor, target, role)
    }

    pub async fn set_blocked(
        &self,
        who: &PrincipalId,
        target: &PrincipalId,
        blocked: bool,
    ) -> Result<Principal> {
        let actor = self
            .require_either(who, tags::USERS, Some(tags::BLOCKED))
            .await?;
        self.principals().set_blocked(&actor, target, blocked)
    }

    pub async fn delete_principal(&self, who: &PrincipalId, target: &PrincipalId) -> Result<Principal> {
        let actor = self.require(who, tags::USERS).await?;
        self.principals().delete_principal(&actor, target)
    }

    pub async fn list_principals(&self, who: &PrincipalId) -> Result<Vec<Principal>> {
        self.require(who, tags::USERS).await?;
        Ok(self.principals().list())
    }

    pub async fn list_blocked(&self, who: &PrincipalId) -> Result<Vec<Principal>> {
        self.require_either(who, tags::BLOCKED, Some(tags::USERS))
            .await?;
        Ok(self.principals().list_blocked())
    }

    // --- ads ---

    /// Publishes a new ad; title, category and price are required.
    pub async fn post_ad(&self, who: &PrincipalId, ad: Ad) -> Result<Entity<Listing>> {
        let actor = self.require(who, tags::ADS).await?;
        ad.validate()?;
        Ok(self
            .entities
            .insert(&actor, &CollectionName::ads(), Listing::Ad(ad)))
    }

    /// Edits an active ad. The edited ad must still pass validation.
    ///
    /// The edit runs on the stored ad under the store's write lock; a
    /// rejected edit leaves the ad untouched.
    pub async fn update_ad<F>(&self, who: &PrincipalId, id: &EntityId, edit: F) -> Result<Entity<Listing>>
    where
        F: FnOnce(&mut Ad),
    {
        let actor = self.require(who, tags::ADS).await?;
        let collection = CollectionName::ads();
        self.entities.update(&actor, &collection, id, |listing| {
            let mut ad = listing
                .as_ad()
                .cloned()
                .ok_or_else(|| not_found(&collection, id))?;
            edit(&mut ad);
            ad.validate()?;
            Ok(Listing::Ad(ad))
        })
    }

    /// Flips the featured (VIP) flag of an active ad.
    pub async fn toggle_featured(&self, who: &PrincipalId, id: &EntityId) -> Result<Entity<Listing>> {
        let actor = self.require_either(who, tags::ADS, Some(tags::VIP)).await?;
        self.flip_featured(&actor, id)
    }

    pub async fn trash_ad(&self, who: &PrincipalId, id: &EntityId) -> Result<Entity<Listing>> {
        let actor = self.require(who, tags::ADS).await?;
        self.entities.soft_delete(&actor, &CollectionName::ads(), id)
    }

    /// Moves every listed ad to the trash; one audit entry per success.
    pub async fn bulk_trash_ads(&self, who: &PrincipalId, ids: &[EntityId]) -> Result<BulkOutcome> {
        let actor = self.require(who, tags::ADS).await?;
        let collection = CollectionName::ads();
        Ok(bulk(ids, |id| {
            self.entities.soft_delete(&actor, &collection, id)
        }))
    }

    pub async fn bulk_toggle_featured(
        &self,
        who: &PrincipalId,
        ids: &[EntityId],
    ) -> Result<BulkOutcome> {
        let actor = self.require_either(who, tags::ADS, Some(tags::VIP)).await?;
        Ok(bulk(ids, |id| self.flip_featured(&actor, id)))
    }

    pub async fn list_ads(&self, who: &PrincipalId) -> Result<Vec<Entity<Listing>>> {
        self.require(who, tags::ADS).await?;
        Ok(self.entities.list_active(&CollectionName::ads()))
    }

    // --- products ---

    pub async fn add_product(&self, who: &PrincipalId, product: Product) -> Result<Entity<Listing>> {
        let actor = self.require(who, tags::PRODUCTS).await?;
        product.validate()?;
        Ok(self
            .entities
            .insert(&actor, &CollectionName::products(), Listing::Product(product)))
    }

    pub async fn update_product<F>(
        &self,
        who: &PrincipalId,
        id: &EntityId,
        edit: F,
    ) -> Result<Entity<Listing>>
    where
        F: FnOnce(&mut Product),
    {
        let actor = self.require(who, tags::PRODUCTS).await?;
        let collection = CollectionName::products();
        self.entities.update(&actor, &collection, id, |listing| {
            let mut product = listing
                .as_product()
                .cloned()
                .ok_or_else(|| not_found(&collection, id))?;
            edit(&mut product);
            product.validate()?;
            Ok(Listing::Product(product))
        })
    }

    pub async fn trash_product(&self, who: &PrincipalId, id: &EntityId) -> Result<Entity<Listing>> {
        let actor = self.require(who, tags::PRODUCTS).await?;
        self.entities
            .soft_delete(&actor, &CollectionName::products(), id)
    }

    pub async fn list_products(&self, who: &PrincipalId) -> Result<Vec<Entity<Listing>>> {
        self.require(who, tags::PRODUCTS).await?;
        Ok(self.entities.list_active(&CollectionName::products()))
    }

    // --- trash ---

    pub async fn list_trashed(
        &self,
        who: &PrincipalId,
        collection: &CollectionName,
    ) -> Result<Vec<Entity<Listing>>> {
        self.require(who, tags::TRASH).await?;
        Ok(self.entities.list_trashed(collection))
    }

    pub async fn restore(
        &self,
        who: &PrincipalId,
        collection: &CollectionName,
        id: &EntityId,
    ) -> Result<Entity<Listing>> {
        let actor = self.require(who, tags::TRASH).await?;
        self.entities.restore(&actor, collection, id)
    }

    pub async fn purge(
        &self,
        who: &PrincipalId,
        collection: &CollectionName,
        id: &EntityId,
    ) -> Result<Entity<Listing>> {
        let actor = self.require(who, tags::TRASH).await?;
        self.entities.purge(&actor, collection, id)
    }

    // --- categories ---

    /// Category names; public, used by the posting form and search filters.
    pub fn categories(&self) -> Vec<String> {
        self.categories.list()
    }

    pub async fn add_category(&self, who: &PrincipalId, name: &str) -> Result<String> {
        let actor = self.require(who, tags::CATEGORIES).await?;
        self.categories.add(&actor, name)
    }

    pub async fn delete_category(&self, who: &PrincipalId, name: &str) -> Result<String> {
        let actor = self.require(who, tags::CATEGORIES).await?;
        self.categories.remove(&actor, name)
    }

    // --- comments ---

    /// Posts a pending review on an active product.
    ///
    /// Any known, unblocked principal may comment; the author shown is the
    /// principal's display name.
    pub async fn submit_comment(
        &self,
        who: &PrincipalId,
        product: &EntityId,
        rating: u8,
        content: &str,
    ) -> Result<Comment> {
        let author = self
            .engine
            .store()
            .principal(who)
            .await
            .map_err(Error::from)?
            .filter(|principal| !principal.blocked)
            .ok_or_else(|| Error::Unauthorized {
                principal: who.clone(),
                permission: Permission::from_string(tags::COMMENTS.to_string()),
            })?;
        let collection = CollectionName::products();
        let listed = self
            .entities
            .get(&collection, product)
            .is_some_and(|entity| !entity.is_trashed());
        if !listed {
            return Err(Error::NotFound {
                collection,
                id: product.clone(),
            });
        }
        self.comments.submit(
            &Actor::from(who),
            product.clone(),
            &author.display_name,
            rating,
            content,
        )
    }

    pub async fn approve_comment(&self, who: &PrincipalId, id: &CommentId) -> Result<Comment> {
        let actor = self.require(who, tags::COMMENTS).await?;
        self.comments.approve(&actor, id)
    }

    pub async fn reject_comment(&self, who: &PrincipalId, id: &CommentId) -> Result<Comment> {
        let actor = self.require(who, tags::COMMENTS).await?;
        self.comments.reject(&actor, id)
    }

    pub async fn delete_comment(&self, who: &PrincipalId, id: &CommentId) -> Result<Comment> {
        let actor = self.require(who, tags::COMMENTS).await?;
        self.comments.delete(&actor, id)
    }

    pub async fn list_comments(&self, who: &PrincipalId) -> Result<Vec<Comment>> {
        self.require(who, tags::COMMENTS).await?;
        Ok(self.comments.list())
    }

    // --- messages ---

    pub async fn send_message(&self, who: &PrincipalId, content: &str) -> Result<Message> {
        self.require(who, tags::MESSAGES).await?;
        self.inbox.send(who, content)
    }

    pub async fn list_messages(&self, who: &PrincipalId) -> Result<Vec<Message>> {
        self.require(who, tags::MESSAGES).await?;
        Ok(self.inbox.list())
    }

    // --- reporting ---

    /// Audit trail, most recent entry first.
    pub async fn audit_log(&self, who: &PrincipalId) -> Result<AuditQuery> {
        self.require(who, tags::AUDIT).await?;
        Ok(self.audit.query())
    }

    /// Marketplace counters for the reports panel.
    pub async fn report(&self, who: &PrincipalId) -> Result<Report> {
        self.require(who, tags::REPORTS).await?;
        let ads = CollectionName::ads();
        let products = CollectionName::products();
        let principals = self.principals().list();
        let mut report = Report {
            generated_at: self.audit.clock().now(),
            ads: 0,
            ads_for_rent: 0,
            ads_for_sale: 0,
            featured_ads: 0,
            products: self.entities.list_active(&products).len(),
            principals: principals.len(),
            blocked_principals: principals.iter().filter(|p| p.blocked).count(),
            trashed: self.entities.list_trashed(&ads).len()
                + self.entities.list_trashed(&products).len(),
            pending_comments: self.comments.list_by_status(CommentStatus::Pending).len(),
        };
        report.count_ads(&self.entities.list_active(&ads));
        Ok(report)
    }

    /// Snapshot of everything the console manages.
    pub async fn backup(&self, who: &PrincipalId) -> Result<Backup> {
        self.require(who, tags::BACKUP).await?;
        let ads = CollectionName::ads();
        let products = CollectionName::products();
        let mut trash = self.entities.list_trashed(&ads);
        trash.extend(self.entities.list_trashed(&products));
        Ok(Backup {
            taken_at: self.audit.clock().now(),
            ads: self.entities.list_active(&ads),
            products: self.entities.list_active(&products),
            trash,
            categories: self.categories.list(),
            roles: self.roles().list(),
            principals: self.principals().list(),
            messages: self.inbox.list(),
        })
    }

    fn flip_featured(&self, actor: &Actor, id: &EntityId) -> Result<Entity<Listing>> {
        let collection = CollectionName::ads();
        self.entities.update(actor, &collection, id, |listing| {
            let mut ad = listing
                .as_ad()
                .cloned()
                .ok_or_else(|| not_found(&collection, id))?;
            ad.featured = !ad.featured;
            Ok(Listing::Ad(ad))
        })
    }
}

fn not_found(collection: &CollectionName, id: &EntityId) -> Error {
    Error::NotFound {
        collection: collection.clone(),
        id: id.clone(),
    }
}

fn bulk<F>(ids: &[EntityId], mut apply: F) -> BulkOutcome
where
    F: FnMut(&EntityId) -> Result<Entity<Listing>>,
{
    let mut outcome = BulkOutcome::default();
    for id in ids {
        match apply(id) {
            Ok(_) => outcome.succeeded.push(id.clone()),
            Err(err) => outcome.failed.push((id.clone(), err)),
        }
    }
    outcome
}
