use crate::{
    AccessType, ConsistencyError, EntityKind, MonitorId, ReferenceMonitor, RegistryConfig,
    RegistryState, Request, Right, RoleId, RolegateRegistryError, ServiceId, UserId, verify,
};
use parking_lot::RwLockReadGuard;
use rolegate_common::SharedCell;
use rolegate_invocation::{Handle, Service, invoke};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// A role-based access-control registry.
///
/// The registry tracks users, roles and services together with two
/// relations between them: *membership* (user to role) and *authorization*
/// (role to service). A user may invoke a service when one of its roles is
/// authorized for it; [`Registry::request`] checks this and, if granted,
/// starts the service body and hands back its [`Handle`].
///
/// All state sits behind one reader-writer lock. Every mutation, including
/// the removal of an entity together with the relation rows that mention
/// it, is a single critical section; queries never observe it half done.
///
/// ```
/// use rolegate::Registry;
///
/// let registry = Registry::default();
/// let user = registry.create_user("ada").unwrap();
/// let role = registry.create_role("admin").unwrap();
/// registry.assign_role(user, role).unwrap();
///
/// assert_eq!(registry.roles_of(user).unwrap(), vec![role]);
/// ```
pub struct Registry {
    state: SharedCell<RegistryState>,
    config: RegistryConfig,
    next_monitor: AtomicU64,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

impl Registry {
    /// Creates an empty registry.
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            state: SharedCell::new(RegistryState::default()),
            config,
            next_monitor: AtomicU64::new(0),
        }
    }

    /// The configuration this registry was created with.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// A consistent read-only view of the whole registry. Mutations wait
    /// until the view is dropped.
    pub fn snapshot(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read()
    }

    fn mutate<T, F>(&self, change: F) -> Result<T, RolegateRegistryError>
    where
        F: FnOnce(&mut RegistryState) -> Result<T, RolegateRegistryError>,
    {
        let mut state = self.state.write();
        let value = change(&mut state)?;

        if self.config.verify_mutations {
            if let Err(error) = verify(&state) {
                tracing::error!(%error, "Registry invariant broken");
                return Err(error.into());
            }
        }

        Ok(value)
    }

    fn query<T, F>(&self, read: F) -> T
    where
        F: FnOnce(&RegistryState) -> T,
    {
        read(&self.state.read())
    }

    // Users

    /// Adds a user.
    pub fn create_user(&self, name: &str) -> Result<UserId, RolegateRegistryError> {
        let user = self.mutate(|state| state.users.insert(name, ()))?;
        tracing::info!(%user, name, "User created");
        Ok(user)
    }

    /// Removes a user along with all of its role assignments.
    pub fn remove_user(&self, user: UserId) -> Result<(), RolegateRegistryError> {
        let purged = self.mutate(|state| state.remove_user(user))?;
        tracing::info!(%user, memberships = purged, "User removed");
        Ok(())
    }

    /// Removes the user going by `name`, returning the identifier it had.
    pub fn remove_user_by_name(&self, name: &str) -> Result<UserId, RolegateRegistryError> {
        let (user, purged) = self.mutate(|state| {
            let user = state.users.resolve(name)?;
            Ok((user, state.remove_user(user)?))
        })?;
        tracing::info!(%user, name, memberships = purged, "User removed");
        Ok(user)
    }

    /// Resolves a user's name.
    pub fn user_id(&self, name: &str) -> Result<UserId, RolegateRegistryError> {
        self.query(|state| state.users.resolve(name))
    }

    /// The name of a user.
    pub fn user_name(&self, user: UserId) -> Result<String, RolegateRegistryError> {
        self.query(|state| state.users.name_of(user).map(str::to_string))
            .ok_or(RolegateRegistryError::NotFound {
                kind: EntityKind::User,
                id: user.0,
            })
    }

    /// Returns true if the user exists.
    pub fn has_user(&self, user: UserId) -> bool {
        self.query(|state| state.users.exists(user))
    }

    /// All users with their names, in ascending identifier order.
    pub fn users(&self) -> Vec<(UserId, String)> {
        self.query(|state| {
            state
                .users
                .iter()
                .map(|(id, name)| (id, name.to_string()))
                .collect()
        })
    }

    // Roles

    /// Adds a role.
    pub fn create_role(&self, name: &str) -> Result<RoleId, RolegateRegistryError> {
        let role = self.mutate(|state| state.roles.insert(name, ()))?;
        tracing::info!(%role, name, "Role created");
        Ok(role)
    }

    /// Removes a role along with its memberships and authorizations.
    pub fn remove_role(&self, role: RoleId) -> Result<(), RolegateRegistryError> {
        let (memberships, authorizations) = self.mutate(|state| state.remove_role(role))?;
        tracing::info!(%role, memberships, authorizations, "Role removed");
        Ok(())
    }

    /// Removes the role going by `name`, returning the identifier it had.
    pub fn remove_role_by_name(&self, name: &str) -> Result<RoleId, RolegateRegistryError> {
        let (role, (memberships, authorizations)) = self.mutate(|state| {
            let role = state.roles.resolve(name)?;
            Ok((role, state.remove_role(role)?))
        })?;
        tracing::info!(%role, name, memberships, authorizations, "Role removed");
        Ok(role)
    }

    /// Resolves a role's name.
    pub fn role_id(&self, name: &str) -> Result<RoleId, RolegateRegistryError> {
        self.query(|state| state.roles.resolve(name))
    }

    /// The name of a role.
    pub fn role_name(&self, role: RoleId) -> Result<String, RolegateRegistryError> {
        self.query(|state| state.roles.name_of(role).map(str::to_string))
            .ok_or(RolegateRegistryError::NotFound {
                kind: EntityKind::Role,
                id: role.0,
            })
    }

    /// Returns true if the role exists.
    pub fn has_role(&self, role: RoleId) -> bool {
        self.query(|state| state.roles.exists(role))
    }

    /// All roles with their names, in ascending identifier order.
    pub fn roles(&self) -> Vec<(RoleId, String)> {
        self.query(|state| {
            state
                .roles
                .iter()
                .map(|(id, name)| (id, name.to_string()))
                .collect()
        })
    }

    // Services

    /// Registers a service under its own name.
    pub fn register_service(
        &self,
        service: Arc<dyn Service>,
    ) -> Result<ServiceId, RolegateRegistryError> {
        let name = service.name().to_string();
        let id = self.mutate(|state| state.services.insert(name.as_str(), service))?;
        tracing::info!(service = %id, name = %name, "Service registered");
        Ok(id)
    }

    /// Removes a service along with every authorization to invoke it.
    /// Invocations already underway are unaffected.
    pub fn remove_service(&self, service: ServiceId) -> Result<(), RolegateRegistryError> {
        let purged = self.mutate(|state| state.remove_service(service))?;
        tracing::info!(%service, authorizations = purged, "Service removed");
        Ok(())
    }

    /// Removes the service registered as `name`, returning the identifier
    /// it had.
    pub fn remove_service_by_name(&self, name: &str) -> Result<ServiceId, RolegateRegistryError> {
        let (service, purged) = self.mutate(|state| {
            let service = state.services.resolve(name)?;
            Ok((service, state.remove_service(service)?))
        })?;
        tracing::info!(%service, name, authorizations = purged, "Service removed");
        Ok(service)
    }

    /// Resolves a service's name.
    pub fn service_id(&self, name: &str) -> Result<ServiceId, RolegateRegistryError> {
        self.query(|state| state.services.resolve(name))
    }

    /// The name of a service.
    pub fn service_name(&self, service: ServiceId) -> Result<String, RolegateRegistryError> {
        self.query(|state| state.services.name_of(service).map(str::to_string))
            .ok_or(RolegateRegistryError::NotFound {
                kind: EntityKind::Service,
                id: service.0,
            })
    }

    /// Returns true if the service exists.
    pub fn has_service(&self, service: ServiceId) -> bool {
        self.query(|state| state.services.exists(service))
    }

    /// All services with their names, in ascending identifier order.
    pub fn services(&self) -> Vec<(ServiceId, String)> {
        self.query(|state| {
            state
                .services
                .iter()
                .map(|(id, name)| (id, name.to_string()))
                .collect()
        })
    }

    // Membership

    /// Gives `user` the `role`.
    pub fn assign_role(&self, user: UserId, role: RoleId) -> Result<(), RolegateRegistryError> {
        self.mutate(|state| state.assign(user, role))?;
        tracing::debug!(%user, %role, "Role assigned");
        Ok(())
    }

    /// Gives the user going by `user` the role going by `role`. Both names
    /// are resolved in the same critical section as the assignment.
    pub fn assign_role_by_name(
        &self,
        user: &str,
        role: &str,
    ) -> Result<(UserId, RoleId), RolegateRegistryError> {
        let (user, role) = self.mutate(|state| {
            let ids = (state.users.resolve(user)?, state.roles.resolve(role)?);
            state.assign(ids.0, ids.1)?;
            Ok(ids)
        })?;
        tracing::debug!(%user, %role, "Role assigned");
        Ok((user, role))
    }

    /// Takes the `role` away from `user`.
    pub fn unassign_role(&self, user: UserId, role: RoleId) -> Result<(), RolegateRegistryError> {
        self.mutate(|state| state.unassign(user, role))?;
        tracing::debug!(%user, %role, "Role unassigned");
        Ok(())
    }

    /// Takes the role going by `role` away from the user going by `user`.
    pub fn unassign_role_by_name(
        &self,
        user: &str,
        role: &str,
    ) -> Result<(UserId, RoleId), RolegateRegistryError> {
        let (user, role) = self.mutate(|state| {
            let ids = (state.users.resolve(user)?, state.roles.resolve(role)?);
            state.unassign(ids.0, ids.1)?;
            Ok(ids)
        })?;
        tracing::debug!(%user, %role, "Role unassigned");
        Ok((user, role))
    }

    /// Returns true if `user` holds `role`.
    pub fn is_member_of(&self, user: UserId, role: RoleId) -> Result<bool, RolegateRegistryError> {
        self.query(|state| state.is_member(user, role))
    }

    /// Returns true if the user going by `user` holds the role going by
    /// `role`.
    pub fn is_member_of_by_name(
        &self,
        user: &str,
        role: &str,
    ) -> Result<bool, RolegateRegistryError> {
        self.query(|state| {
            state.is_member(state.users.resolve(user)?, state.roles.resolve(role)?)
        })
    }

    /// Roles held by `user`, in ascending order.
    pub fn roles_of(&self, user: UserId) -> Result<Vec<RoleId>, RolegateRegistryError> {
        self.query(|state| state.roles_of(user))
    }

    /// Users holding `role`, in ascending order.
    pub fn members_of(&self, role: RoleId) -> Result<Vec<UserId>, RolegateRegistryError> {
        self.query(|state| state.members_of(role))
    }

    // Authorization

    /// Lets `role` invoke `service`.
    pub fn authorize_role(
        &self,
        role: RoleId,
        service: ServiceId,
        access_type: impl Into<AccessType>,
    ) -> Result<Right, RolegateRegistryError> {
        let right = Right::new(role, service, access_type);
        self.mutate(|state| state.authorize(right))?;
        tracing::debug!(%role, %service, access_type = right.access_type.0, "Role authorized");
        Ok(right)
    }

    /// Lets the role going by `role` invoke the service registered as
    /// `service`. Both names are resolved in the same critical section as
    /// the grant.
    pub fn authorize_role_by_name(
        &self,
        role: &str,
        service: &str,
        access_type: impl Into<AccessType>,
    ) -> Result<Right, RolegateRegistryError> {
        let access_type = access_type.into();
        let right = self.mutate(|state| {
            let right = Right::new(
                state.roles.resolve(role)?,
                state.services.resolve(service)?,
                access_type,
            );
            state.authorize(right)?;
            Ok(right)
        })?;
        tracing::debug!(
            role = %right.role,
            service = %right.service,
            access_type = access_type.0,
            "Role authorized"
        );
        Ok(right)
    }

    /// Stops `role` from invoking `service`, returning the revoked right.
    pub fn unauthorize_role(
        &self,
        role: RoleId,
        service: ServiceId,
    ) -> Result<Right, RolegateRegistryError> {
        let right = self.mutate(|state| state.unauthorize(role, service))?;
        tracing::debug!(%role, %service, "Role unauthorized");
        Ok(right)
    }

    /// Stops the role going by `role` from invoking the service registered
    /// as `service`, returning the revoked right.
    pub fn unauthorize_role_by_name(
        &self,
        role: &str,
        service: &str,
    ) -> Result<Right, RolegateRegistryError> {
        let right = self.mutate(|state| {
            let role = state.roles.resolve(role)?;
            let service = state.services.resolve(service)?;
            state.unauthorize(role, service)
        })?;
        tracing::debug!(role = %right.role, service = %right.service, "Role unauthorized");
        Ok(right)
    }

    /// Returns true if `role` may invoke `service`.
    pub fn is_authorized_for(
        &self,
        role: RoleId,
        service: ServiceId,
    ) -> Result<bool, RolegateRegistryError> {
        self.query(|state| state.is_authorized(role, service))
    }

    /// Returns true if the role going by `role` may invoke the service
    /// registered as `service`.
    pub fn is_authorized_for_by_name(
        &self,
        role: &str,
        service: &str,
    ) -> Result<bool, RolegateRegistryError> {
        self.query(|state| {
            state.is_authorized(state.roles.resolve(role)?, state.services.resolve(service)?)
        })
    }

    /// Services `role` may invoke, in ascending order.
    pub fn services_of(&self, role: RoleId) -> Result<Vec<ServiceId>, RolegateRegistryError> {
        self.query(|state| state.services_of(role))
    }

    /// Roles that may invoke `service`, in ascending order.
    pub fn authorized_roles(
        &self,
        service: ServiceId,
    ) -> Result<Vec<RoleId>, RolegateRegistryError> {
        self.query(|state| state.authorized_roles(service))
    }

    /// Every right granted to `role`, in ascending service order.
    pub fn role_rights(&self, role: RoleId) -> Result<Vec<Right>, RolegateRegistryError> {
        self.query(|state| {
            state.roles.require(role)?;
            Ok(state
                .authorization
                .forward_entries(role.0)
                .map(|(_, right)| **right)
                .collect())
        })
    }

    /// Every right to invoke `service`, in ascending role order.
    pub fn service_rights(&self, service: ServiceId) -> Result<Vec<Right>, RolegateRegistryError> {
        self.query(|state| {
            state.services.require(service)?;
            Ok(state
                .authorization
                .backward_entries(service.0)
                .map(|(_, right)| **right)
                .collect())
        })
    }

    /// The right `role` holds over `service`, if any.
    pub fn right(
        &self,
        role: RoleId,
        service: ServiceId,
    ) -> Result<Option<Right>, RolegateRegistryError> {
        self.query(|state| {
            state.roles.require(role)?;
            state.services.require(service)?;
            Ok(state.authorization.get(role.0, service.0).map(|right| **right))
        })
    }

    // Decisions

    /// Creates an undecided reference monitor for `user` invoking `service`.
    pub fn monitor(&self, user: UserId, service: ServiceId) -> ReferenceMonitor {
        let id = MonitorId(self.next_monitor.fetch_add(1, Ordering::Relaxed));
        ReferenceMonitor::new(id, user, service)
    }

    /// Decides whether `user` may invoke `service`.
    pub fn decide(&self, user: UserId, service: ServiceId) -> Result<bool, RolegateRegistryError> {
        let mut monitor = self.monitor(user, service);
        self.query(|state| monitor.decide(state))
    }

    /// Invokes a service on behalf of a user.
    ///
    /// The decision and the lookup of the service body happen against one
    /// snapshot. If access is granted the body is started on its own thread
    /// and its handle is returned at once; otherwise the request fails with
    /// [`RolegateRegistryError::Denied`].
    pub fn request(&self, request: Request) -> Result<Handle, RolegateRegistryError> {
        let Request {
            user,
            service,
            arguments,
            streams,
        } = request;

        let mut monitor = self.monitor(user, service);
        let body = self.query(|state| {
            if !monitor.decide(state)? {
                return Ok(None);
            }
            Ok::<_, RolegateRegistryError>(state.services.get(service).cloned())
        })?;

        let Some(body) = body else {
            tracing::warn!(monitor = %monitor.id(), %user, %service, "Request denied");
            return Err(RolegateRegistryError::Denied { user, service });
        };

        let handle = invoke(body, arguments, streams, &self.config.runner_options())?;
        tracing::info!(monitor = %monitor.id(), %user, %service, "Request granted");
        Ok(handle)
    }

    /// Runs the consistency verifier against the current state.
    pub fn verify(&self) -> Result<(), ConsistencyError> {
        self.query(verify)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("state", &*self.state.read())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
