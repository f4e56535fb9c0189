use crate::{Directory, RoleId, RolegateRegistryError, Right, ServiceId, UserId};
use rolegate_invocation::Service;
use rolegate_relation::Relation;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Everything a [`Registry`](crate::Registry) knows, as one value.
///
/// The registry keeps this behind a single lock, so a borrowed
/// `RegistryState` is always a consistent snapshot.
#[derive(Default)]
pub struct RegistryState {
    pub(crate) users: Directory<UserId, ()>,
    pub(crate) roles: Directory<RoleId, ()>,
    pub(crate) services: Directory<ServiceId, Arc<dyn Service>>,
    /// User (forward) to role (backward).
    pub(crate) membership: Relation<()>,
    /// Role (forward) to service (backward).
    pub(crate) authorization: Relation<Right>,
}

impl RegistryState {
    /// The user table.
    pub fn users(&self) -> &Directory<UserId, ()> {
        &self.users
    }

    /// The role table.
    pub fn roles(&self) -> &Directory<RoleId, ()> {
        &self.roles
    }

    /// The service table.
    pub fn services(&self) -> &Directory<ServiceId, Arc<dyn Service>> {
        &self.services
    }

    /// The user to role relation.
    pub fn membership(&self) -> &Relation<()> {
        &self.membership
    }

    /// The role to service relation.
    pub fn authorization(&self) -> &Relation<Right> {
        &self.authorization
    }

    /// Roles held by `user`, in ascending order.
    pub fn roles_of(&self, user: UserId) -> Result<Vec<RoleId>, RolegateRegistryError> {
        self.users.require(user)?;
        Ok(self
            .membership
            .forward_neighbors(user.0)
            .map(RoleId)
            .collect())
    }

    /// Users holding `role`, in ascending order.
    pub fn members_of(&self, role: RoleId) -> Result<Vec<UserId>, RolegateRegistryError> {
        self.roles.require(role)?;
        Ok(self
            .membership
            .backward_neighbors(role.0)
            .map(UserId)
            .collect())
    }

    /// Services `role` may invoke, in ascending order.
    pub fn services_of(&self, role: RoleId) -> Result<Vec<ServiceId>, RolegateRegistryError> {
        self.roles.require(role)?;
        Ok(self
            .authorization
            .forward_neighbors(role.0)
            .map(ServiceId)
            .collect())
    }

    /// Roles that may invoke `service`, in ascending order.
    pub fn authorized_roles(
        &self,
        service: ServiceId,
    ) -> Result<Vec<RoleId>, RolegateRegistryError> {
        self.services.require(service)?;
        Ok(self
            .authorization
            .backward_neighbors(service.0)
            .map(RoleId)
            .collect())
    }
}

// Mutations shared by the identifier and name flavours of the registry
// operations. Each runs inside a single write section.
impl RegistryState {
    pub(crate) fn remove_user(&mut self, user: UserId) -> Result<usize, RolegateRegistryError> {
        self.users.require(user)?;
        let purged = self.membership.purge_forward(user.0);
        self.users.remove(user);
        Ok(purged)
    }

    pub(crate) fn remove_role(
        &mut self,
        role: RoleId,
    ) -> Result<(usize, usize), RolegateRegistryError> {
        self.roles.require(role)?;
        let memberships = self.membership.purge_backward(role.0);
        let authorizations = self.authorization.purge_forward(role.0);
        self.roles.remove(role);
        Ok((memberships, authorizations))
    }

    pub(crate) fn remove_service(
        &mut self,
        service: ServiceId,
    ) -> Result<usize, RolegateRegistryError> {
        self.services.require(service)?;
        let purged = self.authorization.purge_backward(service.0);
        self.services.remove(service);
        Ok(purged)
    }

    pub(crate) fn assign(
        &mut self,
        user: UserId,
        role: RoleId,
    ) -> Result<(), RolegateRegistryError> {
        self.users.require(user)?;
        self.roles.require(role)?;
        self.membership.link(user.0, role.0, ())?;
        Ok(())
    }

    pub(crate) fn unassign(
        &mut self,
        user: UserId,
        role: RoleId,
    ) -> Result<(), RolegateRegistryError> {
        self.users.require(user)?;
        self.roles.require(role)?;
        self.membership.unlink(user.0, role.0)?;
        Ok(())
    }

    pub(crate) fn is_member(
        &self,
        user: UserId,
        role: RoleId,
    ) -> Result<bool, RolegateRegistryError> {
        self.users.require(user)?;
        self.roles.require(role)?;
        Ok(self.membership.contains(user.0, role.0))
    }

    pub(crate) fn authorize(&mut self, right: Right) -> Result<(), RolegateRegistryError> {
        self.roles.require(right.role)?;
        self.services.require(right.service)?;
        self.authorization.link(right.role.0, right.service.0, right)?;
        Ok(())
    }

    pub(crate) fn unauthorize(
        &mut self,
        role: RoleId,
        service: ServiceId,
    ) -> Result<Right, RolegateRegistryError> {
        self.roles.require(role)?;
        self.services.require(service)?;
        Ok(*self.authorization.unlink(role.0, service.0)?)
    }

    pub(crate) fn is_authorized(
        &self,
        role: RoleId,
        service: ServiceId,
    ) -> Result<bool, RolegateRegistryError> {
        self.roles.require(role)?;
        self.services.require(service)?;
        Ok(self.authorization.contains(role.0, service.0))
    }
}

impl Debug for RegistryState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryState")
            .field("users", &self.users)
            .field("roles", &self.roles)
            .field("services", &self.services)
            .field("membership", &self.membership.len())
            .field("authorization", &self.authorization.len())
            .finish()
    }
}
