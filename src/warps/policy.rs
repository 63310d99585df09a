//! Teleport policy shared by every entry point that sends a player to a warp.

use log::{debug, info};

use crate::logutil::escape_log;
use crate::warps::errors::WarpError;
use crate::warps::ports::{Capability, EconomyPort, WarpStore, WorldPort};
use crate::warps::registry::WarpRegistry;
use crate::warps::types::{PlayerId, Warp, WarpId};

/// A teleport request from a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeleportRequest {
    pub requester: PlayerId,
    pub warp: WarpId,
    /// Run the ground check before teleporting.
    pub check_safety: bool,
}

impl TeleportRequest {
    pub fn new(requester: PlayerId, warp: WarpId) -> Self {
        Self {
            requester,
            warp,
            check_safety: true,
        }
    }

    pub fn without_safety_check(mut self) -> Self {
        self.check_safety = false;
        self
    }
}

/// Result of a successful teleport.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitOutcome {
    /// The warp as it stands after the visit was registered.
    pub warp: Warp,
    /// False when the requester had already been counted this period.
    pub counted: bool,
}

/// Owners manage their own warps; `StaffEdit` holders manage everyone's.
pub fn can_manage<P: EconomyPort + ?Sized>(permissions: &P, actor: PlayerId, warp: &Warp) -> bool {
    warp.owner() == actor || permissions.has_permission(actor, Capability::StaffEdit)
}

/// Owners act on their own warps and ban lists; `Staff` holders act for anyone.
pub fn can_act_for<P: EconomyPort + ?Sized>(
    permissions: &P,
    actor: PlayerId,
    owner: PlayerId,
) -> bool {
    actor == owner || permissions.has_permission(actor, Capability::Staff)
}

fn require_act_for<P: EconomyPort + ?Sized>(
    permissions: &P,
    actor: PlayerId,
    owner: PlayerId,
) -> Result<(), WarpError> {
    if !can_act_for(permissions, actor, owner) {
        debug!("{} may not act for {}", actor, owner);
        return Err(WarpError::PermissionDenied(Capability::Staff));
    }
    if actor != owner {
        info!(target: "security", "{} acting as staff for {}", actor, owner);
    }
    Ok(())
}

/// Delete a warp on behalf of `actor`. Unknown ids return `Ok(false)`.
pub fn remove_as<S, P>(
    registry: &mut WarpRegistry<S>,
    permissions: &P,
    actor: PlayerId,
    id: WarpId,
) -> Result<bool, WarpError>
where
    S: WarpStore,
    P: EconomyPort + ?Sized,
{
    let Some(owner) = registry.find_by_id(id).map(Warp::owner) else {
        return Ok(false);
    };
    require_act_for(permissions, actor, owner)?;
    registry.remove_by_id(id)
}

pub fn ban_as<S, P>(
    registry: &mut WarpRegistry<S>,
    permissions: &P,
    actor: PlayerId,
    owner: PlayerId,
    target: PlayerId,
) -> Result<bool, WarpError>
where
    S: WarpStore,
    P: EconomyPort + ?Sized,
{
    require_act_for(permissions, actor, owner)?;
    registry.ban(owner, target)
}

pub fn unban_as<S, P>(
    registry: &mut WarpRegistry<S>,
    permissions: &P,
    actor: PlayerId,
    owner: PlayerId,
    target: PlayerId,
) -> Result<bool, WarpError>
where
    S: WarpStore,
    P: EconomyPort + ?Sized,
{
    require_act_for(permissions, actor, owner)?;
    registry.unban(owner, target)
}

/// Check bans and ground safety, teleport, then count the visit.
///
/// A warp without a location can never be teleported to, bypass or not.
pub fn teleport<S, P, W>(
    registry: &mut WarpRegistry<S>,
    permissions: &P,
    world: &mut W,
    request: TeleportRequest,
) -> Result<VisitOutcome, WarpError>
where
    S: WarpStore,
    P: EconomyPort + ?Sized,
    W: WorldPort + ?Sized,
{
    let TeleportRequest {
        requester,
        warp: warp_id,
        check_safety,
    } = request;
    let warp = registry
        .find_by_id(warp_id)
        .cloned()
        .ok_or_else(|| WarpError::warp_not_found(warp_id))?;

    if registry.is_banned(warp.owner(), requester) {
        if !permissions.has_permission(requester, Capability::BypassBan) {
            debug!("teleport denied: {} is banned by {}", requester, warp.owner());
            return Err(WarpError::Banned {
                owner: warp.owner(),
                player: requester,
            });
        }
        info!(target: "security", "{} bypassed a ban to visit warp {}", requester, warp_id);
    }

    let Some(location) = warp.location().cloned() else {
        return Err(WarpError::UnsafeLocation);
    };

    if check_safety && !warp.is_safe_to_teleport(&*world) {
        if !permissions.has_permission(requester, Capability::BypassSafety) {
            debug!(
                "teleport denied: warp '{}' has no ground below",
                escape_log(warp.name())
            );
            return Err(WarpError::UnsafeLocation);
        }
        info!("{} ignoring warp safety for {}", requester, warp_id);
    }

    world
        .teleport(requester, &location)
        .map_err(WarpError::Teleport)?;
    let counted = registry.register_visit(warp_id, requester)?;
    let warp = registry
        .find_by_id(warp_id)
        .cloned()
        .ok_or_else(|| WarpError::warp_not_found(warp_id))?;
    Ok(VisitOutcome { warp, counted })
}
